//! Mock authentication: user registry and the current session.
//!
//! This emulates a minimal authentication backend entirely inside the
//! application, the way a site mock would: registered users and the
//! single active session are mirrored to durable key-value storage and
//! survive restarts, but credentials are plaintext and session expiry
//! is recorded without ever being enforced. Do not mistake any of this
//! for security.
//!
//! The [`AuthStore`] is the only entry point; see its docs for the
//! operation contracts.

pub mod session;
pub mod store;
pub mod user;

pub use session::{Session, SessionRecord};
pub use store::{AuthError, AuthStore, SignedIn};
pub use user::{UserProfile, UserRecord};
