//! Book Assistant
//!
//! Companion service for a documentation (book) site: a mock
//! authentication backend and the floating question/answer widget that
//! forwards reader questions to an external answering service.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with static pages, form
//!   handlers, and JSON APIs
//! - **Auth**: in-memory user registry and single current session,
//!   mirrored to durable key-value storage
//! - **Chat**: widget state plus the `/query` client for the remote
//!   answering service
//!
//! # Modules
//!
//! - [`auth`]: the session store (sign-up, sign-in, current user, sign-out)
//! - [`chat`]: conversational widget state and the answering client
//! - [`storage`]: capability-checked key-value storage backends
//! - [`config`]: layered application configuration
//! - [`server`]: routes and handlers

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::cargo_common_metadata)]

pub mod auth;
pub mod chat;
pub mod config;
pub mod server;
pub mod storage;

use std::sync::Arc;

use auth::AuthStore;
use chat::ChatWidget;
use config::AppConfig;

/// Application state shared across all handlers.
///
/// Both stores are explicit instances constructed once at startup and
/// handed to the router; tests build their own isolated instances.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Session store backing registration and sign-in.
    pub auth: AuthStore,
    /// Conversational widget state and answering client.
    pub chat: ChatWidget,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}
