//! The floating question/answer widget and its backing client.
//!
//! Two pieces, loosely coupled to everything else:
//!
//! - [`ChatWidget`]: conversational UI state (turn list, open/closed
//!   flag, captured page selection, in-flight gate)
//! - [`AnswerClient`]: the request/response exchange with the external
//!   answering service
//!
//! The widget owns its turn list for its own lifetime only; turns are
//! never persisted.

pub mod client;
pub mod widget;

pub use client::{AnswerClient, QueryRequest, QueryResponse};
pub use widget::{
    ChatWidget, ConversationTurn, FALLBACK_ANSWER, SELECTION_MIN_CHARS, SubmitRejected, TurnRole,
    WidgetSnapshot,
};
