//! Conversational widget state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::client::AnswerClient;

/// Assistant turn rendered when the remote request fails in any way.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error. Please try again.";

/// A page selection is retained only when, after trimming, it is longer
/// than this many characters. Shorter selections are noise.
pub const SELECTION_MIN_CHARS: usize = 10;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// A question typed by the user.
    User,
    /// An answer (or the fallback) from the assistant.
    Assistant,
}

/// One entry in the widget's turn list.
///
/// Turns live only in memory for the widget's lifetime; nothing here is
/// ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Opaque turn identifier.
    pub id: String,
    /// Turn text.
    pub content: String,
    /// Who authored the turn.
    pub role: TurnRole,
    /// When the turn was appended.
    pub timestamp: DateTime<Utc>,
}

/// Why a submission was not sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    /// The question was blank after trimming.
    #[error("question is empty")]
    EmptyQuestion,
    /// A previous request has not resolved yet.
    #[error("a request is already in flight")]
    Busy,
}

/// Serializable snapshot of the widget, for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    /// Whether the widget is visually open.
    pub open: bool,
    /// Currently retained page selection, if any.
    pub selection: Option<String>,
    /// All turns, oldest first.
    pub turns: Vec<ConversationTurn>,
}

/// The floating question/answer widget.
///
/// Holds the append-only turn list, the open/closed flag, and the most
/// recently captured page selection. Submissions are serialized by an
/// in-flight flag: while one request is pending, further submissions
/// are rejected rather than queued. A hung remote request therefore
/// leaves the widget pending until the request resolves; no timeout is
/// imposed here.
#[derive(Debug, Clone)]
pub struct ChatWidget {
    inner: Arc<WidgetInner>,
}

#[derive(Debug)]
struct WidgetInner {
    client: AnswerClient,
    open: AtomicBool,
    in_flight: AtomicBool,
    turns: RwLock<Vec<ConversationTurn>>,
    selection: RwLock<Option<String>>,
}

impl ChatWidget {
    /// Create a closed, empty widget that asks `client` for answers.
    #[must_use]
    pub fn new(client: AnswerClient) -> Self {
        Self {
            inner: Arc::new(WidgetInner {
                client,
                open: AtomicBool::new(false),
                in_flight: AtomicBool::new(false),
                turns: RwLock::new(Vec::new()),
                selection: RwLock::new(None),
            }),
        }
    }

    /// Flip the open/closed flag, returning the new state.
    pub fn toggle(&self) -> bool {
        !self.inner.open.fetch_xor(true, Ordering::SeqCst)
    }

    /// Whether the widget is visually open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    /// Whether a submission is currently awaiting its answer.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Record a page text selection.
    ///
    /// The selection is trimmed and retained only when longer than
    /// [`SELECTION_MIN_CHARS`]; shorter selections are ignored and
    /// leave any previously retained selection in place. Returns
    /// whether the selection was retained.
    pub fn observe_selection(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.len() <= SELECTION_MIN_CHARS {
            return false;
        }
        *self.inner.selection.write().unwrap() = Some(trimmed.to_string());
        true
    }

    /// Currently retained selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<String> {
        self.inner.selection.read().unwrap().clone()
    }

    /// All turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> Vec<ConversationTurn> {
        self.inner.turns.read().unwrap().clone()
    }

    /// Snapshot of the full widget state.
    #[must_use]
    pub fn snapshot(&self) -> WidgetSnapshot {
        WidgetSnapshot {
            open: self.is_open(),
            selection: self.selection(),
            turns: self.turns(),
        }
    }

    /// Empty the turn list and drop any retained selection.
    pub fn clear(&self) {
        self.inner.turns.write().unwrap().clear();
        self.inner.selection.write().unwrap().take();
    }

    /// Submit a question to the answering service.
    ///
    /// Appends the user turn, issues exactly one request carrying the
    /// retained selection (empty string when none), and appends exactly
    /// one assistant turn: the service's answer, or [`FALLBACK_ANSWER`]
    /// on any failure. The retained selection is consumed only by a
    /// successful exchange; a failed one keeps it for the next attempt.
    ///
    /// # Errors
    ///
    /// [`SubmitRejected`] when the question is blank or a previous
    /// request is still in flight. Remote failures are not errors; they
    /// surface as the fallback turn.
    pub async fn submit(&self, question: &str) -> Result<ConversationTurn, SubmitRejected> {
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(SubmitRejected::EmptyQuestion);
        }
        if self.inner.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SubmitRejected::Busy);
        }

        self.push_turn(TurnRole::User, question.clone());
        let selected_text = self.selection().unwrap_or_default();

        let turn = match self.inner.client.ask(&question, &selected_text).await {
            Ok(answer) => {
                self.inner.selection.write().unwrap().take();
                self.push_turn(TurnRole::Assistant, answer)
            }
            Err(e) => {
                warn!(
                    name: "chat.query.failed",
                    error = %e,
                    "answering service request failed"
                );
                self.push_turn(TurnRole::Assistant, FALLBACK_ANSWER.to_string())
            }
        };

        self.inner.in_flight.store(false, Ordering::SeqCst);
        Ok(turn)
    }

    fn push_turn(&self, role: TurnRole, content: String) -> ConversationTurn {
        let turn = ConversationTurn {
            id: Uuid::new_v4().to_string(),
            content,
            role,
            timestamp: Utc::now(),
        };
        self.inner.turns.write().unwrap().push(turn.clone());
        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ChatWidget {
        // Tests here never reach the network; submission paths that do
        // are covered by the integration tests with a stub service.
        ChatWidget::new(AnswerClient::new("http://127.0.0.1:0"))
    }

    #[test]
    fn test_toggle_flips_open_state() {
        let w = widget();
        assert!(!w.is_open());
        assert!(w.toggle());
        assert!(w.is_open());
        assert!(!w.toggle());
    }

    #[test]
    fn test_short_selection_is_ignored() {
        let w = widget();

        assert!(!w.observe_selection("ten chars!"));
        assert!(w.selection().is_none());

        assert!(w.observe_selection("a servo motor converts control signals"));
        assert_eq!(
            w.selection().unwrap(),
            "a servo motor converts control signals"
        );

        // A subsequent short selection leaves the retained one alone.
        assert!(!w.observe_selection("nope"));
        assert!(w.selection().is_some());
    }

    #[test]
    fn test_selection_is_trimmed_before_the_length_check() {
        let w = widget();
        assert!(!w.observe_selection("   short   \n"));
        assert!(w.observe_selection("  long enough once trimmed  "));
        assert_eq!(w.selection().unwrap(), "long enough once trimmed");
    }

    #[test]
    fn test_clear_empties_turns_and_selection() {
        let w = widget();
        w.observe_selection("a selection that is long enough");
        w.push_turn(TurnRole::User, "hello".to_string());
        w.push_turn(TurnRole::Assistant, "hi".to_string());

        w.clear();
        assert!(w.turns().is_empty());
        assert!(w.selection().is_none());

        // Clearing an already-empty widget is fine.
        w.clear();
        assert!(w.turns().is_empty());
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected_before_any_turn() {
        let w = widget();
        assert_eq!(
            w.submit("   ").await.unwrap_err(),
            SubmitRejected::EmptyQuestion
        );
        assert!(w.turns().is_empty());
        assert!(!w.is_busy());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(TurnRole::Assistant).unwrap(),
            serde_json::json!("assistant")
        );
        assert_eq!(
            serde_json::to_value(TurnRole::User).unwrap(),
            serde_json::json!("user")
        );
    }
}
