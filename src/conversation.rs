//! Conversation state machine
//!
//! Tracks the message log for the active page and whether a reply is pending.
//!
//! ```text
//! Idle  --submit-->  Loading  --reply-->  Idle
//!                    Loading  --fail--->  Error  --submit-->  Loading
//! any   --navigate-> Idle (log cleared, pending turn discarded)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{GroundingSource, Message, MessageContent, Page};

/// Bot message and error text shown when a turn fails.
pub const EXCHANGE_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Error text shown when the chat session could not be started.
pub const INIT_FAILURE_MESSAGE: &str =
    "Failed to initialize the AI service. Please check your API key.";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    #[default]
    Idle,
    Loading,
    Error,
}

/// Ticket for a submitted turn. Only the ticket issued by the latest submit
/// on the current page can complete the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTurn {
    epoch: u64,
    pub page: Page,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    page: Page,
    messages: Vec<Message>,
    state: AppState,
    error: Option<String>,
    #[serde(skip)]
    epoch: u64,
}

impl Conversation {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            ..Self::default()
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a turn. Ignored (returns `None`) while a reply is pending.
    pub fn submit(&mut self, text: &str) -> Option<PendingTurn> {
        if self.state == AppState::Loading {
            warn!("Submission ignored: a reply is already pending");
            return None;
        }

        self.messages.push(Message::user(text));
        self.state = AppState::Loading;
        self.error = None;
        self.epoch += 1;

        Some(PendingTurn {
            epoch: self.epoch,
            page: self.page,
        })
    }

    /// Record the bot reply for `turn`. Returns `false` if the turn is stale.
    pub fn complete(
        &mut self,
        turn: PendingTurn,
        content: MessageContent,
        sources: Option<Vec<GroundingSource>>,
    ) -> bool {
        if !self.is_current(turn) {
            debug!("Discarding reply for a stale turn");
            return false;
        }

        self.messages.push(Message::bot(content, sources));
        self.state = AppState::Idle;
        true
    }

    /// Record a failed exchange for `turn`. Returns `false` if the turn is stale.
    pub fn fail(&mut self, turn: PendingTurn) -> bool {
        if !self.is_current(turn) {
            debug!("Discarding failure for a stale turn");
            return false;
        }

        self.messages
            .push(Message::bot(MessageContent::text(EXCHANGE_FAILURE_MESSAGE), None));
        self.error = Some(EXCHANGE_FAILURE_MESSAGE.to_string());
        self.state = AppState::Error;
        true
    }

    /// Switch page: clears the log and error and returns to Idle whatever the current state.
    pub fn navigate(&mut self, page: Page) {
        info!(from = %self.page, to = %page, "Navigating");
        self.page = page;
        self.messages.clear();
        self.error = None;
        self.state = AppState::Idle;
        // Invalidates any outstanding ticket.
        self.epoch += 1;
    }

    /// Enter Error because the chat session could not be created.
    pub fn fail_initialization(&mut self) {
        self.error = Some(INIT_FAILURE_MESSAGE.to_string());
        self.state = AppState::Error;
    }

    fn is_current(&self, turn: PendingTurn) -> bool {
        self.state == AppState::Loading && turn.epoch == self.epoch && turn.page == self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    #[test]
    fn test_successful_turn() {
        let mut conv = Conversation::new(Page::Dashboard);
        let turn = conv.submit("What's my balance?").unwrap();

        assert_eq!(conv.state(), AppState::Loading);
        assert_eq!(conv.messages().len(), 1);
        assert_eq!(conv.messages()[0].role, MessageRole::User);

        assert!(conv.complete(turn, MessageContent::text("₹60,500"), None));
        assert_eq!(conv.state(), AppState::Idle);
        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].role, MessageRole::Bot);
    }

    #[test]
    fn test_submit_while_loading_is_noop() {
        let mut conv = Conversation::new(Page::Invest);
        conv.submit("first").unwrap();
        let before = conv.messages().to_vec();

        assert!(conv.submit("second").is_none());
        assert_eq!(conv.messages(), before.as_slice());
        assert_eq!(conv.state(), AppState::Loading);
    }

    #[test]
    fn test_failure_then_retry() {
        let mut conv = Conversation::new(Page::Goals);
        let turn = conv.submit("help").unwrap();
        assert!(conv.fail(turn));

        assert_eq!(conv.state(), AppState::Error);
        assert_eq!(conv.error(), Some(EXCHANGE_FAILURE_MESSAGE));
        assert_eq!(
            conv.messages()[1].content.as_text(),
            Some(EXCHANGE_FAILURE_MESSAGE)
        );

        let retry = conv.submit("help again").unwrap();
        assert_eq!(conv.error(), None);
        assert!(conv.complete(retry, MessageContent::text("ok"), None));
        assert_eq!(conv.state(), AppState::Idle);
        assert_eq!(conv.messages().len(), 4);
    }

    #[test]
    fn test_navigation_resets_even_mid_loading() {
        let mut conv = Conversation::new(Page::Dashboard);
        let turn = conv.submit("question").unwrap();

        conv.navigate(Page::Analytics);
        assert_eq!(conv.page(), Page::Analytics);
        assert!(conv.messages().is_empty());
        assert_eq!(conv.state(), AppState::Idle);

        // The late reply is dropped.
        assert!(!conv.complete(turn, MessageContent::text("late"), None));
        assert!(!conv.fail(turn));
        assert!(conv.messages().is_empty());
        assert_eq!(conv.state(), AppState::Idle);
    }

    #[test]
    fn test_navigation_back_to_same_page_still_discards() {
        let mut conv = Conversation::new(Page::Dashboard);
        let turn = conv.submit("question").unwrap();
        conv.navigate(Page::Dashboard);
        let fresh = conv.submit("new question").unwrap();

        assert!(!conv.complete(turn, MessageContent::text("old"), None));
        assert!(conv.complete(fresh, MessageContent::text("new"), None));
        assert_eq!(conv.messages()[1].content.as_text(), Some("new"));
    }

    #[test]
    fn test_initialization_failure() {
        let mut conv = Conversation::default();
        conv.fail_initialization();
        assert_eq!(conv.state(), AppState::Error);
        assert_eq!(conv.error(), Some(INIT_FAILURE_MESSAGE));

        conv.navigate(Page::Invest);
        assert_eq!(conv.state(), AppState::Idle);
        assert_eq!(conv.error(), None);
    }
}
