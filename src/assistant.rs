//! FinGenie assistant
//!
//! Wires the chat session, context composer, response classifier and
//! conversation state machine together with the ledger. Both binaries talk
//! to the app exclusively through this type.
//!
//! The workspace lock is never held across the model call: a turn is
//! submitted under the lock, the lock is released for the network round
//! trip, and the result is applied under the lock again. Results for turns
//! that went stale in the meantime (page navigation) are dropped.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::classifier::ResponseClassifier;
use crate::composer;
use crate::config::Settings;
use crate::conversation::Conversation;
use crate::gemini::ChatSession;
use crate::ledger::Ledger;
use crate::models::{
    AnalyticsDataPoint, CategorySpending, FinancialSummary, Goal, NewGoal, NewTransaction, Page,
    TimeFrame, Transaction,
};
use crate::session::start_chat_session;

/// What happened to a submitted chat message.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Not submitted: blank text, no session, or a reply already pending.
    Ignored,
    Answered,
    Failed,
    /// The reply arrived after the user navigated away.
    Discarded,
}

/// Mutable app state shared by every surface.
#[derive(Debug, Default)]
pub struct Workspace {
    pub conversation: Conversation,
    pub ledger: Ledger,
}

pub struct Assistant {
    chat: Option<Arc<dyn ChatSession>>,
    workspace: RwLock<Workspace>,
}

impl Assistant {
    /// Build an assistant around an existing session. Without a session the
    /// conversation starts in Error and chat submissions are ignored.
    pub fn new(chat: Option<Arc<dyn ChatSession>>, ledger: Ledger) -> Self {
        let mut conversation = Conversation::default();
        if chat.is_none() {
            conversation.fail_initialization();
        }

        Self {
            chat,
            workspace: RwLock::new(Workspace {
                conversation,
                ledger,
            }),
        }
    }

    /// Start the chat session from settings; a failure is logged and
    /// surfaced through the conversation state rather than returned.
    pub fn initialize(settings: &Settings, ledger: Ledger) -> Self {
        match start_chat_session(settings) {
            Ok(chat) => Self::new(Some(Arc::new(chat)), ledger),
            Err(e) => {
                error!("Failed to start chat session: {}", e);
                Self::new(None, ledger)
            }
        }
    }

    pub fn has_session(&self) -> bool {
        self.chat.is_some()
    }

    /// Run one chat turn for the active page.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(chat) = self.chat.clone() else {
            warn!("Submission ignored: no chat session");
            return SendOutcome::Ignored;
        };

        let (turn, outbound) = {
            let mut ws = self.workspace.write().await;
            let page = ws.conversation.page();

            let outbound = match composer::compose(
                page,
                text,
                ws.ledger.transactions(),
                ws.ledger.goals(),
            ) {
                Ok(outbound) => outbound,
                Err(e) => {
                    error!("Failed to compose message: {}", e);
                    return SendOutcome::Ignored;
                }
            };

            let Some(turn) = ws.conversation.submit(text) else {
                return SendOutcome::Ignored;
            };
            (turn, outbound)
        };

        info!(page = %turn.page, "Sending chat turn");
        let result = chat.send_message(&outbound).await;

        let mut ws = self.workspace.write().await;
        match result {
            Ok(reply) => {
                let content = ResponseClassifier::classify(&reply.text);
                if ws.conversation.complete(turn, content, reply.sources) {
                    SendOutcome::Answered
                } else {
                    SendOutcome::Discarded
                }
            }
            Err(e) => {
                error!("Chat turn failed: {}", e);
                if ws.conversation.fail(turn) {
                    SendOutcome::Failed
                } else {
                    SendOutcome::Discarded
                }
            }
        }
    }

    pub async fn navigate(&self, page: Page) {
        self.workspace.write().await.conversation.navigate(page);
    }

    /// Copy of the conversation for rendering.
    pub async fn conversation(&self) -> Conversation {
        self.workspace.read().await.conversation.clone()
    }

    pub async fn page(&self) -> Page {
        self.workspace.read().await.conversation.page()
    }

    // =============================
    // Ledger pass-throughs
    // =============================

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.workspace.read().await.ledger.transactions().to_vec()
    }

    pub async fn goals(&self) -> Vec<Goal> {
        self.workspace.read().await.ledger.goals().to_vec()
    }

    pub async fn add_transaction(&self, input: NewTransaction) -> crate::Result<Transaction> {
        self.workspace.write().await.ledger.add_transaction(input)
    }

    pub async fn delete_transaction(&self, id: &str) -> bool {
        self.workspace.write().await.ledger.delete_transaction(id)
    }

    pub async fn add_goal(&self, input: NewGoal) -> crate::Result<Goal> {
        self.workspace.write().await.ledger.add_goal(input)
    }

    pub async fn delete_goal(&self, id: &str) -> bool {
        self.workspace.write().await.ledger.delete_goal(id)
    }

    pub async fn summary(&self) -> FinancialSummary {
        self.workspace.read().await.ledger.summary()
    }

    pub async fn analytics(&self, frame: TimeFrame) -> (Vec<AnalyticsDataPoint>, Vec<CategorySpending>) {
        let ws = self.workspace.read().await;
        (
            ws.ledger.income_expense_series(frame),
            ws.ledger.spending_by_category(),
        )
    }
}
