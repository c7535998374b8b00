//! FinGenie
//!
//! A personal-finance assistant that:
//! - Keeps a ledger of transactions and savings goals
//! - Answers questions through a Gemini chat session with web grounding
//! - Tailors every prompt to the page the user is on
//! - Renders structured replies (stock charts, budget plans) natively
//!
//! TURN FLOW:
//! INPUT → COMPOSE → SESSION → CLASSIFY → CONVERSATION STATE

pub mod api;
pub mod assistant;
pub mod auth;
pub mod classifier;
pub mod composer;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gemini;
pub mod ledger;
pub mod models;
pub mod preferences;
pub mod render;
pub mod session;
pub mod storage;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use assistant::{Assistant, SendOutcome};
pub use classifier::ResponseClassifier;
pub use conversation::{AppState, Conversation};
