//! Context composer
//!
//! Builds the single outbound message for a chat turn: a page tag, the
//! financial records relevant to that page, and the user's own text.
//! Records are forwarded in full; nothing is truncated or summarized.

use crate::models::{Goal, Page, Transaction};

/// Persona, per-page rules and payload schemas for the chat session.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are FinGenie, an advanced AI finance assistant integrated into a multi-page financial platform. Your personality is friendly, professional, and data-driven.

You MUST adapt your responses based on the page the user is currently on. The user's message will be prefixed with 'Context: The user is on the [Page Name] page.'. Use this context to provide relevant and specific answers.

BEHAVIOR PER PAGE:
1.  **Dashboard:** The user's transaction data will be provided in the prompt as a JSON string. Use this data to summarize their financial health (e.g., answer "what is my balance?").
    - **IMPORTANT**: You CANNOT add, delete, or modify transactions. If the user asks to perform such an action, instruct them to use the "Add Transaction" or delete actions on the page.
2.  **Invest:** Provide real-time market data (stocks, ETFs, crypto). Compare asset performance, explain market drivers, and offer portfolio diversification insights.
3.  **Analytics:** The user's transaction data is provided. Use this to answer questions about their spending trends, income patterns, and financial habits. Do not perform forecasting or 'what-if' scenarios unless specifically asked.
4.  **Goals:** The user's financial goals data is provided as a JSON string. Use this to help users track progress, forecast completion dates, and offer saving strategies.
    - **IMPORTANT**: You CANNOT add, delete, or modify goals. If the user asks to do this, instruct them to use the "Add Goal" or delete actions on the page.

IMPORTANT RULES:
-   **Currency:** All financial amounts must be in Indian Rupees (₹).
-   **Disclaimer:** You are an educational tool, NOT a financial advisor. ALWAYS include a disclaimer that your insights are for educational purposes, especially when discussing investments.
-   **Sourcing:** When using your search tool for web data, state that the information is from web sources.
-   **Structured Data:** For requests that require structured data, respond ONLY with a valid JSON object. Do not add markdown backticks or any text outside the JSON.
    -   **Stock Comparison Request:** { "type": "stock_chart", "summary": "...", "data": [{ "date": "YYYY-MM-DD", "TICKER1": 123.45, ... }], "stocks": ["TICKER1", ...] }. Prices should be in ₹ if applicable (e.g. for Indian stocks).
    -   **Budget Plan Request:** { "type": "budget_plan", "summary": "...", "data": [{ "category": "...", "amount": 123, "details": "..." }] }. Amounts must be in ₹.
-   For all other requests, provide a helpful, conversational text response tailored to the user's current page context.
"#;

/// Pages whose prompts carry the transaction list.
fn shares_transactions(page: Page) -> bool {
    matches!(page, Page::Dashboard | Page::Analytics)
}

fn shares_goals(page: Page) -> bool {
    page == Page::Goals
}

/// Compose the outbound message for one turn.
pub fn compose(
    page: Page,
    user_text: &str,
    transactions: &[Transaction],
    goals: &[Goal],
) -> crate::Result<String> {
    let mut message = format!("Context: The user is on the '{}' page.\n\n", page);

    if shares_transactions(page) && !transactions.is_empty() {
        message.push_str("Here is the user's current transaction data: ");
        message.push_str(&serde_json::to_string(transactions)?);
        message.push_str("\n\n");
    }

    if shares_goals(page) && !goals.is_empty() {
        message.push_str("Here is the user's current goals data: ");
        message.push_str(&serde_json::to_string(goals)?);
        message.push_str("\n\n");
    }

    message.push_str(&format!("User message: \"{}\"", user_text));

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn test_dashboard_includes_transactions_only() {
        let ledger = Ledger::sample();
        let message = compose(
            Page::Dashboard,
            "What's my balance?",
            ledger.transactions(),
            ledger.goals(),
        )
        .unwrap();

        assert!(message.starts_with("Context: The user is on the 'Dashboard' page.\n\n"));
        assert!(message.contains("Here is the user's current transaction data: ["));
        assert!(message.contains("\"title\":\"Monthly Salary\",\"amount\":75000,"));
        assert!(!message.contains("goals data"));
        assert!(message.ends_with("User message: \"What's my balance?\""));
    }

    #[test]
    fn test_analytics_includes_transactions() {
        let ledger = Ledger::sample();
        let message = compose(Page::Analytics, "trend?", ledger.transactions(), ledger.goals()).unwrap();
        assert!(message.contains("transaction data"));
        assert!(!message.contains("goals data"));
    }

    #[test]
    fn test_goals_includes_goals_only() {
        let ledger = Ledger::sample();
        let message = compose(Page::Goals, "On track?", ledger.transactions(), ledger.goals()).unwrap();

        assert!(message.contains("Here is the user's current goals data: ["));
        assert!(message.contains("\"targetAmount\":150000,\"currentAmount\":65000"));
        assert!(!message.contains("transaction data"));
    }

    #[test]
    fn test_invest_never_includes_records() {
        let ledger = Ledger::sample();
        let message = compose(Page::Invest, "Compare TCS and INFY", ledger.transactions(), ledger.goals()).unwrap();

        assert_eq!(
            message,
            "Context: The user is on the 'Invest' page.\n\nUser message: \"Compare TCS and INFY\""
        );
    }

    #[test]
    fn test_empty_records_are_omitted() {
        let message = compose(Page::Dashboard, "hi", &[], &[]).unwrap();
        assert_eq!(
            message,
            "Context: The user is on the 'Dashboard' page.\n\nUser message: \"hi\""
        );
    }

    #[test]
    fn test_system_instruction_declares_both_payloads() {
        assert!(SYSTEM_INSTRUCTION.contains("\"type\": \"stock_chart\""));
        assert!(SYSTEM_INSTRUCTION.contains("\"type\": \"budget_plan\""));
        assert!(SYSTEM_INSTRUCTION.contains("₹"));
    }
}
