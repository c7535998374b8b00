//! Plain-text rendering for the terminal client
//!
//! Amounts follow Indian digit grouping (`₹1,50,000.50`).

use crate::conversation::{AppState, Conversation};
use crate::models::{
    AnalyticsDataPoint, BudgetPlanPayload, CategorySpending, FinancialSummary, Goal, GroundingSource, Message, MessageContent,
    MessageRole, StockChartPayload, Transaction, TransactionType,
};

/// Format a rupee amount with lakh/crore grouping and up to two decimals.
pub fn format_inr(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last3) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), last3)
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('₹');
    out.push_str(&grouped);
    if fraction != 0 {
        let decimals = format!("{:02}", fraction);
        out.push('.');
        out.push_str(decimals.trim_end_matches('0'));
    }
    out
}

pub fn render_message(message: &Message) -> String {
    let speaker = match message.role {
        MessageRole::User => "You",
        MessageRole::Bot => "FinGenie",
    };

    let mut out = format!("{}: {}", speaker, render_content(&message.content));

    if let Some(sources) = &message.sources {
        let links = render_sources(sources);
        if !links.is_empty() {
            out.push_str("\nSources:");
            for link in links {
                out.push_str("\n  - ");
                out.push_str(&link);
            }
        }
    }
    out
}

pub fn render_content(content: &MessageContent) -> String {
    match content {
        MessageContent::Text { text } => text.clone(),
        MessageContent::StockChart(chart) => render_stock_chart(chart),
        MessageContent::BudgetPlan(plan) => render_budget_plan(plan),
    }
}

/// `title (uri)` per linkable source; sources without a uri are skipped.
pub fn render_sources(sources: &[GroundingSource]) -> Vec<String> {
    sources
        .iter()
        .filter_map(GroundingSource::link)
        .map(|(title, uri)| {
            if title == uri {
                uri.to_string()
            } else {
                format!("{} ({})", title, uri)
            }
        })
        .collect()
}

fn render_stock_chart(chart: &StockChartPayload) -> String {
    let header: String = chart.stocks.iter().map(|t| format!("{:>14}", t)).collect();
    let mut out = format!("{}\n{:<12}{}", chart.summary, "Date", header);

    for point in &chart.data {
        let cells: String = chart
            .stocks
            .iter()
            .map(|ticker| match point.price(ticker) {
                Some(price) => format!("{:>14.2}", price),
                None => format!("{:>14}", "-"),
            })
            .collect();
        out.push_str(&format!("\n{:<12}{}", point.date, cells));
    }
    out
}

fn render_budget_plan(plan: &BudgetPlanPayload) -> String {
    let mut out = format!(
        "{}\n{:<20}{:>14}  {}",
        plan.summary, "Category", "Amount", "Details"
    );
    for item in &plan.data {
        out.push_str(&format!(
            "\n{:<20}{:>14}  {}",
            item.category,
            format_inr(item.amount),
            item.details
        ));
    }
    out.push_str(&format!("\n{:<20}{:>14}", "Total", format_inr(plan.total())));
    out
}

/// Income/expense table per period, then spending by category.
pub fn render_analytics(series: &[AnalyticsDataPoint], categories: &[CategorySpending]) -> String {
    let mut out = format!("{:<12}{:>14}{:>14}", "Period", "Income", "Expense");
    for point in series {
        out.push_str(&format!(
            "\n{:<12}{:>14}{:>14}",
            point.date,
            format_inr(point.income),
            format_inr(point.expense)
        ));
    }

    out.push_str("\n\nSpending by category:");
    for category in categories {
        out.push_str(&format!(
            "\n  {:<16}{:>14}",
            category.name,
            format_inr(category.value)
        ));
    }
    out
}

pub fn render_summary(summary: &FinancialSummary) -> String {
    format!(
        "Total Income: {}  |  Total Expenses: {}  |  Current Balance: {}",
        format_inr(summary.income),
        format_inr(summary.expenses),
        format_inr(summary.balance)
    )
}

pub fn render_transaction(t: &Transaction) -> String {
    let sign = match t.kind {
        TransactionType::Income => '+',
        TransactionType::Expense => '-',
    };
    format!(
        "{}  {:<24} {:<14} {}{}  [{}]",
        t.date,
        t.title,
        t.category,
        sign,
        format_inr(t.amount),
        t.id
    )
}

pub fn render_goal(goal: &Goal) -> String {
    format!(
        "{:<20} {} / {}  {:.1}% Complete  Target Date: {}  [{}]",
        goal.name,
        format_inr(goal.current_amount),
        format_inr(goal.target_amount),
        goal.progress_percent(),
        goal.target_date.format("%-d %B %Y"),
        goal.id
    )
}

/// Status line under the chat log.
pub fn render_status(conversation: &Conversation) -> Option<String> {
    match conversation.state() {
        AppState::Loading => Some("FinGenie is thinking...".to_string()),
        AppState::Error => conversation.error().map(|e| format!("Error: {}", e)),
        AppState::Idle => None,
    }
}
