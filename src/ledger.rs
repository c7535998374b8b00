//! In-memory ledger of transactions and savings goals
//!
//! Records are created from form input, deleted by id, and never updated.
//! New records go to the front so listings read newest first.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::FinGenieError;
use crate::models::{
    AnalyticsDataPoint, CategorySpending, FinancialSummary, Goal, NewGoal, NewTransaction,
    TimeFrame, Transaction, TransactionType,
};
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    goals: Vec<Goal>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with the demo records shown on first launch.
    pub fn sample() -> Self {
        let tx = |id: &str, title: &str, amount: f64, kind: TransactionType, category: &str, day: u32| Transaction {
            id: id.to_string(),
            title: title.to_string(),
            amount,
            kind,
            category: category.to_string(),
            date: ymd(2023, 10, day),
        };
        let goal = |id: &str, name: &str, target: f64, current: f64, date: NaiveDate| Goal {
            id: id.to_string(),
            name: name.to_string(),
            target_amount: target,
            current_amount: current,
            target_date: date,
        };

        use TransactionType::{Expense, Income};
        Self {
            transactions: vec![
                tx("1", "Monthly Salary", 75000.0, Income, "Salary", 1),
                tx("2", "Rent", 15000.0, Expense, "Housing", 5),
                tx("3", "Groceries", 8000.0, Expense, "Food", 7),
                tx("4", "Freelance Project", 12000.0, Income, "Freelance", 10),
                tx("5", "Internet Bill", 1000.0, Expense, "Bills", 12),
                tx("6", "Dining Out", 2500.0, Expense, "Entertainment", 15),
            ],
            goals: vec![
                goal("g1", "Dream Vacation", 150000.0, 65000.0, ymd(2024, 12, 31)),
                goal("g2", "New Laptop", 120000.0, 110000.0, ymd(2024, 6, 30)),
                goal("g3", "Emergency Fund", 500000.0, 250000.0, ymd(2025, 12, 31)),
            ],
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    // =============================
    // Transactions
    // =============================

    pub fn add_transaction(&mut self, input: NewTransaction) -> Result<Transaction> {
        require_text("title", &input.title)?;
        require_text("category", &input.category)?;
        require_amount("amount", input.amount)?;

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            amount: input.amount,
            kind: input.kind,
            category: input.category.trim().to_string(),
            date: input.date,
        };

        info!(id = %transaction.id, kind = %transaction.kind, "Transaction added");
        self.transactions.insert(0, transaction.clone());
        Ok(transaction)
    }

    /// Remove a transaction; returns whether anything was removed.
    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        let removed = self.transactions.len() != before;
        if removed {
            info!(id, "Transaction deleted");
        }
        removed
    }

    // =============================
    // Goals
    // =============================

    pub fn add_goal(&mut self, input: NewGoal) -> Result<Goal> {
        require_text("name", &input.name)?;
        require_amount("target amount", input.target_amount)?;
        require_amount("current amount", input.current_amount)?;

        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            target_amount: input.target_amount,
            current_amount: input.current_amount,
            target_date: input.target_date,
        };

        info!(id = %goal.id, "Goal added");
        self.goals.insert(0, goal.clone());
        Ok(goal)
    }

    pub fn delete_goal(&mut self, id: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| g.id != id);
        let removed = self.goals.len() != before;
        if removed {
            info!(id, "Goal deleted");
        }
        removed
    }

    // =============================
    // Derived views
    // =============================

    pub fn summary(&self) -> FinancialSummary {
        let total = |kind: TransactionType| {
            self.transactions
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| t.amount)
                .sum::<f64>()
        };

        let income = total(TransactionType::Income);
        let expenses = total(TransactionType::Expense);

        FinancialSummary {
            income,
            expenses,
            balance: income - expenses,
        }
    }

    /// Income and expense totals per period, oldest period first.
    pub fn income_expense_series(&self, frame: TimeFrame) -> Vec<AnalyticsDataPoint> {
        let mut buckets: BTreeMap<String, (f64, f64)> = BTreeMap::new();

        for t in &self.transactions {
            let entry = buckets.entry(bucket_key(t.date, frame)).or_default();
            match t.kind {
                TransactionType::Income => entry.0 += t.amount,
                TransactionType::Expense => entry.1 += t.amount,
            }
        }

        buckets
            .into_iter()
            .map(|(date, (income, expense))| AnalyticsDataPoint { date, income, expense })
            .collect()
    }

    /// Expense totals per category, largest first.
    pub fn spending_by_category(&self) -> Vec<CategorySpending> {
        let mut totals: HashMap<&str, f64> = HashMap::new();

        for t in self
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionType::Expense)
        {
            *totals.entry(t.category.as_str()).or_default() += t.amount;
        }

        let mut spending: Vec<CategorySpending> = totals
            .into_iter()
            .map(|(name, value)| CategorySpending {
                name: name.to_string(),
                value,
            })
            .collect();

        spending.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then_with(|| a.name.cmp(&b.name))
        });
        spending
    }
}

fn bucket_key(date: NaiveDate, frame: TimeFrame) -> String {
    match frame {
        TimeFrame::Daily => date.format("%Y-%m-%d").to_string(),
        TimeFrame::Weekly => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        TimeFrame::Monthly => date.format("%Y-%m").to_string(),
        TimeFrame::Yearly => date.format("%Y").to_string(),
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        warn!("Rejected record with empty {}", field);
        return Err(FinGenieError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_amount(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        warn!("Rejected record with invalid {}: {}", field, value);
        return Err(FinGenieError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
