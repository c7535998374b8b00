//! Core data models for FinGenie

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::FinGenieError;

//
// ================= Pages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Dashboard,
    Invest,
    Analytics,
    Goals,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Dashboard, Page::Invest, Page::Analytics, Page::Goals];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Invest => "Invest",
            Page::Analytics => "Analytics",
            Page::Goals => "Goals",
        }
    }

    /// Starter prompts offered while the page's conversation is empty.
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            Page::Dashboard => &[
                "What's my current balance?",
                "How much did I spend on food this month?",
                "Summarize my spending for this month.",
                "Are there any unusual transactions recently?",
            ],
            Page::Invest => &[
                "Compare the performance of TCS and Infosys over the last month.",
                "What is driving the NIFTY 50 today?",
                "How should I diversify a portfolio of ₹5 lakh?",
                "Explain the difference between ETFs and mutual funds.",
            ],
            Page::Analytics => &[
                "Which month had the highest expenses?",
                "Show me my income trend over the last year.",
                "What's my average weekly spending?",
                "Compare my income vs. expenses for this year.",
            ],
            Page::Goals => &[
                "How can I reach my 'Dream Vacation' goal faster?",
                "How much to invest monthly for ₹1 Crore in 20 years at 8% return?",
                "Am I on track for my emergency fund?",
                "Suggest a strategy to reach my retirement goal 3 years sooner.",
            ],
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Page {
    type Err = FinGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" => Ok(Page::Dashboard),
            "invest" => Ok(Page::Invest),
            "analytics" => Ok(Page::Analytics),
            "goals" => Ok(Page::Goals),
            other => Err(FinGenieError::Validation(format!("Unknown page: {}", other))),
        }
    }
}

//
// ================= Transactions =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TransactionType {
    type Err = FinGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(FinGenieError::Validation(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    #[serde(serialize_with = "serialize_amount")]
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub date: NaiveDate,
}

/// Form input for a new transaction; the ledger assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub category: String,
    pub date: NaiveDate,
}

//
// ================= Goals =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_amount")]
    pub target_amount: f64,
    #[serde(serialize_with = "serialize_amount")]
    pub current_amount: f64,
    pub target_date: NaiveDate,
}

impl Goal {
    /// Completion percentage, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        (self.current_amount / self.target_amount * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: NaiveDate,
}

//
// ================= Summaries & Analytics =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FinancialSummary {
    pub income: f64,
    pub expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrame {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl FromStr for TimeFrame {
    type Err = FinGenieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(TimeFrame::Daily),
            "weekly" => Ok(TimeFrame::Weekly),
            "monthly" => Ok(TimeFrame::Monthly),
            "yearly" => Ok(TimeFrame::Yearly),
            other => Err(FinGenieError::Validation(format!("Unknown time frame: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsDataPoint {
    pub date: String,
    pub income: f64,
    pub expense: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorySpending {
    pub name: String,
    pub value: f64,
}

//
// ================= Users & Preferences =================
//

/// A signed-in user as seen by the rest of the app (no credentials).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
}

impl User {
    pub fn first_name(&self) -> &str {
        self.full_name.split_whitespace().next().unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

//
// ================= Grounding =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GroundingSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct WebSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl GroundingSource {
    /// `(title, uri)` for a linkable source; `None` when the uri is missing.
    /// A missing title falls back to the uri.
    pub fn link(&self) -> Option<(&str, &str)> {
        let web = self.web.as_ref()?;
        let uri = web.uri.as_deref().filter(|u| !u.is_empty())?;
        let title = web.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(uri);
        Some((title, uri))
    }
}

//
// ================= Structured Payloads =================
//

/// One row of a stock chart. Tickers whose price is missing or not numeric
/// are kept with `None` so the row still lines up with `stocks`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockDataPoint {
    pub date: String,
    /// Ticker symbol → price on `date`.
    #[serde(flatten)]
    pub prices: BTreeMap<String, Option<f64>>,
}

impl<'de> Deserialize<'de> for StockDataPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let date = fields.remove("date").map(loose_text).unwrap_or_default();
        let prices = fields
            .iter()
            .map(|(ticker, price)| (ticker.clone(), loose_number(price)))
            .collect();
        Ok(Self { date, prices })
    }
}

impl StockDataPoint {
    pub fn price(&self, ticker: &str) -> Option<f64> {
        self.prices.get(ticker).copied().flatten()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockChartPayload {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub summary: String,
    #[serde(deserialize_with = "deserialize_records")]
    pub data: Vec<StockDataPoint>,
    #[serde(default, deserialize_with = "deserialize_tickers")]
    pub stocks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetItem {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub category: String,
    /// Zero when the model sent something that is not a number.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: f64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetPlanPayload {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub summary: String,
    #[serde(deserialize_with = "deserialize_records")]
    pub data: Vec<BudgetItem>,
}

impl BudgetPlanPayload {
    pub fn total(&self) -> f64 {
        self.data.iter().map(|item| item.amount).sum()
    }
}

//
// ================= Loose Decoding =================
//
// Model output is loosely typed: prices arrive as numbers, numeric strings or
// null. Only `data` that is not a list at all is rejected.

/// Whole amounts serialize as integers (`75000`, not `75000.0`).
fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract() == 0.0 && amount.abs() < 9.0e15 {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn loose_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(loose_text)
}

fn deserialize_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(loose_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

fn deserialize_tickers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(loose_text)
            .collect(),
        _ => Vec::new(),
    })
}

/// A list of records; entries that are not objects are skipped.
fn deserialize_records<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        other => Err(D::Error::custom(format!(
            "expected a list of records, got {}",
            other
        ))),
    }
}

//
// ================= Messages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

/// Body of a chat message: prose or exactly one structured payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    StockChart(StockChartPayload),
    BudgetPlan(BudgetPlanPayload),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::text(text),
            sources: None,
        }
    }

    pub fn bot(content: MessageContent, sources: Option<Vec<GroundingSource>>) -> Self {
        Self {
            role: MessageRole::Bot,
            content,
            sources,
        }
    }
}
