use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fingenie::{
    assistant::{Assistant, SendOutcome},
    auth::AuthService,
    config::Settings,
    ledger::Ledger,
    models::{NewGoal, NewTransaction, Page, TimeFrame, TransactionType},
    preferences::Preferences,
    render,
    storage::{InMemoryStore, JsonFileStore, KeyValueStore},
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// One `:command` line typed at the prompt.
#[derive(Parser, Debug)]
#[command(
    name = "fingenie",
    no_binary_name = true,
    disable_version_flag = true,
    help_template = "Commands (prefix with ':'):\n{subcommands}\n\nAnything else is sent to FinGenie."
)]
struct ReplLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Switch page (clears the chat)
    Page { page: Page },
    /// Starter questions for this page
    Suggest,
    /// Income, expenses and balance
    Summary,
    /// List transactions
    Tx,
    /// Add a transaction
    #[command(name = "addtx")]
    AddTx {
        kind: TransactionType,
        amount: f64,
        /// YYYY-MM-DD
        date: NaiveDate,
        category: String,
        #[arg(required = true)]
        title: Vec<String>,
    },
    /// Delete a transaction
    #[command(name = "deltx")]
    DelTx { id: String },
    /// List goals
    Goals,
    /// Add a savings goal
    #[command(name = "addgoal")]
    AddGoal {
        target: f64,
        current: f64,
        /// YYYY-MM-DD
        date: NaiveDate,
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Delete a goal
    #[command(name = "delgoal")]
    DelGoal { id: String },
    /// Income vs expense by period, and spending by category
    Analytics { frame: Option<TimeFrame> },
    Signup {
        email: String,
        password: String,
        #[arg(required = true)]
        full_name: Vec<String>,
    },
    Login { email: String, password: String },
    Logout,
    /// Show the logged-in user
    #[command(name = "whoami")]
    WhoAmI,
    /// Toggle light/dark
    Theme,
    #[command(visible_aliases = ["q", "exit"])]
    Quit,
}

struct Client {
    assistant: Assistant,
    auth: AuthService,
    preferences: Preferences,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they do not interleave with the chat transcript.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    let local: Arc<dyn KeyValueStore> =
        Arc::new(JsonFileStore::new(settings.data_dir.join("local.json")));

    let client = Client {
        assistant: Assistant::initialize(&settings, Ledger::sample()),
        auth: AuthService::new(local.clone(), Arc::new(InMemoryStore::new())),
        preferences: Preferences::new(local),
    };

    info!("FinGenie terminal client starting");
    println!("FinGenie, your AI finance assistant. Type :help for commands.");
    println!("Insights are for educational purposes only, not financial advice.");
    client.print_page_header().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix(':') {
            match ReplLine::try_parse_from(command.split_whitespace()) {
                Ok(ReplLine { command: Command::Quit }) => break,
                Ok(ReplLine { command }) => {
                    if let Err(e) = client.run_command(command).await {
                        println!("! {}", e);
                    }
                }
                // Covers `:help` as well as usage errors.
                Err(e) => println!("{}", e.render()),
            }
        } else {
            client.chat(line).await;
        }
    }

    Ok(())
}

impl Client {
    async fn chat(&self, text: &str) {
        match self.assistant.send_message(text).await {
            SendOutcome::Answered | SendOutcome::Failed => {
                let conversation = self.assistant.conversation().await;
                if let Some(message) = conversation.messages().last() {
                    println!("{}", render::render_message(message));
                }
            }
            SendOutcome::Ignored | SendOutcome::Discarded => {
                let conversation = self.assistant.conversation().await;
                if let Some(status) = render::render_status(&conversation) {
                    println!("{}", status);
                }
            }
        }
    }

    async fn print_page_header(&self) {
        let conversation = self.assistant.conversation().await;
        println!("\n== {} ==", conversation.page());
        if conversation.page() == Page::Dashboard {
            println!("{}", render::render_summary(&self.assistant.summary().await));
        }
        if let Some(status) = render::render_status(&conversation) {
            println!("{}", status);
        }
    }

    async fn run_command(&self, command: Command) -> fingenie::Result<()> {
        match command {
            Command::Page { page } => {
                self.assistant.navigate(page).await;
                self.print_page_header().await;
            }
            Command::Suggest => {
                for suggestion in self.assistant.page().await.suggestions() {
                    println!("  - {}", suggestion);
                }
            }
            Command::Summary => {
                println!("{}", render::render_summary(&self.assistant.summary().await))
            }
            Command::Tx => {
                for t in self.assistant.transactions().await {
                    println!("{}", render::render_transaction(&t));
                }
            }
            Command::AddTx { kind, amount, date, category, title } => {
                let input = NewTransaction {
                    kind,
                    amount,
                    date,
                    category,
                    title: title.join(" "),
                };
                let t = self.assistant.add_transaction(input).await?;
                println!("Added {}", render::render_transaction(&t));
            }
            Command::DelTx { id } => {
                if self.assistant.delete_transaction(&id).await {
                    println!("Deleted transaction {}", id);
                } else {
                    println!("No transaction with id {}", id);
                }
            }
            Command::Goals => {
                for goal in self.assistant.goals().await {
                    println!("{}", render::render_goal(&goal));
                }
            }
            Command::AddGoal { target, current, date, name } => {
                let input = NewGoal {
                    target_amount: target,
                    current_amount: current,
                    target_date: date,
                    name: name.join(" "),
                };
                let goal = self.assistant.add_goal(input).await?;
                println!("Added {}", render::render_goal(&goal));
            }
            Command::DelGoal { id } => {
                if self.assistant.delete_goal(&id).await {
                    println!("Deleted goal {}", id);
                } else {
                    println!("No goal with id {}", id);
                }
            }
            Command::Analytics { frame } => {
                let (series, categories) = self.assistant.analytics(frame.unwrap_or_default()).await;
                println!("{}", render::render_analytics(&series, &categories));
            }
            Command::Signup { email, password, full_name } => {
                let user = self
                    .auth
                    .signup(&full_name.join(" "), &email, &password, &password)
                    .await?;
                println!("Welcome, {}", user.first_name());
            }
            Command::Login { email, password } => {
                let user = self.auth.login(&email, &password).await?;
                println!("Welcome, {}", user.first_name());
            }
            Command::Logout => {
                self.auth.logout().await?;
                println!("Logged out");
            }
            Command::WhoAmI => match self.auth.current_user().await? {
                Some(user) => println!("{} <{}>", user.full_name, user.email),
                None => println!("Not logged in"),
            },
            Command::Theme => {
                let theme = self.preferences.toggle_theme().await?;
                println!("Theme: {:?}", theme);
            }
            Command::Quit => {}
        }

        Ok(())
    }
}
