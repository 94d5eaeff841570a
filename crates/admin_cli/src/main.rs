use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};
use engine::{AccountLogManager, Engine, RebuildSummary};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tally_admin")]
#[command(about = "Admin utilities for Tally (users, account logs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Logs(Logs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    /// Prompted for (twice, hidden) when omitted.
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct Logs {
    #[command(subcommand)]
    command: LogsCommand,
}

#[derive(Subcommand, Debug)]
enum LogsCommand {
    /// Rebuild account logs from scratch, for one account or all of them.
    Rebuild(LogsRebuildArgs),
}

#[derive(Args, Debug)]
struct LogsRebuildArgs {
    #[arg(long)]
    account: Option<Uuid>,
}

/// Disables raw mode again on drop, even on early return.
struct RawMode;

impl RawMode {
    fn enable() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read a line from the terminal without echoing it.
fn read_hidden(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut err = std::io::stderr();
    write!(err, "{prompt}")?;
    err.flush()?;

    let _raw = RawMode::enable()?;
    let mut input = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };
        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                write!(err, "\r\n")?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) => input.push(ch),
            _ => {}
        }
    }
    write!(err, "\r\n")?;
    Ok(input)
}

fn prompt_new_password() -> Result<String, Box<dyn Error + Send + Sync>> {
    for _ in 0..3 {
        let first = read_hidden("Password: ")?;
        if first.is_empty() {
            eprintln!("Password must not be empty.");
            continue;
        }
        if read_hidden("Confirm password: ")? == first {
            return Ok(first);
        }
        eprintln!("Passwords do not match. Try again.");
    }
    Err("too many attempts".into())
}

fn print_summary(summary: &RebuildSummary) {
    println!(
        "rebuilt {}: {} logs, balance {}",
        summary.account_id, summary.logs_written, summary.balance
    );
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let password = match args.password {
                Some(password) => password,
                None => prompt_new_password()?,
            };
            let engine = Engine::builder().database(db).build().await?;
            let user = engine.create_user(&args.username, &password).await?;
            println!("created user: {} ({})", user.username, user.id);
        }
        Command::Logs(Logs {
            command: LogsCommand::Rebuild(args),
        }) => {
            let manager = AccountLogManager::new(db);
            match args.account {
                Some(account_id) => print_summary(&manager.rebuild_logs(account_id, None).await?),
                None => {
                    let summaries = manager.rebuild_all().await?;
                    summaries.iter().for_each(print_summary);
                    println!("rebuilt {} accounts", summaries.len());
                }
            }
        }
    }

    Ok(())
}
