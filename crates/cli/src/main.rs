//! TechStore CLI - Database migrations and chat queue tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the chat schema and session table
//! ts-cli migrate
//!
//! # Inspect the waiting queue
//! ts-cli queue list --pending
//! ts-cli queue list --search notebook --limit 10
//! ts-cli queue list --since 2024-06-01 --until 2024-06-08
//!
//! # List Gemini models available to the configured key
//! ts-cli models
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use techstore_chat::models::QueueFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(author, version, about = "TechStore chat CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect the waiting queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },
    /// List Gemini models usable for chat
    Models {
        /// Include models that cannot generate content
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum QueueAction {
    /// List queue records, newest first
    List {
        /// Only records not yet handled
        #[arg(long, conflicts_with = "handled")]
        pending: bool,

        /// Only handled records
        #[arg(long)]
        handled: bool,

        /// Case-insensitive content search
        #[arg(short, long)]
        search: Option<String>,

        /// Only records created at or after this date (YYYY-MM-DD, UTC) or RFC 3339 instant
        #[arg(long, value_parser = parse_instant)]
        since: Option<DateTime<Utc>>,

        /// Only records created before this date (YYYY-MM-DD, UTC) or RFC 3339 instant
        #[arg(long, value_parser = parse_instant)]
        until: Option<DateTime<Utc>>,

        /// Maximum records to show
        #[arg(short, long, default_value_t = 50)]
        limit: u32,
    },
}

/// Parse `YYYY-MM-DD` as UTC midnight, or a full RFC 3339 timestamp.
fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DD or an RFC 3339 timestamp: {e}"))
}

impl QueueAction {
    fn filter(&self) -> QueueFilter {
        match self {
            Self::List {
                pending,
                handled,
                search,
                since,
                until,
                limit,
            } => QueueFilter {
                handled: match (pending, handled) {
                    (true, _) => Some(false),
                    (_, true) => Some(true),
                    _ => None,
                },
                search: search.clone(),
                since: *since,
                until: *until,
                limit: *limit,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Queue { action } => commands::queue::list(&action.filter()).await?,
        Commands::Models { all } => commands::models::list(all).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_filter(args: &[&str]) -> QueueFilter {
        let cli = Cli::try_parse_from(args).expect("parse");
        match cli.command {
            Commands::Queue { action } => action.filter(),
            _ => panic!("expected queue command"),
        }
    }

    #[test]
    fn test_queue_list_defaults() {
        let filter = queue_filter(&["ts-cli", "queue", "list"]);
        assert_eq!(filter.handled, None);
        assert_eq!(filter.search, None);
        assert_eq!(filter.since, None);
        assert_eq!(filter.until, None);
        assert_eq!(filter.limit, 50);
    }

    #[test]
    fn test_queue_list_pending_with_search() {
        let filter = queue_filter(&["ts-cli", "queue", "list", "--pending", "-s", "mouse", "-l", "5"]);
        assert_eq!(filter.handled, Some(false));
        assert_eq!(filter.search.as_deref(), Some("mouse"));
        assert_eq!(filter.limit, 5);
    }

    #[test]
    fn test_queue_list_date_range() {
        let filter = queue_filter(&[
            "ts-cli",
            "queue",
            "list",
            "--since",
            "2024-06-01",
            "--until",
            "2024-06-08T12:00:00-03:00",
        ]);
        assert_eq!(
            filter.since.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-06-01T00:00:00+00:00")
        );
        assert_eq!(
            filter.until.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-06-08T15:00:00+00:00")
        );
    }

    #[test]
    fn test_queue_list_rejects_bad_date() {
        assert!(Cli::try_parse_from(["ts-cli", "queue", "list", "--since", "yesterday"]).is_err());
    }

    #[test]
    fn test_pending_conflicts_with_handled() {
        assert!(Cli::try_parse_from(["ts-cli", "queue", "list", "--pending", "--handled"]).is_err());
    }
}
