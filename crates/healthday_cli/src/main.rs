//! CLI entry point.
//!
//! # Responsibility
//! - Verify `healthday_core` linkage (`ping`, also the default).
//! - Print one range series as JSON for quick local inspection.
//!
//! The database path and logging come from `TrackerConfig::from_env()`.

use clap::{Parser, Subcommand};
use healthday_core::db::open_db;
use healthday_core::{
    init_logging_from_config, DayShape, SqliteDayRepository, SqliteGoalRepository, TrackerConfig,
    TrackerService,
};
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "healthday", about = "HealthDay engine inspection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print core ping and version
    Ping,
    /// Print a day/week/month series as JSON
    Query {
        /// User id (UUID)
        user_id: String,
        /// steps|sleep|nutrition|water|workout|body
        metric: String,
        /// day|week|month
        range: String,
        /// Reference instant in epoch milliseconds; defaults to the system clock
        now_ms: Option<i64>,
        /// Append the goal to a day series
        #[arg(long)]
        versus_goal: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Ping) {
        Command::Ping => {
            println!("healthday_core ping={}", healthday_core::ping());
            println!("healthday_core version={}", healthday_core::core_version());
            ExitCode::SUCCESS
        }
        Command::Query {
            user_id,
            metric,
            range,
            now_ms,
            versus_goal,
        } => {
            let day_shape = if versus_goal {
                DayShape::VersusGoal
            } else {
                DayShape::Actual
            };
            match run_query(&user_id, &metric, &range, now_ms, day_shape) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(message) => {
                    eprintln!("error: {message}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn run_query(
    user_id: &str,
    metric: &str,
    range: &str,
    now_ms: Option<i64>,
    day_shape: DayShape,
) -> Result<String, String> {
    let now_ms = match now_ms {
        Some(now_ms) => now_ms,
        None => system_now_ms()?,
    };

    let config = TrackerConfig::from_env();
    init_logging_from_config(&config)?;
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let service = TrackerService::new(
        SqliteDayRepository::try_new(&conn).map_err(|err| err.to_string())?,
        SqliteGoalRepository::try_new(&conn).map_err(|err| err.to_string())?,
    );
    let series = service
        .query_range(user_id, metric, range, day_shape, now_ms)
        .map_err(|err| format!("{} ({})", err, err.code()))?;
    serde_json::to_string_pretty(&series).map_err(|err| err.to_string())
}

fn system_now_ms() -> Result<i64, String> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|err| format!("system clock before unix epoch: {err}"))?;
    i64::try_from(elapsed.as_millis()).map_err(|err| err.to_string())
}
