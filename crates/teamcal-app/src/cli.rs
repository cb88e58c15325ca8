use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use teamcal_service::calendar::service::import::HandleMethod;

#[derive(Debug, Parser)]
#[command(name = "teamcal")]
#[command(about = "Import, expand and export team calendar events")]
pub struct Cli {
    /// Time zone of the acting user; defaults to `calendar.timezone`
    #[arg(long, global = true, value_parser = parse_zone)]
    pub timezone: Option<Tz>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import feeds and report what was stored
    Import(FeedArgs),
    /// Import feeds and list the stored events
    List {
        #[command(flatten)]
        feeds: FeedArgs,

        /// Range start (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        from: Option<DateTime<Utc>>,

        /// Range end (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        to: Option<DateTime<Utc>>,

        /// Replace recurring series by their occurrences
        #[arg(long)]
        expand: bool,
    },
    /// Import feeds and print the stored events as one calendar
    Export {
        #[command(flatten)]
        feeds: FeedArgs,

        /// METHOD written into the exported calendar
        #[arg(long)]
        itip_method: Option<String>,
    },
    /// Import feeds and print the recurrence settings of every series
    Recurrence(FeedArgs),
}

#[derive(Debug, Args)]
pub struct FeedArgs {
    /// iCalendar files, imported in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target calendar id
    #[arg(short, long, default_value_t = 1)]
    pub calendar: i64,

    /// Method used when a feed declares none
    #[arg(short, long, value_enum)]
    pub method: Option<MethodArg>,

    /// Store events even if validation produced warnings
    #[arg(long)]
    pub ignore_warnings: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    AddUpdate,
    Cancel,
}

impl From<MethodArg> for HandleMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::AddUpdate => Self::AddUpdate,
            MethodArg::Cancel => Self::Cancel,
        }
    }
}

fn parse_zone(value: &str) -> Result<Tz, String> {
    value
        .parse::<Tz>()
        .map_err(|_| format!("unknown time zone: {value}"))
}

/// Accepts a bare date (UTC midnight) or an RFC 3339 instant.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid date {value}: {e}"))
}
