mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::commands::{open_service, parse_month};
use crate::config::GlobalConfig;

#[derive(Parser)]
#[command(name = "innsync")]
#[command(about = "Room-booking calendar for a small property: month grids, CSV export, backups")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the month grid for every room
    Status {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// List the rooms
    Rooms,
    /// Add a booking
    Add {
        /// Room id (see `innsync rooms`)
        room: String,

        /// Checkin day (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Checkout day (YYYY-MM-DD, exclusive)
        #[arg(short, long)]
        end: String,

        /// Guest name
        #[arg(short, long, default_value = "")]
        guest: String,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        note: String,
    },
    /// Edit a booking in place
    Edit {
        /// Booking id (shown in `innsync status`)
        id: String,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        guest: Option<String>,

        #[arg(short, long)]
        note: Option<String>,
    },
    /// Cancel a booking
    Cancel {
        /// Booking id (shown in `innsync status`)
        id: String,
    },
    /// Export bookings as CSV
    Export {
        /// Only export this month (YYYY-MM)
        #[arg(short, long)]
        month: Option<String>,

        /// Output file (defaults to bookings_<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a backup of all bookings now
    Backup,
    /// Replace all bookings from the latest backup
    Restore {
        /// Confirm the destructive restore
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; user-facing output stays on stdout.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = GlobalConfig::load()?;

    match cli.command {
        Commands::Status { month } => {
            let service = open_service(&config)?;
            let first = resolve_month(month.as_deref())?;
            commands::status::run(&service, first)
        }
        Commands::Rooms => commands::rooms::run(),
        Commands::Add {
            room,
            start,
            end,
            guest,
            note,
        } => {
            let mut service = open_service(&config)?;
            commands::mutate::add(&mut service, &room, &start, &end, &guest, &note).await
        }
        Commands::Edit {
            id,
            start,
            end,
            guest,
            note,
        } => {
            let mut service = open_service(&config)?;
            let args = commands::mutate::EditArgs {
                start,
                end,
                guest,
                note,
            };
            commands::mutate::edit(&mut service, &id, args).await
        }
        Commands::Cancel { id } => {
            let mut service = open_service(&config)?;
            commands::mutate::cancel(&mut service, &id).await
        }
        Commands::Export { month, output } => {
            let service = open_service(&config)?;
            let first = month.as_deref().map(parse_month).transpose()?;
            commands::export::run(&service, first, output)
        }
        Commands::Backup => {
            let mut service = open_service(&config)?;
            commands::backup::backup(&mut service).await
        }
        Commands::Restore { yes } => {
            let mut service = open_service(&config)?;
            commands::backup::restore(&mut service, yes).await
        }
    }
}

/// `YYYY-MM` argument, or the current month.
fn resolve_month(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(s) => parse_month(s),
        None => {
            let today = Local::now().date_naive();
            Ok(NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                .unwrap_or(today))
        }
    }
}
