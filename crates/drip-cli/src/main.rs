//! `drip` — segment-sequenced drip email campaigns.
//!
//! Reads `drip.toml` (or the path given with `--config`), opens the SQLite
//! contact worksheet and the SMTP transport, then runs one command.
//!
//! # Usage
//!
//! ```text
//! drip serve                                   # intake + segment selection over HTTP
//! drip run [--date 2024-05-01]                 # one scheduler pass; run daily from cron
//! drip assign --email a@example.com --segment "Credit Building"
//! drip invite                                  # email selection links to pending contacts
//! drip register --name Alice --email a@example.com
//! ```

mod config;
mod credentials;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use drip_campaign::{Campaign, smtp::SmtpTransport};
use drip_store_sqlite::SqliteWorksheet;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::DripConfig;

#[derive(Parser)]
#[command(author, version, about = "Segment-sequenced drip email campaigns")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "drip.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve contact intake and segment selection over HTTP.
  Serve,
  /// Send everything due and advance each contact's cursor.
  Run {
    /// Treat this date as today (YYYY-MM-DD).
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Assign a segment to a contact awaiting selection.
  Assign {
    #[arg(long)]
    email:   String,
    #[arg(long)]
    segment: String,
  },
  /// Email segment-selection links to every pending contact.
  Invite,
  /// Add a contact awaiting segment selection.
  Register {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    email: String,
  },
}

type DripCampaign = Campaign<SqliteWorksheet, SmtpTransport>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = DripConfig::load(&cli.config)?;
  let campaign = open_campaign(&config).await?;

  match cli.command {
    Command::Serve => serve(&config, campaign).await,
    Command::Run { date } => {
      let today = date.unwrap_or_else(|| Local::now().date_naive());
      let report = campaign
        .run_once(today)
        .await
        .context("campaign pass could not start")?;
      println!("{today}: {report}");
      Ok(())
    }
    Command::Assign { email, segment } => {
      let assigned = campaign
        .assign_on(&email, &segment, Local::now().date_naive())
        .await
        .context("segment assignment failed")?;
      if assigned {
        println!("assigned {segment:?} to {email}");
      } else {
        println!("unknown segment, segment already set, or contact not found");
      }
      Ok(())
    }
    Command::Invite => {
      let sent = campaign.invite_pending().await.context("inviting pending contacts failed")?;
      println!("sent {sent} invitations");
      Ok(())
    }
    Command::Register { name, email } => {
      let row = campaign.register(&name, &email).await.context("registration failed")?;
      println!("registered {email} at row {row}");
      Ok(())
    }
  }
}

/// Open the worksheet, the mail transport, and the sequence folder. Any
/// missing piece is fatal here, before a single row is touched.
async fn open_campaign(config: &DripConfig) -> anyhow::Result<DripCampaign> {
  if let Some(parent) = config.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let sheet = SqliteWorksheet::open(&config.store_path, config.worksheet.clone())
    .await
    .with_context(|| format!("failed to open store at {:?}", config.store_path))?;

  let credentials = credentials::resolve(&config.mail)?;
  let transport =
    SmtpTransport::new(&config.mail, credentials).context("failed to configure SMTP transport")?;

  Campaign::new(sheet, transport, config.campaign.clone()).context("invalid campaign settings")
}

async fn serve(config: &DripConfig, campaign: DripCampaign) -> anyhow::Result<()> {
  let app = drip_api::api_router(Arc::new(campaign)).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", config.host, config.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
