//! `fingerlog` command-line front end.
//!
//! Ties the device session, pipeline, and store together for operator use:
//! watch the sensor and record visits, run guided enrollments, and browse
//! the attendance log.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use fingerlog_core::SlotId;
use fingerlog_device::{
    available_ports, DeviceSession, ListenerNotice, SerialConfig,
};
use fingerlog_pipeline::{
    AttendancePipeline, DetectionOutcome, EnrollmentDriver, EnrollmentUpdate, PipelineEvent,
};
use fingerlog_storage::repositories::{
    IdentityRepository, SqliteIdentityRepository, SqliteVisitRepository, VisitRepository,
};
use fingerlog_storage::{Database, DatabaseConfig, NewIdentity, VisitFilter};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fingerlog", version, about = "Fingerprint attendance logger")]
struct Cli {
    /// SQLite database path.
    #[arg(long, global = true, default_value = "attendance.db")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct PortArgs {
    /// Serial port of the fingerprint sensor (e.g. /dev/ttyUSB0, COM4).
    #[arg(long)]
    port: String,

    /// Baud rate of the sensor firmware.
    #[arg(long, default_value_t = 9600)]
    baud: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the sensor and record a visit for every recognized finger.
    Watch(PortArgs),

    /// Enroll a fingerprint and register the identity.
    Enroll {
        #[command(flatten)]
        port: PortArgs,

        /// Sensor template slot to enroll into (1-127).
        #[arg(long)]
        slot: u8,

        /// Display name of the person.
        #[arg(long)]
        name: String,

        /// Institutional id (student or employee number).
        #[arg(long)]
        external_id: String,

        /// Optional portrait image file to store alongside the identity.
        #[arg(long)]
        portrait: Option<PathBuf>,
    },

    /// List recorded visits, newest first.
    Visits {
        /// Lower time bound, inclusive (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        from: Option<String>,

        /// Upper time bound, inclusive (RFC 3339 or YYYY-MM-DD).
        #[arg(long)]
        to: Option<String>,

        /// Case-insensitive substring matched against name or external id.
        #[arg(long)]
        filter: Option<String>,
    },

    /// List enrolled identities.
    Identities,

    /// List serial ports visible on this machine.
    Ports,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Watch(port) => watch(&cli.database, &port).await,
        Command::Enroll {
            port,
            slot,
            name,
            external_id,
            portrait,
        } => enroll(&cli.database, &port, slot, name, external_id, portrait).await,
        Command::Visits { from, to, filter } => visits(&cli.database, from, to, filter).await,
        Command::Identities => identities(&cli.database).await,
        Command::Ports => ports(),
    }
}

async fn open_database(path: &str) -> Result<Database> {
    let db = Database::new(DatabaseConfig::new(path))
        .await
        .with_context(|| format!("could not open database at {path}"))?;
    db.health_check()
        .await
        .with_context(|| format!("database at {path} failed its health check"))?;
    Ok(db)
}

async fn connect(args: &PortArgs) -> Result<DeviceSession> {
    let config = SerialConfig::new(&args.port).baud_rate(args.baud);
    DeviceSession::connect(&config)
        .await
        .with_context(|| format!("could not connect to sensor on {}", args.port))
}

async fn watch(database: &str, args: &PortArgs) -> Result<()> {
    let db = open_database(database).await?;
    let pipeline = AttendancePipeline::new(db.pool().clone());
    let mut session = connect(args).await?;

    println!("Watching {} for fingerprints; Ctrl-C to stop.", args.port);
    let result = run_watch(&mut session, pipeline).await;

    session.disconnect().await;
    db.close().await;
    result
}

/// The watch loop proper: print outcomes until interrupted or the device
/// fails.
///
/// A terminal listener failure is an error result so the process exits
/// non-zero; Ctrl-C is a clean stop.
async fn run_watch(session: &mut DeviceSession, pipeline: AttendancePipeline) -> Result<()> {
    let events = session.subscribe().await;
    let mut notices = session
        .take_notices()
        .context("listener notices already taken")?;
    session.enter_detection_mode().await?;

    let (outcome_tx, mut outcome_rx) = mpsc::channel(32);
    let worker = tokio::spawn(async move { pipeline.run(events, outcome_tx).await });

    let mut failure = None;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            notice = notices.recv() => {
                if let Some(ListenerNotice::Failed(error)) = notice {
                    failure = Some(error);
                    break;
                }
            }
            event = outcome_rx.recv() => match event {
                Some(PipelineEvent::Detection(DetectionOutcome::Recognized { identity, visit })) => {
                    println!(
                        "{}  {} ({}) - visit recorded",
                        visit.observed_at.format("%Y-%m-%d %H:%M:%S"),
                        identity.name,
                        identity.external_id,
                    );
                }
                Some(PipelineEvent::Detection(DetectionOutcome::Unrecognized { slot })) => {
                    println!("finger matched unenrolled slot {slot}; nothing recorded");
                }
                Some(PipelineEvent::Enrollment(_)) => {}
                None => break,
            },
        }
    }

    worker.abort();
    match failure {
        Some(error) => Err(error).context("device failure while watching"),
        None => Ok(()),
    }
}

async fn enroll(
    database: &str,
    args: &PortArgs,
    slot: u8,
    name: String,
    external_id: String,
    portrait: Option<PathBuf>,
) -> Result<()> {
    let slot = SlotId::new(slot)?;
    let mut new = NewIdentity::new(slot, name, external_id);
    if let Some(path) = portrait {
        let blob = tokio::fs::read(&path)
            .await
            .with_context(|| format!("could not read portrait {}", path.display()))?;
        new = new.portrait(blob);
    }

    let db = open_database(database).await?;
    let driver = EnrollmentDriver::new(db.pool().clone());
    let mut session = connect(args).await?;

    let (progress_tx, mut progress_rx) = mpsc::channel::<EnrollmentUpdate>(16);
    let reporter = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            println!("[{:>3}%] {}", update.progress, update.phase.message());
        }
    });

    let result = driver.run(&mut session, new, progress_tx).await;
    session.disconnect().await;
    let _ = reporter.await;

    let identity = result?;
    println!(
        "Enrolled {} ({}) in slot {}.",
        identity.name, identity.external_id, identity.slot_id
    );
    db.close().await;
    Ok(())
}

async fn visits(
    database: &str,
    from: Option<String>,
    to: Option<String>,
    text: Option<String>,
) -> Result<()> {
    let mut filter = VisitFilter::new();
    if let Some(from) = from {
        filter = filter.from(parse_moment(&from, false)?);
    }
    if let Some(to) = to {
        filter = filter.to(parse_moment(&to, true)?);
    }
    if let Some(text) = text {
        filter = filter.text(text);
    }

    let db = open_database(database).await?;
    let visits = SqliteVisitRepository::new(db.pool().clone());

    let entries = visits.query(&filter).await?;
    for entry in &entries {
        println!(
            "{}  {:<24} {:<12} slot {}",
            entry.observed_at.format("%Y-%m-%d %H:%M:%S"),
            entry.name,
            entry.external_id,
            entry.slot_id,
        );
    }
    println!("{} visit(s)", entries.len());
    db.close().await;
    Ok(())
}

async fn identities(database: &str) -> Result<()> {
    let db = open_database(database).await?;
    let identities = SqliteIdentityRepository::new(db.pool().clone());

    for identity in identities.list_all().await? {
        println!(
            "slot {:>3}  {:<24} {:<12} enrolled {}",
            identity.slot_id,
            identity.name,
            identity.external_id,
            identity.created_at.format("%Y-%m-%d"),
        );
    }
    db.close().await;
    Ok(())
}

fn ports() -> Result<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        println!("{port}");
    }
    Ok(())
}

/// Parse a user-supplied time bound.
///
/// Accepts a full RFC 3339 timestamp or a bare date; bare dates expand to
/// the start or end of that day (UTC) so `--from` and `--to` are inclusive.
fn parse_moment(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(moment) = DateTime::parse_from_rfc3339(value) {
        return Ok(moment.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid time bound '{value}'; use RFC 3339 or YYYY-MM-DD"))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .context("invalid time of day")?;
    Ok(time.and_utc())
}
