//! Haulcount CLI
//!
//! Manual on-site load tallying: each invocation loads the persisted
//! session from the embedded database, applies one operation, and saves the
//! updated snapshot back. GPS acquisition stays outside this binary; the
//! `observe` command takes explicit coordinates.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use haulcount_core::export::write_csv;
use haulcount_core::ledger::DEFAULT_CAPACITY;
use haulcount_core::{
    Coordinate, GeoError, LoadLedger, Session, SledSnapshotStore, SnapshotStore, StoreError,
    Transition, Zone, ZoneError,
};

/// How many loads the status view lists.
const RECENT_DISPLAY: usize = 20;

/// Count vehicle loads crossing a circular geofence
#[derive(Parser, Debug)]
#[command(name = "haulcount")]
#[command(about = "Track vehicles crossing a geofence and tally loads", long_about = None)]
struct Args {
    /// Directory for the embedded state database
    #[arg(long, default_value = "haulcount-db")]
    db: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show zone configuration, vehicles and recent loads
    Status,

    /// Register a vehicle without observing it
    AddVehicle { id: String },

    /// Remove a vehicle together with all loads credited to it
    RemoveVehicle { id: String },

    /// Record the vehicle entering the zone (manual event)
    Enter { id: String },

    /// Record the vehicle exiting the zone (manual event)
    Exit { id: String },

    /// Feed one position sample for a vehicle
    Observe {
        id: String,

        /// Latitude in degrees
        lat: f64,

        /// Longitude in degrees
        lon: f64,

        /// Do not establish the zone center from this sample when unset
        #[arg(long)]
        no_set_center: bool,
    },

    /// Set the geofence radius in meters (must be greater than 5)
    SetRadius { meters: f64 },

    /// Clear the geofence center; vehicle states are untouched
    ResetCenter,

    /// Dump all loads as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("vehicle id must not be empty")]
    EmptyVehicleId,

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),

    #[error("export failed: {0}")]
    Io(#[from] io::Error),
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    if let Err(e) = run(args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let store = SledSnapshotStore::open(&args.db)?;

    let mut session = match store.load()? {
        Some(snapshot) => Session::from_snapshot(snapshot, DEFAULT_CAPACITY)?,
        None => Session::new(Zone::default(), LoadLedger::default()),
    };

    let dirty = apply(&mut session, &args.command)?;

    if dirty {
        // A failed save is reported, not retried; the in-memory result above
        // already went to the operator and the prior snapshot stays as the
        // last known good state on disk.
        store.save(&session.snapshot())?;
    }

    Ok(())
}

/// Apply one command to the session. Returns whether the snapshot changed
/// and needs to be saved.
fn apply(session: &mut Session, command: &Command) -> Result<bool, CliError> {
    match command {
        Command::Status => {
            print_status(session);
            Ok(false)
        }

        Command::AddVehicle { id } => {
            let id = clean_id(id)?;
            session.add_vehicle(id);
            info!("vehicle {} registered", id);
            Ok(true)
        }

        Command::RemoveVehicle { id } => {
            let id = clean_id(id)?;
            let dropped = session.remove_vehicle(id);
            info!("vehicle {} removed, {} load(s) dropped", id, dropped);
            Ok(true)
        }

        Command::Enter { id } => {
            let id = clean_id(id)?;
            report_transition(session.observe_inside(id, Utc::now()), id);
            Ok(true)
        }

        Command::Exit { id } => {
            let id = clean_id(id)?;
            report_transition(session.observe_outside(id), id);
            Ok(true)
        }

        Command::Observe {
            id,
            lat,
            lon,
            no_set_center,
        } => {
            let id = clean_id(id)?;
            let point = Coordinate::new(*lat, *lon)?;

            // First fix establishes the center, like the on-site workflow:
            // walk to the loading point and take a sample there.
            if session.zone().center().is_none() && !*no_set_center {
                session.zone_mut().set_center(point);
                info!("zone center set to {:.5}, {:.5}", point.lat, point.lon);
            }

            if let Some(distance) = session.zone().distance_to(point) {
                info!("distance to center: {:.1} m", distance);
            }

            report_transition(session.observe_position(id, point, Utc::now()), id);
            Ok(true)
        }

        Command::SetRadius { meters } => {
            session.zone_mut().set_radius(*meters)?;
            info!("radius set to {} m", meters);
            Ok(true)
        }

        Command::ResetCenter => {
            session.zone_mut().reset_center();
            info!("zone center cleared; set it again with `observe`");
            Ok(true)
        }

        Command::Export { out } => {
            match out {
                Some(path) => {
                    let mut file = File::create(path)?;
                    write_csv(session.ledger(), &mut file)?;
                    info!("exported {} load(s) to {}", session.ledger().count(), path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    write_csv(session.ledger(), &mut handle)?;
                    handle.flush()?;
                }
            }
            Ok(false)
        }
    }
}

/// Boundary validation for vehicle ids: trimmed and non-empty.
fn clean_id(raw: &str) -> Result<&str, CliError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(CliError::EmptyVehicleId);
    }
    Ok(id)
}

fn report_transition(transition: Transition, id: &str) {
    match transition {
        Transition::Entered { load } => {
            info!("{} entered the zone - load credited at {}", id, load.timestamp)
        }
        Transition::StillInside => info!("{} is still inside - no load", id),
        Transition::Exited => info!("{} exited the zone - armed for the next load", id),
        Transition::StillOutside => info!("{} is still outside", id),
        Transition::ZoneUnset => info!("no zone center set - sample ignored"),
    }
}

fn print_status(session: &Session) {
    match session.zone().center() {
        Some(center) => println!(
            "Zone: center {:.5}, {:.5} | radius {} m",
            center.lat,
            center.lon,
            session.zone().radius_m()
        ),
        None => println!(
            "Zone: center not set | radius {} m",
            session.zone().radius_m()
        ),
    }

    println!("Vehicles ({}):", session.registry().len());
    for vehicle in session.registry().iter() {
        let badge = if vehicle.is_inside { "INSIDE" } else { "OUTSIDE" };
        println!("  {:<16} {}", vehicle.id, badge);
    }

    println!("Total loads: {}", session.ledger().count());
    let recent = session.ledger().recent(RECENT_DISPLAY);
    if !recent.is_empty() {
        println!("Recent loads (newest first):");
        for load in recent {
            println!(
                "  {}  {}",
                load.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                load.vehicle_id
            );
        }
    }
}
