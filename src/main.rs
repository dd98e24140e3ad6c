//! RunMetrics - Track-Derived Running Metrics Engine
//!
//! Command-line entry point: drives imports, crops, deletions, and
//! leaderboard queries against the local database. Tracks are read from
//! canonical JSON sample arrays produced by an upstream decoder.

use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use runmetrics::splits::SplitUnit;
use runmetrics::storage::{self, Database};
use runmetrics::track::{Track, TrackPoint};
use runmetrics::workouts::WorkoutService;

const USAGE: &str = "\
Usage: runmetrics <command> [args]

Commands:
  import <track.json> [name]     Import a workout from a canonical track
  import-batch <track.json>...   Import several workouts in one batch
  list                           List workouts
  splits <workout-id>            Show a workout's splits
  crop <workout-id> <start-s> <end-s>   Trim seconds off both ends
  delete <workout-id>            Delete a workout
  leaderboard                    Show best-effort records
  rebuild                        Rebuild the leaderboard from scratch
  units <metric|imperial>        Set the split unit preference
";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("RunMetrics v{}", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print!("{USAGE}");
        return Ok(());
    };

    let mut settings = storage::load_settings()?;
    let db = Database::open(&storage::config::get_database_path())?;
    let mut service = WorkoutService::new(Arc::new(Mutex::new(db)), settings.split_unit);

    match command.as_str() {
        "import" => {
            let path = args.get(1).ok_or("import requires a track file")?;
            let name = args.get(2).cloned();
            let track = read_track(path)?;
            let workout = service.import_workout(name, track)?;
            println!(
                "Imported workout {} ({:.0} m, {:.0} s)",
                workout.id, workout.total_distance_m, workout.total_duration_s
            );
        }
        "import-batch" => {
            let paths = &args[1..];
            if paths.is_empty() {
                return Err("import-batch requires at least one track file".into());
            }
            let mut batch = Vec::with_capacity(paths.len());
            for path in paths {
                batch.push((None, read_track(path)?));
            }
            let workouts = service.import_workouts(batch)?;
            println!("Imported {} workouts", workouts.len());
        }
        "list" => {
            for workout in service.list_workouts()? {
                println!(
                    "{}  {}  {:>8.0} m  {:>7.0} s  {}",
                    workout.id,
                    workout.started_at.format("%Y-%m-%d %H:%M"),
                    workout.total_distance_m,
                    workout.total_duration_s,
                    workout.name.as_deref().unwrap_or("-"),
                );
            }
        }
        "splits" => {
            let id = parse_id(args.get(1))?;
            for split in service.splits(id)? {
                println!(
                    "{:>3}  {:>7.1} m  {:>7.1} s  {:>7.1} s/unit",
                    split.index, split.distance_m, split.duration_s, split.pace_s
                );
            }
        }
        "crop" => {
            let id = parse_id(args.get(1))?;
            let start: f64 = args.get(2).ok_or("crop requires a start trim")?.parse()?;
            let end: f64 = args.get(3).ok_or("crop requires an end trim")?.parse()?;
            let workout = service.crop_workout(id, start, end)?;
            println!(
                "Cropped workout {} to {:.0} m / {:.0} s",
                workout.id, workout.total_distance_m, workout.total_duration_s
            );
        }
        "delete" => {
            let id = parse_id(args.get(1))?;
            service.delete_workout(id)?;
            println!("Deleted workout {id}");
        }
        "leaderboard" => {
            for record in service.leaderboard().snapshot()? {
                println!(
                    "{:<14}  {:>8.1} s  {}  ({})",
                    record.distance_name,
                    record.time_s,
                    record.workout_id,
                    record.workout_date.format("%Y-%m-%d"),
                );
            }
        }
        "rebuild" => {
            let summary = service.leaderboard().rebuild_all()?;
            println!(
                "Rebuilt leaderboard: {} records written, {} distances without qualifying workouts",
                summary.written, summary.cleared
            );
        }
        "units" => {
            let unit = match args.get(1).map(String::as_str) {
                Some("metric") => SplitUnit::Metric,
                Some("imperial") => SplitUnit::Imperial,
                _ => return Err("units requires 'metric' or 'imperial'".into()),
            };
            service.set_split_unit(unit)?;
            settings.split_unit = unit;
            storage::save_settings(&settings)?;
            println!("Split unit set to {unit}");
        }
        other => {
            eprintln!("Unknown command: {other}");
            print!("{USAGE}");
        }
    }

    Ok(())
}

/// Read a canonical track: a JSON array of track points.
fn read_track(path: &str) -> Result<Track, Box<dyn Error>> {
    let content = std::fs::read_to_string(path)?;
    let points: Vec<TrackPoint> = serde_json::from_str(&content)?;
    Ok(Track::from_points(points)?)
}

fn parse_id(arg: Option<&String>) -> Result<Uuid, Box<dyn Error>> {
    let arg = arg.ok_or("a workout id is required")?;
    Ok(Uuid::parse_str(arg)?)
}
