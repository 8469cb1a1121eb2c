use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

use rep_counter::config::Config;
use rep_counter::replay::read_recording;
use rep_counter::session::{FeedOutcome, SessionController};
use rep_counter::tracker::ExerciseKind;

const CONFIG_PATH: &str = "config.toml";

/// Replays a recorded pose stream and counts repetitions
#[derive(Parser, Debug)]
#[command(name = "rep-counter", version, about)]
struct Args {
    /// TOML configuration; built-in presets are used if missing or invalid
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_PATH)]
    config: PathBuf,

    /// JSON Lines pose recording ("-" for stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    input: String,

    /// Exercise to count; repeat to count several at once (default: all)
    #[arg(short, long = "exercise", value_name = "KIND")]
    exercises: Vec<ExerciseKind>,

    /// Overrides [app] log_level
    #[arg(long)]
    log_level: Option<String>,

    /// Print final states as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    args.exercises = selected_exercises(std::mem::take(&mut args.exercises));

    // Installed before the config is read so its fallback warning is shown
    let initial = match args.log_level.as_deref() {
        Some(level) => parse_level(level, "--log-level")?,
        None => LevelFilter::INFO,
    };
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let config = Config::load_or_default(&args.config);
    if args.log_level.is_none() {
        filter_handle.reload(parse_level(&config.app.log_level, "[app] log_level")?)?;
    }
    info!("rep-counter {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_VERSION"));

    let mut session = SessionController::new();
    for &kind in &args.exercises {
        session.register_exercise(kind, config.exercises.get(kind).clone())?;
    }

    let reader: Box<dyn io::BufRead> = if args.input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(&args.input).with_context(|| format!("opening {}", args.input))?;
        Box::new(BufReader::new(file))
    };

    let mut frames = 0u64;
    let mut evaluated = 0u64;
    for result in read_recording(reader) {
        let input = result?;
        frames += 1;
        for &kind in &args.exercises {
            if let FeedOutcome::Evaluated(update) = session.feed(kind, &input)? {
                evaluated += 1;
                if update.count_delta > 0.0 {
                    println!(
                        "[{:>8.3}s] {:<8} count={} ({})",
                        input.timestamp().as_secs_f64(),
                        kind,
                        update.count,
                        update.feedback
                    );
                }
            }
        }
    }
    info!(frames, evaluated, "replay finished");

    if args.json {
        let states: Vec<_> = args
            .exercises
            .iter()
            .map(|&kind| session.state(kind).map(|state| (kind, state.clone())))
            .collect::<Result<_, _>>()?;
        println!("{}", serde_json::to_string_pretty(&states)?);
    } else {
        for &kind in &args.exercises {
            let state = session.state(kind)?;
            println!(
                "{}: {} reps (phase {:?}, last feedback: {})",
                kind, state.count, state.phase, state.feedback
            );
        }
    }

    Ok(())
}

/// All exercises when none were named, each kind once
fn selected_exercises(mut requested: Vec<ExerciseKind>) -> Vec<ExerciseKind> {
    if requested.is_empty() {
        return ExerciseKind::ALL.to_vec();
    }
    requested.sort();
    requested.dedup();
    requested
}

fn parse_level(level: &str, source: &str) -> Result<LevelFilter> {
    level
        .parse()
        .with_context(|| format!("invalid {source} {level:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rep_counter::config::ExerciseConfig;

    #[test]
    fn test_repeated_exercise_kept_once() {
        let kinds = selected_exercises(vec![
            ExerciseKind::Squat,
            ExerciseKind::PushUp,
            ExerciseKind::Squat,
        ]);
        assert_eq!(kinds, vec![ExerciseKind::PushUp, ExerciseKind::Squat]);
        assert_eq!(selected_exercises(Vec::new()), ExerciseKind::ALL.to_vec());

        let mut session = SessionController::new();
        for kind in kinds {
            session.register_exercise(kind, ExerciseConfig::preset(kind)).unwrap();
        }
    }

    #[test]
    fn test_bad_log_level_reported() {
        assert_eq!(parse_level("debug", "--log-level").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARN", "--log-level").unwrap(), LevelFilter::WARN);
        let err = parse_level("loud", "[app] log_level").unwrap_err();
        assert!(err.to_string().contains("[app] log_level"));
        assert!(err.to_string().contains("loud"));
    }
}
