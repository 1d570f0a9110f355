//! Scripted four-way intersection scenarios.
//!
//! Vehicles arrive from the requested directions, run concurrently through
//! a shared engine under one policy, and the final state is reported. Under
//! detection, `--recover` aborts one vehicle on the cycle and drains the
//! rest in a safe order.
//!
//! ```text
//!            R_North ──▶ R_East
//!               ▲           │
//!               │           ▼
//!            R_West  ◀── R_South
//! ```

use std::time::Duration;

use gridlock_driver::{Simulation, SimulationConfig, SimulationReport, TracingFormat};
use gridlock_engine::{Engine, EngineConfig, EngineError, Resolution};
use gridlock_model::{Direction, ParseError, ProcessId};
use gridlock_policy::{PolicyMode, UnknownPolicy};
use serde::Serialize;
use tracing::Level;

/// Command-line usage.
pub const USAGE: &str = "\
Usage: intersection [OPTIONS] [DIRECTION...]

Options:
  --policy <detection|avoidance|prevention>   admission policy (default: detection)
  --stagger <MS>                              delay between arrivals in milliseconds
  --log-format <pretty|compact|json>          tracing output format
  --verbose                                   log policy verdicts
  --recover                                   break a detected deadlock and drain

Directions default to north east south west.";

// ─────────────────────────────────────────────────────────────────────────────
// Arguments
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from parsing the command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    /// A flag was given without its value.
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    /// An unrecognized flag.
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    /// `--stagger` was not a number of milliseconds.
    #[error("invalid stagger '{0}'")]
    InvalidStagger(String),
    /// Bad `--policy`.
    #[error(transparent)]
    Policy(#[from] UnknownPolicy),
    /// Bad `--log-format`.
    #[error(transparent)]
    Format(#[from] gridlock_driver::UnknownFormat),
    /// Bad direction.
    #[error(transparent)]
    Direction(#[from] ParseError),
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioArgs {
    /// Admission policy for the run.
    pub policy: PolicyMode,
    /// Vehicle arrival order.
    pub directions: Vec<Direction>,
    /// Delay between arrivals.
    pub stagger: Duration,
    /// Tracing output format.
    pub log_format: TracingFormat,
    /// Tracing level.
    pub log_level: Level,
    /// Whether to break a detected deadlock afterwards.
    pub recover: bool,
}

impl Default for ScenarioArgs {
    fn default() -> Self {
        Self {
            policy: PolicyMode::Detection,
            directions: Direction::ALL.to_vec(),
            stagger: Duration::ZERO,
            log_format: TracingFormat::Compact,
            log_level: Level::INFO,
            recover: false,
        }
    }
}

impl ScenarioArgs {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns an [`ArgsError`] for unknown options or unparsable values.
    pub fn parse<I, S>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Self::default();
        let mut directions: Vec<Direction> = Vec::new();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let mut value = |flag: &'static str| {
                args.next()
                    .map(|v| v.as_ref().to_owned())
                    .ok_or(ArgsError::MissingValue(flag))
            };
            match arg {
                "--policy" => parsed.policy = value("--policy")?.parse()?,
                "--log-format" => parsed.log_format = value("--log-format")?.parse()?,
                "--stagger" => {
                    let raw = value("--stagger")?;
                    let millis = raw
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidStagger(raw.clone()))?;
                    parsed.stagger = Duration::from_millis(millis);
                }
                "--verbose" => parsed.log_level = Level::DEBUG,
                "--recover" => parsed.recover = true,
                flag if flag.starts_with("--") => {
                    return Err(ArgsError::UnknownOption(flag.to_owned()));
                }
                direction => directions.push(direction.parse()?),
            }
        }

        if !directions.is_empty() {
            parsed.directions = directions;
        }
        Ok(parsed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenario
// ─────────────────────────────────────────────────────────────────────────────

/// How a detected deadlock was broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recovery {
    /// The aborted process.
    pub victim: ProcessId,
    /// The safe drain of the survivors.
    pub resolution: Resolution,
}

/// Everything the binary prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioOutput {
    /// State right after the vehicles finished.
    pub report: SimulationReport,
    /// Present when `--recover` broke a deadlock.
    pub recovery: Option<Recovery>,
}

/// Runs the scenario described by `args`.
///
/// # Errors
///
/// Propagates engine misuse from the simulation or the recovery step.
pub async fn run(args: &ScenarioArgs) -> Result<ScenarioOutput, EngineError> {
    let engine = Engine::new(EngineConfig::new().with_policy(args.policy));
    let config = SimulationConfig::new().with_arrival_interval(args.stagger);
    let simulation = Simulation::new(engine, config);

    tracing::info!(policy = %args.policy, vehicles = args.directions.len(), "scenario started");
    let report = simulation.run_all(&args.directions).await?;

    let recovery = if args.recover && report.deadlock.deadlocked {
        recover(&mut simulation.engine().lock())?
    } else {
        None
    };

    Ok(ScenarioOutput { report, recovery })
}

/// Aborts the youngest deadlocked process and retires the rest in a safe
/// order. Returns `None` when there is no deadlock.
///
/// # Errors
///
/// Propagates engine misuse.
pub fn recover(engine: &mut Engine) -> Result<Option<Recovery>, EngineError> {
    let report = engine.check_deadlock();
    let Some(&victim) = report.processes.iter().max() else {
        return Ok(None);
    };

    tracing::warn!(process = %victim, "aborting deadlock victim");
    engine.abort(victim)?;
    let resolution = engine.resolve_safely()?;
    Ok(Some(Recovery { victim, resolution }))
}
