use thiserror::Error;
use tracing::info;

use crate::coordination::{Clock, CoordinationError, MarkerStore, Presence, Rendezvous};
use crate::services::engine::{BuildEngine, EngineError};

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What a coordinated target step ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Invoked the engine for the target.
    Built,
    /// Part of a solution build; the build-all step covers this target.
    Skipped { peers: usize },
}

/// Housekeeping steps that map one-to-one onto engine commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Housekeeping {
    Clean,
    Install,
    Test,
    Reconfigure,
}

/// Prebuild: clear every marker so this solution build starts from nothing.
pub fn run_prebuild<S: MarkerStore, C: Clock>(
    rendezvous: &Rendezvous<S, C>,
) -> Result<(), StepError> {
    rendezvous.reset()?;
    info!("cleared coordination markers");
    Ok(())
}

/// Target build step: register, wait, and only build when alone.
///
/// The step's marker is released on every exit path, including a failed
/// compile, so it never counts as a peer of a later isolated build.
pub fn run_target_step<S: MarkerStore, C: Clock>(
    rendezvous: &Rendezvous<S, C>,
    engine: &dyn BuildEngine,
    target: &str,
) -> Result<StepOutcome, StepError> {
    let presence = rendezvous.register_and_count(target)?;
    let outcome = match presence {
        Presence::Alone => {
            info!(target, "isolated build; invoking engine");
            engine.compile(Some(target)).map(|()| StepOutcome::Built)
        }
        Presence::Grouped { peers } => {
            info!(target, peers, "solution build in progress; leaving it to build-all");
            Ok(StepOutcome::Skipped { peers })
        }
    };
    rendezvous.release(target, presence)?;
    Ok(outcome?)
}

/// Run-kind targets execute unconditionally; they are never part of build-all.
pub fn run_direct_target(engine: &dyn BuildEngine, target: &str) -> Result<(), StepError> {
    engine.compile(Some(target))?;
    Ok(())
}

/// Build-all step: one engine invocation over the whole graph.
///
/// Markers are cleared first so single-target builds after this one start clean.
pub fn run_build_all<S: MarkerStore, C: Clock>(
    rendezvous: &Rendezvous<S, C>,
    engine: &dyn BuildEngine,
) -> Result<(), StepError> {
    rendezvous.reset()?;
    engine.compile(None)?;
    Ok(())
}

pub fn run_housekeeping(engine: &dyn BuildEngine, step: Housekeeping) -> Result<(), StepError> {
    match step {
        Housekeeping::Clean => engine.clean()?,
        Housekeeping::Install => engine.install()?,
        Housekeeping::Test => engine.test()?,
        Housekeeping::Reconfigure => engine.reconfigure()?,
    }
    Ok(())
}
