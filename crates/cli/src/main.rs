use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use slngen::commands::{
    build_all_command, build_target_command, generate_command, housekeeping_command,
    prebuild_command, show_graph_command,
};
use slngen::init_logging;
use slngen_core::services::Housekeeping;

/// IDE solution generator for Meson/Ninja build directories.
///
/// This CLI is a thin wrapper around `slngen-core`. The generated projects
/// call back into it for every build step, so the same binary both writes
/// the solution and runs it.
#[derive(Parser, Debug)]
#[command(
    name = "slngen",
    version,
    about = "IDE solution generator for Meson builds",
    long_about = None
)]
struct Cli {
    /// Configured build directory. Defaults to the current working directory.
    #[arg(long, default_value = ".", global = true)]
    build_root: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate (or regenerate) the solution manifest from introspection data.
    Generate,

    /// Solution prebuild step: clear coordination markers.
    Prebuild,

    /// Build one target, skipping it when a solution build is in progress.
    BuildTarget {
        /// Engine target name.
        #[arg(long)]
        target: String,

        /// Invoke the engine unconditionally (run targets).
        #[arg(long, default_value_t = false)]
        direct: bool,
    },

    /// Build every target in one engine invocation.
    BuildAll,

    /// Housekeeping step run against the build directory.
    Step {
        #[arg(value_enum)]
        step: StepArg,
    },

    /// Show the graph recorded in the last generated manifest.
    ShowGraph {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StepArg {
    Clean,
    Install,
    Test,
    Reconfigure,
}

impl From<StepArg> for Housekeeping {
    fn from(step: StepArg) -> Self {
        match step {
            StepArg::Clean => Housekeeping::Clean,
            StepArg::Install => Housekeeping::Install,
            StepArg::Test => Housekeeping::Test,
            StepArg::Reconfigure => Housekeeping::Reconfigure,
        }
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let root = cli.build_root.as_str();

    match cli.command {
        Command::Generate => generate_command(root)?,
        Command::Prebuild => prebuild_command(root)?,
        Command::BuildTarget { target, direct } => build_target_command(root, &target, direct)?,
        Command::BuildAll => build_all_command(root)?,
        Command::Step { step } => housekeeping_command(root, step.into())?,
        Command::ShowGraph { json } => show_graph_command(root, json)?,
    }

    Ok(())
}
