use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

/// Environment override for the engine command, checked before config.
pub const MESON_ENV_VAR: &str = "SLNGEN_MESON";

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

/// The external build engine, treated as opaque commands run in the build
/// directory that either succeed or fail.
pub trait BuildEngine {
    fn name(&self) -> &str;
    /// Raw `ninja -t deps` listing for the whole build directory.
    fn dependency_listing(&self) -> Result<String, EngineError>;
    /// Build one target, or everything when `target` is `None`.
    fn compile(&self, target: Option<&str>) -> Result<(), EngineError>;
    fn clean(&self) -> Result<(), EngineError>;
    fn install(&self) -> Result<(), EngineError>;
    fn test(&self) -> Result<(), EngineError>;
    fn reconfigure(&self) -> Result<(), EngineError>;
}

/// Meson front end driving Ninja.
#[derive(Debug, Clone)]
pub struct MesonEngine {
    command: Vec<String>,
    build_dir: PathBuf,
}

impl MesonEngine {
    /// `command` is the program followed by any leading arguments
    /// (e.g. `["python3", "/opt/meson/meson.py"]`).
    pub fn new(command: Vec<String>, build_dir: impl Into<PathBuf>) -> Self {
        let command = if command.is_empty() { vec!["meson".to_string()] } else { command };
        Self { command, build_dir: build_dir.into() }
    }

    pub fn command_line(&self) -> &[String] {
        &self.command
    }

    fn base_command(&self, args: &[&str]) -> (Command, String) {
        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).args(args).current_dir(&self.build_dir);
        let parts: Vec<&str> =
            self.command.iter().map(String::as_str).chain(args.iter().copied()).collect();
        (cmd, parts.join(" "))
    }

    /// Run with inherited stdio so the IDE's output pane shows engine output.
    fn run(&self, args: &[&str]) -> Result<(), EngineError> {
        let (mut cmd, rendered) = self.base_command(args);
        info!(command = %rendered, "running build engine");
        let status = cmd
            .status()
            .map_err(|source| EngineError::Spawn { command: rendered.clone(), source })?;
        if !status.success() {
            return Err(EngineError::Failed { command: rendered, status: status.to_string() });
        }
        Ok(())
    }

    fn capture(&self, args: &[&str]) -> Result<String, EngineError> {
        let (mut cmd, rendered) = self.base_command(args);
        debug!(command = %rendered, "querying build engine");
        let output = cmd
            .output()
            .map_err(|source| EngineError::Spawn { command: rendered.clone(), source })?;
        if !output.status.success() {
            let status = output.status.to_string();
            return Err(EngineError::Failed { command: rendered, status });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn build_dir_arg(&self) -> String {
        self.build_dir.display().to_string()
    }
}

impl BuildEngine for MesonEngine {
    fn name(&self) -> &str {
        "meson"
    }

    fn dependency_listing(&self) -> Result<String, EngineError> {
        let dir = self.build_dir_arg();
        self.capture(&["compile", "-C", dir.as_str(), "--ninja-args=-t,deps"])
    }

    fn compile(&self, target: Option<&str>) -> Result<(), EngineError> {
        let dir = self.build_dir_arg();
        let mut args = vec!["compile", "-C", dir.as_str()];
        args.extend(target);
        self.run(&args)
    }

    fn clean(&self) -> Result<(), EngineError> {
        let dir = self.build_dir_arg();
        self.run(&["compile", "-C", dir.as_str(), "--clean"])
    }

    fn install(&self) -> Result<(), EngineError> {
        let dir = self.build_dir_arg();
        self.run(&["install", "-C", dir.as_str()])
    }

    fn test(&self) -> Result<(), EngineError> {
        let dir = self.build_dir_arg();
        self.run(&["test", "-C", dir.as_str()])
    }

    fn reconfigure(&self) -> Result<(), EngineError> {
        let dir = self.build_dir_arg();
        self.run(&["setup", "--reconfigure", dir.as_str()])
    }
}

/// Split a configured command string on whitespace.
pub fn split_command(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|s| s.trim_matches('"').to_string()).collect()
}

/// Recover the configure command from the `REGENERATE_BUILD` rule of `build.ninja`.
///
/// The rule's command is `<meson...> --internal regenerate ...`; everything
/// before the `--internal` token (which may or may not be quoted) is the
/// command that configured this build directory.
pub fn discover_meson_command(build_ninja: &Path) -> Option<Vec<String>> {
    let body = fs::read_to_string(build_ninja).ok()?;
    let mut lines = body.lines();
    lines.find(|line| line.trim_end() == "rule REGENERATE_BUILD")?;
    let command_line = lines.next()?;
    let tokens: Vec<&str> = command_line.split_whitespace().collect();
    let start = tokens.iter().position(|t| *t == "=")? + 1;
    let end = tokens.iter().position(|t| t.contains("--internal"))?;
    if end <= start {
        return None;
    }
    Some(tokens[start..end].iter().map(|t| t.trim_matches('"').to_string()).collect())
}

/// Engine command precedence: `SLNGEN_MESON`, then config, then `build.ninja`,
/// then plain `meson` from `PATH`.
pub fn resolve_meson_command(configured: Option<&str>, build_ninja: &Path) -> Vec<String> {
    if let Ok(raw) = env::var(MESON_ENV_VAR) {
        let command = split_command(&raw);
        if !command.is_empty() {
            return command;
        }
    }
    if let Some(raw) = configured {
        let command = split_command(raw);
        if !command.is_empty() {
            return command;
        }
    }
    discover_meson_command(build_ninja).unwrap_or_else(|| vec!["meson".to_string()])
}
