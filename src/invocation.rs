//! Tool invocation construction.

use crate::config::{self, Config};
use crate::errors::{Result, WatchError};
use crate::tokenizer::split_args;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Filter token appended when a whole directory is handed to the tool.
const DIR_FILTER_ARG: &str = "--filename=*.py";

/// One request to run the external tool over a fixed set of targets.
///
/// Immutable once created; consumed by the runner to produce a process
/// handle and discarded after the poll cycle finalizes.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Unique id, stamped at construction
    pub id: Uuid,

    /// Command to spawn
    pub command: String,

    /// Tool flags, tokenized from configuration
    pub args: Vec<String>,

    /// Target file or directory paths, never empty
    pub targets: Vec<PathBuf>,

    /// Parent directory of the first target
    pub working_dir: PathBuf,

    /// Environment resolved per-project from the first target
    pub environment: HashMap<String, String>,

    /// Duration after which the process is force-terminated
    pub timeout: Duration,

    /// True when the first target is a directory (package scan)
    pub directory_target: bool,
}

impl ToolInvocation {
    /// Build an invocation from the configured tool and a target set.
    ///
    /// The working directory is the first target's parent, the
    /// environment is resolved from the first target's project, and
    /// for directory targets the Python file filter is appended to the
    /// argument list unless already configured.
    pub fn new(config: &Config, targets: Vec<PathBuf>) -> Result<Self> {
        let first = targets.first().ok_or(WatchError::EmptyTargets)?;
        let directory_target = first.is_dir();

        let mut args = split_args(&config.tool.args);
        if directory_target && !args.iter().any(|a| a == DIR_FILTER_ARG) {
            args.push(DIR_FILTER_ARG.to_string());
        }

        let working_dir = first
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let environment = config::environment_for(first, config);

        Ok(ToolInvocation {
            id: Uuid::new_v4(),
            command: config.tool.command.clone(),
            args,
            working_dir,
            environment,
            timeout: Duration::from_secs(config.tool.timeout_secs),
            directory_target,
            targets,
        })
    }

    /// Status base message shown while this invocation runs.
    pub fn base_message(&self) -> String {
        match self.targets.as_slice() {
            [single] if self.directory_target => {
                format!("Updating for package {}", basename(single))
            }
            [single] => format!("Updating for {}", basename(single)),
            many => format!("Updating for {} items", many.len()),
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_with_args(args: &str) -> Config {
        let mut config = Config::default();
        config.tool.args = args.to_string();
        config
    }

    #[test]
    fn test_empty_targets_rejected() {
        let result = ToolInvocation::new(&Config::default(), vec![]);
        assert!(matches!(result, Err(WatchError::EmptyTargets)));
    }

    #[test]
    fn test_file_target() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("mod.py");
        fs::write(&file, "x = 1\n").unwrap();

        let invocation =
            ToolInvocation::new(&config_with_args("--statistics"), vec![file.clone()]).unwrap();

        assert_eq!(invocation.command, "flake8");
        assert_eq!(invocation.args, vec!["--statistics"]);
        assert_eq!(invocation.working_dir, temp.path());
        assert!(!invocation.directory_target);
        assert_eq!(invocation.base_message(), "Updating for mod.py");
    }

    #[test]
    fn test_directory_target_appends_filter() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        fs::create_dir(&pkg).unwrap();

        let invocation =
            ToolInvocation::new(&config_with_args("--statistics"), vec![pkg.clone()]).unwrap();

        assert!(invocation.directory_target);
        assert_eq!(invocation.args, vec!["--statistics", DIR_FILTER_ARG]);
        assert_eq!(invocation.base_message(), "Updating for package pkg");
    }

    #[test]
    fn test_directory_filter_not_duplicated() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        fs::create_dir(&pkg).unwrap();

        let invocation =
            ToolInvocation::new(&config_with_args("--statistics --filename=*.py"), vec![pkg])
                .unwrap();

        assert_eq!(
            invocation.args.iter().filter(|a| *a == DIR_FILTER_ARG).count(),
            1
        );
    }

    #[test]
    fn test_multiple_targets_message() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.py");
        let b = temp.path().join("b.py");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();

        let invocation = ToolInvocation::new(&Config::default(), vec![a, b]).unwrap();
        assert_eq!(invocation.base_message(), "Updating for 2 items");
    }

    #[test]
    fn test_timeout_from_config() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.py");
        fs::write(&file, "").unwrap();

        let mut config = Config::default();
        config.tool.timeout_secs = 42;

        let invocation = ToolInvocation::new(&config, vec![file]).unwrap();
        assert_eq!(invocation.timeout, Duration::from_secs(42));
    }
}
