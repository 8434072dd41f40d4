//! Command-line argument parsing for flakewatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flakewatch - Run an external analysis tool over Python files without blocking
#[derive(Parser, Debug)]
#[command(name = "flakewatch")]
#[command(version)]
#[command(about = "Run an external analysis tool asynchronously and sort its findings", long_about = None)]
pub struct Args {
    /// Files to check (shorthand for the `check` subcommand)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Override the configured tool command
    #[arg(long)]
    pub tool: Option<String>,

    /// Override the configured timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Emit results as JSON instead of the colored listing
    #[arg(long)]
    pub json: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress status output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check an explicit list of Python files
    Check {
        /// Files to check
        files: Vec<PathBuf>,
    },

    /// Check the owning packages of the given files
    Package {
        /// Files whose packages are checked
        files: Vec<PathBuf>,
    },

    /// Read save events from stdin and check each saved file
    Watch,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Check that targets were supplied one way, not two.
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_none() && self.files.is_empty() {
            return Err(
                "Nothing to check. Use 'flakewatch <FILE>...' or run a subcommand.".to_string(),
            );
        }

        if self.command.is_some() && !self.files.is_empty() {
            return Err("Cannot list files before a subcommand.".to_string());
        }

        Ok(())
    }
}

impl Verbosity {
    /// Check if the status spinner should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(files: Vec<PathBuf>, command: Option<Commands>) -> Args {
        Args {
            files,
            tool: None,
            timeout: None,
            json: false,
            config: None,
            verbose: 0,
            quiet: false,
            command,
        }
    }

    #[test]
    fn test_verbosity_quiet() {
        let mut args = args_with(vec![PathBuf::from("a.py")], None);
        args.quiet = true;
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert!(!args.verbosity().show_progress());
    }

    #[test]
    fn test_verbosity_normal() {
        let args = args_with(vec![PathBuf::from("a.py")], None);
        assert_eq!(args.verbosity(), Verbosity::Normal);
        assert!(args.verbosity().show_progress());
    }

    #[test]
    fn test_verbosity_verbose() {
        let mut args = args_with(vec![PathBuf::from("a.py")], None);
        args.verbose = 1;
        assert_eq!(args.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_validate_requires_files_or_subcommand() {
        let args = args_with(vec![], None);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_bare_files() {
        let args = args_with(vec![PathBuf::from("a.py")], None);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_accepts_subcommand() {
        let args = args_with(vec![], Some(Commands::Watch));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_files_before_subcommand() {
        let args = args_with(vec![PathBuf::from("a.py")], Some(Commands::Watch));
        assert!(args.validate().is_err());
    }
}
