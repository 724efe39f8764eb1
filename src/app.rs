//! Per-invocation application context

use std::fs;
use std::path::PathBuf;

use crate::cli::output::{Formattable, emit};
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::{Result, TmigError};

/// Everything a command needs: the resolved project root, the layered
/// configuration and the output format.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub output_format: OutputFormat,
    pub quiet: bool,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let root = cli.root.clone();
        let meta = fs::metadata(&root).map_err(|err| TmigError::from_io(err, &root))?;
        if !meta.is_dir() {
            return Err(TmigError::NotADirectory(root));
        }
        let config = Config::load(cli.config.as_deref(), &root)?;
        tracing::debug!(root = %root.display(), tests_dir = %config.scan.tests_dir, "context ready");

        Ok(Self {
            root,
            config,
            output_format: cli.output_format(),
            quiet: cli.quiet,
        })
    }

    /// Robot output (JSON/JSONL/TSV) was requested.
    #[must_use]
    pub const fn is_machine(&self) -> bool {
        self.output_format.is_machine_readable()
    }

    /// Human and plain reports are dropped under `--quiet`; robot output
    /// is always written.
    #[must_use]
    pub const fn shows_reports(&self) -> bool {
        !self.quiet || self.is_machine()
    }

    pub fn emit<T: Formattable>(&self, value: &T) {
        if self.shows_reports() {
            emit(value, self.output_format);
        }
    }
}
