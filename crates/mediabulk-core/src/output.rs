//! Output folder management for one run.
//!
//! The log and report files of a run are write-once artifacts. Starting a new
//! run into a folder that already holds either file is a hard stop, so a large
//! finished batch can never be silently overwritten by a re-run.

use std::path::{Path, PathBuf};

use crate::error::OutputError;

/// Audit log file name within the output folder.
pub const LOG_FILE_NAME: &str = "log.jsonl";
/// Report file name within the output folder.
pub const REPORT_FILE_NAME: &str = "report.csv";

/// A validated output folder for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFolder {
    root: PathBuf,
}

impl OutputFolder {
    /// Validate and prepare `root` for a fresh run.
    ///
    /// Creates the folder when missing; fails when the log or report file
    /// already exists. Runs synchronously because it happens once, before the
    /// async pipeline starts.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self, OutputError> {
        let root = root.into();
        let folder = Self { root };

        for path in [folder.log_path(), folder.report_path()] {
            if path.exists() {
                return Err(OutputError::AlreadyExists { path });
            }
        }

        if !folder.root.exists() {
            std::fs::create_dir_all(&folder.root).map_err(|source| OutputError::Create {
                path: folder.root.clone(),
                source,
            })?;
        }

        Ok(folder)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
