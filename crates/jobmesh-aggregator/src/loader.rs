//! Board definition loading from TOML files.
//!
//! Each `*.toml` file under the definitions directory holds one `[board]`
//! table. Subdirectories are walked recursively.

use crate::board::BoardProfile;
use crate::error::{AggregateError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct BoardFile {
    board: BoardProfile,
}

/// Loader for board definitions from TOML files.
#[derive(Debug)]
pub struct BoardLoader {
    definitions_dir: PathBuf,
}

impl BoardLoader {
    /// Create a loader over an existing directory.
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Result<Self> {
        let definitions_dir = definitions_dir.into();

        if !definitions_dir.is_dir() {
            return Err(AggregateError::DirectoryNotFound {
                path: definitions_dir.display().to_string(),
            });
        }

        Ok(Self { definitions_dir })
    }

    /// Directory this loader reads from.
    #[must_use]
    pub fn definitions_dir(&self) -> &Path {
        &self.definitions_dir
    }

    /// Load every valid board definition.
    ///
    /// Unreadable, unparseable or invalid files are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<BoardProfile>> {
        let mut boards = Vec::new();

        Self::walk_and_load_recursive(&self.definitions_dir, &mut boards)?;

        info!(
            count = boards.len(),
            dir = %self.definitions_dir.display(),
            "loaded board definitions"
        );

        Ok(boards)
    }

    fn walk_and_load_recursive(dir: &Path, boards: &mut Vec<BoardProfile>) -> Result<()> {
        let mut entries = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        // Directory order is platform dependent.
        entries.sort();

        for path in entries {
            if path.is_dir() {
                Self::walk_and_load_recursive(&path, boards)?;
                continue;
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }

            match Self::load_from_path(&path) {
                Ok(board) => {
                    if let Err(e) = board.validate() {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "skipping invalid board definition"
                        );
                        continue;
                    }
                    debug!(board = %board.name, path = %path.display(), "loaded board definition");
                    boards.push(board);
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load board definition"
                    );
                }
            }
        }

        Ok(())
    }

    /// Load a board definition from a specific file.
    pub fn load_from_path(path: &Path) -> Result<BoardProfile> {
        let contents = std::fs::read_to_string(path).map_err(|e| AggregateError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        let file: BoardFile = toml::from_str(&contents).map_err(|e| AggregateError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;

        Ok(file.board)
    }
}
