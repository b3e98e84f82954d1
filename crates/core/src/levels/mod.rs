//! Per-action required admin levels
//!
//! The table is read from a plain text file, one `<action> <level>` pair per
//! line. Blank lines and lines starting with `#` or `//` are ignored. When
//! the file is missing or holds no usable entry it is rewritten with
//! [`DEFAULT_LEVELS`] and served from those.
//!
//! Lookups are exact and case-sensitive; the first entry for an action wins.

mod defaults;

use std::path::{Path, PathBuf};

pub use defaults::{builtin_level, DEFAULT_LEVELS};

use crate::config::ConfigResult;

/// One line of the level table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLevelEntry {
    pub action: String,
    pub level: i32,
}

/// Required level for each admin action
#[derive(Debug, Clone)]
pub struct CommandLevelTable {
    /// Backing file, `None` for a table that only lives in memory
    path: Option<PathBuf>,
    entries: Vec<CommandLevelEntry>,
}

impl CommandLevelTable {
    /// Load the table from `path`, writing defaults if needed
    pub fn load(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let entries = read_or_heal(&path)?;
        tracing::info!("Loaded {} command levels from {:?}", entries.len(), path);
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Table holding the built-in defaults, not backed by a file
    pub fn builtin() -> Self {
        Self {
            path: None,
            entries: default_entries(),
        }
    }

    /// Re-read the backing file.
    ///
    /// On error the current entries are kept.
    pub fn reload(&mut self) -> ConfigResult<()> {
        let entries = match &self.path {
            Some(path) => read_or_heal(path)?,
            None => default_entries(),
        };
        tracing::info!("Reloaded {} command levels", entries.len());
        self.entries = entries;
        Ok(())
    }

    /// Level required for `action`, if the table names it
    pub fn required_level(&self, action: &str) -> Option<i32> {
        self.entries
            .iter()
            .find(|entry| entry.action == action)
            .map(|entry| entry.level)
    }

    /// All entries in file order
    pub fn entries(&self) -> &[CommandLevelEntry] {
        &self.entries
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Parse table text, skipping comments and malformed lines
    pub fn parse(content: &str) -> Vec<CommandLevelEntry> {
        content
            .lines()
            .enumerate()
            .filter_map(|(index, line)| parse_line(index + 1, line))
            .collect()
    }

    /// Text written when the table has to be regenerated
    pub fn render_defaults() -> String {
        let mut out = String::from("# Required admin level per command: <command> <level>\n");
        for (action, level) in DEFAULT_LEVELS {
            out.push_str(&format!("{} {}\n", action, level));
        }
        out
    }
}

fn parse_line(line_no: usize, line: &str) -> Option<CommandLevelEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return None;
    }

    let mut fields = line.split_whitespace();
    let action = fields.next()?;
    let Some(raw_level) = fields.next() else {
        tracing::warn!(line_no, "Command level line has no level: {:?}", line);
        return None;
    };

    match raw_level.parse::<i32>() {
        Ok(level) if level >= 0 => Some(CommandLevelEntry {
            action: action.to_string(),
            level,
        }),
        _ => {
            tracing::warn!(line_no, "Invalid level {:?} for command {}", raw_level, action);
            None
        }
    }
}

fn default_entries() -> Vec<CommandLevelEntry> {
    DEFAULT_LEVELS
        .iter()
        .map(|(action, level)| CommandLevelEntry {
            action: action.to_string(),
            level: *level,
        })
        .collect()
}

fn read_or_heal(path: &Path) -> ConfigResult<Vec<CommandLevelEntry>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let entries = CommandLevelTable::parse(&content);
            if !entries.is_empty() {
                return Ok(entries);
            }
            tracing::warn!("No valid command levels in {:?}, regenerating defaults", path);
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("Command level file {:?} missing, creating defaults", path);
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(e) = std::fs::write(path, CommandLevelTable::render_defaults()) {
        tracing::error!("Failed to write default command levels to {:?}: {}", path, e);
    }
    Ok(default_entries())
}
