//! Source locations attached to expression nodes.

use std::fmt;
use std::sync::Arc;

/// Position of an expression in the configuration it was parsed from.
///
/// Cheap to clone: the file name is shared between all nodes of a file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    file: Option<Arc<str>>,
    line: u32,
    column: u32,
}

impl Location {
    /// Create a location inside a named configuration file.
    pub fn new(file: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Location {
            file: Some(file.into()),
            line,
            column,
        }
    }

    /// Create a location without a file name (inline snippets, tests).
    pub const fn inline(line: u32, column: u32) -> Self {
        Location {
            file: None,
            line,
            column,
        }
    }

    /// Whether this location carries no position at all.
    pub fn is_unknown(&self) -> bool {
        self.file.is_none() && self.line == 0 && self.column == 0
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            return f.write_str("<unknown>");
        }
        if let Some(file) = &self.file {
            write!(f, "{file}:")?;
        }
        write!(f, "{}:{}", self.line, self.column)
    }
}
