//! Note category tags.
//!
//! # Responsibility
//! - Define the closed set of categories a note can carry.
//! - Own the string token table used for storage and wire formats.
//!
//! # Invariants
//! - Token parsing is strict: only the exact lowercase tokens are accepted.
//! - Rendering a raw numeric index is lenient: out-of-range yields `Unknown`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const CATEGORY_TOKENS: [&str; 4] = ["marginalia", "meta", "questions", "predictions"];
const UNKNOWN_CATEGORY_LABEL: &str = "Unknown";

/// Category tag attached to at most one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteCategory {
    Marginalia,
    Meta,
    Questions,
    Predictions,
}

/// Token does not name a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCategoryError(pub String);

impl Display for InvalidCategoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` does not correspond to a note category; expected one of {}",
            self.0,
            CATEGORY_TOKENS.join("|")
        )
    }
}

impl Error for InvalidCategoryError {}

impl NoteCategory {
    pub const ALL: [NoteCategory; 4] = [
        NoteCategory::Marginalia,
        NoteCategory::Meta,
        NoteCategory::Questions,
        NoteCategory::Predictions,
    ];

    /// Position in the token table.
    pub fn index(self) -> usize {
        match self {
            Self::Marginalia => 0,
            Self::Meta => 1,
            Self::Questions => 2,
            Self::Predictions => 3,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn as_str(self) -> &'static str {
        CATEGORY_TOKENS[self.index()]
    }

    /// Renders a raw index the way older clients expect.
    pub fn label_for_index(index: i64) -> &'static str {
        Self::from_index(index).map_or(UNKNOWN_CATEGORY_LABEL, Self::as_str)
    }
}

impl Display for NoteCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteCategory {
    type Err = InvalidCategoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| InvalidCategoryError(value.to_string()))
    }
}
