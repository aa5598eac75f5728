// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Suffix appended to a highlight id for its transient focus overlay.
pub const FOCUS_SUFFIX: &str = "-focus";

/// A stable identifier used across the model and the view surfaces.
///
/// Ids arrive from an upstream service we only partially trust, so the only
/// enforced shape is "non-empty, no control characters". Anything else the
/// service hands us is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    /// Fresh, collision-free id with a readable prefix (`<prefix>-<uuid>`).
    pub fn generate(prefix: &str) -> Self {
        Self {
            value: format!("{prefix}-{}", Uuid::new_v4()),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
    #[error("id must not contain control characters")]
    ContainsControl,
}

fn validate_id(value: &str) -> Result<(), IdError> {
    if value.trim().is_empty() {
        return Err(IdError::Empty);
    }
    if value.chars().any(char::is_control) {
        return Err(IdError::ContainsControl);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionIdTag {}
pub type SessionId = Id<SessionIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentIdTag {}
pub type DocumentId = Id<DocumentIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageIdTag {}
pub type MessageId = Id<MessageIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CitationIdTag {}
pub type CitationId = Id<CitationIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HighlightIdTag {}
pub type HighlightId = Id<HighlightIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnalysisIdTag {}
pub type AnalysisId = Id<AnalysisIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockIdTag {}
pub type BlockId = Id<BlockIdTag>;

impl HighlightId {
    /// Id of the transient overlay drawn while this highlight is focused.
    pub fn focus_variant(&self) -> HighlightId {
        if self.is_focus_variant() {
            return self.clone();
        }
        Self {
            value: format!("{}{FOCUS_SUFFIX}", self.value),
            _marker: PhantomData,
        }
    }

    pub fn is_focus_variant(&self) -> bool {
        self.value.ends_with(FOCUS_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightId, Id, IdError};

    #[test]
    fn id_rejects_empty() {
        let result: Result<Id<()>, _> = Id::new("");
        assert_eq!(result, Err(IdError::Empty));

        let result: Result<Id<()>, _> = Id::new("   ");
        assert_eq!(result, Err(IdError::Empty));
    }

    #[test]
    fn id_rejects_control_characters() {
        let result: Result<Id<()>, _> = Id::new("a\nb");
        assert_eq!(result, Err(IdError::ContainsControl));
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a: Id<()> = Id::generate("highlight");
        let b: Id<()> = Id::generate("highlight");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("highlight-"));
    }

    #[test]
    fn focus_variant_is_idempotent() {
        let id = HighlightId::new("h1").expect("highlight id");
        let focus = id.focus_variant();
        assert_eq!(focus.as_str(), "h1-focus");
        assert!(focus.is_focus_variant());
        assert_eq!(focus.focus_variant(), focus);
    }

    #[test]
    fn ids_deserialize_through_validation() {
        let ok: Id<()> = serde_json::from_str("\"doc1\"").expect("deserialize");
        assert_eq!(ok.as_str(), "doc1");

        let err = serde_json::from_str::<Id<()>>("\"\"").unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }
}
