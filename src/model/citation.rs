// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::geometry::{Rect, Rects};
use super::ids::{CitationId, DocumentId, HighlightId};

/// A text span attributed to a page and bounding rectangles in a source document.
///
/// Built by [`crate::citation::CitationRegistry`], which guarantees that `rects` is never
/// empty and that `highlight_id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    id: CitationId,
    text: String,
    document_id: DocumentId,
    highlight_id: HighlightId,
    page: u32,
    rects: Rects,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<CitationSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
}

impl Citation {
    pub(crate) fn new(
        id: CitationId,
        text: String,
        document_id: DocumentId,
        highlight_id: HighlightId,
        page: u32,
        rects: Rects,
    ) -> Self {
        Self {
            id,
            text,
            document_id,
            highlight_id,
            page: page.max(1),
            rects,
            source: None,
            confidence: None,
        }
    }

    pub(crate) fn with_source(mut self, source: Option<CitationSource>) -> Self {
        self.source = source;
        self
    }

    pub(crate) fn with_confidence(mut self, confidence: Option<f64>) -> Self {
        self.confidence = confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0));
        self
    }

    pub fn id(&self) -> &CitationId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    pub fn highlight_id(&self) -> &HighlightId {
        &self.highlight_id
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn source(&self) -> Option<&CitationSource> {
        self.source.as_ref()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSource {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Table,
    KeyFinding,
    Text,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::KeyFinding => "key_finding",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid citation source type")]
pub struct ParseSourceKindError;

impl FromStr for SourceKind {
    type Err = ParseSourceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "table" => Ok(Self::Table),
            "key_finding" | "keyfinding" | "finding" => Ok(Self::KeyFinding),
            "text" | "paragraph" => Ok(Self::Text),
            _ => Err(ParseSourceKindError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SourceKind;

    #[test]
    fn source_kind_roundtrips_via_str() {
        for kind in [SourceKind::Table, SourceKind::KeyFinding, SourceKind::Text] {
            let parsed: SourceKind = kind.as_str().parse().expect("parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn source_kind_accepts_loose_spellings() {
        assert_eq!("Key-Finding".parse::<SourceKind>(), Ok(SourceKind::KeyFinding));
        assert!("chart".parse::<SourceKind>().is_err());
    }
}
