// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Citation registry.
//!
//! Turns loosely-typed citation objects from the analysis service into [`Citation`]s with
//! guaranteed geometry, and citations into AI-origin [`Highlight`]s.

use serde_json::Value;
use tracing::debug;

use crate::model::{
    Citation, CitationId, CitationSource, DocumentId, Highlight, HighlightComment, HighlightId,
    HighlightOrigin, Position, Rect, Rects, SourceKind,
};
use crate::normalize::numeric::coerce_number;
use crate::normalize::payload::{field, str_field};

const AI_COMMENT_EMOJI: &str = "💡";

#[derive(Debug, Clone)]
pub struct CitationRegistry {
    fallback: Rect,
}

impl CitationRegistry {
    pub fn new(fallback: Rect) -> Self {
        Self { fallback }
    }

    pub fn fallback_rect(&self) -> Rect {
        self.fallback
    }

    /// Builds a citation from a raw object.
    ///
    /// Returns `None` (not an error) when the object has no usable text or cannot be
    /// attributed to a document. Missing or malformed rects fall back to the default box.
    /// A persisted `highlightId` is reused; otherwise a fresh id is minted.
    pub fn resolve(&self, raw: &Value, default_document: Option<&DocumentId>) -> Option<Citation> {
        let obj = raw.as_object()?;

        let text = str_field(obj, &["text", "content", "quote"])
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let Some(text) = text else {
            debug!("dropping citation without text");
            return None;
        };

        let document_id = str_field(obj, &["documentId", "document_id", "docId"])
            .and_then(|id| DocumentId::new(id).ok())
            .or_else(|| default_document.cloned());
        let Some(document_id) = document_id else {
            debug!("dropping citation without a document");
            return None;
        };

        let id = str_field(obj, &["id", "citationId"])
            .and_then(|id| CitationId::new(id).ok())
            .unwrap_or_else(|| CitationId::generate("citation"));
        // Overlay ids are reserved; a persisted one would collide with its own overlay.
        let highlight_id = str_field(obj, &["highlightId", "highlight_id"])
            .and_then(|id| HighlightId::new(id).ok())
            .filter(|id| {
                let reserved = id.is_focus_variant();
                if reserved {
                    debug!(id = %id, "ignoring persisted highlight id with the focus suffix");
                }
                !reserved
            })
            .unwrap_or_else(|| HighlightId::generate("highlight"));

        let position = field(obj, &["position"]).and_then(Value::as_object);
        let page = field(obj, &["page", "pageNumber", "page_number"])
            .or_else(|| position.and_then(|p| field(p, &["pageNumber", "page"])))
            .and_then(coerce_number)
            .filter(|p| *p >= 1.0)
            .map_or(1, |p| p.min(u32::MAX as f64) as u32);

        let raw_rects = field(obj, &["rects"])
            .or_else(|| position.and_then(|p| field(p, &["rects"])))
            .and_then(Value::as_array);
        let mut rects: Rects = raw_rects
            .map(|items| items.iter().filter_map(parse_rect).collect())
            .unwrap_or_default();
        if rects.is_empty() {
            if let Some(bounding) = field(obj, &["boundingRect"])
                .or_else(|| position.and_then(|p| field(p, &["boundingRect"])))
                .and_then(parse_rect)
            {
                rects.push(bounding);
            }
        }
        if rects.is_empty() {
            rects.push(self.fallback);
        }

        let source = field(obj, &["source"]).and_then(parse_source);
        let confidence = field(obj, &["confidence", "score"]).and_then(coerce_number);

        Some(
            Citation::new(id, text.to_owned(), document_id, highlight_id, page, rects)
                .with_source(source)
                .with_confidence(confidence),
        )
    }

    pub fn resolve_all(&self, raw: &[Value], default_document: Option<&DocumentId>) -> Vec<Citation> {
        raw.iter()
            .filter_map(|item| self.resolve(item, default_document))
            .collect()
    }

    /// AI-origin highlight addressing `citation` on its page.
    pub fn highlight_for(&self, citation: &Citation) -> Highlight {
        let rects: Rects = citation.rects().iter().copied().collect();
        let position = Position::from_rects(rects, citation.page(), self.fallback);
        let comment = HighlightComment {
            text: comment_text(citation),
            emoji: AI_COMMENT_EMOJI.to_owned(),
        };
        Highlight::new(
            citation.highlight_id().clone(),
            citation.text(),
            position,
            comment,
            HighlightOrigin::Ai,
        )
    }

    /// User-origin highlight for a viewer selection.
    pub fn user_highlight(&self, raw: &Value, default_document: Option<&DocumentId>) -> Option<Highlight> {
        let citation = self.resolve(raw, default_document)?;
        let rects: Rects = citation.rects().iter().copied().collect();
        let position = Position::from_rects(rects, citation.page(), self.fallback);
        let comment = match raw.get("comment") {
            Some(Value::String(text)) => HighlightComment {
                text: text.clone(),
                emoji: String::new(),
            },
            Some(Value::Object(obj)) => HighlightComment {
                text: str_field(obj, &["text"]).unwrap_or_default().to_owned(),
                emoji: str_field(obj, &["emoji"]).unwrap_or_default().to_owned(),
            },
            _ => HighlightComment::default(),
        };
        Some(Highlight::new(
            citation.highlight_id().clone(),
            citation.text(),
            position,
            comment,
            HighlightOrigin::User,
        ))
    }
}

impl Default for CitationRegistry {
    fn default() -> Self {
        Self::new(crate::config::FALLBACK_RECT)
    }
}

fn comment_text(citation: &Citation) -> String {
    let mut text = match citation.source() {
        Some(CitationSource {
            kind,
            reference: Some(reference),
        }) => format!("{kind}: {reference}"),
        Some(CitationSource { kind, reference: None }) => kind.to_string(),
        None => "AI citation".to_owned(),
    };
    if let Some(confidence) = citation.confidence() {
        text.push_str(&format!(" ({:.0}% confidence)", confidence * 100.0));
    }
    text
}

fn parse_rect(raw: &Value) -> Option<Rect> {
    let obj = raw.as_object()?;
    let num = |keys: &[&str]| field(obj, keys).and_then(coerce_number);

    let x1 = num(&["x1", "left", "x"])?;
    let y1 = num(&["y1", "top", "y"])?;
    let x2 = num(&["x2", "right"]).or_else(|| num(&["width", "w"]).map(|w| x1 + w))?;
    let y2 = num(&["y2", "bottom"]).or_else(|| num(&["height", "h"]).map(|h| y1 + h))?;

    let mut rect = Rect::from_corners(x1, y1, x2, y2);
    if let Some(width) = num(&["width"]) {
        rect.width = width;
    }
    if let Some(height) = num(&["height"]) {
        rect.height = height;
    }
    rect.is_valid().then_some(rect)
}

fn parse_source(raw: &Value) -> Option<CitationSource> {
    match raw {
        Value::String(kind) => Some(CitationSource {
            kind: kind.parse().ok()?,
            reference: None,
        }),
        Value::Object(obj) => {
            let kind = str_field(obj, &["type", "kind"])
                .and_then(|k| k.parse::<SourceKind>().ok())
                .unwrap_or(SourceKind::Text);
            let reference = str_field(obj, &["reference", "ref", "name"]).map(str::to_owned);
            Some(CitationSource { kind, reference })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests;
