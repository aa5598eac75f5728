// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::geometry::Position;
use super::ids::HighlightId;

/// Who created a highlight. AI highlights are immutable from the viewer's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightOrigin {
    Ai,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightComment {
    pub text: String,
    pub emoji: String,
}

/// Overlay rendered over a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    id: HighlightId,
    content: HighlightContent,
    position: Position,
    comment: HighlightComment,
    origin: HighlightOrigin,
}

impl Highlight {
    pub fn new(
        id: HighlightId,
        text: impl Into<String>,
        position: Position,
        comment: HighlightComment,
        origin: HighlightOrigin,
    ) -> Self {
        Self {
            id,
            content: HighlightContent { text: text.into() },
            position,
            comment,
            origin,
        }
    }

    pub fn id(&self) -> &HighlightId {
        &self.id
    }

    pub fn content(&self) -> &HighlightContent {
        &self.content
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn comment(&self) -> &HighlightComment {
        &self.comment
    }

    pub fn origin(&self) -> HighlightOrigin {
        self.origin
    }

    pub fn is_focus_overlay(&self) -> bool {
        self.id.is_focus_variant()
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Transient overlay for this highlight: same text, geometry grown by `margin`.
    pub(crate) fn focus_overlay(&self, margin: f64) -> Highlight {
        Highlight {
            id: self.id.focus_variant(),
            content: self.content.clone(),
            position: self.position.expanded(margin),
            comment: self.comment.clone(),
            origin: self.origin,
        }
    }
}
