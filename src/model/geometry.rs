// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Page geometry in document-viewport units.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Most citations cover one to a handful of text lines.
pub type Rects = SmallVec<[Rect; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Builds a rect from its corners; `width`/`height` are derived.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            x1: self.x1 - margin,
            y1: self.y1 - margin,
            x2: self.x2 + margin,
            y2: self.y2 + margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    fn union(&self, other: &Rect) -> Rect {
        let mut merged = Rect::from_corners(
            self.x1.min(other.x1),
            self.y1.min(other.y1),
            self.x2.max(other.x2),
            self.y2.max(other.y2),
        );
        merged.width = merged.width.max(self.width).max(other.width);
        merged.height = merged.height.max(self.height).max(other.height);
        merged
    }
}

/// Where a highlight sits on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    bounding_rect: Rect,
    rects: Rects,
    page_number: u32,
}

impl Position {
    /// Builds a position from line rects; an empty input falls back to `fallback`.
    pub fn from_rects(rects: Rects, page_number: u32, fallback: Rect) -> Self {
        let rects = if rects.is_empty() {
            smallvec::smallvec![fallback]
        } else {
            rects
        };
        let bounding_rect = rects
            .iter()
            .skip(1)
            .fold(rects[0], |acc, rect| acc.union(rect));
        Self {
            bounding_rect,
            rects,
            page_number: page_number.max(1),
        }
    }

    pub fn bounding_rect(&self) -> &Rect {
        &self.bounding_rect
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            bounding_rect: self.bounding_rect.expanded(margin),
            rects: self.rects.iter().map(|r| r.expanded(margin)).collect(),
            page_number: self.page_number,
        }
    }
}
