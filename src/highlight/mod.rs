// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Highlight synchronization.
//!
//! Owns the AI-origin and user-origin highlight sets shown in the document viewer and the
//! per-id focus state machine (`Idle -> Focused -> Idle`). Focusing inserts a transient
//! overlay keyed `<id>-focus`; at most one overlay exists per highlight id.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::model::{Highlight, HighlightId, HighlightOrigin, Position};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("highlight {0} was created by the assistant and cannot be edited")]
    Immutable(HighlightId),
    #[error("highlight {0} not found")]
    NotFound(HighlightId),
    #[error("highlight {0} already exists")]
    Duplicate(HighlightId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Idle,
    Focused,
}

/// Proof of one focus transition; releasing a stale ticket is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusTicket {
    id: HighlightId,
    generation: u64,
}

impl FocusTicket {
    pub fn highlight_id(&self) -> &HighlightId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FocusEntry {
    overlay: Highlight,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSynchronizer {
    margin: f64,
    ai: Vec<Highlight>,
    user: Vec<Highlight>,
    focus: BTreeMap<HighlightId, FocusEntry>,
    generation: u64,
}

impl HighlightSynchronizer {
    pub fn new(margin: f64) -> Self {
        Self {
            margin,
            ai: Vec::new(),
            user: Vec::new(),
            focus: BTreeMap::new(),
            generation: 0,
        }
    }

    /// Inserts or replaces an AI-origin highlight. Ids already owned by a user highlight are
    /// left alone. Returns whether the set changed.
    pub fn upsert_ai(&mut self, highlight: Highlight) -> bool {
        if self.user.iter().any(|h| h.id() == highlight.id()) {
            debug!(id = %highlight.id(), "ignoring AI highlight that shadows a user highlight");
            return false;
        }
        match self.ai.iter_mut().find(|h| h.id() == highlight.id()) {
            Some(existing) if *existing == highlight => false,
            Some(existing) => {
                *existing = highlight;
                true
            }
            None => {
                self.ai.push(highlight);
                true
            }
        }
    }

    pub fn add_user(&mut self, highlight: Highlight) -> Result<(), HighlightError> {
        if self.find(highlight.id()).is_some() {
            return Err(HighlightError::Duplicate(highlight.id().clone()));
        }
        self.user.push(highlight);
        Ok(())
    }

    /// Moves or resizes a user highlight. A live focus overlay follows the new geometry.
    pub fn update_user(
        &mut self,
        id: &HighlightId,
        position: Position,
    ) -> Result<(), HighlightError> {
        let Some(highlight) = self.user.iter_mut().find(|h| h.id() == id) else {
            return Err(self.missing_or_immutable(id));
        };
        highlight.set_position(position);
        let overlay = highlight.focus_overlay(self.margin);
        if let Some(entry) = self.focus.get_mut(id) {
            entry.overlay = overlay;
        }
        Ok(())
    }

    pub fn remove_user(&mut self, id: &HighlightId) -> Result<Highlight, HighlightError> {
        let Some(index) = self.user.iter().position(|h| h.id() == id) else {
            return Err(self.missing_or_immutable(id));
        };
        self.focus.remove(id);
        Ok(self.user.remove(index))
    }

    fn missing_or_immutable(&self, id: &HighlightId) -> HighlightError {
        if self.ai.iter().any(|h| h.id() == id) {
            HighlightError::Immutable(id.clone())
        } else {
            HighlightError::NotFound(id.clone())
        }
    }

    /// `Idle -> Focused`, or restarts an existing focus. Any previous overlay for `id` is
    /// replaced, never duplicated. Unknown ids are a silent no-op.
    pub fn focus(&mut self, id: &HighlightId) -> Option<FocusTicket> {
        let base = self.find(id)?;
        let overlay = base.focus_overlay(self.margin);
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        if self
            .focus
            .insert(id.clone(), FocusEntry { overlay, generation })
            .is_some()
        {
            debug!(id = %id, "refocusing highlight");
        } else {
            debug!(id = %id, "focusing highlight");
        }
        Some(FocusTicket {
            id: id.clone(),
            generation,
        })
    }

    /// `Focused -> Idle` for the focus `ticket` started. Returns false when a newer focus
    /// has superseded it.
    pub fn release(&mut self, ticket: &FocusTicket) -> bool {
        match self.focus.get(&ticket.id) {
            Some(entry) if entry.generation == ticket.generation => {
                self.focus.remove(&ticket.id);
                debug!(id = %ticket.id, "focus released");
                true
            }
            _ => false,
        }
    }

    pub fn clear_focus(&mut self) {
        self.focus.clear();
    }

    pub fn state(&self, id: &HighlightId) -> FocusState {
        if self.focus.contains_key(id) {
            FocusState::Focused
        } else {
            FocusState::Idle
        }
    }

    pub fn find(&self, id: &HighlightId) -> Option<&Highlight> {
        self.ai
            .iter()
            .chain(self.user.iter())
            .find(|h| h.id() == id)
    }

    pub fn origin(&self, id: &HighlightId) -> Option<HighlightOrigin> {
        self.find(id).map(Highlight::origin)
    }

    /// AI highlights, then user highlights, then focus overlays.
    pub fn highlights(&self) -> Vec<Highlight> {
        self.ai
            .iter()
            .chain(self.user.iter())
            .chain(self.focus.values().map(|entry| &entry.overlay))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ai.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ai.is_empty() && self.user.is_empty()
    }
}

impl Default for HighlightSynchronizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FOCUS_MARGIN)
    }
}
