// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! View-facing state.
//!
//! The orchestrator publishes a whole [`ViewSnapshot`] after every change; the chat view, the
//! document viewer and the chart/table views only ever read snapshots.

use serde_json::Value;

use crate::aggregate::VisualizationState;
use crate::model::{Citation, Highlight, HighlightId, SessionContext};
use crate::store::MessageList;

/// A clicked chart point or table cell, addressed by position in the visualization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataPoint {
    Chart { chart: usize, record: usize },
    Table { table: usize, row: usize, column: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewSnapshot {
    rev: u64,
    session: Option<SessionContext>,
    messages: MessageList,
    highlights: Vec<Highlight>,
    visualization: VisualizationState,
}

impl ViewSnapshot {
    pub(crate) fn new(
        rev: u64,
        session: Option<SessionContext>,
        messages: MessageList,
        highlights: Vec<Highlight>,
        visualization: VisualizationState,
    ) -> Self {
        Self {
            rev,
            session,
            messages,
            highlights,
            visualization,
        }
    }

    /// Bumped on every publish.
    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    /// Chronological messages.
    pub fn messages(&self) -> &MessageList {
        &self.messages
    }

    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn visualization(&self) -> &VisualizationState {
        &self.visualization
    }

    /// Highlight behind a clicked data point, if the point carries a citation.
    pub fn citation_at(&self, point: &DataPoint) -> Option<HighlightId> {
        match point {
            DataPoint::Chart { chart, record } => {
                let chart = self.visualization.charts.get(*chart)?.ready()?;
                let raw = chart.data.get(*record)?.get("citation")?;
                highlight_id_of(raw)
            }
            DataPoint::Table { table, row, column } => {
                let table = self.visualization.tables.get(*table)?.ready()?;
                table
                    .cell(*row, column)?
                    .citation()
                    .map(|citation| citation.highlight_id().clone())
            }
        }
    }
}

fn highlight_id_of(raw: &Value) -> Option<HighlightId> {
    serde_json::from_value::<Citation>(raw.clone())
        .ok()
        .map(|citation| citation.highlight_id().clone())
}
