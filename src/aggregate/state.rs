// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::Serialize;

use crate::model::{ChartModel, Insight, Metric, Normalized, TableModel};

/// Where the current state was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSource {
    #[default]
    Empty,
    /// Blocks attached to assistant messages.
    Blocks,
    /// Top-level analysis results (no message carried blocks).
    Results,
}

/// Cumulative visualization state for a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationState {
    pub charts: Vec<Normalized<ChartModel>>,
    pub tables: Vec<Normalized<TableModel>>,
    pub metrics: Vec<Metric>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<Insight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_text: Option<String>,
    pub source: StateSource,
}

impl VisualizationState {
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
            && self.tables.is_empty()
            && self.metrics.is_empty()
            && self.analysis_text.is_none()
    }

    pub fn ready_charts(&self) -> impl Iterator<Item = &ChartModel> {
        self.charts.iter().filter_map(Normalized::ready)
    }

    pub fn ready_tables(&self) -> impl Iterator<Item = &TableModel> {
        self.tables.iter().filter_map(Normalized::ready)
    }
}
