// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::chart::{ChartModel, Normalized};
use super::citation::Citation;
use super::ids::{AnalysisId, DocumentId};
use super::table::TableModel;

/// A single headline figure (revenue, margin, a ratio, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    /// Parsed numeric value, when the payload carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Original display text, kept when the value was not numeric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
}

impl Metric {
    pub fn numeric(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            display: None,
            unit: None,
            change: None,
            period: None,
            citation: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Some(Self::High),
            "medium" | "moderate" => Some(Self::Medium),
            "low" | "minor" => Some(Self::Low),
            _ => None,
        }
    }
}

/// A plain-text or structured finding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl Insight {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            importance: None,
            category: None,
            citations: Vec::new(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            importance: Some(Importance::High),
            category: Some("warning".to_owned()),
            citations: Vec::new(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.category.as_deref() == Some("warning")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VisualizationData {
    pub charts: Vec<Normalized<ChartModel>>,
    pub tables: Vec<Normalized<TableModel>>,
}

impl VisualizationData {
    pub fn is_empty(&self) -> bool {
        self.charts.is_empty() && self.tables.is_empty()
    }
}

/// Aggregation identity: the same documents analysed the same way.
///
/// Document ids are sorted and de-duplicated so `["b","a"]` and `["a","b"]` address the
/// same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnalysisKey {
    document_ids: Vec<DocumentId>,
    analysis_type: String,
}

impl AnalysisKey {
    pub fn new(document_ids: &[DocumentId], analysis_type: impl Into<String>) -> Self {
        let mut document_ids = document_ids.to_vec();
        document_ids.sort();
        document_ids.dedup();
        Self {
            document_ids,
            analysis_type: analysis_type.into(),
        }
    }

    pub fn document_ids(&self) -> &[DocumentId] {
        &self.document_ids
    }

    pub fn analysis_type(&self) -> &str {
        &self.analysis_type
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let docs = self
            .document_ids
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{docs}]/{}", self.analysis_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: AnalysisId,
    pub document_ids: Vec<DocumentId>,
    pub analysis_type: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: Vec<Metric>,
    pub ratios: Vec<Metric>,
    pub insights: Vec<Insight>,
    pub visualization_data: VisualizationData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_references: Option<Value>,
}

impl AnalysisResult {
    pub fn key(&self) -> AnalysisKey {
        AnalysisKey::new(&self.document_ids, self.analysis_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::AnalysisKey;
    use crate::model::DocumentId;

    fn doc(id: &str) -> DocumentId {
        DocumentId::new(id).expect("document id")
    }

    #[test]
    fn analysis_key_ignores_document_order_and_duplicates() {
        let a = AnalysisKey::new(&[doc("b"), doc("a")], "basic_financial");
        let b = AnalysisKey::new(&[doc("a"), doc("b"), doc("a")], "basic_financial");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "[a,b]/basic_financial");
    }

    #[test]
    fn analysis_key_distinguishes_types() {
        let a = AnalysisKey::new(&[doc("doc1")], "basic_financial");
        let b = AnalysisKey::new(&[doc("doc1")], "ratio_analysis");
        assert_ne!(a, b);
    }
}
