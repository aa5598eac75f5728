// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shape normalization.
//!
//! The analysis service has shipped several incompatible payload shapes over time (a legacy
//! flat analysis result, a tool-based nested result, blocks embedded in chat replies) and the
//! local simulation provider adds one more. Everything here reduces those to the canonical
//! [`ChartModel`]/[`TableModel`]/[`AnalysisBlock`] types. Functions are pure apart from id
//! generation and logging.

pub mod chart;
pub mod numeric;
pub mod payload;
pub mod table;

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::citation::CitationRegistry;
use crate::config::ClientConfig;
use crate::model::{
    AnalysisId, BlockType, ChartModel, DocumentId, Normalized, TableModel, UnknownBlockType,
};

/// A payload that cannot be turned into a renderable chart or table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("payload is not an object")]
    NotAnObject,
    #[error("unknown chart type '{0}'")]
    UnknownChartType(String),
    #[error("payload has no data array")]
    MissingData,
    #[error("data does not match any supported shape")]
    UnrecognizedShape,
    #[error("paired x/y data needs exactly one metric, {declared} declared")]
    AmbiguousPairedMetric { declared: usize },
    #[error("no valid numeric data")]
    NoNumericData,
    #[error("table has no columns")]
    NoColumns,
    #[error("table has no rows")]
    NoRows,
}

/// An analysis result that fails required-field validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("analysis result is not an object")]
    NotAnObject,
    #[error("analysis result for {documents} has no valid id")]
    MissingId { documents: DocumentList },
    #[error("analysis result {id} has no analysis type")]
    MissingAnalysisType { id: AnalysisId },
}

impl ValidationError {
    pub fn document_ids(&self) -> &[DocumentId] {
        match self {
            Self::MissingId { documents } => &documents.0,
            Self::NotAnObject | Self::MissingAnalysisType { .. } => &[],
        }
    }
}

/// Document ids rendered as a comma-separated list in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentList(pub Vec<DocumentId>);

impl fmt::Display for DocumentList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("unknown documents");
        }
        let ids = self.0.iter().map(|d| d.as_str()).collect::<Vec<_>>();
        write!(f, "document {}", ids.join(", "))
    }
}

/// An embedded analysis block that is rejected instead of silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("analysis block is not an object")]
    NotAnObject,
    #[error("analysis block has no type")]
    MissingType,
    #[error(transparent)]
    UnknownBlockType(#[from] UnknownBlockType),
    #[error("{block_type} block has unusable content")]
    InvalidContent { block_type: BlockType },
}

/// Entry point for every payload shape. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Normalizer {
    registry: CitationRegistry,
    palette: Vec<String>,
    default_document: Option<DocumentId>,
}

impl Normalizer {
    pub fn new(registry: CitationRegistry, palette: Vec<String>) -> Self {
        Self {
            registry,
            palette,
            default_document: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            CitationRegistry::new(config.fallback_rect),
            config.palette.clone(),
        )
    }

    /// Document that citations without an explicit `documentId` are attributed to.
    pub fn with_default_document(mut self, document_id: Option<DocumentId>) -> Self {
        self.default_document = document_id;
        self
    }

    pub fn registry(&self) -> &CitationRegistry {
        &self.registry
    }

    pub fn default_document(&self) -> Option<&DocumentId> {
        self.default_document.as_ref()
    }

    pub(crate) fn palette(&self) -> &[String] {
        &self.palette
    }

    /// Chart payload to a render slot; failures become an explicit "no valid data" state.
    pub fn chart_slot(&self, raw: &Value) -> Normalized<ChartModel> {
        match self.chart(raw) {
            Ok(model) => Normalized::Ready(model),
            Err(err) => {
                warn!(error = %err, "chart payload could not be normalized");
                Normalized::NoValidData {
                    title: payload::payload_title(raw),
                    diagnosis: err.to_string(),
                }
            }
        }
    }

    pub fn table_slot(&self, raw: &Value) -> Normalized<TableModel> {
        match self.table(raw) {
            Ok(model) => Normalized::Ready(model),
            Err(err) => {
                warn!(error = %err, "table payload could not be normalized");
                Normalized::NoValidData {
                    title: payload::payload_title(raw),
                    diagnosis: err.to_string(),
                }
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}
