// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Messages carry citations and analysis blocks; blocks carry canonical chart/table models;
//! citations become highlights on the document viewer.

pub mod analysis;
pub mod block;
pub mod chart;
pub mod citation;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod geometry;
pub mod highlight;
pub mod ids;
pub mod message;
pub mod session;
pub mod table;

pub use analysis::{
    AnalysisKey, AnalysisResult, Importance, Insight, Metric, VisualizationData,
};
pub use block::{AnalysisBlock, BlockContent, BlockType, UnknownBlockType};
pub use chart::{
    ChartConfig, ChartModel, ChartType, Formatter, MetricConfig, MetricSpec, Normalized,
    ParseChartTypeError, Record, YDomain,
};
pub use citation::{Citation, CitationSource, ParseSourceKindError, SourceKind};
pub use geometry::{Position, Rect, Rects};
pub use highlight::{Highlight, HighlightComment, HighlightContent, HighlightOrigin};
pub use ids::{
    AnalysisId, BlockId, CitationId, DocumentId, HighlightId, Id, IdError, MessageId, SessionId,
};
pub use message::{Message, ParseRoleError, Role};
pub use session::SessionContext;
pub use table::{Align, TableCell, TableColumn, TableModel};
