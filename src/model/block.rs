// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::analysis::Metric;
use super::chart::{ChartModel, Normalized};
use super::ids::BlockId;
use super::table::TableModel;

/// Discriminant of [`BlockContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Chart,
    Table,
    Metric,
    TextSummary,
}

impl BlockType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Metric => "metric",
            Self::TextSummary => "text_summary",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown analysis block type '{0}'")]
pub struct UnknownBlockType(pub String);

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "chart" | "visualization" => Ok(Self::Chart),
            "table" => Ok(Self::Table),
            "metric" | "metrics" => Ok(Self::Metric),
            "text_summary" | "textsummary" | "summary" => Ok(Self::TextSummary),
            _ => Err(UnknownBlockType(s.to_owned())),
        }
    }
}

/// Typed payload of an analysis block, one variant per [`BlockType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "blockType", content = "content", rename_all = "snake_case")]
pub enum BlockContent {
    Chart(Normalized<ChartModel>),
    Table(Normalized<TableModel>),
    Metric(Vec<Metric>),
    TextSummary(String),
}

impl BlockContent {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Chart(_) => BlockType::Chart,
            Self::Table(_) => BlockType::Table,
            Self::Metric(_) => BlockType::Metric,
            Self::TextSummary(_) => BlockType::TextSummary,
        }
    }
}

/// One self-describing unit attached to an assistant turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBlock {
    id: BlockId,
    #[serde(flatten)]
    content: BlockContent,
    timestamp: DateTime<Utc>,
}

impl AnalysisBlock {
    pub fn new(id: BlockId, content: BlockContent, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            timestamp,
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.content.block_type()
    }

    pub fn content(&self) -> &BlockContent {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
