// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reply and analysis payloads to typed blocks, results and messages.
//!
//! Accepted reply shapes:
//! - embedded `analysisBlocks[]` (`{id, blockType|type, content, timestamp}`);
//! - tool-based `toolResults[]` (`{tool|name, result|output}`), optionally under `analysis`;
//! - legacy flat `visualizationData` (`{charts, tables}` or a name-keyed object), optionally
//!   with `metrics` and `analysisText`.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::numeric::coerce_number;
use super::{BlockError, DocumentList, Normalizer, ValidationError};
use crate::model::{
    AnalysisBlock, AnalysisId, AnalysisResult, BlockContent, BlockId, BlockType, DocumentId,
    Importance, Insight, Message, MessageId, Metric, ParseRoleError, Role, SessionId,
    UnknownBlockType, VisualizationData,
};

/// First non-null value among `keys`.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

pub(crate) fn str_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(Value::as_str)
}

/// Strings as-is, numbers in their JSON form.
pub(crate) fn value_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Title of a chart or table payload, used for "no valid data" slots.
pub(crate) fn payload_title(raw: &Value) -> Option<String> {
    let obj = raw.as_object()?;
    str_field(obj, &["title", "name"])
        .or_else(|| {
            field(obj, &["config"])
                .and_then(Value::as_object)
                .and_then(|config| str_field(config, &["title"]))
        })
        .map(str::to_owned)
}

fn timestamp_field(obj: &Map<String, Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    match field(obj, &["timestamp", "createdAt", "created_at"]) {
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or(fallback),
        Some(Value::Number(millis)) => millis
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or(fallback),
        _ => fallback,
    }
}

fn document_ids(obj: &Map<String, Value>) -> Vec<DocumentId> {
    match field(obj, &["documentIds", "document_ids", "documentId", "document_id"]) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| DocumentId::new(id).ok())
            .collect(),
        Some(Value::String(id)) => DocumentId::new(id.as_str()).ok().into_iter().collect(),
        _ => Vec::new(),
    }
}

/// A wire message that cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("message is not an object")]
    NotAnObject,
    #[error(transparent)]
    UnknownRole(#[from] ParseRoleError),
}

/// A message decoded from the wire, with the blocks that were rejected on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedMessage {
    pub message: Message,
    pub rejected: Vec<BlockError>,
}

/// Blocks reduced from one reply, plus the ones rejected with a diagnostic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplyBlocks {
    pub blocks: Vec<AnalysisBlock>,
    pub rejected: Vec<BlockError>,
}

impl ReplyBlocks {
    fn push(&mut self, result: Result<AnalysisBlock, BlockError>) {
        match result {
            Ok(block) => self.blocks.push(block),
            Err(err) => {
                warn!(error = %err, "rejecting analysis block");
                self.rejected.push(err);
            }
        }
    }
}

impl Normalizer {
    /// One embedded block. `content` defaults to the block object itself.
    pub fn block(&self, raw: &Value, now: DateTime<Utc>) -> Result<AnalysisBlock, BlockError> {
        let obj = raw.as_object().ok_or(BlockError::NotAnObject)?;
        let block_type = str_field(obj, &["blockType", "block_type", "type"])
            .ok_or(BlockError::MissingType)?
            .parse::<BlockType>()?;
        let content = obj.get("content").unwrap_or(raw);
        let id = str_field(obj, &["id", "blockId"])
            .and_then(|id| BlockId::new(id).ok())
            .unwrap_or_else(|| BlockId::generate("block"));
        let timestamp = timestamp_field(obj, now);

        let content = self.block_content(block_type, content)?;
        Ok(AnalysisBlock::new(id, content, timestamp))
    }

    fn block_content(
        &self,
        block_type: BlockType,
        content: &Value,
    ) -> Result<BlockContent, BlockError> {
        match block_type {
            BlockType::Chart => Ok(BlockContent::Chart(self.chart_slot(content))),
            BlockType::Table => Ok(BlockContent::Table(self.table_slot(content))),
            BlockType::Metric => {
                let metrics = self.metrics(content);
                if metrics.is_empty() {
                    return Err(BlockError::InvalidContent { block_type });
                }
                Ok(BlockContent::Metric(metrics))
            }
            BlockType::TextSummary => summary_text(content)
                .map(BlockContent::TextSummary)
                .ok_or(BlockError::InvalidContent { block_type }),
        }
    }

    /// Reduces any supported reply shape to blocks.
    pub fn blocks_from_reply(&self, reply: &Value, now: DateTime<Utc>) -> ReplyBlocks {
        let mut out = ReplyBlocks::default();
        let Some(obj) = reply.as_object() else {
            return out;
        };
        let nested = field(obj, &["analysis", "analysisResult"]).and_then(Value::as_object);
        let lookup = |keys: &[&str]| field(obj, keys).or_else(|| nested.and_then(|n| field(n, keys)));

        if let Some(items) = lookup(&["analysisBlocks", "analysis_blocks"]).and_then(Value::as_array) {
            for item in items {
                out.push(self.block(item, now));
            }
        }

        if let Some(results) = lookup(&["toolResults", "tool_results"]).and_then(Value::as_array) {
            for result in results {
                self.tool_blocks(result, now, &mut out);
            }
        }

        if let Some(data) = lookup(&["visualizationData", "visualization_data"]) {
            let visualization = self.visualization_data(data);
            for chart in visualization.charts {
                out.push(Ok(new_block(BlockContent::Chart(chart), now)));
            }
            for table in visualization.tables {
                out.push(Ok(new_block(BlockContent::Table(table), now)));
            }
            if let Some(raw) = lookup(&["metrics"]) {
                let metrics = self.metrics(raw);
                if !metrics.is_empty() {
                    out.push(Ok(new_block(BlockContent::Metric(metrics), now)));
                }
            }
            if let Some(text) = lookup(&["analysisText", "analysis_text"]).and_then(summary_text) {
                out.push(Ok(new_block(BlockContent::TextSummary(text), now)));
            }
        }

        out
    }

    fn tool_blocks(&self, raw: &Value, now: DateTime<Utc>, out: &mut ReplyBlocks) {
        let Some(obj) = raw.as_object() else {
            out.push(Err(BlockError::NotAnObject));
            return;
        };
        let Some(tool) = str_field(obj, &["tool", "name", "toolName"]) else {
            out.push(Err(BlockError::MissingType));
            return;
        };
        let Some(block_type) = classify_tool(tool) else {
            out.push(Err(UnknownBlockType(tool.to_owned()).into()));
            return;
        };
        let result = field(obj, &["result", "output", "content"]).unwrap_or(&Value::Null);

        match (block_type, result) {
            (BlockType::Chart | BlockType::Table, Value::Array(items)) => {
                for item in items {
                    out.push(self.block_content(block_type, item).map(|c| new_block(c, now)));
                }
            }
            _ => out.push(
                self.block_content(block_type, result)
                    .map(|c| new_block(c, now)),
            ),
        }
    }

    /// `{charts, tables}` or a name-keyed object of payloads.
    pub fn visualization_data(&self, raw: &Value) -> VisualizationData {
        let mut data = VisualizationData::default();
        let Some(obj) = raw.as_object() else {
            return data;
        };

        if obj.contains_key("charts") || obj.contains_key("tables") {
            for (name, chart) in payload_entries(obj.get("charts")) {
                data.charts.push(self.chart_slot(&titled(chart, name)));
            }
            for (name, table) in payload_entries(obj.get("tables")) {
                data.tables.push(self.table_slot(&titled(table, name)));
            }
            return data;
        }

        for (name, payload) in obj.iter().filter(|(_, payload)| payload.is_object()) {
            let titled = titled(payload, Some(name.as_str()));
            if payload.get("columns").is_some() {
                data.tables.push(self.table_slot(&titled));
            } else {
                data.charts.push(self.chart_slot(&titled));
            }
        }
        data
    }

    /// A single metric object, a `{metrics: [...]}` wrapper, an array, or a name-keyed map.
    pub fn metrics(&self, raw: &Value) -> Vec<Metric> {
        match raw {
            Value::Array(items) => items
                .iter()
                .flat_map(|item| self.metrics(item))
                .collect(),
            Value::Object(obj) => {
                if let Some(inner) = field(obj, &["metrics"]).filter(|v| v.is_array()) {
                    return self.metrics(inner);
                }
                if str_field(obj, &["name", "label", "metric", "title"]).is_some() {
                    return self.metric(None, raw).into_iter().collect();
                }
                obj.iter()
                    .filter_map(|(name, value)| self.metric(Some(name), value))
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn metric(&self, name: Option<&str>, raw: &Value) -> Option<Metric> {
        let Some(obj) = raw.as_object() else {
            let name = name?;
            return Some(Metric {
                value: coerce_number(raw),
                display: raw.as_str().map(str::to_owned),
                ..Metric::numeric(name, 0.0)
            })
            .filter(|m| m.value.is_some() || m.display.is_some());
        };

        let name = str_field(obj, &["name", "label", "metric", "title"]).or(name)?;
        let value_raw = field(obj, &["value", "amount", "current"]);
        Some(Metric {
            name: name.to_owned(),
            value: value_raw.and_then(coerce_number),
            display: value_raw.and_then(Value::as_str).map(str::to_owned),
            unit: str_field(obj, &["unit", "currency"]).map(str::to_owned),
            change: field(obj, &["change", "delta", "changePercent"]).and_then(coerce_number),
            period: str_field(obj, &["period", "year", "date"]).map(str::to_owned),
            citation: field(obj, &["citation"])
                .and_then(|c| self.registry().resolve(c, self.default_document())),
        })
    }

    /// A plain string or `{text, importance, category, citations}`.
    pub fn insight(&self, raw: &Value) -> Option<Insight> {
        match raw {
            Value::String(text) if !text.trim().is_empty() => Some(Insight::text(text.trim())),
            Value::Object(obj) => {
                let text = str_field(obj, &["text", "insight", "description", "content"])?
                    .trim();
                if text.is_empty() {
                    return None;
                }
                let citations = field(obj, &["citations"])
                    .and_then(Value::as_array)
                    .map(|items| self.registry().resolve_all(items, self.default_document()))
                    .unwrap_or_default();
                Some(Insight {
                    text: text.to_owned(),
                    importance: str_field(obj, &["importance", "priority"])
                        .and_then(Importance::parse_lenient),
                    category: str_field(obj, &["category", "type"]).map(str::to_owned),
                    citations,
                })
            }
            _ => None,
        }
    }

    /// Validates and converts a top-level analysis result.
    pub fn analysis_result(
        &self,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult, ValidationError> {
        let obj = raw.as_object().ok_or(ValidationError::NotAnObject)?;
        let document_ids = document_ids(obj);

        let id = field(obj, &["id", "analysisId", "analysis_id"])
            .and_then(value_label)
            .and_then(|id| AnalysisId::new(id).ok())
            .ok_or_else(|| ValidationError::MissingId {
                documents: DocumentList(document_ids.clone()),
            })?;
        let analysis_type = str_field(obj, &["analysisType", "analysis_type", "type"])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ValidationError::MissingAnalysisType { id: id.clone() })?
            .to_owned();

        let scoped;
        let this = match (self.default_document(), document_ids.first()) {
            (None, Some(first)) => {
                scoped = self.clone().with_default_document(Some(first.clone()));
                &scoped
            }
            _ => self,
        };

        let insights = field(obj, &["insights", "keyFindings"])
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|i| this.insight(i)).collect())
            .unwrap_or_default();

        Ok(AnalysisResult {
            id,
            document_ids,
            analysis_type,
            timestamp: timestamp_field(obj, now),
            metrics: field(obj, &["metrics"])
                .map(|m| this.metrics(m))
                .unwrap_or_default(),
            ratios: field(obj, &["ratios"])
                .map(|m| this.metrics(m))
                .unwrap_or_default(),
            insights,
            visualization_data: field(obj, &["visualizationData", "visualization_data"])
                .map(|v| this.visualization_data(v))
                .unwrap_or_default(),
            analysis_text: field(obj, &["analysisText", "analysis_text", "summary"])
                .and_then(summary_text),
            citation_references: field(obj, &["citationReferences", "citation_references"])
                .cloned(),
        })
    }

    /// Decodes a chat message from the wire. Missing roles default to assistant; missing ids
    /// are derived from role, content and timestamp.
    pub fn message_from_wire(
        &self,
        session_id: &SessionId,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<IngestedMessage, MessageError> {
        let obj = raw.as_object().ok_or(MessageError::NotAnObject)?;
        let role = match str_field(obj, &["role", "sender"]) {
            Some(role) => role.parse::<Role>()?,
            None => Role::Assistant,
        };
        let content = str_field(obj, &["content", "text", "message", "response"])
            .unwrap_or_default()
            .to_owned();
        let timestamp = timestamp_field(obj, now);
        let documents = field(obj, &["referencedDocuments", "referenced_documents"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|id| DocumentId::new(id).ok())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        let analyses = field(obj, &["referencedAnalyses", "referenced_analyses"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(value_label)
                    .filter_map(|id| AnalysisId::new(id).ok())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let scoped;
        let this = match (self.default_document(), documents.first()) {
            (None, Some(first)) => {
                scoped = self.clone().with_default_document(Some(first.clone()));
                &scoped
            }
            _ => self,
        };
        let citations = field(obj, &["citations"])
            .and_then(Value::as_array)
            .map(|items| this.registry().resolve_all(items, this.default_document()))
            .unwrap_or_default();
        let ReplyBlocks { blocks, rejected } = if role == Role::Assistant {
            this.blocks_from_reply(raw, timestamp)
        } else {
            ReplyBlocks::default()
        };

        let mut message = Message::new(session_id.clone(), role, content, timestamp)
            .with_documents(documents)
            .with_analyses(analyses)
            .with_citations(citations)
            .with_blocks(blocks);
        if let Some(id) = str_field(obj, &["id", "messageId"]).and_then(|id| MessageId::new(id).ok()) {
            message = message.with_id(id);
        }

        Ok(IngestedMessage { message, rejected })
    }
}

fn new_block(content: BlockContent, now: DateTime<Utc>) -> AnalysisBlock {
    AnalysisBlock::new(BlockId::generate("block"), content, now)
}

fn classify_tool(tool: &str) -> Option<BlockType> {
    let tool = tool.to_ascii_lowercase();
    if tool.contains("chart") || tool.contains("visuali") {
        Some(BlockType::Chart)
    } else if tool.contains("table") {
        Some(BlockType::Table)
    } else if tool.contains("metric") || tool.contains("ratio") {
        Some(BlockType::Metric)
    } else if tool.contains("summary") || tool.contains("text") {
        Some(BlockType::TextSummary)
    } else {
        None
    }
}

fn summary_text(raw: &Value) -> Option<String> {
    let text = match raw {
        Value::String(text) => text.as_str(),
        Value::Object(obj) => str_field(obj, &["text", "summary", "content"])?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Entries of a `charts`/`tables` member: an array, or an object keyed by payload name.
fn payload_entries(raw: Option<&Value>) -> Vec<(Option<&str>, &Value)> {
    match raw {
        Some(Value::Array(items)) => items.iter().map(|item| (None, item)).collect(),
        Some(Value::Object(obj)) => obj
            .iter()
            .map(|(name, item)| (Some(name.as_str()), item))
            .collect(),
        _ => Vec::new(),
    }
}

/// Copies the entry name into `title` when the payload has none.
fn titled(payload: &Value, name: Option<&str>) -> Value {
    match (payload, name) {
        (Value::Object(obj), Some(name)) if payload_title(payload).is_none() => {
            let mut obj = obj.clone();
            obj.insert("title".to_owned(), Value::String(name.to_owned()));
            Value::Object(obj)
        }
        _ => payload.clone(),
    }
}
