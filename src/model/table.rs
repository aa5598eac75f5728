// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::citation::Citation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" | "middle" => Self::Center,
            "right" | "end" => Self::Right,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub key: String,
    pub header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default)]
    pub align: Align,
}

/// A table cell: a bare value, or a value backed by a citation the viewer can jump to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TableCell {
    Cited { value: Value, citation: Box<Citation> },
    Raw(Value),
}

impl TableCell {
    pub fn value(&self) -> &Value {
        match self {
            Self::Cited { value, .. } | Self::Raw(value) => value,
        }
    }

    pub fn citation(&self) -> Option<&Citation> {
        match self {
            Self::Cited { citation, .. } => Some(&**citation),
            Self::Raw(_) => None,
        }
    }
}

/// Rows are positional and line up with `columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<TableCell>>,
}

impl TableModel {
    pub fn cell(&self, row: usize, key: &str) -> Option<&TableCell> {
        let column = self.columns.iter().position(|c| c.key == key)?;
        self.rows.get(row)?.get(column)
    }
}
