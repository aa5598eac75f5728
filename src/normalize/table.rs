// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Table payloads to [`TableModel`].

use serde_json::{Map, Value};
use tracing::warn;

use super::numeric::{coerce_number, slugify};
use super::payload::{field, str_field};
use super::{Normalizer, ShapeError};
use crate::model::{Align, TableCell, TableColumn, TableModel};

impl Normalizer {
    /// Columns come from `columns` (strings or objects) or are inferred from the first row.
    /// Rows may be keyed objects or positional arrays.
    pub fn table(&self, raw: &Value) -> Result<TableModel, ShapeError> {
        let obj = raw.as_object().ok_or(ShapeError::NotAnObject)?;
        let raw_rows = field(obj, &["rows", "data"])
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut columns = field(obj, &["columns", "headers"])
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_column).collect::<Vec<_>>())
            .unwrap_or_default();
        if columns.is_empty() {
            columns = raw_rows.first().map(infer_columns).unwrap_or_default();
        }
        if columns.is_empty() {
            return Err(ShapeError::NoColumns);
        }

        let rows = raw_rows
            .iter()
            .filter_map(|row| match row {
                Value::Object(cells) => Some(
                    columns
                        .iter()
                        .map(|column| self.cell(lookup(cells, &column.key)))
                        .collect::<Vec<_>>(),
                ),
                Value::Array(cells) => Some(
                    (0..columns.len())
                        .map(|index| self.cell(cells.get(index)))
                        .collect::<Vec<_>>(),
                ),
                _ => {
                    warn!("skipping table row that is neither an object nor an array");
                    None
                }
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(ShapeError::NoRows);
        }

        Ok(TableModel {
            title: str_field(obj, &["title", "name"]).map(str::to_owned),
            columns,
            rows,
        })
    }

    fn cell(&self, raw: Option<&Value>) -> TableCell {
        let Some(raw) = raw else {
            return TableCell::Raw(Value::Null);
        };
        if let Some(obj) = raw.as_object() {
            if let (Some(value), Some(citation)) = (obj.get("value"), obj.get("citation")) {
                return match self.registry().resolve(citation, self.default_document()) {
                    Some(citation) => TableCell::Cited {
                        value: value.clone(),
                        citation: Box::new(citation),
                    },
                    None => TableCell::Raw(value.clone()),
                };
            }
        }
        TableCell::Raw(raw.clone())
    }
}

fn parse_column(raw: &Value) -> Option<TableColumn> {
    match raw {
        Value::String(name) if !name.trim().is_empty() => Some(TableColumn {
            key: name.clone(),
            header: name.clone(),
            format: None,
            width: None,
            align: Align::default(),
        }),
        Value::Object(obj) => {
            let key = str_field(obj, &["key", "dataKey", "accessor", "field"])
                .or_else(|| str_field(obj, &["header", "label", "title", "name"]))?
                .to_owned();
            let header = str_field(obj, &["header", "label", "title", "name"])
                .unwrap_or(&key)
                .to_owned();
            Some(TableColumn {
                key,
                header,
                format: str_field(obj, &["format", "formatter"]).map(str::to_owned),
                width: field(obj, &["width"]).and_then(coerce_number),
                align: str_field(obj, &["align"])
                    .map(Align::parse_lenient)
                    .unwrap_or_default(),
            })
        }
        _ => None,
    }
}

fn infer_columns(first_row: &Value) -> Vec<TableColumn> {
    let column = |key: String, header: String| TableColumn {
        key,
        header,
        format: None,
        width: None,
        align: Align::default(),
    };
    match first_row {
        Value::Object(cells) => cells
            .keys()
            .filter(|key| key.as_str() != "citation")
            .map(|key| column(key.clone(), key.clone()))
            .collect(),
        Value::Array(cells) => (0..cells.len())
            .map(|index| column(format!("col_{index}"), format!("Column {}", index + 1)))
            .collect(),
        _ => Vec::new(),
    }
}

/// Exact key, then its slug, then a case-insensitive match.
fn lookup<'a>(cells: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    cells
        .get(key)
        .or_else(|| cells.get(&slugify(key)))
        .or_else(|| {
            cells
                .iter()
                .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
}
