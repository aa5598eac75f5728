// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lenient numeric coercion for financial figures.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<open>\()?\s*(?P<sign>[-+])?\s*[$€£¥]?\s*(?P<num>\d[\d,]*(?:\.\d+)?|\.\d+)\s*(?P<suffix>[kKmMbB])?\s*%?\s*(?P<close>\))?$",
        )
        .expect("numeric regex")
    })
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("slug regex"))
}

/// Reads a finite number from a JSON number or a formatted string.
///
/// Accepts `1,234.5`, `$12.3`, `45%`, `(300)` (accounting negative) and `K`/`M`/`B`
/// magnitude suffixes. Booleans, nulls and free text are not numbers.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

pub fn parse_numeric_str(raw: &str) -> Option<f64> {
    let caps = numeric_re().captures(raw.trim())?;
    let parenthesised = match (caps.name("open"), caps.name("close")) {
        (Some(_), Some(_)) => true,
        (None, None) => false,
        _ => return None,
    };

    let digits = caps.name("num")?.as_str().replace(',', "");
    let mut value = digits.parse::<f64>().ok()?;
    value *= match caps.name("suffix").map(|m| m.as_str()) {
        Some("k" | "K") => 1e3,
        Some("m" | "M") => 1e6,
        Some("b" | "B") => 1e9,
        _ => 1.0,
    };

    let negative = parenthesised || caps.name("sign").is_some_and(|m| m.as_str() == "-");
    if negative {
        value = -value;
    }
    value.is_finite().then_some(value)
}

/// `"Fiscal Quarter"` -> `"fiscal_quarter"`.
pub fn slugify(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    slug_re()
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_owned()
}

/// JSON number for `value`, or `Null` for values JSON cannot carry.
pub(crate) fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{coerce_number, parse_numeric_str, slugify};

    #[rstest]
    #[case("42", 42.0)]
    #[case("1,234.5", 1234.5)]
    #[case("$12.30", 12.3)]
    #[case("45%", 45.0)]
    #[case("(300)", -300.0)]
    #[case("-7.5", -7.5)]
    #[case("2.5M", 2_500_000.0)]
    #[case(" $1.2B ", 1_200_000_000.0)]
    #[case(".5", 0.5)]
    fn parses_formatted_figures(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(parse_numeric_str(raw), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("n/a")]
    #[case("Q1")]
    #[case("(300")]
    #[case("12 apples")]
    fn rejects_non_numeric_text(#[case] raw: &str) {
        assert_eq!(parse_numeric_str(raw), None);
    }

    #[test]
    fn coerce_number_ignores_non_numeric_json() {
        assert_eq!(coerce_number(&json!(3)), Some(3.0));
        assert_eq!(coerce_number(&json!("3")), Some(3.0));
        assert_eq!(coerce_number(&json!(true)), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!([1])), None);
    }

    #[test]
    fn slugify_lowercases_and_joins_words() {
        assert_eq!(slugify("Fiscal Quarter"), "fiscal_quarter");
        assert_eq!(slugify("  Year (FY) "), "year_fy");
        assert_eq!(slugify("---"), "");
    }
}
