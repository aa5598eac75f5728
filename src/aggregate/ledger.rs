// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::model::{AnalysisKey, AnalysisResult};
use crate::normalize::{Normalizer, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerUpdate {
    Appended,
    Replaced,
}

/// Replace-by-key collection of analysis results.
///
/// Keys are `(documentIds, analysisType)`. A result for a known key replaces the earlier
/// one in place; a new key appends. The surviving value is always the last one *applied*,
/// whatever order the requests were issued in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisLedger {
    entries: Vec<(AnalysisKey, AnalysisResult)>,
}

impl AnalysisLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, result: AnalysisResult) -> LedgerUpdate {
        let key = result.key();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                debug!(key = %key, "replacing analysis result");
                *existing = result;
                LedgerUpdate::Replaced
            }
            None => {
                debug!(key = %key, "appending analysis result");
                self.entries.push((key, result));
                LedgerUpdate::Appended
            }
        }
    }

    /// Validates `raw` and applies it. An invalid result leaves the ledger untouched.
    pub fn apply_raw(
        &mut self,
        normalizer: &Normalizer,
        raw: &Value,
        now: DateTime<Utc>,
    ) -> Result<LedgerUpdate, ValidationError> {
        let result = normalizer.analysis_result(raw, now)?;
        Ok(self.apply(result))
    }

    pub fn get(&self, key: &AnalysisKey) -> Option<&AnalysisResult> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, result)| result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.entries.iter().map(|(_, result)| result)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::json;

    use super::{AnalysisLedger, LedgerUpdate};
    use crate::model::{AnalysisKey, DocumentId};
    use crate::normalize::Normalizer;

    fn raw(id: &str, docs: &[&str], ty: &str, revenue: f64) -> serde_json::Value {
        json!({
            "id": id,
            "documentIds": docs,
            "analysisType": ty,
            "metrics": [{ "name": "Revenue", "value": revenue }]
        })
    }

    #[test]
    fn same_key_replaces_and_new_key_appends() {
        let normalizer = Normalizer::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = AnalysisLedger::new();

        let updates = [
            raw("a1", &["doc1"], "basic_financial", 1.0),
            raw("a2", &["doc1"], "ratio_analysis", 2.0),
            raw("a3", &["doc1"], "basic_financial", 3.0),
        ]
        .iter()
        .map(|r| ledger.apply_raw(&normalizer, r, now).unwrap())
        .collect::<Vec<_>>();

        assert_eq!(
            updates,
            vec![LedgerUpdate::Appended, LedgerUpdate::Appended, LedgerUpdate::Replaced]
        );
        assert_eq!(ledger.len(), 2);

        let key = AnalysisKey::new(&[DocumentId::new("doc1").unwrap()], "basic_financial");
        let basic = ledger.get(&key).unwrap();
        assert_eq!(basic.id.as_str(), "a3");
        assert_eq!(basic.metrics[0].value, Some(3.0));
        let order = ledger.iter().map(|r| r.analysis_type.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["basic_financial", "ratio_analysis"]);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    fn replaying_the_same_result_is_idempotent(#[case] times: usize) {
        let normalizer = Normalizer::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = AnalysisLedger::new();
        for _ in 0..times {
            ledger
                .apply_raw(&normalizer, &raw("a1", &["doc2", "doc1"], "basic_financial", 5.0), now)
                .unwrap();
        }
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn document_order_does_not_split_keys() {
        let normalizer = Normalizer::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = AnalysisLedger::new();
        ledger
            .apply_raw(&normalizer, &raw("a1", &["doc1", "doc2"], "t", 1.0), now)
            .unwrap();
        let update = ledger
            .apply_raw(&normalizer, &raw("a2", &["doc2", "doc1"], "t", 2.0), now)
            .unwrap();
        assert_eq!(update, LedgerUpdate::Replaced);
    }

    #[test]
    fn invalid_result_leaves_ledger_untouched() {
        let normalizer = Normalizer::default();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut ledger = AnalysisLedger::new();
        let err = ledger.apply_raw(&normalizer, &json!({ "analysisType": "t" }), now);
        assert!(err.is_err());
        assert!(ledger.is_empty());
    }
}
