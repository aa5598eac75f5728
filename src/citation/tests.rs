// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Ledgerlens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Ledgerlens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use rstest::{fixture, rstest};
use serde_json::json;

use super::CitationRegistry;
use crate::config::FALLBACK_RECT;
use crate::highlight::HighlightSynchronizer;
use crate::model::{DocumentId, HighlightOrigin, SourceKind};

#[fixture]
fn registry() -> CitationRegistry {
    CitationRegistry::default()
}

fn doc(id: &str) -> DocumentId {
    DocumentId::new(id).expect("document id")
}

#[rstest]
fn empty_rects_fall_back_to_default_box(registry: CitationRegistry) {
    let citation = registry
        .resolve(
            &json!({ "text": "Revenue grew 12%", "documentId": "doc1", "rects": [] }),
            None,
        )
        .expect("citation");

    assert_eq!(citation.rects(), &[FALLBACK_RECT]);

    let highlight = registry.highlight_for(&citation);
    let bounds = highlight.position().bounding_rect();
    assert_eq!(bounds, &FALLBACK_RECT);
    assert!(bounds.x1.is_finite() && bounds.width.is_finite());
    assert_eq!(bounds.width, 300.0);
    assert_eq!(bounds.height, 20.0);
}

#[rstest]
#[case::not_an_array(json!({ "text": "t", "documentId": "d", "rects": "nope" }))]
#[case::garbage_entries(json!({ "text": "t", "documentId": "d", "rects": [{ "x1": "a" }, 7] }))]
#[case::inverted(json!({ "text": "t", "documentId": "d", "rects": [{ "x1": 10, "y1": 10, "x2": 5, "y2": 5 }] }))]
#[case::missing(json!({ "text": "t", "documentId": "d" }))]
fn malformed_rects_fall_back_to_default_box(registry: CitationRegistry, #[case] raw: serde_json::Value) {
    let citation = registry.resolve(&raw, None).expect("citation");
    assert_eq!(citation.rects(), &[FALLBACK_RECT]);
}

#[rstest]
fn citation_without_text_is_dropped(registry: CitationRegistry) {
    assert!(registry.resolve(&json!({ "documentId": "doc1" }), None).is_none());
    assert!(registry
        .resolve(&json!({ "text": "   ", "documentId": "doc1" }), None)
        .is_none());
}

#[rstest]
fn citation_without_document_uses_default_or_is_dropped(registry: CitationRegistry) {
    let raw = json!({ "text": "Operating margin 18%" });
    assert!(registry.resolve(&raw, None).is_none());

    let citation = registry.resolve(&raw, Some(&doc("doc9"))).expect("citation");
    assert_eq!(citation.document_id(), &doc("doc9"));
}

#[rstest]
fn persisted_highlight_id_is_reused(registry: CitationRegistry) {
    let raw = json!({ "text": "t", "documentId": "doc1", "highlightId": "h-42" });
    let a = registry.resolve(&raw, None).expect("citation");
    let b = registry.resolve(&raw, None).expect("citation");
    assert_eq!(a.highlight_id().as_str(), "h-42");
    assert_eq!(a.highlight_id(), b.highlight_id());
}

#[rstest]
fn persisted_focus_suffixed_id_is_replaced(registry: CitationRegistry) {
    let raw = json!({ "text": "t", "documentId": "doc1", "highlightId": "h-42-focus" });
    let citation = registry.resolve(&raw, None).expect("citation");
    assert!(!citation.highlight_id().is_focus_variant());

    let mut sync = HighlightSynchronizer::default();
    sync.upsert_ai(registry.highlight_for(&citation));
    sync.focus(citation.highlight_id()).expect("ticket");
    let ids = sync
        .highlights()
        .iter()
        .map(|h| h.id().clone())
        .collect::<std::collections::BTreeSet<_>>();
    assert_eq!(ids.len(), 2);
}

#[rstest]
fn generated_highlight_ids_never_collide(registry: CitationRegistry) {
    let raw = json!({ "text": "t", "documentId": "doc1" });
    let ids = (0..64)
        .map(|_| registry.resolve(&raw, None).expect("citation").highlight_id().clone())
        .collect::<std::collections::BTreeSet<_>>();
    assert_eq!(ids.len(), 64);
}

#[rstest]
fn rects_accept_corner_and_size_forms(registry: CitationRegistry) {
    let citation = registry
        .resolve(
            &json!({
                "text": "t",
                "documentId": "doc1",
                "position": {
                    "pageNumber": 4,
                    "rects": [
                        { "x1": 10, "y1": 20, "x2": 110, "y2": 32 },
                        { "left": 10, "top": 34, "width": 80, "height": 12 }
                    ]
                }
            }),
            None,
        )
        .expect("citation");

    assert_eq!(citation.page(), 4);
    assert_eq!(citation.rects().len(), 2);
    assert_eq!(citation.rects()[1].x2, 90.0);
    assert_eq!(citation.rects()[1].y2, 46.0);
}

#[rstest]
fn page_defaults_to_first(registry: CitationRegistry) {
    let citation = registry
        .resolve(&json!({ "text": "t", "documentId": "d", "page": 0 }), None)
        .expect("citation");
    assert_eq!(citation.page(), 1);
}

#[rstest]
fn source_and_confidence_are_carried_into_the_comment(registry: CitationRegistry) {
    let citation = registry
        .resolve(
            &json!({
                "text": "Net income $4.2M",
                "documentId": "doc1",
                "source": { "type": "table", "reference": "Income Statement" },
                "confidence": 1.7
            }),
            None,
        )
        .expect("citation");

    assert_eq!(citation.source().map(|s| s.kind), Some(SourceKind::Table));
    assert_eq!(citation.confidence(), Some(1.0));

    let highlight = registry.highlight_for(&citation);
    assert_eq!(highlight.origin(), HighlightOrigin::Ai);
    assert_eq!(highlight.comment().text, "table: Income Statement (100% confidence)");
    assert_eq!(highlight.content().text, "Net income $4.2M");
}

#[rstest]
fn user_highlight_keeps_comment(registry: CitationRegistry) {
    let highlight = registry
        .user_highlight(
            &json!({
                "text": "Liquidity risk",
                "comment": { "text": "check this", "emoji": "🔍" },
                "position": { "pageNumber": 2, "rects": [] }
            }),
            Some(&doc("doc1")),
        )
        .expect("highlight");

    assert_eq!(highlight.origin(), HighlightOrigin::User);
    assert_eq!(highlight.comment().text, "check this");
    assert_eq!(highlight.position().page_number(), 2);
    assert_eq!(highlight.position().bounding_rect(), &FALLBACK_RECT);
}
