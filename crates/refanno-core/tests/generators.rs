#![allow(dead_code)]

use std::collections::BTreeMap;

use proptest::prelude::*;
use refanno_core::model::{AnnotationState, Label, LabelRegistry};
use refanno_core::provenance::{Entity, HistoryEntry, ProvenanceLog};
use refanno_core::tokenizer::span_tokenize;

pub const LABELS: [&str; 3] = ["PER", "ORG", "LOC"];

pub fn registry() -> LabelRegistry {
    LabelRegistry::new(
        LABELS
            .iter()
            .zip(1u32..)
            .map(|(name, id)| Label::new(id, *name, "grey-11"))
            .collect(),
    )
}

/// Paragraph text: 1..12 lowercase words separated by one or two spaces,
/// with the odd punctuation mark.
pub fn arb_text() -> impl Strategy<Value = String> + Clone {
    prop::collection::vec(("[a-z]{1,6}", prop::bool::ANY, prop::bool::ANY), 1..12).prop_map(
        |words| {
            let mut text = String::new();
            for (word, wide, punct) in words {
                if !text.is_empty() {
                    text.push_str(if wide { "  " } else { " " });
                }
                text.push_str(&word);
                if punct {
                    text.push(',');
                }
            }
            text
        },
    )
}

pub fn arb_state() -> impl Strategy<Value = AnnotationState> + Clone {
    prop_oneof![
        Just(AnnotationState::Candidate),
        Just(AnnotationState::Suggested),
        Just(AnnotationState::Accepted),
        Just(AnnotationState::Rejected),
    ]
}

/// One interactive edit against a paragraph of `len` UTF-16 units.
#[derive(Debug, Clone)]
pub enum Op {
    Draw {
        start: usize,
        end: usize,
        label: usize,
    },
    /// Remove the `pick`-th block (modulo the block count), reintroducing
    /// its tokens.
    Remove { pick: usize },
}

pub fn arb_op(len: usize) -> impl Strategy<Value = Op> + Clone {
    let bound = len + 2;
    prop_oneof![
        4 => (0..bound, 0..bound, 0..LABELS.len())
            .prop_map(|(start, end, label)| Op::Draw { start, end, label }),
        1 => any::<usize>().prop_map(|pick| Op::Remove { pick }),
    ]
}

/// A paragraph plus a sequence of edits sized to it.
pub fn arb_session() -> impl Strategy<Value = (String, Vec<Op>)> {
    arb_text().prop_flat_map(|text| {
        let len = text.encode_utf16().count();
        (Just(text), prop::collection::vec(arb_op(len), 0..24))
    })
}

fn arb_history() -> impl Strategy<Value = ProvenanceLog> + Clone {
    prop::collection::vec(
        (0..LABELS.len(), arb_state(), prop_oneof![Just("ana"), Just("ben")]),
        0..3,
    )
    .prop_map(|entries| {
        ProvenanceLog::from(
            entries
                .into_iter()
                .map(|(label, state, who)| {
                    HistoryEntry::new(LABELS[label], state, who, "2024-01-01T00:00:00Z")
                })
                .collect::<Vec<_>>(),
        )
    })
}

/// A paragraph plus token-aligned persisted entities with distinct ranges.
pub fn arb_imported_paragraph() -> impl Strategy<Value = (String, Vec<Entity>)> {
    arb_text().prop_flat_map(|text| {
        let tokens = span_tokenize(&text);
        let n = tokens.len();
        let entities = prop::collection::vec((0..n, 0..n, arb_history()), 0..6).prop_map(
            move |picks| {
                let mut by_range = BTreeMap::new();
                for (a, b, history) in picks {
                    let (first, last) = if a <= b { (a, b) } else { (b, a) };
                    let range = (tokens[first].start, tokens[last].end);
                    by_range.entry(range).or_insert(history);
                }
                by_range
                    .into_iter()
                    .map(|((start, end), history)| Entity::from_history(None, start, end, history))
                    .collect::<Vec<_>>()
            },
        );
        (Just(text), entities)
    })
}
