//! End-to-end flows through the public API: load, annotate, review, export,
//! reload.

use chrono::{DateTime, TimeZone, Utc};
use refanno_core::model::{AnnotationState, Label, LabelRegistry};
use refanno_core::provenance::{AppendReason, HistoryEntry};
use refanno_core::span::{NewBlock, Token, TokenManager};
use refanno_core::tokenizer::span_tokenize;
use refanno_core::{AnnotationSession, RefDocument};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0)
        .single()
        .expect("valid date")
}

fn labels() -> LabelRegistry {
    LabelRegistry::new(vec![
        Label::new(1, "L1", "red-11"),
        Label::new(2, "L2", "blue-11"),
    ])
}

#[test]
fn one_two_three_four() {
    let tokens = span_tokenize("one two three four");
    let ranges: Vec<_> = tokens.iter().map(|t| (t.start, t.end)).collect();
    assert_eq!(ranges, [(0, 3), (4, 7), (8, 13), (14, 18)]);

    let labels = labels();
    let mut tm = TokenManager::new(&tokens);

    tm.insert_block(NewBlock::drawn(
        0,
        7,
        labels.get_by_name("L1").cloned(),
        AnnotationState::Candidate,
    ))
    .expect("first block");
    assert_eq!(tm.blocks().count(), 1);
    assert_eq!(tm.bare_tokens().count(), 2);
    let first = tm.block_at(0).expect("L1 block");
    assert_eq!((first.start(), first.end()), (0, 7));
    assert_eq!(first.text(), "one two");

    tm.insert_block(NewBlock::drawn(
        4,
        13,
        labels.get_by_name("L2").cloned(),
        AnnotationState::Candidate,
    ))
    .expect("second block");

    let old = tm.block_at(0).expect("L1 still present");
    assert_eq!(old.label_name(), "L1");
    assert_eq!(old.state, AnnotationState::Rejected);
    assert!(old.reviewed);
    assert_eq!((old.start(), old.end()), (0, 7));

    let new = tm.block_at(4).expect("L2 block");
    let texts: Vec<_> = new.tokens().iter().map(Token::text).collect();
    assert_eq!(texts, ["two", "three"]);
    assert_eq!(new.state, AnnotationState::Candidate);

    let bare: Vec<_> = tm.bare_tokens().map(Token::text).collect();
    assert_eq!(bare, ["four"]);
    assert!(tm.is_partitioned(), "{:?}", tm.partition_violations());

    let groups = tm.aggregates();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].blocks.len(), 2);
}

#[test]
fn second_reviewer_concurrence_survives_reload() {
    let mut doc = RefDocument::from_text("Ada met Bob in Paris");
    doc.classes = vec![Label::new(1, "PER", "red-11"), Label::new(2, "LOC", "blue-11")];

    // First annotator marks two entities.
    let mut session = AnnotationSession::open(doc).expect("open");
    session.draw(0, 3, AnnotationState::Suggested).expect("Ada");
    session.labels_mut().set_current("LOC").expect("LOC exists");
    session.draw(15, 20, AnnotationState::Suggested).expect("Paris");
    let exported = session.export("ana", at(9));
    assert_eq!(exported.entity_count(), 2);
    for entity in &exported.annotations[0].entities {
        assert_eq!(entity.history().len(), 1);
        assert_eq!(entity.annotator(), "ana");
    }

    // Reviewer loads the export, accepts Ada and relabels nothing else.
    let json = exported.to_json_pretty().expect("serialize");
    let reloaded = RefDocument::from_json(&json).expect("parse");
    let mut review = AnnotationSession::open(reloaded).expect("reopen");
    assert!(review.review_block(0, AnnotationState::Accepted));
    let second = review.export("ben", at(10));

    let ada = &second.annotations[0].entities[0];
    let entries: Vec<_> = ada.history().entries().iter().map(HistoryEntry::annotator).collect();
    assert_eq!(entries, ["ana", "ben"]);
    assert_eq!(ada.state(), &AnnotationState::Accepted);

    // Paris was not touched by the reviewer: nothing appended.
    let paris = &second.annotations[0].entities[1];
    assert_eq!(paris.history().len(), 1);

    // A second reviewer confirming the accepted verdict appends a copy.
    let json = second.to_json_pretty().expect("serialize");
    let mut third = AnnotationSession::open(RefDocument::from_json(&json).expect("parse"))
        .expect("reopen");
    assert!(third.review_block(0, AnnotationState::Accepted));
    let confirmed = third.export("cai", at(11));
    let ada = &confirmed.annotations[0].entities[0];
    assert_eq!(ada.history().len(), 3);
    let latest = ada.latest_entry().expect("latest");
    assert_eq!(latest.annotator(), "cai");
    assert_eq!(latest.state(), &AnnotationState::Accepted);
    assert_eq!(latest.timestamp(), "2024-06-01T11:00:00Z");
}

#[test]
fn loading_is_non_destructive() {
    let json = r#"{
        "classes": [{"id": 1, "name": "PER", "color": "red-11"}],
        "annotations": [[null, "one two three four", {"entities": [
            [null, 0, 7, [["PER", "Accepted", "2024-01-01T00:00:00Z", "ana"]]],
            [null, 4, 13, [["PER", "Suggested", "2024-01-01T00:00:00Z", "bot"]]]
        ]}]]
    }"#;
    let doc = RefDocument::from_json(json).expect("parse");
    let managers = doc.build_managers(&doc.label_registry()).expect("fits");
    let states: Vec<_> = managers[0].blocks().map(|b| b.state.clone()).collect();
    assert_eq!(
        states,
        [AnnotationState::Accepted, AnnotationState::Suggested]
    );
    assert!(managers[0].blocks().all(|b| !b.reviewed));
}

#[test]
fn export_rule_outcomes() {
    let labels = labels();
    let mut tm = TokenManager::new(&span_tokenize("alpha beta"));
    tm.insert_block(NewBlock::drawn(
        0,
        5,
        labels.get_by_name("L1").cloned(),
        AnnotationState::Candidate,
    ))
    .expect("insert");

    let block_reason = |tm: &mut TokenManager, who: &str| {
        let mut entities = tm.export_entities(who, "2024-01-01T00:00:00Z");
        let mut entity = entities.remove(0);
        // Exporting the already-exported entity again is always a no-op.
        assert_eq!(entity.record_export(who, "2024-01-01T00:00:00Z"), None);
        entity.history().len()
    };

    assert_eq!(block_reason(&mut tm, "ana"), 1);
    assert_eq!(block_reason(&mut tm, "ana"), 1);
    // Unreviewed and unchanged: another annotator adds nothing.
    assert_eq!(block_reason(&mut tm, "ben"), 1);

    assert!(tm.relabel_block(0, labels.get_by_name("L2").cloned()));
    assert_eq!(block_reason(&mut tm, "ben"), 2);

    let mut entity = tm.export_entities("ben", "t").remove(0);
    entity = entity.with_verdict("L2", AnnotationState::Candidate, true);
    assert_eq!(entity.record_export("cai", "t"), Some(AppendReason::Concurrence));
}
