use proptest::prelude::*;
use refanno_core::model::AnnotationState;
use refanno_core::provenance::Entity;
use refanno_core::span::{NewBlock, TokenManager};
use refanno_core::tokenizer::span_tokenize;
use refanno_core::version::{Snapshot, VersionControl};

#[path = "generators.rs"]
mod generators;
use generators::*;

fn apply(manager: &mut TokenManager, op: &Op) {
    let labels = registry();
    match *op {
        Op::Draw { start, end, label } => {
            let before = manager.clone();
            let request = NewBlock::drawn(
                start,
                end,
                labels.get_by_name(LABELS[label]).cloned(),
                AnnotationState::Candidate,
            );
            if manager.insert_block(request).is_err() {
                assert_eq!(*manager, before, "failed insert must not modify the list");
            }
        }
        Op::Remove { pick } => {
            let starts: Vec<usize> = manager.blocks().map(|b| b.start()).collect();
            if !starts.is_empty() {
                let start = starts[pick % starts.len()];
                manager.remove_block(start, true);
            }
        }
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn partition_holds_after_any_edit_sequence((text, ops) in arb_session()) {
        let mut manager = TokenManager::new(&span_tokenize(&text));
        for op in &ops {
            apply(&mut manager, op);
            let problems = manager.partition_violations();
            prop_assert!(problems.is_empty(), "after {:?}: {:?}", op, problems);
        }
    }

    #[test]
    fn blocks_always_snap_to_token_boundaries((text, ops) in arb_session()) {
        let tokens = span_tokenize(&text);
        let mut manager = TokenManager::new(&tokens);
        for op in &ops {
            apply(&mut manager, op);
        }
        for block in manager.blocks() {
            prop_assert!(tokens.iter().any(|t| t.start == block.start()));
            prop_assert!(tokens.iter().any(|t| t.end == block.end()));
            prop_assert_eq!(block.tokens().first().map(|t| t.start()), Some(block.start()));
            prop_assert_eq!(block.tokens().last().map(|t| t.end()), Some(block.end()));
        }
    }

    #[test]
    fn snapshot_restore_is_exact((text, ops) in arb_session()) {
        let mut models = vec![TokenManager::new(&span_tokenize(&text))];
        let (head, tail) = ops.split_at(ops.len() / 2);
        for op in head {
            apply(&mut models[0], op);
        }
        let expected = models.clone();
        let snapshot = Snapshot::capture(&models, 0);
        for op in tail {
            apply(&mut models[0], op);
        }
        let mut active = 0;
        snapshot.restore(&mut models, &mut active).expect("same shape");
        prop_assert_eq!(models, expected);
    }

    #[test]
    fn undo_all_returns_to_the_start((text, ops) in arb_session()) {
        let mut models = vec![TokenManager::new(&span_tokenize(&text))];
        let initial = models.clone();
        let mut history = VersionControl::new(ops.len().max(1));
        for op in &ops {
            history.add_undo(&models, 0);
            apply(&mut models[0], op);
        }
        let mut active = 0;
        history.undo_all(&mut models, &mut active).expect("undo all");
        prop_assert_eq!(&models, &initial);

        let final_edits = history.redo_count();
        prop_assert_eq!(final_edits, ops.len());
    }

    #[test]
    fn undo_then_redo_walks_every_intermediate_state((text, ops) in arb_session()) {
        let mut models = vec![TokenManager::new(&span_tokenize(&text))];
        let mut states = vec![models.clone()];
        let mut history = VersionControl::new(ops.len().max(1));
        for op in &ops {
            history.add_undo(&models, 0);
            apply(&mut models[0], op);
            states.push(models.clone());
        }

        let mut active = 0;
        for _ in &ops {
            prop_assert!(history.undo(&mut models, &mut active).expect("same shape"));
        }
        prop_assert_eq!(&models, &states[0]);
        prop_assert!(!history.undo(&mut models, &mut active).expect("same shape"));

        for expected in &states[1..] {
            prop_assert!(history.redo(&mut models, &mut active).expect("same shape"));
            prop_assert_eq!(&models, expected);
        }
        prop_assert!(!history.redo(&mut models, &mut active).expect("same shape"));
        prop_assert_eq!(history.undo_count(), ops.len());
    }

    #[test]
    fn export_reproduces_imported_entities((text, entities) in arb_imported_paragraph()) {
        let labels = registry();
        let mut manager = TokenManager::with_entities(&span_tokenize(&text), &entities, &labels)
            .expect("fits");
        let exported = manager.export_entities("ana", "2024-06-01T00:00:00Z");

        let shape = |e: &Entity| (e.start, e.end, e.label_name().to_string(), e.state().clone());
        let before: Vec<_> = entities.iter().map(shape).collect();
        let after: Vec<_> = exported.iter().map(shape).collect();
        prop_assert_eq!(after, before);
    }

    #[test]
    fn manual_import_is_idempotent((text, entities) in arb_imported_paragraph()) {
        let tokens = span_tokenize(&text);
        let labels = registry();
        let once = TokenManager::with_entities(&tokens, &entities, &labels).expect("fits");

        let mut twice = once.clone();
        for entity in &entities {
            twice.import_entity(entity, &labels).expect("fits");
        }
        prop_assert_eq!(once.spans(), twice.spans());
    }

    #[test]
    fn manual_import_never_rejects((text, entities) in arb_imported_paragraph()) {
        let labels = registry();
        let manager = TokenManager::with_entities(&span_tokenize(&text), &entities, &labels)
            .expect("fits");
        let rejected_in = entities
            .iter()
            .filter(|e| e.state() == &AnnotationState::Rejected)
            .count();
        let rejected_out = manager.blocks().filter(|b| b.state.is_rejected()).count();
        prop_assert_eq!(rejected_in, rejected_out);
        prop_assert_eq!(manager.blocks().count(), entities.len());
    }
}
