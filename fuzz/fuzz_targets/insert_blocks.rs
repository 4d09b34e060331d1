#![no_main]

use libfuzzer_sys::fuzz_target;
use refanno_core::model::{AnnotationState, Label};
use refanno_core::span::{NewBlock, TokenManager};
use refanno_core::tokenizer::span_tokenize;
use refanno_core::version::{Snapshot, VersionControl};

const TEXT: &str = "Ada Lovelace met Charles Babbage in London, 1833 (or so).";

// Each 3-byte chunk is one edit: opcode, then two offsets into TEXT.
fuzz_target!(|data: &[u8]| {
    let labels = [Label::new(1, "PER", "red-11"), Label::new(2, "LOC", "blue-11")];
    let mut models = vec![TokenManager::new(&span_tokenize(TEXT))];
    let mut history = VersionControl::new(8);
    let mut active = 0;

    for op in data.chunks_exact(3) {
        let (a, b) = (usize::from(op[1]), usize::from(op[2]));
        match op[0] % 4 {
            0 | 1 => {
                let before = models[0].clone();
                history.add_undo(&models, active);
                let label = labels[usize::from(op[0] % 2)].clone();
                let request = NewBlock::drawn(a, b, Some(label), AnnotationState::Candidate);
                if models[0].insert_block(request).is_err() {
                    assert_eq!(models[0], before);
                }
            }
            2 => {
                let starts: Vec<usize> = models[0].blocks().map(|blk| blk.start()).collect();
                if let Some(&start) = starts.get(a % starts.len().max(1)) {
                    history.add_undo(&models, active);
                    models[0].remove_block(start, true);
                }
            }
            _ => {
                let _ = history.undo(&mut models, &mut active);
            }
        }
        assert!(models[0].is_partitioned(), "{:?}", models[0].partition_violations());
    }

    let snapshot = Snapshot::capture(&models, active);
    let encoded = serde_json::to_string(&snapshot).expect("snapshot serializes");
    let decoded: Snapshot = serde_json::from_str(&encoded).expect("snapshot deserializes");
    let expected = models.clone();
    decoded.restore(&mut models, &mut active).expect("same shape");
    assert_eq!(models, expected);
});
