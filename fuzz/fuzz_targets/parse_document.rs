#![no_main]

use libfuzzer_sys::fuzz_target;
use refanno_core::RefDocument;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(doc) = RefDocument::from_json(json) else {
        return;
    };
    // Entities that do not fit their paragraph are errors, never panics.
    if let Ok(managers) = doc.build_managers(&doc.label_registry()) {
        for manager in &managers {
            let _ = manager.aggregates();
        }
    }
    let _ = doc.to_json_pretty();
});
