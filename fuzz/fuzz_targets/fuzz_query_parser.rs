#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any input must either parse or fail with an error, never panic
    if let Ok(tree) = tagq::create_query(data) {
        let _ = tree.to_string();
    }
});
