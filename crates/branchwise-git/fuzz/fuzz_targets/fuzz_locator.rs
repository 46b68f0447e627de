#![no_main]

use branchwise_git::Locator;
use branchwise_git::cache::cache_key;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(locator) = Locator::classify(input) {
        let _ = locator.plan(Some("token"));
    }

    if let Some(key) = cache_key(input) {
        assert!(!key.is_empty());
        assert!(!key.contains('/'));
        assert!(key != "." && key != "..");
    }
});
