#![no_main]

use libfuzzer_sys::fuzz_target;
use loadout_catalog::requirements::parse;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };

    // A parsed predicate renders to text that parses to a predicate with the
    // same rendering.
    if let Ok(predicate) = parse(s) {
        let rendered = predicate.to_string();
        let reparsed = parse(&rendered).expect("rendered predicate parses");
        assert_eq!(reparsed.to_string(), rendered);
    }
});
