#![no_main]

use libfuzzer_sys::fuzz_target;
use loadout_domain::serial::{decode, encode};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };

    // Anything that decodes must re-encode to a canonical form that decodes
    // to the same fields, up to entry order.
    if let Ok(fields) = decode(s) {
        let canonical = encode(&fields);
        let mut again = decode(&canonical).expect("canonical serial decodes");
        let mut original = fields;
        again.parts.sort();
        original.parts.sort();
        assert_eq!(again, original);
        assert_eq!(encode(&again), canonical);
    }
});
