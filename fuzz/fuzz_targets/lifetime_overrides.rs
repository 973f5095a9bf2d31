#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_wire::{GraphOptions, Lifetime};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Parsing must never panic, and every accepted name must parse back.
    if let Ok(lifetime) = raw.parse::<Lifetime>() {
        assert_eq!(lifetime.as_str().parse::<Lifetime>().unwrap(), lifetime);
    }

    if let Ok(options) = GraphOptions::parse_overrides(raw) {
        for (name, lifetime) in &options.lifetime_overrides {
            assert_eq!(options.lifetime_for(name), Some(*lifetime));
            assert!(!name.contains(';'));
        }
    }

    if let Some(&first) = data.first() {
        let _ = Lifetime::try_from(first);
    }
});
