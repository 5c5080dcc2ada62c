#![no_main]

use std::str::FromStr;

use libfuzzer_sys::fuzz_target;
use tessera_core::hd::{DerivationPath, PathComponent};

fuzz_target!(|data: &[u8]| {
    // Parsing arbitrary text should not panic
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(path) = DerivationPath::from_str(text) {
            // Display output parses back to the same path
            let rendered = path.to_string();
            let reparsed = DerivationPath::from_str(&rendered).unwrap();
            assert_eq!(path, reparsed);
            assert_eq!(path.depth(), reparsed.depth());
        }
    }

    // Build from raw components
    let components: Vec<PathComponent> = data
        .chunks_exact(4)
        .take(8)
        .map(|chunk| {
            let raw = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let index = raw & 0x7fff_ffff;
            if raw & 0x8000_0000 != 0 {
                PathComponent::hardened(index)
            } else {
                PathComponent::normal(index)
            }
        })
        .collect();

    let path = DerivationPath::new(components);
    let reparsed = DerivationPath::from_str(&path.to_string()).unwrap();
    assert_eq!(path, reparsed);
});
