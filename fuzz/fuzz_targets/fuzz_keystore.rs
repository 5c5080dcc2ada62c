#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use tessera_core::keystore;

#[derive(Debug, Arbitrary)]
struct KeystoreInput {
    json: String,
    password: String,
}

/// Skip key derivation costs that would stall the fuzzer
fn affordable(json: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(json) else {
        return true;
    };
    let crypto = match value.get("crypto") {
        Some(crypto) => crypto,
        None => &value["Crypto"],
    };
    let params = &crypto["kdfparams"];
    let small = |field: &str, max: u64| match &params[field] {
        Value::Null => true,
        v => v.as_u64().is_some_and(|n| n <= max),
    };

    small("n", 1 << 10) && small("r", 8) && small("p", 1) && small("c", 1 << 10) && small("dklen", 64)
}

fuzz_target!(|input: KeystoreInput| {
    // Detection is a cheap prefix check
    let _ = keystore::is_keystore_json(&input.json);

    if !affordable(&input.json) {
        return;
    }

    // Decoding arbitrary JSON should fail cleanly, never panic
    if let Ok(decrypted) = keystore::decrypt(&input.json, &input.password) {
        let _ = decrypted.address;
    }
});
