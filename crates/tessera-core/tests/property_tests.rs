//! Property-based tests for tessera-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use alloy::primitives::U256;
use proptest::prelude::*;
use tessera_core::{
    ens,
    hd::{DerivationPath, PathComponent},
    units::{format_units_trimmed, Quantity},
    wallet::{addresses_match, signature_hex, verify_message},
    BlockTag, Wallet, WalletSource,
};

// ============================================
// Arbitrary Implementations
// ============================================

fn arb_path_component() -> impl Strategy<Value = PathComponent> {
    (0u32..0x8000_0000, prop::bool::ANY).prop_map(|(index, hardened)| PathComponent { index, hardened })
}

fn arb_derivation_path() -> impl Strategy<Value = DerivationPath> {
    prop::collection::vec(arb_path_component(), 0..8).prop_map(DerivationPath::new)
}

fn arb_wallet() -> impl Strategy<Value = Wallet> {
    any::<[u8; 32]>()
        .prop_filter_map("not a valid secp256k1 scalar", |bytes| {
            Wallet::from_private_key(&hex::encode(bytes)).ok()
        })
}

fn arb_label() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // Derivation Path Properties
    // ----------------------------------------

    #[test]
    fn derivation_path_display_parses_back(path in arb_derivation_path()) {
        let rendered = path.to_string();
        prop_assert!(rendered.starts_with('m'));
        let parsed: DerivationPath = rendered.parse().unwrap();
        prop_assert_eq!(parsed, path);
    }

    #[test]
    fn hardened_value_sets_top_bit(component in arb_path_component()) {
        prop_assert_eq!(component.value() & 0x8000_0000 != 0, component.hardened);
        prop_assert_eq!(component.value() & 0x7fff_ffff, component.index);
    }

    // ----------------------------------------
    // Quantity Properties
    // ----------------------------------------

    #[test]
    fn quantity_hex_and_decimal_agree(value in any::<u128>()) {
        let decimal: Quantity = value.to_string().parse().unwrap();
        let hex: Quantity = format!("{:#x}", value).parse().unwrap();
        prop_assert_eq!(decimal, hex);
        prop_assert_eq!(decimal.to_u128().unwrap(), value);
    }

    #[test]
    fn quantity_from_json_number(value in any::<u64>()) {
        let parsed: Quantity = serde_json::from_value(serde_json::json!(value)).unwrap();
        prop_assert_eq!(parsed.to_u64().unwrap(), value);
    }

    #[test]
    fn formatted_units_have_one_point(value in any::<u128>(), decimals in 1u8..=18) {
        let formatted = format_units_trimmed(U256::from(value), decimals).unwrap();
        prop_assert_eq!(formatted.matches('.').count(), 1);

        let fraction = formatted.split('.').nth(1).unwrap();
        prop_assert!(!fraction.is_empty());
        prop_assert!(fraction == "0" || !fraction.ends_with('0'));
    }

    #[test]
    fn formatted_units_preserve_digits(value in any::<u64>()) {
        let formatted = format_units_trimmed(U256::from(value), 9).unwrap();
        let (whole, fraction) = formatted.split_once('.').unwrap();
        let padded = format!("{:0<9}", fraction);
        let rebuilt: u128 = format!("{}{}", whole, padded).parse().unwrap();
        prop_assert_eq!(rebuilt, value as u128);
    }

    // ----------------------------------------
    // Block Tag Properties
    // ----------------------------------------

    #[test]
    fn numeric_block_tags_accept_both_radixes(number in any::<u64>()) {
        let from_hex: BlockTag = format!("{:#x}", number).parse().unwrap();
        let from_dec: BlockTag = number.to_string().parse().unwrap();
        prop_assert_eq!(from_hex, BlockTag::Number(number));
        prop_assert_eq!(from_dec, BlockTag::Number(number));
    }

    // ----------------------------------------
    // ENS Properties
    // ----------------------------------------

    #[test]
    fn namehash_ignores_case(labels in prop::collection::vec(arb_label(), 1..4)) {
        let name = labels.join(".");
        prop_assert_eq!(ens::namehash(&name), ens::namehash(&name.to_uppercase()));
    }

    #[test]
    fn namehash_depends_on_every_label(a in arb_label(), b in arb_label()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            ens::namehash(&format!("{}.eth", a)),
            ens::namehash(&format!("{}.eth", b))
        );
    }

    // ----------------------------------------
    // Wallet Properties
    // ----------------------------------------

    #[test]
    fn private_keys_classify_as_private_keys(bytes in any::<[u8; 32]>()) {
        let key = format!("0x{}", hex::encode(bytes));
        prop_assert_eq!(WalletSource::classify(&key), WalletSource::PrivateKey);
    }

    #[test]
    fn signed_messages_recover_signer(
        wallet in arb_wallet(),
        message in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let signature = signature_hex(&wallet.sign_message(&message).unwrap());
        let recovered = verify_message(&message, &signature).unwrap();

        prop_assert_eq!(recovered, wallet.address());
        prop_assert!(addresses_match(&wallet.address_checksummed().to_lowercase(), recovered));
        prop_assert!(addresses_match(&wallet.address_checksummed().to_uppercase().replace("0X", "0x"), recovered));
    }

    #[test]
    fn private_key_hex_reloads(wallet in arb_wallet()) {
        let reloaded = Wallet::from_private_key(&wallet.private_key_hex()).unwrap();
        prop_assert_eq!(reloaded.address(), wallet.address());
    }
}
