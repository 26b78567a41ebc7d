//! Property-based tests for keyward-core
//!
//! Uses proptest to verify invariants across randomized inputs

use keyward_core::{
    decode_address, encode_address, next_index, path_for, DiscoveryScan, IssuanceConfig,
    KdfParams, KeyFingerprint, KeyRecord, KeyRole, LocalVault, MemoryStore, Network,
    NetworkType, SeedVault, WalletAddress, MAX_PATH_INDEX, SCAN_RANGE,
};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Property Test Strategies
// ============================================================================

fn role_strategy() -> impl Strategy<Value = KeyRole> {
    prop_oneof![Just(KeyRole::Platform), Just(KeyRole::Asset)]
}

fn network_strategy() -> impl Strategy<Value = NetworkType> {
    prop_oneof![
        Just(NetworkType::Mainnet),
        Just(NetworkType::Testnet),
        Just(NetworkType::Regtest)
    ]
}

fn fingerprint_strategy() -> impl Strategy<Value = KeyFingerprint> {
    any::<[u8; 20]>().prop_map(KeyFingerprint::from_bytes)
}

/// Generate valid passphrase (0-40 chars)
fn passphrase_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ]{0,40}").unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
}

// ============================================================================
// Derivation Path Properties
// ============================================================================

proptest! {
    /// Property: distinct (role, index) pairs never share a path
    #[test]
    fn prop_paths_are_injective(
        role_a in role_strategy(),
        role_b in role_strategy(),
        a in 0u32..=MAX_PATH_INDEX,
        b in 0u32..=MAX_PATH_INDEX,
    ) {
        let same = role_a == role_b && a == b;
        prop_assert_eq!(path_for(role_a, a) == path_for(role_b, b), same);
    }
}

// ============================================================================
// Address Encoding Properties
// ============================================================================

proptest! {
    /// Property: an address only decodes for the role and network it was made for
    #[test]
    fn prop_address_bound_to_role_and_network(
        fp in fingerprint_strategy(),
        role in role_strategy(),
        net in network_strategy(),
        other in network_strategy(),
    ) {
        let network = Network::from_type(net);
        let address = encode_address(&fp, role, &network).unwrap();
        prop_assert_eq!(decode_address(&address, role, &network).unwrap(), fp);

        let other_network = Network::from_type(other);
        let same_encoding = match role {
            KeyRole::Platform => other_network.platform_hrp == network.platform_hrp,
            KeyRole::Asset => other_network.asset_version == network.asset_version,
        };
        if !same_encoding {
            prop_assert!(decode_address(&address, role, &other_network).is_err());
        }
    }
}

// ============================================================================
// Discovery and Issuance Properties
// ============================================================================

proptest! {
    /// Property: discovery keeps exactly [0, max used] or nothing
    #[test]
    fn prop_truncation_at_last_used(used in prop::collection::vec(any::<bool>(), SCAN_RANGE as usize)) {
        let network = Network::mainnet();
        let mut scan = DiscoveryScan::new();
        for (i, used) in used.iter().enumerate() {
            let record = KeyRecord::new(KeyRole::Asset, i as u32, KeyFingerprint::from_bytes([i as u8; 20]));
            let address = WalletAddress::from_record(&record, &network).unwrap();
            scan.record(record, address, *used);
        }

        let expected = used.iter().rposition(|u| *u).map_or(0, |last| last + 1);
        let (records, addresses) = scan.finish();
        prop_assert_eq!(records.len(), expected);
        prop_assert_eq!(addresses.len(), expected);
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(record.path_index, i as u32);
        }
    }

    /// Property: issuance always moves past every stored index
    #[test]
    fn prop_next_index_exceeds_stored(
        indices in prop::collection::vec(0u32..1_000_000, 0..20),
        legacy in any::<bool>(),
    ) {
        let records: Vec<KeyRecord> = indices
            .iter()
            .map(|&i| KeyRecord::new(KeyRole::Platform, i, KeyFingerprint::from_bytes([0; 20])))
            .collect();
        let config = IssuanceConfig { legacy_first_index: legacy };
        let next = next_index(&records, &config).unwrap();
        prop_assert!(indices.iter().all(|&i| next > i));
        if indices.is_empty() {
            prop_assert_eq!(next, u32::from(legacy));
        }
    }
}

// ============================================================================
// Vault Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Property: exported mnemonic restores the same seed and keys
    #[test]
    fn prop_mnemonic_backup_restores_keys(
        passphrase in passphrase_strategy(),
        words in prop_oneof![Just(12usize), Just(18), Just(24)],
        index in 0u32..100,
    ) {
        runtime().block_on(async {
            let original = LocalVault::new(Arc::new(MemoryStore::new()), KdfParams::fast());
            let hash = original.create_seed(&passphrase, words).await.unwrap();
            let phrase = original.export_mnemonic(&hash, &passphrase).await.unwrap();

            let restored = LocalVault::new(Arc::new(MemoryStore::new()), KdfParams::fast());
            let restored_hash = restored.import_mnemonic(&phrase, "different").await.unwrap();
            assert_eq!(restored_hash, hash);

            let path = path_for(KeyRole::Platform, index);
            assert_eq!(
                original.derive_public_key(&hash, &path, &passphrase).await.unwrap(),
                restored.derive_public_key(&hash, &path, "different").await.unwrap()
            );
        });
    }
}
