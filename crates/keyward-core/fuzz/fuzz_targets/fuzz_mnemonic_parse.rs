//! Fuzz test for mnemonic import
//!
//! Ensures the vault rejects arbitrary phrases without panicking

#![no_main]

use keyward_core::{KdfParams, LocalVault, MemoryStore, SeedVault};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let vault = LocalVault::new(Arc::new(MemoryStore::new()), KdfParams::fast());
        // Should never panic, only return Err for invalid input
        let _ = runtime.block_on(vault.import_mnemonic(s, ""));
    }
});
