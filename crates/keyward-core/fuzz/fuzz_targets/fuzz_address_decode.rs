//! Fuzz test for address decoding
//!
//! Ensures address parser handles malformed input gracefully

#![no_main]

use keyward_core::{decode_address, KeyRole, Network, NetworkType};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Should never panic, only return Err for invalid input
        for network in NetworkType::ALL {
            let network = Network::from_type(network);
            for role in KeyRole::ALL {
                let _ = decode_address(s, role, &network);
            }
        }
    }
});
