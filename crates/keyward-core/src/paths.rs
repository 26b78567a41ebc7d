//! Derivation path policy
//!
//! Two fixed BIP-44 style templates, one per [`KeyRole`], each ending in a
//! non-hardened address index:
//!
//! ```text
//! m/44'/5'/0'/0/{index}   platform account keys
//! m/44'/5'/1'/0/{index}   asset transfer keys
//! ```
//!
//! The templates are independent of the target network; the network only
//! changes how a derived key's fingerprint is encoded as an address.

use crate::records::KeyRole;

/// Path prefix for platform account keys
pub const PLATFORM_PATH_PREFIX: &str = "m/44'/5'/0'/0";

/// Path prefix for asset transfer keys
pub const ASSET_PATH_PREFIX: &str = "m/44'/5'/1'/0";

/// Number of sequential indices probed during discovery
pub const SCAN_RANGE: u32 = 10;

/// Highest usable address index (non-hardened child numbers only)
pub const MAX_PATH_INDEX: u32 = (1 << 31) - 1;

/// Path prefix for a role
pub const fn prefix_for(role: KeyRole) -> &'static str {
    match role {
        KeyRole::Platform => PLATFORM_PATH_PREFIX,
        KeyRole::Asset => ASSET_PATH_PREFIX,
    }
}

/// Full derivation path for `role` at `index`
pub fn path_for(role: KeyRole, index: u32) -> String {
    format!("{}/{}", prefix_for(role), index)
}

/// Indices probed by one discovery run, in scan order
pub fn scan_indices() -> std::ops::Range<u32> {
    0..SCAN_RANGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_path() {
        assert_eq!(path_for(KeyRole::Platform, 0), "m/44'/5'/0'/0/0");
        assert_eq!(path_for(KeyRole::Platform, 12), "m/44'/5'/0'/0/12");
    }

    #[test]
    fn test_asset_path() {
        assert_eq!(path_for(KeyRole::Asset, 3), "m/44'/5'/1'/0/3");
    }

    #[test]
    fn test_roles_never_share_a_path() {
        for i in scan_indices() {
            assert_ne!(path_for(KeyRole::Platform, i), path_for(KeyRole::Asset, i));
        }
    }

    #[test]
    fn test_scan_range() {
        let indices: Vec<u32> = scan_indices().collect();
        assert_eq!(indices.len(), SCAN_RANGE as usize);
        assert_eq!(indices.first(), Some(&0));
        assert_eq!(indices.last(), Some(&(SCAN_RANGE - 1)));
    }

    #[test]
    fn test_max_index_path() {
        assert_eq!(
            path_for(KeyRole::Asset, MAX_PATH_INDEX),
            "m/44'/5'/1'/0/2147483647"
        );
    }
}
