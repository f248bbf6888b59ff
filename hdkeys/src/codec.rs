//! Binary and base58check encoding of extended keys.
//!
//! Layout: version (4) | depth (1) | parent_fp (4) | child_number (4) |
//! chain_code (32) | key_material (33), followed on the wire by a 4-byte
//! double-SHA256 checksum.

use std::fmt;
use std::str::FromStr;

use crypto_utils::base58::{self, Base58Error};

use crate::error::{Bip32Error, Result};
use crate::extended_key::{ExtendedKey, KEY_MATERIAL_LEN};
use crate::version::VersionRegistry;

/// Serialized length without the checksum.
pub const SERIALIZED_LEN: usize = 78;

pub fn to_bytes(key: &ExtendedKey) -> [u8; SERIALIZED_LEN] {
    let mut out = [0u8; SERIALIZED_LEN];
    out[0..4].copy_from_slice(&key.version);
    out[4] = key.depth;
    out[5..9].copy_from_slice(&key.parent_fingerprint);
    out[9..13].copy_from_slice(&key.child_number.to_be_bytes());
    out[13..45].copy_from_slice(&key.chain_code);
    out[45..78].copy_from_slice(&key.key_material);
    out
}

/// Positional decode of the 78-byte layout.
///
/// `is_private` follows the structural flag, a leading 0x00 in the key
/// material. Whether that agrees with the version tag is for the validator.
pub fn from_bytes(data: &[u8]) -> Result<ExtendedKey> {
    if data.len() != SERIALIZED_LEN {
        return Err(Bip32Error::Malformed(format!(
            "expected {SERIALIZED_LEN} bytes, got {}",
            data.len()
        )));
    }
    let mut key = ExtendedKey {
        version: [data[0], data[1], data[2], data[3]],
        depth: data[4],
        parent_fingerprint: [data[5], data[6], data[7], data[8]],
        child_number: u32::from_be_bytes([data[9], data[10], data[11], data[12]]),
        chain_code: [0u8; 32],
        key_material: [0u8; KEY_MATERIAL_LEN],
        is_private: data[45] == 0x00,
    };
    key.chain_code.copy_from_slice(&data[13..45]);
    key.key_material.copy_from_slice(&data[45..78]);
    VersionRegistry::global().classify(&key.version)?;
    Ok(key)
}

pub fn serialize(key: &ExtendedKey) -> String {
    base58::base58_check_encode(&to_bytes(key))
}

pub fn deserialize(s: &str) -> Result<ExtendedKey> {
    let payload = base58::base58_check_decode(s.trim()).map_err(|e| match e {
        Base58Error::InvalidCharacter(c) => {
            Bip32Error::Malformed(format!("invalid base58 character {c:?}"))
        }
        Base58Error::InvalidLength => Bip32Error::Malformed("input too short".into()),
        Base58Error::InvalidChecksum => Bip32Error::Malformed("checksum mismatch".into()),
    })?;
    from_bytes(&payload)
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize(self))
    }
}

impl FromStr for ExtendedKey {
    type Err = Bip32Error;

    fn from_str(s: &str) -> Result<Self> {
        deserialize(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{KeyFamily, KeyKind, Network, ScriptType};
    use proptest::prelude::*;
    use secp256k1::Secp256k1;

    const XPRV_M: &str = "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi";
    const XPUB_M_0H: &str = "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw";

    #[test]
    fn decodes_fields_positionally() {
        let key: ExtendedKey = XPRV_M.parse().unwrap();
        assert_eq!(key.version, [0x04, 0x88, 0xad, 0xe4]);
        assert_eq!(key.depth, 0);
        assert_eq!(key.child_number, 0);
        assert!(key.is_private);
        assert_eq!(
            hex::encode(key.chain_code),
            "873dff81c02f525623fd1fe5167eac3a55a049de3d314bb42ee227ffed37d508"
        );
        assert_eq!(
            hex::encode(&key.key_material[1..]),
            "e8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35"
        );

        let key: ExtendedKey = XPUB_M_0H.parse().unwrap();
        assert!(!key.is_private);
        assert_eq!(key.depth, 1);
        assert_eq!(key.parent_fingerprint, [0x34, 0x42, 0x19, 0x3e]);
        assert_eq!(key.child_number, 0x8000_0000);
        assert_eq!(key.to_string(), XPUB_M_0H);
    }

    #[test]
    fn binary_layout_is_78_bytes() {
        let key: ExtendedKey = XPRV_M.parse().unwrap();
        let bytes = to_bytes(&key);
        assert_eq!(&bytes[..4], &key.version);
        assert_eq!(bytes[45], 0x00);
        assert_eq!(from_bytes(&bytes).unwrap(), key);
        assert!(matches!(from_bytes(&bytes[..77]), Err(Bip32Error::Malformed(_))));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut bad = XPRV_M.to_string();
        bad.pop();
        bad.push('L');
        assert_eq!(
            deserialize(&bad),
            Err(Bip32Error::Malformed("checksum mismatch".into()))
        );
    }

    #[test]
    fn rejects_wrong_length_and_alphabet() {
        let short = base58::base58_check_encode(&[0x04, 0x88, 0xad, 0xe4, 0x00]);
        assert!(matches!(deserialize(&short), Err(Bip32Error::Malformed(_))));

        // checksum is fine, payload is one byte too long
        let mut long = to_bytes(&XPRV_M.parse().unwrap()).to_vec();
        long.push(0);
        assert_eq!(
            deserialize(&base58::base58_check_encode(&long)),
            Err(Bip32Error::Malformed("expected 78 bytes, got 79".into()))
        );

        assert!(matches!(deserialize(""), Err(Bip32Error::Malformed(_))));
        assert!(matches!(deserialize("xprv0"), Err(Bip32Error::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_versions() {
        // BIP-32 test vector 5, unknown extended key versions
        for key in [
            "DMwo58pR1QLEFihHiXPVykYB6fJmsTeHvyTp7hRThAtCX8CvYzgPcn8XnmdfHGMQzT7ayAmfo4z3gY5KfbrZWZ6St24UVf2Qgo6oujFktLHdHY4",
            "DMwo58pR1QLEFihHiXPVykYB6fJmsTeHvyTp7hRThAtCX8CvYzgPcn8XnmdfHPmHJiEDXkTiJTVV9rHEBUem2mwVbbNfvT2MTcAqj3nesx8uBf9",
        ] {
            assert!(matches!(
                deserialize(key),
                Err(Bip32Error::UnsupportedVersion(_))
            ));
        }
    }

    #[test]
    fn every_registered_family_round_trips() {
        let secp = Secp256k1::new();
        for network in Network::ALL {
            for script_type in ScriptType::ALL {
                let family = KeyFamily::new(network, script_type);
                let xprv = ExtendedKey::new_master(&[0x5a; 32], &family).unwrap();
                let xpub = xprv.to_public(&secp).unwrap();
                for key in [xprv, xpub] {
                    let decoded: ExtendedKey = key.to_string().parse().unwrap();
                    assert_eq!(decoded, key);
                    assert_eq!(decoded.family().unwrap(), family);
                    let (_, kind) = VersionRegistry::global().classify(&decoded.version).unwrap();
                    assert_eq!(kind, KeyKind::from_private(decoded.is_private));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn round_trip(
            depth in any::<u8>(),
            parent_fingerprint in any::<[u8; 4]>(),
            child_number in any::<u32>(),
            chain_code in any::<[u8; 32]>(),
            seed in any::<[u8; 32]>(),
            public in any::<bool>(),
        ) {
            let secp = Secp256k1::new();
            let family = KeyFamily::new(Network::Testnet, ScriptType::P2wpkhP2sh);
            let mut key = ExtendedKey::new_master(&seed, &family).unwrap();
            if public {
                key = key.to_public(&secp).unwrap();
            }
            key.depth = depth;
            key.parent_fingerprint = parent_fingerprint;
            key.child_number = child_number;
            key.chain_code = chain_code;
            prop_assert_eq!(deserialize(&serialize(&key)).unwrap(), key);
        }
    }
}
