use secp256k1::PublicKey;
use secp256k1::constants::CURVE_ORDER;

use crate::error::ValidationError;
use crate::extended_key::ExtendedKey;
use crate::version::{KeyKind, VersionRegistry};

/// Checks a decoded key against the BIP-32 structural and numeric rules,
/// in order, returning the first one violated:
///
/// 1. the version tag is registered and its key kind matches `is_private`;
/// 2. the key material starts with 0x00 (private) or 0x02/0x03 (public);
/// 3. at depth 0, parent fingerprint and child number are zero;
/// 4. a private scalar lies in [1, n-1].
///
/// One further rule runs last: public key material must decode to a point
/// on secp256k1. Rules 1-4 alone accept such keys.
pub fn validate(key: &ExtendedKey) -> Result<(), ValidationError> {
    let entry = VersionRegistry::global()
        .entry(&key.version)
        .ok_or(ValidationError::UnknownVersion)?;
    if entry.kind != key.kind() {
        return Err(ValidationError::KeyKindMismatch {
            version: entry.kind,
            material: key.kind(),
        });
    }

    let prefix = key.key_material[0];
    let prefix_ok = match key.kind() {
        KeyKind::Private => prefix == 0x00,
        KeyKind::Public => matches!(prefix, 0x02 | 0x03),
    };
    if !prefix_ok {
        return Err(ValidationError::InvalidKeyPrefix {
            kind: key.kind(),
            prefix,
        });
    }

    if key.depth == 0 {
        if key.parent_fingerprint != [0u8; 4] {
            return Err(ValidationError::NonZeroParentFingerprint);
        }
        if key.child_number != 0 {
            return Err(ValidationError::NonZeroChildNumber);
        }
    }

    if key.is_private {
        let scalar = &key.key_material[1..];
        if scalar.iter().all(|&b| b == 0) || scalar >= &CURVE_ORDER[..] {
            return Err(ValidationError::ScalarOutOfRange);
        }
    } else if PublicKey::from_slice(&key.key_material).is_err() {
        return Err(ValidationError::PublicKeyNotOnCurve);
    }

    Ok(())
}
