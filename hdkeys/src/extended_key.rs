use std::fmt;

use crypto_utils::{hash::hash160, hmac::hmac_sha512};
use secp256k1::{All, PublicKey, Scalar, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::derivation::{DerivationPath, DerivationStep};
use crate::error::{Bip32Error, Result};
use crate::version::{KeyFamily, KeyKind, KeyVersion, Network, VersionRegistry};

/// HMAC key for master key generation.
const MASTER_SEED_KEY: &[u8] = b"Bitcoin seed";

/// Length of the key material field: compressed point, or 0x00 ‖ scalar.
pub const KEY_MATERIAL_LEN: usize = 33;

/// A BIP-32 extended key, private (xprv family) or public (xpub family).
///
/// Key material is kept in its serialized 33-byte form so that decoded keys
/// can be inspected by the validator before any curve parsing happens.
/// Derivation never mutates a key; it returns a new one. Keys are scrubbed
/// on drop, including the intermediates of a path derivation.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct ExtendedKey {
    pub version: KeyVersion,
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
    pub chain_code: [u8; 32],
    pub key_material: [u8; KEY_MATERIAL_LEN],
    pub is_private: bool,
}

fn private_material(secret: &SecretKey) -> [u8; KEY_MATERIAL_LEN] {
    let mut material = [0u8; KEY_MATERIAL_LEN];
    material[1..].copy_from_slice(&secret.secret_bytes());
    material
}

/// Splits HMAC-SHA512 output into (IL, IR).
fn split_hmac(i: &[u8; 64]) -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    let mut il = Zeroizing::new([0u8; 32]);
    let mut ir = [0u8; 32];
    il.copy_from_slice(&i[..32]);
    ir.copy_from_slice(&i[32..]);
    (il, ir)
}

impl ExtendedKey {
    /// Master extended private key from a seed, tagged for `family`.
    pub fn new_master(seed: &[u8], family: &KeyFamily) -> Result<Self> {
        let version = family.version(KeyKind::Private)?;
        let i = Zeroizing::new(hmac_sha512(MASTER_SEED_KEY, seed));
        let (il, chain_code) = split_hmac(&i);
        let secret = SecretKey::from_slice(&il[..]).map_err(|_| Bip32Error::InvalidSeed)?;
        Ok(ExtendedKey {
            version,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: 0,
            chain_code,
            key_material: private_material(&secret),
            is_private: true,
        })
    }

    /// The private scalar; fails for public keys and out-of-range material.
    pub fn private_key(&self) -> Result<SecretKey> {
        if !self.is_private {
            return Err(Bip32Error::InvalidKeyData(
                "public extended key carries no private scalar".into(),
            ));
        }
        SecretKey::from_slice(&self.key_material[1..])
            .map_err(|e| Bip32Error::InvalidKeyData(e.to_string()))
    }

    pub fn public_key(&self, secp: &Secp256k1<All>) -> Result<PublicKey> {
        if self.is_private {
            Ok(PublicKey::from_secret_key(secp, &self.private_key()?))
        } else {
            PublicKey::from_slice(&self.key_material)
                .map_err(|e| Bip32Error::InvalidKeyData(e.to_string()))
        }
    }

    /// Compressed SEC1 encoding of the public key.
    pub fn public_key_bytes(&self, secp: &Secp256k1<All>) -> Result<[u8; 33]> {
        Ok(self.public_key(secp)?.serialize())
    }

    /// 4-byte key fingerprint: HASH160(compressed pubkey)[0..4]
    pub fn fingerprint(&self, secp: &Secp256k1<All>) -> Result<[u8; 4]> {
        let id = hash160(&self.public_key_bytes(secp)?);
        Ok([id[0], id[1], id[2], id[3]])
    }

    pub fn kind(&self) -> KeyKind {
        KeyKind::from_private(self.is_private)
    }

    pub fn network(&self) -> Result<Network> {
        VersionRegistry::global()
            .classify(&self.version)
            .map(|(network, _)| network)
    }

    pub fn family(&self) -> Result<KeyFamily> {
        KeyFamily::of(&self.version)
    }

    /// Neutered copy: compressed public key in place of the scalar and the
    /// matching public version tag. Public keys are returned unchanged.
    pub fn to_public(&self, secp: &Secp256k1<All>) -> Result<Self> {
        if !self.is_private {
            return Ok(self.clone());
        }
        Ok(ExtendedKey {
            version: self.family()?.version(KeyKind::Public)?,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            child_number: self.child_number,
            chain_code: self.chain_code,
            key_material: self.public_key_bytes(secp)?,
            is_private: false,
        })
    }

    /// Child key derivation (CKDpriv for private parents, CKDpub for public).
    ///
    /// Fails with `InvalidChild` when IL >= n or the child key is zero /
    /// the point at infinity; the caller must then move on to the next index.
    pub fn derive_child(&self, secp: &Secp256k1<All>, step: DerivationStep) -> Result<Self> {
        if step.is_hardened() && !self.is_private {
            return Err(Bip32Error::HardenedFromPublic);
        }
        let depth = self.depth.checked_add(1).ok_or(Bip32Error::DepthOverflow)?;
        let child_number = step.child_number();
        let parent_pub = self.public_key(secp)?;

        // Hardened: 0x00 ‖ ser256(k) ‖ ser32(i), otherwise serP(K) ‖ ser32(i)
        let mut data = Zeroizing::new(Vec::with_capacity(KEY_MATERIAL_LEN + 4));
        if step.is_hardened() {
            data.extend_from_slice(&self.key_material);
        } else {
            data.extend_from_slice(&parent_pub.serialize());
        }
        data.extend_from_slice(&child_number.to_be_bytes());

        let i = Zeroizing::new(hmac_sha512(&self.chain_code, &data));
        let (il, chain_code) = split_hmac(&i);
        let tweak =
            Scalar::from_be_bytes(*il).map_err(|_| Bip32Error::InvalidChild(child_number))?;

        let key_material = if self.is_private {
            let child = self
                .private_key()?
                .add_tweak(&tweak)
                .map_err(|_| Bip32Error::InvalidChild(child_number))?;
            private_material(&child)
        } else {
            parent_pub
                .add_exp_tweak(secp, &tweak)
                .map_err(|_| Bip32Error::InvalidChild(child_number))?
                .serialize()
        };

        let id = hash160(&parent_pub.serialize());
        Ok(ExtendedKey {
            version: self.version,
            depth,
            parent_fingerprint: [id[0], id[1], id[2], id[3]],
            child_number,
            chain_code,
            key_material,
            is_private: self.is_private,
        })
    }

    /// Folds `derive_child` over the path; the root path returns `self`.
    pub fn derive_path(&self, secp: &Secp256k1<All>, path: &DerivationPath) -> Result<Self> {
        path.steps()
            .iter()
            .try_fold(self.clone(), |key, &step| key.derive_child(secp, step))
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for ExtendedKey {}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ExtendedKey");
        s.field("version", &hex::encode(self.version))
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .field("chain_code", &hex::encode(self.chain_code));
        if self.is_private {
            s.field("key_material", &"<redacted>");
        } else {
            s.field("key_material", &hex::encode(self.key_material));
        }
        s.field("is_private", &self.is_private).finish()
    }
}
