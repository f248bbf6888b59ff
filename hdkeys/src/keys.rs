//! Request-level operations: take text or a seed in, hand a flat
//! [`OutputKeyView`] back for display.

use std::fmt;

use once_cell::sync::Lazy;
use secp256k1::{All, PublicKey, Secp256k1};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::{Addresses, legacy_address_uncompressed, wif_decode, wif_encode};
use crate::derivation::{DerivationPath, DerivationStep};
use crate::error::{Bip32Error, Result};
use crate::extended_key::ExtendedKey;
use crate::validate::validate;
use crate::version::{CoinType, KeyFamily, Network, ScriptType};

pub use crypto_utils::base58::is_base58;

static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Inputs for [`generate`]. The seed is scrubbed on drop.
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    #[serde(with = "hex::serde")]
    pub seed: Vec<u8>,
    #[serde(default)]
    #[zeroize(skip)]
    pub network: Network,
    #[serde(default)]
    #[zeroize(skip)]
    pub script_type: ScriptType,
    #[serde(default)]
    #[zeroize(skip)]
    pub derivation_path: DerivationPath,
}

impl KeyConfig {
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        KeyConfig {
            seed: seed.into(),
            network: Network::default(),
            script_type: ScriptType::default(),
            derivation_path: DerivationPath::root(),
        }
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = network;
        self
    }

    pub fn script_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = script_type;
        self
    }

    pub fn derivation_path(mut self, path: DerivationPath) -> Self {
        self.derivation_path = path;
        self
    }

    pub fn family(&self) -> KeyFamily {
        KeyFamily::new(self.network, self.script_type)
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("seed", &"<redacted>")
            .field("network", &self.network)
            .field("script_type", &self.script_type)
            .field("derivation_path", &self.derivation_path)
            .finish()
    }
}

/// Everything shown to a user about one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputKeyView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    #[serde(rename = "xPrv", skip_serializing_if = "Option::is_none")]
    pub xprv: Option<String>,
    #[serde(rename = "xPub", skip_serializing_if = "Option::is_none")]
    pub xpub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prv_key_wif: Option<String>,
    pub pub_key_hex: String,
    pub addr: String,
    #[serde(rename = "segWitNested", skip_serializing_if = "String::is_empty")]
    pub segwit_nested: String,
    #[serde(rename = "segWitBech32", skip_serializing_if = "String::is_empty")]
    pub segwit_bech32: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    pub coin_type: String,
}

impl OutputKeyView {
    fn from_public_key(public_key: &PublicKey, network: Network) -> Result<Self> {
        let addresses = Addresses::new(public_key, network)?;
        Ok(OutputKeyView {
            pub_key_hex: hex::encode(public_key.serialize()),
            addr: addresses.legacy,
            segwit_nested: addresses.nested_segwit,
            segwit_bech32: addresses.native_segwit,
            network: network.to_string(),
            coin_type: CoinType::Btc.to_string(),
            ..Default::default()
        })
    }

    fn from_extended_key(key: &ExtendedKey) -> Result<Self> {
        let network = key.network()?;
        let mut view = Self::from_public_key(&key.public_key(&SECP)?, network)?;
        view.xpub = Some(key.to_public(&SECP)?.to_string());
        if key.is_private {
            view.xprv = Some(key.to_string());
            view.prv_key_wif = Some(wif_encode(&key.private_key()?, network));
        }
        Ok(view)
    }
}

/// Master key from the configured seed, derived along the configured path.
pub fn generate(config: &KeyConfig) -> Result<OutputKeyView> {
    let master = ExtendedKey::new_master(&config.seed, &config.family())?;
    let key = master.derive_path(&SECP, &config.derivation_path)?;
    debug!(
        network = %config.network,
        script_type = %config.script_type,
        path = %config.derivation_path,
        "generated extended key"
    );
    let mut view = OutputKeyView::from_extended_key(&key)?;
    view.seed = Some(hex::encode(&config.seed));
    view.derivation_path = Some(config.derivation_path.to_string());
    Ok(view)
}

/// Derives `path` below a serialized extended key, private or public.
pub fn derive(key_text: &str, path: &str) -> Result<OutputKeyView> {
    let key: ExtendedKey = key_text.parse()?;
    let path: DerivationPath = path.parse()?;
    let child = key.derive_path(&SECP, &path)?;
    debug!(
        kind = %child.kind(),
        depth = child.depth,
        child = %DerivationStep::from_child_number(child.child_number),
        %path,
        "derived extended key"
    );
    let mut view = OutputKeyView::from_extended_key(&child)?;
    view.derivation_path = Some(path.to_string());
    Ok(view)
}

pub fn decode_extended_key(key_text: &str) -> Result<OutputKeyView> {
    derive(key_text, "m")
}

/// Addresses of a hex public key, compressed (33 bytes) or uncompressed (65).
pub fn decode_public_hex(key_hex: &str, network: Network) -> Result<OutputKeyView> {
    let bytes = hex::decode(key_hex.trim())
        .map_err(|e| Bip32Error::InvalidKeyData(format!("public key hex: {e}")))?;
    let public_key =
        PublicKey::from_slice(&bytes).map_err(|e| Bip32Error::InvalidKeyData(e.to_string()))?;
    debug!(%network, input_len = bytes.len(), "decoded public key");
    OutputKeyView::from_public_key(&public_key, network)
}

/// Network, public key and addresses of a WIF private key.
///
/// The public key follows the WIF compression flag. An uncompressed key
/// only has a legacy address; the segwit fields stay empty.
pub fn decode_private_wif(wif: &str) -> Result<OutputKeyView> {
    let decoded = wif_decode(wif)?;
    debug!(network = %decoded.network, compressed = decoded.compressed, "decoded WIF key");
    let public_key = PublicKey::from_secret_key(&SECP, &decoded.secret);
    let mut view = if decoded.compressed {
        OutputKeyView::from_public_key(&public_key, decoded.network)?
    } else {
        OutputKeyView {
            pub_key_hex: hex::encode(public_key.serialize_uncompressed()),
            addr: legacy_address_uncompressed(&public_key, decoded.network),
            network: decoded.network.to_string(),
            coin_type: CoinType::Btc.to_string(),
            ..Default::default()
        }
    };
    view.prv_key_wif = Some(wif.trim().to_string());
    Ok(view)
}

/// Decodes a serialized extended key and checks it against the BIP-32 rules.
pub fn validate_key(key_text: &str) -> Result<()> {
    let key: ExtendedKey = key_text.parse()?;
    validate(&key)?;
    Ok(())
}
