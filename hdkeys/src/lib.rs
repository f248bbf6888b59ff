pub mod address;
pub mod codec;
pub mod derivation;
pub mod error;
pub mod extended_key;
pub mod keys;
pub mod validate;
pub mod version;

pub use derivation::{DerivationPath, DerivationStep, HARDENED_OFFSET};
pub use error::{Bip32Error, ValidationError};
pub use extended_key::ExtendedKey;
pub use keys::{
    KeyConfig, OutputKeyView, decode_extended_key, decode_private_wif, decode_public_hex, derive,
    generate, is_base58, validate_key,
};
pub use validate::validate;
pub use version::{CoinType, KeyFamily, KeyKind, Network, ScriptType, VersionRegistry};
