use thiserror::Error;

use crate::version::KeyKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Bip32Error {
    #[error("invalid or unsupported network: {0}, allowed networks are [mainnet testnet]")]
    InvalidNetwork(String),

    #[error("invalid or unsupported script type: {0}")]
    InvalidScriptType(String),

    #[error("unsupported key version {}", hex::encode(.0))]
    UnsupportedVersion([u8; 4]),

    #[error("invalid derivation path: {0}")]
    ParseError(String),

    #[error("seed produced a master key outside the curve order")]
    InvalidSeed,

    #[error("cannot derive a hardened child from a public key")]
    HardenedFromPublic,

    #[error("child {0} is invalid, use the next index")]
    InvalidChild(u32),

    #[error("maximum derivation depth exceeded")]
    DepthOverflow,

    #[error("malformed extended key: {0}")]
    Malformed(String),

    #[error("invalid key data: {0}")]
    InvalidKeyData(String),

    #[error("failed to encode address: {0}")]
    Address(String),

    #[error("validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// First rule a decoded extended key violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown key version found")]
    UnknownVersion,

    #[error("key-kind/version mismatch: version is {version}, key material is {material}")]
    KeyKindMismatch { version: KeyKind, material: KeyKind },

    #[error("invalid {kind} key prefix {prefix:02x}")]
    InvalidKeyPrefix { kind: KeyKind, prefix: u8 },

    #[error("key depth is zero, however, parent non-zero fingerprint exists")]
    NonZeroParentFingerprint,

    #[error("key depth is zero, however, non-zero child index exists")]
    NonZeroChildNumber,

    #[error("private key is not in 1:n-1")]
    ScalarOutOfRange,

    #[error("public key is not a point on the curve")]
    PublicKeyNotOnCurve,
}

pub type Result<T> = std::result::Result<T, Bip32Error>;
