pub mod base58;
pub mod bech32;
pub mod hash;
pub mod hmac;
