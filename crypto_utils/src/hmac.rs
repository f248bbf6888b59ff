use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// HMAC-SHA512 as used by BIP-32 for master and child key expansion.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    HmacSha512::new_from_slice(key)
        .expect("HMAC accepts keys of any length")
        .chain_update(data)
        .finalize()
        .into_bytes()
        .into()
}
