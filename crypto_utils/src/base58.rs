#[derive(Debug, Clone, PartialEq)]
pub enum Base58Error {
    InvalidCharacter(char),
    InvalidLength,
    InvalidChecksum,
}

pub const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

impl From<bs58::decode::Error> for Base58Error {
    fn from(err: bs58::decode::Error) -> Self {
        match err {
            bs58::decode::Error::InvalidCharacter { character, .. } => {
                Base58Error::InvalidCharacter(character)
            }
            bs58::decode::Error::InvalidChecksum { .. } => Base58Error::InvalidChecksum,
            _ => Base58Error::InvalidLength,
        }
    }
}

/// True iff `s` is non-empty and drawn entirely from the base58 alphabet.
pub fn is_base58(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| BASE58_ALPHABET.contains(&b))
}

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

fn check_input(s: &str) -> Result<(), Base58Error> {
    if s.is_empty() {
        return Err(Base58Error::InvalidLength);
    }
    match s.chars().find(|c| !c.is_ascii()) {
        Some(c) => Err(Base58Error::InvalidCharacter(c)),
        None => Ok(()),
    }
}

pub fn base58_decode(s: &str) -> Result<Vec<u8>, Base58Error> {
    check_input(s)?;
    Ok(bs58::decode(s).into_vec()?)
}

pub fn base58_check_encode(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

/// Decodes and strips the 4-byte double-SHA256 checksum.
pub fn base58_check_decode(s: &str) -> Result<Vec<u8>, Base58Error> {
    check_input(s)?;
    Ok(bs58::decode(s).with_check(None).into_vec()?)
}
