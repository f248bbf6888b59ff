use ::bech32::{Hrp, segwit};

#[derive(Debug, Clone, PartialEq)]
pub enum Bech32Error {
    InvalidHrp(String),
    Encode(String),
    Decode(String),
}

/// Encodes a version-0 witness program (bech32, not bech32m) under `hrp`.
pub fn segwit_v0_encode(hrp: &str, program: &[u8]) -> Result<String, Bech32Error> {
    let hrp = Hrp::parse(hrp).map_err(|e| Bech32Error::InvalidHrp(e.to_string()))?;
    segwit::encode_v0(hrp, program).map_err(|e| Bech32Error::Encode(e.to_string()))
}

/// Decodes a segwit address into (hrp, witness version, program).
pub fn segwit_decode(address: &str) -> Result<(String, u8, Vec<u8>), Bech32Error> {
    let (hrp, version, program) =
        segwit::decode(address).map_err(|e| Bech32Error::Decode(e.to_string()))?;
    Ok((hrp.to_lowercase(), version.to_u8(), program))
}
