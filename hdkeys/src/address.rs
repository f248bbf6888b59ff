//! Legacy (P2PKH), nested segwit (P2SH-P2WPKH) and native segwit (P2WPKH)
//! addresses, and WIF private keys.

use crypto_utils::{
    base58::{self, Base58Error},
    bech32::segwit_v0_encode,
    hash::hash160,
};
use secp256k1::{PublicKey, SecretKey};

use crate::error::{Bip32Error, Result};
use crate::version::Network;

/// Per-network address prefixes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AddressParams {
    pub p2pkh: u8,
    pub p2sh: u8,
    pub wif: u8,
    pub hrp: &'static str,
}

const MAINNET_PARAMS: AddressParams = AddressParams {
    p2pkh: 0x00,
    p2sh: 0x05,
    wif: 0x80,
    hrp: "bc",
};

const TESTNET_PARAMS: AddressParams = AddressParams {
    p2pkh: 0x6f,
    p2sh: 0xc4,
    wif: 0xef,
    hrp: "tb",
};

/// WIF suffix marking a compressed public key.
const WIF_COMPRESSED: u8 = 0x01;

impl Network {
    pub fn params(&self) -> &'static AddressParams {
        match self {
            Network::Mainnet => &MAINNET_PARAMS,
            Network::Testnet => &TESTNET_PARAMS,
        }
    }

    fn from_wif_prefix(prefix: u8) -> Option<Network> {
        Network::ALL.into_iter().find(|n| n.params().wif == prefix)
    }
}

fn base58check_with_prefix(prefix: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(prefix);
    data.extend_from_slice(payload);
    base58::base58_check_encode(&data)
}

/// OP_0 PUSH20 <hash160(pubkey)>
pub fn p2wpkh_script(public_key: &PublicKey) -> [u8; 22] {
    let mut script = [0u8; 22];
    script[0] = 0x00;
    script[1] = 0x14;
    script[2..].copy_from_slice(&hash160(&public_key.serialize()));
    script
}

pub fn legacy_address(public_key: &PublicKey, network: Network) -> String {
    base58check_with_prefix(network.params().p2pkh, &hash160(&public_key.serialize()))
}

/// P2PKH over the 65-byte encoding, for keys imported from uncompressed WIF.
/// Segwit outputs have no uncompressed form.
pub fn legacy_address_uncompressed(public_key: &PublicKey, network: Network) -> String {
    base58check_with_prefix(
        network.params().p2pkh,
        &hash160(&public_key.serialize_uncompressed()),
    )
}

/// P2WPKH wrapped in P2SH: the redeem script is the P2WPKH output script.
pub fn nested_segwit_address(public_key: &PublicKey, network: Network) -> String {
    base58check_with_prefix(network.params().p2sh, &hash160(&p2wpkh_script(public_key)))
}

pub fn native_segwit_address(public_key: &PublicKey, network: Network) -> Result<String> {
    segwit_v0_encode(network.params().hrp, &hash160(&public_key.serialize()))
        .map_err(|e| Bip32Error::Address(format!("{e:?}")))
}

/// The three address forms of one public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Addresses {
    pub legacy: String,
    pub nested_segwit: String,
    pub native_segwit: String,
}

impl Addresses {
    pub fn new(public_key: &PublicKey, network: Network) -> Result<Self> {
        Ok(Addresses {
            legacy: legacy_address(public_key, network),
            nested_segwit: nested_segwit_address(public_key, network),
            native_segwit: native_segwit_address(public_key, network)?,
        })
    }
}

/// WIF for a compressed-pubkey private key.
pub fn wif_encode(secret: &SecretKey, network: Network) -> String {
    let mut payload = zeroize::Zeroizing::new([0u8; 33]);
    payload[..32].copy_from_slice(&secret.secret_bytes());
    payload[32] = WIF_COMPRESSED;
    base58check_with_prefix(network.params().wif, &payload[..])
}

/// A decoded WIF private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wif {
    pub network: Network,
    pub secret: SecretKey,
    pub compressed: bool,
}

pub fn wif_decode(s: &str) -> Result<Wif> {
    let payload = zeroize::Zeroizing::new(base58::base58_check_decode(s.trim()).map_err(
        |e| match e {
            Base58Error::InvalidCharacter(c) => {
                Bip32Error::InvalidKeyData(format!("invalid base58 character {c:?}"))
            }
            Base58Error::InvalidChecksum => Bip32Error::InvalidKeyData("bad checksum".into()),
            Base58Error::InvalidLength => Bip32Error::InvalidKeyData("too short".into()),
        },
    )?);
    let compressed = match payload.len() {
        33 => false,
        34 if payload[33] == WIF_COMPRESSED => true,
        n => {
            return Err(Bip32Error::InvalidKeyData(format!(
                "unexpected WIF payload of {n} bytes"
            )));
        }
    };
    let network = Network::from_wif_prefix(payload[0]).ok_or_else(|| {
        Bip32Error::InvalidNetwork(format!("WIF prefix {:02x}", payload[0]))
    })?;
    let secret = SecretKey::from_slice(&payload[1..33])
        .map_err(|e| Bip32Error::InvalidKeyData(e.to_string()))?;
    Ok(Wif {
        network,
        secret,
        compressed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_utils::bech32::segwit_decode;
    use hex_literal::hex;
    use secp256k1::Secp256k1;
    use secp256k1::rand::thread_rng;

    fn public_key(bytes: [u8; 33]) -> PublicKey {
        PublicKey::from_slice(&bytes).unwrap()
    }

    fn one() -> SecretKey {
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        SecretKey::from_slice(&scalar).unwrap()
    }

    #[test]
    fn addresses_of_generator_point() {
        let secp = Secp256k1::new();
        let g = PublicKey::from_secret_key(&secp, &one());
        let mainnet = Addresses::new(&g, Network::Mainnet).unwrap();
        assert_eq!(mainnet.legacy, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(mainnet.nested_segwit, "3JvL6Ymt8MVWiCNHC7oWU6nLeHNJKLZGLN");
        assert_eq!(mainnet.native_segwit, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(legacy_address(&g, Network::Testnet), "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r");
        assert_eq!(
            legacy_address_uncompressed(&g, Network::Mainnet),
            "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm"
        );
    }

    #[test]
    fn addresses_of_bip32_master_key() {
        // BIP-32 test vector 1, chain m
        let pk = public_key(hex!(
            "0339a36013301597daef41fbe593a02cc513d0b55527ec2df1050e2e8ff49c85c2"
        ));
        let addresses = Addresses::new(&pk, Network::Mainnet).unwrap();
        assert_eq!(
            addresses,
            Addresses {
                legacy: "15mKKb2eos1hWa6tisdPwwDC1a5J1y9nma".into(),
                nested_segwit: "3PpgpssV7mcAGpZRWiCWhodUTnjpoSZg7a".into(),
                native_segwit: "bc1qx3ppj0smkuy3d6g525sh9n2w9k7fm7q3x30rtg".into(),
            }
        );
    }

    #[test]
    fn native_segwit_carries_hash160_program() {
        let pk = public_key(hex!(
            "028a9ddba7eae27c63171950ba8692a351a92a1fedb1ec0789f8b5857eecd34dd3"
        ));
        let address = native_segwit_address(&pk, Network::Testnet).unwrap();
        assert_eq!(address, "tb1qjnqqhj52nqdfqxrxxmt05f5hpmpyffalecq9wk");
        let (hrp, version, program) = segwit_decode(&address).unwrap();
        assert_eq!((hrp.as_str(), version), ("tb", 0));
        assert_eq!(program, hash160(&pk.serialize()));
        assert_eq!(p2wpkh_script(&pk)[2..], program[..]);
    }

    #[test]
    fn wif_known_values() {
        assert_eq!(
            wif_encode(&one(), Network::Mainnet),
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );
        assert_eq!(
            wif_encode(&one(), Network::Testnet),
            "cMahea7zqjxrtgAbB7LSGbcQUr1uX1ojuat9jZodMN87JcbXMTcA"
        );
        let uncompressed = wif_decode("5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf").unwrap();
        assert_eq!(
            uncompressed,
            Wif {
                network: Network::Mainnet,
                secret: one(),
                compressed: false,
            }
        );
    }

    #[test]
    fn wif_decode_inverts_encode() {
        let secret = SecretKey::new(&mut thread_rng());
        for network in Network::ALL {
            let decoded = wif_decode(&wif_encode(&secret, network)).unwrap();
            assert_eq!(decoded.network, network);
            assert_eq!(decoded.secret, secret);
            assert!(decoded.compressed);
        }
    }

    #[test]
    fn wif_decode_rejects_foreign_prefixes() {
        // a mainnet P2PKH address is valid base58check but not a WIF
        assert!(matches!(
            wif_decode("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH"),
            Err(Bip32Error::InvalidKeyData(_))
        ));
        let mut payload = vec![0x99];
        payload.extend_from_slice(&one().secret_bytes());
        payload.push(WIF_COMPRESSED);
        assert!(matches!(
            wif_decode(&base58::base58_check_encode(&payload)),
            Err(Bip32Error::InvalidNetwork(_))
        ));
    }
}
