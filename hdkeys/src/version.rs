//! Version registry: maps (coin, network, script type, key kind) to the
//! 4-byte tag heading a serialized extended key, and back.
//!
//! Tags follow the SLIP-132 / Electrum table:
//! <https://electrum.readthedocs.io/en/latest/xpub_version_bytes.html#specification>

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::error::{Bip32Error, Result};

pub type KeyVersion = [u8; 4];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum CoinType {
    #[default]
    Btc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ScriptType {
    /// xpub/xprv, tpub/tprv
    #[default]
    P2pkhOrP2sh,
    /// ypub/yprv, upub/uprv
    P2wpkhP2sh,
    /// Ypub/Yprv, Upub/Uprv
    P2wshP2sh,
    /// zpub/zprv, vpub/vprv
    P2wpkh,
    /// Zpub/Zprv, Vpub/Vprv
    P2wsh,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyKind {
    Public,
    Private,
}

impl CoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinType::Btc => "btc",
        }
    }
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Testnet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl ScriptType {
    pub const ALL: [ScriptType; 5] = [
        ScriptType::P2pkhOrP2sh,
        ScriptType::P2wpkhP2sh,
        ScriptType::P2wshP2sh,
        ScriptType::P2wpkh,
        ScriptType::P2wsh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::P2pkhOrP2sh => "p2pkh-or-p2sh",
            ScriptType::P2wpkhP2sh => "p2wpkh-p2sh",
            ScriptType::P2wshP2sh => "p2wsh-p2sh",
            ScriptType::P2wpkh => "p2wpkh",
            ScriptType::P2wsh => "p2wsh",
        }
    }
}

impl KeyKind {
    pub fn from_private(is_private: bool) -> Self {
        if is_private {
            KeyKind::Private
        } else {
            KeyKind::Public
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, KeyKind::Private)
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => f.write_str("public"),
            KeyKind::Private => f.write_str("private"),
        }
    }
}

impl FromStr for Network {
    type Err = Bip32Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            other => Err(Bip32Error::InvalidNetwork(other.to_string())),
        }
    }
}

impl FromStr for ScriptType {
    type Err = Bip32Error;

    /// Accepts the canonical names plus the common aliases
    /// (`legacy`, `p2sh`, `segwit-compatible`, `segwit-native`, `bech32`).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p2pkh-or-p2sh" | "legacy" => Ok(ScriptType::P2pkhOrP2sh),
            "p2wpkh-p2sh" | "p2sh" | "segwit-compatible" => Ok(ScriptType::P2wpkhP2sh),
            "p2wsh-p2sh" => Ok(ScriptType::P2wshP2sh),
            "p2wpkh" | "segwit-native" | "bech32" => Ok(ScriptType::P2wpkh),
            "p2wsh" => Ok(ScriptType::P2wsh),
            other => Err(Bip32Error::InvalidScriptType(other.to_string())),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = Bip32Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl TryFrom<String> for ScriptType {
    type Error = Bip32Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// One row of the registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyVersionEntry {
    pub coin: CoinType,
    pub network: Network,
    pub script_type: ScriptType,
    pub kind: KeyKind,
}

// (network, script type, public tag, private tag)
const BTC_VERSIONS: [(Network, ScriptType, KeyVersion, KeyVersion); 10] = [
    (Network::Mainnet, ScriptType::P2pkhOrP2sh, [0x04, 0x88, 0xb2, 0x1e], [0x04, 0x88, 0xad, 0xe4]),
    (Network::Mainnet, ScriptType::P2wpkhP2sh, [0x04, 0x9d, 0x7c, 0xb2], [0x04, 0x9d, 0x78, 0x78]),
    (Network::Mainnet, ScriptType::P2wshP2sh, [0x02, 0x95, 0xb4, 0x3f], [0x02, 0x95, 0xb0, 0x05]),
    (Network::Mainnet, ScriptType::P2wpkh, [0x04, 0xb2, 0x47, 0x46], [0x04, 0xb2, 0x43, 0x0c]),
    (Network::Mainnet, ScriptType::P2wsh, [0x02, 0xaa, 0x7e, 0xd3], [0x02, 0xaa, 0x7a, 0x99]),
    (Network::Testnet, ScriptType::P2pkhOrP2sh, [0x04, 0x35, 0x87, 0xcf], [0x04, 0x35, 0x83, 0x94]),
    (Network::Testnet, ScriptType::P2wpkhP2sh, [0x04, 0x4a, 0x52, 0x62], [0x04, 0x4a, 0x4e, 0x28]),
    (Network::Testnet, ScriptType::P2wshP2sh, [0x02, 0x42, 0x89, 0xef], [0x02, 0x42, 0x85, 0xb5]),
    (Network::Testnet, ScriptType::P2wpkh, [0x04, 0x5f, 0x1c, 0xf6], [0x04, 0x5f, 0x18, 0xbc]),
    (Network::Testnet, ScriptType::P2wsh, [0x02, 0x57, 0x54, 0x83], [0x02, 0x57, 0x50, 0x48]),
];

static REGISTRY: Lazy<VersionRegistry> = Lazy::new(VersionRegistry::bitcoin);

/// Immutable once built; forward and reverse indices are both hash maps.
#[derive(Debug)]
pub struct VersionRegistry {
    forward: HashMap<KeyVersionEntry, KeyVersion>,
    reverse: HashMap<KeyVersion, KeyVersionEntry>,
}

impl VersionRegistry {
    /// The process-wide registry.
    pub fn global() -> &'static VersionRegistry {
        &REGISTRY
    }

    fn bitcoin() -> Self {
        let mut forward = HashMap::with_capacity(BTC_VERSIONS.len() * 2);
        let mut reverse = HashMap::with_capacity(BTC_VERSIONS.len() * 2);
        for (network, script_type, public, private) in BTC_VERSIONS {
            for (kind, version) in [(KeyKind::Public, public), (KeyKind::Private, private)] {
                let entry = KeyVersionEntry {
                    coin: CoinType::Btc,
                    network,
                    script_type,
                    kind,
                };
                forward.insert(entry, version);
                reverse.insert(version, entry);
            }
        }
        VersionRegistry { forward, reverse }
    }

    pub fn lookup(
        &self,
        coin: CoinType,
        network: Network,
        script_type: ScriptType,
        kind: KeyKind,
    ) -> Option<KeyVersion> {
        let entry = KeyVersionEntry {
            coin,
            network,
            script_type,
            kind,
        };
        self.forward.get(&entry).copied()
    }

    pub fn entry(&self, version: &KeyVersion) -> Option<&KeyVersionEntry> {
        self.reverse.get(version)
    }

    /// Recovers network and key kind from a tag alone.
    pub fn classify(&self, version: &KeyVersion) -> Result<(Network, KeyKind)> {
        self.entry(version)
            .map(|entry| (entry.network, entry.kind))
            .ok_or(Bip32Error::UnsupportedVersion(*version))
    }

    /// All tags registered for `network`.
    pub fn versions(&self, network: Network) -> impl Iterator<Item = &KeyVersion> + '_ {
        self.reverse
            .iter()
            .filter(move |(_, entry)| entry.network == network)
            .map(|(version, _)| version)
    }
}

/// The (coin, network, script type) selection a key is derived under.
///
/// Passed explicitly to the engine so that the version pair is never
/// ambient state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct KeyFamily {
    pub coin: CoinType,
    pub network: Network,
    pub script_type: ScriptType,
}

impl KeyFamily {
    pub fn new(network: Network, script_type: ScriptType) -> Self {
        KeyFamily {
            coin: CoinType::Btc,
            network,
            script_type,
        }
    }

    pub fn version(&self, kind: KeyKind) -> Result<KeyVersion> {
        VersionRegistry::global()
            .lookup(self.coin, self.network, self.script_type, kind)
            .ok_or_else(|| {
                Bip32Error::InvalidNetwork(format!(
                    "{}/{}/{}/{}",
                    self.coin, self.network, self.script_type, kind
                ))
            })
    }

    /// Family of a registered tag.
    pub fn of(version: &KeyVersion) -> Result<Self> {
        let entry = VersionRegistry::global()
            .entry(version)
            .ok_or(Bip32Error::UnsupportedVersion(*version))?;
        Ok(KeyFamily {
            coin: entry.coin,
            network: entry.network,
            script_type: entry.script_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_network_holds_ten_tags() {
        let registry = VersionRegistry::global();
        for network in Network::ALL {
            assert_eq!(registry.versions(network).count(), 10);
        }
        let mainnet: Vec<_> = registry.versions(Network::Mainnet).collect();
        assert!(registry.versions(Network::Testnet).all(|v| !mainnet.contains(&v)));
    }

    #[test]
    fn lookup_and_classify_agree() {
        let registry = VersionRegistry::global();
        for network in Network::ALL {
            for script_type in ScriptType::ALL {
                for kind in [KeyKind::Public, KeyKind::Private] {
                    let version = registry
                        .lookup(CoinType::Btc, network, script_type, kind)
                        .unwrap();
                    assert_eq!(registry.classify(&version).unwrap(), (network, kind));
                    assert_eq!(
                        KeyFamily::of(&version).unwrap(),
                        KeyFamily::new(network, script_type)
                    );
                }
            }
        }
    }

    #[test]
    fn well_known_tags() {
        let family = KeyFamily::new(Network::Mainnet, ScriptType::P2pkhOrP2sh);
        assert_eq!(family.version(KeyKind::Private).unwrap(), [0x04, 0x88, 0xad, 0xe4]);
        assert_eq!(family.version(KeyKind::Public).unwrap(), [0x04, 0x88, 0xb2, 0x1e]);
        let family = KeyFamily::new(Network::Testnet, ScriptType::P2wpkh);
        assert_eq!(family.version(KeyKind::Public).unwrap(), [0x04, 0x5f, 0x1c, 0xf6]);
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let registry = VersionRegistry::global();
        assert_eq!(
            registry.classify(&[0xde, 0xad, 0xbe, 0xef]),
            Err(Bip32Error::UnsupportedVersion([0xde, 0xad, 0xbe, 0xef]))
        );
    }

    #[test]
    fn script_type_aliases() {
        let cases = [
            ("legacy", ScriptType::P2pkhOrP2sh),
            ("P2PKH-or-P2SH", ScriptType::P2pkhOrP2sh),
            ("p2sh", ScriptType::P2wpkhP2sh),
            ("segwit-compatible", ScriptType::P2wpkhP2sh),
            ("p2wsh-p2sh", ScriptType::P2wshP2sh),
            ("segwit-native", ScriptType::P2wpkh),
            ("Bech32", ScriptType::P2wpkh),
            ("p2wsh", ScriptType::P2wsh),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<ScriptType>().unwrap(), expected, "{text}");
        }
        assert!(matches!(
            "taproot".parse::<ScriptType>(),
            Err(Bip32Error::InvalidScriptType(_))
        ));
    }

    #[test]
    fn network_names() {
        assert_eq!("MainNet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert_eq!(
            "regtest".parse::<Network>(),
            Err(Bip32Error::InvalidNetwork("regtest".into()))
        );
    }
}
