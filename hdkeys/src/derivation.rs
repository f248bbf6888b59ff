use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Bip32Error, Result};

/// Index offset for hardened children (index >= 0x80000000) i.e., 0x80000000 = 2³¹
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One step of a derivation path: a 31-bit index and the hardened flag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationStep {
    index: u32,
    hardened: bool,
}

impl DerivationStep {
    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    pub fn new(index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Bip32Error::ParseError(format!(
                "index {index} is not below the hardened offset"
            )));
        }
        Ok(DerivationStep { index, hardened })
    }

    /// Splits a serialized child number into index and hardened flag.
    pub fn from_child_number(child_number: u32) -> Self {
        DerivationStep {
            index: child_number & !HARDENED_OFFSET,
            hardened: child_number & HARDENED_OFFSET != 0,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// The value fed to `ser32`: the index, plus 2³¹ when hardened.
    pub fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for DerivationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for DerivationStep {
    type Err = Bip32Error;

    /// Parses "44", "44'", "44h" or "44H".
    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Bip32Error::ParseError(format!("invalid segment {s:?}")));
        }
        let index: u32 = digits
            .parse()
            .map_err(|_| Bip32Error::ParseError(format!("segment {s:?} is out of range")))?;
        DerivationStep::new(index, hardened)
    }
}

/// A BIP-32 derivation path rooted at "m" (e.g., "m/44'/0'/0'/0/1").
///
/// The root path "m" has no steps and derives the key itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DerivationPath(Vec<DerivationStep>);

impl DerivationPath {
    pub fn root() -> Self {
        DerivationPath(Vec::new())
    }

    pub fn steps(&self) -> &[DerivationStep] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for DerivationPath {
    type Err = Bip32Error;

    /// Parses "m", "m/0", "m/0h", "m/44'/0/2147483647H".
    ///
    /// Surrounding separators are ignored and an empty string is the root
    /// path. The first segment must be "m" (either case).
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(DerivationPath::root());
        }
        let mut segments = trimmed.split('/');
        match segments.next() {
            Some(first) if first.eq_ignore_ascii_case("m") => {}
            _ => {
                return Err(Bip32Error::ParseError(format!(
                    "path must start with m: {trimmed}"
                )));
            }
        }
        segments
            .map(str::parse)
            .collect::<Result<Vec<_>>>()
            .map(DerivationPath)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for DerivationPath {
    type Error = Bip32Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DerivationPath> for String {
    fn from(path: DerivationPath) -> Self {
        path.to_string()
    }
}
