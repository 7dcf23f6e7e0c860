//! 20-byte on-chain account address.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::TypesError;

/// An Ethereum-style account address.
///
/// Always rendered as lowercase hex with a `0x` prefix, regardless of the
/// casing it was parsed from.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    /// Length of the hex form without prefix.
    pub const HEX_LEN: usize = 40;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.len() != Self::HEX_LEN {
            return Err(TypesError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| TypesError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Extract an address from a log topic word.
    ///
    /// Indexed address arguments are logged as 32-byte left-padded words. A
    /// value longer than 42 characters is treated as padded and only its last
    /// 40 hex characters are kept; anything shorter is parsed as-is.
    pub fn from_topic(topic: &str) -> Result<Self, TypesError> {
        if topic.len() > Self::HEX_LEN + 2 {
            let tail = topic
                .get(topic.len() - Self::HEX_LEN..)
                .ok_or_else(|| TypesError::InvalidAddress(topic.to_string()))?;
            Self::parse(tail)
        } else {
            Self::parse(topic)
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_topic_keeps_last_twenty_bytes() {
        let topic = "0x000000000000000000000000deadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
        let addr = Address::from_topic(topic).unwrap();
        assert_eq!(
            addr.to_string(),
            "0xdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef"
        );
    }

    #[test]
    fn unpadded_topic_is_identity() {
        let raw = "0xbeefed1bedded2dabbed3defaced4decade5dead";
        assert_eq!(Address::from_topic(raw).unwrap().to_string(), raw);
    }

    #[test]
    fn display_is_lowercase() {
        let addr = Address::parse("0xDA1495EBD7573D8E7F860862BAA3ABECEBFA02E0").unwrap();
        assert_eq!(
            addr.to_string(),
            "0xda1495ebd7573d8e7f860862baa3abecebfa02e0"
        );
    }

    #[test]
    fn parse_without_prefix() {
        let a = Address::parse("81431b69b1e0e334d4161a13c2955e0f3599381e").unwrap();
        let b = Address::parse("0x81431b69b1e0e334d4161a13c2955e0f3599381e").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_length_and_digits() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("0xzz431b69b1e0e334d4161a13c2955e0f3599381e").is_err());
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address::new([0xab; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{addr}\""));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
