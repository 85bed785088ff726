//! Account and permission names.
//!
//! Names are up to 13 characters from `.12345abcdefghijklmnopqrstuvwxyz`
//! packed into a `u64` (5 bits per character, 4 bits for the 13th), so that
//! ordering by the packed value matches lexicographic ordering of the text.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// A packed account name.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(u64);

/// Permission names share the account-name encoding (`active`, `high`, ...).
pub type PermissionName = AccountName;

/// Tenant identifiers share the account-name encoding.
pub type DacId = AccountName;

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl AccountName {
    pub const EMPTY: Self = Self(0);

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Parse a name, rejecting anything that would not print back identically.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        let bytes = s.as_bytes();
        if bytes.len() > 13 {
            return Err(TypesError::InvalidName(format!("{s} is longer than 13 characters")));
        }
        let mut value = 0u64;
        for (i, &c) in bytes.iter().enumerate() {
            let sym = char_to_symbol(c)
                .ok_or_else(|| TypesError::InvalidName(format!("{s} contains {:?}", c as char)))?;
            if i < 12 {
                value |= (sym & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if sym > 0x0f {
                    return Err(TypesError::InvalidName(format!(
                        "{s}: 13th character must be one of .12345abcdefghij"
                    )));
                }
                value |= sym & 0x0f;
            }
        }
        let name = Self(value);
        if name.to_string() != s {
            return Err(TypesError::InvalidName(format!("{s} is not normalized")));
        }
        Ok(name)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; 13];
        let mut tmp = self.0;
        for i in 0..13 {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[12 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // CHARMAP is ASCII so every prefix is valid UTF-8.
        f.write_str(std::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountName({self})")
    }
}

impl FromStr for AccountName {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccountName {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_encoding() {
        // "eosio" is the canonical reference value.
        let name: AccountName = "eosio".parse().unwrap();
        assert_eq!(name.raw(), 6138663577826885632);
        assert_eq!(name.to_string(), "eosio");
    }

    #[test]
    fn ordering_follows_text() {
        let a: AccountName = "alice".parse().unwrap();
        let b: AccountName = "bob".parse().unwrap();
        let ab: AccountName = "alicea".parse().unwrap();
        assert!(a < b);
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn rejects_invalid() {
        assert!("Alice".parse::<AccountName>().is_err());
        assert!("alice6".parse::<AccountName>().is_err());
        assert!("alice.".parse::<AccountName>().is_err());
        assert!("abcdefghijklmn".parse::<AccountName>().is_err());
        assert!("abcdefghijklz".parse::<AccountName>().is_err());
    }

    #[test]
    fn thirteen_characters() {
        let name: AccountName = "abcdefghijklj".parse().unwrap();
        assert_eq!(name.to_string(), "abcdefghijklj");
    }

    #[test]
    fn empty_name() {
        let name: AccountName = "".parse().unwrap();
        assert!(name.is_empty());
        assert_eq!(name, AccountName::EMPTY);
    }

    #[test]
    fn serde_as_string() {
        let name: AccountName = "dao.worlds".parse().unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"dao.worlds\"");
        let back: AccountName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
