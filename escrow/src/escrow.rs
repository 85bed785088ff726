//! Escrow records and the funding memo format.

use crate::error::EscrowError;
use dac_store::{IndexDef, Record, Table};
use dac_types::{AccountName, DacId, ExtendedAsset, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    /// External reference, unique per tenant.
    pub key: AccountName,
    pub sender: AccountName,
    pub receiver: AccountName,
    pub arb: AccountName,
    pub receiver_pay: Option<ExtendedAsset>,
    pub arbiter_pay: Option<ExtendedAsset>,
    pub expires: Timestamp,
    pub memo: String,
    pub disputed: bool,
}

impl Escrow {
    pub fn is_funded(&self) -> bool {
        self.receiver_pay.is_some()
    }

    /// Neither leg has been paid in.
    pub fn is_empty(&self) -> bool {
        self.receiver_pay.is_none() && self.arbiter_pay.is_none()
    }
}

impl Record for Escrow {
    type Key = AccountName;

    fn primary_key(&self) -> AccountName {
        self.key
    }

    fn indexes() -> &'static [IndexDef<Self>] {
        ESCROW_INDEXES
    }
}

const ESCROW_INDEXES: &[IndexDef<Escrow>] = &[IndexDef {
    name: "bysender",
    key: |e| e.sender.raw() as u128,
}];

/// Which side of an escrow a deposit pays for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingLeg {
    Receiver,
    Arbiter,
}

impl FundingLeg {
    fn tag(&self) -> &'static str {
        match self {
            FundingLeg::Receiver => "rec",
            FundingLeg::Arbiter => "arb",
        }
    }
}

impl fmt::Display for FundingLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Transfer memo routing a deposit to one escrow leg: `rec:<key>:<dac>` or
/// `arb:<key>:<dac>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FundingMemo {
    pub leg: FundingLeg,
    pub key: AccountName,
    pub dac_id: DacId,
}

impl fmt::Display for FundingMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.leg, self.key, self.dac_id)
    }
}

impl FromStr for FundingMemo {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [leg, key, dac] = parts.as_slice() else {
            return Err(EscrowError::InvalidMemo(s.to_string()));
        };
        let leg = match *leg {
            "rec" => FundingLeg::Receiver,
            "arb" => FundingLeg::Arbiter,
            _ => return Err(EscrowError::InvalidMemo(s.to_string())),
        };
        let key = key
            .parse()
            .map_err(|_| EscrowError::InvalidMemo(s.to_string()))?;
        let dac_id = dac
            .parse()
            .map_err(|_| EscrowError::InvalidMemo(s.to_string()))?;
        Ok(Self { leg, key, dac_id })
    }
}

/// Open escrows of one tenant.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EscrowState {
    #[serde(default)]
    pub escrows: Table<Escrow>,
}

impl EscrowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AccountName) -> Result<&Escrow, EscrowError> {
        self.escrows.get(key).ok_or(EscrowError::NotFound(*key))
    }

    /// Open escrows funded by `sender`.
    pub fn by_sender(&self, sender: &AccountName) -> Result<Vec<&Escrow>, EscrowError> {
        let raw = sender.raw() as u128;
        Ok(self.escrows.index_range("bysender", raw..=raw)?.collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[test]
    fn memo_round_trips() {
        let memo = FundingMemo {
            leg: FundingLeg::Arbiter,
            key: name("prop1"),
            dac_id: name("testdac"),
        };
        assert_eq!(memo.to_string(), "arb:prop1:testdac");
        assert_eq!("arb:prop1:testdac".parse::<FundingMemo>().unwrap(), memo);
    }

    #[test]
    fn malformed_memos_are_rejected() {
        for memo in ["", "rec:prop1", "rec:prop1:dac:extra", "fee:prop1:dac", "rec:PROP:dac"] {
            let err = memo.parse::<FundingMemo>().unwrap_err();
            assert!(matches!(err, EscrowError::InvalidMemo(_)), "{memo}");
        }
    }
}
