//! Token symbols and amounts.
//!
//! Amounts are fixed-point integers (`i64`) scaled by the symbol precision,
//! so `10.0000 TLM` is stored as `100000` with precision 4.

use crate::error::TypesError;
use crate::name::AccountName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A token symbol: up to 7 upper-case letters plus a decimal precision.
///
/// Packed as `code << 8 | precision`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(u64);

impl Symbol {
    pub fn new(code: &str, precision: u8) -> Result<Self, TypesError> {
        if code.is_empty() || code.len() > 7 || !code.bytes().all(|c| c.is_ascii_uppercase()) {
            return Err(TypesError::InvalidSymbol(code.to_string()));
        }
        if precision > 18 {
            return Err(TypesError::InvalidSymbol(format!("{precision},{code}")));
        }
        let mut raw = 0u64;
        for (i, c) in code.bytes().enumerate() {
            raw |= (c as u64) << (8 * (i + 1));
        }
        Ok(Self(raw | precision as u64))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn precision(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn code(&self) -> String {
        let mut tmp = self.0 >> 8;
        let mut code = String::new();
        while tmp > 0 {
            code.push((tmp & 0xff) as u8 as char);
            tmp >>= 8;
        }
        code
    }

    /// `10^precision`, the raw value of one whole token.
    pub fn unit(&self) -> i64 {
        10i64.pow(self.precision() as u32)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision(), self.code())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({self})")
    }
}

impl FromStr for Symbol {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| TypesError::InvalidSymbol(s.to_string()))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|_| TypesError::InvalidSymbol(s.to_string()))?;
        Self::new(code.trim(), precision)
    }
}

impl TryFrom<String> for Symbol {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// A signed quantity of a single token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<(), TypesError> {
        if self.symbol != other.symbol {
            return Err(TypesError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            });
        }
        Ok(())
    }

    pub fn checked_add(self, other: Asset) -> Result<Asset, TypesError> {
        self.ensure_same_symbol(&other)?;
        let amount = self.amount.checked_add(other.amount).ok_or(TypesError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    pub fn checked_sub(self, other: Asset) -> Result<Asset, TypesError> {
        self.ensure_same_symbol(&other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or(TypesError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// `self * numerator / denominator`, truncating, computed in 128 bits.
    pub fn mul_div(self, numerator: i64, denominator: i64) -> Result<Asset, TypesError> {
        if denominator == 0 {
            return Err(TypesError::Overflow);
        }
        let scaled = self.amount as i128 * numerator as i128 / denominator as i128;
        let amount = i64::try_from(scaled).map_err(|_| TypesError::Overflow)?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Compare two amounts of the same token.
    pub fn cmp_amount(&self, other: &Asset) -> Result<std::cmp::Ordering, TypesError> {
        self.ensure_same_symbol(other)?;
        Ok(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision() as u32;
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        if precision == 0 {
            return write!(f, "{sign}{abs} {}", self.symbol.code());
        }
        let unit = 10u64.pow(precision);
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            abs / unit,
            abs % unit,
            self.symbol.code(),
            width = precision as usize
        )
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({self})")
    }
}

impl FromStr for Asset {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidAsset(s.to_string());
        let (number, code) = s.trim().split_once(' ').ok_or_else(invalid)?;
        let (negative, number) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() || !whole.bytes().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.bytes().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let precision = u8::try_from(frac.len()).map_err(|_| invalid())?;
        let symbol = Symbol::new(code.trim(), precision)?;
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = if frac.is_empty() { 0 } else { frac.parse().map_err(|_| invalid())? };
        let amount = whole
            .checked_mul(symbol.unit())
            .and_then(|w| w.checked_add(frac))
            .ok_or(TypesError::Overflow)?;
        Ok(Asset::new(if negative { -amount } else { amount }, symbol))
    }
}

impl TryFrom<String> for Asset {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Asset> for String {
    fn from(asset: Asset) -> Self {
        asset.to_string()
    }
}

/// A symbol issued by a specific token contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExtendedSymbol {
    pub symbol: Symbol,
    pub contract: AccountName,
}

impl ExtendedSymbol {
    pub fn new(symbol: Symbol, contract: AccountName) -> Self {
        Self { symbol, contract }
    }
}

impl fmt::Display for ExtendedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.contract)
    }
}

/// A quantity together with the contract that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtendedAsset {
    pub quantity: Asset,
    pub contract: AccountName,
}

impl ExtendedAsset {
    pub fn new(quantity: Asset, contract: AccountName) -> Self {
        Self { quantity, contract }
    }

    pub fn extended_symbol(&self) -> ExtendedSymbol {
        ExtendedSymbol::new(self.quantity.symbol, self.contract)
    }
}

impl fmt::Display for ExtendedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.quantity, self.contract)
    }
}
