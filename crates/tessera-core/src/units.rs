//! Quantities and unit formatting
//!
//! JSON callers send numeric values as decimal strings, `0x` hex strings or
//! plain numbers. [`Quantity`] accepts all three.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, WalletError};

/// Decimals of one ether
pub const ETHER_DECIMALS: u8 = 18;

/// Decimals of one gwei
pub const GWEI_DECIMALS: u8 = 9;

/// An unsigned integer quantity of arbitrary JSON shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Quantity(pub U256);

impl Quantity {
    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn to_u64(&self) -> Result<u64> {
        u64::try_from(self.0)
            .map_err(|_| WalletError::InvalidQuantity(format!("{} does not fit in 64 bits", self.0)))
    }

    pub fn to_u128(&self) -> Result<u128> {
        u128::try_from(self.0)
            .map_err(|_| WalletError::InvalidQuantity(format!("{} does not fit in 128 bits", self.0)))
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Quantity {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Quantity {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some("") => Ok(U256::ZERO),
            Some(hex) => U256::from_str_radix(hex, 16),
            None if s.is_empty() => {
                return Err(WalletError::InvalidQuantity("empty value".to_string()))
            }
            None => U256::from_str_radix(s, 10),
        };

        parsed
            .map(Quantity)
            .map_err(|_| WalletError::InvalidQuantity(s.to_string()))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer, decimal string or 0x hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Quantity, E> {
                Ok(Quantity::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Quantity, E> {
                u64::try_from(v)
                    .map(Quantity::from)
                    .map_err(|_| E::custom(format!("negative quantity {}", v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Quantity, E> {
                if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                    Ok(Quantity::from(v as u64))
                } else {
                    Err(E::custom(format!("quantity must be a whole number, got {}", v)))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Quantity, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// Format a base-unit amount with trailing fractional zeros removed,
/// keeping at least one fractional digit (`1.0`, `0.5`, `21.000001`)
pub fn format_units_trimmed(value: U256, decimals: u8) -> Result<String> {
    let formatted =
        format_units(value, decimals).map_err(|e| WalletError::InvalidQuantity(e.to_string()))?;

    Ok(match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{}.0", whole)
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => format!("{}.0", formatted),
    })
}

/// Wei to ether
pub fn format_ether(wei: U256) -> Result<String> {
    format_units_trimmed(wei, ETHER_DECIMALS)
}

/// Wei to gwei
pub fn format_gwei(wei: U256) -> Result<String> {
    format_units_trimmed(wei, GWEI_DECIMALS)
}
