//! Fee data
//!
//! EIP-1559 suggestions use a fixed 1.5 gwei tip and allow the base fee to
//! double before the transaction is priced out.

use alloy::eips::BlockNumberOrTag;
use alloy::providers::{DynProvider, Provider};
use tracing::debug;

use crate::error::Result;

/// Suggested priority fee (1.5 gwei)
pub const DEFAULT_PRIORITY_FEE: u128 = 1_500_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeData {
    pub gas_price: Option<u128>,
    pub last_base_fee_per_gas: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl FeeData {
    /// Derive EIP-1559 suggestions from the latest base fee
    pub fn compute(gas_price: Option<u128>, base_fee: Option<u128>) -> Self {
        match base_fee {
            Some(base_fee) => Self {
                gas_price,
                last_base_fee_per_gas: Some(base_fee),
                max_fee_per_gas: Some(
                    base_fee
                        .saturating_mul(2)
                        .saturating_add(DEFAULT_PRIORITY_FEE),
                ),
                max_priority_fee_per_gas: Some(DEFAULT_PRIORITY_FEE),
            },
            None => Self {
                gas_price,
                ..Self::default()
            },
        }
    }

    pub async fn fetch(provider: &DynProvider) -> Result<Self> {
        let block = provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?;
        let base_fee = block
            .and_then(|b| b.header.base_fee_per_gas)
            .map(u128::from);

        let gas_price = match provider.get_gas_price().await {
            Ok(price) => Some(price),
            Err(e) => {
                debug!(error = %e, "eth_gasPrice failed, omitting legacy price");
                None
            }
        };

        Ok(Self::compute(gas_price, base_fee))
    }

    pub fn supports_eip1559(&self) -> bool {
        self.max_fee_per_gas.is_some() && self.max_priority_fee_per_gas.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GWEI: u128 = 1_000_000_000;

    #[test]
    fn test_compute_with_base_fee() {
        let fees = FeeData::compute(Some(50 * GWEI), Some(40 * GWEI));
        assert_eq!(fees.gas_price, Some(50 * GWEI));
        assert_eq!(fees.last_base_fee_per_gas, Some(40 * GWEI));
        assert_eq!(fees.max_priority_fee_per_gas, Some(DEFAULT_PRIORITY_FEE));
        assert_eq!(fees.max_fee_per_gas, Some(80 * GWEI + DEFAULT_PRIORITY_FEE));
        assert!(fees.supports_eip1559());
    }

    #[test]
    fn test_compute_legacy_chain() {
        let fees = FeeData::compute(Some(GWEI), None);
        assert_eq!(fees.gas_price, Some(GWEI));
        assert!(fees.max_fee_per_gas.is_none());
        assert!(!fees.supports_eip1559());
    }
}
