//! Asset and protocol parameters

use crate::types::Amount;

/// Decimal places of the taxed asset
pub const ASSET_DECIMALS: u32 = 6;

/// Base units per whole token
pub const BASE_UNITS_PER_TOKEN: Amount = 10u64.pow(ASSET_DECIMALS);

pub const ASSET_UNIT_NAME: &str = "Dumbly";

/// Total supply minted at asset creation, in base units
pub const TOTAL_SUPPLY: Amount = 777_777_777;

/// Sell tax applied by this deployment, in percent
pub const DEFAULT_TAX_RATE_PERCENT: u8 = 9;

/// Largest atomic group the ledger accepts
pub const MAX_GROUP_SIZE: usize = 16;

/// Rounds to wait for a submitted group before reporting an unknown outcome
pub const DEFAULT_CONFIRMATION_ROUNDS: u64 = 4;

/// Render base units as a decimal token amount (display only)
pub fn format_units(amount: Amount) -> String {
    format!(
        "{}.{:0width$}",
        amount / BASE_UNITS_PER_TOKEN,
        amount % BASE_UNITS_PER_TOKEN,
        width = ASSET_DECIMALS as usize
    )
}
