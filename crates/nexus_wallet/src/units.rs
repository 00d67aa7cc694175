//! Fixed-point conversion between base units and display strings, and
//! parsing of the hex quantities providers return.

use alloy_primitives::U256;

use crate::error::WalletError;

/// Decimals of every EVM native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Fractional digits shown for native balances.
pub const DISPLAY_PRECISION: u8 = 6;

fn pow10(exp: u8) -> U256 {
    let ten = U256::from(10u64);
    (0..exp).fold(U256::from(1u64), |acc, _| acc * ten)
}

/// Parse a `0x`-prefixed hex quantity (`"0x0"`, `"0x1bc16d674ec80000"`).
pub fn parse_quantity(raw: &str) -> Result<U256, WalletError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| WalletError::MalformedResponse(format!("expected hex quantity, got {raw:?}")))?;
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| WalletError::MalformedResponse(format!("bad hex quantity {raw:?}: {e}")))
}

/// Parse a chain id given as hex (`"0x89"`) or decimal (`"137"`).
pub fn parse_chain_id(raw: &str) -> Result<u64, WalletError> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|e| WalletError::MalformedResponse(format!("bad chain id {raw:?}: {e}")))
}

/// Render a quantity as a minimal `0x`-prefixed hex string.
pub fn to_quantity(value: U256) -> String {
    format!("{value:#x}")
}

/// Format base units as a decimal string with exactly `precision` fractional
/// digits, rounding half up.
///
/// `format_units(1_500_000_000_000_000_000, 18, 6) == "1.500000"`
pub fn format_units(value: U256, decimals: u8, precision: u8) -> String {
    let scaled = if precision >= decimals {
        value * pow10(precision - decimals)
    } else {
        let divisor = pow10(decimals - precision);
        let half = divisor / U256::from(2u64);
        value.saturating_add(half) / divisor
    };

    if precision == 0 {
        return scaled.to_string();
    }
    let unit = pow10(precision);
    let whole = scaled / unit;
    let frac = (scaled % unit).to_string();
    format!(
        "{whole}.{frac:0>width$}",
        width = usize::from(precision)
    )
}

/// Format a native balance the way the wallet displays it.
pub fn format_native(value: U256) -> String {
    format_units(value, NATIVE_DECIMALS, DISPLAY_PRECISION)
}

/// Parse an unsigned decimal amount into base units, truncating digits past
/// `decimals`.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, WalletError> {
    let invalid = || WalletError::InvalidInput("Invalid amount".into());

    let amount = amount.trim();
    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let kept: String = frac.chars().take(usize::from(decimals)).collect();
    let padded = format!("{whole}{kept:0<width$}", width = usize::from(decimals));
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10).map_err(|_| invalid())
}

/// Parse a native-currency amount (18 decimals).
pub fn parse_native(amount: &str) -> Result<U256, WalletError> {
    parse_units(amount, NATIVE_DECIMALS)
}
