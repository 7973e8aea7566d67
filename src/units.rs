//! Decimal <-> smallest-unit conversion for chain amounts.

use alloy::primitives::utils::{format_units as alloy_format_units, parse_units as alloy_parse_units};
use alloy::primitives::U256;
use thiserror::Error;

/// Fractional digits of the native asset (wei per ether = 10^18).
pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("amount is not a decimal number: {0}")]
    Malformed(String),
    #[error("amount {value} has more than {decimals} fractional digits")]
    TooPrecise { value: String, decimals: u8 },
}

/// Parse a human decimal string ("1.5") into smallest units at `decimals` precision.
///
/// Stricter than a plain `parse_units`: signs, exponents and excess precision are
/// rejected instead of being truncated or reinterpreted.
pub fn parse_units(value: &str, decimals: u8) -> Result<U256, UnitError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UnitError::Empty);
    }
    if value.starts_with('-') {
        return Err(UnitError::Negative(value.to_string()));
    }

    let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(UnitError::Malformed(value.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(UnitError::TooPrecise {
            value: value.to_string(),
            decimals,
        });
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let normalized = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };
    let parsed = alloy_parse_units(&normalized, decimals).map_err(|_| UnitError::Malformed(value.to_string()))?;
    Ok(parsed.into())
}

/// Format smallest units as a decimal string, trimming trailing zeros ("1500000000000000000" -> "1.5").
pub fn format_units(raw: U256, decimals: u8) -> String {
    match alloy_format_units(raw, decimals) {
        Ok(formatted) if formatted.contains('.') => formatted.trim_end_matches('0').trim_end_matches('.').to_string(),
        Ok(formatted) => formatted,
        // Only reachable for precisions beyond what a U256 can hold
        Err(_) => raw.to_string(),
    }
}
