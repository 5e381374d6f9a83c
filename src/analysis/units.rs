//! Smallest-unit to decimal conversion.
//!
//! All arithmetic is done on integers; nothing here goes through floating
//! point, so raw values of any size render exactly before rounding.

use alloy_primitives::U256;
use std::cmp::Ordering;

/// Decimal places of the native currency (wei per ether).
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest decimal count whose scale factor still fits in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

fn pow10(exponent: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exponent))
}

/// Render `raw / 10^decimals` with exactly `precision` fractional digits,
/// rounding half up.
///
/// `decimals` must not exceed [`MAX_DECIMALS`].
pub fn format_units(raw: U256, decimals: u8, precision: u8) -> String {
    let scale = pow10(decimals);
    let mut integer = raw / scale;
    let fraction = raw % scale;

    let digits = if decimals <= precision {
        let mut digits = if decimals == 0 {
            String::new()
        } else {
            format!("{:0>width$}", fraction.to_string(), width = decimals as usize)
        };
        digits.push_str(&"0".repeat((precision - decimals) as usize));
        digits
    } else {
        let divisor = pow10(decimals - precision);
        let mut kept = fraction / divisor;
        let dropped = fraction % divisor;
        // dropped >= divisor / 2, without overflowing on large scales
        if dropped >= divisor - dropped {
            kept += U256::from(1u64);
            if kept == pow10(precision) {
                integer += U256::from(1u64);
                kept = U256::ZERO;
            }
        }
        if precision == 0 {
            String::new()
        } else {
            format!("{:0>width$}", kept.to_string(), width = precision as usize)
        }
    };

    if digits.is_empty() {
        integer.to_string()
    } else {
        format!("{}.{}", integer, digits)
    }
}

/// Native amount with currency suffix, e.g. `0.2500 ETH`.
pub fn format_native(raw: U256, precision: u8, symbol: &str) -> String {
    format!("{} {}", format_units(raw, NATIVE_DECIMALS, precision), symbol)
}

/// A smallest-unit amount paired with its decimal count, ordered by the
/// decimal value it represents.
#[derive(Debug, Clone, Copy)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    /// `None` when `decimals` exceeds [`MAX_DECIMALS`].
    pub fn new(raw: U256, decimals: u8) -> Option<Self> {
        (decimals <= MAX_DECIMALS).then_some(Self { raw, decimals })
    }

    pub fn is_positive(&self) -> bool {
        !self.raw.is_zero()
    }

    pub fn format(&self, precision: u8) -> String {
        format_units(self.raw, self.decimals, precision)
    }

    fn split(&self) -> (U256, U256) {
        let scale = pow10(self.decimals);
        (self.raw / scale, self.raw % scale)
    }
}

impl Ord for TokenAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        let (self_int, self_frac) = self.split();
        let (other_int, other_frac) = other.split();

        self_int.cmp(&other_int).then_with(|| {
            // Align both fractions to the larger decimal count; each stays
            // below 10^MAX_DECIMALS.
            let width = self.decimals.max(other.decimals);
            let lhs = self_frac * pow10(width - self.decimals);
            let rhs = other_frac * pow10(width - other.decimals);
            lhs.cmp(&rhs)
        })
    }
}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TokenAmount {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TokenAmount {}
