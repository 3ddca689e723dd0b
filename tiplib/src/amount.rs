// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::Amount;
use crate::error::{Result, TipError};
use crate::token::TokenDescriptor;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Largest scale whose power of ten still fits in 256 bits.
const MAX_SCALE: usize = 77;
/// Resolution used when applying a percentage to a balance.
const RATIO_RESOLUTION: u64 = 1_000_000;
/// Percentages are rendered with this many decimal places.
const PERCENTAGE_SCALE: u8 = 2;

/// The preset "tip a penny" amount.
pub const DEFAULT_TIP_AMOUNT: DecimalAmount = DecimalAmount {
    value: Amount::from_limbs([1, 0, 0, 0]),
    scale: 2,
};

/// A non-negative decimal, stored as `value / 10^scale`.
///
/// The scale is kept as written, so `"0.10"` displays as `"0.10"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecimalAmount {
    value: Amount,
    scale: u8,
}

impl DecimalAmount {
    /// Wrap a raw amount expressed in a token's smallest units.
    pub fn from_smallest_units(raw: Amount, decimals: u8) -> Self {
        Self {
            value: raw,
            scale: decimals,
        }
    }

    /// The same amount with trailing fractional zeros removed.
    pub fn normalized(&self) -> Self {
        let ten = Amount::from(10);
        let mut value = self.value;
        let mut scale = self.scale;
        while scale > 0 && (value % ten).is_zero() {
            value /= ten;
            scale -= 1;
        }
        Self { value, scale }
    }

    /// Number of fractional digits that carry a value.
    pub fn significant_scale(&self) -> u8 {
        self.normalized().scale
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Scale the amount by `10^decimals`.
    pub fn to_smallest_units(&self, decimals: u8) -> Result<Amount> {
        let normalized = self.normalized();
        if normalized.scale > decimals {
            return Err(TipError::PrecisionExceeded { decimals });
        }
        let factor = Amount::from(10)
            .checked_pow(Amount::from(decimals - normalized.scale))
            .ok_or_else(|| TipError::InvalidAmount(format!("{self} is too large")))?;
        normalized
            .value
            .checked_mul(factor)
            .ok_or_else(|| TipError::InvalidAmount(format!("{self} is too large")))
    }
}

impl FromStr for DecimalAmount {
    type Err = TipError;

    fn from_str(value_str: &str) -> Result<Self> {
        let value_str = value_str.trim();
        if value_str.is_empty() {
            return Err(TipError::InvalidAmount("the amount is empty".to_string()));
        }
        if value_str.starts_with('-') {
            return Err(TipError::InvalidAmount(format!(
                "{value_str} is negative"
            )));
        }

        let mut itr = value_str.splitn(2, '.');
        let units = itr.next().unwrap_or_default();
        let remainder = itr.next().unwrap_or_default();

        let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (units.is_empty() && remainder.is_empty()) || !is_digits(units) || !is_digits(remainder)
        {
            return Err(TipError::InvalidAmount(format!(
                "{value_str} is not a number"
            )));
        }
        if remainder.len() > MAX_SCALE {
            return Err(TipError::InvalidAmount(format!(
                "{value_str} has too many decimal places"
            )));
        }

        let value = Amount::from_str_radix(&format!("{units}{remainder}"), 10)
            .map_err(|_| TipError::InvalidAmount(format!("{value_str} is too large")))?;

        Ok(Self {
            value,
            // MAX_SCALE fits in a u8
            scale: remainder.len() as u8,
        })
    }
}

impl Display for DecimalAmount {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        if self.scale == 0 {
            return write!(formatter, "{}", self.value);
        }
        // scale is capped at MAX_SCALE, so the divisor never overflows
        let divisor = Amount::from(10).pow(Amount::from(self.scale));
        let unit = self.value / divisor;
        let remainder = (self.value % divisor).to_string();
        let width = self.scale as usize;
        write!(formatter, "{unit}.{remainder:0>width$}")
    }
}

/// A fetched token balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Balance {
    pub raw: Amount,
    pub decimals: u8,
}

impl Balance {
    pub fn new(raw: Amount, decimals: u8) -> Self {
        Self { raw, decimals }
    }
}

impl Display for Balance {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", format_units(self.raw, self.decimals))
    }
}

/// Render a raw amount without trailing zeros, e.g. `10500000` at 6 decimals is `10.5`.
pub fn format_units(raw: Amount, decimals: u8) -> String {
    DecimalAmount::from_smallest_units(raw, decimals)
        .normalized()
        .to_string()
}

/// How the amount of a transfer is chosen.
#[derive(Clone, Copy, Debug)]
pub enum AmountMode<'a> {
    /// A preset amount; user input is ignored.
    Fixed(DecimalAmount),
    /// Free text typed by the user.
    Custom(&'a str),
    /// A share of the fetched balance, `ratio` in (0, 1].
    Percentage {
        balance: Option<&'a Balance>,
        ratio: f64,
    },
}

/// Compute the amount of a transfer of `token`.
pub fn resolve(mode: AmountMode<'_>, token: &TokenDescriptor) -> Result<DecimalAmount> {
    match mode {
        AmountMode::Fixed(amount) => Ok(amount),
        AmountMode::Custom(text) => {
            let amount = DecimalAmount::from_str(text)?;
            if amount.significant_scale() > token.decimals() {
                return Err(TipError::InvalidAmount(format!(
                    "{} supports at most {} decimal places",
                    token.symbol(),
                    token.decimals()
                )));
            }
            Ok(amount)
        }
        AmountMode::Percentage { balance, ratio } => {
            let balance = balance.ok_or(TipError::BalanceUnavailable)?;
            percentage_of(balance, ratio)
        }
    }
}

fn percentage_of(balance: &Balance, ratio: f64) -> Result<DecimalAmount> {
    if !ratio.is_finite() || ratio <= 0.0 || ratio > 1.0 {
        return Err(TipError::InvalidAmount(format!(
            "the ratio {ratio} is not within (0, 1]"
        )));
    }
    // ratio is within (0, 1], so the product is within 0..=RATIO_RESOLUTION
    let parts = Amount::from((ratio * RATIO_RESOLUTION as f64).round() as u64);
    let resolution = Amount::from(RATIO_RESOLUTION);

    let share = match balance.raw.checked_mul(parts) {
        Some(product) => product / resolution,
        None => balance.raw / resolution * parts,
    };

    let value = if balance.decimals >= PERCENTAGE_SCALE {
        share / Amount::from(10).pow(Amount::from(balance.decimals - PERCENTAGE_SCALE))
    } else {
        share * Amount::from(10).pow(Amount::from(PERCENTAGE_SCALE - balance.decimals))
    };

    Ok(DecimalAmount {
        value,
        scale: PERCENTAGE_SCALE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn usdc() -> TokenDescriptor {
        TokenDescriptor::usdc_base_sepolia()
    }

    #[test]
    fn from_str() -> Result<()> {
        assert_eq!("0.10", DecimalAmount::from_str("0.10")?.to_string());
        assert_eq!("12", DecimalAmount::from_str("12")?.to_string());
        assert_eq!("12", DecimalAmount::from_str("12.")?.to_string());
        assert_eq!("0.5", DecimalAmount::from_str(".5")?.to_string());
        assert_eq!("1.5", DecimalAmount::from_str("  1.5 ")?.to_string());

        assert_matches!(DecimalAmount::from_str(""), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("   "), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("."), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("abc"), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("0.0.0"), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("1e5"), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("-1"), Err(TipError::InvalidAmount(_)));
        assert_matches!(DecimalAmount::from_str("+1"), Err(TipError::InvalidAmount(_)));
        Ok(())
    }

    #[test]
    fn to_smallest_units() -> Result<()> {
        assert_eq!(
            Amount::from(100_000),
            DecimalAmount::from_str("0.10")?.to_smallest_units(6)?
        );
        assert_eq!(
            Amount::from(10_000),
            DEFAULT_TIP_AMOUNT.to_smallest_units(6)?
        );
        assert_eq!(
            Amount::from(1_000_000_000_000_000_000u64),
            DecimalAmount::from_str("1")?.to_smallest_units(18)?
        );
        // trailing zeros do not count toward precision
        assert_eq!(
            Amount::from(1_500_000),
            DecimalAmount::from_str("1.500000000")?.to_smallest_units(6)?
        );
        assert_eq!(
            Err(TipError::PrecisionExceeded { decimals: 6 }),
            DecimalAmount::from_str("0.0000001")?.to_smallest_units(6)
        );
        Ok(())
    }

    #[test]
    fn format_units_trims_trailing_zeros() {
        assert_eq!("10.5", format_units(Amount::from(10_500_000), 6));
        assert_eq!("0", format_units(Amount::ZERO, 6));
        assert_eq!("0.000001", format_units(Amount::from(1), 6));
        assert_eq!("3", format_units(Amount::from(3), 0));
    }

    #[test]
    fn fixed_mode_ignores_everything_else() -> Result<()> {
        let amount = resolve(AmountMode::Fixed(DEFAULT_TIP_AMOUNT), &usdc())?;
        assert_eq!("0.01", amount.to_string());
        Ok(())
    }

    #[test]
    fn custom_mode_rejects_bad_input() {
        for text in ["", "  ", "ten", "-1", "-0.5", "1,5", "0x10"] {
            assert_matches!(
                resolve(AmountMode::Custom(text), &usdc()),
                Err(TipError::InvalidAmount(_)),
                "{text:?} should be rejected"
            );
        }
        assert_matches!(
            resolve(AmountMode::Custom("0.0000001"), &usdc()),
            Err(TipError::InvalidAmount(_))
        );
    }

    #[test]
    fn custom_mode_accepts_numbers() -> Result<()> {
        assert_eq!("2.5", resolve(AmountMode::Custom("2.5"), &usdc())?.to_string());
        assert_eq!(
            "0.000001",
            resolve(AmountMode::Custom("0.000001"), &usdc())?.to_string()
        );
        Ok(())
    }

    #[test]
    fn percentage_of_balance() -> Result<()> {
        let balance = Balance::new(Amount::from(10_000_000), 6);

        let half = resolve(
            AmountMode::Percentage {
                balance: Some(&balance),
                ratio: 0.5,
            },
            &usdc(),
        )?;
        assert_eq!("5.00", half.to_string());

        let all = resolve(
            AmountMode::Percentage {
                balance: Some(&balance),
                ratio: 1.0,
            },
            &usdc(),
        )?;
        assert_eq!("10.00", all.to_string());

        // truncated toward zero
        let odd = Balance::new(Amount::from(3_339_999), 6);
        let third = resolve(
            AmountMode::Percentage {
                balance: Some(&odd),
                ratio: 1.0,
            },
            &usdc(),
        )?;
        assert_eq!("3.33", third.to_string());
        Ok(())
    }

    #[test]
    fn percentage_needs_a_balance_and_a_sane_ratio() {
        assert_eq!(
            Err(TipError::BalanceUnavailable),
            resolve(
                AmountMode::Percentage {
                    balance: None,
                    ratio: 0.5
                },
                &usdc()
            )
        );

        let balance = Balance::new(Amount::from(10_000_000), 6);
        for ratio in [0.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            assert_matches!(
                resolve(
                    AmountMode::Percentage {
                        balance: Some(&balance),
                        ratio
                    },
                    &usdc()
                ),
                Err(TipError::InvalidAmount(_))
            );
        }
    }

    #[test]
    fn percentage_with_few_decimals() -> Result<()> {
        let balance = Balance::new(Amount::from(7), 0);
        let amount = resolve(
            AmountMode::Percentage {
                balance: Some(&balance),
                ratio: 1.0,
            },
            &usdc(),
        )?;
        assert_eq!("7.00", amount.to_string());
        assert_eq!(Amount::from(7), amount.to_smallest_units(0)?);
        Ok(())
    }
}
