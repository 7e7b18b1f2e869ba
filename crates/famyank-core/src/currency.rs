//! # Currency Conversion
//!
//! The store prices everything in Ghana cedis. US dollar figures are shown
//! alongside for reference and derived with a fixed rate.
//!
//! ```text
//!   USD 45.00 ──× 12──► GHS 540.00
//!   GHS 1079.88 ──÷ 12, round half away──► USD 89.99
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{div_round_half_away, Money};

/// Fixed USD → GHS rate used for display and seed pricing.
pub const USD_TO_GHS_RATE: i64 = 12;

/// Currencies the store knows how to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export)]
pub enum Currency {
    /// Ghana cedi, the store currency.
    #[default]
    Ghs,
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Ghs => "GHS",
            Currency::Usd => "USD",
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Ghs => "GH₵",
            Currency::Usd => "$",
        }
    }

    /// Formats an amount with this currency's symbol.
    ///
    /// ## Example
    /// ```rust
    /// use famyank_core::currency::Currency;
    /// use famyank_core::money::Money;
    ///
    /// assert_eq!(Currency::Ghs.format(Money::from_cents(54_000)), "GH₵540.00");
    /// assert_eq!(Currency::Usd.format(Money::from_cents(-550)), "-$5.50");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.symbol(), Money::from_cents(-amount.cents()))
        } else {
            format!("{}{}", self.symbol(), amount)
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GHS" | "CEDI" => Ok(Currency::Ghs),
            "USD" | "DOLLAR" => Ok(Currency::Usd),
            other => Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("unknown currency '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts dollars to cedis. Exact, the rate is a whole number.
pub fn usd_to_ghs(usd: Money) -> Money {
    usd * USD_TO_GHS_RATE
}

/// Converts cedis to dollars, rounded to the nearest cent.
pub fn ghs_to_usd(ghs: Money) -> Money {
    Money::from_cents(div_round_half_away(ghs.cents() as i128, USD_TO_GHS_RATE as i128) as i64)
}

/// Converts between any two supported currencies.
pub fn convert(amount: Money, from: Currency, to: Currency) -> Money {
    match (from, to) {
        (Currency::Usd, Currency::Ghs) => usd_to_ghs(amount),
        (Currency::Ghs, Currency::Usd) => ghs_to_usd(amount),
        _ => amount,
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal major-unit amount, rounding to two places.
///
/// Digits past the second decimal are rounded half up, so `"45.999"`
/// becomes `46.00` and `"0.005"` becomes `0.01`.
///
/// ## Example
/// ```rust
/// use famyank_core::currency::money_round;
///
/// assert_eq!(money_round("89.99").unwrap().cents(), 8_999);
/// assert_eq!(money_round("45.999").unwrap().cents(), 4_600);
/// assert!(money_round("12.3.4").is_err());
/// ```
pub fn money_round(input: &str) -> Result<Money, ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "amount".to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let mut parts = digits.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(invalid("more than one decimal point"));
    }
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits before the decimal point"));
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits after the decimal point"));
    }

    let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
    let frac_bytes = fraction.as_bytes();
    let digit = |i: usize| frac_bytes.get(i).map(|b| (b - b'0') as i64).unwrap_or(0);
    let mut minor = digit(0) * 10 + digit(1);
    if digit(2) >= 5 {
        minor += 1;
    }

    let cents = whole
        .checked_mul(100)
        .and_then(|c| c.checked_add(minor))
        .ok_or_else(|| invalid("amount too large"))?;

    Ok(Money::from_cents(if negative { -cents } else { cents }))
}

// =============================================================================
// Unit Tests
// =============================================================================
