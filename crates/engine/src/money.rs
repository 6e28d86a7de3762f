use std::{fmt, str::FromStr};

use crate::EngineError;

/// Non-negative decimal input represented as **integer hundredths**.
///
/// Allocation inputs arrive as decimal strings with at most two fractional
/// digits (exact amounts, percentages, share weights). Parsing them into
/// hundredths keeps every downstream computation in integer arithmetic and
/// avoids binary-float rounding artifacts.
///
/// # Examples
///
/// ```rust
/// use engine::RawValue;
///
/// let pct = "33.33".parse::<RawValue>().unwrap();
/// assert_eq!(pct.hundredths(), 3333);
/// assert_eq!(pct.to_string(), "33.33");
/// ```
///
/// Accepts `.` or `,` as decimal separator; rejects more than 2 decimals
/// and negative values:
///
/// ```rust
/// use engine::RawValue;
///
/// assert_eq!("10".parse::<RawValue>().unwrap().hundredths(), 1000);
/// assert_eq!("10,5".parse::<RawValue>().unwrap().hundredths(), 1050);
/// assert!("12.345".parse::<RawValue>().is_err());
/// assert!("-1".parse::<RawValue>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawValue(i64);

impl RawValue {
    pub const ZERO: RawValue = RawValue(0);

    /// Creates a new value from integer hundredths.
    #[must_use]
    pub const fn new(hundredths: i64) -> Self {
        Self(hundredths)
    }

    /// Returns the raw value in hundredths.
    #[must_use]
    pub const fn hundredths(self) -> i64 {
        self.0
    }

    /// Returns `true` if the value is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the value has no fractional part.
    #[must_use]
    pub const fn is_whole(self) -> bool {
        self.0 % 100 == 0
    }

    /// Returns the value truncated to whole units.
    ///
    /// Only meaningful when [`is_whole`] holds (exact-amount inputs).
    ///
    /// [`is_whole`]: RawValue::is_whole
    #[must_use]
    pub const fn whole_units(self) -> i64 {
        self.0 / 100
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.0 / 100;
        let frac = self.0 % 100;
        write!(f, "{units}.{frac:02}")
    }
}

impl FromStr for RawValue {
    type Err = EngineError;

    /// Parses a decimal string into hundredths.
    ///
    /// Accepts `.` or `,` as decimal separator.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects negative, empty and otherwise invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty value".to_string());
        let invalid = || EngineError::InvalidAmount("invalid value".to_string());
        let overflow = || EngineError::InvalidAmount("value too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }
        if trimmed.starts_with('-') {
            return Err(EngineError::InvalidAmount(
                "negative values are not allowed".to_string(),
            ));
        }
        let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Err(empty());
        }

        let normalized = trimmed.replace(',', ".");
        let mut parts = normalized.split('.');
        let units_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if units_str.is_empty() || !units_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| invalid())?;

        let hundredths: i64 = match frac_str {
            None => 0,
            Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    0 => 0,
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    2 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => {
                        return Err(EngineError::InvalidAmount(
                            "too many decimals".to_string(),
                        ));
                    }
                }
            }
        };

        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(hundredths))
            .map(RawValue)
            .ok_or_else(overflow)
    }
}
