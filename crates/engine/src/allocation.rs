//! Share allocation primitives.
//!
//! [`allocate`] distributes an expense total across the included
//! participants under one of four policies, guaranteeing that the computed
//! shares sum exactly to the total. Rounding remainders are absorbed by the
//! last included participant in input order, which keeps results
//! deterministic and reproducible.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, money::RawValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    Equal,
    Exact,
    Percentage,
    Shares,
}

impl AllocationPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Exact => "exact",
            Self::Percentage => "percentage",
            Self::Shares => "shares",
        }
    }
}

impl TryFrom<&str> for AllocationPolicy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "exact" => Ok(Self::Exact),
            "percentage" => Ok(Self::Percentage),
            "shares" => Ok(Self::Shares),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid allocation policy: {other}"
            ))),
        }
    }
}

/// Per-participant allocation input.
///
/// `raw_value` is a decimal string whose meaning depends on the policy:
/// an exact amount (whole currency units), a percentage, or a share
/// weight. It is unused for [`AllocationPolicy::Equal`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantInput {
    pub user_id: String,
    pub included: bool,
    pub raw_value: Option<String>,
}

/// One participant's computed share of an expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share {
    pub user_id: String,
    pub amount_minor: i64,
}

/// Sum of included percentages must land within ±0.01 of 100.00.
const PERCENT_TOTAL_HUNDREDTHS: i64 = 100_00;
const PERCENT_TOLERANCE_HUNDREDTHS: i64 = 1;

/// Computes every included participant's share of `total_minor`.
///
/// The result covers the included participants only, in input order, and
/// always sums exactly to `total_minor`. Shares can be zero (an excluded
/// weight, a tiny percentage), never negative.
pub fn allocate(
    total_minor: i64,
    policy: AllocationPolicy,
    inputs: &[ParticipantInput],
) -> ResultEngine<Vec<Share>> {
    if total_minor <= 0 {
        return Err(EngineError::InvalidAmount(
            "total amount must be > 0".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for input in inputs {
        if !seen.insert(input.user_id.as_str()) {
            return Err(EngineError::InvalidParticipants(format!(
                "duplicate participant: {}",
                input.user_id
            )));
        }
    }

    let included: Vec<&ParticipantInput> = inputs.iter().filter(|i| i.included).collect();
    if included.is_empty() {
        return Err(EngineError::InvalidParticipants(
            "at least one participant must be included".to_string(),
        ));
    }

    let shares = match policy {
        AllocationPolicy::Equal => allocate_equal(total_minor, &included),
        AllocationPolicy::Exact => allocate_exact(&included)?,
        AllocationPolicy::Percentage => allocate_percentage(total_minor, &included)?,
        AllocationPolicy::Shares => allocate_weighted(total_minor, &included)?,
    };

    // Uniform reconciliation check. Equal/percentage/shares reconcile by
    // construction; exact inputs are taken as-is and can fail here.
    let actual: i64 = shares.iter().map(|s| s.amount_minor).sum();
    if actual != total_minor {
        return Err(EngineError::AmountMismatch {
            expected: total_minor,
            actual,
        });
    }

    Ok(shares)
}

fn allocate_equal(total_minor: i64, included: &[&ParticipantInput]) -> Vec<Share> {
    let count = included.len() as i64;
    let base = total_minor / count;

    included
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            let amount_minor = if idx as i64 == count - 1 {
                total_minor - base * (count - 1)
            } else {
                base
            };
            Share {
                user_id: input.user_id.clone(),
                amount_minor,
            }
        })
        .collect()
}

fn allocate_exact(included: &[&ParticipantInput]) -> ResultEngine<Vec<Share>> {
    included
        .iter()
        .map(|input| {
            let value = parse_raw(input, "exact amount")?;
            if !value.is_whole() {
                return Err(EngineError::InvalidAmount(format!(
                    "exact amount for {} must be whole currency units",
                    input.user_id
                )));
            }
            Ok(Share {
                user_id: input.user_id.clone(),
                amount_minor: value.whole_units(),
            })
        })
        .collect()
}

fn allocate_percentage(total_minor: i64, included: &[&ParticipantInput]) -> ResultEngine<Vec<Share>> {
    let mut percentages = Vec::with_capacity(included.len());
    for input in included {
        percentages.push(parse_raw(input, "percentage")?);
    }

    let sum: i64 = percentages.iter().map(|p| p.hundredths()).sum();
    if (sum - PERCENT_TOTAL_HUNDREDTHS).abs() > PERCENT_TOLERANCE_HUNDREDTHS {
        return Err(EngineError::InvalidPercentage(format!(
            "percentages sum to {}, expected 100.00",
            RawValue::new(sum)
        )));
    }

    let amounts = percentages
        .iter()
        .map(|p| round_half_up(total_minor, p.hundredths(), PERCENT_TOTAL_HUNDREDTHS))
        .collect::<ResultEngine<Vec<i64>>>()?;

    absorb_remainder(total_minor, included, amounts)
}

fn allocate_weighted(total_minor: i64, included: &[&ParticipantInput]) -> ResultEngine<Vec<Share>> {
    let mut weights = Vec::with_capacity(included.len());
    for input in included {
        weights.push(parse_raw(input, "share weight")?.hundredths());
    }

    let total_weight: i64 = weights.iter().sum();
    if total_weight == 0 {
        return Err(EngineError::InvalidParticipants(
            "share weights must not all be zero".to_string(),
        ));
    }

    let amounts = weights
        .iter()
        .map(|w| round_half_up(total_minor, *w, total_weight))
        .collect::<ResultEngine<Vec<i64>>>()?;

    absorb_remainder(total_minor, included, amounts)
}

fn parse_raw(input: &ParticipantInput, what: &str) -> ResultEngine<RawValue> {
    input
        .raw_value
        .as_deref()
        .ok_or_else(|| {
            EngineError::InvalidAmount(format!("{what} required for {}", input.user_id))
        })?
        .parse()
}

/// `total * numerator / denominator`, rounded half-up.
fn round_half_up(total: i64, numerator: i64, denominator: i64) -> ResultEngine<i64> {
    let scaled = total as i128 * numerator as i128;
    let rounded = (scaled + denominator as i128 / 2) / denominator as i128;
    i64::try_from(rounded)
        .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))
}

/// Replaces the last computed amount so the shares sum to `total_minor`.
fn absorb_remainder(
    total_minor: i64,
    included: &[&ParticipantInput],
    mut amounts: Vec<i64>,
) -> ResultEngine<Vec<Share>> {
    let allocated: i64 = amounts[..amounts.len() - 1].iter().sum();
    let remainder = total_minor - allocated;
    if remainder < 0 {
        return Err(EngineError::AmountMismatch {
            expected: total_minor,
            actual: allocated,
        });
    }
    *amounts
        .last_mut()
        .ok_or_else(|| EngineError::InvalidParticipants("no participants".to_string()))? =
        remainder;

    Ok(included
        .iter()
        .zip(amounts)
        .map(|(input, amount_minor)| Share {
            user_id: input.user_id.clone(),
            amount_minor,
        })
        .collect())
}
