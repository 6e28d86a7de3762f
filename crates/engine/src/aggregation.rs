//! Debt aggregation.
//!
//! Collapses raw directed debt records into per-counterparty balances:
//! what the user owes (payables), what the user is owed (receivables) and
//! the whole-ledger totals. Only unsettled records count. Counterparties
//! are grouped with a [`BTreeMap`], so output ordering is stable
//! (ascending id).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DebtRecord, DebtStatus};

/// One counterparty's summed unsettled amount on one side of the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedBalance {
    pub counterparty_id: String,
    pub total_minor: i64,
}

/// A user's aggregated debt position across the whole ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub payables: Vec<AggregatedBalance>,
    pub receivables: Vec<AggregatedBalance>,
    pub total_payable_minor: i64,
    pub total_receivable_minor: i64,
    pub net_minor: i64,
}

/// A member's net position within one record set (group screen).
///
/// Negative means the member still owes, positive means they are owed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetBalance {
    pub user_id: String,
    pub net_minor: i64,
}

/// Partitions `records` around `user_id` and sums per counterparty.
///
/// Records the user is not part of are ignored, as are settled ones. Each
/// counterparty appears at most once per side.
pub fn aggregate(user_id: &str, records: &[DebtRecord]) -> DebtSummary {
    let mut payables: BTreeMap<&str, i64> = BTreeMap::new();
    let mut receivables: BTreeMap<&str, i64> = BTreeMap::new();

    for record in records {
        if record.status != DebtStatus::Unsettled {
            continue;
        }
        if record.from_user_id == user_id {
            *payables.entry(record.to_user_id.as_str()).or_insert(0) += record.amount_minor;
        } else if record.to_user_id == user_id {
            *receivables.entry(record.from_user_id.as_str()).or_insert(0) += record.amount_minor;
        }
    }

    let payables = into_balances(payables);
    let receivables = into_balances(receivables);
    let total_payable_minor: i64 = payables.iter().map(|b| b.total_minor).sum();
    let total_receivable_minor: i64 = receivables.iter().map(|b| b.total_minor).sum();

    DebtSummary {
        payables,
        receivables,
        total_payable_minor,
        total_receivable_minor,
        net_minor: total_receivable_minor - total_payable_minor,
    }
}

/// Net position per member over a record set.
///
/// Every unsettled record credits its payee and debits its ower; members
/// whose credits and debits cancel still appear, with a zero net.
pub fn net_balances(records: &[DebtRecord]) -> Vec<NetBalance> {
    let mut nets: BTreeMap<&str, i64> = BTreeMap::new();

    for record in records {
        if record.status != DebtStatus::Unsettled {
            continue;
        }
        *nets.entry(record.to_user_id.as_str()).or_insert(0) += record.amount_minor;
        *nets.entry(record.from_user_id.as_str()).or_insert(0) -= record.amount_minor;
    }

    nets.into_iter()
        .map(|(user_id, net_minor)| NetBalance {
            user_id: user_id.to_string(),
            net_minor,
        })
        .collect()
}

fn into_balances(groups: BTreeMap<&str, i64>) -> Vec<AggregatedBalance> {
    groups
        .into_iter()
        .map(|(counterparty_id, total_minor)| AggregatedBalance {
            counterparty_id: counterparty_id.to_string(),
            total_minor,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn record(from: &str, to: &str, amount_minor: i64, status: DebtStatus) -> DebtRecord {
        DebtRecord {
            id: Uuid::new_v4(),
            expense_id: Uuid::new_v4(),
            from_user_id: from.to_string(),
            to_user_id: to.to_string(),
            amount_minor,
            status,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn groups_per_counterparty() {
        let records = vec![
            record("me", "an", 100, DebtStatus::Unsettled),
            record("me", "an", 50, DebtStatus::Unsettled),
            record("binh", "me", 30, DebtStatus::Unsettled),
        ];

        let summary = aggregate("me", &records);

        assert_eq!(
            summary.payables,
            vec![AggregatedBalance {
                counterparty_id: "an".to_string(),
                total_minor: 150,
            }]
        );
        assert_eq!(
            summary.receivables,
            vec![AggregatedBalance {
                counterparty_id: "binh".to_string(),
                total_minor: 30,
            }]
        );
        assert_eq!(summary.total_payable_minor, 150);
        assert_eq!(summary.total_receivable_minor, 30);
        assert_eq!(summary.net_minor, -120);
    }

    #[test]
    fn ignores_settled_records() {
        let records = vec![
            record("me", "an", 100, DebtStatus::Settled),
            record("me", "an", 40, DebtStatus::Unsettled),
        ];

        let summary = aggregate("me", &records);
        assert_eq!(summary.total_payable_minor, 40);
    }

    #[test]
    fn ignores_unrelated_records() {
        let records = vec![record("an", "binh", 100, DebtStatus::Unsettled)];
        let summary = aggregate("me", &records);
        assert!(summary.payables.is_empty());
        assert!(summary.receivables.is_empty());
        assert_eq!(summary.net_minor, 0);
    }

    #[test]
    fn counterparty_appears_once_per_side() {
        let records = vec![
            record("me", "an", 10, DebtStatus::Unsettled),
            record("me", "an", 20, DebtStatus::Unsettled),
            record("an", "me", 5, DebtStatus::Unsettled),
        ];

        let summary = aggregate("me", &records);
        assert_eq!(summary.payables.len(), 1);
        assert_eq!(summary.receivables.len(), 1);
    }

    #[test]
    fn net_balances_offset_to_zero() {
        let records = vec![
            record("an", "binh", 100, DebtStatus::Unsettled),
            record("binh", "an", 100, DebtStatus::Unsettled),
        ];

        let nets = net_balances(&records);
        assert_eq!(
            nets,
            vec![
                NetBalance {
                    user_id: "an".to_string(),
                    net_minor: 0,
                },
                NetBalance {
                    user_id: "binh".to_string(),
                    net_minor: 0,
                },
            ]
        );
    }

    #[test]
    fn net_balances_sum_to_zero() {
        let records = vec![
            record("an", "binh", 70, DebtStatus::Unsettled),
            record("chi", "binh", 30, DebtStatus::Unsettled),
            record("binh", "chi", 10, DebtStatus::Unsettled),
        ];

        let nets = net_balances(&records);
        assert_eq!(nets.iter().map(|n| n.net_minor).sum::<i64>(), 0);
        let binh = nets.iter().find(|n| n.user_id == "binh").unwrap();
        assert_eq!(binh.net_minor, 90);
    }
}
