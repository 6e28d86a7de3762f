//! Settlement suggestions.
//!
//! Detects counterparties with debts in both directions and proposes the
//! single net transfer that clears the pair. Counterparties present on
//! only one side need no suggestion (the balance itself is the answer),
//! and perfectly offset pairs are omitted: there is no transfer to make.
//!
//! This is strictly two-party netting. Cycles across three or more
//! members are out of scope.

use serde::{Deserialize, Serialize};

use crate::AggregatedBalance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleAction {
    Pay,
    Receive,
}

/// One proposed net transfer against a single counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSuggestion {
    pub counterparty_id: String,
    pub pay_minor: i64,
    pub receive_minor: i64,
    pub net_minor: i64,
    pub action: SettleAction,
}

/// Proposes one net transfer per counterparty owing in both directions.
///
/// Input ordering of `payables` is preserved in the output.
pub fn suggest(
    payables: &[AggregatedBalance],
    receivables: &[AggregatedBalance],
) -> Vec<SettlementSuggestion> {
    payables
        .iter()
        .filter_map(|payable| {
            let receivable = receivables
                .iter()
                .find(|r| r.counterparty_id == payable.counterparty_id)?;

            let diff = receivable.total_minor - payable.total_minor;
            if diff == 0 {
                return None;
            }

            Some(SettlementSuggestion {
                counterparty_id: payable.counterparty_id.clone(),
                pay_minor: payable.total_minor,
                receive_minor: receivable.total_minor,
                net_minor: diff.abs(),
                action: if diff > 0 {
                    SettleAction::Receive
                } else {
                    SettleAction::Pay
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(counterparty_id: &str, total_minor: i64) -> AggregatedBalance {
        AggregatedBalance {
            counterparty_id: counterparty_id.to_string(),
            total_minor,
        }
    }

    #[test]
    fn cross_debt_nets_to_single_payment() {
        let payables = vec![balance("an", 200)];
        let receivables = vec![balance("an", 120)];

        let suggestions = suggest(&payables, &receivables);
        assert_eq!(
            suggestions,
            vec![SettlementSuggestion {
                counterparty_id: "an".to_string(),
                pay_minor: 200,
                receive_minor: 120,
                net_minor: 80,
                action: SettleAction::Pay,
            }]
        );
    }

    #[test]
    fn cross_debt_in_users_favor_suggests_receive() {
        let payables = vec![balance("an", 50)];
        let receivables = vec![balance("an", 90)];

        let suggestions = suggest(&payables, &receivables);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].action, SettleAction::Receive);
        assert_eq!(suggestions[0].net_minor, 40);
    }

    #[test]
    fn one_sided_debts_produce_nothing() {
        let payables = vec![balance("an", 200)];
        let receivables = vec![balance("binh", 120)];

        assert!(suggest(&payables, &receivables).is_empty());
    }

    #[test]
    fn fully_offset_pair_is_omitted() {
        let payables = vec![balance("an", 150)];
        let receivables = vec![balance("an", 150)];

        assert!(suggest(&payables, &receivables).is_empty());
    }

    #[test]
    fn suggests_per_counterparty() {
        let payables = vec![balance("an", 100), balance("binh", 30)];
        let receivables = vec![balance("binh", 90), balance("chi", 10)];

        let suggestions = suggest(&payables, &receivables);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].counterparty_id, "binh");
        assert_eq!(suggestions[0].net_minor, 60);
        assert_eq!(suggestions[0].action, SettleAction::Receive);
    }
}
