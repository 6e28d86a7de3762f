use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Vnd,
}

pub mod expense {
    use super::*;

    /// How an expense total maps onto per-participant shares.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum AllocationPolicy {
        Equal,
        Exact,
        Percentage,
        Shares,
    }

    /// One participant's allocation input.
    ///
    /// `raw_value` is a decimal string with at most 2 fractional digits;
    /// its meaning depends on the policy (exact amount, percentage or
    /// share weight). Unused for `EQUAL`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantInput {
        pub user_id: String,
        pub included: bool,
        pub raw_value: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub group_id: String,
        pub description: Option<String>,
        /// Whole minor currency units (VND), must be > 0.
        pub amount_minor: i64,
        pub payer_id: String,
        pub policy: AllocationPolicy,
        pub participants: Vec<ParticipantInput>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub amount_minor: i64,
        pub payer_id: String,
        pub policy: AllocationPolicy,
        pub participants: Vec<ParticipantInput>,
    }

    /// A computed share, as returned from create/update.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub user_id: String,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub id: Uuid,
        /// Pass this back to `/expenseShares/save`.
        pub shares_revision: i32,
        pub shares: Vec<ShareView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub group_id: String,
        pub description: Option<String>,
        pub amount_minor: i64,
        pub currency: Currency,
        pub payer_id: String,
        pub policy: AllocationPolicy,
        pub created_by: String,
        pub created_at: DateTime<Utc>,
        pub shares_revision: i32,
    }

    /// A stored participant row with its computed share.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantShareView {
        pub user_id: String,
        pub included: bool,
        pub raw_value: Option<String>,
        pub share_amount_minor: i64,
        /// Share of the total, derived, formatted with 2 decimals.
        pub percent: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseDetailResponse {
        pub expense: ExpenseView,
        pub participants: Vec<ParticipantShareView>,
    }

    /// Request body for regenerating an expense's debt records.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SharesSave {
        pub expense_id: Uuid,
        /// Revision read from the expense; a stale value is rejected.
        pub shares_revision: i32,
    }
}

pub mod debt {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum DebtStatus {
        Unsettled,
        Settled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DebtView {
        pub id: Uuid,
        pub expense_id: Uuid,
        pub from_user_id: String,
        pub to_user_id: String,
        pub amount_minor: i64,
        pub status: DebtStatus,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DebtListResponse {
        pub debts: Vec<DebtView>,
    }

    /// One counterparty's summed unsettled amount on one side.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub counterparty_id: String,
        pub total_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DebtSummaryResponse {
        pub currency: Currency,
        pub payables: Vec<BalanceView>,
        pub receivables: Vec<BalanceView>,
        pub total_payable_minor: i64,
        pub total_receivable_minor: i64,
        pub net_minor: i64,
        pub suggestions: Vec<super::settlement::SuggestionView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NetBalanceView {
        pub user_id: String,
        /// Negative: still owes the group. Positive: is owed.
        pub net_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NetBalancesResponse {
        pub balances: Vec<NetBalanceView>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum SettleOutcome {
        Settled,
        AlreadySettled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleResponse {
        pub outcome: SettleOutcome,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleBatch {
        pub debt_ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettleBatchResponse {
        /// Records that actually transitioned; already settled ids in the
        /// batch are skipped, not counted.
        pub settled_count: u64,
    }
}

pub mod settlement {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum SettleAction {
        Pay,
        Receive,
    }

    /// A proposed net transfer collapsing a bidirectional debt.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionView {
        pub counterparty_id: String,
        pub pay_minor: i64,
        pub receive_minor: i64,
        pub net_minor: i64,
        pub action: SettleAction,
    }
}
