//! Debt record primitives.
//!
//! A `DebtRecord` is one directed obligation (ower → payer) produced from
//! a finalized allocation. Amount and endpoints are immutable once
//! created; only the status moves, and only forward
//! (`unsettled` → `settled`).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Share, expenses::Expense};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Unsettled,
    Settled,
}

impl DebtStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsettled => "unsettled",
            Self::Settled => "settled",
        }
    }
}

impl TryFrom<&str> for DebtStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "unsettled" => Ok(Self::Unsettled),
            "settled" => Ok(Self::Settled),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid debt status: {other}"
            ))),
        }
    }
}

/// Result of a settle call.
///
/// Settling an already-settled record is a no-op success, not an error;
/// the outcome tells the caller which of the two happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled,
    AlreadySettled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRecord {
    pub id: Uuid,
    pub expense_id: Uuid,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_minor: i64,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
}

impl DebtRecord {
    pub fn new(
        expense_id: Uuid,
        from_user_id: String,
        to_user_id: String,
        amount_minor: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if from_user_id == to_user_id {
            return Err(EngineError::InvalidParticipants(
                "a debt cannot point at its own ower".to_string(),
            ));
        }
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "debt amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            expense_id,
            from_user_id,
            to_user_id,
            amount_minor,
            status: DebtStatus::Unsettled,
            created_at,
        })
    }
}

/// Builds the directed debt set for an expense from its computed shares.
///
/// One record per included non-payer participant with a positive share.
/// The payer's own share never becomes a record, and neither does a zero
/// share (nothing is owed).
pub fn build_for_expense(
    expense: &Expense,
    shares: &[Share],
    created_at: DateTime<Utc>,
) -> ResultEngine<Vec<DebtRecord>> {
    shares
        .iter()
        .filter(|share| share.user_id != expense.payer_id && share.amount_minor > 0)
        .map(|share| {
            DebtRecord::new(
                expense.id,
                share.user_id.clone(),
                expense.payer_id.clone(),
                share.amount_minor,
                created_at,
            )
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub expense_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Expenses,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&DebtRecord> for ActiveModel {
    fn from(record: &DebtRecord) -> Self {
        Self {
            id: ActiveValue::Set(record.id.to_string()),
            expense_id: ActiveValue::Set(record.expense_id.to_string()),
            from_user_id: ActiveValue::Set(record.from_user_id.clone()),
            to_user_id: ActiveValue::Set(record.to_user_id.clone()),
            amount_minor: ActiveValue::Set(record.amount_minor),
            status: ActiveValue::Set(record.status.as_str().to_string()),
            created_at: ActiveValue::Set(record.created_at),
        }
    }
}

impl TryFrom<Model> for DebtRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("debt not exists".to_string()))?,
            expense_id: Uuid::parse_str(&model.expense_id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            amount_minor: model.amount_minor,
            status: DebtStatus::try_from(model.status.as_str())?,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::AllocationPolicy;

    use super::*;

    fn expense(payer: &str) -> Expense {
        Expense::new(
            "trip".to_string(),
            None,
            100_000,
            payer.to_string(),
            AllocationPolicy::Equal,
            payer.to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    fn share(user_id: &str, amount_minor: i64) -> Share {
        Share {
            user_id: user_id.to_string(),
            amount_minor,
        }
    }

    #[test]
    fn new_rejects_self_debt() {
        let result = DebtRecord::new(
            Uuid::new_v4(),
            "an".to_string(),
            "an".to_string(),
            100,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        assert!(matches!(result, Err(EngineError::InvalidParticipants(_))));
    }

    #[test]
    fn new_rejects_non_positive_amount() {
        let result = DebtRecord::new(
            Uuid::new_v4(),
            "an".to_string(),
            "binh".to_string(),
            0,
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn build_excludes_payer_share() {
        let expense = expense("an");
        let shares = vec![share("an", 40_000), share("binh", 30_000), share("chi", 30_000)];

        let records =
            build_for_expense(&expense, &shares, Utc.timestamp_opt(0, 0).unwrap()).unwrap();

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.to_user_id == "an"));
        assert!(records.iter().all(|r| r.from_user_id != r.to_user_id));
        assert_eq!(records[0].from_user_id, "binh");
        assert_eq!(records[1].from_user_id, "chi");
    }

    #[test]
    fn build_skips_zero_shares() {
        let expense = expense("an");
        let shares = vec![share("binh", 0), share("chi", 100_000)];

        let records =
            build_for_expense(&expense, &shares, Utc.timestamp_opt(0, 0).unwrap()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_user_id, "chi");
        assert_eq!(records[0].amount_minor, 100_000);
    }

    #[test]
    fn build_starts_records_unsettled() {
        let expense = expense("an");
        let records = build_for_expense(
            &expense,
            &[share("binh", 50_000)],
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(records[0].status, DebtStatus::Unsettled);
    }
}
