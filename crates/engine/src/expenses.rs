//! Expense primitives.
//!
//! An `Expense` is the unit of allocation: one total amount, one payer and
//! a participant set split under an [`AllocationPolicy`]. Its debt records
//! are regenerated as a whole (never patched row by row), guarded by
//! `shares_revision`.
//!
//! [`AllocationPolicy`]: crate::AllocationPolicy

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AllocationPolicy, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub group_id: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub policy: AllocationPolicy,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Optimistic-lock counter for the debt-replacement workflow.
    ///
    /// Bumped every time the debt set is regenerated; a save against a
    /// stale revision is rejected instead of overwriting.
    pub shares_revision: i32,
}

impl Expense {
    pub fn new(
        group_id: String,
        description: Option<String>,
        amount_minor: i64,
        payer_id: String,
        policy: AllocationPolicy,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if group_id.is_empty() {
            return Err(EngineError::InvalidParticipants(
                "group_id must not be empty".to_string(),
            ));
        }
        if payer_id.is_empty() {
            return Err(EngineError::InvalidParticipants(
                "payer_id must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            description,
            amount_minor,
            payer_id,
            policy,
            created_by,
            created_at,
            shares_revision: 0,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub policy: String,
    pub created_by: String,
    pub created_at: DateTimeUtc,
    pub shares_revision: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::debts::Entity")]
    Debts,
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
}

impl Related<super::debts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Debts.def()
    }
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            group_id: ActiveValue::Set(expense.group_id.clone()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            payer_id: ActiveValue::Set(expense.payer_id.clone()),
            policy: ActiveValue::Set(expense.policy.as_str().to_string()),
            created_by: ActiveValue::Set(expense.created_by.clone()),
            created_at: ActiveValue::Set(expense.created_at),
            shares_revision: ActiveValue::Set(expense.shares_revision),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            group_id: model.group_id,
            description: model.description,
            amount_minor: model.amount_minor,
            payer_id: model.payer_id,
            policy: AllocationPolicy::try_from(model.policy.as_str())?,
            created_by: model.created_by,
            created_at: model.created_at,
            shares_revision: model.shares_revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn new_rejects_non_positive_amount() {
        let result = Expense::new(
            "trip".to_string(),
            None,
            0,
            "an".to_string(),
            AllocationPolicy::Equal,
            "an".to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        );
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }

    #[test]
    fn new_starts_at_revision_zero() {
        let expense = Expense::new(
            "trip".to_string(),
            Some("Dinner".to_string()),
            120_000,
            "an".to_string(),
            AllocationPolicy::Equal,
            "an".to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(expense.shares_revision, 0);
    }

    #[test]
    fn model_round_trip() {
        let expense = Expense::new(
            "trip".to_string(),
            Some("Dinner".to_string()),
            120_000,
            "an".to_string(),
            AllocationPolicy::Percentage,
            "binh".to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap();

        let model = Model {
            id: expense.id.to_string(),
            group_id: expense.group_id.clone(),
            description: expense.description.clone(),
            amount_minor: expense.amount_minor,
            payer_id: expense.payer_id.clone(),
            policy: expense.policy.as_str().to_string(),
            created_by: expense.created_by.clone(),
            created_at: expense.created_at,
            shares_revision: expense.shares_revision,
        };
        assert_eq!(Expense::try_from(model).unwrap(), expense);
    }
}
