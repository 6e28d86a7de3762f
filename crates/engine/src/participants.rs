//! Participant rows of an expense.
//!
//! Each row stores a participant's allocation input (inclusion flag and
//! raw value) together with the computed share, in input order. The stored
//! order matters: remainder absorption targets the last included
//! participant, so regeneration must see the same ordering the allocation
//! saw.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, ParticipantInput};

/// A participant's stored input and computed share for one expense.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantShare {
    pub expense_id: Uuid,
    pub user_id: String,
    pub included: bool,
    pub raw_value: Option<String>,
    pub position: i32,
    pub share_amount_minor: i64,
}

impl ParticipantShare {
    pub fn as_input(&self) -> ParticipantInput {
        ParticipantInput {
            user_id: self.user_id.clone(),
            included: self.included,
            raw_value: self.raw_value.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub expense_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub included: bool,
    pub raw_value: Option<String>,
    pub position: i32,
    pub share_amount_minor: i64,
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

impl From<&ParticipantShare> for ActiveModel {
    fn from(share: &ParticipantShare) -> Self {
        Self {
            expense_id: ActiveValue::Set(share.expense_id.to_string()),
            user_id: ActiveValue::Set(share.user_id.clone()),
            included: ActiveValue::Set(share.included),
            raw_value: ActiveValue::Set(share.raw_value.clone()),
            position: ActiveValue::Set(share.position),
            share_amount_minor: ActiveValue::Set(share.share_amount_minor),
        }
    }
}

impl TryFrom<Model> for ParticipantShare {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            expense_id: Uuid::parse_str(&model.expense_id)
                .map_err(|_| EngineError::KeyNotFound("expense not exists".to_string()))?,
            user_id: model.user_id,
            included: model.included,
            raw_value: model.raw_value,
            position: model.position,
            share_amount_minor: model.share_amount_minor,
        })
    }
}
