use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

pub use aggregation::{AggregatedBalance, DebtSummary, NetBalance, aggregate, net_balances};
pub use allocation::{AllocationPolicy, ParticipantInput, Share, allocate};
pub use commands::{ExpenseDraft, ExpenseUpdate};
pub use debts::{DebtRecord, DebtStatus, SettleOutcome, build_for_expense};
pub use error::EngineError;
pub use expenses::Expense;
pub use money::RawValue;
pub use participants::ParticipantShare;
pub use settlement::{SettleAction, SettlementSuggestion, suggest};

mod aggregation;
mod allocation;
mod commands;
mod debts;
mod error;
mod expenses;
mod money;
mod participants;
mod settlement;

type ResultEngine<T> = Result<T, EngineError>;

/// Store-backed ledger operations.
///
/// All computation (allocation, aggregation, suggestions) is pure and
/// lives in the sibling modules; `Engine` only wires it to the debt store.
/// Every call is stateless and takes its acting ids explicitly.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Creates an expense and computes its shares.
    ///
    /// Persists the expense and its participant rows; debt records are not
    /// generated yet. Callers review the computed shares, then finalize
    /// them with [`save_shares`].
    ///
    /// [`save_shares`]: Engine::save_shares
    pub async fn create_expense(&self, draft: ExpenseDraft) -> ResultEngine<(Expense, Vec<Share>)> {
        let expense = Expense::new(
            draft.group_id,
            draft.description,
            draft.amount_minor,
            draft.payer_id,
            draft.policy,
            draft.created_by,
            draft.created_at,
        )?;
        let shares = allocation::allocate(expense.amount_minor, expense.policy, &draft.participants)?;
        let rows = participant_rows(&expense, &draft.participants, &shares);

        let db_tx = self.database.begin().await?;
        expenses::ActiveModel::from(&expense).insert(&db_tx).await?;
        for row in &rows {
            participants::ActiveModel::from(row).insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        Ok((expense, shares))
    }

    /// Replaces an expense's amount, policy and participant set.
    ///
    /// Debt records stay as they are until the caller saves shares again;
    /// group, creator and revision are immutable here.
    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        update: ExpenseUpdate,
    ) -> ResultEngine<(Expense, Vec<Share>)> {
        if update.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        if update.payer_id.is_empty() {
            return Err(EngineError::InvalidParticipants(
                "payer_id must not be empty".to_string(),
            ));
        }

        let db_tx = self.database.begin().await?;
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        let mut expense = Expense::try_from(model)?;

        expense.description = update.description;
        expense.amount_minor = update.amount_minor;
        expense.payer_id = update.payer_id;
        expense.policy = update.policy;

        let shares = allocation::allocate(expense.amount_minor, expense.policy, &update.participants)?;
        let rows = participant_rows(&expense, &update.participants, &shares);

        let expense_active = expenses::ActiveModel {
            id: ActiveValue::Set(expense.id.to_string()),
            description: ActiveValue::Set(expense.description.clone()),
            amount_minor: ActiveValue::Set(expense.amount_minor),
            payer_id: ActiveValue::Set(expense.payer_id.clone()),
            policy: ActiveValue::Set(expense.policy.as_str().to_string()),
            ..Default::default()
        };
        expense_active.update(&db_tx).await?;

        participants::Entity::delete_many()
            .filter(participants::Column::ExpenseId.eq(expense_id.to_string()))
            .exec(&db_tx)
            .await?;
        for row in &rows {
            participants::ActiveModel::from(row).insert(&db_tx).await?;
        }
        db_tx.commit().await?;

        Ok((expense, shares))
    }

    /// Returns an expense with its participant shares, in input order.
    pub async fn expense_detail(
        &self,
        expense_id: Uuid,
    ) -> ResultEngine<(Expense, Vec<ParticipantShare>)> {
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        let expense = Expense::try_from(model)?;

        let rows = participants::Entity::find()
            .filter(participants::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(participants::Column::Position)
            .all(&self.database)
            .await?;
        let shares = rows
            .into_iter()
            .map(ParticipantShare::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok((expense, shares))
    }

    /// Regenerates the expense's debt records, replacing the prior set.
    ///
    /// Re-allocates from the stored participant inputs, deletes the old
    /// records and inserts the new ones in a single transaction, then bumps
    /// `shares_revision`. A stale `expected_revision` means someone else
    /// regenerated in between; the call fails without touching anything and
    /// the caller must re-read.
    pub async fn save_shares(
        &self,
        expense_id: Uuid,
        expected_revision: i32,
        generated_at: DateTime<Utc>,
    ) -> ResultEngine<Vec<DebtRecord>> {
        let db_tx = self.database.begin().await?;
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(&db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("expense not exists".to_string()))?;
        let expense = Expense::try_from(model)?;

        if expense.shares_revision != expected_revision {
            return Err(EngineError::ConcurrentModification(format!(
                "expense revision is {}, got {expected_revision}",
                expense.shares_revision
            )));
        }

        let participant_models = participants::Entity::find()
            .filter(participants::Column::ExpenseId.eq(expense_id.to_string()))
            .order_by_asc(participants::Column::Position)
            .all(&db_tx)
            .await?;
        let inputs: Vec<ParticipantInput> = participant_models
            .into_iter()
            .map(ParticipantShare::try_from)
            .collect::<ResultEngine<Vec<_>>>()?
            .iter()
            .map(ParticipantShare::as_input)
            .collect();

        let shares = allocation::allocate(expense.amount_minor, expense.policy, &inputs)?;
        let records = debts::build_for_expense(&expense, &shares, generated_at)?;

        debts::Entity::delete_many()
            .filter(debts::Column::ExpenseId.eq(expense_id.to_string()))
            .exec(&db_tx)
            .await?;
        for record in &records {
            debts::ActiveModel::from(record).insert(&db_tx).await?;
        }

        let expense_active = expenses::ActiveModel {
            id: ActiveValue::Set(expense.id.to_string()),
            shares_revision: ActiveValue::Set(expense.shares_revision + 1),
            ..Default::default()
        };
        expense_active.update(&db_tx).await?;

        db_tx.commit().await?;
        Ok(records)
    }

    /// Lists every debt record the user is part of, newest first.
    ///
    /// Both directions and both statuses are included; aggregation filters
    /// on its own.
    pub async fn debts_for_user(&self, user_id: &str) -> ResultEngine<Vec<DebtRecord>> {
        let rows = debts::Entity::find()
            .filter(
                Condition::any()
                    .add(debts::Column::FromUserId.eq(user_id))
                    .add(debts::Column::ToUserId.eq(user_id)),
            )
            .order_by_desc(debts::Column::CreatedAt)
            .all(&self.database)
            .await?;

        rows.into_iter().map(DebtRecord::try_from).collect()
    }

    /// Aggregated balances and settlement suggestions for one user.
    pub async fn debt_summary_for_user(
        &self,
        user_id: &str,
    ) -> ResultEngine<(DebtSummary, Vec<SettlementSuggestion>)> {
        let records = self.debts_for_user(user_id).await?;
        let summary = aggregation::aggregate(user_id, &records);
        let suggestions = settlement::suggest(&summary.payables, &summary.receivables);
        Ok((summary, suggestions))
    }

    /// Per-member net positions over a group's unsettled debts.
    pub async fn net_balances_for_group(&self, group_id: &str) -> ResultEngine<Vec<NetBalance>> {
        let rows = debts::Entity::find()
            .join(JoinType::InnerJoin, debts::Relation::Expenses.def())
            .filter(expenses::Column::GroupId.eq(group_id))
            .all(&self.database)
            .await?;
        let records = rows
            .into_iter()
            .map(DebtRecord::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(aggregation::net_balances(&records))
    }

    /// Settles a single debt record.
    ///
    /// The update is conditional on the record still being unsettled, so a
    /// concurrent settle cannot be applied twice. An already settled record
    /// is reported as [`SettleOutcome::AlreadySettled`] and left untouched.
    pub async fn settle_one(&self, debt_id: Uuid) -> ResultEngine<SettleOutcome> {
        let result = debts::Entity::update_many()
            .col_expr(
                debts::Column::Status,
                Expr::value(DebtStatus::Settled.as_str()),
            )
            .filter(debts::Column::Id.eq(debt_id.to_string()))
            .filter(debts::Column::Status.eq(DebtStatus::Unsettled.as_str()))
            .exec(&self.database)
            .await?;

        if result.rows_affected == 1 {
            return Ok(SettleOutcome::Settled);
        }

        match debts::Entity::find_by_id(debt_id.to_string())
            .one(&self.database)
            .await?
        {
            Some(_) => Ok(SettleOutcome::AlreadySettled),
            None => Err(EngineError::KeyNotFound("debt not exists".to_string())),
        }
    }

    /// Settles a batch of debt records, all or nothing.
    ///
    /// If any id is unknown the whole batch fails with the offending ids
    /// and no record is mutated. Already settled ids inside a valid batch
    /// are skipped. Returns how many records actually transitioned.
    pub async fn settle_batch(&self, debt_ids: &[Uuid]) -> ResultEngine<u64> {
        if debt_ids.is_empty() {
            return Ok(0);
        }

        let unique: Vec<String> = debt_ids
            .iter()
            .map(ToString::to_string)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let db_tx = self.database.begin().await?;
        let found = debts::Entity::find()
            .filter(debts::Column::Id.is_in(unique.clone()))
            .all(&db_tx)
            .await?;

        if found.len() != unique.len() {
            let present: HashSet<&str> = found.iter().map(|model| model.id.as_str()).collect();
            let missing: Vec<Uuid> = unique
                .iter()
                .filter(|id| !present.contains(id.as_str()))
                .filter_map(|id| Uuid::parse_str(id).ok())
                .collect();
            return Err(EngineError::MissingDebts(missing));
        }

        let result = debts::Entity::update_many()
            .col_expr(
                debts::Column::Status,
                Expr::value(DebtStatus::Settled.as_str()),
            )
            .filter(debts::Column::Id.is_in(unique))
            .filter(debts::Column::Status.eq(DebtStatus::Unsettled.as_str()))
            .exec(&db_tx)
            .await?;
        db_tx.commit().await?;

        Ok(result.rows_affected)
    }
}

fn participant_rows(
    expense: &Expense,
    inputs: &[ParticipantInput],
    shares: &[Share],
) -> Vec<ParticipantShare> {
    inputs
        .iter()
        .enumerate()
        .map(|(idx, input)| {
            // Excluded participants keep their row (and raw value) with a
            // zero share, so an edit can re-include them.
            let share_amount_minor = shares
                .iter()
                .find(|share| share.user_id == input.user_id)
                .map_or(0, |share| share.amount_minor);
            ParticipantShare {
                expense_id: expense.id,
                user_id: input.user_id.clone(),
                included: input.included,
                raw_value: input.raw_value.clone(),
                position: idx as i32,
                share_amount_minor,
            }
        })
        .collect()
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
        }
    }
}
