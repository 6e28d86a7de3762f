//! Expense API endpoints

use api_types::expense::{
    AllocationPolicy as ApiPolicy, ExpenseCreated, ExpenseDetailResponse, ExpenseNew,
    ExpenseUpdate, ParticipantInput as ApiParticipantInput, ParticipantShareView, ShareView,
    SharesSave,
};
use api_types::{Currency, debt::DebtListResponse, expense::ExpenseView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, debts, server::ServerState, user};

pub(crate) fn map_policy(policy: ApiPolicy) -> engine::AllocationPolicy {
    match policy {
        ApiPolicy::Equal => engine::AllocationPolicy::Equal,
        ApiPolicy::Exact => engine::AllocationPolicy::Exact,
        ApiPolicy::Percentage => engine::AllocationPolicy::Percentage,
        ApiPolicy::Shares => engine::AllocationPolicy::Shares,
    }
}

fn map_policy_view(policy: engine::AllocationPolicy) -> ApiPolicy {
    match policy {
        engine::AllocationPolicy::Equal => ApiPolicy::Equal,
        engine::AllocationPolicy::Exact => ApiPolicy::Exact,
        engine::AllocationPolicy::Percentage => ApiPolicy::Percentage,
        engine::AllocationPolicy::Shares => ApiPolicy::Shares,
    }
}

fn map_participant(input: ApiParticipantInput) -> engine::ParticipantInput {
    engine::ParticipantInput {
        user_id: input.user_id,
        included: input.included,
        raw_value: input.raw_value,
    }
}

fn share_views(shares: Vec<engine::Share>) -> Vec<ShareView> {
    shares
        .into_iter()
        .map(|share| ShareView {
            user_id: share.user_id,
            amount_minor: share.amount_minor,
        })
        .collect()
}

/// Share of the total as a 2-decimal percentage string, half-up.
fn percent_of(amount_minor: i64, total_minor: i64) -> String {
    let hundredths = (amount_minor as i128 * 10_000 + total_minor as i128 / 2)
        / total_minor as i128;
    engine::RawValue::new(hundredths as i64).to_string()
}

pub async fn create(
    Extension(user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let draft = engine::ExpenseDraft {
        group_id: payload.group_id,
        description: payload.description,
        amount_minor: payload.amount_minor,
        payer_id: payload.payer_id,
        policy: map_policy(payload.policy),
        participants: payload
            .participants
            .into_iter()
            .map(map_participant)
            .collect(),
        created_by: user.username.clone(),
        created_at: Utc::now(),
    };

    let (expense, shares) = state.engine.create_expense(draft).await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseCreated {
            id: expense.id,
            shares_revision: expense.shares_revision,
            shares: share_views(shares),
        }),
    ))
}

pub async fn detail(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExpenseDetailResponse>, ServerError> {
    let (expense, participants) = state.engine.expense_detail(id).await?;

    let participants = participants
        .into_iter()
        .map(|p| ParticipantShareView {
            user_id: p.user_id,
            included: p.included,
            raw_value: p.raw_value,
            share_amount_minor: p.share_amount_minor,
            percent: percent_of(p.share_amount_minor, expense.amount_minor),
        })
        .collect();

    Ok(Json(ExpenseDetailResponse {
        expense: ExpenseView {
            id: expense.id,
            group_id: expense.group_id,
            description: expense.description,
            amount_minor: expense.amount_minor,
            currency: Currency::Vnd,
            payer_id: expense.payer_id,
            policy: map_policy_view(expense.policy),
            created_by: expense.created_by,
            created_at: expense.created_at,
            shares_revision: expense.shares_revision,
        },
        participants,
    }))
}

pub async fn update(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseCreated>, ServerError> {
    let update = engine::ExpenseUpdate {
        description: payload.description,
        amount_minor: payload.amount_minor,
        payer_id: payload.payer_id,
        policy: map_policy(payload.policy),
        participants: payload
            .participants
            .into_iter()
            .map(map_participant)
            .collect(),
    };

    let (expense, shares) = state.engine.update_expense(id, update).await?;

    Ok(Json(ExpenseCreated {
        id: expense.id,
        shares_revision: expense.shares_revision,
        shares: share_views(shares),
    }))
}

/// Regenerates the expense's debt records, replacing the prior set.
pub async fn save_shares(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SharesSave>,
) -> Result<Json<DebtListResponse>, ServerError> {
    let records = state
        .engine
        .save_shares(payload.expense_id, payload.shares_revision, Utc::now())
        .await?;

    Ok(Json(DebtListResponse {
        debts: records.iter().map(debts::view).collect(),
    }))
}
