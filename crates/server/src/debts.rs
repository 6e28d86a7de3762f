//! Debt API endpoints

use api_types::debt::{
    BalanceView, DebtListResponse, DebtStatus as ApiStatus, DebtSummaryResponse, DebtView,
    NetBalanceView, NetBalancesResponse, SettleBatch, SettleBatchResponse,
    SettleOutcome as ApiOutcome, SettleResponse,
};
use api_types::{Currency, settlement::{SettleAction as ApiAction, SuggestionView}};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user};

pub(crate) fn view(record: &engine::DebtRecord) -> DebtView {
    DebtView {
        id: record.id,
        expense_id: record.expense_id,
        from_user_id: record.from_user_id.clone(),
        to_user_id: record.to_user_id.clone(),
        amount_minor: record.amount_minor,
        status: match record.status {
            engine::DebtStatus::Unsettled => ApiStatus::Unsettled,
            engine::DebtStatus::Settled => ApiStatus::Settled,
        },
        created_at: record.created_at,
    }
}

fn balance_views(balances: Vec<engine::AggregatedBalance>) -> Vec<BalanceView> {
    balances
        .into_iter()
        .map(|balance| BalanceView {
            counterparty_id: balance.counterparty_id,
            total_minor: balance.total_minor,
        })
        .collect()
}

/// Raw debt records the user is part of, both directions and statuses.
pub async fn list_for_user(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<DebtListResponse>, ServerError> {
    let records = state.engine.debts_for_user(&user_id).await?;

    Ok(Json(DebtListResponse {
        debts: records.iter().map(view).collect(),
    }))
}

/// Aggregated balances and settlement suggestions for one user.
pub async fn summary_for_user(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<DebtSummaryResponse>, ServerError> {
    let (summary, suggestions) = state.engine.debt_summary_for_user(&user_id).await?;

    let suggestions = suggestions
        .into_iter()
        .map(|s| SuggestionView {
            counterparty_id: s.counterparty_id,
            pay_minor: s.pay_minor,
            receive_minor: s.receive_minor,
            net_minor: s.net_minor,
            action: match s.action {
                engine::SettleAction::Pay => ApiAction::Pay,
                engine::SettleAction::Receive => ApiAction::Receive,
            },
        })
        .collect();

    Ok(Json(DebtSummaryResponse {
        currency: Currency::Vnd,
        payables: balance_views(summary.payables),
        receivables: balance_views(summary.receivables),
        total_payable_minor: summary.total_payable_minor,
        total_receivable_minor: summary.total_receivable_minor,
        net_minor: summary.net_minor,
        suggestions,
    }))
}

/// Per-member net positions over a group's unsettled debts.
pub async fn group_net_balances(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(group_id): Path<String>,
) -> Result<Json<NetBalancesResponse>, ServerError> {
    let nets = state.engine.net_balances_for_group(&group_id).await?;

    Ok(Json(NetBalancesResponse {
        balances: nets
            .into_iter()
            .map(|net| NetBalanceView {
                user_id: net.user_id,
                net_minor: net.net_minor,
            })
            .collect(),
    }))
}

pub async fn settle_one(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SettleResponse>, ServerError> {
    let outcome = state.engine.settle_one(id).await?;

    Ok(Json(SettleResponse {
        outcome: match outcome {
            engine::SettleOutcome::Settled => ApiOutcome::Settled,
            engine::SettleOutcome::AlreadySettled => ApiOutcome::AlreadySettled,
        },
    }))
}

pub async fn settle_batch(
    Extension(_user): Extension<user::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<SettleBatch>,
) -> Result<Json<SettleBatchResponse>, ServerError> {
    let settled_count = state.engine.settle_batch(&payload.debt_ids).await?;

    Ok(Json(SettleBatchResponse { settled_count }))
}
