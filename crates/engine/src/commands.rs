//! Command structs for engine operations.
//!
//! These types group parameters for expense writes, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{AllocationPolicy, ParticipantInput};

/// Create an expense and compute its shares.
#[derive(Clone, Debug)]
pub struct ExpenseDraft {
    pub group_id: String,
    pub description: Option<String>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub policy: AllocationPolicy,
    pub participants: Vec<ParticipantInput>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ExpenseDraft {
    #[must_use]
    pub fn new(
        group_id: impl Into<String>,
        payer_id: impl Into<String>,
        amount_minor: i64,
        policy: AllocationPolicy,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            description: None,
            amount_minor,
            payer_id: payer_id.into(),
            policy,
            participants: Vec::new(),
            created_by: created_by.into(),
            created_at,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn participants(mut self, participants: Vec<ParticipantInput>) -> Self {
        self.participants = participants;
        self
    }
}

/// Replace an expense's amount, policy and participant set.
///
/// Previously generated debt records are untouched until the next
/// `save_shares` call regenerates them.
#[derive(Clone, Debug)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount_minor: i64,
    pub payer_id: String,
    pub policy: AllocationPolicy,
    pub participants: Vec<ParticipantInput>,
}
