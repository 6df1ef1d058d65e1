// src/models/transfer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Máquina de estados do handoff:
// Transferred -> {Accepted, Rejected}; Accepted -> Completed.
// Rejected e Completed são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transfer_status")]
pub enum TransferStatus {
    Transferred,
    Accepted,
    Rejected,
    Completed,
}

impl TransferStatus {
    // Em aberto = ainda bloqueia novas transferências do mesmo callback
    pub fn is_open(&self) -> bool {
        matches!(self, TransferStatus::Transferred | TransferStatus::Accepted)
    }

    pub fn allows_resolve(&self) -> bool {
        matches!(self, TransferStatus::Transferred)
    }

    pub fn allows_complete(&self) -> bool {
        matches!(self, TransferStatus::Accepted)
    }
}

// Decisão do destinatário sobre um transfer pendente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TransferDecision {
    Accept,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: Uuid,
    pub callback_id: Uuid,

    // Snapshot para exibição independente do callback/lead
    pub client_name: String,
    pub business_name: String,

    pub from_employee: Uuid,
    pub to_employee: Uuid,

    pub status: TransferStatus,
    pub remarks: Option<String>,

    pub transferred_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transferred_can_be_resolved() {
        assert!(TransferStatus::Transferred.allows_resolve());
        assert!(!TransferStatus::Accepted.allows_resolve());
        assert!(!TransferStatus::Rejected.allows_resolve());
        assert!(!TransferStatus::Completed.allows_resolve());
    }

    #[test]
    fn completion_only_follows_acceptance() {
        // Transferred -> Completed direto é proibido
        assert!(!TransferStatus::Transferred.allows_complete());
        assert!(TransferStatus::Accepted.allows_complete());
        assert!(!TransferStatus::Rejected.allows_complete());
        assert!(!TransferStatus::Completed.allows_complete());
    }

    #[test]
    fn open_means_transferred_or_accepted() {
        assert!(TransferStatus::Transferred.is_open());
        assert!(TransferStatus::Accepted.is_open());
        assert!(!TransferStatus::Rejected.is_open());
        assert!(!TransferStatus::Completed.is_open());
    }
}
