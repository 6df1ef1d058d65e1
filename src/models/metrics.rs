// src/models/metrics.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::callback::TimeBucket;
use crate::models::lead::LeadStatus;

// Projeções de leitura do agregador. Nada aqui é fonte de verdade:
// tudo é recalculado sob demanda a partir dos registros correntes.

// 1. Funil de leads (os cards do topo do kanban)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadFunnel {
    pub total_leads: usize,
    pub won_leads: usize,
    pub lost_leads: usize,
    #[schema(example = 50.0)]
    pub conversion_rate: f64, // Won / total, em %, uma casa decimal
    #[schema(example = 66.7)]
    pub win_rate: f64, // Won / (Won + Lost), em %, uma casa decimal
    #[schema(example = "400.00")]
    pub total_revenue: Decimal, // Receita esperada somada só dos Won
    #[schema(example = "200.00")]
    pub avg_deal_size: Decimal,
    pub by_status: Vec<StatusSlice>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusSlice {
    pub status: LeadStatus,
    pub count: usize,
    pub total_revenue: Decimal,
}

// 2. Carga de callbacks, por balde de tempo
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CallbackWorkload {
    pub total_callbacks: usize,
    pub pending_callbacks: usize,
    pub completed_callbacks: usize,
    pub overdue_callbacks: usize,
    pub today_callbacks: usize,
    #[schema(example = 42.9)]
    pub completion_rate: f64,
    pub by_bucket: Vec<BucketSlice>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketSlice {
    pub bucket: TimeBucket,
    pub count: usize,
}

// 3. Volume de transferências + ranking por funcionário
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferVolume {
    pub total_transfers: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub completed: usize,
    pub top_senders: Vec<LeaderboardEntry>,
    pub top_receivers: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub employee_id: Uuid,
    pub count: usize,
}
