// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

// Mapeia o CREATE TYPE lead_source do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source")]
pub enum LeadSource {
    Website,
    Referral,
    #[sqlx(rename = "Cold Call")]
    #[serde(rename = "Cold Call")]
    ColdCall,
    #[sqlx(rename = "Social Media")]
    #[serde(rename = "Social Media")]
    SocialMedia,
    #[sqlx(rename = "Email Campaign")]
    #[serde(rename = "Email Campaign")]
    EmailCampaign,
    Other,
}

// Mapeia o CREATE TYPE lead_status do banco.
// Won e Lost são terminais: o lead fica "fechado" (ver LeadService).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    #[sqlx(rename = "Proposal Sent")]
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Negotiation,
    Won,
    Lost,
    #[sqlx(rename = "On Hold")]
    #[serde(rename = "On Hold")]
    OnHold,
}

impl LeadStatus {
    // Won/Lost fecham o lead; qualquer outra escrita exige reopen explícito
    pub fn is_closed(&self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }

    pub const ALL: [LeadStatus; 8] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::ProposalSent,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
        LeadStatus::OnHold,
    ];
}

// Mapeia o CREATE TYPE priority_level do banco (compartilhado com callbacks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "priority_level")]
pub enum PriorityLevel {
    Low,
    Medium,
    High,
    Urgent,
}

// --- LEAD (O Dado) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    // Código sequencial legível (LEAD00001), gerado pelo banco
    #[schema(example = "LEAD00042")]
    pub lead_code: String,

    pub client_name: String,
    pub business_name: String,
    pub email: String,
    pub phone: String,
    pub alternate_phone: Option<String>,

    pub source: LeadSource,
    pub status: LeadStatus,
    pub priority: PriorityLevel,
    pub industry: Option<String>,
    pub website_url: Option<String>,
    #[schema(example = "2500.00")]
    pub expected_revenue: Decimal,

    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip_code: Option<String>,

    pub assigned_to: Uuid,
    pub assigned_by: Option<Uuid>,

    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,

    pub last_contacted_date: Option<DateTime<Utc>>,
    pub next_follow_up_date: Option<NaiveDate>,
    pub converted_to_customer: bool,
    pub converted_date: Option<DateTime<Utc>>,
    pub lost_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- FILTRO DE LISTAGEM ---

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub priority: Option<PriorityLevel>,
    pub source: Option<LeadSource>,
    pub assigned_to: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl LeadFilter {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}
