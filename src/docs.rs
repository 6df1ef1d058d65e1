// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::list_employees,

        // --- Leads ---
        handlers::leads::create_lead,
        handlers::leads::list_leads,
        handlers::leads::lookup_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::update_lead_status,
        handlers::leads::reassign_lead,
        handlers::leads::delete_lead,

        // --- Callbacks ---
        handlers::callbacks::create_callback,
        handlers::callbacks::list_callbacks,
        handlers::callbacks::get_callback,
        handlers::callbacks::update_callback,
        handlers::callbacks::reschedule_callback,
        handlers::callbacks::complete_callback,
        handlers::callbacks::cancel_callback,
        handlers::callbacks::update_callback_status,
        handlers::callbacks::delete_callback,
        handlers::callbacks::list_callbacks_by_lead,

        // --- Transfers ---
        handlers::transfers::initiate_transfer,
        handlers::transfers::my_transfers,
        handlers::transfers::all_transfers,
        handlers::transfers::transfers_by_callback,
        handlers::transfers::resolve_transfer,
        handlers::transfers::complete_transfer,
        handlers::transfers::withdraw_transfer,

        // --- Metrics ---
        handlers::metrics::pipeline_funnel,
        handlers::metrics::callback_workload,
        handlers::metrics::transfer_volume,
    ),
    components(
        schemas(
            models::auth::Employee,
            models::auth::EmployeeRole,
            models::auth::RegisterEmployeePayload,
            models::auth::LoginEmployeePayload,
            models::auth::AuthResponse,

            models::lead::Lead,
            models::lead::LeadSource,
            models::lead::LeadStatus,
            models::lead::PriorityLevel,

            models::callback::Callback,
            models::callback::CallbackView,
            models::callback::CallbackChannel,
            models::callback::CallbackStatus,
            models::callback::TimeBucket,

            models::transfer::Transfer,
            models::transfer::TransferStatus,
            models::transfer::TransferDecision,

            models::metrics::LeadFunnel,
            models::metrics::StatusSlice,
            models::metrics::CallbackWorkload,
            models::metrics::BucketSlice,
            models::metrics::TransferVolume,
            models::metrics::LeaderboardEntry,

            handlers::leads::CreateLeadPayload,
            handlers::leads::UpdateLeadPayload,
            handlers::leads::UpdateLeadStatusPayload,
            handlers::leads::ReassignLeadPayload,
            handlers::leads::LeadListResponse,

            handlers::callbacks::CreateCallbackPayload,
            handlers::callbacks::ReschedulePayload,
            handlers::callbacks::CompleteCallbackPayload,
            handlers::callbacks::UpdateCallbackStatusPayload,
            handlers::callbacks::UpdateCallbackPayload,
            handlers::callbacks::CallbackListResponse,

            handlers::transfers::InitiateTransferPayload,
            handlers::transfers::ResolveTransferPayload,
            handlers::transfers::CompleteTransferPayload,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e diretório de funcionários"),
        (name = "Leads", description = "Pipeline de vendas: criação, status e atribuição"),
        (name = "Callbacks", description = "Agendamento de follow-ups e baldes de tempo"),
        (name = "Transfers", description = "Handoff de callbacks com aceite explícito"),
        (name = "Metrics", description = "Projeções de leitura do pipeline"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
