// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas protegidas de sessão/diretório
    let me_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let employee_routes = Router::new()
        .route("/", get(handlers::auth::list_employees))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let lead_routes = Router::new()
        .route(
            "/",
            post(handlers::leads::create_lead).get(handlers::leads::list_leads),
        )
        .route("/lookup", get(handlers::leads::lookup_lead))
        .route(
            "/{id}",
            get(handlers::leads::get_lead)
                .put(handlers::leads::update_lead)
                .delete(handlers::leads::delete_lead),
        )
        .route("/{id}/status", patch(handlers::leads::update_lead_status))
        .route("/{id}/assignee", patch(handlers::leads::reassign_lead))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let callback_routes = Router::new()
        .route(
            "/",
            post(handlers::callbacks::create_callback).get(handlers::callbacks::list_callbacks),
        )
        .route(
            "/{id}",
            get(handlers::callbacks::get_callback)
                .put(handlers::callbacks::update_callback)
                .delete(handlers::callbacks::delete_callback),
        )
        .route(
            "/{id}/reschedule",
            patch(handlers::callbacks::reschedule_callback),
        )
        .route(
            "/{id}/complete",
            patch(handlers::callbacks::complete_callback),
        )
        .route("/{id}/cancel", patch(handlers::callbacks::cancel_callback))
        .route(
            "/{id}/status",
            patch(handlers::callbacks::update_callback_status),
        )
        .route(
            "/lead/{leadId}",
            get(handlers::callbacks::list_callbacks_by_lead),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let transfer_routes = Router::new()
        .route(
            "/callback/{callbackId}",
            post(handlers::transfers::initiate_transfer)
                .get(handlers::transfers::transfers_by_callback),
        )
        .route("/my-transfers", get(handlers::transfers::my_transfers))
        .route("/all", get(handlers::transfers::all_transfers))
        .route(
            "/{id}/resolve",
            patch(handlers::transfers::resolve_transfer),
        )
        .route(
            "/{id}/complete",
            patch(handlers::transfers::complete_transfer),
        )
        .route("/{id}", delete(handlers::transfers::withdraw_transfer))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let metrics_routes = Router::new()
        .route("/pipeline", get(handlers::metrics::pipeline_funnel))
        .route("/callbacks", get(handlers::metrics::callback_workload))
        .route("/transfers", get(handlers::metrics::transfer_volume))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/auth", me_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/leads", lead_routes)
        .nest("/api/callbacks", callback_routes)
        .nest("/api/transfers", transfer_routes)
        .nest("/api/metrics", metrics_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
