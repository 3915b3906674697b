//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod clients;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;
#[cfg(test)]
mod testing;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new().await?;

    if app_state.settings.run_migrations {
        sqlx::migrate!().run(&app_state.db_pool).await?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let conformidade_routes = Router::new()
        .route(
            "/",
            post(handlers::conformidades::create_conformidade)
                .get(handlers::conformidades::list_conformidades),
        )
        .route(
            "/{id}",
            get(handlers::conformidades::get_conformidade)
                .delete(handlers::conformidades::delete_conformidade),
        )
        .route("/{id}/status", patch(handlers::conformidades::update_status))
        .route("/{id}/observacoes", patch(handlers::conformidades::update_notes))
        .route(
            "/{id}/entrevista-aprovada",
            patch(handlers::conformidades::set_interview_approved),
        );

    let scheduling_routes = Router::new()
        .route(
            "/propostas/{kind}",
            post(handlers::scheduling::create_proposal).get(handlers::scheduling::list_proposals),
        )
        .route(
            "/propostas/{kind}/{id}",
            delete(handlers::scheduling::delete_proposal),
        )
        .route(
            "/propostas/{kind}/{id}/confirmar",
            post(handlers::scheduling::confirm_proposal),
        )
        .route("/", get(handlers::scheduling::list_appointments))
        .route(
            "/{id}",
            get(handlers::scheduling::get_appointment).delete(handlers::scheduling::delete_appointment),
        )
        .route("/{id}/reagendar", post(handlers::scheduling::reschedule_appointment))
        .route("/{id}/resultado-entrevista", post(handlers::scheduling::interview_result))
        .route("/{id}/status", patch(handlers::scheduling::update_appointment_status));

    let task_routes = Router::new()
        .route("/distribuir", post(handlers::tasks::distribute))
        .route("/", get(handlers::tasks::list_tasks))
        .route("/{id}/concluir", post(handlers::tasks::complete_task));

    let demand_routes = Router::new()
        .route(
            "/",
            post(handlers::demands::create_demand).get(handlers::demands::list_demands),
        )
        .route("/{id}", get(handlers::demands::get_demand))
        .route("/{id}/resposta", post(handlers::demands::respond_demand))
        .route("/{id}/documento-assinado", post(handlers::demands::attach_signed_document))
        .route("/{id}/cancelar", post(handlers::demands::cancel_demand));

    let template_routes = Router::new()
        .route(
            "/{canal}",
            get(handlers::templates::list_templates).put(handlers::templates::upsert_template),
        )
        .route("/{canal}/{chave}", get(handlers::templates::get_template));

    let extraction_routes = Router::new()
        .route("/certidao-casamento", post(handlers::extraction::marriage_certificate))
        .route("/matricula-imovel", post(handlers::extraction::property_registration));

    // Tudo sob /api exige JWT, exceto o health check
    let protected = Router::new()
        .nest("/conformidades", conformidade_routes)
        .nest("/agendamentos", scheduling_routes)
        .nest("/tarefas", task_routes)
        .nest("/demandas", demand_routes)
        .nest("/templates", template_routes)
        .nest("/extracao", extraction_routes)
        .route(
            "/documentos/assinado/enviar",
            post(handlers::documents::send_signed_document),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let webhook_routes = Router::new()
        .route("/email-resposta", post(handlers::webhooks::email_reply))
        .route("/whatsapp", post(handlers::webhooks::whatsapp));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", protected)
        .nest("/webhooks", webhook_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state.clone());

    let listener = TcpListener::bind(&app_state.settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
