// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    clients::{AiGatewayClient, GreenApiClient, ResendClient, StorageClient},
    db::{
        ConformidadeRepository, DemandRepository, ExtractionRepository, ProfileRepository,
        SchedulingRepository, TaskRepository, TemplateRepository,
    },
    services::{
        ConformidadeService, DemandService, EmailReplyService, ExtractionService,
        NotificationDispatcher, SchedulingService, SignedDocumentService, TaskService,
        TemplateService,
    },
};

/// Configuração lida do ambiente (e do `.env`, quando existir).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub bind_addr: String,
    pub run_migrations: bool,

    // E-mail
    pub resend_api_key: String,
    pub resend_api_url: String,
    pub email_from: String,
    pub inbound_email_domain: String,
    pub email_webhook_secret: Option<String>,

    // WhatsApp
    pub whatsapp_api_url: String,
    pub whatsapp_instance_id: String,
    pub whatsapp_api_token: String,

    // IA
    pub ai_gateway_url: String,
    pub ai_api_key: String,
    pub ai_model: String,

    // Storage
    pub storage_url: String,
    pub storage_service_key: String,
    pub storage_bucket: String,
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{} deve ser definida", key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_audience: or_default("JWT_AUDIENCE", "authenticated"),
            bind_addr: or_default("BIND_ADDR", "0.0.0.0:3000"),
            run_migrations: parse_flag(&or_default("RUN_MIGRATIONS", "true")),

            resend_api_key: required("RESEND_API_KEY")?,
            resend_api_url: or_default("RESEND_API_URL", "https://api.resend.com"),
            email_from: required("EMAIL_FROM")?,
            inbound_email_domain: required("INBOUND_EMAIL_DOMAIN")?,
            email_webhook_secret: optional("EMAIL_WEBHOOK_SECRET"),

            whatsapp_api_url: required("WHATSAPP_API_URL")?,
            whatsapp_instance_id: required("WHATSAPP_INSTANCE_ID")?,
            whatsapp_api_token: required("WHATSAPP_API_TOKEN")?,

            ai_gateway_url: required("AI_GATEWAY_URL")?,
            ai_api_key: required("AI_API_KEY")?,
            ai_model: or_default("AI_MODEL", "google/gemini-2.5-flash"),

            storage_url: required("STORAGE_URL")?,
            storage_service_key: required("STORAGE_SERVICE_KEY")?,
            storage_bucket: or_default("STORAGE_BUCKET", "documentos"),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Arc<Settings>,

    pub conformidade_service: ConformidadeService,
    pub scheduling_service: SchedulingService,
    pub task_service: TaskService,
    pub email_reply_service: EmailReplyService,
    pub demand_service: DemandService,
    pub template_service: TemplateService,
    pub extraction_service: ExtractionService,
    pub signed_document_service: SignedDocumentService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let settings = Settings::from_env()?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        // --- Provedores externos ---
        let email = Arc::new(ResendClient::new(
            http.clone(),
            &settings.resend_api_url,
            settings.resend_api_key.clone(),
            settings.email_from.clone(),
        ));
        let whatsapp = Arc::new(GreenApiClient::new(
            http.clone(),
            &settings.whatsapp_api_url,
            settings.whatsapp_instance_id.clone(),
            settings.whatsapp_api_token.clone(),
        ));
        let extractor = Arc::new(AiGatewayClient::new(
            http.clone(),
            &settings.ai_gateway_url,
            settings.ai_api_key.clone(),
            settings.ai_model.clone(),
        ));
        let storage = Arc::new(StorageClient::new(
            http,
            &settings.storage_url,
            settings.storage_service_key.clone(),
            settings.storage_bucket.clone(),
        ));

        // --- Repositórios ---
        let conformidades = Arc::new(ConformidadeRepository::new(db_pool.clone()));
        let scheduling = Arc::new(SchedulingRepository::new(db_pool.clone()));
        let tasks = Arc::new(TaskRepository::new(db_pool.clone()));
        let demands = Arc::new(DemandRepository::new(db_pool.clone()));
        let templates = Arc::new(TemplateRepository::new(db_pool.clone()));
        let profiles = Arc::new(ProfileRepository::new(db_pool.clone()));
        let extractions = Arc::new(ExtractionRepository::new(db_pool.clone()));

        // --- Monta o gráfico de dependências ---
        let notifier = NotificationDispatcher::new(templates.clone(), whatsapp);

        Ok(Self {
            conformidade_service: ConformidadeService::new(conformidades.clone()),
            scheduling_service: SchedulingService::new(
                scheduling.clone(),
                conformidades.clone(),
                notifier.clone(),
            ),
            task_service: TaskService::new(
                tasks.clone(),
                demands.clone(),
                scheduling,
                conformidades,
                profiles.clone(),
                templates.clone(),
                email.clone(),
                settings.inbound_email_domain.clone(),
            ),
            email_reply_service: EmailReplyService::new(
                tasks,
                demands.clone(),
                profiles.clone(),
                email.clone(),
                notifier.clone(),
            ),
            demand_service: DemandService::new(demands.clone()),
            template_service: TemplateService::new(templates.clone()),
            extraction_service: ExtractionService::new(extractor, extractions),
            signed_document_service: SignedDocumentService::new(
                profiles, demands, templates, storage, email, notifier,
            ),
            db_pool,
            settings: Arc::new(settings),
        })
    }
}
