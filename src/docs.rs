// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Conformidades ---
        handlers::conformidades::create_conformidade,
        handlers::conformidades::list_conformidades,
        handlers::conformidades::get_conformidade,
        handlers::conformidades::update_status,
        handlers::conformidades::update_notes,
        handlers::conformidades::set_interview_approved,
        handlers::conformidades::delete_conformidade,

        // --- Agendamentos ---
        handlers::scheduling::create_proposal,
        handlers::scheduling::list_proposals,
        handlers::scheduling::delete_proposal,
        handlers::scheduling::confirm_proposal,
        handlers::scheduling::list_appointments,
        handlers::scheduling::get_appointment,
        handlers::scheduling::reschedule_appointment,
        handlers::scheduling::interview_result,
        handlers::scheduling::update_appointment_status,
        handlers::scheduling::delete_appointment,

        // --- Tarefas ---
        handlers::tasks::distribute,
        handlers::tasks::list_tasks,
        handlers::tasks::complete_task,

        // --- Demandas ---
        handlers::demands::create_demand,
        handlers::demands::list_demands,
        handlers::demands::get_demand,
        handlers::demands::respond_demand,
        handlers::demands::attach_signed_document,
        handlers::demands::cancel_demand,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::get_template,
        handlers::templates::upsert_template,

        // --- Extração / Documentos ---
        handlers::extraction::marriage_certificate,
        handlers::extraction::property_registration,
        handlers::documents::send_signed_document,

        // --- Webhooks ---
        handlers::webhooks::email_reply,
        handlers::webhooks::whatsapp,
    ),
    components(
        schemas(
            // --- Conformidades ---
            models::conformidade::Conformidade,
            models::conformidade::Modalidade,
            models::conformidade::TipoContrato,
            handlers::conformidades::CreateConformidadePayload,
            handlers::conformidades::UpdateStatusPayload,
            handlers::conformidades::UpdateNotesPayload,
            handlers::conformidades::InterviewApprovalPayload,

            // --- Agendamentos ---
            models::scheduling::MeetingKind,
            models::scheduling::ProposalStatus,
            models::scheduling::PendingProposal,
            models::scheduling::Appointment,
            handlers::scheduling::CreateProposalPayload,
            handlers::scheduling::ConfirmProposalPayload,
            handlers::scheduling::ReschedulePayload,
            handlers::scheduling::InterviewResultPayload,
            handlers::scheduling::AppointmentStatusPayload,

            // --- Tarefas ---
            models::tasks::TaskKind,
            models::tasks::TaskStatus,
            models::tasks::DistributedTask,
            services::task_service::DistributionItem,
            services::task_service::DistributionResult,
            handlers::tasks::DistributePayload,

            // --- Demandas ---
            models::demand::DemandType,
            models::demand::DemandStatus,
            models::demand::Demand,
            handlers::demands::CreateDemandPayload,
            handlers::demands::RespondDemandPayload,
            handlers::demands::SignedDocumentPathPayload,

            // --- Templates ---
            models::template::TemplateChannel,
            models::template::Template,
            handlers::templates::UpsertTemplatePayload,

            // --- Extração / Documentos ---
            models::extraction::MarriageCertificateData,
            models::extraction::PropertyRegistrationData,
            handlers::extraction::ExtractionPayload,
            handlers::documents::SendSignedDocumentPayload,
            services::signed_document_service::SignedDocumentOutcome,
            services::signed_document_service::Delivery,

            // --- Webhooks ---
            models::webhook::EmailWebhookPayload,
            models::webhook::EmailWebhookData,
            models::webhook::WhatsAppWebhookPayload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Conformidades", description = "Casos de financiamento por CPF"),
        (name = "Agendamentos", description = "Propostas de data e agendamentos de entrevista e assinatura"),
        (name = "Tarefas", description = "Distribuição de tarefas por e-mail"),
        (name = "Demandas", description = "Demandas abertas pelos CCAs"),
        (name = "Templates", description = "Templates de e-mail e WhatsApp"),
        (name = "Extração", description = "Extração de dados de documentos por IA"),
        (name = "Documentos", description = "Envio de documentos assinados"),
        (name = "Webhooks", description = "Eventos dos provedores de e-mail e WhatsApp")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
