// src/services/task_service.rs
//
// Distribuição de tarefas por e-mail. Cada tarefa recebe um endereço de
// resposta próprio (`tarefa-<id>@<domínio>`) para ser concluída pelo webhook.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    clients::{EmailSender, OutgoingEmail},
    common::{error::AppError, text::task_reply_address},
    db::{ConformidadeStore, DemandStore, DirectoryStore, SchedulingStore, TaskStore, TemplateStore},
    models::{
        scheduling::{format_br, MeetingKind},
        tasks::{CompletionSource, DistributedTask, TaskClosure, TaskFilter, TaskKind},
        template::{Template, TemplateChannel},
    },
    services::notification_service::{render_template, TemplateVars},
};

pub const ERR_EMPLOYEE_NOT_FOUND: &str = "empregado_not_found";
pub const ERR_TEMPLATE_NOT_FOUND: &str = "template_not_found";
pub const ERR_DOMAIN_NOT_VERIFIED: &str = "domain_not_verified";

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionItem {
    pub empregado_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribuicao_id: Option<Uuid>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<DistributionItem>,
}

impl DistributionResult {
    fn from_items(results: Vec<DistributionItem>) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        Self {
            success: success_count > 0,
            success_count,
            failed_count: results.len() - success_count,
            results,
        }
    }

    /// Todos os envios falharam porque o domínio remetente não está verificado.
    pub fn all_domain_unverified(&self) -> bool {
        !self.results.is_empty()
            && self
                .results
                .iter()
                .all(|r| r.error.as_deref() == Some(ERR_DOMAIN_NOT_VERIFIED))
    }
}

/// Registro referenciado pela tarefa, já traduzido em variáveis de template.
struct TaskReference {
    template_keys: Vec<String>,
    vars: TemplateVars,
}

#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    demands: Arc<dyn DemandStore>,
    scheduling: Arc<dyn SchedulingStore>,
    conformidades: Arc<dyn ConformidadeStore>,
    directory: Arc<dyn DirectoryStore>,
    templates: Arc<dyn TemplateStore>,
    email: Arc<dyn EmailSender>,
    inbound_domain: String,
}

impl TaskService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        demands: Arc<dyn DemandStore>,
        scheduling: Arc<dyn SchedulingStore>,
        conformidades: Arc<dyn ConformidadeStore>,
        directory: Arc<dyn DirectoryStore>,
        templates: Arc<dyn TemplateStore>,
        email: Arc<dyn EmailSender>,
        inbound_domain: String,
    ) -> Self {
        Self {
            tasks,
            demands,
            scheduling,
            conformidades,
            directory,
            templates,
            email,
            inbound_domain,
        }
    }

    pub async fn distribute(
        &self,
        kind: TaskKind,
        referencia_id: Uuid,
        empregados_ids: &[Uuid],
    ) -> Result<DistributionResult, AppError> {
        if empregados_ids.is_empty() {
            return Err(AppError::BadRequest("Informe ao menos um empregado".to_string()));
        }

        let reference = self.resolve_reference(kind, referencia_id).await?;
        let template = self.find_email_template(&reference.template_keys).await?;

        let mut results = Vec::with_capacity(empregados_ids.len());
        for empregado_id in empregados_ids {
            let item = self
                .distribute_to(kind, referencia_id, *empregado_id, &reference, template.as_ref())
                .await;
            results.push(item);
        }

        let result = DistributionResult::from_items(results);
        tracing::info!(
            "Distribuição de {} {}: {} enviadas, {} falharam",
            kind.as_str(),
            referencia_id,
            result.success_count,
            result.failed_count
        );
        Ok(result)
    }

    /// Um empregado. Qualquer falha (banco ou provedor) vira resultado daquele empregado.
    async fn distribute_to(
        &self,
        kind: TaskKind,
        referencia_id: Uuid,
        empregado_id: Uuid,
        reference: &TaskReference,
        template: Option<&Template>,
    ) -> DistributionItem {
        let failed = |distribuicao_id: Option<Uuid>, error: &str| DistributionItem {
            empregado_id,
            distribuicao_id,
            success: false,
            message_id: None,
            error: Some(error.to_string()),
        };

        let task = match self.tasks.create_task(kind, referencia_id, empregado_id).await {
            Ok(task) => task,
            Err(e) => {
                tracing::error!("🔥 Falha ao criar tarefa para {}: {}", empregado_id, e);
                return failed(None, &e.public_message());
            }
        };

        let profile = match self.directory.find_profile(empregado_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return failed(Some(task.id), ERR_EMPLOYEE_NOT_FOUND),
            Err(e) => {
                tracing::error!("🔥 Falha ao carregar perfil {}: {}", empregado_id, e);
                return failed(Some(task.id), &e.public_message());
            }
        };
        let Some(address) = profile
            .email_preferencia
            .clone()
            .filter(|e| !e.trim().is_empty())
        else {
            tracing::warn!("Empregado {} sem e-mail de preferência", empregado_id);
            return failed(Some(task.id), ERR_EMPLOYEE_NOT_FOUND);
        };
        let Some(template) = template else {
            return failed(Some(task.id), ERR_TEMPLATE_NOT_FOUND);
        };

        let reply_to = task_reply_address(&task.id.to_string(), &self.inbound_domain);
        let mut vars = reference.vars.clone();
        vars.insert("nome_empregado", profile.nome.clone());
        vars.insert("tarefa_id", task.id.to_string());
        vars.insert("email_resposta", reply_to.clone());

        let email = OutgoingEmail {
            to: vec![address],
            subject: render_template(template.assunto.as_deref().unwrap_or(&template.nome), &vars),
            html: render_template(&template.corpo, &vars),
            reply_to: Some(reply_to.clone()),
            attachments: vec![],
        };

        match self.email.send(&email).await {
            Ok(message_id) => {
                // O e-mail já saiu; a tarefa continua fechável pelo reply-to.
                if let Err(e) = self.tasks.attach_email(task.id, &reply_to, Some(&message_id)).await {
                    tracing::error!("🔥 E-mail da tarefa {} enviado, mas não registrado: {}", task.id, e);
                }
                DistributionItem {
                    empregado_id,
                    distribuicao_id: Some(task.id),
                    success: true,
                    message_id: Some(message_id),
                    error: None,
                }
            }
            Err(AppError::EmailDomainNotVerified) => failed(Some(task.id), ERR_DOMAIN_NOT_VERIFIED),
            Err(e) => {
                tracing::warn!("⚠️ Falha ao enviar tarefa {} para {}: {}", task.id, empregado_id, e);
                failed(Some(task.id), &e.to_string())
            }
        }
    }

    async fn resolve_reference(&self, kind: TaskKind, referencia_id: Uuid) -> Result<TaskReference, AppError> {
        let mut vars = TemplateVars::new();
        let template_keys = match kind {
            TaskKind::Demanda => {
                let demand = self
                    .demands
                    .find_demand(referencia_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Demanda".to_string()))?;
                vars.insert("tipo_demanda", demand.tipo.label().to_string());
                vars.insert("cpf", demand.cpf.clone().unwrap_or_default());
                vars.insert("matricula", demand.matricula.clone().unwrap_or_default());
                vars.insert("cartorio", demand.cartorio.clone().unwrap_or_default());
                vars.insert("descricao", demand.descricao.clone().unwrap_or_default());
                vec![format!("demanda_{}", demand.tipo.as_str()), "demanda".to_string()]
            }
            TaskKind::Assinatura => {
                let appointment = self
                    .scheduling
                    .find_appointment(referencia_id)
                    .await?
                    .filter(|a| a.tipo == MeetingKind::Assinatura)
                    .ok_or_else(|| AppError::ResourceNotFound("Agendamento de assinatura".to_string()))?;
                vars.insert("nome_cliente", appointment.nome_cliente.clone().unwrap_or_default());
                vars.insert("cpf", appointment.cpf.clone().unwrap_or_default());
                vars.insert("data_hora", format_br(&appointment.data_hora));
                vars.insert("modalidade", appointment.modalidade.clone().unwrap_or_default());
                vec!["assinatura".to_string()]
            }
            TaskKind::Comite => {
                let conformidade = self
                    .conformidades
                    .find_by_id(referencia_id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))?;
                vars.insert("cpf", conformidade.cpf.clone());
                vars.insert("valor_financiamento", conformidade.valor_financiamento.to_string());
                vars.insert("modalidade", conformidade.modalidade_label());
                vars.insert("observacoes", conformidade.observacoes.clone().unwrap_or_default());
                vec!["comite".to_string()]
            }
        };
        Ok(TaskReference { template_keys, vars })
    }

    /// Primeira chave que tiver template cadastrado.
    async fn find_email_template(&self, keys: &[String]) -> Result<Option<Template>, AppError> {
        for key in keys {
            if let Some(t) = self.templates.find_template(TemplateChannel::Email, key).await? {
                return Ok(Some(t));
            }
        }
        tracing::warn!("Nenhum template de e-mail para as chaves {:?}", keys);
        Ok(None)
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<DistributedTask>, AppError> {
        self.tasks.list_tasks(&filter).await
    }

    /// Conclusão manual; para demandas fecha também a demanda e as tarefas irmãs.
    pub async fn complete_manually(&self, id: Uuid) -> Result<TaskClosure, AppError> {
        match self.tasks.complete_task(id, &CompletionSource::Manual).await? {
            Some(closure) => {
                tracing::info!("Tarefa {} concluída manualmente", id);
                Ok(closure)
            }
            None => match self.tasks.find_task(id).await? {
                Some(_) => Err(AppError::TaskAlreadyCompleted),
                None => Err(AppError::ResourceNotFound("Tarefa".to_string())),
            },
        }
    }
}
