// src/services/email_reply_service.rs
//
// Webhook de e-mail recebido: uma resposta com palavra-chave de conclusão
// fecha a tarefa (e, para demandas, a demanda inteira).

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    clients::EmailSender,
    common::{
        error::AppError,
        text::{find_completion_keyword, reply_corpus, task_id_from_address},
    },
    db::{DemandStore, DirectoryStore, TaskStore},
    models::{
        tasks::{CompletionSource, TaskClosure},
        webhook::{EmailWebhookOutcome, EmailWebhookPayload, NewWebhookEvent, WebhookAction},
    },
    services::notification_service::{NotificationDispatcher, TemplateVars},
};

pub const RECEIVED_EVENT_TYPE: &str = "email.received";

/// Só rejeita quando os dois segredos existem e são diferentes.
pub fn verify_webhook_secret(configured: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    match (configured, provided) {
        (Some(expected), Some(got)) if expected != got => Err(AppError::InvalidWebhookSecret),
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct EmailReplyService {
    tasks: Arc<dyn TaskStore>,
    demands: Arc<dyn DemandStore>,
    directory: Arc<dyn DirectoryStore>,
    email: Arc<dyn EmailSender>,
    notifier: NotificationDispatcher,
}

impl EmailReplyService {
    pub fn new(
        tasks: Arc<dyn TaskStore>,
        demands: Arc<dyn DemandStore>,
        directory: Arc<dyn DirectoryStore>,
        email: Arc<dyn EmailSender>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            tasks,
            demands,
            directory,
            email,
            notifier,
        }
    }

    /// Decodifica o corpo cru do webhook. Corpo que não é JSON, ou sem `type`,
    /// vira evento ignorado (e auditado) em vez de erro para o provedor.
    pub async fn handle_raw(&self, body: &[u8]) -> Result<EmailWebhookOutcome, AppError> {
        let decoded = serde_json::from_slice::<Value>(body).and_then(|value| {
            if value.get("type").and_then(Value::as_str).is_none() {
                return Ok(None);
            }
            serde_json::from_value::<EmailWebhookPayload>(value).map(Some)
        });

        let outcome = match decoded {
            Ok(Some(payload)) => return self.handle(&payload).await,
            Ok(None) => EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredEventType,
                "Evento sem campo 'type'",
            ),
            Err(e) => {
                tracing::warn!("⚠️ Webhook de e-mail com corpo inválido: {}", e);
                EmailWebhookOutcome::ignored(
                    WebhookAction::IgnoredInvalidPayload,
                    format!("Corpo inválido: {}", e),
                )
            }
        };

        let event = NewWebhookEvent {
            action_taken: outcome.action.as_str().to_string(),
            detalhes: outcome.reason.as_ref().map(|r| json!({ "reason": r })),
            ..NewWebhookEvent::default()
        };
        if let Err(e) = self.tasks.log_webhook_event(&event).await {
            tracing::warn!("⚠️ Falha ao registrar evento do webhook: {}", e);
        }
        Ok(outcome)
    }

    /// Processa o evento; toda saída (inclusive erro) fica registrada na auditoria.
    pub async fn handle(&self, payload: &EmailWebhookPayload) -> Result<EmailWebhookOutcome, AppError> {
        let mut event = NewWebhookEvent {
            email_id: payload.data.email_id.clone(),
            remetente: payload.data.from.as_ref().map(|f| f.address().to_string()),
            assunto: payload.data.subject.clone(),
            ..NewWebhookEvent::default()
        };

        let result = self.process(payload, &mut event).await;
        match &result {
            Ok(outcome) => {
                event.action_taken = outcome.action.as_str().to_string();
                if event.detalhes.is_none() {
                    event.detalhes = outcome.reason.as_ref().map(|r| json!({ "reason": r }));
                }
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao processar e-mail recebido: {}", e);
                event.action_taken = WebhookAction::Error.as_str().to_string();
                event.detalhes = Some(json!({ "error": e.to_string() }));
            }
        }

        if let Err(e) = self.tasks.log_webhook_event(&event).await {
            tracing::warn!("⚠️ Falha ao registrar evento do webhook: {}", e);
        }
        result
    }

    async fn process(
        &self,
        payload: &EmailWebhookPayload,
        event: &mut NewWebhookEvent,
    ) -> Result<EmailWebhookOutcome, AppError> {
        if payload.event_type != RECEIVED_EVENT_TYPE {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredEventType,
                format!("Evento '{}' ignorado", payload.event_type),
            ));
        }

        let Some(raw_id) = payload
            .data
            .to
            .iter()
            .find_map(|to| task_id_from_address(to.address()))
        else {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredNoTaskId,
                "Nenhum endereço tarefa-<id> nos destinatários",
            ));
        };

        let task = match Uuid::parse_str(&raw_id) {
            Ok(id) => self.tasks.find_task(id).await?,
            Err(_) => None,
        };
        let Some(task) = task else {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredTaskNotFound,
                format!("Tarefa {} não encontrada", raw_id),
            ));
        };
        event.distribuicao_id = Some(task.id);

        if task.is_completed() {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredAlreadyCompleted,
                "Tarefa já concluída",
            ));
        }

        let received = match payload.data.email_id.as_deref() {
            Some(email_id) => self.email.fetch_received(email_id).await?,
            None => Default::default(),
        };
        let subject = received.subject.as_deref().or(payload.data.subject.as_deref());
        let corpus = reply_corpus(subject, received.text.as_deref(), received.html.as_deref());

        let Some(keyword) = find_completion_keyword(&corpus) else {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredNoKeyword,
                "Nenhuma palavra-chave de conclusão na resposta",
            ));
        };
        event.matched_keyword = Some(keyword.to_string());

        let source = CompletionSource::Email {
            email_id: payload.data.email_id.clone().unwrap_or_default(),
            remetente: event.remetente.clone().unwrap_or_default(),
            palavra_chave: keyword.to_string(),
        };
        // Outra entrega pode ter fechado a tarefa entre a leitura e a atualização
        let Some(closure) = self.tasks.complete_task(task.id, &source).await? else {
            return Ok(EmailWebhookOutcome::ignored(
                WebhookAction::IgnoredAlreadyCompleted,
                "Tarefa já concluída",
            ));
        };
        tracing::info!(
            "✅ Tarefa {} concluída por e-mail (palavra-chave '{}')",
            task.id,
            keyword
        );

        let whatsapp_sent = match closure.demand_id {
            Some(_) => self.notify_requester(&closure).await,
            None => false,
        };

        event.detalhes = Some(json!({
            "demand_updated": closure.demand_updated,
            "siblings_completed": closure.siblings_completed,
            "whatsapp_sent": whatsapp_sent,
        }));

        Ok(EmailWebhookOutcome {
            success: true,
            action: WebhookAction::Completed,
            reason: None,
            distribuicao_id: Some(task.id),
            matched_keyword: Some(keyword.to_string()),
            demand_updated: Some(closure.demand_updated),
            demand_id: closure.demand_id,
            whatsapp_sent: Some(whatsapp_sent),
        })
    }

    /// Avisa o solicitante da demanda; qualquer falha vira `false`.
    async fn notify_requester(&self, closure: &TaskClosure) -> bool {
        let Some(demand_id) = closure.demand_id else {
            return false;
        };
        let result: Result<bool, AppError> = async {
            let Some(demand) = self.demands.find_demand(demand_id).await? else {
                return Ok(false);
            };
            let Some(profile) = self.directory.find_profile(demand.solicitante_id).await? else {
                return Ok(false);
            };
            let Some(phone) = profile.telefone.clone() else {
                tracing::info!("Solicitante {} sem telefone; WhatsApp não enviado", profile.id);
                return Ok(false);
            };

            let mut vars = TemplateVars::new();
            vars.insert("nome_solicitante", profile.nome.clone());
            vars.insert("tipo_demanda", demand.tipo.label().to_string());
            vars.insert("cpf", demand.cpf.clone().unwrap_or_default());
            vars.insert("matricula", demand.matricula.clone().unwrap_or_default());
            self.notifier.send("demanda_concluida", &phone, &vars).await?;
            Ok(true)
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::warn!("⚠️ Falha ao avisar solicitante da demanda {}: {}", demand_id, e);
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::InMemoryStore,
        models::{
            demand::{DemandStatus, DemandType, NewDemand},
            tasks::{TaskKind, TaskStatus},
        },
        testing::{RecordingEmail, RecordingWhatsApp},
    };

    struct Fixture {
        store: Arc<InMemoryStore>,
        whatsapp: Arc<RecordingWhatsApp>,
        service: EmailReplyService,
    }

    fn fixture(email: RecordingEmail) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let whatsapp = Arc::new(RecordingWhatsApp::default());
        let notifier = NotificationDispatcher::new(store.clone(), whatsapp.clone());
        let service = EmailReplyService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(email),
            notifier,
        );
        Fixture { store, whatsapp, service }
    }

    fn payload(task_id: Uuid, email_id: &str) -> EmailWebhookPayload {
        serde_json::from_value(json!({
            "type": "email.received",
            "data": {
                "email_id": email_id,
                "to": [format!("tarefa-{}@respostas.exemplo.com", task_id)],
                "from": "joao@agencia.com.br",
                "subject": "Re: Nova demanda"
            }
        }))
        .unwrap()
    }

    async fn demand_with_tasks(store: &InMemoryStore, n: usize) -> (Uuid, Vec<Uuid>) {
        let solicitante = store.add_profile("Carla", Some("carla@cca.com.br"), Some("11912345678"));
        let demand = store
            .create_demand(&NewDemand {
                tipo: DemandType::EmissaoCertidao,
                cpf: Some("52998224725".into()),
                matricula: Some("998".into()),
                cartorio: None,
                descricao: None,
                arquivos: vec![],
                solicitante_id: solicitante,
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for _ in 0..n {
            ids.push(
                store
                    .create_task(TaskKind::Demanda, demand.id, Uuid::new_v4())
                    .await
                    .unwrap()
                    .id,
            );
        }
        (demand.id, ids)
    }

    #[tokio::test]
    async fn keyword_reply_closes_demand_and_all_sibling_tasks() {
        let email = RecordingEmail::default().with_received(
            "em_1",
            "Re: Nova demanda",
            Some("Feito! Qualquer coisa me avise."),
            None,
        );
        let f = fixture(email);
        let (demand_id, tasks) = demand_with_tasks(&f.store, 3).await;

        let outcome = f.service.handle(&payload(tasks[0], "em_1")).await.unwrap();

        assert_eq!(outcome.action, WebhookAction::Completed);
        assert_eq!(outcome.matched_keyword.as_deref(), Some("feito"));
        assert_eq!(outcome.demand_id, Some(demand_id));
        assert_eq!(outcome.demand_updated, Some(true));
        assert_eq!(outcome.whatsapp_sent, Some(true));

        for id in &tasks {
            assert_eq!(f.store.task(*id).status, TaskStatus::Concluida);
        }
        let closed = f.store.task(tasks[0]);
        assert!(closed.concluida_por_email);
        assert_eq!(closed.email_conclusao_id.as_deref(), Some("em_1"));
        assert_eq!(closed.email_conclusao_remetente.as_deref(), Some("joao@agencia.com.br"));
        assert_eq!(f.store.with(|s| s.demands[0].status), DemandStatus::Concluida);

        let (chat, _) = f.whatsapp.sent().remove(0);
        assert_eq!(chat, "5511912345678@c.us");
        assert_eq!(f.store.events().last().unwrap().action_taken, "completed");
    }

    #[tokio::test]
    async fn already_completed_task_is_a_logged_noop() {
        let email = RecordingEmail::default().with_received("em_2", "Re: x", Some("ok"), None);
        let f = fixture(email);
        let (_, tasks) = demand_with_tasks(&f.store, 1).await;
        f.store.complete_task(tasks[0], &CompletionSource::Manual).await.unwrap();
        let writes = f.store.writes();

        let outcome = f.service.handle(&payload(tasks[0], "em_2")).await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.action, WebhookAction::IgnoredAlreadyCompleted);
        assert_eq!(f.store.writes(), writes);
        let event = f.store.events().pop().unwrap();
        assert_eq!(event.action_taken, "ignored_already_completed");
        assert_eq!(event.distribuicao_id, Some(tasks[0]));
    }

    #[tokio::test]
    async fn keyword_only_inside_quote_is_ignored() {
        let email = RecordingEmail::default().with_received(
            "em_3",
            "Re: Nova demanda",
            None,
            Some("<div>Vou verificar amanhã.</div><blockquote><p>Responda ok para concluir</p></blockquote>"),
        );
        let f = fixture(email);
        let (_, tasks) = demand_with_tasks(&f.store, 1).await;

        let outcome = f.service.handle(&payload(tasks[0], "em_3")).await.unwrap();

        assert_eq!(outcome.action, WebhookAction::IgnoredNoKeyword);
        assert_eq!(f.store.task(tasks[0]).status, TaskStatus::EmAndamento);
        assert_eq!(f.store.events()[0].action_taken, "ignored_no_keyword");
    }

    #[tokio::test]
    async fn other_event_types_and_addresses_are_ignored() {
        let f = fixture(RecordingEmail::default());

        let mut p = payload(Uuid::new_v4(), "em_4");
        p.event_type = "email.delivered".into();
        assert_eq!(
            f.service.handle(&p).await.unwrap().action,
            WebhookAction::IgnoredEventType
        );

        let no_task: EmailWebhookPayload = serde_json::from_value(json!({
            "type": "email.received",
            "data": {"email_id": "em_5", "to": ["contato@exemplo.com"]}
        }))
        .unwrap();
        assert_eq!(
            f.service.handle(&no_task).await.unwrap().action,
            WebhookAction::IgnoredNoTaskId
        );

        assert_eq!(
            f.service.handle(&payload(Uuid::new_v4(), "em_6")).await.unwrap().action,
            WebhookAction::IgnoredTaskNotFound
        );

        let actions: Vec<String> = f.store.events().into_iter().map(|e| e.action_taken).collect();
        assert_eq!(
            actions,
            vec!["ignored_event_type", "ignored_no_task_id", "ignored_task_not_found"]
        );
    }

    #[tokio::test]
    async fn provider_failure_is_logged_as_error() {
        let f = fixture(RecordingEmail::default());
        let (_, tasks) = demand_with_tasks(&f.store, 1).await;

        let err = f.service.handle(&payload(tasks[0], "nao_existe")).await;

        assert!(err.is_err());
        assert_eq!(f.store.events()[0].action_taken, "error");
        assert_eq!(f.store.task(tasks[0]).status, TaskStatus::EmAndamento);
    }

    #[tokio::test]
    async fn undecodable_bodies_are_ignored_and_audited() {
        let f = fixture(RecordingEmail::default());

        let not_json = f.service.handle_raw(b"type=email.received").await.unwrap();
        assert!(not_json.success);
        assert_eq!(not_json.action, WebhookAction::IgnoredInvalidPayload);

        let no_type = f.service.handle_raw(br#"{"data": {"email_id": "em_7"}}"#).await.unwrap();
        assert_eq!(no_type.action, WebhookAction::IgnoredEventType);

        let bad_shape = f
            .service
            .handle_raw(br#"{"type": "email.received", "data": {"to": 42}}"#)
            .await
            .unwrap();
        assert_eq!(bad_shape.action, WebhookAction::IgnoredInvalidPayload);

        let actions: Vec<String> = f.store.events().into_iter().map(|e| e.action_taken).collect();
        assert_eq!(
            actions,
            vec!["ignored_invalid_payload", "ignored_event_type", "ignored_invalid_payload"]
        );
    }

    #[test]
    fn secret_mismatch_only_when_both_present() {
        assert!(verify_webhook_secret(Some("a"), Some("a")).is_ok());
        assert!(verify_webhook_secret(None, Some("a")).is_ok());
        assert!(verify_webhook_secret(Some("a"), None).is_ok());
        assert!(matches!(
            verify_webhook_secret(Some("a"), Some("b")),
            Err(AppError::InvalidWebhookSecret)
        ));
    }
}
