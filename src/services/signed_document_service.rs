// src/services/signed_document_service.rs
//
// Envia ao CCA o documento assinado de uma demanda: anexo até 10 MB, acima
// disso um link assinado válido por 7 dias.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    clients::{EmailAttachment, EmailSender, FileStorage, OutgoingEmail},
    common::error::AppError,
    db::{DemandStore, DirectoryStore, TemplateStore},
    models::template::TemplateChannel,
    services::notification_service::{render_template, NotificationDispatcher, TemplateVars},
};

pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;
pub const SIGNED_LINK_TTL_SECS: u64 = 7 * 24 * 60 * 60;

const DEFAULT_SUBJECT: &str = "Documento assinado - CPF {{cpf}}";
const DEFAULT_BODY: &str = "<p>Olá {{nome_cca}},</p>\
<p>Segue o documento assinado referente à matrícula {{matricula}} (CPF {{cpf}}).</p>\
{{acesso_documento}}";

#[derive(Debug, Clone)]
pub struct SignedDocumentRequest {
    pub demand_id: Uuid,
    pub cca_user_id: Uuid,
    pub cpf: String,
    pub matricula: String,
    pub pdf_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Anexo,
    Link,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignedDocumentOutcome {
    pub success: bool,
    pub message_id: String,
    pub delivery: Delivery,
}

#[derive(Clone)]
pub struct SignedDocumentService {
    directory: Arc<dyn DirectoryStore>,
    demands: Arc<dyn DemandStore>,
    templates: Arc<dyn TemplateStore>,
    storage: Arc<dyn FileStorage>,
    email: Arc<dyn EmailSender>,
    notifier: NotificationDispatcher,
}

impl SignedDocumentService {
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        demands: Arc<dyn DemandStore>,
        templates: Arc<dyn TemplateStore>,
        storage: Arc<dyn FileStorage>,
        email: Arc<dyn EmailSender>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            directory,
            demands,
            templates,
            storage,
            email,
            notifier,
        }
    }

    pub async fn send(&self, request: SignedDocumentRequest) -> Result<SignedDocumentOutcome, AppError> {
        let profile = self
            .directory
            .find_profile(request.cca_user_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Usuário CCA".to_string()))?;
        let address = profile
            .email_preferencia
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| profile.email.clone());

        let bytes = self.storage.download(&request.pdf_path).await?;

        let mut vars = TemplateVars::new();
        vars.insert("nome_cca", profile.nome.clone());
        vars.insert("cpf", request.cpf.clone());
        vars.insert("matricula", request.matricula.clone());

        let (delivery, attachments) = if bytes.len() <= MAX_ATTACHMENT_BYTES {
            vars.insert("acesso_documento", "<p>O documento está em anexo.</p>".to_string());
            let attachment = EmailAttachment {
                filename: file_name(&request.pdf_path),
                content_base64: STANDARD.encode(&bytes),
            };
            (Delivery::Anexo, vec![attachment])
        } else {
            let url = self.storage.signed_url(&request.pdf_path, SIGNED_LINK_TTL_SECS).await?;
            vars.insert(
                "acesso_documento",
                format!(
                    "<p>O arquivo é grande demais para anexo. <a href=\"{}\">Baixe o documento</a> (link válido por 7 dias).</p>",
                    url
                ),
            );
            (Delivery::Link, vec![])
        };

        let (subject, body) = match self
            .templates
            .find_template(TemplateChannel::Email, "documento_assinado")
            .await?
        {
            Some(t) => (t.assunto.unwrap_or_else(|| DEFAULT_SUBJECT.to_string()), t.corpo),
            None => (DEFAULT_SUBJECT.to_string(), DEFAULT_BODY.to_string()),
        };

        let message_id = self
            .email
            .send(&OutgoingEmail {
                to: vec![address],
                subject: render_template(&subject, &vars),
                html: render_template(&body, &vars),
                reply_to: None,
                attachments,
            })
            .await?;
        tracing::info!(
            "📄 Documento assinado da demanda {} enviado ao CCA {} ({:?})",
            request.demand_id,
            profile.id,
            delivery
        );

        match self.demands.attach_signed_document(request.demand_id, &request.pdf_path).await {
            Ok(Some(d)) if d.status.is_closed() => {
                tracing::info!("Demanda {} já encerrada; documento registrado sem mudar o status", d.id)
            }
            Ok(Some(_)) => {}
            Ok(None) => tracing::warn!("Demanda {} não encontrada ao registrar documento", request.demand_id),
            Err(e) => tracing::warn!("⚠️ Falha ao registrar documento na demanda {}: {}", request.demand_id, e),
        }

        if let Some(phone) = profile.telefone.clone() {
            self.notifier.dispatch_detached("documento_assinado", phone, vars);
        }

        Ok(SignedDocumentOutcome {
            success: true,
            message_id,
            delivery,
        })
    }
}

fn file_name(path: &str) -> String {
    path.rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .unwrap_or("documento.pdf")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::InMemoryStore,
        models::demand::{DemandStatus, DemandType, NewDemand},
        testing::{FakeStorage, RecordingEmail, RecordingWhatsApp},
    };

    struct Fixture {
        store: Arc<InMemoryStore>,
        email: Arc<RecordingEmail>,
        cca: Uuid,
        demand: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let cca = store.add_profile("Carla", None, Some("11912345678"));
        let demand = store
            .create_demand(&NewDemand {
                tipo: DemandType::AutorizacaoVistoria,
                cpf: Some("52998224725".into()),
                matricula: Some("998".into()),
                cartorio: None,
                descricao: None,
                arquivos: vec![],
                solicitante_id: cca,
            })
            .await
            .unwrap()
            .id;
        Fixture {
            store,
            email: Arc::new(RecordingEmail::default()),
            cca,
            demand,
        }
    }

    fn service(f: &Fixture, storage: FakeStorage) -> SignedDocumentService {
        let notifier = NotificationDispatcher::new(f.store.clone(), Arc::new(RecordingWhatsApp::default()));
        SignedDocumentService::new(
            f.store.clone(),
            f.store.clone(),
            f.store.clone(),
            Arc::new(storage),
            f.email.clone(),
            notifier,
        )
    }

    fn request(f: &Fixture, path: &str) -> SignedDocumentRequest {
        SignedDocumentRequest {
            demand_id: f.demand,
            cca_user_id: f.cca,
            cpf: "52998224725".into(),
            matricula: "998".into(),
            pdf_path: path.into(),
        }
    }

    #[tokio::test]
    async fn small_file_goes_as_attachment() {
        let f = fixture().await;
        let storage = FakeStorage::default().with_file("assinados/d1.pdf", b"%PDF-1.7".to_vec());

        let outcome = service(&f, storage).send(request(&f, "assinados/d1.pdf")).await.unwrap();

        assert_eq!(outcome.delivery, Delivery::Anexo);
        let sent = f.email.sent().remove(0);
        assert_eq!(sent.to, vec!["carla@agencia.com.br".to_string()]);
        assert_eq!(sent.subject, "Documento assinado - CPF 52998224725");
        assert_eq!(sent.attachments[0].filename, "d1.pdf");
        assert_eq!(sent.attachments[0].content_base64, STANDARD.encode(b"%PDF-1.7"));
        assert_eq!(f.store.with(|s| s.demands[0].status), DemandStatus::Assinada);
    }

    #[tokio::test]
    async fn large_file_goes_as_seven_day_link() {
        let f = fixture().await;
        let storage = FakeStorage::default().with_file("grande.pdf", vec![0u8; MAX_ATTACHMENT_BYTES + 1]);

        let outcome = service(&f, storage).send(request(&f, "grande.pdf")).await.unwrap();

        assert_eq!(outcome.delivery, Delivery::Link);
        let sent = f.email.sent().remove(0);
        assert!(sent.attachments.is_empty());
        assert!(sent.html.contains("https://storage.test/grande.pdf?expires=604800"));
    }

    #[tokio::test]
    async fn closed_demand_keeps_its_status() {
        let f = fixture().await;
        f.store.with(|s| s.demands[0].status = DemandStatus::Concluida);
        let storage = FakeStorage::default().with_file("assinados/d1.pdf", b"%PDF-1.7".to_vec());

        let outcome = service(&f, storage).send(request(&f, "assinados/d1.pdf")).await.unwrap();

        assert!(outcome.success);
        let demand = f.store.with(|s| s.demands[0].clone());
        assert_eq!(demand.status, DemandStatus::Concluida);
        assert_eq!(demand.documento_assinado.as_deref(), Some("assinados/d1.pdf"));
    }

    #[tokio::test]
    async fn unknown_cca_is_not_found() {
        let f = fixture().await;
        let mut req = request(&f, "x.pdf");
        req.cca_user_id = Uuid::new_v4();
        assert!(matches!(
            service(&f, FakeStorage::default()).send(req).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }
}
