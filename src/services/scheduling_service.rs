// src/services/scheduling_service.rs
//
// Propostas de entrevista/assinatura (duas datas candidatas), confirmação,
// reagendamento e resultado da entrevista.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    common::{error::AppError, text::phone_from_chat_id},
    db::{ConformidadeStore, SchedulingStore},
    models::scheduling::{
        brasilia_offset, confirmed_data_hora, format_br, parse_time, Appointment, AppointmentFilter,
        ChosenSlot, MeetingKind, NewProposal, PendingProposal, ProposalStatus,
    },
    services::notification_service::{NotificationDispatcher, TemplateVars},
};

/// Dados de uma nova proposta, já desserializados pelo handler.
#[derive(Debug, Clone)]
pub struct ProposalInput {
    pub nome_cliente: String,
    pub telefone_cliente: String,
    pub data_opcao_1: NaiveDate,
    pub data_opcao_2: NaiveDate,
    pub horario_inicio: NaiveTime,
    pub horario_fim: NaiveTime,
    pub conformidade_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct ConfirmedMeeting {
    pub proposal: PendingProposal,
    pub appointment: Appointment,
}

/// O que aconteceu com uma mensagem de WhatsApp recebida.
#[derive(Debug, Clone, PartialEq)]
pub enum WhatsAppReplyOutcome {
    NoPendingProposal,
    Reprompted { proposal_id: Uuid },
    Confirmed { proposal_id: Uuid, appointment_id: Uuid },
}

#[derive(Clone)]
pub struct SchedulingService {
    store: Arc<dyn SchedulingStore>,
    conformidades: Arc<dyn ConformidadeStore>,
    notifier: NotificationDispatcher,
}

impl SchedulingService {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        conformidades: Arc<dyn ConformidadeStore>,
        notifier: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            conformidades,
            notifier,
        }
    }

    // =========================================================================
    //  PROPOSTAS
    // =========================================================================

    pub async fn propose_meeting(
        &self,
        kind: MeetingKind,
        input: ProposalInput,
    ) -> Result<PendingProposal, AppError> {
        let nome = input.nome_cliente.trim();
        let telefone = input.telefone_cliente.trim();
        if nome.is_empty() || telefone.is_empty() {
            return Err(AppError::BadRequest("Nome e telefone do cliente são obrigatórios".to_string()));
        }
        if input.horario_inicio > input.horario_fim {
            return Err(AppError::BadRequest(
                "O horário inicial deve ser anterior ao final".to_string(),
            ));
        }

        if let Some(conformidade_id) = input.conformidade_id {
            let conformidade = self
                .conformidades
                .find_by_id(conformidade_id)
                .await?
                .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))?;
            // Assinatura só depois da entrevista aprovada
            if kind == MeetingKind::Assinatura && !conformidade.interview_approved() {
                return Err(AppError::InterviewNotApproved);
            }
        }

        let proposal = self
            .store
            .create_proposal(&NewProposal {
                kind,
                nome_cliente: nome.to_string(),
                telefone_cliente: telefone.to_string(),
                data_opcao_1: input.data_opcao_1,
                data_opcao_2: input.data_opcao_2,
                horario_inicio: input.horario_inicio,
                horario_fim: input.horario_fim,
                conformidade_id: input.conformidade_id,
            })
            .await?;
        tracing::info!("Proposta de {} {} criada para {}", kind.label(), proposal.id, proposal.nome_cliente);

        self.notifier.dispatch_detached(
            "proposta_agendamento",
            proposal.telefone_cliente.clone(),
            proposal_vars(&proposal),
        );

        Ok(proposal)
    }

    pub async fn confirm_meeting(
        &self,
        kind: MeetingKind,
        proposal_id: Uuid,
        chosen_date: NaiveDate,
        chosen_option: Option<i16>,
        chosen_time: &str,
    ) -> Result<ConfirmedMeeting, AppError> {
        let confirmed = self
            .confirm(kind, proposal_id, chosen_date, chosen_option, chosen_time)
            .await?;

        if let Some(phone) = confirmed.appointment.telefone_cliente.clone() {
            self.notifier
                .dispatch_detached("agendamento_confirmado", phone, appointment_vars(&confirmed.appointment));
        }

        Ok(confirmed)
    }

    /// Valida e confirma; nada é gravado se a validação falhar.
    async fn confirm(
        &self,
        kind: MeetingKind,
        proposal_id: Uuid,
        chosen_date: NaiveDate,
        chosen_option: Option<i16>,
        chosen_time: &str,
    ) -> Result<ConfirmedMeeting, AppError> {
        let proposal = self
            .store
            .find_proposal(kind, proposal_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Proposta de agendamento".to_string()))?;

        if proposal.status == ProposalStatus::Confirmado {
            return Err(AppError::ProposalAlreadyConfirmed);
        }

        let time = parse_time(chosen_time)
            .ok_or_else(|| AppError::BadRequest(format!("Horário inválido: '{}'", chosen_time)))?;

        if !proposal.window_contains(time) {
            return Err(AppError::TimeOutsideWindow {
                chosen: time.format("%H:%M").to_string(),
                start: proposal.horario_inicio.format("%H:%M").to_string(),
                end: proposal.horario_fim.format("%H:%M").to_string(),
            });
        }

        if let Some(option) = chosen_option {
            let candidate = u8::try_from(option)
                .ok()
                .and_then(|o| proposal.candidate_date(o))
                .ok_or_else(|| AppError::BadRequest(format!("Opção inválida: {}", option)))?;
            if candidate != chosen_date {
                return Err(AppError::BadRequest(format!(
                    "A data escolhida não corresponde à opção {}",
                    option
                )));
            }
        }

        let slot = ChosenSlot {
            date: chosen_date,
            option: chosen_option,
            time,
        };
        let (proposal, appointment) = self.store.confirm_proposal(kind, proposal_id, &slot).await?;
        tracing::info!(
            "✅ Proposta {} confirmada; agendamento {} em {}",
            proposal.id,
            appointment.id,
            appointment.data_hora.to_rfc3339()
        );

        Ok(ConfirmedMeeting { proposal, appointment })
    }

    pub async fn list_proposals(
        &self,
        kind: MeetingKind,
        status: Option<ProposalStatus>,
    ) -> Result<Vec<PendingProposal>, AppError> {
        self.store.list_proposals(kind, status).await
    }

    pub async fn delete_proposal(&self, kind: MeetingKind, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_proposal(kind, id).await? {
            return Err(AppError::ResourceNotFound("Proposta de agendamento".to_string()));
        }
        tracing::info!("Proposta de {} {} removida", kind.label(), id);
        Ok(())
    }

    // =========================================================================
    //  AGENDAMENTOS
    // =========================================================================

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppError> {
        self.store
            .find_appointment(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Agendamento".to_string()))
    }

    pub async fn list_appointments(&self, filter: AppointmentFilter) -> Result<Vec<Appointment>, AppError> {
        self.store.list_appointments(&filter).await
    }

    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        new_date: NaiveDate,
        new_time: &str,
        notify_client: bool,
        editable_phone: Option<String>,
    ) -> Result<Appointment, AppError> {
        let current = self.get_appointment(id).await?;
        let time = parse_time(new_time)
            .ok_or_else(|| AppError::BadRequest(format!("Horário inválido: '{}'", new_time)))?;
        let data_hora = confirmed_data_hora(new_date, time);

        let now = Utc::now().with_timezone(&brasilia_offset());
        let line = format!(
            "[{}] Reagendado de {} para {}",
            format_br(&now),
            format_br(&current.data_hora),
            format_br(&data_hora)
        );
        let observacoes = append_line(current.observacoes.as_deref(), &line);
        let phone = editable_phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let updated = self
            .store
            .reschedule_appointment(id, data_hora, &observacoes, phone.as_deref())
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Agendamento".to_string()))?;
        tracing::info!("Agendamento {} reagendado para {}", id, updated.data_hora.to_rfc3339());

        if notify_client {
            match phone.or_else(|| updated.telefone_cliente.clone()) {
                Some(phone) => {
                    self.notifier
                        .dispatch_detached("agendamento_reagendado", phone, appointment_vars(&updated));
                }
                None => tracing::warn!("Agendamento {} sem telefone; cliente não notificado", id),
            }
        }

        Ok(updated)
    }

    pub async fn approve_or_reject_interview(
        &self,
        id: Uuid,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> Result<Appointment, AppError> {
        let current = self.get_appointment(id).await?;
        if current.tipo != MeetingKind::Entrevista {
            return Err(AppError::InvalidTransition(
                "Apenas entrevistas podem ser aprovadas ou reprovadas".to_string(),
            ));
        }

        let reason = rejection_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let (status, line) = if approved {
            ("Aprovado", "Entrevista aprovada".to_string())
        } else {
            match &reason {
                Some(r) => ("Reprovado", format!("Entrevista reprovada: {}", r)),
                None => ("Reprovado", "Entrevista reprovada".to_string()),
            }
        };
        let observacoes = append_line(current.observacoes.as_deref(), &line);

        let updated = self
            .store
            .record_interview_result(id, status, &observacoes, approved)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Agendamento".to_string()))?;
        tracing::info!("Entrevista {} -> {}", id, status);

        if let Some(phone) = updated.telefone_cliente.clone() {
            let mut vars = appointment_vars(&updated);
            let resultado = if approved { "aprovada" } else { "reprovada" };
            vars.insert("resultado", resultado.to_string());
            vars.insert(
                "detalhe",
                reason.map(|r| format!(" Motivo: {}", r)).unwrap_or_default(),
            );
            self.notifier.dispatch_detached("resultado_entrevista", phone, vars);
        }

        Ok(updated)
    }

    pub async fn update_appointment_status(&self, id: Uuid, status: &str) -> Result<Appointment, AppError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(AppError::BadRequest("Status não pode ser vazio".to_string()));
        }
        let updated = self
            .store
            .update_appointment_status(id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Agendamento".to_string()))?;
        tracing::info!("Agendamento {} -> status '{}'", id, status);
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_appointment(id).await? {
            return Err(AppError::ResourceNotFound("Agendamento".to_string()));
        }
        tracing::info!("Agendamento {} removido", id);
        Ok(())
    }

    // =========================================================================
    //  RESPOSTA DO CLIENTE PELO WHATSAPP
    // =========================================================================

    /// "1" ou "2" confirmam a opção no horário inicial; qualquer outra coisa gera nova pergunta.
    pub async fn handle_whatsapp_reply(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<WhatsAppReplyOutcome, AppError> {
        let Some(phone) = phone_from_chat_id(chat_id) else {
            return Ok(WhatsAppReplyOutcome::NoPendingProposal);
        };
        let mut candidates = vec![phone.clone()];
        if let Some(local) = phone.strip_prefix("55") {
            candidates.push(local.to_string());
        }

        let Some(proposal) = self.store.latest_pending_for_phone(&candidates).await? else {
            tracing::info!("Nenhuma proposta pendente para {}", chat_id);
            return Ok(WhatsAppReplyOutcome::NoPendingProposal);
        };

        let option: u8 = match text.trim() {
            "1" => 1,
            "2" => 2,
            _ => {
                let message = self.notifier.render("resposta_invalida", &proposal_vars(&proposal)).await?;
                if let Err(e) = self.notifier.send_to_chat(chat_id, &message).await {
                    tracing::warn!("⚠️ Falha ao reenviar opções para {}: {}", chat_id, e);
                }
                return Ok(WhatsAppReplyOutcome::Reprompted { proposal_id: proposal.id });
            }
        };

        let date = proposal
            .candidate_date(option)
            .ok_or_else(|| AppError::BadRequest(format!("Opção inválida: {}", option)))?;
        let time = proposal.horario_inicio.format("%H:%M").to_string();
        let confirmed = self
            .confirm(proposal.kind, proposal.id, date, Some(i16::from(option)), &time)
            .await?;

        let message = self
            .notifier
            .render("agendamento_confirmado", &appointment_vars(&confirmed.appointment))
            .await?;
        if let Err(e) = self.notifier.send_to_chat(chat_id, &message).await {
            tracing::warn!("⚠️ Falha ao enviar confirmação para {}: {}", chat_id, e);
        }

        Ok(WhatsAppReplyOutcome::Confirmed {
            proposal_id: confirmed.proposal.id,
            appointment_id: confirmed.appointment.id,
        })
    }
}

fn append_line(existing: Option<&str>, line: &str) -> String {
    match existing.map(str::trim_end).filter(|s| !s.is_empty()) {
        Some(text) => format!("{}\n{}", text, line),
        None => line.to_string(),
    }
}

fn proposal_vars(p: &PendingProposal) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("nome_cliente", p.nome_cliente.clone());
    vars.insert("tipo", p.kind.label().to_string());
    vars.insert("data_opcao_1", p.data_opcao_1.format("%d/%m/%Y").to_string());
    vars.insert("data_opcao_2", p.data_opcao_2.format("%d/%m/%Y").to_string());
    vars.insert("horario_inicio", p.horario_inicio.format("%H:%M").to_string());
    vars.insert("horario_fim", p.horario_fim.format("%H:%M").to_string());
    vars
}

fn appointment_vars(a: &Appointment) -> TemplateVars {
    let mut vars = TemplateVars::new();
    vars.insert("nome_cliente", a.nome_cliente.clone().unwrap_or_default());
    vars.insert("tipo", a.tipo.label().to_string());
    vars.insert("data_hora", format_br(&a.data_hora));
    vars.insert("cpf", a.cpf.clone().unwrap_or_default());
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::InMemoryStore,
        models::conformidade::{Modalidade, NewConformidade, TipoContrato},
        testing::RecordingWhatsApp,
    };
    use rust_decimal::Decimal;

    struct Fixture {
        store: Arc<InMemoryStore>,
        whatsapp: Arc<RecordingWhatsApp>,
        service: SchedulingService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let whatsapp = Arc::new(RecordingWhatsApp::default());
        let notifier = NotificationDispatcher::new(store.clone(), whatsapp.clone());
        let service = SchedulingService::new(store.clone(), store.clone(), notifier);
        Fixture { store, whatsapp, service }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn input(conformidade_id: Option<Uuid>) -> ProposalInput {
        ProposalInput {
            nome_cliente: "Maria da Silva".into(),
            telefone_cliente: "(11) 98765-4321".into(),
            data_opcao_1: ymd(2025, 6, 10),
            data_opcao_2: ymd(2025, 6, 12),
            horario_inicio: hm(9, 0),
            horario_fim: hm(17, 0),
            conformidade_id,
        }
    }

    async fn conformidade(store: &InMemoryStore) -> Uuid {
        ConformidadeStore::create(
            store,
            &NewConformidade {
                cpf: "52998224725".into(),
                valor_financiamento: Decimal::new(25000000, 2),
                modalidade: Modalidade::Sbpe,
                modalidade_outro: None,
                tipo_contrato: TipoContrato::Individual,
                comite_credito: false,
                observacoes: None,
                created_by: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn confirm_inside_window_creates_appointment_at_brasilia_time() {
        let f = fixture();
        let cid = conformidade(&f.store).await;
        let proposal = f
            .service
            .propose_meeting(MeetingKind::Entrevista, input(Some(cid)))
            .await
            .unwrap();

        let confirmed = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, proposal.id, ymd(2025, 6, 10), Some(1), "16:59")
            .await
            .unwrap();

        assert_eq!(confirmed.proposal.status, ProposalStatus::Confirmado);
        assert_eq!(confirmed.proposal.opcao_escolhida, Some(1));
        assert_eq!(confirmed.appointment.data_hora.to_rfc3339(), "2025-06-10T16:59:00-03:00");
        assert_eq!(confirmed.appointment.cpf.as_deref(), Some("52998224725"));
        assert_eq!(confirmed.appointment.modalidade.as_deref(), Some("sbpe"));
        assert_eq!(confirmed.appointment.status, "Agendado");

        let c = f.store.with(|s| s.conformidades[0].clone());
        assert_eq!(c.status, "Entrevista agendada");
        assert_eq!(c.entrevista_id, Some(confirmed.appointment.id));
    }

    #[tokio::test]
    async fn boundaries_are_accepted() {
        let f = fixture();
        for time in ["09:00", "17:00"] {
            let p = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();
            f.service
                .confirm_meeting(MeetingKind::Entrevista, p.id, ymd(2025, 6, 12), Some(2), time)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn time_outside_window_is_rejected_before_any_write() {
        let f = fixture();
        let proposal = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();
        let writes_before = f.store.writes();

        let err = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, proposal.id, ymd(2025, 6, 10), Some(1), "17:01")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::TimeOutsideWindow { .. }));
        assert_eq!(f.store.writes(), writes_before);
        assert!(f.store.with(|s| s.appointments.is_empty()));
        assert_eq!(f.store.with(|s| s.proposals[0].status), ProposalStatus::Pendente);
    }

    #[tokio::test]
    async fn second_confirmation_is_a_conflict_and_changes_nothing() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Assinatura, input(None)).await.unwrap();
        f.service
            .confirm_meeting(MeetingKind::Assinatura, p.id, ymd(2025, 6, 10), Some(1), "10:00")
            .await
            .unwrap();

        let err = f
            .service
            .confirm_meeting(MeetingKind::Assinatura, p.id, ymd(2025, 6, 12), Some(2), "11:00")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ProposalAlreadyConfirmed));
        assert_eq!(f.store.with(|s| s.appointments.len()), 1);
        assert_eq!(f.store.with(|s| s.proposals[0].opcao_escolhida), Some(1));
    }

    #[tokio::test]
    async fn option_must_match_candidate_date_but_free_date_is_allowed() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();

        let err = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, p.id, ymd(2025, 6, 12), Some(1), "10:00")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let confirmed = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, p.id, ymd(2025, 6, 20), None, "10:00")
            .await
            .unwrap();
        assert!(confirmed.appointment.observacoes.unwrap().contains("data alternativa"));
    }

    #[tokio::test]
    async fn signature_requires_approved_interview() {
        let f = fixture();
        let cid = conformidade(&f.store).await;

        let err = f
            .service
            .propose_meeting(MeetingKind::Assinatura, input(Some(cid)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InterviewNotApproved));

        f.store.with(|s| s.conformidades[0].entrevista_aprovada = Some(true));
        f.service
            .propose_meeting(MeetingKind::Assinatura, input(Some(cid)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inverted_window_is_rejected() {
        let f = fixture();
        let mut bad = input(None);
        bad.horario_inicio = hm(18, 0);
        assert!(matches!(
            f.service.propose_meeting(MeetingKind::Entrevista, bad).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn reschedule_appends_audit_line_and_keeps_offset() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();
        let c = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, p.id, ymd(2025, 6, 10), Some(1), "16:59")
            .await
            .unwrap();

        let updated = f
            .service
            .reschedule_appointment(c.appointment.id, ymd(2025, 6, 12), "10:00", false, Some("11 91234-5678".into()))
            .await
            .unwrap();

        assert_eq!(updated.data_hora.to_rfc3339(), "2025-06-12T10:00:00-03:00");
        assert_eq!(updated.telefone_cliente.as_deref(), Some("11 91234-5678"));
        let notes = updated.observacoes.unwrap();
        assert!(notes.starts_with("Entrevista confirmada"));
        assert!(notes.contains("Reagendado de 10/06/2025 16:59 para 12/06/2025 10:00"));
    }

    #[tokio::test]
    async fn interview_result_is_reflected_on_conformidade() {
        let f = fixture();
        let cid = conformidade(&f.store).await;
        let p = f.service.propose_meeting(MeetingKind::Entrevista, input(Some(cid))).await.unwrap();
        let c = f
            .service
            .confirm_meeting(MeetingKind::Entrevista, p.id, ymd(2025, 6, 10), Some(1), "10:00")
            .await
            .unwrap();

        let rejected = f
            .service
            .approve_or_reject_interview(c.appointment.id, false, Some("renda incompatível".into()))
            .await
            .unwrap();

        assert_eq!(rejected.status, "Reprovado");
        assert!(rejected.observacoes.unwrap().ends_with("Entrevista reprovada: renda incompatível"));
        assert_eq!(f.store.with(|s| s.conformidades[0].entrevista_aprovada), Some(false));
    }

    #[tokio::test]
    async fn only_interviews_can_be_approved() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Assinatura, input(None)).await.unwrap();
        let c = f
            .service
            .confirm_meeting(MeetingKind::Assinatura, p.id, ymd(2025, 6, 10), Some(1), "10:00")
            .await
            .unwrap();

        let err = f
            .service
            .approve_or_reject_interview(c.appointment.id, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn whatsapp_reply_confirms_option_at_window_start() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();

        let outcome = f
            .service
            .handle_whatsapp_reply("5511987654321@c.us", " 2 ")
            .await
            .unwrap();

        let appointment = f.store.with(|s| s.appointments[0].clone());
        assert_eq!(
            outcome,
            WhatsAppReplyOutcome::Confirmed { proposal_id: p.id, appointment_id: appointment.id }
        );
        assert_eq!(appointment.data_hora.to_rfc3339(), "2025-06-12T09:00:00-03:00");
        assert!(f
            .whatsapp
            .sent()
            .iter()
            .any(|(chat, msg)| chat == "5511987654321@c.us" && msg.contains("12/06/2025 09:00")));
    }

    #[tokio::test]
    async fn whatsapp_reply_with_other_text_reprompts() {
        let f = fixture();
        let p = f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();

        let outcome = f.service.handle_whatsapp_reply("5511987654321@c.us", "sim").await.unwrap();

        assert_eq!(outcome, WhatsAppReplyOutcome::Reprompted { proposal_id: p.id });
        assert_eq!(f.store.with(|s| s.proposals[0].status), ProposalStatus::Pendente);
        assert!(f
            .whatsapp
            .sent()
            .iter()
            .any(|(_, msg)| msg.starts_with("Não entendi sua resposta")));
    }

    #[tokio::test]
    async fn whatsapp_reply_from_unknown_number_is_ignored() {
        let f = fixture();
        f.service.propose_meeting(MeetingKind::Entrevista, input(None)).await.unwrap();
        let outcome = f.service.handle_whatsapp_reply("5521900000000@c.us", "1").await.unwrap();
        assert_eq!(outcome, WhatsAppReplyOutcome::NoPendingProposal);
    }
}
