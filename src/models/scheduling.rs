// src/models/scheduling.rs

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::conformidade::{Conformidade, TipoContrato};

/// Fuso fixo de Brasília usado em todos os horários confirmados.
pub const BRASILIA_OFFSET_SECONDS: i32 = 3 * 3600;

pub fn brasilia_offset() -> FixedOffset {
    FixedOffset::west_opt(BRASILIA_OFFSET_SECONDS).expect("offset de -03:00 é válido")
}

// --- Enums ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_agendamento", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MeetingKind {
    #[default]
    Entrevista,
    Assinatura,
}

impl MeetingKind {
    pub fn proposals_table(self) -> &'static str {
        match self {
            MeetingKind::Entrevista => "entrevistas_agendamento",
            MeetingKind::Assinatura => "assinaturas_agendamento",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeetingKind::Entrevista => "entrevista",
            MeetingKind::Assinatura => "assinatura",
        }
    }

    /// Status inicial do agendamento criado na confirmação.
    pub fn confirmed_status(self) -> &'static str {
        match self {
            MeetingKind::Entrevista => "Agendado",
            MeetingKind::Assinatura => "Assinatura agendada",
        }
    }

    /// Status gravado na conformidade vinculada após a confirmação.
    pub fn conformidade_status(self) -> &'static str {
        match self {
            MeetingKind::Entrevista => "Entrevista agendada",
            MeetingKind::Assinatura => "Assinatura agendada",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_proposta", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pendente,
    Confirmado,
}

// --- Proposta pendente (duas datas candidatas) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PendingProposal {
    pub id: Uuid,
    // Não é coluna: preenchido pelo repositório conforme a tabela lida
    #[sqlx(skip)]
    #[serde(default)]
    pub kind: MeetingKind,
    #[schema(example = "Maria da Silva")]
    pub nome_cliente: String,
    #[schema(example = "11987654321")]
    pub telefone_cliente: String,
    pub data_opcao_1: NaiveDate,
    pub data_opcao_2: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub horario_inicio: NaiveTime,
    #[schema(value_type = String, example = "17:00:00")]
    pub horario_fim: NaiveTime,
    pub conformidade_id: Option<Uuid>,
    pub status: ProposalStatus,
    pub data_confirmada: Option<NaiveDate>,
    pub opcao_escolhida: Option<i16>,
    #[schema(value_type = Option<String>)]
    pub horario_confirmado: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingProposal {
    pub fn candidate_date(&self, option: u8) -> Option<NaiveDate> {
        match option {
            1 => Some(self.data_opcao_1),
            2 => Some(self.data_opcao_2),
            _ => None,
        }
    }

    /// Janela inclusiva nas duas pontas, comparada em minutos.
    pub fn window_contains(&self, time: NaiveTime) -> bool {
        let t = truncate_to_minute(time);
        truncate_to_minute(self.horario_inicio) <= t && t <= truncate_to_minute(self.horario_fim)
    }
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub kind: MeetingKind,
    pub nome_cliente: String,
    pub telefone_cliente: String,
    pub data_opcao_1: NaiveDate,
    pub data_opcao_2: NaiveDate,
    pub horario_inicio: NaiveTime,
    pub horario_fim: NaiveTime,
    pub conformidade_id: Option<Uuid>,
}

/// O que foi escolhido pelo cliente/agente ao confirmar uma proposta.
#[derive(Debug, Clone)]
pub struct ChosenSlot {
    pub date: NaiveDate,
    pub option: Option<i16>,
    pub time: NaiveTime,
}

impl ChosenSlot {
    pub fn data_hora(&self) -> DateTime<FixedOffset> {
        confirmed_data_hora(self.date, self.time)
    }
}

// --- Agendamento confirmado ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Appointment {
    pub id: Uuid,
    pub tipo: MeetingKind,
    pub cpf: Option<String>,
    pub tipo_contrato: Option<TipoContrato>,
    #[schema(example = "sbpe")]
    pub modalidade: Option<String>,
    #[schema(value_type = String, example = "2025-06-10T16:59:00-03:00")]
    pub data_hora: DateTime<FixedOffset>,
    #[schema(example = "Agendado")]
    pub status: String,
    pub observacoes: Option<String>,
    pub conformidade_id: Option<Uuid>,
    pub nome_cliente: Option<String>,
    pub telefone_cliente: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// O Postgres devolve TIMESTAMPTZ em UTC; a API sempre expõe -03:00.
    pub fn in_brasilia(mut self) -> Self {
        self.data_hora = self.data_hora.with_timezone(&brasilia_offset());
        self
    }
}

/// Agendamento a inserir; CPF, contrato e modalidade vêm da conformidade vinculada.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub tipo: MeetingKind,
    pub cpf: Option<String>,
    pub tipo_contrato: Option<TipoContrato>,
    pub modalidade: Option<String>,
    pub data_hora: DateTime<FixedOffset>,
    pub status: String,
    pub observacoes: String,
    pub conformidade_id: Option<Uuid>,
    pub nome_cliente: String,
    pub telefone_cliente: String,
}

impl NewAppointment {
    pub fn from_confirmation(
        proposal: &PendingProposal,
        slot: &ChosenSlot,
        conformidade: Option<&Conformidade>,
    ) -> Self {
        Self {
            tipo: proposal.kind,
            cpf: conformidade.map(|c| c.cpf.clone()),
            tipo_contrato: conformidade.map(|c| c.tipo_contrato),
            modalidade: conformidade.map(|c| c.modalidade_label().to_lowercase()),
            data_hora: slot.data_hora(),
            status: proposal.kind.confirmed_status().to_string(),
            observacoes: confirmation_note(proposal, slot),
            conformidade_id: proposal.conformidade_id,
            nome_cliente: proposal.nome_cliente.clone(),
            telefone_cliente: proposal.telefone_cliente.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AppointmentFilter {
    pub tipo: Option<MeetingKind>,
    pub cpf: Option<String>,
}

// --- Helpers de data/hora ---

pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(
        chrono::Timelike::hour(&time),
        chrono::Timelike::minute(&time),
        0,
    )
    .unwrap_or(time)
}

/// Data + hora (minutos) no fuso fixo de -03:00.
pub fn confirmed_data_hora(date: NaiveDate, time: NaiveTime) -> DateTime<FixedOffset> {
    let local = NaiveDateTime::new(date, truncate_to_minute(time));
    let utc = local + chrono::Duration::seconds(i64::from(BRASILIA_OFFSET_SECONDS));
    DateTime::from_naive_utc_and_offset(utc, brasilia_offset())
}

/// Aceita "HH:MM" ou "HH:MM:SS".
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn format_br(data_hora: &DateTime<FixedOffset>) -> String {
    data_hora
        .with_timezone(&brasilia_offset())
        .format("%d/%m/%Y %H:%M")
        .to_string()
}

fn confirmation_note(proposal: &PendingProposal, slot: &ChosenSlot) -> String {
    let escolha = match slot.option {
        Some(n) => format!("opção {}", n),
        None => "data alternativa".to_string(),
    };
    format!(
        "{} confirmada por {} ({}) - {} em {}",
        capitalize(proposal.kind.label()),
        proposal.nome_cliente,
        proposal.telefone_cliente,
        escolha,
        format_br(&slot.data_hora()),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) fn sample_proposal(kind: MeetingKind) -> PendingProposal {
    PendingProposal {
        id: Uuid::new_v4(),
        kind,
        nome_cliente: "Maria da Silva".to_string(),
        telefone_cliente: "11987654321".to_string(),
        data_opcao_1: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
        data_opcao_2: NaiveDate::from_ymd_opt(2025, 6, 12).unwrap(),
        horario_inicio: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        horario_fim: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        conformidade_id: None,
        status: ProposalStatus::Pendente,
        data_confirmada: None,
        opcao_escolhida: None,
        horario_confirmado: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
