// src/models/conformidade.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "modalidade_financiamento", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modalidade {
    Sbpe,
    Mcmv,
    Outro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_contrato", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoContrato {
    Individual,
    Empreendimento,
}

// --- Caso de conformidade ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Conformidade {
    pub id: Uuid,
    #[schema(example = "52998224725")]
    pub cpf: String,
    #[schema(example = "250000.00")]
    pub valor_financiamento: Decimal,
    pub modalidade: Modalidade,
    // Só preenchido quando a modalidade é OUTRO
    pub modalidade_outro: Option<String>,
    pub tipo_contrato: TipoContrato,
    pub comite_credito: bool,
    pub observacoes: Option<String>,
    #[schema(example = "Em análise")]
    pub status: String,
    pub entrevista_id: Option<Uuid>,
    pub entrevista_aprovada: Option<bool>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conformidade {
    /// Rótulo da modalidade como aparece para o usuário (SBPE, MCMV ou o texto livre).
    pub fn modalidade_label(&self) -> String {
        match self.modalidade {
            Modalidade::Sbpe => "SBPE".to_string(),
            Modalidade::Mcmv => "MCMV".to_string(),
            Modalidade::Outro => self
                .modalidade_outro
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Outro".to_string()),
        }
    }

    pub fn interview_approved(&self) -> bool {
        self.entrevista_aprovada.unwrap_or(false)
    }
}

/// Dados já validados para inserir uma nova conformidade.
#[derive(Debug, Clone)]
pub struct NewConformidade {
    pub cpf: String,
    pub valor_financiamento: Decimal,
    pub modalidade: Modalidade,
    pub modalidade_outro: Option<String>,
    pub tipo_contrato: TipoContrato,
    pub comite_credito: bool,
    pub observacoes: Option<String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ConformidadeFilter {
    pub status: Option<String>,
    pub cpf: Option<String>,
}

#[cfg(test)]
pub(crate) fn sample_conformidade(modalidade: Modalidade) -> Conformidade {
    Conformidade {
        id: Uuid::new_v4(),
        cpf: "52998224725".to_string(),
        valor_financiamento: Decimal::new(25000000, 2),
        modalidade,
        modalidade_outro: None,
        tipo_contrato: TipoContrato::Individual,
        comite_credito: false,
        observacoes: None,
        status: "Em análise".to_string(),
        entrevista_id: None,
        entrevista_aprovada: None,
        created_by: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
