// src/models/demand.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_demanda", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DemandType {
    AutorizacaoVistoria,
    CancelamentoContrato,
    AlteracaoDados,
    ReemissaoBoleto,
    EmissaoCertidao,
    LiberacaoRecursos,
    Averbacao,
    SegundaViaContrato,
    Outros,
}

impl DemandType {
    pub fn as_str(self) -> &'static str {
        match self {
            DemandType::AutorizacaoVistoria => "autorizacao_vistoria",
            DemandType::CancelamentoContrato => "cancelamento_contrato",
            DemandType::AlteracaoDados => "alteracao_dados",
            DemandType::ReemissaoBoleto => "reemissao_boleto",
            DemandType::EmissaoCertidao => "emissao_certidao",
            DemandType::LiberacaoRecursos => "liberacao_recursos",
            DemandType::Averbacao => "averbacao",
            DemandType::SegundaViaContrato => "segunda_via_contrato",
            DemandType::Outros => "outros",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DemandType::AutorizacaoVistoria => "Autorização de vistoria",
            DemandType::CancelamentoContrato => "Cancelamento de contrato",
            DemandType::AlteracaoDados => "Alteração de dados",
            DemandType::ReemissaoBoleto => "Reemissão de boleto",
            DemandType::EmissaoCertidao => "Emissão de certidão",
            DemandType::LiberacaoRecursos => "Liberação de recursos",
            DemandType::Averbacao => "Averbação",
            DemandType::SegundaViaContrato => "Segunda via de contrato",
            DemandType::Outros => "Outros",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_demanda", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DemandStatus {
    Pendente,
    AguardandoAssinatura,
    Assinada,
    Concluida,
    Cancelada,
}

impl DemandStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, DemandStatus::Concluida | DemandStatus::Cancelada)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Demand {
    pub id: Uuid,
    pub tipo: DemandType,
    pub cpf: Option<String>,
    pub matricula: Option<String>,
    pub cartorio: Option<String>,
    pub descricao: Option<String>,
    pub arquivo_1: Option<String>,
    pub arquivo_2: Option<String>,
    pub arquivo_3: Option<String>,
    pub arquivo_4: Option<String>,
    pub arquivo_5: Option<String>,
    pub resposta: Option<String>,
    pub status: DemandStatus,
    pub documento_assinado: Option<String>,
    pub solicitante_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const MAX_DEMAND_FILES: usize = 5;

#[derive(Debug, Clone)]
pub struct NewDemand {
    pub tipo: DemandType,
    pub cpf: Option<String>,
    pub matricula: Option<String>,
    pub cartorio: Option<String>,
    pub descricao: Option<String>,
    pub arquivos: Vec<String>,
    pub solicitante_id: Uuid,
}
