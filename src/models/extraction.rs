// src/models/extraction.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CertidaoCasamento,
    MatriculaImovel,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::CertidaoCasamento => "certidao_casamento",
            DocumentKind::MatriculaImovel => "matricula_imovel",
        }
    }
}

// Campos extraídos da certidão de casamento
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MarriageCertificateData {
    #[serde(default)]
    pub livro: String,
    #[serde(default)]
    pub folha: String,
    #[serde(default)]
    pub numero_registro: String,
    #[serde(default)]
    pub cartorio: String,
    #[serde(default)]
    pub cidade: String,
}

// Campos extraídos da matrícula do imóvel
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PropertyRegistrationData {
    #[serde(default)]
    pub tipo_imovel: String,
    #[serde(default)]
    pub endereco: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DocumentExtraction {
    pub id: Uuid,
    pub tipo: String,
    #[schema(value_type = Object)]
    pub dados: Value,
    pub texto_gerado: String,
    pub created_at: DateTime<Utc>,
}

/// Documento enviado para a IA: PDF vai como arquivo, imagem como data URL.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentPayload {
    Pdf { base64: String },
    Image { mime: String, base64: String },
}

impl DocumentPayload {
    pub fn from_upload(base64: String, file_type: Option<&str>) -> Self {
        match file_type.map(|t| t.trim().to_ascii_lowercase()) {
            Some(mime) if mime.starts_with("image/") => DocumentPayload::Image { mime, base64 },
            _ => DocumentPayload::Pdf { base64 },
        }
    }
}
