// src/db/extraction_repo.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::extraction::{DocumentExtraction, DocumentKind},
};

#[async_trait]
pub trait ExtractionStore: Send + Sync {
    async fn save_extraction(
        &self,
        kind: DocumentKind,
        dados: &Value,
        texto_gerado: &str,
    ) -> Result<DocumentExtraction, AppError>;
}

#[derive(Clone)]
pub struct ExtractionRepository {
    pool: PgPool,
}

impl ExtractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExtractionStore for ExtractionRepository {
    async fn save_extraction(
        &self,
        kind: DocumentKind,
        dados: &Value,
        texto_gerado: &str,
    ) -> Result<DocumentExtraction, AppError> {
        let saved = sqlx::query_as::<_, DocumentExtraction>(
            r#"
            INSERT INTO extracoes_documentos (tipo, dados, texto_gerado)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
            .bind(kind.as_str())
            .bind(dados)
            .bind(texto_gerado)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }
}
