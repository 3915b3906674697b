// src/db/conformidade_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::conformidade::{Conformidade, ConformidadeFilter, NewConformidade},
};

#[async_trait]
pub trait ConformidadeStore: Send + Sync {
    async fn create(&self, new: &NewConformidade) -> Result<Conformidade, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conformidade>, AppError>;
    async fn list(&self, filter: &ConformidadeFilter) -> Result<Vec<Conformidade>, AppError>;
    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Conformidade>, AppError>;
    async fn update_notes(
        &self,
        id: Uuid,
        observacoes: Option<&str>,
    ) -> Result<Option<Conformidade>, AppError>;
    async fn set_interview_approved(
        &self,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Conformidade>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

// O repositório de conformidades, responsável pela tabela 'conformidades'
#[derive(Clone)]
pub struct ConformidadeRepository {
    pool: PgPool,
}

impl ConformidadeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConformidadeStore for ConformidadeRepository {
    async fn create(&self, new: &NewConformidade) -> Result<Conformidade, AppError> {
        let conformidade = sqlx::query_as::<_, Conformidade>(
            r#"
            INSERT INTO conformidades (
                cpf, valor_financiamento, modalidade, modalidade_outro,
                tipo_contrato, comite_credito, observacoes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
            .bind(&new.cpf)
            .bind(new.valor_financiamento)
            .bind(new.modalidade)
            .bind(new.modalidade_outro.as_deref())
            .bind(new.tipo_contrato)
            .bind(new.comite_credito)
            .bind(new.observacoes.as_deref())
            .bind(new.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // CPF é único por mutuário
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AppError::CpfAlreadyExists;
                    }
                }
                e.into()
            })?;

        Ok(conformidade)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Conformidade>, AppError> {
        let maybe = sqlx::query_as::<_, Conformidade>("SELECT * FROM conformidades WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn list(&self, filter: &ConformidadeFilter) -> Result<Vec<Conformidade>, AppError> {
        let rows = sqlx::query_as::<_, Conformidade>(
            r#"
            SELECT * FROM conformidades
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR cpf = $2)
            ORDER BY created_at DESC
            "#,
        )
            .bind(filter.status.as_deref())
            .bind(filter.cpf.as_deref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Conformidade>, AppError> {
        let maybe = sqlx::query_as::<_, Conformidade>(
            "UPDATE conformidades SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn update_notes(
        &self,
        id: Uuid,
        observacoes: Option<&str>,
    ) -> Result<Option<Conformidade>, AppError> {
        let maybe = sqlx::query_as::<_, Conformidade>(
            "UPDATE conformidades SET observacoes = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
            .bind(observacoes)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn set_interview_approved(
        &self,
        id: Uuid,
        approved: bool,
    ) -> Result<Option<Conformidade>, AppError> {
        let maybe = sqlx::query_as::<_, Conformidade>(
            r#"
            UPDATE conformidades
            SET entrevista_aprovada = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
            .bind(approved)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM conformidades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
