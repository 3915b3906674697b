// src/db/template_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::template::{Template, TemplateChannel, TemplateUpsert},
};

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_template(
        &self,
        channel: TemplateChannel,
        chave: &str,
    ) -> Result<Option<Template>, AppError>;
    async fn list_templates(&self, channel: TemplateChannel) -> Result<Vec<Template>, AppError>;
    async fn upsert_template(
        &self,
        channel: TemplateChannel,
        template: &TemplateUpsert,
    ) -> Result<Template, AppError>;
}

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateStore for TemplateRepository {
    async fn find_template(
        &self,
        channel: TemplateChannel,
        chave: &str,
    ) -> Result<Option<Template>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE chave = $1", channel.table());
        let maybe = sqlx::query_as::<_, Template>(&sql)
            .bind(chave)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn list_templates(&self, channel: TemplateChannel) -> Result<Vec<Template>, AppError> {
        let sql = format!("SELECT * FROM {} ORDER BY chave", channel.table());
        let rows = sqlx::query_as::<_, Template>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn upsert_template(
        &self,
        channel: TemplateChannel,
        template: &TemplateUpsert,
    ) -> Result<Template, AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (chave, nome, assunto, corpo, variaveis)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chave) DO UPDATE
            SET nome = EXCLUDED.nome, assunto = EXCLUDED.assunto,
                corpo = EXCLUDED.corpo, variaveis = EXCLUDED.variaveis,
                updated_at = NOW()
            RETURNING *
            "#,
            channel.table()
        );
        let saved = sqlx::query_as::<_, Template>(&sql)
            .bind(&template.chave)
            .bind(&template.nome)
            .bind(template.assunto.as_deref())
            .bind(&template.corpo)
            .bind(&template.variaveis)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }
}
