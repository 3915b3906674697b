// src/db/demand_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::demand::{Demand, DemandStatus, NewDemand},
};

#[async_trait]
pub trait DemandStore: Send + Sync {
    async fn create_demand(&self, new: &NewDemand) -> Result<Demand, AppError>;
    async fn find_demand(&self, id: Uuid) -> Result<Option<Demand>, AppError>;
    async fn list_demands(&self, status: Option<DemandStatus>) -> Result<Vec<Demand>, AppError>;
    async fn respond(
        &self,
        id: Uuid,
        resposta: &str,
        status: DemandStatus,
    ) -> Result<Option<Demand>, AppError>;
    /// Grava o documento; só passa a `assinada` se a demanda ainda estiver aberta.
    async fn attach_signed_document(&self, id: Uuid, path: &str) -> Result<Option<Demand>, AppError>;
    async fn set_status(&self, id: Uuid, status: DemandStatus) -> Result<Option<Demand>, AppError>;
}

#[derive(Clone)]
pub struct DemandRepository {
    pool: PgPool,
}

impl DemandRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DemandStore for DemandRepository {
    async fn create_demand(&self, new: &NewDemand) -> Result<Demand, AppError> {
        let arquivo = |i: usize| new.arquivos.get(i).map(String::as_str);

        let demand = sqlx::query_as::<_, Demand>(
            r#"
            INSERT INTO demandas (
                tipo, cpf, matricula, cartorio, descricao,
                arquivo_1, arquivo_2, arquivo_3, arquivo_4, arquivo_5,
                solicitante_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
            .bind(new.tipo)
            .bind(new.cpf.as_deref())
            .bind(new.matricula.as_deref())
            .bind(new.cartorio.as_deref())
            .bind(new.descricao.as_deref())
            .bind(arquivo(0))
            .bind(arquivo(1))
            .bind(arquivo(2))
            .bind(arquivo(3))
            .bind(arquivo(4))
            .bind(new.solicitante_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(demand)
    }

    async fn find_demand(&self, id: Uuid) -> Result<Option<Demand>, AppError> {
        let maybe = sqlx::query_as::<_, Demand>("SELECT * FROM demandas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn list_demands(&self, status: Option<DemandStatus>) -> Result<Vec<Demand>, AppError> {
        let rows = sqlx::query_as::<_, Demand>(
            r#"
            SELECT * FROM demandas
            WHERE ($1::status_demanda IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn respond(
        &self,
        id: Uuid,
        resposta: &str,
        status: DemandStatus,
    ) -> Result<Option<Demand>, AppError> {
        let maybe = sqlx::query_as::<_, Demand>(
            r#"
            UPDATE demandas SET resposta = $1, status = $2, updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
            .bind(resposta)
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn attach_signed_document(&self, id: Uuid, path: &str) -> Result<Option<Demand>, AppError> {
        let maybe = sqlx::query_as::<_, Demand>(
            r#"
            UPDATE demandas
            SET documento_assinado = $1,
                status = CASE WHEN status IN ('concluida', 'cancelada') THEN status ELSE 'assinada' END,
                updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
            .bind(path)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }

    async fn set_status(&self, id: Uuid, status: DemandStatus) -> Result<Option<Demand>, AppError> {
        let maybe = sqlx::query_as::<_, Demand>(
            "UPDATE demandas SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe)
    }
}
