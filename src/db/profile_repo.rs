// src/db/profile_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::Profile};

/// Diretório de usuários (empregados e CCAs) mantido pelo provedor de autenticação.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError>;
}

// O repositório de perfis, responsável pela tabela 'profiles'
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for ProfileRepository {
    // Busca um perfil pelo seu ID
    async fn find_profile(&self, id: Uuid) -> Result<Option<Profile>, AppError> {
        let maybe_profile = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, nome, email, email_preferencia, telefone, created_at
            FROM profiles
            WHERE id = $1
            "#,
        )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(maybe_profile)
    }
}
