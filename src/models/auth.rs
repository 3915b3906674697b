// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Perfil de um usuário (empregado da agência ou CCA)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    // E-mail escolhido para receber tarefas; sem ele o empregado não recebe distribuição
    pub email_preferencia: Option<String>,
    pub telefone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") do JWT emitido pelo provedor de autenticação
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,           // Subject (ID do usuário)
    pub exp: usize,          // Expiration time
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}
