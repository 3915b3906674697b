// src/services/conformidade_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        text::{is_valid_cpf, only_digits},
    },
    db::ConformidadeStore,
    models::conformidade::{Conformidade, ConformidadeFilter, Modalidade, NewConformidade},
};

#[derive(Clone)]
pub struct ConformidadeService {
    store: Arc<dyn ConformidadeStore>,
}

impl ConformidadeService {
    pub fn new(store: Arc<dyn ConformidadeStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut new: NewConformidade) -> Result<Conformidade, AppError> {
        if !is_valid_cpf(&new.cpf) {
            return Err(AppError::BadRequest("CPF inválido".to_string()));
        }
        new.cpf = only_digits(&new.cpf);

        if new.valor_financiamento <= Decimal::ZERO {
            return Err(AppError::BadRequest(
                "O valor do financiamento deve ser maior que zero".to_string(),
            ));
        }

        if new.modalidade == Modalidade::Outro {
            if new.modalidade_outro.as_deref().is_none_or(|s| s.trim().is_empty()) {
                return Err(AppError::BadRequest(
                    "Informe a modalidade quando escolher OUTRO".to_string(),
                ));
            }
        } else {
            new.modalidade_outro = None;
        }

        let created = self.store.create(&new).await?;
        tracing::info!("Conformidade {} criada para o CPF {}", created.id, created.cpf);
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<Conformidade, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))
    }

    pub async fn list(&self, mut filter: ConformidadeFilter) -> Result<Vec<Conformidade>, AppError> {
        filter.cpf = filter.cpf.map(|c| only_digits(&c)).filter(|c| !c.is_empty());
        self.store.list(&filter).await
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> Result<Conformidade, AppError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(AppError::BadRequest("Status não pode ser vazio".to_string()));
        }
        let updated = self
            .store
            .update_status(id, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))?;
        tracing::info!("Conformidade {} -> status '{}'", id, status);
        Ok(updated)
    }

    pub async fn update_notes(&self, id: Uuid, observacoes: Option<&str>) -> Result<Conformidade, AppError> {
        self.store
            .update_notes(id, observacoes)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))
    }

    pub async fn set_interview_approved(&self, id: Uuid, approved: bool) -> Result<Conformidade, AppError> {
        let updated = self
            .store
            .set_interview_approved(id, approved)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Conformidade".to_string()))?;
        tracing::info!("Conformidade {}: entrevista aprovada = {}", id, approved);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(AppError::ResourceNotFound("Conformidade".to_string()));
        }
        tracing::info!("Conformidade {} removida", id);
        Ok(())
    }
}
