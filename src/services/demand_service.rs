// src/services/demand_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        text::{is_valid_cpf, only_digits},
    },
    db::DemandStore,
    models::demand::{Demand, DemandStatus, NewDemand, MAX_DEMAND_FILES},
};

#[derive(Clone)]
pub struct DemandService {
    store: Arc<dyn DemandStore>,
}

impl DemandService {
    pub fn new(store: Arc<dyn DemandStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, mut new: NewDemand) -> Result<Demand, AppError> {
        new.arquivos.retain(|a| !a.trim().is_empty());
        if new.arquivos.len() > MAX_DEMAND_FILES {
            return Err(AppError::BadRequest(format!(
                "Uma demanda aceita no máximo {} arquivos",
                MAX_DEMAND_FILES
            )));
        }

        new.cpf = match new.cpf.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(cpf) if is_valid_cpf(cpf) => Some(only_digits(cpf)),
            Some(_) => return Err(AppError::BadRequest("CPF inválido".to_string())),
            None => None,
        };

        let demand = self.store.create_demand(&new).await?;
        tracing::info!("Demanda {} ({}) criada por {}", demand.id, demand.tipo.as_str(), demand.solicitante_id);
        Ok(demand)
    }

    pub async fn get(&self, id: Uuid) -> Result<Demand, AppError> {
        self.store
            .find_demand(id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Demanda".to_string()))
    }

    pub async fn list(&self, status: Option<DemandStatus>) -> Result<Vec<Demand>, AppError> {
        self.store.list_demands(status).await
    }

    /// Demanda ainda aberta; concluídas e canceladas não aceitam mais alterações.
    async fn open_demand(&self, id: Uuid) -> Result<Demand, AppError> {
        let demand = self.get(id).await?;
        if demand.status.is_closed() {
            return Err(AppError::InvalidTransition(
                "A demanda já foi encerrada e não aceita alterações".to_string(),
            ));
        }
        Ok(demand)
    }

    pub async fn respond(
        &self,
        id: Uuid,
        resposta: &str,
        status: Option<DemandStatus>,
    ) -> Result<Demand, AppError> {
        let resposta = resposta.trim();
        if resposta.is_empty() {
            return Err(AppError::BadRequest("A resposta não pode ser vazia".to_string()));
        }
        let current = self.open_demand(id).await?;
        let status = status.unwrap_or(current.status);

        let updated = self
            .store
            .respond(id, resposta, status)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Demanda".to_string()))?;
        tracing::info!("Demanda {} respondida ({:?})", id, updated.status);
        Ok(updated)
    }

    pub async fn attach_signed_document(&self, id: Uuid, path: &str) -> Result<Demand, AppError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(AppError::BadRequest("Caminho do documento é obrigatório".to_string()));
        }
        self.open_demand(id).await?;

        let updated = self
            .store
            .attach_signed_document(id, path)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Demanda".to_string()))?;
        tracing::info!("Documento assinado anexado à demanda {}", id);
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<Demand, AppError> {
        self.open_demand(id).await?;
        let updated = self
            .store
            .set_status(id, DemandStatus::Cancelada)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Demanda".to_string()))?;
        tracing::info!("Demanda {} cancelada", id);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::memory::InMemoryStore, models::demand::DemandType};

    fn new(arquivos: usize) -> NewDemand {
        NewDemand {
            tipo: DemandType::ReemissaoBoleto,
            cpf: Some("529.982.247-25".into()),
            matricula: None,
            cartorio: None,
            descricao: Some("Boleto vencido".into()),
            arquivos: (0..arquivos).map(|i| format!("demandas/arquivo_{}.pdf", i)).collect(),
            solicitante_id: Uuid::new_v4(),
        }
    }

    fn service() -> DemandService {
        DemandService::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn create_keeps_up_to_five_files() {
        let service = service();
        let demand = service.create(new(5)).await.unwrap();
        assert_eq!(demand.arquivo_1.as_deref(), Some("demandas/arquivo_0.pdf"));
        assert_eq!(demand.arquivo_5.as_deref(), Some("demandas/arquivo_4.pdf"));
        assert_eq!(demand.cpf.as_deref(), Some("52998224725"));
        assert_eq!(demand.status, DemandStatus::Pendente);

        assert!(matches!(service.create(new(6)).await, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn respond_then_sign() {
        let service = service();
        let d = service.create(new(1)).await.unwrap();

        let answered = service
            .respond(d.id, "Boleto reemitido", Some(DemandStatus::AguardandoAssinatura))
            .await
            .unwrap();
        assert_eq!(answered.status, DemandStatus::AguardandoAssinatura);

        let signed = service.attach_signed_document(d.id, "assinados/d1.pdf").await.unwrap();
        assert_eq!(signed.status, DemandStatus::Assinada);
        assert_eq!(signed.documento_assinado.as_deref(), Some("assinados/d1.pdf"));
    }

    #[tokio::test]
    async fn closed_demand_rejects_changes() {
        let service = service();
        let d = service.create(new(0)).await.unwrap();
        service.cancel(d.id).await.unwrap();

        assert!(matches!(
            service.respond(d.id, "tarde demais", None).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(service.cancel(d.id).await, Err(AppError::InvalidTransition(_))));
    }
}
