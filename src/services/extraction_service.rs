// src/services/extraction_service.rs

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    clients::{DocumentExtractor, ExtractionRequest},
    common::error::AppError,
    db::ExtractionStore,
    models::extraction::{
        DocumentKind, DocumentPayload, MarriageCertificateData, PropertyRegistrationData,
    },
};

const SYSTEM_PROMPT: &str = "Você é um assistente especializado em ler documentos cartoriais \
brasileiros. Extraia apenas o que está escrito no documento e deixe vazio o campo que não \
for encontrado.";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExtractionResult {
    pub texto_gerado: String,
    #[schema(value_type = Object)]
    pub dados_extraidos: Value,
}

#[derive(Clone)]
pub struct ExtractionService {
    extractor: Arc<dyn DocumentExtractor>,
    store: Arc<dyn ExtractionStore>,
}

impl ExtractionService {
    pub fn new(extractor: Arc<dyn DocumentExtractor>, store: Arc<dyn ExtractionStore>) -> Self {
        Self { extractor, store }
    }

    pub async fn extract_marriage_certificate(
        &self,
        document: DocumentPayload,
    ) -> Result<ExtractionResult, AppError> {
        let request = ExtractionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            instruction: "Extraia livro, folha, número do registro, cartório e cidade desta certidão de casamento.".to_string(),
            document,
            tool_name: "extrair_certidao_casamento".to_string(),
            tool_description: "Registra os dados de registro de uma certidão de casamento".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "livro": { "type": "string", "description": "Número do livro" },
                    "folha": { "type": "string", "description": "Número da folha" },
                    "numero_registro": { "type": "string", "description": "Número do registro ou termo" },
                    "cartorio": { "type": "string", "description": "Nome do cartório de registro civil" },
                    "cidade": { "type": "string", "description": "Cidade e UF do cartório" }
                },
                "required": ["livro", "folha", "numero_registro", "cartorio", "cidade"]
            }),
        };

        let data: MarriageCertificateData = self.run(&request).await?;
        let texto = format!(
            "Casados conforme certidão de casamento registrada no livro {}, folha {}, sob o número {}, \
no {}, na cidade de {}.",
            data.livro, data.folha, data.numero_registro, data.cartorio, data.cidade
        );
        self.persist(DocumentKind::CertidaoCasamento, &data, texto).await
    }

    pub async fn extract_property_registration(
        &self,
        document: DocumentPayload,
    ) -> Result<ExtractionResult, AppError> {
        let request = ExtractionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            instruction: "Extraia o tipo do imóvel e o endereço completo desta matrícula de imóvel.".to_string(),
            document,
            tool_name: "extrair_matricula_imovel".to_string(),
            tool_description: "Registra o tipo e o endereço do imóvel descrito na matrícula".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "tipo_imovel": { "type": "string", "description": "Apartamento, casa, terreno, sala comercial..." },
                    "endereco": { "type": "string", "description": "Endereço completo com número, bairro e cidade" }
                },
                "required": ["tipo_imovel", "endereco"]
            }),
        };

        let data: PropertyRegistrationData = self.run(&request).await?;
        let texto = format!(
            "Imóvel do tipo {}, situado à {}, objeto da matrícula apresentada.",
            data.tipo_imovel, data.endereco
        );
        self.persist(DocumentKind::MatriculaImovel, &data, texto).await
    }

    async fn run<T: DeserializeOwned>(&self, request: &ExtractionRequest) -> Result<T, AppError> {
        let empty = match &request.document {
            DocumentPayload::Pdf { base64 } | DocumentPayload::Image { base64, .. } => {
                base64.trim().is_empty()
            }
        };
        if empty {
            return Err(AppError::BadRequest("pdfBase64 é obrigatório".to_string()));
        }

        let arguments = self.extractor.extract(request).await?;
        serde_json::from_value(arguments).map_err(|e| AppError::ProviderError {
            provider: "ia",
            message: format!("argumentos inválidos em {}: {}", request.tool_name, e),
        })
    }

    async fn persist<T: Serialize>(
        &self,
        kind: DocumentKind,
        data: &T,
        texto_gerado: String,
    ) -> Result<ExtractionResult, AppError> {
        let dados = serde_json::to_value(data).map_err(|e| AppError::InternalServerError(e.into()))?;
        let saved = self.store.save_extraction(kind, &dados, &texto_gerado).await?;
        tracing::info!("Extração {} salva ({})", saved.id, kind.as_str());
        Ok(ExtractionResult {
            texto_gerado,
            dados_extraidos: dados,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::InMemoryStore,
        testing::{ExtractorReply, FakeExtractor},
    };

    fn pdf() -> DocumentPayload {
        DocumentPayload::Pdf { base64: "JVBERi0xLjcK".into() }
    }

    #[tokio::test]
    async fn marriage_certificate_builds_sentence_and_persists() {
        let store = Arc::new(InMemoryStore::new());
        let extractor = Arc::new(FakeExtractor::new(ExtractorReply::Arguments(json!({
            "livro": "B-12",
            "folha": "34",
            "numero_registro": "5678",
            "cartorio": "1º Registro Civil",
            "cidade": "Campinas/SP"
        }))));
        let service = ExtractionService::new(extractor.clone(), store.clone());

        let result = service.extract_marriage_certificate(pdf()).await.unwrap();

        assert!(result.texto_gerado.contains("livro B-12, folha 34, sob o número 5678"));
        assert_eq!(result.dados_extraidos["cidade"], "Campinas/SP");
        assert_eq!(store.with(|s| s.extractions.len()), 1);
        let requests = extractor.requests.lock().unwrap();
        assert_eq!(requests[0].tool_name, "extrair_certidao_casamento");
    }

    #[tokio::test]
    async fn missing_fields_become_empty() {
        let store = Arc::new(InMemoryStore::new());
        let extractor = Arc::new(FakeExtractor::new(ExtractorReply::Arguments(json!({
            "tipo_imovel": "Apartamento"
        }))));
        let service = ExtractionService::new(extractor, store);

        let result = service.extract_property_registration(pdf()).await.unwrap();
        assert_eq!(result.dados_extraidos["endereco"], "");
        assert!(result.texto_gerado.starts_with("Imóvel do tipo Apartamento"));
    }

    #[tokio::test]
    async fn provider_failures_pass_through_without_persisting() {
        let store = Arc::new(InMemoryStore::new());
        let service = ExtractionService::new(
            Arc::new(FakeExtractor::new(ExtractorReply::RateLimited)),
            store.clone(),
        );
        assert!(matches!(
            service.extract_property_registration(pdf()).await,
            Err(AppError::RateLimited)
        ));

        let service = ExtractionService::new(
            Arc::new(FakeExtractor::new(ExtractorReply::NoCredits)),
            store.clone(),
        );
        assert!(matches!(
            service.extract_marriage_certificate(pdf()).await,
            Err(AppError::InsufficientCredits)
        ));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn empty_document_is_rejected() {
        let extractor = Arc::new(FakeExtractor::new(ExtractorReply::Arguments(json!({}))));
        let service = ExtractionService::new(extractor.clone(), Arc::new(InMemoryStore::new()));
        let doc = DocumentPayload::Pdf { base64: "  ".into() };
        assert!(matches!(
            service.extract_marriage_certificate(doc).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(extractor.requests.lock().unwrap().is_empty());
    }
}
