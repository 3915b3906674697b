// src/clients/ai.rs
//
// Gateway de IA compatível com chat completions. A extração sempre força uma
// única ferramenta e lê os argumentos da primeira chamada.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    clients::classify_provider_error,
    common::error::AppError,
    models::extraction::DocumentPayload,
};

#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub system_prompt: String,
    pub instruction: String,
    pub document: DocumentPayload,
    pub tool_name: String,
    pub tool_description: String,
    /// JSON Schema dos argumentos da ferramenta.
    pub parameters: Value,
}

impl ExtractionRequest {
    fn document_part(&self) -> Value {
        match &self.document {
            DocumentPayload::Pdf { base64 } => json!({
                "type": "file",
                "file": {
                    "filename": "documento.pdf",
                    "file_data": format!("data:application/pdf;base64,{}", base64),
                }
            }),
            DocumentPayload::Image { mime, base64 } => json!({
                "type": "image_url",
                "image_url": { "url": format!("data:{};base64,{}", mime, base64) }
            }),
        }
    }

    fn to_body(&self, model: &str) -> Value {
        json!({
            "model": model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": self.instruction },
                        self.document_part(),
                    ]
                }
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": self.tool_name,
                    "description": self.tool_description,
                    "parameters": self.parameters,
                }
            }],
            "tool_choice": { "type": "function", "function": { "name": self.tool_name } },
        })
    }
}

#[async_trait]
pub trait DocumentExtractor: Send + Sync {
    /// Devolve os argumentos (já como JSON) da chamada de ferramenta do modelo.
    async fn extract(&self, request: &ExtractionRequest) -> Result<Value, AppError>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: ToolFunction,
}

#[derive(Deserialize)]
struct ToolFunction {
    arguments: String,
}

#[derive(Clone)]
pub struct AiGatewayClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AiGatewayClient {
    pub fn new(client: Client, base_url: &str, api_key: String, model: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl DocumentExtractor for AiGatewayClient {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Value, AppError> {
        tracing::debug!("Enviando documento para extração ({})", request.tool_name);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request.to_body(&self.model))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Gateway de IA respondeu {}: {}", status, text);
            return Err(classify_provider_error("ia", status, &text));
        }

        let completion: CompletionResponse = response.json().await?;
        let arguments = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.tool_calls.into_iter().next())
            .map(|call| call.function.arguments)
            .ok_or_else(|| AppError::ProviderError {
                provider: "ia",
                message: "resposta sem chamada de ferramenta".to_string(),
            })?;

        serde_json::from_str(&arguments).map_err(|e| AppError::ProviderError {
            provider: "ia",
            message: format!("argumentos inválidos: {}", e),
        })
    }
}
