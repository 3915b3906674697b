// src/services/notification_service.rs
//
// Renderização de templates `{{variavel}}` e envio de WhatsApp "fire-and-forget".

use std::{collections::BTreeMap, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{
    clients::WhatsAppSender,
    common::{error::AppError, text::whatsapp_chat_id},
    db::TemplateStore,
    models::template::TemplateChannel,
};

/// Variáveis disponíveis para um template.
pub type TemplateVars = BTreeMap<&'static str, String>;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("regex de placeholder válida")
});

/// Substitui todas as ocorrências de `{{chave}}` conhecidas; as desconhecidas ficam como estão.
pub fn render_template(text: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Nomes dos placeholders usados no texto, sem repetição, na ordem em que aparecem.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Placeholders usados no texto que não estão declarados no mapa `variaveis`.
pub fn undeclared_placeholders(text: &str, variaveis: &Value) -> Vec<String> {
    placeholders(text)
        .into_iter()
        .filter(|name| variaveis.get(name).is_none())
        .collect()
}

/// Texto padrão de cada mensagem, usado quando não há template cadastrado.
pub fn default_whatsapp_text(key: &str) -> Option<&'static str> {
    let text = match key {
        "proposta_agendamento" => {
            "Olá {{nome_cliente}}! Temos duas opções para sua {{tipo}}:\n\
             1️⃣ {{data_opcao_1}}\n\
             2️⃣ {{data_opcao_2}}\n\
             Horário entre {{horario_inicio}} e {{horario_fim}}.\n\
             Responda 1 ou 2 para confirmar."
        }
        "agendamento_confirmado" => {
            "Olá {{nome_cliente}}! ✅ Sua {{tipo}} está confirmada para {{data_hora}}."
        }
        "agendamento_reagendado" => {
            "Olá {{nome_cliente}}! Sua {{tipo}} foi reagendada para {{data_hora}}."
        }
        "resultado_entrevista" => {
            "Olá {{nome_cliente}}! O resultado da sua entrevista: {{resultado}}.{{detalhe}}"
        }
        "resposta_invalida" => {
            "Não entendi sua resposta. Responda 1 para {{data_opcao_1}} ou 2 para {{data_opcao_2}}."
        }
        "demanda_concluida" => {
            "Olá {{nome_solicitante}}! Sua demanda de {{tipo_demanda}} (CPF {{cpf}}) foi concluída."
        }
        "documento_assinado" => {
            "Olá {{nome_cca}}! O documento assinado da matrícula {{matricula}} (CPF {{cpf}}) foi enviado para o seu e-mail."
        }
        _ => return None,
    };
    Some(text)
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    templates: Arc<dyn TemplateStore>,
    whatsapp: Arc<dyn WhatsAppSender>,
}

impl NotificationDispatcher {
    pub fn new(templates: Arc<dyn TemplateStore>, whatsapp: Arc<dyn WhatsAppSender>) -> Self {
        Self { templates, whatsapp }
    }

    /// Mensagem renderizada: template cadastrado ou texto padrão.
    pub async fn render(&self, key: &str, vars: &TemplateVars) -> Result<String, AppError> {
        let body = match self.templates.find_template(TemplateChannel::Whatsapp, key).await? {
            Some(template) => template.corpo,
            None => default_whatsapp_text(key)
                .map(str::to_string)
                .ok_or_else(|| AppError::ResourceNotFound(format!("Template de WhatsApp '{}'", key)))?,
        };
        Ok(render_template(&body, vars))
    }

    pub async fn send(&self, key: &str, phone: &str, vars: &TemplateVars) -> Result<String, AppError> {
        let chat_id = whatsapp_chat_id(phone)
            .ok_or_else(|| AppError::BadRequest(format!("Telefone inválido: '{}'", phone)))?;
        let message = self.render(key, vars).await?;
        self.whatsapp.send_text(&chat_id, &message).await
    }

    /// Envia um texto já pronto para um chat.
    pub async fn send_to_chat(&self, chat_id: &str, message: &str) -> Result<String, AppError> {
        self.whatsapp.send_text(chat_id, message).await
    }

    /// Dispara o envio numa task separada; falhas só vão para o log.
    pub fn dispatch_detached(
        &self,
        key: &'static str,
        phone: String,
        vars: TemplateVars,
    ) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            match dispatcher.send(key, &phone, &vars).await {
                Ok(id) => tracing::info!("Notificação '{}' enviada ({})", key, id),
                Err(e) => tracing::warn!("⚠️ Falha ao enviar notificação '{}' para {}: {}", key, phone, e),
            }
        })
    }
}
