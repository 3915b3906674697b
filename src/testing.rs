// src/testing.rs
//
// Dublês dos provedores externos usados nos testes dos services.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    clients::{DocumentExtractor, EmailSender, ExtractionRequest, FileStorage, OutgoingEmail, WhatsAppSender},
    common::error::AppError,
    models::webhook::ReceivedEmail,
};

// --- E-mail ---

#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub received: Mutex<HashMap<String, ReceivedEmail>>,
    pub domain_unverified: bool,
    /// Destinatários cujo envio falha com erro genérico do provedor.
    pub failing_recipients: Vec<String>,
}

impl RecordingEmail {
    pub fn unverified_domain() -> Self {
        Self {
            domain_unverified: true,
            ..Self::default()
        }
    }

    pub fn with_received(self, email_id: &str, subject: &str, text: Option<&str>, html: Option<&str>) -> Self {
        self.received.lock().unwrap().insert(
            email_id.to_string(),
            ReceivedEmail {
                subject: Some(subject.to_string()),
                text: text.map(str::to_string),
                html: html.map(str::to_string),
            },
        );
        self
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, AppError> {
        if self.domain_unverified {
            return Err(AppError::EmailDomainNotVerified);
        }
        if email.to.iter().any(|to| self.failing_recipients.contains(to)) {
            return Err(AppError::ProviderError {
                provider: "email",
                message: "HTTP 422: Invalid `to` field".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("msg_{}", sent.len()))
    }

    async fn fetch_received(&self, email_id: &str) -> Result<ReceivedEmail, AppError> {
        self.received
            .lock()
            .unwrap()
            .get(email_id)
            .cloned()
            .ok_or_else(|| AppError::ProviderError {
                provider: "email",
                message: format!("HTTP 404: e-mail {} não encontrado", email_id),
            })
    }
}

// --- WhatsApp ---

#[derive(Default)]
pub struct RecordingWhatsApp {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingWhatsApp {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl WhatsAppSender for RecordingWhatsApp {
    async fn send_text(&self, chat_id: &str, message: &str) -> Result<String, AppError> {
        if self.fail {
            return Err(AppError::ProviderError {
                provider: "whatsapp",
                message: "HTTP 500: instance not authorized".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id.to_string(), message.to_string()));
        Ok(format!("wa_{}", sent.len()))
    }
}

// --- IA ---

pub enum ExtractorReply {
    Arguments(Value),
    RateLimited,
    NoCredits,
}

pub struct FakeExtractor {
    reply: ExtractorReply,
    pub requests: Mutex<Vec<ExtractionRequest>>,
}

impl FakeExtractor {
    pub fn new(reply: ExtractorReply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentExtractor for FakeExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<Value, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            ExtractorReply::Arguments(v) => Ok(v.clone()),
            ExtractorReply::RateLimited => Err(AppError::RateLimited),
            ExtractorReply::NoCredits => Err(AppError::InsufficientCredits),
        }
    }
}

// --- Armazenamento ---

#[derive(Default)]
pub struct FakeStorage {
    pub files: HashMap<String, Vec<u8>>,
}

impl FakeStorage {
    pub fn with_file(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), bytes);
        self
    }
}

#[async_trait]
impl FileStorage for FakeStorage {
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.files.get(path).cloned().ok_or_else(|| AppError::ProviderError {
            provider: "storage",
            message: format!("HTTP 404: {} não existe", path),
        })
    }

    async fn signed_url(&self, path: &str, expires_in_secs: u64) -> Result<String, AppError> {
        Ok(format!("https://storage.test/{}?expires={}", path, expires_in_secs))
    }
}
