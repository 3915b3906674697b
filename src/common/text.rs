// src/common/text.rs
//
// Utilitários de texto: normalização sem acentos, extração da parte nova de
// uma resposta de e-mail, palavras-chave de conclusão, CPF e telefone.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Palavras que, numa resposta de e-mail, concluem a tarefa.
pub const COMPLETION_KEYWORDS: [&str; 10] = [
    "ok",
    "feito",
    "feita",
    "concluido",
    "concluida",
    "done",
    "finalizado",
    "finalizada",
    "conclui",
    "concluindo",
];

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    let alternatives = COMPLETION_KEYWORDS.join("|");
    Regex::new(&format!(r"\b({})\b", alternatives)).expect("regex de palavras-chave válida")
});

static TASK_ADDRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tarefa-([0-9a-zA-Z_-]+)@").expect("regex de endereço válida"));

static BLOCKQUOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<blockquote").expect("regex de blockquote válida"));

// Links não contam como texto da resposta (`/ok/` num caminho não conclui nada)
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:https?://|www\.|mailto:)\S+").expect("regex de URL válida"));

// Cabeçalhos de citação que clientes de e-mail inserem antes do texto original
static REPLY_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(on\s.+\swrote:|em\s.+\sescreveu:|-{2,}\s*(original message|mensagem original)\s*-{2,})")
        .expect("regex de cabeçalho de resposta válida")
});

/// Minúsculas e sem marcas diacríticas (NFKD).
pub fn normalize(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Primeira palavra-chave de conclusão encontrada como palavra inteira.
pub fn find_completion_keyword(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    let found = KEYWORD_RE.find(&normalized)?;
    COMPLETION_KEYWORDS
        .iter()
        .copied()
        .find(|k| *k == found.as_str())
}

/// Extrai o id da tarefa de um endereço `tarefa-<id>@dominio`.
pub fn task_id_from_address(address: &str) -> Option<String> {
    TASK_ADDRESS_RE
        .captures(address)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn task_reply_address(task_id: &str, inbound_domain: &str) -> String {
    format!("tarefa-{}@{}", task_id, inbound_domain)
}

/// HTML da resposta sem o conteúdo citado (tudo a partir do primeiro `<blockquote>`).
pub fn html_reply_section(html: &str) -> &str {
    match BLOCKQUOTE_RE.find(html) {
        Some(m) => &html[..m.start()],
        None => html,
    }
}

/// Converte o HTML (já cortado) em texto usando um parser de verdade, sem
/// rodapé de links.
pub fn html_to_text(html: &str) -> String {
    match html2text::config::plain()
        .link_footnotes(false)
        .string_from_read(html.as_bytes(), 120)
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Falha ao converter HTML em texto: {}", e);
            String::new()
        }
    }
}

/// Texto puro da resposta até a primeira linha citada (`>`) ou cabeçalho de resposta.
pub fn plain_reply_section(text: &str) -> String {
    let cut = REPLY_HEADER_RE.find(text).map(|m| m.start()).unwrap_or(text.len());
    text[..cut]
        .lines()
        .take_while(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Junta assunto + texto + HTML-como-texto, tudo só com a parte nova da resposta.
pub fn reply_corpus(subject: Option<&str>, text: Option<&str>, html: Option<&str>) -> String {
    let mut parts = Vec::new();
    if let Some(s) = subject {
        parts.push(s.to_string());
    }
    if let Some(t) = text {
        parts.push(plain_reply_section(t));
    }
    if let Some(h) = html {
        parts.push(html_to_text(html_reply_section(h)));
    }
    URL_RE.replace_all(&parts.join("\n"), " ").into_owned()
}

// =============================================================================
//  CPF
// =============================================================================

pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Valida os dígitos verificadores de um CPF (aceita pontuação).
pub fn is_valid_cpf(value: &str) -> bool {
    let digits: Vec<u32> = only_digits(value)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        let rest = (sum * 10) % 11;
        if rest == 10 { 0 } else { rest }
    };

    check(9) == digits[9] && check(10) == digits[10]
}

// =============================================================================
//  TELEFONE / WHATSAPP
// =============================================================================

/// Telefone só com dígitos e com o DDI 55 quando ele falta.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let digits = only_digits(phone);
    match digits.len() {
        0 => None,
        10 | 11 => Some(format!("55{}", digits)),
        _ => Some(digits),
    }
}

pub fn whatsapp_chat_id(phone: &str) -> Option<String> {
    normalize_phone(phone).map(|d| format!("{}@c.us", d))
}

/// Número (com DDI) a partir de um chatId `5511987654321@c.us`.
pub fn phone_from_chat_id(chat_id: &str) -> Option<String> {
    let number = chat_id.split('@').next().unwrap_or(chat_id);
    normalize_phone(number)
}
