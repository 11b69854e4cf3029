mod client;
mod models;

use chrono::NaiveDate;
use log::{debug, error, info};
use regex::Regex;

use crate::{
    config::LlmConfig,
    model::{Record, RecordCandidate},
};

use client::ChatClient;
use models::ChatMessage;

/// Инструкция для модели. Описывает поля договора и формат ответа.
const SYSTEM_PROMPT: &str = r#"You are a contract data extraction agent. Extract the following fields from the provided document content:

1. Client Name: the company or individual that is the client in this contract.
2. Client Address: the complete address of the client (street, city, state and other location details). Look near the client name or in the header section.
3. Machine Names: machine names or model numbers. If there are entries like "Base Machine" and "Monitizer DISCOVER for Base Machine", only include the base machine name. Tables often contain machine details.
4. Purchase Order: the purchase order (PO) number or reference number.
5. Effective Date: the contract start date or effective date.
6. Subscription Duration: the subscription period in months.

Return ONLY a valid JSON object with these fields:
{
    "client_name": "string",
    "address": "string",
    "machine_names": ["string"],
    "purchase_order": "string",
    "effective_date": "YYYY-MM-DD",
    "subscription_duration_months": integer
}

Rules:
- Extract real values only, never placeholder text like {client_name} or {{address}}.
- Use the YYYY-MM-DD format for dates.
- Return only the number of months for the subscription duration (e.g. 12).
- If a field is not found, use null, or an empty list [] for machine_names."#;

/// Извлекает поля договора из текста документов с помощью языковой модели.
pub struct FieldExtractor {
    client: ChatClient,
    max_chars: usize,
}

impl FieldExtractor {
    pub fn new(config: &LlmConfig, api_key: String) -> ExtractResult<Self> {
        Ok(Self {
            client: ChatClient::new(config, api_key)?,
            max_chars: config.max_chars,
        })
    }

    /// Извлекает запись договора из текста.
    ///
    /// Никогда не падает: при любой ошибке (сеть, ответ не JSON, данные не
    /// прошли проверку) возвращается `Record::fallback(today)`.
    pub fn extract(&self, text: &str, today: NaiveDate) -> Record {
        info!("Starting LLM-based extraction");

        match self.try_extract(text) {
            Ok(record) => {
                info!("Extracted record for client {:?}", record.client_name);
                record
            }
            Err(e) => {
                error!("Extraction error, using default record: {}", e);
                Record::fallback(today)
            }
        }
    }

    fn try_extract(&self, text: &str) -> ExtractResult<Record> {
        let text = truncate(text, self.max_chars);

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Document Content:\n{}", text)),
        ];

        let content = self.client.complete(messages)?;
        debug!("LLM response: {}", content);

        parse_response(&content)
    }
}

/// Разбирает ответ модели в запись договора.
/// Markdown-ограждения и текст вокруг JSON объекта отбрасываются.
pub fn parse_response(content: &str) -> ExtractResult<Record> {
    let fences = Regex::new(r"```(?:json)?\s*|\s*```")?;
    let cleaned = fences.replace_all(content, "");

    let json = json_object(cleaned.trim())?;
    debug!("Cleaned JSON string: {}", json);

    let candidate: RecordCandidate = serde_json::from_str(json)?;

    candidate
        .into_record()
        .map_err(|e| ExtractError::Malformed(e.to_string()))
}

/// Вырезает самый внешний JSON объект из строки.
fn json_object(s: &str) -> ExtractResult<&str> {
    let start = s.find('{');
    let end = s.rfind('}');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&s[start..=end]),
        _ => Err(ExtractError::Malformed("no JSON object in response".into())),
    }
}

/// Обрезает текст до `max_chars` символов.
fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            info!("Document text truncated to {} chars", max_chars);
            &text[..idx]
        }
        None => text,
    }
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("api returned {0}: {1}")]
    Status(u16, String),

    #[error("empty response")]
    EmptyResponse,

    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed extraction: {0}")]
    Malformed(String),

    #[error("pattern: {0}")]
    Pattern(#[from] regex::Error),
}
