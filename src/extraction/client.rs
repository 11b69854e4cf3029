use std::time::Duration;

use log::debug;
use reqwest::StatusCode;

use crate::config::LlmConfig;

use super::{
    models::{ChatMessage, ChatRequest, ChatResponse},
    ExtractError, ExtractResult,
};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Клиент OpenAI-совместимого chat completions API.
pub(super) struct ChatClient {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f64,
}

impl ChatClient {
    pub(super) fn new(config: &LlmConfig, api_key: String) -> ExtractResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
        })
    }

    /// Отправляет диалог модели и возвращает текст первого ответа.
    pub(super) fn complete(&self, messages: Vec<ChatMessage>) -> ExtractResult<String> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        };

        let url = self.build_url("chat/completions");

        debug!("Запрос в API: POST {} с моделью {}", url, self.model);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text()?;
            return Err(ExtractError::Status(status.as_u16(), text));
        }

        let body = resp.text()?;

        debug!("Тело ответа на {}: {}", url, body);

        let data: ChatResponse = serde_json::from_str(&body)?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ExtractError::EmptyResponse)
    }

    fn build_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), method)
    }
}
