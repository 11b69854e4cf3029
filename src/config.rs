use std::path::PathBuf;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Каталог для временных файлов генерации.
    pub work_dir: PathBuf,

    /// Каталог, куда сохраняются готовые договоры.
    pub output_dir: PathBuf,

    /// Шаблон договора, если он не указан в командной строке.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_template: Option<PathBuf>,

    /// Настройки языковой модели.
    pub llm: LlmConfig,

    /// Настройки распознавания изображений.
    pub ocr: OcrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("output"),
            output_dir: PathBuf::from("."),
            default_template: None,
            llm: LlmConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

/// Настройки OpenAI-совместимого API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,

    /// Имя переменной окружения с ключом API.
    pub api_key_env: String,

    pub temperature: f64,
    pub timeout_secs: u64,

    /// Сколько символов текста документов отправлять модели.
    pub max_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-3.5-turbo".to_owned(),
            api_key_env: "OPENAI_API_KEY".to_owned(),
            temperature: 0.0,
            timeout_secs: 60,
            max_chars: 12_000,
        }
    }
}

impl LlmConfig {
    /// Достаёт ключ API из окружения.
    pub fn api_key(&self) -> anyhow::Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| anyhow!("environment variable {} is not set", self.api_key_env))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    /// Исполняемый файл tesseract.
    pub command: String,

    /// Язык распознавания.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_owned(),
            language: "eng".to_owned(),
        }
    }
}

/// Загружает конфигурацию.
/// Если файла нет, он будет создан со значениями по-умолчанию.
pub fn load(path: PathBuf) -> anyhow::Result<Config> {
    let cfg: Config = confy::load_path(path)?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = load(path.clone()).unwrap();

        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "work_dir = \"tmp\"\n\n[llm]\nmodel = \"gpt-4o-mini\"\n",
        )
        .unwrap();

        let cfg = load(path).unwrap();

        assert_eq!(cfg.work_dir, PathBuf::from("tmp"));
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(cfg.ocr, OcrConfig::default());
    }
}
