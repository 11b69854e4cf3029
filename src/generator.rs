use std::path::PathBuf;

use log::info;

use crate::{
    model::Record,
    output::{OutputWriter, WriteError, MIME_TYPE},
    template::{engine, Document, DocumentError, FillReport},
};

/// Готовый договор.
#[derive(Debug, Clone)]
pub struct GeneratedContract {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Генератор договоров по шаблону.
#[derive(Debug, Clone)]
pub struct ContractGenerator {
    template_path: PathBuf,
}

impl ContractGenerator {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        let template_path = template_path.into();
        info!("Initialized contract generator with template {:?}", template_path);
        Self { template_path }
    }

    /// Заполняет шаблон данными записи и возвращает готовый документ.
    ///
    /// Шаблон каждый раз загружается заново, изменения делаются в копии
    /// в памяти, файл пишется только после успешного заполнения.
    pub fn generate(&self, record: &Record, writer: &OutputWriter) -> GenerateResult {
        if !self.template_path.exists() {
            return Err(GenerateError::TemplateNotFound(self.template_path.clone()));
        }

        info!("Loading template from {:?}", self.template_path);
        let mut doc = Document::open(&self.template_path)?;

        let report = engine::fill(&mut doc, record);

        let file_name = record.output_file_name();
        info!("Saving generated contract as {}", file_name);
        let bytes = writer.write(&doc, &file_name)?;

        Ok(GeneratedContract {
            file_name,
            mime_type: MIME_TYPE,
            bytes,
            report,
        })
    }
}

pub type GenerateResult = std::result::Result<GeneratedContract, GenerateError>;

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("template file not found at {0:?}")]
    TemplateNotFound(PathBuf),

    #[error("load template: {0}")]
    Template(#[from] DocumentError),

    #[error("write contract: {0}")]
    Serialization(#[from] WriteError),
}
