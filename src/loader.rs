use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use log::{debug, error, info, warn};

use crate::template::{Document, DocumentError};

/// Извлекает текст из загруженных документов.
/// Поддерживаются `.txt`, `.docx`, `.pdf` и изображения `.png`, `.jpg`, `.jpeg`.
pub struct DocumentLoader {
    ocr: TesseractOcr,
}

impl DocumentLoader {
    pub fn new(ocr: TesseractOcr) -> Self {
        Self { ocr }
    }

    /// Извлекает текст из одного файла. Формат определяется по расширению.
    pub fn extract_text(&self, path: &Path) -> LoadResult {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        debug!("Extract text from {:?} as {:?}", path, extension);

        match extension.as_str() {
            "txt" => Ok(fs::read_to_string(path)?),
            "docx" => Ok(Document::open(path)?.plain_text()),
            "pdf" => pdf_extract::extract_text(path).map_err(|e| LoadError::Pdf(e.to_string())),
            "png" | "jpg" | "jpeg" => self.ocr.recognize(path),
            _ => Err(LoadError::UnsupportedFormat(extension)),
        }
    }

    /// Собирает текст всех файлов в один.
    /// Файлы, которые не удалось прочитать, пропускаются с записью в лог.
    pub fn combine_texts(&self, paths: &[PathBuf]) -> String {
        info!("Processing {} files", paths.len());

        let mut texts = Vec::with_capacity(paths.len());

        for path in paths {
            match self.extract_text(path) {
                Ok(text) if text.trim().is_empty() => {
                    warn!("No text content extracted from {:?}", path);
                }
                Ok(text) => {
                    debug!("Extracted {} chars from {:?}", text.len(), path);
                    texts.push(text);
                }
                Err(e) => error!("Error processing file {:?}: {}", path, e),
            }
        }

        texts.join("\n\n").trim().to_owned()
    }
}

/// Распознавание текста на изображениях через консольный `tesseract`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    command: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    pub fn recognize(&self, path: &Path) -> LoadResult {
        let output = Command::new(&self.command)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| LoadError::Ocr(format!("run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LoadError::Ocr(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

pub type LoadResult = std::result::Result<String, LoadError>;

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("unsupported file format: {0:?}")]
    UnsupportedFormat(String),

    #[error("read file: {0}")]
    ReadFile(#[from] io::Error),

    #[error("word document: {0}")]
    Word(#[from] DocumentError),

    #[error("pdf: {0}")]
    Pdf(String),

    #[error("ocr: {0}")]
    Ocr(String),
}
