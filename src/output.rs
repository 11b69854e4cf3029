use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::{debug, error};
use rand::{distributions::Alphanumeric, Rng};

use crate::template::{Document, DocumentError};

/// MIME тип готового договора.
pub const MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const RUN_SUFFIX_LEN: usize = 6;

/// Сериализует заполненный документ через временный файл.
///
/// Каждый запуск пишет в собственный каталог внутри рабочего, поэтому
/// параллельные запуски не пересекаются. После чтения файл и каталог
/// удаляются, ошибки удаления только логируются.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    work_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// Пишет документ во временный файл и возвращает его содержимое.
    pub fn write(&self, doc: &Document, file_name: &str) -> WriteResult {
        let run_dir = self.create_run_dir().map_err(WriteError::CreateDir)?;
        let path = run_dir.join(file_name);

        debug!("Write generated document to {:?}", path);

        if let Err(e) = doc.save(&path) {
            error!("Failed to write {:?}: {}", path, e);
            cleanup(&path, &run_dir);
            return Err(WriteError::Serialize(e));
        }

        let bytes = fs::read(&path);
        cleanup(&path, &run_dir);

        bytes.map_err(WriteError::ReadBack)
    }

    fn create_run_dir(&self) -> io::Result<PathBuf> {
        let name = format!(
            "generated_contract_{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            run_suffix()
        );
        let dir = self.work_dir.join(name);

        fs::create_dir_all(&dir)?;

        Ok(dir)
    }
}

fn run_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RUN_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

fn cleanup(path: &Path, run_dir: &Path) {
    if path.exists() {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed temporary file {:?}", path),
            Err(e) => error!("Error removing temporary file {:?}: {}", path, e),
        }
    }

    if let Err(e) = fs::remove_dir(run_dir) {
        error!("Error removing run directory {:?}: {}", run_dir, e);
    }
}

pub type WriteResult = std::result::Result<Vec<u8>, WriteError>;

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error("create run directory: {0}")]
    CreateDir(#[source] io::Error),

    #[error("serialize document: {0}")]
    Serialize(#[source] DocumentError),

    #[error("read generated document: {0}")]
    ReadBack(#[source] io::Error),
}
