mod cli;
mod config;
mod extraction;
mod generator;
mod loader;
mod macros;
mod model;
mod output;
mod template;

use std::{error::Error, fs, path::PathBuf};

use anyhow::anyhow;
use chrono::Local;
use clap::Parser;
use config::Config;
use extraction::FieldExtractor;
use generator::ContractGenerator;
use loader::{DocumentLoader, TesseractOcr};
use log::{debug, info, warn};
use model::Record;
use output::OutputWriter;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(bin_name = env!("CARGO_BIN_NAME"))]
enum Cli {
    #[command(about = "Prints tool version")]
    #[command(long_about = None)]
    Version,

    #[command(about = "Extract contract fields from documents and print them as JSON")]
    #[command(long_about = None)]
    Extract(ExtractArgs),

    #[command(about = "Fill a contract template with a record from a JSON file")]
    #[command(long_about = None)]
    Generate(GenerateArgs),

    #[command(about = "Extract, review and generate a contract in one go")]
    #[command(long_about = None)]
    Run(RunArgs),
}

#[derive(clap::Args)]
struct ExtractArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[derive(clap::Args)]
struct GenerateArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    #[arg(short, long)]
    template: Option<PathBuf>,

    #[arg(short, long)]
    record: PathBuf,

    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RunArgs {
    #[arg(short='c', long, default_value=Some("./config.toml"))]
    config_path: PathBuf,

    #[arg(short, long)]
    template: Option<PathBuf>,

    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Не спрашивать подтверждение извлечённых данных.
    #[arg(long)]
    no_review: bool,

    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Ключ API можно держать в .env рядом с конфигом.
    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env file loaded: {}", e);
    }

    match Cli::parse() {
        Cli::Version => {
            println!(env!("CARGO_PKG_VERSION"));
        }
        Cli::Extract(args) => {
            debug!("Подгружаем конфиг из {:?}", args.config_path);
            let cfg = config::load(args.config_path)?;

            let record = extract(&cfg, &args.files)?;

            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Cli::Generate(args) => {
            debug!("Подгружаем конфиг из {:?}", args.config_path);
            let cfg = config::load(args.config_path)?;

            debug!("Читаем данные договора из {:?}", args.record);
            let raw = fs::read_to_string(&args.record)?;
            let record: Record = serde_json::from_str(&raw)?;

            let template = template_path(args.template, &cfg)?;
            let out_dir = args.out_dir.unwrap_or_else(|| cfg.output_dir.clone());

            generate_and_save(&cfg, template, &record, out_dir)?;
        }
        Cli::Run(args) => {
            debug!("Подгружаем конфиг из {:?}", args.config_path);
            let cfg = config::load(args.config_path)?;

            // Шаблон проверяем до обращения к модели.
            let template = template_path(args.template, &cfg)?;
            let out_dir = args.out_dir.unwrap_or_else(|| cfg.output_dir.clone());

            let extracted = extract(&cfg, &args.files)?;

            let record = if args.no_review {
                extracted
            } else {
                cli::review(&extracted)?
            };

            generate_and_save(&cfg, template, &record, out_dir)?;
        }
    };

    Ok(())
}

/// Собирает текст документов и извлекает из него запись договора.
fn extract(cfg: &Config, files: &[PathBuf]) -> anyhow::Result<Record> {
    let loader = DocumentLoader::new(TesseractOcr::new(
        cfg.ocr.command.clone(),
        cfg.ocr.language.clone(),
    ));

    let text = loader.combine_texts(files);
    let today = Local::now().date_naive();

    if text.is_empty() {
        warn!("No text could be extracted from the provided files");
        return Ok(Record::fallback(today));
    }

    let extractor = FieldExtractor::new(&cfg.llm, cfg.llm.api_key()?)?;

    Ok(extractor.extract(&text, today))
}

fn template_path(arg: Option<PathBuf>, cfg: &Config) -> anyhow::Result<PathBuf> {
    arg.or_else(|| cfg.default_template.clone())
        .ok_or(anyhow!("template is not set, pass --template or set default_template in config"))
}

fn generate_and_save(
    cfg: &Config,
    template: PathBuf,
    record: &Record,
    out_dir: PathBuf,
) -> anyhow::Result<()> {
    let writer = OutputWriter::new(cfg.work_dir.clone());
    let contract = ContractGenerator::new(template).generate(record, &writer)?;

    for name in &contract.report.leftovers {
        println!("Внимание: в договоре осталось незаполненное поле {{{}}}", name);
    }

    fs::create_dir_all(&out_dir)?;
    let path = out_dir.join(&contract.file_name);
    fs::write(&path, &contract.bytes)?;

    info!(
        "Saved {} ({}, {} bytes)",
        contract.file_name,
        contract.mime_type,
        contract.bytes.len()
    );

    println!("Договор сохранён в {}", path.display());

    Ok(())
}
