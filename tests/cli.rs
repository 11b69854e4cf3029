use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::process::Command;

const BIN: &str = "contract_populator";

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Agreement with {{client_name}} from {effective_date}</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Machine</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>{machine_name}</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:sectPr/></w:body></w:document>"#;

const RECORD: &str = r#"{
    "client_name": "Acme",
    "effective_date": "2024-03-30",
    "machine_names": ["M1", "M2"],
    "purchase_order": "PO-9"
}"#;

fn write_template(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", zip::write::FileOptions::default())?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#)?;
    zip.start_file("word/document.xml", zip::write::FileOptions::default())?;
    zip.write_all(DOCUMENT.as_bytes())?;

    fs::write(path, zip.finish()?.into_inner())?;

    Ok(())
}

fn read_document_xml(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let mut archive = zip::ZipArchive::new(fs::File::open(path)?)?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    Ok(xml)
}

#[test]
fn version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin(BIN)?;

    cmd.arg("version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    Ok(())
}

#[test]
fn generate_success() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("template.docx");
    let record = dir.path().join("record.json");
    let config = dir.path().join("config.toml");
    let out_dir = dir.path().join("contracts");

    write_template(&template)?;
    fs::write(&record, RECORD)?;
    fs::write(
        &config,
        format!("work_dir = {:?}\n", dir.path().join("work").to_string_lossy()),
    )?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.current_dir(dir.path())
        .arg("generate")
        .arg("--config-path")
        .arg(&config)
        .arg("--template")
        .arg(&template)
        .arg("--record")
        .arg(&record)
        .arg("--out-dir")
        .arg(&out_dir);

    cmd.assert().success();

    let xml = read_document_xml(&out_dir.join("generated_contract_PO-9.docx"))?;
    assert!(xml.contains("Agreement with Acme from 30 Mar, 2024"));
    assert!(xml.contains(">M1<"));
    assert!(xml.contains(">M2<"));
    assert!(!xml.contains("{machine_name}"));

    let work_entries = fs::read_dir(dir.path().join("work"))?.count();
    assert_eq!(work_entries, 0);

    Ok(())
}

#[test]
fn generate_missing_template() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let record = dir.path().join("record.json");
    let config = dir.path().join("config.toml");
    let out_dir = dir.path().join("contracts");

    fs::write(&record, RECORD)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.current_dir(dir.path())
        .arg("generate")
        .arg("-c")
        .arg(&config)
        .arg("-t")
        .arg(dir.path().join("missing.docx"))
        .arg("-r")
        .arg(&record)
        .arg("-o")
        .arg(&out_dir);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.docx"));

    assert!(!out_dir.exists());

    Ok(())
}

#[test]
fn generate_without_template() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let record = dir.path().join("record.json");

    fs::write(&record, RECORD)?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.current_dir(dir.path())
        .arg("generate")
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg("-r")
        .arg(&record);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("template is not set"));

    Ok(())
}

#[test]
fn extract_without_readable_files_prints_fallback() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let unsupported = dir.path().join("sheet.csv");

    fs::write(&unsupported, "a,b")?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .arg("extract")
        .arg("-c")
        .arg(dir.path().join("config.toml"))
        .arg(&unsupported)
        .arg(dir.path().join("missing.txt"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#""address": "Unit IV, Darjeeling Road, Kolkata, West Bengal""#,
        ))
        .stdout(predicate::str::contains(r#""subscription_duration_months": 12"#))
        .stdout(predicate::str::contains(r#""machine_names": []"#));

    Ok(())
}

#[test]
fn run_without_review_uses_fallback_record() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let template = dir.path().join("template.docx");
    let config = dir.path().join("config.toml");
    let out_dir = dir.path().join("contracts");

    write_template(&template)?;
    fs::write(
        &config,
        format!("work_dir = {:?}\n", dir.path().join("work").to_string_lossy()),
    )?;

    let mut cmd = Command::cargo_bin(BIN)?;
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .arg("run")
        .arg("-c")
        .arg(&config)
        .arg("-t")
        .arg(&template)
        .arg("-o")
        .arg(&out_dir)
        .arg("--no-review")
        .arg(dir.path().join("missing.pdf"));

    cmd.assert().success();

    let xml = read_document_xml(&out_dir.join("generated_contract_.docx"))?;
    assert!(xml.contains("Agreement with  from "));
    assert!(xml.contains("{machine_name}"));

    Ok(())
}
