//! `medassist extract`: OCR and extract one claim form, write the record as
//! `<stem>.json`, and print validation metrics.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use medassist_config::MedAssistConfig;
use medassist_extraction::{
    document_stem, load_ground_truth, validate_dynamic, validate_with_ground_truth, DocumentKind,
    FormExtractor,
};
use tracing::info;

use crate::providers;
use crate::terminal_output::note_success;
use crate::validate_cmd::{print_dynamic_report, print_ground_truth_report, reference_for};

pub async fn run(
    config: &MedAssistConfig,
    file: &Path,
    out: Option<PathBuf>,
    gt_dir: Option<PathBuf>,
) -> Result<()> {
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file path", file.display()))?;
    let kind = DocumentKind::from_file_name(&file_name)?;

    let ocr = providers::ocr_provider(config)
        .ok_or_else(|| anyhow!("ocr.endpoint and ocr.apiKey must be configured to extract documents"))?;
    let extractor = FormExtractor::new(ocr, providers::chat_provider(config)?, providers::extraction_settings(config));

    let document = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    info!(file = %file_name, bytes = document.len(), "Extracting claim form");
    let form = extractor.extract(&document, kind).await?;

    let out = out.unwrap_or_else(|| PathBuf::from(format!("{}.json", document_stem(&file_name))));
    tokio::fs::write(&out, form.to_pretty_json()?)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    note_success(&format!("Extracted {} form written to {}", form.language, out.display()));

    let gt_dir = gt_dir.unwrap_or_else(|| {
        config
            .extraction
            .as_ref()
            .and_then(|e| e.ground_truth_dir.clone())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("gt"))
    });
    match load_ground_truth(&gt_dir, &file_name).await? {
        Some(truth) => print_ground_truth_report(&validate_with_ground_truth(&form.record, &truth)),
        None => {
            let reference = reference_for(config, &form.record);
            print_dynamic_report(&validate_dynamic(&form.record, &reference));
        }
    }
    Ok(())
}
