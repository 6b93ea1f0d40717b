//! `medassist validate`: score an extracted record offline, and the report
//! printing shared with `medassist extract`.

use std::path::Path;

use anyhow::{Context, Result};
use medassist_config::MedAssistConfig;
use medassist_core::Language;
use medassist_extraction::{
    detect_record_language, template, validate_dynamic, validate_with_ground_truth, DynamicReport,
    GroundTruthReport,
};
use serde_json::Value;

use crate::terminal_output::{heading, note_success, note_warn, render_table};

pub async fn run(config: &MedAssistConfig, extracted: &Path, ground_truth: Option<&Path>) -> Result<()> {
    let record = read_json(extracted).await?;

    match ground_truth {
        Some(path) => {
            let truth = read_json(path).await?;
            print_ground_truth_report(&validate_with_ground_truth(&record, &truth));
        }
        None => {
            let reference = reference_for(config, &record);
            print_dynamic_report(&validate_dynamic(&record, &reference));
        }
    }
    Ok(())
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// The configured reference template, else the template of the record's
/// language.
pub fn reference_for(config: &MedAssistConfig, record: &Value) -> Value {
    config
        .extraction
        .as_ref()
        .and_then(|e| e.reference_template.clone())
        .unwrap_or_else(|| template(detect_record_language(record).unwrap_or(Language::Hebrew)))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn print_ground_truth_report(report: &GroundTruthReport) {
    heading("Validation against ground truth");
    println!("  Accuracy:     {:.2}%", report.accuracy);
    println!("  Completeness: {:.2}%", report.completeness);

    if !report.missing_fields.is_empty() {
        heading("Missing fields");
        for field in &report.missing_fields {
            println!("  {field}");
        }
    }

    if report.mismatched_fields.is_empty() {
        note_success("All fields match");
        return;
    }
    heading("Mismatched fields");
    let rows: Vec<Vec<String>> = report
        .mismatched_fields
        .iter()
        .map(|(path, m)| vec![path.clone(), display(&m.expected), display(&m.actual)])
        .collect();
    print!("{}", render_table(&["Field", "Expected", "Extracted"], &rows));
}

pub fn print_dynamic_report(report: &DynamicReport) {
    note_warn("No ground truth found; running completeness and format checks");
    heading("Dynamic validation");
    println!("  Completeness: {:.2}%", report.completeness);

    if !report.missing_fields.is_empty() {
        heading("Missing fields");
        for field in &report.missing_fields {
            println!("  {field}");
        }
    }

    if report.invalid_fields.is_empty() {
        note_success("No invalid values found");
        return;
    }
    heading("Invalid fields");
    let rows: Vec<Vec<String>> = report
        .invalid_fields
        .iter()
        .map(|(path, reason)| vec![path.clone(), reason.clone()])
        .collect();
    print!("{}", render_table(&["Field", "Problem"], &rows));
}
