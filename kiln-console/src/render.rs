//! Table rendering
//!
//! Turns listing records into the tables the console prints. Missing values
//! render as `-`.

use chrono::{DateTime, Local, NaiveDateTime};
use colored::*;
use kiln_core::domain::dataset::Dataset;
use kiln_core::domain::inference::Inference;
use kiln_core::domain::model::Model;
use kiln_core::domain::status::JobStatus;

const PLACEHOLDER: &str = "-";

/// Print the dataset table
pub fn print_datasets(datasets: &[Dataset]) {
    if datasets.is_empty() {
        println!("{}", "No datasets found.".yellow());
        return;
    }

    println!("{}", format!("Datasets ({}):", datasets.len()).bold());
    println!(
        "  {}",
        format!(
            "{:<6} {:<32} {:<10} {:<20} {}",
            "ID", "FILE", "SIZE", "UPLOADED", "STATUS"
        )
        .dimmed()
    );
    for dataset in datasets {
        let (size, uploaded) = match &dataset.file_meta {
            Some(meta) => (format_size(meta.filesize), format_timestamp(&meta.creation_time)),
            None => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string()),
        };
        println!(
            "  {:<6} {:<32} {:<10} {:<20} {}",
            dataset.id,
            dataset.file_name,
            size,
            uploaded,
            colorize_status(&dataset.status)
        );
    }
}

/// Print the model table
pub fn print_models(models: &[Model]) {
    if models.is_empty() {
        println!("{}", "No models found.".yellow());
        return;
    }

    println!("{}", format!("Models ({}):", models.len()).bold());
    println!(
        "  {}",
        format!(
            "{:<6} {:<24} {:<16} {:<9} {:<9} {:<9} {:<9} {:<24} {:<8} {}",
            "ID", "MODEL", "BASE", "PREC", "RECALL", "mAP50", "mAP50-95", "CLASSES", "DEPLOYED", "STATUS"
        )
        .dimmed()
    );
    for model in models {
        println!(
            "  {:<6} {:<24} {:<16} {:<9} {:<9} {:<9} {:<9} {:<24} {:<8} {}",
            model.id,
            model_label(model),
            model
                .base_model
                .as_ref()
                .map_or(PLACEHOLDER, |base| base.model_name.as_str()),
            format_metric(model.precision),
            format_metric(model.recall),
            format_metric(model.map50),
            format_metric(model.map50_95),
            format_classes(model.classes.as_deref()),
            if model.is_deploy { "🚀" } else { PLACEHOLDER },
            colorize_status(&model.status)
        );
    }
}

/// Print the inference table
pub fn print_inferences(inferences: &[Inference]) {
    if inferences.is_empty() {
        println!("{}", "No inference files found.".yellow());
        return;
    }

    println!("{}", format!("Inference files ({}):", inferences.len()).bold());
    println!(
        "  {}",
        format!(
            "{:<6} {:<28} {:<10} {:<28} {:<10} {:<6} {}",
            "ID", "ORIGINAL", "SIZE", "GENERATED", "SIZE", "TYPE", "STATUS"
        )
        .dimmed()
    );
    for inference in inferences {
        let original = stored_file_label(
            inference.original_file.as_ref().map(|f| f.id),
            Some(&inference.original_file_name),
        );
        let generated = stored_file_label(
            inference.generated_file_id(),
            inference.generated_file_name.as_ref(),
        );
        println!(
            "  {:<6} {:<28} {:<10} {:<28} {:<10} {:<6} {}",
            inference.id,
            original,
            optional_size(inference.original_file.as_ref().and_then(|f| f.filesize)),
            generated,
            optional_size(inference.generated_file.as_ref().and_then(|f| f.filesize)),
            inference.file_type.as_deref().unwrap_or(PLACEHOLDER),
            colorize_status(&inference.status)
        );
    }
}

/// Name with version tag, e.g. `helmet v2`
fn model_label(model: &Model) -> String {
    match model.version {
        Some(version) => format!("{} v{}", model.model_name, version),
        None => model.model_name.clone(),
    }
}

/// File name with the id to pass to `download`, e.g. `[41] out.mp4`
fn stored_file_label(file_id: Option<i64>, name: Option<&String>) -> String {
    match (file_id, name) {
        (Some(id), Some(name)) => format!("[{}] {}", id, name),
        (None, Some(name)) => name.clone(),
        _ => PLACEHOLDER.to_string(),
    }
}

fn optional_size(size: Option<u64>) -> String {
    size.map_or_else(|| PLACEHOLDER.to_string(), format_size)
}

/// Class names joined for a table cell
pub fn format_classes(classes: Option<&[String]>) -> String {
    match classes {
        Some(classes) if !classes.is_empty() => classes.join(","),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Metric to two decimals
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{:.2}", value),
        None => PLACEHOLDER.to_string(),
    }
}

/// Human readable byte count
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

/// Backend timestamp in local time, or verbatim if unparseable
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, pattern) {
            return at.format("%Y-%m-%d %H:%M:%S").to_string();
        }
    }

    raw.to_string()
}

/// Colorize job status for display
pub fn colorize_status(status: &JobStatus) -> ColoredString {
    match status {
        JobStatus::Pending => "pending".yellow(),
        JobStatus::Running => "running".cyan(),
        JobStatus::Complete => "complete".green(),
        JobStatus::Failed => "failed".red(),
        JobStatus::Progress(percent) => format!("training {}%", percent).cyan(),
        JobStatus::Other(raw) if raw.is_empty() => PLACEHOLDER.dimmed(),
        JobStatus::Other(raw) => raw.as_str().dimmed(),
    }
}
