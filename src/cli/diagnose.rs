//! `homefix diagnose`

use crate::server::{build_service, load_config};
use anyhow::{bail, Context, Result};
use homefix_core::{DiagnosticRequest, ImageUpload, QaPair};
use std::path::{Path, PathBuf};

/// Run one round and print the normalized result
pub async fn run(description: String, images: Vec<PathBuf>, history: Vec<String>) -> Result<()> {
    let config = load_config()?;
    let service = build_service(&config)?;

    let history = history
        .iter()
        .map(|entry| parse_history(entry))
        .collect::<Result<Vec<_>>>()?;
    let request = DiagnosticRequest::new(description).with_history(history);

    let mut uploads = Vec::with_capacity(images.len());
    for path in &images {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut upload = ImageUpload::new(data, content_type_for(path));
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            upload = upload.with_file_name(name);
        }
        uploads.push(upload);
    }

    let result = service
        .diagnose(uploads, request)
        .await
        .context("Diagnosis failed")?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// `question=answer`; an empty answer is a skipped question
fn parse_history(entry: &str) -> Result<QaPair> {
    let Some((question, answer)) = entry.split_once('=') else {
        bail!("history entries must look like question=answer, got {:?}", entry);
    };
    let question = question.trim();
    if question.is_empty() {
        bail!("history entry has an empty question: {:?}", entry);
    }
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        QaPair::skipped(question)
    } else {
        QaPair::answered(question, answer)
    })
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}
