//! Model checkpoint retrieval
//!
//! The checkpoint is fetched from remote storage once at startup if it is
//! not already on disk. An existing file is never re-downloaded.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

/// Ensure the model checkpoint exists locally, downloading it if needed
pub async fn ensure_model(model_path: &Path, model_url: Option<&str>) -> Result<()> {
    if model_path.exists() {
        info!("Model found at {:?}", model_path);
        return Ok(());
    }

    let url = match model_url {
        Some(url) => url,
        None => bail!(
            "Model not found at {:?} and no download URL configured",
            model_path
        ),
    };

    info!("Model not found locally, downloading from {}", url);

    if let Some(parent) = model_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create model directory {:?}", parent))?;
    }

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to request model from {}", url))?;

    if !response.status().is_success() {
        bail!("Model download failed with status {}", response.status());
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read model download body")?;

    if bytes.is_empty() {
        bail!("Model download returned an empty body");
    }

    tokio::fs::write(model_path, &bytes)
        .await
        .with_context(|| format!("Failed to write model to {:?}", model_path))?;

    info!(
        "Model downloaded to {:?} ({} bytes)",
        model_path,
        bytes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_existing_model_skips_download() {
        let path = std::env::temp_dir().join("oncolens_fetch_test.mpk");
        tokio::fs::write(&path, b"model bytes").await.unwrap();

        // No URL configured, but the file exists so this must succeed
        ensure_model(&path, None).await.unwrap();

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_model_without_url_fails() {
        let path = std::env::temp_dir().join("oncolens_fetch_missing.mpk");
        let _ = tokio::fs::remove_file(&path).await;

        let result = ensure_model(&path, None).await;
        assert!(result.is_err());
    }
}
