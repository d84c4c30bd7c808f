//! Non-interactive modes: `--list`, `--fetch` and `--sync`

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, TRANSACTIONS_ENDPOINT};
use crate::download::{self, Downloader, SYNC_FILE_NAME};
use crate::endpoint::state::EndpointView;
use crate::endpoint::{catalog, EndpointDescriptor};

/// Catalog entries as printed by `--list`
pub fn catalog_json(descriptors: &[EndpointDescriptor]) -> Value {
    descriptors
        .iter()
        .map(|d| {
            serde_json::json!({
                "endpoint": d.endpoint,
                "name": d.name,
                "schema": d.schema,
                "description": d.description,
                "categories": d.categories,
                "sync": d.supports_sync(),
            })
        })
        .collect()
}

/// Request one endpoint and return its transformed rows.
/// A backend-reported error is an `Err`.
pub async fn fetch_rows(client: &ApiClient, endpoint: &str) -> Result<Value> {
    let descriptor = catalog::find(endpoint)
        .ok_or_else(|| anyhow::anyhow!("Unknown endpoint: {}", endpoint))?;

    let mut view = EndpointView::mount(descriptor, 1);
    view.begin_request();
    let body = client
        .get_endpoint(endpoint)
        .await
        .with_context(|| format!("Request to {} failed", client.endpoint_url(endpoint)))?;
    view.complete_request(&body);

    if let Some(error) = &view.error {
        anyhow::bail!("{} returned an error: {}", endpoint, error.raw());
    }

    Ok(serde_json::json!({
        "endpoint": endpoint,
        "rows": view.transformed_data,
        "pdf": view.pdf.is_some(),
    }))
}

/// Run the transactions sync and save its PDF as `transactions.pdf`
pub async fn sync_to_disk(client: &ApiClient, downloader: &dyn Downloader) -> Result<PathBuf> {
    let descriptor = catalog::find(TRANSACTIONS_ENDPOINT)
        .ok_or_else(|| anyhow::anyhow!("Transactions endpoint missing from catalog"))?;

    let mut view = EndpointView::mount(descriptor, 1);
    view.begin_sync();
    let body = client
        .sync_transactions()
        .await
        .context("Transactions sync failed")?;
    let pdf = view.complete_sync(&body);

    if let Some(error) = &view.error {
        anyhow::bail!("Transactions sync returned an error: {}", error.raw());
    }
    let pdf = pdf.ok_or_else(|| anyhow::anyhow!("Transactions sync returned no PDF"))?;

    download::save_pdf(downloader, &pdf, SYNC_FILE_NAME)
}

/// Tell the desktop a file was saved. A failed notification is only logged;
/// returns whether it was delivered.
pub fn announce_saved(path: &Path, send: impl FnOnce(&str, &str) -> Result<()>) -> bool {
    match send("quickstart-tui", &format!("Saved {}", path.display())) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Notification failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::serve_once;
    use crate::download::DirDownloader;

    #[test]
    fn test_catalog_json_flags_sync() {
        let entries = catalog_json(&catalog::builtin());
        let syncing: Vec<_> = entries
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["sync"] == true)
            .map(|e| e["endpoint"].clone())
            .collect();
        assert_eq!(syncing, vec![Value::from("transactions")]);
    }

    #[tokio::test]
    async fn test_fetch_rows_returns_transformed_rows() {
        let body = r#"{"latest_transactions":[{"name":"Uber","amount":6.33,"date":"2024-01-02"}]}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let output = fetch_rows(&ApiClient::new(base), "transactions").await.unwrap();
        server.await.unwrap();

        assert_eq!(output["rows"][0]["name"], "Uber");
        assert_eq!(output["rows"][0]["amount"], "6.33");
        assert_eq!(output["pdf"], false);
    }

    #[tokio::test]
    async fn test_fetch_rows_backend_error_is_err() {
        let body = r#"{"error":{"error_code":"X"}}"#;
        let (base, server) = serve_once("400 Bad Request", body).await;

        let result = fetch_rows(&ApiClient::new(base), "transactions").await;
        server.await.unwrap();

        let message = result.unwrap_err().to_string();
        assert!(message.contains("returned an error"), "{}", message);
        assert!(message.contains("\"X\""), "{}", message);
    }

    #[tokio::test]
    async fn test_fetch_rows_unknown_endpoint() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let message = fetch_rows(&client, "nope").await.unwrap_err().to_string();
        assert_eq!(message, "Unknown endpoint: nope");
    }

    #[tokio::test]
    async fn test_sync_to_disk_saves_pdf() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = DirDownloader::new(tmp.path());
        let (base, server) = serve_once("200 OK", r#"{"pdf":"JVBERi0xLjQ="}"#).await;

        let path = sync_to_disk(&ApiClient::new(base), &downloader).await.unwrap();
        server.await.unwrap();

        assert_eq!(path, tmp.path().join("transactions.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_sync_to_disk_without_pdf_is_err() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = DirDownloader::new(tmp.path());
        let (base, server) = serve_once("200 OK", "{}").await;

        let result = sync_to_disk(&ApiClient::new(base), &downloader).await;
        server.await.unwrap();

        assert_eq!(result.unwrap_err().to_string(), "Transactions sync returned no PDF");
        assert!(!tmp.path().join("transactions.pdf").exists());
    }

    #[test]
    fn test_announce_saved_tolerates_missing_daemon() {
        let delivered = announce_saved(Path::new("/tmp/transactions.pdf"), |_, _| {
            anyhow::bail!("org.freedesktop.Notifications was not provided")
        });
        assert!(!delivered);
    }

    #[test]
    fn test_announce_saved_passes_path() {
        let mut seen = String::new();
        let delivered = announce_saved(Path::new("/tmp/transactions.pdf"), |summary, body| {
            seen = format!("{}: {}", summary, body);
            Ok(())
        });
        assert!(delivered);
        assert_eq!(seen, "quickstart-tui: Saved /tmp/transactions.pdf");
    }

    #[tokio::test]
    async fn test_sync_to_disk_backend_error_is_err() {
        let tmp = tempfile::tempdir().unwrap();
        let downloader = DirDownloader::new(tmp.path());
        let body = r#"{"error":{"error_code":"Z"},"pdf":"JVBERi0="}"#;
        let (base, server) = serve_once("200 OK", body).await;

        let result = sync_to_disk(&ApiClient::new(base), &downloader).await;
        server.await.unwrap();

        assert!(result.unwrap_err().to_string().contains("returned an error"));
        assert!(!tmp.path().join("transactions.pdf").exists());
    }
}
