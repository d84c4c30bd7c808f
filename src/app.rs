use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::api::{ApiClient, ApiError};
use crate::download::{self, Downloader, MANUAL_FILE_NAME, SYNC_FILE_NAME};
use crate::endpoint::state::{Action, EndpointView};
use crate::endpoint::EndpointDescriptor;

/// Seconds a status message stays on the info line
const STATUS_TIMEOUT_SECS: u64 = 3;

/// Rows moved per PageUp/PageDown
const SCROLL_STEP: usize = 5;

/// Result of a spawned request, addressed to the view that sent it
#[derive(Debug)]
pub enum ApiEvent {
    Fetched {
        view: usize,
        mount_id: u64,
        result: Result<Value, ApiError>,
    },
    Synced {
        view: usize,
        mount_id: u64,
        result: Result<Value, ApiError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub popup: Popup,

    // One mounted view per endpoint (left list)
    pub views: Vec<EndpointView>,
    pub selected: usize,
    pub table_scroll: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    client: ApiClient,
    downloader: Arc<dyn Downloader>,
    notifications: bool,
    next_mount_id: u64,

    events_tx: mpsc::UnboundedSender<ApiEvent>,
    events_rx: mpsc::UnboundedReceiver<ApiEvent>,
}

impl App {
    pub fn new(
        descriptors: Vec<EndpointDescriptor>,
        client: ApiClient,
        downloader: Arc<dyn Downloader>,
        notifications: bool,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            popup: Popup::None,
            views: Vec::with_capacity(descriptors.len()),
            selected: 0,
            table_scroll: 0,
            status_message: None,
            status_message_time: None,
            client,
            downloader,
            notifications,
            next_mount_id: 1,
            events_tx,
            events_rx,
        };

        for descriptor in descriptors {
            let mount_id = app.take_mount_id();
            app.views.push(EndpointView::mount(descriptor, mount_id));
        }

        app
    }

    fn take_mount_id(&mut self) -> u64 {
        let id = self.next_mount_id;
        self.next_mount_id += 1;
        id
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn selected_view(&self) -> Option<&EndpointView> {
        self.views.get(self.selected)
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup == Popup::Help {
            if matches!(
                key.code,
                KeyCode::Esc
                    | KeyCode::Char('?')
                    | KeyCode::Char('h')
                    | KeyCode::Enter
                    | KeyCode::Char('q')
            ) {
                self.popup = Popup::None;
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),

            KeyCode::Enter | KeyCode::Char('s') => self.send_request(),
            KeyCode::Char('t') => self.get_transactions(),
            KeyCode::Char('p') => self.download_pdf()?,
            KeyCode::Char('x') => self.remount_selected(),

            KeyCode::PageDown => self.scroll_down(),
            KeyCode::PageUp => self.table_scroll = self.table_scroll.saturating_sub(SCROLL_STEP),

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    /// Scroll the table, stopping at the last row
    fn scroll_down(&mut self) {
        let last = self
            .selected_view()
            .map(|v| v.transformed_data.len().saturating_sub(1))
            .unwrap_or(0);
        self.table_scroll = self.table_scroll.saturating_add(SCROLL_STEP).min(last);
    }

    fn move_down(&mut self) {
        if self.selected + 1 < self.views.len() {
            self.selected += 1;
            self.table_scroll = 0;
        }
    }

    fn move_up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.table_scroll = 0;
        }
    }

    /// Fire the primary request for the selected view
    fn send_request(&mut self) {
        let index = self.selected;
        let Some(view) = self.views.get_mut(index) else {
            return;
        };

        view.begin_request();
        let endpoint = view.descriptor.endpoint.clone();
        let mount_id = view.mount_id;
        let client = self.client.clone();
        let tx = self.events_tx.clone();

        tracing::info!("GET {}", client.endpoint_url(&endpoint));
        tokio::spawn(async move {
            let result = client.get_endpoint(&endpoint).await;
            // Receiver only goes away when the app exits
            let _ = tx.send(ApiEvent::Fetched { view: index, mount_id, result });
        });
    }

    /// Fire the transactions sync for the selected view, if it offers one
    fn get_transactions(&mut self) {
        let index = self.selected;
        let Some(view) = self.views.get_mut(index) else {
            return;
        };
        if !view.offers(Action::GetTransactions) {
            return;
        }

        view.begin_sync();
        let mount_id = view.mount_id;
        let client = self.client.clone();
        let tx = self.events_tx.clone();

        tracing::info!("Syncing transactions");
        tokio::spawn(async move {
            let result = client.sync_transactions().await;
            let _ = tx.send(ApiEvent::Synced { view: index, mount_id, result });
        });
    }

    /// Save the held PDF under the manual download name
    fn download_pdf(&mut self) -> Result<()> {
        let Some(pdf) = self.selected_view().and_then(|v| v.pdf.clone()) else {
            self.set_status("No PDF to download");
            return Ok(());
        };

        let path = download::save_pdf(self.downloader.as_ref(), &pdf, MANUAL_FILE_NAME)?;
        self.set_status(format!("Saved {}", path.display()));
        Ok(())
    }

    /// Replace the selected view with a fresh instance; in-flight results for
    /// the old one are dropped when they arrive
    fn remount_selected(&mut self) {
        let mount_id = self.take_mount_id();
        if let Some(view) = self.views.get_mut(self.selected) {
            tracing::debug!(
                "Remounting {} ({} -> {})",
                view.descriptor.endpoint,
                view.mount_id,
                mount_id
            );
            *view = EndpointView::mount(view.descriptor.clone(), mount_id);
            self.table_scroll = 0;
            self.set_status("View reset");
        }
    }

    /// Apply every request result that has arrived since the last call
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            applied += 1;
        }
        applied
    }

    pub fn apply_event(&mut self, event: ApiEvent) {
        let (index, mount_id) = match &event {
            ApiEvent::Fetched { view, mount_id, .. } | ApiEvent::Synced { view, mount_id, .. } => {
                (*view, *mount_id)
            }
        };

        let Some(view) = self.views.get_mut(index).filter(|v| v.mount_id == mount_id) else {
            tracing::debug!(
                "Dropping result for unmounted view {} (mount {})",
                index,
                mount_id
            );
            return;
        };
        let endpoint = view.descriptor.endpoint.clone();

        match event {
            ApiEvent::Fetched { result: Ok(body), .. } => view.complete_request(&body),
            ApiEvent::Fetched { result: Err(e), .. } => {
                view.fail_request();
                tracing::warn!("{} request failed: {}", endpoint, e);
                self.set_status(format!("{}: {}", endpoint, e));
            }
            ApiEvent::Synced { result: Ok(body), .. } => {
                if let Some(pdf) = view.complete_sync(&body) {
                    self.auto_download(&pdf);
                }
            }
            ApiEvent::Synced { result: Err(e), .. } => {
                view.fail_sync();
                tracing::warn!("Transactions sync failed: {}", e);
                self.set_status(format!("sync: {}", e));
            }
        }
    }

    /// Save a sync PDF as soon as it arrives, independent of the manual action
    fn auto_download(&mut self, pdf: &crate::api::payload::PdfPayload) {
        match download::save_pdf(self.downloader.as_ref(), pdf, SYNC_FILE_NAME) {
            Ok(path) => {
                let msg = format!("Saved {}", path.display());
                if self.notifications {
                    if let Err(e) = notify("quickstart-tui", &msg) {
                        tracing::warn!("Notification failed: {}", e);
                    }
                }
                self.set_status(msg);
            }
            Err(e) => {
                tracing::warn!("Automatic download failed: {:#}", e);
                self.set_status(format!("Download failed: {}", e));
            }
        }
    }

    pub fn tick(&mut self) {
        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_TIMEOUT_SECS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

pub fn notify(summary: &str, body: &str) -> Result<()> {
    notify_rust::Notification::new()
        .summary(summary)
        .body(body)
        .icon("document-save")
        .show()?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::test_support::serve_once;
    use crate::endpoint::catalog;
    use crossterm::event::KeyModifiers;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingDownloader {
        pub saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Downloader for RecordingDownloader {
        fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
            self.saved.lock().unwrap().push((file_name.to_string(), bytes.to_vec()));
            Ok(PathBuf::from("/downloads").join(file_name))
        }
    }

    impl RecordingDownloader {
        fn names(&self) -> Vec<String> {
            self.saved.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
        }
    }

    pub(crate) fn test_app(base_url: &str) -> (App, Arc<RecordingDownloader>) {
        let downloader = Arc::new(RecordingDownloader::default());
        let app = App::new(
            catalog::builtin(),
            ApiClient::new(base_url),
            downloader.clone(),
            false,
        );
        (app, downloader)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn select(app: &mut App, endpoint: &str) {
        app.selected = app
            .views
            .iter()
            .position(|v| v.descriptor.endpoint == endpoint)
            .unwrap();
    }

    fn current(app: &App) -> (usize, u64) {
        (app.selected, app.selected_view().unwrap().mount_id)
    }

    #[test]
    fn test_views_get_distinct_mount_ids() {
        let (app, _) = test_app("http://localhost:8000");
        let mut ids: Vec<_> = app.views.iter().map(|v| v.mount_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), app.views.len());
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let (mut app, _) = test_app("http://localhost:8000");
        app.handle_key(key(KeyCode::Up)).unwrap();
        assert_eq!(app.selected, 0);
        for _ in 0..20 {
            app.handle_key(key(KeyCode::Char('j'))).unwrap();
        }
        assert_eq!(app.selected, app.views.len() - 1);
    }

    #[test]
    fn test_fetched_event_updates_view() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "identity");
        let (view, mount_id) = current(&app);
        app.views[view].begin_request();

        let body = json!({ "identity": [{ "owners": [{ "names": ["Ada"] }] }] });
        app.apply_event(ApiEvent::Fetched { view, mount_id, result: Ok(body) });

        let v = app.selected_view().unwrap();
        assert!(v.show_table && !v.is_loading);
        assert_eq!(v.transformed_data[0]["names"], "Ada");
        assert!(v.pdf.is_none());
    }

    #[test]
    fn test_stale_result_after_remount_is_ignored() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "auth");
        let (view, old_mount) = current(&app);
        app.views[view].begin_request();

        app.handle_key(key(KeyCode::Char('x'))).unwrap();
        assert_ne!(app.selected_view().unwrap().mount_id, old_mount);

        let body = json!({ "accounts": [] });
        app.apply_event(ApiEvent::Fetched { view, mount_id: old_mount, result: Ok(body) });

        let v = app.selected_view().unwrap();
        assert!(!v.show_table);
        assert!(!v.is_loading);
    }

    #[test]
    fn test_transport_failure_clears_flag_and_reports() {
        let (mut app, _) = test_app("http://localhost:8000");
        let (view, mount_id) = current(&app);
        app.views[view].begin_request();

        app.apply_event(ApiEvent::Fetched {
            view,
            mount_id,
            result: Err(ApiError::Request("connection refused".to_string())),
        });

        let v = app.selected_view().unwrap();
        assert!(!v.is_loading);
        assert!(v.error.is_none());
        assert!(app.status_message.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_sync_auto_downloads_then_manual_download() {
        let (mut app, downloader) = test_app("http://localhost:8000");
        select(&mut app, "transactions");
        let (view, mount_id) = current(&app);
        app.views[view].begin_sync();

        let body = json!({ "pdf": "JVBERi0xLjQ=" });
        app.apply_event(ApiEvent::Synced { view, mount_id, result: Ok(body) });
        assert_eq!(downloader.names(), vec![SYNC_FILE_NAME.to_string()]);
        assert!(!app.selected_view().unwrap().is_getting_transactions);
        assert!(app.selected_view().unwrap().offers(Action::DownloadPdf));

        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        assert_eq!(
            downloader.names(),
            vec![SYNC_FILE_NAME.to_string(), MANUAL_FILE_NAME.to_string()]
        );
        let saved = downloader.saved.lock().unwrap();
        assert_eq!(saved[1].1, b"%PDF-1.4".to_vec());
    }

    #[test]
    fn test_sync_error_does_not_download() {
        let (mut app, downloader) = test_app("http://localhost:8000");
        select(&mut app, "transactions");
        let (view, mount_id) = current(&app);

        let body = json!({ "error": { "error_code": "X" } });
        app.apply_event(ApiEvent::Synced { view, mount_id, result: Ok(body) });

        assert!(downloader.names().is_empty());
        assert!(app.selected_view().unwrap().error.is_some());
    }

    #[test]
    fn test_download_without_pdf_only_reports() {
        let (mut app, downloader) = test_app("http://localhost:8000");
        app.handle_key(key(KeyCode::Char('p'))).unwrap();
        assert!(downloader.names().is_empty());
        assert_eq!(app.status_message.as_deref(), Some("No PDF to download"));
    }

    #[test]
    fn test_sync_key_ignored_outside_transactions() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "auth");
        app.handle_key(key(KeyCode::Char('t'))).unwrap();
        assert!(!app.selected_view().unwrap().is_getting_transactions);
    }

    #[test]
    fn test_page_down_stops_at_last_row() {
        let (mut app, _) = test_app("http://localhost:8000");
        select(&mut app, "transactions");
        let (view, mount_id) = current(&app);

        let body = json!({ "latest_transactions": [
            { "name": "Uber", "amount": 6.33, "date": "2024-01-02" },
            { "name": "Touchstone", "amount": 500, "date": "2024-01-01" },
            { "name": "United", "amount": 500, "date": "2023-12-30" },
        ] });
        app.apply_event(ApiEvent::Fetched { view, mount_id, result: Ok(body) });

        for _ in 0..10 {
            app.handle_key(key(KeyCode::PageDown)).unwrap();
        }
        assert_eq!(app.table_scroll, 2);

        app.handle_key(key(KeyCode::PageUp)).unwrap();
        assert_eq!(app.table_scroll, 0);
    }

    #[test]
    fn test_page_down_without_rows_stays_at_top() {
        let (mut app, _) = test_app("http://localhost:8000");
        app.handle_key(key(KeyCode::PageDown)).unwrap();
        assert_eq!(app.table_scroll, 0);
    }

    #[test]
    fn test_help_popup_toggles() {
        let (mut app, _) = test_app("http://localhost:8000");
        app.handle_key(key(KeyCode::Char('?'))).unwrap();
        assert_eq!(app.popup, Popup::Help);
        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.popup, Popup::None);
        assert!(!app.selected_view().unwrap().is_loading);
    }

    #[tokio::test]
    async fn test_send_request_round_trip() {
        let (base, server) = serve_once("200 OK", r#"{"error":{"error_code":"X"}}"#).await;
        let (mut app, _) = test_app(&base);
        select(&mut app, "transactions");

        app.handle_key(key(KeyCode::Enter)).unwrap();
        assert!(app.selected_view().unwrap().is_loading);

        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);
        assert_eq!(server.await.unwrap(), "GET /api/transactions HTTP/1.1");

        let v = app.selected_view().unwrap();
        assert!(!v.is_loading);
        assert!(!v.show_table);
        assert_eq!(v.error.as_ref().unwrap().raw(), &json!({ "error_code": "X" }));
    }

    #[tokio::test]
    async fn test_get_transactions_round_trip() {
        let (base, server) = serve_once("200 OK", r#"{"pdf":"JVBERi0xLjQ="}"#).await;
        let (mut app, downloader) = test_app(&base);
        select(&mut app, "transactions");

        app.handle_key(key(KeyCode::Char('t'))).unwrap();
        assert!(app.selected_view().unwrap().is_getting_transactions);
        assert!(!app.selected_view().unwrap().is_loading);

        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);
        assert_eq!(server.await.unwrap(), "POST /api/transactions/sync HTTP/1.1");

        assert!(!app.selected_view().unwrap().is_getting_transactions);
        assert_eq!(downloader.names(), vec![SYNC_FILE_NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_clears_loading() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (mut app, _) = test_app(&format!("http://{}", addr));
        app.handle_key(key(KeyCode::Char('s'))).unwrap();
        assert!(app.selected_view().unwrap().is_loading);

        let event = app.events_rx.recv().await.unwrap();
        app.apply_event(event);
        assert!(!app.selected_view().unwrap().is_loading);
        assert!(app.status_message.is_some());
    }
}
