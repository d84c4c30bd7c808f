//! State of one mounted endpoint view
//!
//! The two request operations each own a loading flag and write into shared
//! payload slots. A view is only reset by replacing it (remounting) with a
//! fresh instance carrying a new mount id.

use serde_json::Value;

use super::{Data, EndpointDescriptor};
use crate::api::payload::{extract_error, extract_pdf, ErrorPayload, PdfPayload};

/// User-triggerable actions, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendRequest,
    GetTransactions,
    DownloadPdf,
}

impl Action {
    pub fn key_hint(&self) -> &'static str {
        match self {
            Action::SendRequest => "Enter",
            Action::GetTransactions => "t",
            Action::DownloadPdf => "p",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointView {
    pub descriptor: EndpointDescriptor,
    pub mount_id: u64,
    pub show_table: bool,
    pub transformed_data: Data,
    pub pdf: Option<PdfPayload>,
    pub error: Option<ErrorPayload>,
    pub is_loading: bool,
    pub is_getting_transactions: bool,
}

impl EndpointView {
    pub fn mount(descriptor: EndpointDescriptor, mount_id: u64) -> Self {
        Self {
            descriptor,
            mount_id,
            show_table: false,
            transformed_data: Vec::new(),
            pdf: None,
            error: None,
            is_loading: false,
            is_getting_transactions: false,
        }
    }

    /// Primary request sent
    pub fn begin_request(&mut self) {
        self.is_loading = true;
    }

    /// Primary request answered with a JSON body
    pub fn complete_request(&mut self, body: &Value) {
        self.is_loading = false;

        if let Some(error) = extract_error(body) {
            tracing::info!("{} returned an error", self.descriptor.endpoint);
            self.error = Some(error);
            self.show_table = false;
            return;
        }

        self.transformed_data = (self.descriptor.transform)(body);
        if let Some(pdf) = extract_pdf(body) {
            self.pdf = Some(pdf);
        }
        self.error = None;
        self.show_table = true;
        tracing::info!(
            "{} returned {} rows",
            self.descriptor.endpoint,
            self.transformed_data.len()
        );
    }

    /// Primary request never produced a body
    pub fn fail_request(&mut self) {
        self.is_loading = false;
    }

    /// Sync request sent
    pub fn begin_sync(&mut self) {
        self.is_getting_transactions = true;
    }

    /// Sync request answered. Returns the PDF to save automatically.
    pub fn complete_sync(&mut self, body: &Value) -> Option<PdfPayload> {
        self.is_getting_transactions = false;

        if let Some(error) = extract_error(body) {
            tracing::info!("transactions sync returned an error");
            self.error = Some(error);
            return None;
        }

        self.error = None;
        self.pdf = extract_pdf(body);
        if self.pdf.is_none() {
            tracing::warn!("transactions sync returned no pdf");
        }
        self.pdf.clone()
    }

    /// Sync request never produced a body
    pub fn fail_sync(&mut self) {
        self.is_getting_transactions = false;
    }

    /// Actions currently offered, in display order
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = vec![Action::SendRequest];
        if self.descriptor.supports_sync() {
            actions.push(Action::GetTransactions);
        }
        if self.pdf.is_some() {
            actions.push(Action::DownloadPdf);
        }
        actions
    }

    pub fn offers(&self, action: Action) -> bool {
        self.actions().contains(&action)
    }

    pub fn action_label(&self, action: Action) -> &'static str {
        match action {
            Action::SendRequest if self.is_loading => "Loading...",
            Action::SendRequest => "Send request",
            Action::GetTransactions if self.is_getting_transactions => "Loading...",
            Action::GetTransactions => "Get Transactions",
            Action::DownloadPdf => "Download PDF",
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_getting_transactions
    }
}
