//! Exported operations and their dispatch.
//!
//! The exported surface is a closed set: [`OperationCall`] enumerates
//! every operation other execution contexts may invoke, and parsing a wire
//! method name into it is the only place an unknown method can appear.
//! Past that boundary, dispatch is an exhaustive match; there is no
//! handler table to miss.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::collaborators::Collaborators;
use crate::error::{Error, Result};
use crate::identifiers::{RecordId, TabId};
use crate::rpc::message::{RpcRequest, RpcResponse};
use crate::store::TabStore;

// ============================================================================
// OperationCall
// ============================================================================

/// A parsed invocation of one exported operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationCall {
    /// `listCaptures(tabId)`: `{id, meta}` projections for a tab.
    ListCaptures {
        /// Tab to list.
        tab_id: TabId,
    },

    /// `downloadCapture(tabId, recordId)`: render and download one record.
    DownloadCapture {
        /// Tab holding the record.
        tab_id: TabId,
        /// Record to download.
        record_id: RecordId,
    },
}

impl OperationCall {
    /// Wire name of `listCaptures`.
    pub const LIST_CAPTURES: &'static str = "listCaptures";

    /// Wire name of `downloadCapture`.
    pub const DOWNLOAD_CAPTURE: &'static str = "downloadCapture";

    /// Parses a wire method name and positional params.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownMethod`] for a method outside the exported set
    /// - [`Error::InvalidParams`] for missing or mistyped params
    pub fn parse(method: &str, params: &[Value]) -> Result<Self> {
        match method {
            Self::LIST_CAPTURES => Ok(Self::ListCaptures {
                tab_id: tab_id_param(params, 0)?,
            }),

            Self::DOWNLOAD_CAPTURE => Ok(Self::DownloadCapture {
                tab_id: tab_id_param(params, 0)?,
                record_id: record_id_param(params, 1)?,
            }),

            _ => Err(Error::unknown_method(method)),
        }
    }

    /// Wire name of this operation.
    #[inline]
    #[must_use]
    pub const fn method(&self) -> &'static str {
        match self {
            Self::ListCaptures { .. } => Self::LIST_CAPTURES,
            Self::DownloadCapture { .. } => Self::DOWNLOAD_CAPTURE,
        }
    }
}

/// Extracts a tab ID from positional params.
fn tab_id_param(params: &[Value], index: usize) -> Result<TabId> {
    let raw = params
        .get(index)
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::invalid_params(format!("param {index} must be a tab id")))?;

    let raw = u32::try_from(raw)
        .map_err(|_| Error::invalid_params(format!("param {index} is out of tab id range")))?;

    Ok(TabId::new(raw))
}

/// Extracts a record ID from positional params.
fn record_id_param(params: &[Value], index: usize) -> Result<RecordId> {
    params
        .get(index)
        .and_then(Value::as_str)
        .map(RecordId::from)
        .ok_or_else(|| Error::invalid_params(format!("param {index} must be a record id")))
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Executes exported operations against the store and collaborators.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<TabStore>,
    collaborators: Collaborators,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[inline]
    #[must_use]
    pub fn new(store: Arc<TabStore>, collaborators: Collaborators) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    /// Executes a parsed operation and returns its wire result.
    ///
    /// # Errors
    ///
    /// Propagates operation failures ([`Error::RecordNotFound`],
    /// collaborator errors); these become error responses at the message
    /// boundary.
    pub async fn dispatch(&self, call: OperationCall) -> Result<Value> {
        debug!(method = call.method(), "Dispatching operation");

        match call {
            OperationCall::ListCaptures { tab_id } => self.list_captures(tab_id).await,
            OperationCall::DownloadCapture { tab_id, record_id } => {
                self.download_capture(tab_id, record_id).await?;
                Ok(Value::Null)
            }
        }
    }

    /// Parses and executes a raw method invocation.
    ///
    /// # Errors
    ///
    /// Same as [`OperationCall::parse`] and [`dispatch`](Self::dispatch).
    pub async fn dispatch_raw(&self, method: &str, params: &[Value]) -> Result<Value> {
        let call = OperationCall::parse(method, params)?;
        self.dispatch(call).await
    }

    /// Handles one wire request, always producing a correlated response.
    ///
    /// Unknown methods and failed operations become error responses; this
    /// never panics on untrusted input.
    pub async fn handle(&self, request: &RpcRequest) -> RpcResponse {
        match self.dispatch_raw(&request.method, &request.params).await {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(error) => {
                warn!(method = %request.method, %error, "Operation failed");
                RpcResponse::failure(request.id, &error)
            }
        }
    }

    /// `listCaptures`: record projections for a tab.
    ///
    /// An unknown tab yields an empty list, never an error, so popups can
    /// poll any tab safely.
    async fn list_captures(&self, tab_id: TabId) -> Result<Value> {
        let summaries = match self.store.get(tab_id) {
            Some(context) => context.lock().await.summaries(),
            None => Vec::new(),
        };

        Ok(serde_json::to_value(summaries)?)
    }

    /// `downloadCapture`: render one record and trigger the download.
    ///
    /// Fails with [`Error::RecordNotFound`] before any collaborator is
    /// invoked when the tab or record is absent. The computed layout is
    /// cached on the record.
    async fn download_capture(&self, tab_id: TabId, record_id: RecordId) -> Result<()> {
        let context = self
            .store
            .get(tab_id)
            .ok_or_else(|| Error::record_not_found(tab_id, record_id.clone()))?;

        // Exclusive access for the whole export; concurrent captures for
        // this tab queue behind it.
        let mut guard = context.lock().await;

        if guard.find_record(&record_id).is_none() {
            return Err(Error::record_not_found(tab_id, record_id));
        }

        let options = self.collaborators.options.get().await?;

        let record = {
            let record = guard
                .find_record_mut(&record_id)
                .ok_or_else(|| Error::record_not_found(tab_id, record_id.clone()))?;

            let layout = self
                .collaborators
                .layout
                .layout(&record.content, &options)
                .await?;
            record.layout = Some(layout);
            record.clone()
        };

        let content = self.collaborators.renderer.render(&record, &options)?;
        let filename = self
            .collaborators
            .namer
            .filename(&record.meta.name, "ass")?;

        debug!(%tab_id, %record_id, %filename, bytes = content.len(), "Downloading capture");
        self.collaborators.downloader.download(content, &filename).await
    }
}

// ============================================================================
// Tests
// ============================================================================
