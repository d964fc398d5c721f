//! WebSocket endpoint for RPC clients.
//!
//! Other execution contexts (popup pages, tooling) connect here and send
//! [`RpcRequest`] frames; every frame is answered with a correlated
//! [`RpcResponse`](crate::rpc::RpcResponse).
//!
//! # Connection Flow
//!
//! 1. Bind to localhost (port 0 for an OS-assigned port)
//! 2. Hand clients the `ws://` URL
//! 3. Accept loop spawns one serve task per client
//! 4. Each text frame is parsed, dispatched, answered

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{from_str, to_string};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::rpc::dispatcher::Dispatcher;
use crate::rpc::message::RpcRequest;

// ============================================================================
// RpcServer
// ============================================================================

/// A bound WebSocket server dispatching RPC messages.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
///
/// let server = RpcServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, dispatcher).await?;
/// let ws_url = server.ws_url();
/// tokio::spawn(server.run());
/// ```
pub struct RpcServer {
    /// TCP listener for incoming connections.
    listener: TcpListener,
    /// Port the server is bound to.
    port: u16,
    /// Shared operation dispatcher.
    dispatcher: Arc<Dispatcher>,
}

impl RpcServer {
    /// Binds the server to the specified address and port.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    ///
    /// [`Error::Io`]: crate::error::Error::Io
    pub async fn bind(ip: IpAddr, port: u16, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        debug!(port = actual_port, "RPC server bound");

        Ok(Self {
            listener,
            port: actual_port,
            dispatcher,
        })
    }

    /// Returns the port the server is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL clients connect to.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Accepts connections until the listener fails.
    ///
    /// Each accepted client is served on its own task; a misbehaving
    /// client never blocks the others.
    pub async fn run(self) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "RPC client connected");

            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                Self::serve_client(stream, dispatcher).await;
                debug!(%peer, "RPC client disconnected");
            });
        }
    }

    /// Serves one client connection to completion.
    async fn serve_client(stream: TcpStream, dispatcher: Arc<Dispatcher>) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!(error = %e, "WebSocket handshake failed");
                return;
            }
        };

        let (mut ws_write, mut ws_read) = ws_stream.split();

        while let Some(message) = ws_read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let request: RpcRequest = match from_str(&text) {
                        Ok(request) => request,
                        Err(e) => {
                            // No id to correlate an error response with.
                            warn!(error = %e, "Failed to parse RPC request");
                            continue;
                        }
                    };

                    let response = dispatcher.handle(&request).await;

                    if let Ok(json) = to_string(&response)
                        && let Err(e) = ws_write.send(Message::Text(json.into())).await
                    {
                        warn!(error = %e, "Failed to send RPC response");
                        break;
                    }
                }

                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed by client");
                    break;
                }

                Err(e) => {
                    error!(error = %e, "WebSocket error");
                    break;
                }

                // Ignore Binary, Ping, Pong
                _ => {}
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio_tungstenite::connect_async;

    use crate::collaborators::{
        Collaborators, Downloader, FileNamer, LayoutEngine, NullIndicator, OptionsProvider,
        TrackRenderer,
    };
    use crate::error::Error;
    use crate::identifiers::TabId;
    use crate::rpc::message::RpcResponse;
    use crate::store::{CaptureRecord, RecordMeta, TabStore};

    struct NullOptions;

    #[async_trait]
    impl OptionsProvider for NullOptions {
        async fn get(&self) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    struct NullLayout;

    #[async_trait]
    impl LayoutEngine for NullLayout {
        async fn layout(&self, _content: &Value, _options: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    struct NullRenderer;

    impl TrackRenderer for NullRenderer {
        fn render(&self, _record: &CaptureRecord, _options: &Value) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    struct NullNamer;

    impl FileNamer for NullNamer {
        fn filename(&self, name: &str, extension: &str) -> Result<String> {
            Ok(format!("{name}.{extension}"))
        }
    }

    struct NullDownloader;

    #[async_trait]
    impl Downloader for NullDownloader {
        async fn download(&self, _content: Vec<u8>, _filename: &str) -> Result<()> {
            Ok(())
        }
    }

    async fn spawn_server() -> (String, Arc<TabStore>) {
        let store = Arc::new(TabStore::new(Arc::new(NullIndicator)));
        let collaborators = Collaborators {
            options: Arc::new(NullOptions),
            layout: Arc::new(NullLayout),
            renderer: Arc::new(NullRenderer),
            namer: Arc::new(NullNamer),
            downloader: Arc::new(NullDownloader),
        };
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), collaborators));

        let server = RpcServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0, dispatcher)
            .await
            .expect("bind");
        let url = server.ws_url();
        tokio::spawn(server.run());

        (url, store)
    }

    async fn roundtrip(url: &str, request: &RpcRequest) -> RpcResponse {
        let (mut ws, _) = connect_async(url).await.expect("connect");
        let json = to_string(request).expect("serialize");
        ws.send(Message::Text(json.into())).await.expect("send");

        loop {
            match ws.next().await.expect("response frame").expect("read") {
                Message::Text(text) => return from_str(&text).expect("parse response"),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_list_captures_over_websocket() {
        let (url, store) = spawn_server().await;
        store
            .context(TabId::new(7))
            .lock()
            .await
            .push_record(CaptureRecord::new(
                "a",
                RecordMeta::named("Track A"),
                json!(null),
            ));

        let request = RpcRequest::new("listCaptures", vec![json!(7)]);
        let response = roundtrip(&url, &request).await;

        assert!(response.is_success());
        assert_eq!(response.id, request.id);
        let result = response.into_result().expect("success");
        assert_eq!(result[0]["id"], "a");
    }

    #[tokio::test]
    async fn test_unknown_method_is_error_response_not_crash() {
        let (url, _store) = spawn_server().await;

        let request = RpcRequest::new("bogusMethod", vec![]);
        let response = roundtrip(&url, &request).await;

        assert!(response.is_error());
        assert_eq!(response.error.as_deref(), Some("unknown method"));

        // The server survived; a second request still works.
        let request = RpcRequest::new("listCaptures", vec![json!(1)]);
        let response = roundtrip(&url, &request).await;
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_record_not_found_over_websocket() {
        let (url, _store) = spawn_server().await;

        let request = RpcRequest::new("downloadCapture", vec![json!(7), json!("missing-id")]);
        let response = roundtrip(&url, &request).await;

        assert!(response.is_error());
        assert_eq!(
            response.error.as_deref(),
            Some(Error::record_not_found(TabId::new(7), "missing-id").code())
        );
    }
}
