//! Request listener
//!
//! A plain HTTP responder running beside the bot's event loop. Every
//! request, whatever its method or path, gets the same plaintext answer.
//! Each connection is served on its own task, so a stalled client never
//! holds up the accept loop.

use crate::error::BotError;
use crate::metrics;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Body of every response
pub const RESPONSE_BODY: &str = "Hello from the web server!";

/// Lifecycle of the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Stopped,
    /// Binding the listening address
    Starting,
    Running { local_addr: SocketAddr },
}

impl ListenerState {
    pub fn is_running(&self) -> bool {
        matches!(self, ListenerState::Running { .. })
    }
}

/// Accept loop answering every request with [`RESPONSE_BODY`]
pub struct RequestListener {
    addr: SocketAddr,
    state: watch::Sender<ListenerState>,
    shutdown: watch::Sender<bool>,
}

impl RequestListener {
    pub fn new(addr: SocketAddr) -> Self {
        let (state, _) = watch::channel(ListenerState::Stopped);
        let (shutdown, _) = watch::channel(false);
        Self {
            addr,
            state,
            shutdown,
        }
    }

    /// Current state
    pub fn state(&self) -> ListenerState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<ListenerState> {
        self.state.subscribe()
    }

    /// Run the listener as an independent task.
    ///
    /// Failures end up in the log and in the state; the caller is not told.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                metrics::record_error(&e);
                error!(error = %e, "Request listener stopped");
            }
        })
    }

    /// Bind, then serve until [`stop`](Self::stop) is called.
    ///
    /// Always ends in [`ListenerState::Stopped`].
    pub async fn run(&self) -> Result<(), BotError> {
        self.state.send_replace(ListenerState::Starting);

        let bound = TcpListener::bind(self.addr)
            .await
            .and_then(|listener| Ok((listener.local_addr()?, listener)));
        let (local_addr, listener) = match bound {
            Ok(bound) => bound,
            Err(source) => {
                self.state.send_replace(ListenerState::Stopped);
                return Err(BotError::ListenerBind {
                    addr: self.addr,
                    source,
                });
            }
        };

        self.state.send_replace(ListenerState::Running { local_addr });
        info!(%local_addr, "Web server started, listening for incoming requests");

        let mut shutdown = self.shutdown.subscribe();
        let result = axum::serve(listener, router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await;

        self.state.send_replace(ListenerState::Stopped);
        info!(%local_addr, "Web server stopped");
        result.map_err(BotError::ListenerServe)
    }

    /// Ask the accept loop to finish. In-flight requests are completed.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }
}

/// Every method and path lands on the fallback
fn router() -> Router {
    Router::new()
        .fallback(respond)
        .layer(TraceLayer::new_for_http())
}

async fn respond() -> impl IntoResponse {
    metrics::record_web_request();
    ([(header::CONTENT_TYPE, "text/plain")], RESPONSE_BODY)
}
