//! Message router: exposes context operations as asynchronous named actions.
//!
//! Every request gets exactly one reply. Handlers are async and return a
//! `Result`; the router awaits them and converts the outcome into a
//! [`Response`]. Transport failures (peer gone, reply channel dropped) are a
//! separate error class from a `success: false` reply.

mod message;

pub use message::{Payload, Request, Response};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// The message channel failed before a reply arrived.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportError {
    /// The receiving context is gone; the request was never accepted.
    #[error("receiving context is not available")]
    Disconnected,
    /// The request was accepted but the reply channel closed without a reply.
    #[error("message channel closed before a response was received")]
    NoReply,
    /// The reply could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of a routed call as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The peer answered `success: false`.
    #[error("{0}")]
    Rejected(String),
}

/// Serves the actions of one execution context.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: Request) -> anyhow::Result<Payload>;
}

/// Runs `handler` on `request` and shapes the single reply.
pub async fn dispatch(handler: &dyn Handler, request: Request) -> Response {
    let action = request.action();
    match handler.handle(request).await {
        Ok(payload) => Response::ok(payload),
        Err(e) => {
            tracing::warn!(action, error = %format!("{:#}", e), "request failed");
            Response::failure(format!("{:#}", e))
        }
    }
}

/// Error for an action the context does not serve.
pub fn unsupported(request: &Request) -> anyhow::Error {
    anyhow::anyhow!("unsupported action: {}", request.action())
}

type Envelope = (Request, oneshot::Sender<Response>);

/// Sending side of a context's router. Cheap to clone.
#[derive(Clone)]
pub struct RouterClient {
    tx: mpsc::Sender<Envelope>,
}

impl RouterClient {
    #[cfg(test)]
    pub(crate) fn from_sender(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Sends `request` and waits for its reply.
    pub async fn request(&self, request: Request) -> Result<Response, TransportError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| TransportError::Disconnected)?;
        reply_rx.await.map_err(|_| TransportError::NoReply)
    }

    /// [`request`](Self::request), then the application-level payload.
    pub async fn call(&self, request: Request) -> Result<Payload, RouterError> {
        self.request(request).await?.into_payload()
    }
}

/// Starts the router loop for `handler` and returns its client.
///
/// Each request runs on its own task, so a long download batch does not
/// hold up other messages to the same context. The loop ends when every
/// client has been dropped.
pub fn spawn_router(handler: Arc<dyn Handler>) -> RouterClient {
    let (tx, mut rx) = mpsc::channel::<Envelope>(32);
    tokio::spawn(async move {
        while let Some((request, reply)) = rx.recv().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let response = dispatch(handler.as_ref(), request).await;
                if reply.send(response).is_err() {
                    tracing::debug!("requester went away before the reply");
                }
            });
        }
        tracing::debug!("router loop finished");
    });
    RouterClient { tx }
}
