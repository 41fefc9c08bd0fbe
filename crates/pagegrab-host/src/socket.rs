//! Router socket: server (during `pagegrab-host`) and client.
//! Protocol: one JSON request per line, answered by one JSON response line.

use anyhow::{Context, Result};
use pagegrab_core::router::{Request, Response, RouterClient, TransportError};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Contexts reachable through the socket.
#[derive(Clone)]
pub struct Routes {
    pub background: RouterClient,
    pub page: Option<RouterClient>,
}

impl Routes {
    /// `scanAssets` goes to the page context when one is loaded; without one
    /// the background context answers it as unsupported.
    fn client_for(&self, request: &Request) -> &RouterClient {
        match (request, &self.page) {
            (Request::ScanAssets { .. }, Some(page)) => page,
            _ => &self.background,
        }
    }

    async fn answer(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => return Response::failure(format!("malformed request: {}", e)),
        };
        let action = request.action();
        match self.client_for(&request).request(request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(action, "router transport: {}", e);
                Response::transport_failure(e)
            }
        }
    }
}

/// Binds `path` (replacing a stale socket) and spawns the accept loop.
pub fn spawn_socket_server(
    routes: Routes,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create socket dir {}", parent.display()))?;
    }
    let _ = std::fs::remove_file(&path);
    let listener =
        UnixListener::bind(&path).with_context(|| format!("bind socket {}", path.display()))?;
    tracing::info!(path = %path.display(), "router socket listening");

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let routes = routes.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, &routes).await {
                            tracing::debug!("router socket connection: {}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("router socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve_connection(stream: UnixStream, routes: &Routes) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = routes.answer(line).await;
        let mut out = serde_json::to_string(&response).map_err(std::io::Error::other)?;
        out.push('\n');
        write.write_all(out.as_bytes()).await?;
    }
    Ok(())
}

/// Sends one request line and reads its reply.
///
/// A transport failure inside the daemon comes back as that
/// [`TransportError`], not as an application-level `success: false`.
pub async fn send_request(socket_path: &Path, request: &Request) -> Result<Response, TransportError> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|_| TransportError::Disconnected)?;
    let (read, mut write) = stream.into_split();

    let mut msg =
        serde_json::to_string(request).map_err(|e| TransportError::Malformed(e.to_string()))?;
    msg.push('\n');
    // Once connected, the request counts as accepted.
    write
        .write_all(msg.as_bytes())
        .await
        .map_err(|_| TransportError::NoReply)?;

    let mut reply = String::new();
    let n = BufReader::new(read)
        .read_line(&mut reply)
        .await
        .map_err(|_| TransportError::NoReply)?;
    if n == 0 {
        return Err(TransportError::NoReply);
    }
    let mut response: Response =
        serde_json::from_str(reply.trim()).map_err(|e| TransportError::Malformed(e.to_string()))?;
    match response.transport.take() {
        Some(relayed) => Err(relayed),
        None => Ok(response),
    }
}
