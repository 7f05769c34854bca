//! HTTP/1 accept loop.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::routes::{handle_request, AppState};

/// Bind `listen_addr` and serve requests until the task is dropped.
pub async fn run(listen_addr: &str, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {:?}", listen_addr))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, "listening");
    serve(listener, state).await
}

/// Serve requests on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let state = state.clone();
                async move { Ok::<_, Infallible>(handle_request(req.method(), req.uri(), &state).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!(%peer, error = %e, "connection error");
            }
        });
    }
}
