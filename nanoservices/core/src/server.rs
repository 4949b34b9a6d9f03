use std::convert::Infallible;
use std::net::TcpListener;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::engine::{QuasarSync, TriggerError};
use crate::events::trigger::Trigger;
use crate::metrics;

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    let mut resp = Response::new(Body::from(body.to_string()));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(hyper::header::CONTENT_TYPE, hyper::header::HeaderValue::from_static("application/json"));
    resp
}

/// Route one request. Public so tests can drive it without a socket.
pub async fn handle(engine: Arc<QuasarSync>, req: Request<Body>) -> Response<Body> {
    match (req.method(), req.uri().path()) {
        (&Method::POST, "/run") => {
            // Detached from the connection: a client hanging up drops this
            // future but not the run.
            let runner = engine.clone();
            let run = tokio::spawn(async move { runner.trigger(Trigger::Http).await });
            match run.await {
                Ok(Ok(report)) => {
                    let status = if report.success { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
                    match serde_json::to_value(&report) {
                        Ok(body) => json_response(status, &body),
                        Err(e) => json_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            &json!({ "success": false, "error": e.to_string() }),
                        ),
                    }
                }
                Ok(Err(TriggerError::AlreadyRunning)) => json_response(
                    StatusCode::CONFLICT,
                    &json!({ "error": TriggerError::AlreadyRunning.to_string() }),
                ),
                Ok(Err(e)) => json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({ "success": false, "error": e.to_string() }),
                ),
                Err(e) => {
                    tracing::error!(error = %e, "pipeline run task failed");
                    json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        &json!({ "success": false, "error": "pipeline run aborted" }),
                    )
                }
            }
        }
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            &json!({ "status": "ok", "syncing": engine.is_running() }),
        ),
        (&Method::GET, "/metrics") => {
            let mut resp = Response::new(Body::from(metrics::gather_text()));
            resp.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            resp
        }
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not found" })),
    }
}

/// Serve the trigger API on `listener` until `shutdown` resolves.
///
/// The listener is bound by the caller (port 0 in tests). Must be called from
/// within a tokio runtime. Runs started over HTTP are detached tasks, so the
/// returned handle completing does not mean the pipeline is idle; callers
/// that exit afterwards should await [`QuasarSync::wait_idle`].
///
/// ```no_run
/// # async fn demo(engine: std::sync::Arc<quasar_core::engine::QuasarSync>) {
/// use std::net::TcpListener;
/// use quasar_core::server;
///
/// let listener = TcpListener::bind("127.0.0.1:0").unwrap();
/// let shutdown = async { let _ = tokio::signal::ctrl_c().await; };
/// server::spawn_server(engine, listener, shutdown).await.unwrap();
/// # }
/// ```
pub fn spawn_server<F>(engine: Arc<QuasarSync>, listener: TcpListener, shutdown: F) -> JoinHandle<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = listener.set_nonblocking(true) {
            tracing::error!(error = ?e, "failed to set listener to non-blocking");
            return;
        }
        let tcp_listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(error = ?e, "failed to convert listener to tokio listener");
                return;
            }
        };
        if let Ok(addr) = tcp_listener.local_addr() {
            tracing::info!(%addr, "trigger server listening");
        }

        let mut shutdown_fut = Box::pin(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown_fut => {
                    tracing::info!("trigger server shutdown requested");
                    break;
                }
                accept = tcp_listener.accept() => {
                    match accept {
                        Ok((stream, _peer)) => {
                            let engine = engine.clone();
                            let svc = service_fn(move |req: Request<Body>| {
                                let engine = engine.clone();
                                async move { Ok::<_, Infallible>(handle(engine, req).await) }
                            });

                            tokio::spawn(async move {
                                if let Err(err) = hyper::server::conn::Http::new().serve_connection(stream, svc).await {
                                    tracing::error!(error = ?err, "connection serve error");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = ?e, "failed to accept connection");
                        }
                    }
                }
            }
        }

        tracing::info!("trigger server stopped");
    })
}
