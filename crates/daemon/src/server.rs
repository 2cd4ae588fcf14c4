// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and request dispatch

use std::sync::Arc;
use std::time::Instant;

use ordo_adapters::{Cache, Publisher};
use ordo_engine::{Batcher, Orchestrator, ServiceError};
use ordo_storage::{EventSink, RankStore};
use tokio::net::UnixStream;
use tokio::sync::Notify;
use tracing::{debug, error, warn};

use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Everything a connection handler needs; cheap to clone per connection
pub struct Server<S, C, P, K> {
    orchestrator: Orchestrator<S, C, P>,
    batcher: Arc<Batcher<K>>,
    cache_backend: String,
    start_time: Instant,
    shutdown: Arc<Notify>,
}

impl<S: Clone, C: Clone, P: Clone, K> Clone for Server<S, C, P, K> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            batcher: Arc::clone(&self.batcher),
            cache_backend: self.cache_backend.clone(),
            start_time: self.start_time,
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S, C, P, K> Server<S, C, P, K>
where
    S: RankStore,
    C: Cache,
    P: Publisher,
    K: EventSink,
{
    pub fn new(
        orchestrator: Orchestrator<S, C, P>,
        batcher: Arc<Batcher<K>>,
        cache_backend: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            batcher,
            cache_backend: cache_backend.into(),
            start_time: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Resolves once a client has asked the daemon to stop
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }

    /// Handle a single client connection
    pub async fn handle_connection(&self, stream: UnixStream) -> Result<(), ServerError> {
        let (mut reader, mut writer) = stream.into_split();

        let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
            Ok(req) => req,
            Err(protocol::ProtocolError::Timeout) => {
                error!("request read timeout");
                return Err(ServerError::Timeout);
            }
            Err(protocol::ProtocolError::ConnectionClosed) => {
                debug!("client disconnected before sending request");
                return Ok(());
            }
            Err(protocol::ProtocolError::Json(e)) => {
                warn!(error = %e, "malformed request");
                let response = Response::Error {
                    error: ordo_core::ApiError::bad_request(e),
                };
                protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "failed to read request");
                return Err(ServerError::Protocol(e));
            }
        };

        debug!(?request, "received request");
        let response = self.handle_request(request).await;
        debug!(?response, "sending response");

        protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
        Ok(())
    }

    /// Handle a single request and return a response
    pub async fn handle_request(&self, request: Request) -> Response {
        let orchestrator = &self.orchestrator;
        match request {
            Request::Ping => Response::Pong,

            Request::Hello { version: _ } => Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            },

            Request::Create { project_id, item } => {
                respond(orchestrator.create(project_id, item).await, |item| {
                    Response::Item { item }
                })
            }

            Request::Get { project_id, id } => {
                respond(orchestrator.get(project_id, id).await, |item| {
                    Response::Item { item }
                })
            }

            Request::Update {
                project_id,
                id,
                item,
            } => respond(orchestrator.update(project_id, id, item).await, |item| {
                Response::Item { item }
            }),

            Request::Remove { project_id, id } => {
                respond(orchestrator.remove(project_id, id).await, |item| {
                    Response::Item { item }
                })
            }

            Request::List { page } => respond(orchestrator.list(page).await, |page| {
                Response::Page { page }
            }),

            Request::Reorder {
                project_id,
                id,
                new_rank,
            } => respond(
                orchestrator.reorder(project_id, id, new_rank).await,
                |deltas| Response::Deltas { deltas },
            ),

            Request::Status => Response::Status {
                uptime_secs: self.start_time.elapsed().as_secs(),
                cache: self.cache_backend.clone(),
                ingest: self.batcher.stats(),
            },

            Request::Shutdown => {
                self.shutdown.notify_one();
                Response::ShuttingDown
            }
        }
    }
}

fn respond<T>(result: Result<T, ServiceError>, ok: impl FnOnce(T) -> Response) -> Response {
    match result {
        Ok(value) => ok(value),
        Err(e) => {
            match e.kind().status() {
                ordo_core::StatusClass::ServerError => error!(error = %e, "request failed"),
                _ => debug!(error = %e, "request rejected"),
            }
            Response::Error { error: e.to_api() }
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
