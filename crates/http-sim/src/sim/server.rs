//! HTTP front door.
//!
//! One accept loop serves both the simulated endpoint and, when attached,
//! the control API; a second instance with no simulated endpoint serves a
//! dedicated control listener. The request body is collected up front so
//! condition evaluation, history retention, and logging all see the same
//! owned message.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

use crate::control::{route_control_request, ControlState};
use crate::logging::RequestResponseLogger;
use crate::rules::Header;
use crate::sim::handler::{handle_sim_request, SimState};
use crate::sim::request::SimRequest;
use crate::CONTROL_ENDPOINT;

/// Everything a listener needs to answer requests.
pub struct ServerContext {
    /// Simulated endpoint; absent on a dedicated control listener.
    pub sim: Option<SimState>,
    /// Control API; absent when the control API runs on its own listener.
    pub control: Option<ControlState>,
    pub sim_logger: Option<Arc<RequestResponseLogger>>,
    pub control_logger: Option<Arc<RequestResponseLogger>>,
}

/// A bound HTTP listener.
pub struct SimServer {
    listener: TcpListener,
    context: Arc<ServerContext>,
}

impl SimServer {
    pub async fn bind(addr: SocketAddr, context: ServerContext) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            context: Arc::new(context),
        })
    }

    /// The address actually bound, resolving port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.listener.local_addr()?;
        match (&self.context.sim, &self.context.control) {
            (Some(_), Some(_)) => {
                info!("Simulated endpoint and control API listening on http://{addr}")
            }
            (Some(_), None) => info!("Simulated endpoint listening on http://{addr}"),
            _ => info!("Control API listening on http://{addr}"),
        }

        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let context = Arc::clone(&self.context);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let context = Arc::clone(&context);
                    async move { serve_exchange(context, req).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection error: {}", e);
                }
            });
        }
    }
}

async fn serve_exchange(
    context: Arc<ServerContext>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let path = parts.uri.path().to_string();
    let query = parts.uri.query().map(str::to_string);
    let content_value = if body.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&body).into_owned())
    };
    let request = SimRequest::from_parts(
        parts.method.to_string(),
        path.clone(),
        query,
        map_headers(&parts.headers),
        content_value,
    );

    // Control-namespace paths never resolve against the rule store, even
    // when the control API lives on a separate listener.
    let is_control_path = context.sim.is_none() || path.starts_with(CONTROL_ENDPOINT);
    let logger = if is_control_path {
        context.control_logger.as_ref()
    } else {
        context.sim_logger.as_ref()
    };
    let id = Uuid::new_v4().to_string();

    if let Some(logger) = logger {
        logger.log_request(&request, &id);
    }

    let response = match (&context.control, &context.sim) {
        (Some(control), _) if is_control_path => {
            route_control_request(control, &parts.method, &path, &body)
        }
        (_, Some(sim)) if !is_control_path => handle_sim_request(sim, &request).await,
        _ => {
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
            response
        }
    };

    if let Some(logger) = logger {
        let body = response.body().clone().collect().await;
        let body = body.map(|collected| collected.to_bytes()).unwrap_or_default();
        logger.log_response(response.status().as_u16(), response.headers(), &body, &id);
    }

    Ok(response)
}

fn map_headers(headers: &HeaderMap) -> Vec<Header> {
    headers
        .keys()
        .map(|name| Header {
            key: name.to_string(),
            value: headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect(),
        })
        .collect()
}
