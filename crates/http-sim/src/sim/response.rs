//! Builds outgoing HTTP responses from declarative response specs.

use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use tokio::io::AsyncReadExt;
use tracing::{error, warn};

use crate::rules::{ContentValueType, ResponseEncoding, SimResponse};

const BUILD_ERROR_BODY: &str = "Simulator Error - Error setting a response";

/// Materialize `spec` into a response. Any failure (bad status code,
/// unparsable header, unreadable body) is reported and replaced with a
/// plain 500 so the client always gets an answer.
pub async fn build_response(spec: &SimResponse, response_files_root: &Path) -> Response<Full<Bytes>> {
    match try_build(spec, response_files_root).await {
        Ok(response) => response,
        Err(error) => {
            error!("Error setting a response: {error:#}");
            let mut response = Response::new(Full::new(Bytes::from(BUILD_ERROR_BODY)));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

async fn try_build(
    spec: &SimResponse,
    response_files_root: &Path,
) -> Result<Response<Full<Bytes>>, anyhow::Error> {
    let status = StatusCode::from_u16(spec.status_code)
        .with_context(|| format!("invalid status code {}", spec.status_code))?;

    let body = load_body(spec, response_files_root).await?;
    let body = encode_body(body, spec.encoding).await?;

    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;

    if let Some(content_type) = &spec.content_type {
        let value = HeaderValue::from_str(content_type)
            .with_context(|| format!("invalid content type '{content_type}'"))?;
        response.headers_mut().insert(CONTENT_TYPE, value);
    }

    // Configured headers overwrite anything set above, including the
    // content type. Multi-valued keys are appended in declaration order.
    if let Some(headers) = &spec.headers {
        for header in headers {
            let name: HeaderName = header
                .key
                .parse()
                .with_context(|| format!("invalid header name '{}'", header.key))?;
            response.headers_mut().remove(&name);
            for value in &header.value {
                let value = HeaderValue::from_str(value)
                    .with_context(|| format!("invalid value for header '{}'", header.key))?;
                response.headers_mut().append(name.clone(), value);
            }
        }
    }

    Ok(response)
}

async fn load_body(spec: &SimResponse, response_files_root: &Path) -> Result<Vec<u8>, anyhow::Error> {
    let Some(content_value) = &spec.content_value else {
        return Ok(Vec::new());
    };
    match spec.content_value_type {
        ContentValueType::Text => Ok(content_value.clone().into_bytes()),
        ContentValueType::File => {
            let path = response_files_root.join(content_value);
            match tokio::fs::read(&path).await {
                Ok(bytes) => Ok(bytes),
                // Served as an empty body rather than failing the response.
                Err(error) => {
                    warn!("Response file '{}' could not be read: {error}", path.display());
                    Ok(Vec::new())
                }
            }
        }
    }
}

async fn encode_body(body: Vec<u8>, encoding: ResponseEncoding) -> Result<Vec<u8>, anyhow::Error> {
    match encoding {
        ResponseEncoding::None => Ok(body),
        ResponseEncoding::GZip => {
            let mut encoder =
                async_compression::tokio::bufread::GzipEncoder::new(body.as_slice());
            let mut compressed = Vec::new();
            encoder
                .read_to_end(&mut compressed)
                .await
                .context("gzip encoding failed")?;
            Ok(compressed)
        }
    }
}
