//! `lambda_http` bridge.

use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::response::Response;
use lambda_http::{service_fn, Body as LambdaBody, Error as LambdaError, Request as LambdaRequest};

use crate::serverless::adapter::ServerlessAdapter;

/// Serve platform invocations until the runtime stops.
pub async fn run(adapter: ServerlessAdapter) -> Result<(), LambdaError> {
    let adapter = Arc::new(adapter);
    lambda_http::run(service_fn(move |event: LambdaRequest| {
        let adapter = Arc::clone(&adapter);
        async move { handle_event(&adapter, event).await }
    }))
    .await
}

/// One invocation: convert in, dispatch, convert out.
pub async fn handle_event(
    adapter: &ServerlessAdapter,
    event: LambdaRequest,
) -> Result<lambda_http::Response<LambdaBody>, LambdaError> {
    let response = adapter.handle(into_axum_request(event)).await;
    into_lambda_response(response).await
}

fn into_axum_request(event: LambdaRequest) -> axum::extract::Request {
    let (parts, body) = event.into_parts();
    let bytes = match body {
        LambdaBody::Empty => Bytes::new(),
        LambdaBody::Text(text) => Bytes::from(text),
        LambdaBody::Binary(data) => Bytes::from(data),
    };
    axum::extract::Request::from_parts(parts, Body::from(bytes))
}

async fn into_lambda_response(response: Response) -> Result<lambda_http::Response<LambdaBody>, LambdaError> {
    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX).await?;

    let body = if bytes.is_empty() {
        LambdaBody::Empty
    } else {
        match String::from_utf8(bytes.to_vec()) {
            Ok(text) => LambdaBody::Text(text),
            Err(e) => LambdaBody::Binary(e.into_bytes()),
        }
    };
    Ok(lambda_http::Response::from_parts(parts, body))
}
