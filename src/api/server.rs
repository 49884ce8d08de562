use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};

use crate::api::context::HttpContext;
use crate::api::dispatch::{DispatchResponse, Dispatcher};

/// Every request goes through the dispatcher; axum only owns the socket side
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new().fallback(serve_request).with_state(dispatcher)
}

async fn serve_request(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = HttpContext::new(method, uri.path(), headers, body);

    match dispatcher.dispatch(ctx).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            // Dispatcher::new validates bindings, so this means a broken registry
            log::error!("Capability resolution failed during dispatch: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(bytes) => Body::from(bytes),
            None => Body::empty(),
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
