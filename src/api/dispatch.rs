use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use log::{debug, info, warn};

use crate::api::context::HttpContext;
use crate::api::routes::RouteTable;
use crate::capability::{CapabilityError, CapabilityRegistry};

/// Status, headers and optional body produced for one request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl DispatchResponse {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }
}

/// Resolves a route, injects the capabilities its handler declares, and frames the reply
pub struct Dispatcher {
    routes: RouteTable,
    registry: CapabilityRegistry,
}

impl Dispatcher {
    /// Fails if any route needs a capability the registry does not provide
    pub fn new(routes: RouteTable, registry: CapabilityRegistry) -> Result<Self, CapabilityError> {
        if routes.is_empty() {
            warn!("Dispatcher has no routes; every request will be answered with 404");
        }
        for (method, path, endpoint) in routes.iter() {
            let roles = endpoint.roles();
            registry.ensure(&roles)?;
            debug!("Route {} {} bound to {:?}", method, path, roles);
        }

        Ok(Self { routes, registry })
    }

    pub async fn dispatch(&self, mut ctx: HttpContext) -> Result<DispatchResponse, CapabilityError> {
        let is_head = *ctx.method() == Method::HEAD;
        let lookup_method = if is_head { Method::GET } else { ctx.method().clone() };

        let Some(endpoint) = self.routes.lookup(&lookup_method, ctx.path()) else {
            info!(
                "[{}] {} {} -> {}",
                ctx.request_id(),
                ctx.method(),
                ctx.path(),
                StatusCode::NOT_FOUND
            );
            return Ok(DispatchResponse::not_found());
        };

        let content = endpoint.call(&mut ctx, &self.registry).await?;

        let request_id = ctx.request_id();
        let method = ctx.method().clone();
        let path = ctx.path().to_string();
        let (status, mut headers) = ctx.into_response_head();

        let body = content
            .filter(|content| !content.is_empty())
            .map(|content| Bytes::from(content.into_bytes()));
        if let Some(body) = &body {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        info!(
            "[{}] {} {} -> {} ({} bytes)",
            request_id,
            method,
            path,
            status,
            body.as_ref().map_or(0, |body| body.len())
        );

        Ok(DispatchResponse {
            status,
            headers,
            body: if is_head { None } else { body },
        })
    }
}
