use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::api::handler::{Endpoint, Handler};
use crate::api::handlers;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {method} {path} registered more than once")]
    Duplicate { method: Method, path: String },
}

/// Static mapping from (method, exact path) to a handler
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: HashMap<(Method, String), Arc<dyn Endpoint>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<(), RouteError> {
        let key = (method, path.to_string());
        if self.routes.contains_key(&key) {
            let (method, path) = key;
            return Err(RouteError::Duplicate { method, path });
        }
        self.routes.insert(key, Arc::new(handler));
        Ok(())
    }

    /// Chaining form of [`RouteTable::register`]
    pub fn route(mut self, method: Method, path: &str, handler: impl Handler) -> Result<Self, RouteError> {
        self.register(method, path, handler)?;
        Ok(self)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<Arc<dyn Endpoint>> {
        self.routes.get(&(method.clone(), path.to_string())).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Method, &str, &Arc<dyn Endpoint>)> {
        self.routes
            .iter()
            .map(|((method, path), endpoint)| (method, path.as_str(), endpoint))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// The service's routes: the root page and the prompt pipeline
pub fn create_route_table() -> Result<RouteTable, RouteError> {
    RouteTable::new()
        .route(Method::GET, "/", handlers::GetRoot)?
        .route(Method::POST, "/generate", handlers::PostGenerate)
}
