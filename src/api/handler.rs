use std::sync::Arc;

use crate::api::context::HttpContext;
use crate::capability::{CapabilityError, CapabilityRegistry, Database, Renderer, Role, Translator};

/// A single capability a handler can take as an argument
pub trait Capability: Sized + Send + 'static {
    const ROLE: Role;

    fn from_registry(registry: &CapabilityRegistry) -> Result<Self, CapabilityError>;
}

impl Capability for Arc<dyn Database> {
    const ROLE: Role = Role::Database;

    fn from_registry(registry: &CapabilityRegistry) -> Result<Self, CapabilityError> {
        registry.database()
    }
}

impl Capability for Arc<dyn Renderer> {
    const ROLE: Role = Role::Renderer;

    fn from_registry(registry: &CapabilityRegistry) -> Result<Self, CapabilityError> {
        registry.renderer()
    }
}

impl Capability for Arc<dyn Translator> {
    const ROLE: Role = Role::Translator;

    fn from_registry(registry: &CapabilityRegistry) -> Result<Self, CapabilityError> {
        registry.translator()
    }
}

/// The ordered set of capabilities a handler declares, as a tuple
pub trait Needs: Sized + Send + 'static {
    fn roles() -> Vec<Role>;

    fn resolve(registry: &CapabilityRegistry) -> Result<Self, CapabilityError>;
}

impl Needs for () {
    fn roles() -> Vec<Role> {
        Vec::new()
    }

    fn resolve(_registry: &CapabilityRegistry) -> Result<Self, CapabilityError> {
        Ok(())
    }
}

macro_rules! impl_needs {
    ($($cap:ident),+) => {
        impl<$($cap: Capability),+> Needs for ($($cap,)+) {
            fn roles() -> Vec<Role> {
                vec![$($cap::ROLE),+]
            }

            fn resolve(registry: &CapabilityRegistry) -> Result<Self, CapabilityError> {
                Ok(($($cap::from_registry(registry)?,)+))
            }
        }
    };
}

impl_needs!(A);
impl_needs!(A, B);
impl_needs!(A, B, C);

/// A route handler. It sets status and headers on the context and returns
/// the response body, if any.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    type Needs: Needs;

    async fn handle(&self, ctx: &mut HttpContext, needs: Self::Needs) -> Option<String>;
}

/// Object-safe form of [`Handler`] stored in the route table
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync {
    fn roles(&self) -> Vec<Role>;

    async fn call(
        &self,
        ctx: &mut HttpContext,
        registry: &CapabilityRegistry,
    ) -> Result<Option<String>, CapabilityError>;
}

#[async_trait::async_trait]
impl<H: Handler> Endpoint for H {
    fn roles(&self) -> Vec<Role> {
        <H::Needs as Needs>::roles()
    }

    async fn call(
        &self,
        ctx: &mut HttpContext,
        registry: &CapabilityRegistry,
    ) -> Result<Option<String>, CapabilityError> {
        let needs = <H::Needs as Needs>::resolve(registry)?;
        Ok(self.handle(ctx, needs).await)
    }
}
