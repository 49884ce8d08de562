use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::capability::{Database, Renderer, Translator};

/// Collaborator roles a handler can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Database,
    Renderer,
    Translator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Database, Role::Renderer, Role::Translator];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Database => "database",
            Role::Renderer => "renderer",
            Role::Translator => "translator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("no {0} capability registered")]
    Unresolved(Role),
    #[error("{0} capability registered more than once")]
    Duplicate(Role),
}

/// Live capability instances, one slot per role.
///
/// Read-only once built; shared across connections behind an `Arc`.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    database: Option<Arc<dyn Database>>,
    renderer: Option<Arc<dyn Renderer>>,
    translator: Option<Arc<dyn Translator>>,
}

impl CapabilityRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn provides(&self, role: Role) -> bool {
        match role {
            Role::Database => self.database.is_some(),
            Role::Renderer => self.renderer.is_some(),
            Role::Translator => self.translator.is_some(),
        }
    }

    pub fn database(&self) -> Result<Arc<dyn Database>, CapabilityError> {
        self.database
            .clone()
            .ok_or(CapabilityError::Unresolved(Role::Database))
    }

    pub fn renderer(&self) -> Result<Arc<dyn Renderer>, CapabilityError> {
        self.renderer
            .clone()
            .ok_or(CapabilityError::Unresolved(Role::Renderer))
    }

    pub fn translator(&self) -> Result<Arc<dyn Translator>, CapabilityError> {
        self.translator
            .clone()
            .ok_or(CapabilityError::Unresolved(Role::Translator))
    }

    /// Check that every listed role can be resolved
    pub fn ensure(&self, roles: &[Role]) -> Result<(), CapabilityError> {
        match roles.iter().find(|role| !self.provides(**role)) {
            Some(missing) => Err(CapabilityError::Unresolved(*missing)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let provided: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|role| self.provides(*role))
            .collect();
        f.debug_struct("CapabilityRegistry")
            .field("provided", &provided)
            .finish()
    }
}

/// Collects capabilities; each role may be set once
#[derive(Default)]
pub struct RegistryBuilder {
    registry: CapabilityRegistry,
    duplicate: Option<Role>,
}

impl RegistryBuilder {
    pub fn database(mut self, database: impl Database + 'static) -> Self {
        self.set_database(Arc::new(database));
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.set_renderer(Arc::new(renderer));
        self
    }

    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.set_translator(Arc::new(translator));
        self
    }

    pub fn set_database(&mut self, database: Arc<dyn Database>) {
        if self.registry.database.replace(database).is_some() {
            self.duplicate.get_or_insert(Role::Database);
        }
    }

    pub fn set_renderer(&mut self, renderer: Arc<dyn Renderer>) {
        if self.registry.renderer.replace(renderer).is_some() {
            self.duplicate.get_or_insert(Role::Renderer);
        }
    }

    pub fn set_translator(&mut self, translator: Arc<dyn Translator>) {
        if self.registry.translator.replace(translator).is_some() {
            self.duplicate.get_or_insert(Role::Translator);
        }
    }

    pub fn build(self) -> Result<CapabilityRegistry, CapabilityError> {
        match self.duplicate {
            Some(role) => Err(CapabilityError::Duplicate(role)),
            None => Ok(self.registry),
        }
    }
}
