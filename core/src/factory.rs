//! Instance lifecycle manager for registry deployments.
//!
//! The factory owns an ordered list of registry instances and designates at
//! most one as "active". The active pointer is explicit process-wide state:
//! `None` until single-contract mode is enabled, never silently replaced
//! afterwards. Convenience operations resolve the active instance and forward
//! to it; everything else goes through an instance handle directly.

use crate::environment::RegistryEnvironment;
use crate::error::{RegistryError, Result};
use crate::registry::InviteRegistry;
use crate::types::{EventId, Identity, RegistryConfig};
use chrono::{DateTime, Utc};
use std::fmt;

/// Handle to a deployed registry instance, ordered by deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(usize);

impl InstanceId {
    /// Position of the instance in deployment order
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// Deploys registry instances and tracks which one is authoritative.
pub struct RegistryFactory {
    /// Environment cloned into every deployed instance
    env: RegistryEnvironment,
    /// Configuration applied to every deployed instance
    config: RegistryConfig,
    instances: Vec<InviteRegistry>,
    single_contract_mode: bool,
    active: Option<InstanceId>,
}

impl RegistryFactory {
    /// Creates a factory with no deployed instances
    #[must_use]
    pub fn new(env: RegistryEnvironment) -> Self {
        Self::with_config(env, RegistryConfig::default())
    }

    /// Creates a factory whose deployments use an explicit configuration
    #[must_use]
    pub const fn with_config(env: RegistryEnvironment, config: RegistryConfig) -> Self {
        Self {
            env,
            config,
            instances: Vec::new(),
            single_contract_mode: false,
            active: None,
        }
    }

    /// Deploys a new, empty registry instance. Never changes the active
    /// pointer; always succeeds.
    pub fn deploy_new_contract(&mut self) -> InstanceId {
        let id = InstanceId(self.instances.len());
        self.instances
            .push(InviteRegistry::with_config(self.env.clone(), self.config));
        tracing::info!(instance = %id, "registry instance deployed");
        id
    }

    /// Enables single-contract mode, deploying and activating one instance
    /// on first call. Idempotent: later calls return the same instance and
    /// never replace an active instance that already has data.
    pub fn enable_single_contract_mode(&mut self) -> InstanceId {
        if let Some(active) = self.active {
            return active;
        }
        let id = self.deploy_new_contract();
        self.active = Some(id);
        self.single_contract_mode = true;
        tracing::info!(instance = %id, "single-contract mode enabled");
        id
    }

    /// The active instance handle, or `None` if single-contract mode has
    /// never been enabled.
    #[must_use]
    pub const fn active_contract(&self) -> Option<InstanceId> {
        self.active
    }

    /// Whether single-contract mode has been enabled
    #[must_use]
    pub const fn single_contract_mode(&self) -> bool {
        self.single_contract_mode
    }

    /// Number of deployed instances
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Borrows a deployed instance
    #[must_use]
    pub fn instance(&self, id: InstanceId) -> Option<&InviteRegistry> {
        self.instances.get(id.0)
    }

    /// Mutably borrows a deployed instance
    #[must_use]
    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut InviteRegistry> {
        self.instances.get_mut(id.0)
    }

    // ========================================================================
    // Convenience forwarding to the active instance
    // ========================================================================

    /// Creates an event on the active instance.
    ///
    /// # Errors
    ///
    /// `NoActiveInstance` before single-contract mode is enabled, plus
    /// whatever [`InviteRegistry::create_event`] rejects.
    pub fn create_event_single(
        &mut self,
        caller: &Identity,
        name: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
        max_capacity: u32,
        is_private: bool,
    ) -> Result<EventId> {
        self.active_mut()?
            .create_event(caller, name, date, location, max_capacity, is_private)
    }

    /// Number of events created on the active instance.
    ///
    /// # Errors
    ///
    /// `NoActiveInstance` before single-contract mode is enabled.
    pub fn event_count(&self) -> Result<u64> {
        self.active_ref().map(InviteRegistry::event_count)
    }

    /// Event ids created by `host` on the active instance, in creation
    /// order; empty for an unknown host.
    ///
    /// # Errors
    ///
    /// `NoActiveInstance` before single-contract mode is enabled.
    pub fn host_events(&self, host: &Identity) -> Result<&[EventId]> {
        self.active_ref().map(|registry| registry.host_events(host))
    }

    fn active_ref(&self) -> Result<&InviteRegistry> {
        self.active
            .and_then(|id| self.instances.get(id.0))
            .ok_or(RegistryError::NoActiveInstance)
    }

    fn active_mut(&mut self) -> Result<&mut InviteRegistry> {
        let id = self.active.ok_or(RegistryError::NoActiveInstance)?;
        self.instances
            .get_mut(id.0)
            .ok_or(RegistryError::NoActiveInstance)
    }
}

impl fmt::Debug for RegistryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryFactory")
            .field("instances", &self.instances.len())
            .field("single_contract_mode", &self.single_contract_mode)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
