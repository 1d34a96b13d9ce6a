//! # Service Directory
//!
//! Deployment-time wiring between the custody surface and the services it
//! depends on. Each backing service is registered under a well-known
//! [`ServiceId`]; consumers resolve their handles once at construction and
//! hold the typed clients from then on. The directory is not consulted on
//! the hot path — a withdrawal never pays for a registry lookup.
//!
//! Re-registering an id replaces the previous binding, which is how a
//! deployment swaps a backing service without rebuilding its consumers.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use keel_ledger::ledger::AssetLedger;

use crate::access::AccessController;

// ---------------------------------------------------------------------------
// Service identifiers
// ---------------------------------------------------------------------------

/// Well-known identifier for a backing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(pub u16);

/// The asset ledger every balance and transfer goes through.
pub const ASSET_LEDGER_SERVICE: ServiceId = ServiceId(1);

/// The role store gating privileged custody operations.
pub const ACCESS_CONTROL_SERVICE: ServiceId = ServiceId(2);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ASSET_LEDGER_SERVICE => write!(f, "asset-ledger"),
            ACCESS_CONTROL_SERVICE => write!(f, "access-control"),
            ServiceId(other) => write!(f, "service-{}", other),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised when resolving services from the directory.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No service has been registered under the requested id.
    #[error("no service registered under {id}")]
    NotRegistered {
        /// The id that was looked up.
        id: ServiceId,
    },

    /// The registered handle is not of the kind the caller expected.
    #[error("service {id} is an {found} handle, expected {expected}")]
    WrongKind {
        /// The id that was looked up.
        id: ServiceId,
        /// The kind the caller asked for.
        expected: &'static str,
        /// The kind actually registered.
        found: &'static str,
    },
}

// ---------------------------------------------------------------------------
// ServiceHandle
// ---------------------------------------------------------------------------

/// A shared handle to one of the backing services.
#[derive(Debug, Clone)]
pub enum ServiceHandle {
    /// Handle to the asset ledger.
    Ledger(Arc<AssetLedger>),

    /// Handle to the access controller.
    AccessControl(Arc<AccessController>),
}

impl ServiceHandle {
    fn kind(&self) -> &'static str {
        match self {
            ServiceHandle::Ledger(_) => "asset-ledger",
            ServiceHandle::AccessControl(_) => "access-control",
        }
    }
}

// ---------------------------------------------------------------------------
// ServiceDirectory
// ---------------------------------------------------------------------------

/// Registry mapping service ids to live handles.
pub struct ServiceDirectory {
    services: DashMap<ServiceId, ServiceHandle>,
}

impl fmt::Debug for ServiceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDirectory")
            .field("services", &self.services.len())
            .finish()
    }
}

impl ServiceDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Registers `handle` under `id`, replacing any previous binding.
    pub fn register(&self, id: ServiceId, handle: ServiceHandle) {
        let kind = handle.kind();
        let replaced = self.services.insert(id, handle).is_some();
        info!(service = %id, kind = kind, replaced = replaced, "service registered");
    }

    /// Returns the raw handle registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRegistered`] if nothing is bound to `id`.
    pub fn lookup(&self, id: ServiceId) -> Result<ServiceHandle, ServiceError> {
        self.services
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ServiceError::NotRegistered { id })
    }

    /// Resolves the asset ledger handle.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRegistered`] if no ledger is bound, or
    /// [`ServiceError::WrongKind`] if the binding is not a ledger.
    pub fn ledger(&self) -> Result<Arc<AssetLedger>, ServiceError> {
        match self.lookup(ASSET_LEDGER_SERVICE)? {
            ServiceHandle::Ledger(ledger) => Ok(ledger),
            other => Err(ServiceError::WrongKind {
                id: ASSET_LEDGER_SERVICE,
                expected: "asset-ledger",
                found: other.kind(),
            }),
        }
    }

    /// Resolves the access controller handle.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRegistered`] if no controller is bound,
    /// or [`ServiceError::WrongKind`] if the binding is not a controller.
    pub fn access_control(&self) -> Result<Arc<AccessController>, ServiceError> {
        match self.lookup(ACCESS_CONTROL_SERVICE)? {
            ServiceHandle::AccessControl(controller) => Ok(controller),
            other => Err(ServiceError::WrongKind {
                id: ACCESS_CONTROL_SERVICE,
                expected: "access-control",
                found: other.kind(),
            }),
        }
    }

    /// Returns `true` if something is registered under `id`.
    pub fn contains(&self, id: ServiceId) -> bool {
        self.services.contains_key(&id)
    }
}

impl Default for ServiceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
