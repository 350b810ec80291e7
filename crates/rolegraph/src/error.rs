//! Error types for the role catalog.

use rolegraph_config::ConfigError;
use rolegraph_kernel::KernelError;
use rolegraph_rbac::EnforcementError;
use rolegraph_types::RESERVED_ROLE_PREFIXES;
use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, RolegraphError>;

/// Errors surfaced to the statement executor.
///
/// Every error renders as a one-line summary (`Display`) with an optional
/// second line from [`RolegraphError::detail`] and a suggestion from
/// [`RolegraphError::hint`].
#[derive(Debug, Error)]
pub enum RolegraphError {
    /// Catalog invariant violated by the command.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    /// The principal lacks a required attribute.
    #[error(transparent)]
    PermissionDenied(#[from] EnforcementError),

    /// A statement named a role that does not exist.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("current role cannot be dropped")]
    CurrentRoleCannotBeDropped,

    /// The action is restricted to superusers.
    #[error("permission denied to {action}")]
    SuperuserRequired { action: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal error (lock poisoning and similar).
    #[error("internal error: {0}")]
    Internal(String),
}

impl RolegraphError {
    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The first line of the error.
    pub fn summary(&self) -> String {
        self.to_string()
    }

    /// The second line of the error, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            RolegraphError::PermissionDenied(err) => Some(err.detail()),
            RolegraphError::Kernel(KernelError::ReservedRoleName(name))
                if RESERVED_ROLE_PREFIXES
                    .iter()
                    .any(|prefix| name.as_str().starts_with(prefix)) =>
            {
                Some(
                    "The prefixes \"mz_\" and \"pg_\" are reserved for system roles."
                        .to_string(),
                )
            }
            RolegraphError::SuperuserRequired { action } => {
                Some(format!("You must be a superuser to {action}"))
            }
            _ => None,
        }
    }

    /// A suggestion for fixing the error, if any.
    pub fn hint(&self) -> Option<String> {
        match self {
            RolegraphError::Kernel(KernelError::DependentObjects(_)) => {
                Some("Drop the objects owned by the role first.".to_string())
            }
            RolegraphError::Kernel(KernelError::DependentMembership { .. }) => {
                Some("Revoke the memberships granted by the role first.".to_string())
            }
            _ => None,
        }
    }
}
