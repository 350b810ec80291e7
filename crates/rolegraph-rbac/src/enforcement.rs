//! Authorization gate.
//!
//! Decides whether a principal may perform a privileged operation. Checks run
//! in a fixed order: the global RBAC switch, the superuser bypass, then the
//! principal's effective attributes.

use rolegraph_kernel::State;
use rolegraph_types::{Attribute, RoleId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::permissions::Operation;
use crate::resolver::effective_attributes;

/// Error type for policy enforcement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnforcementError {
    /// The principal lacks the attribute the operation requires.
    #[error("permission denied to {}", .0.operation.action())]
    PermissionDenied(DenyReason),
}

impl EnforcementError {
    /// Returns the second line of the error ("You must have ...").
    pub fn detail(&self) -> String {
        match self {
            EnforcementError::PermissionDenied(reason) => reason.detail(),
        }
    }
}

/// Result type for enforcement operations.
pub type Result<T> = std::result::Result<T, EnforcementError>;

/// The acting identity for a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub role_id: RoleId,
    /// Superuser status granted by the session, in addition to any stored on
    /// the role itself.
    pub is_superuser: bool,
}

impl Principal {
    pub fn new(role_id: RoleId) -> Self {
        Self {
            role_id,
            is_superuser: false,
        }
    }

    pub fn superuser(role_id: RoleId) -> Self {
        Self {
            role_id,
            is_superuser: true,
        }
    }
}

/// Why an operation was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllowReason {
    RbacDisabled,
    Superuser,
    Attribute(Attribute),
}

/// Why an operation was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyReason {
    pub operation: Operation,
    pub missing_attribute: Attribute,
}

impl DenyReason {
    /// "permission denied to <action>"
    pub fn summary(&self) -> String {
        format!("permission denied to {}", self.operation.action())
    }

    /// "You must have the <ATTR> attribute to <action>"
    pub fn detail(&self) -> String {
        format!(
            "You must have the {} attribute to {}",
            self.missing_attribute.as_str(),
            self.operation.action()
        )
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allow(AllowReason),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Authorization gate.
///
/// Invoked before each privileged operation. The gate holds no catalog
/// state; callers pass a read-consistent snapshot so one statement sees one
/// version of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationGate {
    /// Value of `enable_rbac_checks` for this statement.
    rbac_enabled: bool,

    /// Whether to log decisions.
    audit_enabled: bool,
}

impl AuthorizationGate {
    /// Creates a gate with the given RBAC switch and decision logging on.
    pub fn new(rbac_enabled: bool) -> Self {
        Self {
            rbac_enabled,
            audit_enabled: true,
        }
    }

    /// Disables decision logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn rbac_enabled(&self) -> bool {
        self.rbac_enabled
    }

    /// Decides whether `principal` may perform `operation`.
    ///
    /// **Audit:** Logs every decision.
    pub fn check(&self, state: &State, principal: &Principal, operation: Operation) -> Decision {
        let required = operation.required_attribute();

        let decision = if !self.rbac_enabled {
            Decision::Allow(AllowReason::RbacDisabled)
        } else if principal.is_superuser
            || state
                .get_role(&principal.role_id)
                .is_some_and(|role| role.is_superuser)
        {
            Decision::Allow(AllowReason::Superuser)
        } else if effective_attributes(state, principal.role_id).contains(required) {
            Decision::Allow(AllowReason::Attribute(required))
        } else {
            Decision::Deny(DenyReason {
                operation,
                missing_attribute: required,
            })
        };

        if self.audit_enabled {
            match decision {
                Decision::Allow(reason) => info!(
                    principal = %principal.role_id,
                    operation = %operation,
                    attribute = %required,
                    reason = ?reason,
                    "Operation allowed"
                ),
                Decision::Deny(_) => warn!(
                    principal = %principal.role_id,
                    operation = %operation,
                    attribute = %required,
                    "Operation denied"
                ),
            }
        }

        decision
    }

    /// Enforces `operation` for `principal`.
    ///
    /// Returns the allow reason, or [`EnforcementError::PermissionDenied`].
    pub fn enforce(
        &self,
        state: &State,
        principal: &Principal,
        operation: Operation,
    ) -> Result<AllowReason> {
        match self.check(state, principal, operation) {
            Decision::Allow(reason) => Ok(reason),
            Decision::Deny(reason) => Err(EnforcementError::PermissionDenied(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegraph_kernel::{Command, apply_committed_batch};
    use rolegraph_types::{MZ_SYSTEM_ROLE_ID, RoleAttributes};
    use test_case::test_case;

    /// joe (u1) has no attributes; admins (u2) has every attribute.
    fn state() -> State {
        let all = Attribute::ALL
            .iter()
            .fold(RoleAttributes::new(), |acc, a| acc.with_attribute(*a));
        let (state, _) = apply_committed_batch(
            State::new(),
            [
                Command::create_role("joe", RoleAttributes::new()),
                Command::create_role("admins", all),
            ],
        )
        .expect("create roles");
        state
    }

    fn joe() -> Principal {
        Principal::new(RoleId::User(1))
    }

    #[test_case(Operation::CreateRole, "create role", "CREATEROLE")]
    #[test_case(Operation::AlterRole, "alter role", "CREATEROLE")]
    #[test_case(Operation::DropRole, "drop role", "CREATEROLE")]
    #[test_case(Operation::CreateDatabase, "create database", "CREATEDB")]
    #[test_case(Operation::CreateCluster, "create cluster", "CREATECLUSTER")]
    fn deny_renders_two_lines(operation: Operation, action: &str, attribute: &str) {
        let gate = AuthorizationGate::new(true).without_audit();
        let err = gate.enforce(&state(), &joe(), operation).unwrap_err();

        assert_eq!(err.to_string(), format!("permission denied to {action}"));
        assert_eq!(
            err.detail(),
            format!("You must have the {attribute} attribute to {action}")
        );
    }

    #[test]
    fn every_operation_allowed_for_superuser() {
        let gate = AuthorizationGate::new(true).without_audit();
        let state = state();

        for operation in Operation::ALL {
            // Superuser by stored role.
            assert_eq!(
                gate.check(&state, &Principal::new(MZ_SYSTEM_ROLE_ID), operation),
                Decision::Allow(AllowReason::Superuser)
            );
            // Superuser by session flag, even with no attributes.
            assert_eq!(
                gate.check(&state, &Principal::superuser(RoleId::User(1)), operation),
                Decision::Allow(AllowReason::Superuser)
            );
        }
    }

    #[test]
    fn every_operation_allowed_when_rbac_disabled() {
        let gate = AuthorizationGate::new(false).without_audit();
        let state = state();

        for operation in Operation::ALL {
            assert_eq!(
                gate.check(&state, &joe(), operation),
                Decision::Allow(AllowReason::RbacDisabled)
            );
        }
    }

    #[test]
    fn inherited_attribute_allows() {
        let (state, _) = apply_committed_batch(
            state(),
            [Command::grant_role(
                RoleId::User(2),
                [RoleId::User(1)],
                MZ_SYSTEM_ROLE_ID,
            )],
        )
        .expect("grant");
        let gate = AuthorizationGate::new(true).without_audit();

        for operation in Operation::ALL {
            let decision = gate.check(&state, &joe(), operation);
            assert_eq!(
                decision,
                Decision::Allow(AllowReason::Attribute(operation.required_attribute()))
            );
            assert!(decision.is_allowed());
        }
    }

    #[test]
    fn deny_reason_names_operation_and_attribute() {
        let gate = AuthorizationGate::new(true).without_audit();
        let decision = gate.check(&state(), &joe(), Operation::CreateClusterReplica);

        assert_eq!(
            decision,
            Decision::Deny(DenyReason {
                operation: Operation::CreateClusterReplica,
                missing_attribute: Attribute::CreateCluster,
            })
        );
        assert!(!decision.is_allowed());
    }

    #[test]
    fn unknown_principal_is_denied() {
        let gate = AuthorizationGate::new(true).without_audit();
        let principal = Principal::new(RoleId::User(99));
        assert!(
            gate.enforce(&state(), &principal, Operation::CreateRole)
                .is_err()
        );
    }
}
