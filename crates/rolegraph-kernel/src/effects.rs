//! Effects produced by the kernel.
//!
//! Effects represent side effects that the runtime must execute after
//! a command is applied. The kernel is pure - it produces effects but
//! never executes them directly.

use rolegraph_types::{AuditAction, MembershipEdge, Role, RoleId, RoleName};
use serde::{Deserialize, Serialize};

use crate::state::{ClusterMetadata, DatabaseMetadata};

/// An effect to be executed by the runtime.
///
/// Effects are produced by [`super::kernel::apply_committed`] and describe
/// actions that must be performed outside the pure kernel (catalog writes,
/// audit logging, client notices).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    // ========================================================================
    // Role Store Effects
    // ========================================================================
    /// Persist a created or altered role record.
    RoleWrite(Role),

    /// Remove a role record after DROP ROLE.
    RoleDrop(RoleId),

    // ========================================================================
    // Membership Effects
    // ========================================================================
    /// Persist a new membership edge.
    MembershipWrite(MembershipEdge),

    /// Remove a membership edge (explicit revoke or drop cascade).
    MembershipDrop(MembershipEdge),

    // ========================================================================
    // Object Effects
    // ========================================================================
    DatabaseWrite(DatabaseMetadata),

    /// Persist cluster metadata, including a newly added replica.
    ClusterWrite(ClusterMetadata),

    /// Append an entry to the immutable audit log.
    AuditLogAppend(AuditAction),

    /// Send a notice to the client. Never an error.
    Notice(KernelNotice),
}

/// Client notices raised while applying membership changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelNotice {
    /// A GRANT named a member that already directly belongs to the role.
    AlreadyMember { role: RoleName, member: RoleName },
    /// A REVOKE named a member that does not directly belong to the role.
    NotMember { role: RoleName, member: RoleName },
}

impl std::fmt::Display for KernelNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KernelNotice::AlreadyMember { role, member } => {
                write!(f, "role \"{member}\" is already a member of role \"{role}\"")
            }
            KernelNotice::NotMember { role, member } => {
                write!(f, "role \"{member}\" is not a member of role \"{role}\"")
            }
        }
    }
}
