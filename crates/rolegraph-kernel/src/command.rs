//! Commands accepted by the kernel.
//!
//! Commands arrive already authorized and with every role name resolved to a
//! [`RoleId`]. The kernel still validates catalog-level preconditions
//! (existence, reserved identities, cycles, dependencies) before changing
//! anything.

use rolegraph_types::{AttributeDeltas, RoleAttributes, RoleId, RoleName};
use serde::{Deserialize, Serialize};

/// A committed catalog mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // ========================================================================
    // Role Store
    // ========================================================================
    /// CREATE ROLE. The ID is allocated by the kernel.
    CreateRole {
        name: RoleName,
        attributes: RoleAttributes,
    },

    /// ALTER ROLE with attribute deltas.
    AlterRole {
        role_id: RoleId,
        deltas: AttributeDeltas,
    },

    /// DROP ROLE for one or more roles. All or nothing.
    DropRoles { role_ids: Vec<RoleId> },

    // ========================================================================
    // Membership
    // ========================================================================
    /// GRANT role TO members.
    GrantRole {
        role_id: RoleId,
        member_ids: Vec<RoleId>,
        grantor_id: RoleId,
    },

    /// REVOKE role FROM members.
    RevokeRole {
        role_id: RoleId,
        member_ids: Vec<RoleId>,
    },

    // ========================================================================
    // Owned objects
    // ========================================================================
    CreateDatabase {
        name: String,
        owner_id: RoleId,
    },

    CreateCluster {
        name: String,
        owner_id: RoleId,
    },

    CreateClusterReplica {
        cluster: String,
        replica: String,
        owner_id: RoleId,
    },
}

impl Command {
    pub fn create_role(name: impl Into<RoleName>, attributes: RoleAttributes) -> Self {
        Self::CreateRole {
            name: name.into(),
            attributes,
        }
    }

    pub fn alter_role(role_id: RoleId, deltas: AttributeDeltas) -> Self {
        Self::AlterRole { role_id, deltas }
    }

    pub fn drop_roles(role_ids: impl IntoIterator<Item = RoleId>) -> Self {
        Self::DropRoles {
            role_ids: role_ids.into_iter().collect(),
        }
    }

    pub fn grant_role(
        role_id: RoleId,
        member_ids: impl IntoIterator<Item = RoleId>,
        grantor_id: RoleId,
    ) -> Self {
        Self::GrantRole {
            role_id,
            member_ids: member_ids.into_iter().collect(),
            grantor_id,
        }
    }

    pub fn revoke_role(role_id: RoleId, member_ids: impl IntoIterator<Item = RoleId>) -> Self {
        Self::RevokeRole {
            role_id,
            member_ids: member_ids.into_iter().collect(),
        }
    }

    pub fn create_database(name: impl Into<String>, owner_id: RoleId) -> Self {
        Self::CreateDatabase {
            name: name.into(),
            owner_id,
        }
    }

    pub fn create_cluster(name: impl Into<String>, owner_id: RoleId) -> Self {
        Self::CreateCluster {
            name: name.into(),
            owner_id,
        }
    }

    pub fn create_cluster_replica(
        cluster: impl Into<String>,
        replica: impl Into<String>,
        owner_id: RoleId,
    ) -> Self {
        Self::CreateClusterReplica {
            cluster: cluster.into(),
            replica: replica.into(),
            owner_id,
        }
    }
}
