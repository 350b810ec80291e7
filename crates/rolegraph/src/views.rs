//! Read-only catalog views.

use rolegraph_kernel::State;
use rolegraph_types::{Attribute, RoleId};
use serde::{Deserialize, Serialize};

/// One row of `mz_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRow {
    pub id: RoleId,
    pub name: String,
    pub inherit: bool,
    pub create_role: bool,
    pub create_db: bool,
    pub create_cluster: bool,
}

/// One row of `mz_role_members`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMemberRow {
    pub role_id: RoleId,
    pub member: RoleId,
    pub grantor: RoleId,
}

/// Returns one row per role, ordered by id.
pub fn mz_roles(state: &State) -> Vec<RoleRow> {
    state
        .roles()
        .map(|role| RoleRow {
            id: role.id,
            name: role.name.to_string(),
            inherit: role.attributes.inherit,
            create_role: role.attributes.has(Attribute::CreateRole),
            create_db: role.attributes.has(Attribute::CreateDb),
            create_cluster: role.attributes.has(Attribute::CreateCluster),
        })
        .collect()
}

/// Returns one row per membership edge, ordered by (role, member).
pub fn mz_role_members(state: &State) -> Vec<RoleMemberRow> {
    state
        .membership()
        .edges()
        .into_iter()
        .map(|edge| RoleMemberRow {
            role_id: edge.role_id,
            member: edge.member_id,
            grantor: edge.grantor_id,
        })
        .collect()
}
