//! The kernel - pure functional core of `rolegraph`.
//!
//! The kernel applies committed commands to produce new state and effects.
//! It is completely pure: no IO, no clocks, no locks. Authorization happens
//! before a command reaches the kernel; the kernel only enforces catalog
//! invariants.
//!
//! # Example
//!
//! ```ignore
//! let state = State::new();
//! let cmd = Command::create_role("joe", RoleAttributes::new());
//!
//! let (new_state, effects) = apply_committed(state, cmd)?;
//! // Runtime executes effects...
//! ```

use std::collections::{BTreeMap, BTreeSet};

use rolegraph_types::{AuditAction, MembershipEdge, RoleId, RoleName};

use crate::command::Command;
use crate::effects::{Effect, KernelNotice};
use crate::graph::{EdgeInsert, GraphError};
use crate::state::{ClusterMetadata, DatabaseMetadata, State};

/// Applies a committed command to the state, producing new state and effects.
///
/// Takes ownership of state and returns the new state. On error the input
/// state is consumed; callers that need the old state keep their own copy
/// (the catalog keeps the published snapshot).
#[allow(clippy::too_many_lines)]
pub fn apply_committed(state: State, cmd: Command) -> Result<(State, Vec<Effect>), KernelError> {
    let mut effects = Vec::new();

    match cmd {
        // ====================================================================
        // Role Store Commands
        // ====================================================================
        Command::CreateRole { name, attributes } => {
            // Precondition: name is usable for a user role
            if name.as_str().is_empty() {
                return Err(KernelError::EmptyRoleName);
            }
            if name.is_reserved() {
                return Err(KernelError::ReservedRoleName(name));
            }
            if state.role_name_exists(&name) {
                return Err(KernelError::RoleAlreadyExists(name));
            }

            let (new_state, role) = state.with_new_role(name, attributes);

            // Postcondition: the role is a fresh user role
            debug_assert!(role.id.is_user());
            debug_assert!(!role.is_superuser);
            debug_assert!(new_state.lookup(role.name.as_str()).is_some());

            effects.push(Effect::AuditLogAppend(AuditAction::RoleCreated {
                role_id: role.id,
                name: role.name.clone(),
                attributes: role.attributes,
            }));
            effects.push(Effect::RoleWrite(role));

            Ok((new_state, effects))
        }

        Command::AlterRole { role_id, deltas } => {
            let role = state
                .get_role(&role_id)
                .ok_or(KernelError::RoleNotFound(role_id))?;

            // Precondition: reserved roles are immutable
            if role_id.is_reserved() {
                return Err(KernelError::ReservedRoleName(role.name.clone()));
            }

            let before = role.attributes;
            let after = deltas.apply(before);

            let new_state = state.with_role_attributes(role_id, after);
            let role = new_state
                .get_role(&role_id)
                .ok_or(KernelError::RoleNotFound(role_id))?
                .clone();

            // Postcondition: the superuser flag is never altered
            debug_assert!(!role.is_superuser);

            effects.push(Effect::RoleWrite(role));
            effects.push(Effect::AuditLogAppend(AuditAction::RoleAltered {
                role_id,
                before,
                after,
            }));

            Ok((new_state, effects))
        }

        Command::DropRoles { role_ids } => {
            let targets: BTreeSet<RoleId> = role_ids.into_iter().collect();

            // Precondition: every target exists, is a user role, owns nothing
            for id in &targets {
                let name = role_name(&state, *id)?;
                if id.is_reserved() {
                    return Err(KernelError::ReservedRoleName(name));
                }
                if state.owns_objects(*id) {
                    return Err(KernelError::DependentObjects(name));
                }
            }

            // Precondition: no surviving edge was granted by a target
            for edge in state.membership().edges() {
                let removed_by_cascade =
                    targets.contains(&edge.role_id) || targets.contains(&edge.member_id);
                if !removed_by_cascade && targets.contains(&edge.grantor_id) {
                    return Err(KernelError::DependentMembership {
                        grantor: role_name(&state, edge.grantor_id)?,
                        role: role_name(&state, edge.role_id)?,
                        member: role_name(&state, edge.member_id)?,
                    });
                }
            }

            let mut new_state = state;
            for id in targets {
                let name = role_name(&new_state, id)?;
                let (next, removed_edges) = new_state.without_role(id);
                new_state = next;

                effects.extend(removed_edges.into_iter().map(Effect::MembershipDrop));
                effects.push(Effect::RoleDrop(id));
                effects.push(Effect::AuditLogAppend(AuditAction::RoleDropped {
                    role_id: id,
                    name,
                }));

                // Postcondition: no edge references the dropped role
                debug_assert!(new_state.membership().edges().iter().all(|e| {
                    e.role_id != id && e.member_id != id
                }));
            }

            Ok((new_state, effects))
        }

        // ====================================================================
        // Membership Commands
        // ====================================================================
        Command::GrantRole {
            role_id,
            member_ids,
            grantor_id,
        } => {
            let role = endpoint_name(&state, role_id)?;
            if !state.role_exists(&grantor_id) {
                return Err(KernelError::RoleNotFound(grantor_id));
            }
            let members = member_ids
                .into_iter()
                .map(|id| endpoint_name(&state, id).map(|name| (id, name)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut new_state = state;
            for (member_id, member) in members {
                let (next, outcome) = new_state
                    .with_membership(role_id, member_id, grantor_id)
                    .map_err(|e| graph_error(e, (role_id, &role), (member_id, &member)))?;
                new_state = next;

                match outcome {
                    EdgeInsert::Inserted => {
                        let edge = MembershipEdge {
                            role_id,
                            member_id,
                            grantor_id,
                        };
                        effects.push(Effect::MembershipWrite(edge));
                        effects.push(Effect::AuditLogAppend(AuditAction::MembershipGranted(
                            edge,
                        )));
                    }
                    EdgeInsert::AlreadyMember { .. } => {
                        effects.push(Effect::Notice(KernelNotice::AlreadyMember {
                            role: role.clone(),
                            member,
                        }));
                    }
                }

                // Postcondition: member is now a direct member
                debug_assert!(new_state.membership().is_direct_member(role_id, member_id));
            }

            Ok((new_state, effects))
        }

        Command::RevokeRole {
            role_id,
            member_ids,
        } => {
            let role = endpoint_name(&state, role_id)?;
            let members = member_ids
                .into_iter()
                .map(|id| endpoint_name(&state, id).map(|name| (id, name)))
                .collect::<Result<Vec<_>, _>>()?;

            let mut new_state = state;
            for (member_id, member) in members {
                let (next, removed) = new_state.without_membership(role_id, member_id);
                new_state = next;

                match removed {
                    Some(edge) => {
                        effects.push(Effect::MembershipDrop(edge));
                        effects.push(Effect::AuditLogAppend(AuditAction::MembershipRevoked {
                            role_id,
                            member_id,
                        }));
                    }
                    None => {
                        effects.push(Effect::Notice(KernelNotice::NotMember {
                            role: role.clone(),
                            member,
                        }));
                    }
                }

                // Postcondition: no direct edge remains
                debug_assert!(!new_state.membership().is_direct_member(role_id, member_id));
            }

            Ok((new_state, effects))
        }

        // ====================================================================
        // Object Commands
        // ====================================================================
        Command::CreateDatabase { name, owner_id } => {
            if state.get_database(&name).is_some() {
                return Err(KernelError::DatabaseAlreadyExists(name));
            }
            if !state.role_exists(&owner_id) {
                return Err(KernelError::RoleNotFound(owner_id));
            }

            let meta = DatabaseMetadata { name, owner_id };
            effects.push(Effect::DatabaseWrite(meta.clone()));
            effects.push(Effect::AuditLogAppend(AuditAction::DatabaseCreated {
                name: meta.name.clone(),
                owner_id,
            }));

            Ok((state.with_database(meta), effects))
        }

        Command::CreateCluster { name, owner_id } => {
            if state.get_cluster(&name).is_some() {
                return Err(KernelError::ClusterAlreadyExists(name));
            }
            if !state.role_exists(&owner_id) {
                return Err(KernelError::RoleNotFound(owner_id));
            }

            let meta = ClusterMetadata {
                name,
                owner_id,
                replicas: BTreeMap::new(),
            };
            effects.push(Effect::ClusterWrite(meta.clone()));
            effects.push(Effect::AuditLogAppend(AuditAction::ClusterCreated {
                name: meta.name.clone(),
                owner_id,
            }));

            Ok((state.with_cluster(meta), effects))
        }

        Command::CreateClusterReplica {
            cluster,
            replica,
            owner_id,
        } => {
            let meta = state
                .get_cluster(&cluster)
                .ok_or_else(|| KernelError::ClusterNotFound(cluster.clone()))?;
            if meta.replicas.contains_key(&replica) {
                return Err(KernelError::ClusterReplicaAlreadyExists { cluster, replica });
            }
            if !state.role_exists(&owner_id) {
                return Err(KernelError::RoleNotFound(owner_id));
            }

            effects.push(Effect::AuditLogAppend(AuditAction::ClusterReplicaCreated {
                cluster: cluster.clone(),
                replica: replica.clone(),
                owner_id,
            }));

            let new_state = state.with_cluster_replica(&cluster, replica, owner_id);
            let meta = new_state
                .get_cluster(&cluster)
                .ok_or_else(|| KernelError::ClusterNotFound(cluster.clone()))?;
            effects.insert(0, Effect::ClusterWrite(meta.clone()));

            Ok((new_state, effects))
        }
    }
}

/// Applies a sequence of commands, stopping at the first error.
pub fn apply_committed_batch(
    state: State,
    cmds: impl IntoIterator<Item = Command>,
) -> Result<(State, Vec<Effect>), KernelError> {
    let mut state = state;
    let mut effects = Vec::new();
    for cmd in cmds {
        let (next, cmd_effects) = apply_committed(state, cmd)?;
        state = next;
        effects.extend(cmd_effects);
    }
    Ok((state, effects))
}

fn role_name(state: &State, id: RoleId) -> Result<RoleName, KernelError> {
    state
        .get_role(&id)
        .map(|role| role.name.clone())
        .ok_or(KernelError::RoleNotFound(id))
}

/// Resolves a GRANT/REVOKE endpoint, rejecting reserved roles.
fn endpoint_name(state: &State, id: RoleId) -> Result<RoleName, KernelError> {
    let name = role_name(state, id)?;
    if id.is_reserved() {
        return Err(KernelError::ReservedRoleName(name));
    }
    Ok(name)
}

fn graph_error(
    err: GraphError,
    (role_id, role): (RoleId, &RoleName),
    (_, member): (RoleId, &RoleName),
) -> KernelError {
    match err {
        // member already reaches role
        GraphError::TransitiveMembership { .. } => KernelError::CircularRoleMembership {
            member: member.clone(),
            role: role.clone(),
        },
        // role already reaches member, or they are the same role
        GraphError::SelfMembership(_) | GraphError::CircularMembership { .. } => {
            KernelError::CircularRoleMembership {
                member: role.clone(),
                role: member.clone(),
            }
        }
        GraphError::ReservedEndpoint(id) if id == role_id => {
            KernelError::ReservedRoleName(role.clone())
        }
        GraphError::ReservedEndpoint(_) => KernelError::ReservedRoleName(member.clone()),
    }
}

/// Errors that can occur when applying commands to the kernel.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    // Role errors
    #[error("role '{0}' already exists")]
    RoleAlreadyExists(RoleName),

    #[error("role name '{0}' is reserved")]
    ReservedRoleName(RoleName),

    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("role with id {0} not found")]
    RoleNotFound(RoleId),

    // Membership errors
    /// The grant would duplicate or close a membership path; `member` is
    /// already a (transitive) member of `role`.
    #[error("role '{member}' is a member of role '{role}'")]
    CircularRoleMembership { member: RoleName, role: RoleName },

    // Dependency errors
    #[error("role '{0}' cannot be dropped because some objects depend on it")]
    DependentObjects(RoleName),

    #[error(
        "cannot drop role '{grantor}': still depended upon by membership of role '{member}' in role '{role}'"
    )]
    DependentMembership {
        grantor: RoleName,
        role: RoleName,
        member: RoleName,
    },

    // Object errors
    #[error("database '{0}' already exists")]
    DatabaseAlreadyExists(String),

    #[error("cluster '{0}' already exists")]
    ClusterAlreadyExists(String),

    #[error("unknown cluster '{0}'")]
    ClusterNotFound(String),

    #[error("cluster replica '{cluster}.{replica}' already exists")]
    ClusterReplicaAlreadyExists { cluster: String, replica: String },
}
