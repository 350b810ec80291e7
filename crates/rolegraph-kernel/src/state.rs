//! Kernel state management.
//!
//! The kernel state holds the role store, the membership graph, and the
//! minimal database/cluster registry used for ownership. State transitions
//! take ownership and return a new state (builder pattern); validation lives
//! in [`crate::kernel::apply_committed`].

use std::collections::BTreeMap;

use rolegraph_types::{MembershipEdge, Role, RoleAttributes, RoleId, RoleName};
use serde::{Deserialize, Serialize};

use crate::graph::{EdgeInsert, GraphError, MembershipGraph};

// ============================================================================
// Object Metadata
// ============================================================================

/// Metadata for a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub name: String,
    pub owner_id: RoleId,
}

/// Metadata for a cluster and its replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    pub name: String,
    pub owner_id: RoleId,
    /// Replica name → owner.
    pub replicas: BTreeMap<String, RoleId>,
}

// ============================================================================
// Kernel State
// ============================================================================

/// The kernel's in-memory state.
///
/// A fresh state already contains the bootstrap superuser (`mz_system`) and
/// the PUBLIC pseudo-role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    // Role store
    roles: BTreeMap<RoleId, Role>,
    role_name_index: BTreeMap<RoleName, RoleId>,
    next_user_role_id: u64,

    // Membership graph
    membership: MembershipGraph,

    // Owned objects
    databases: BTreeMap<String, DatabaseMetadata>,
    clusters: BTreeMap<String, ClusterMetadata>,
}

impl State {
    /// Creates a new bootstrapped state.
    pub fn new() -> Self {
        let mut state = Self {
            roles: BTreeMap::new(),
            role_name_index: BTreeMap::new(),
            next_user_role_id: 1,
            membership: MembershipGraph::new(),
            databases: BTreeMap::new(),
            clusters: BTreeMap::new(),
        };
        for role in [Role::mz_system(), Role::public()] {
            state.role_name_index.insert(role.name.clone(), role.id);
            state.roles.insert(role.id, role);
        }
        state
    }

    // ========================================================================
    // Role Store
    // ========================================================================

    /// Returns the role with the given ID, if it exists.
    pub fn get_role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    pub fn role_exists(&self, id: &RoleId) -> bool {
        self.roles.contains_key(id)
    }

    /// Looks up a role by its exact (case-sensitive) name.
    pub fn lookup(&self, name: &str) -> Option<&Role> {
        self.role_name_index
            .get(&RoleName::new(name))
            .and_then(|id| self.roles.get(id))
    }

    pub fn role_name_exists(&self, name: &RoleName) -> bool {
        self.role_name_index.contains_key(name)
    }

    /// Returns all roles ordered by ID.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Returns the ID the next created role will get.
    pub fn next_user_role_id(&self) -> RoleId {
        RoleId::User(self.next_user_role_id)
    }

    /// Returns the PUBLIC pseudo-role.
    pub fn public_role(&self) -> Option<&Role> {
        self.roles.get(&RoleId::Public)
    }

    /// Inserts a role with an auto-allocated ID.
    ///
    /// Internal to the kernel - external code should use `apply_committed`
    /// which handles validation and effects.
    pub(crate) fn with_new_role(
        mut self,
        name: RoleName,
        attributes: RoleAttributes,
    ) -> (Self, Role) {
        let id = RoleId::User(self.next_user_role_id);
        self.next_user_role_id += 1;

        let role = Role::new(id, name, attributes);
        self.role_name_index.insert(role.name.clone(), id);
        self.roles.insert(id, role.clone());

        (self, role)
    }

    /// Replaces a role's attributes. Unknown IDs leave the state unchanged.
    pub(crate) fn with_role_attributes(mut self, id: RoleId, attributes: RoleAttributes) -> Self {
        if let Some(role) = self.roles.get_mut(&id) {
            role.attributes = attributes;
        }
        self
    }

    /// Removes a role and every membership edge that touches it.
    pub(crate) fn without_role(mut self, id: RoleId) -> (Self, Vec<MembershipEdge>) {
        let removed_edges = self.membership.cascade_remove(id);
        if let Some(role) = self.roles.remove(&id) {
            self.role_name_index.remove(&role.name);
        }
        (self, removed_edges)
    }

    // ========================================================================
    // Membership Graph
    // ========================================================================

    pub fn membership(&self) -> &MembershipGraph {
        &self.membership
    }

    pub(crate) fn with_membership(
        mut self,
        role_id: RoleId,
        member_id: RoleId,
        grantor_id: RoleId,
    ) -> Result<(Self, EdgeInsert), GraphError> {
        let outcome = self.membership.add_edge(role_id, member_id, grantor_id)?;
        Ok((self, outcome))
    }

    pub(crate) fn without_membership(
        mut self,
        role_id: RoleId,
        member_id: RoleId,
    ) -> (Self, Option<MembershipEdge>) {
        let removed = self.membership.remove_edge(role_id, member_id);
        (self, removed)
    }

    // ========================================================================
    // Databases and Clusters
    // ========================================================================

    pub fn get_database(&self, name: &str) -> Option<&DatabaseMetadata> {
        self.databases.get(name)
    }

    pub fn get_cluster(&self, name: &str) -> Option<&ClusterMetadata> {
        self.clusters.get(name)
    }

    pub fn databases(&self) -> impl Iterator<Item = &DatabaseMetadata> {
        self.databases.values()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterMetadata> {
        self.clusters.values()
    }

    /// Returns true if `id` owns any database, cluster, or replica.
    pub fn owns_objects(&self, id: RoleId) -> bool {
        self.databases.values().any(|db| db.owner_id == id)
            || self.clusters.values().any(|cluster| {
                cluster.owner_id == id || cluster.replicas.values().any(|owner| *owner == id)
            })
    }

    pub(crate) fn with_database(mut self, meta: DatabaseMetadata) -> Self {
        self.databases.insert(meta.name.clone(), meta);
        self
    }

    pub(crate) fn with_cluster(mut self, meta: ClusterMetadata) -> Self {
        self.clusters.insert(meta.name.clone(), meta);
        self
    }

    pub(crate) fn with_cluster_replica(
        mut self,
        cluster: &str,
        replica: String,
        owner_id: RoleId,
    ) -> Self {
        if let Some(meta) = self.clusters.get_mut(cluster) {
            meta.replicas.insert(replica, owner_id);
        }
        self
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rolegraph_types::{MZ_SYSTEM_ROLE_ID, MZ_SYSTEM_ROLE_NAME, PUBLIC_ROLE_NAME};

    use super::*;

    #[test]
    fn new_state_is_bootstrapped() {
        let state = State::new();
        assert_eq!(state.role_count(), 2);

        let system = state.lookup(MZ_SYSTEM_ROLE_NAME).expect("mz_system exists");
        assert_eq!(system.id, MZ_SYSTEM_ROLE_ID);
        assert!(system.is_superuser);

        assert!(state.lookup(PUBLIC_ROLE_NAME).is_some());
        assert!(state.public_role().is_some());
        assert_eq!(state.next_user_role_id(), RoleId::User(1));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let (state, _) = State::new().with_new_role(RoleName::new("Joe"), RoleAttributes::new());
        assert!(state.lookup("Joe").is_some());
        assert!(state.lookup("joe").is_none());
    }

    #[test]
    fn role_ids_are_sequential() {
        let (state, first) = State::new().with_new_role(RoleName::new("a"), RoleAttributes::new());
        let (state, second) = state.with_new_role(RoleName::new("b"), RoleAttributes::new());
        assert_eq!(first.id, RoleId::User(1));
        assert_eq!(second.id, RoleId::User(2));
        assert_eq!(state.next_user_role_id(), RoleId::User(3));
    }

    #[test]
    fn without_role_frees_the_name() {
        let (state, role) = State::new().with_new_role(RoleName::new("a"), RoleAttributes::new());
        let (state, removed) = state.without_role(role.id);
        assert!(removed.is_empty());
        assert!(state.lookup("a").is_none());
        assert!(!state.role_exists(&role.id));
        // IDs are never reused.
        assert_eq!(state.next_user_role_id(), RoleId::User(2));
    }

    #[test]
    fn ownership_covers_replicas() {
        let owner = RoleId::User(9);
        let state = State::new()
            .with_cluster(ClusterMetadata {
                name: "c".to_string(),
                owner_id: MZ_SYSTEM_ROLE_ID,
                replicas: BTreeMap::new(),
            })
            .with_cluster_replica("c", "r1".to_string(), owner);

        assert!(state.owns_objects(owner));
        assert!(!state.owns_objects(RoleId::User(10)));
    }
}
