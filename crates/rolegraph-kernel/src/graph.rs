//! Role membership graph.
//!
//! Edges point from a member to the role it is a member of, and each edge
//! records the role that granted it. The graph is a general DAG (diamonds are
//! legal) but no role may ever reach itself, and no shortcut edge may be added
//! for a membership that already holds transitively. Both are enforced by
//! [`MembershipGraph::add_edge`] before inserting anything.
//!
//! Adjacency is kept in both directions, keyed by [`RoleId`]:
//! - `parents`: member → (role → grantor)
//! - `members`: role → members
//!
//! Traversals are iterative with an explicit visited set, so they terminate
//! even if the graph were somehow malformed.

use std::collections::{BTreeMap, BTreeSet};

use rolegraph_types::{MembershipEdge, RoleId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Graph-level errors. The kernel maps these to named errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A role cannot be a member of itself.
    #[error("role {0} cannot be a member of itself")]
    SelfMembership(RoleId),

    /// `role` is already (transitively) a member of `member`, so the edge
    /// `member → role` would close a cycle.
    #[error("role {role} is a member of role {member}")]
    CircularMembership { role: RoleId, member: RoleId },

    /// `member` already reaches `role` through other roles.
    #[error("role {member} is a member of role {role}")]
    TransitiveMembership { role: RoleId, member: RoleId },

    /// Reserved roles are never edge endpoints.
    #[error("role {0} is reserved")]
    ReservedEndpoint(RoleId),
}

/// Outcome of a successful [`MembershipGraph::add_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeInsert {
    /// A new edge was recorded.
    Inserted,
    /// The member was already a direct member; nothing changed.
    AlreadyMember { grantor_id: RoleId },
}

/// Directed graph of "is a member of" edges.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MembershipGraph {
    parents: BTreeMap<RoleId, BTreeMap<RoleId, RoleId>>,
    members: BTreeMap<RoleId, BTreeSet<RoleId>>,
}

impl MembershipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the grantor of `member`'s direct membership in `role`.
    pub fn grantor(&self, role_id: RoleId, member_id: RoleId) -> Option<RoleId> {
        self.parents
            .get(&member_id)
            .and_then(|roles| roles.get(&role_id))
            .copied()
    }

    pub fn is_direct_member(&self, role_id: RoleId, member_id: RoleId) -> bool {
        self.grantor(role_id, member_id).is_some()
    }

    /// Records that `member` is a member of `role`.
    ///
    /// A redundant direct grant leaves the original grantor in place. A grant
    /// that `member` already holds only transitively is rejected.
    pub fn add_edge(
        &mut self,
        role_id: RoleId,
        member_id: RoleId,
        grantor_id: RoleId,
    ) -> Result<EdgeInsert, GraphError> {
        for endpoint in [role_id, member_id] {
            if endpoint.is_reserved() {
                return Err(GraphError::ReservedEndpoint(endpoint));
            }
        }

        if role_id == member_id {
            return Err(GraphError::SelfMembership(role_id));
        }

        if let Some(grantor_id) = self.grantor(role_id, member_id) {
            return Ok(EdgeInsert::AlreadyMember { grantor_id });
        }

        if self.is_member(role_id, member_id) {
            return Err(GraphError::TransitiveMembership {
                role: role_id,
                member: member_id,
            });
        }

        if self.is_member(member_id, role_id) {
            return Err(GraphError::CircularMembership {
                role: role_id,
                member: member_id,
            });
        }

        self.parents
            .entry(member_id)
            .or_default()
            .insert(role_id, grantor_id);
        self.members.entry(role_id).or_default().insert(member_id);

        debug_assert!(
            !self.ancestors_of(role_id).contains(&role_id),
            "role {role_id} became self-reachable"
        );

        Ok(EdgeInsert::Inserted)
    }

    /// Removes `member`'s membership in `role`, returning the removed edge.
    ///
    /// Removing an absent edge is a no-op.
    pub fn remove_edge(&mut self, role_id: RoleId, member_id: RoleId) -> Option<MembershipEdge> {
        let roles = self.parents.get_mut(&member_id)?;
        let grantor_id = roles.remove(&role_id)?;
        if roles.is_empty() {
            self.parents.remove(&member_id);
        }

        if let Some(members) = self.members.get_mut(&role_id) {
            members.remove(&member_id);
            if members.is_empty() {
                self.members.remove(&role_id);
            }
        }

        Some(MembershipEdge {
            role_id,
            member_id,
            grantor_id,
        })
    }

    /// Removes every edge where `id` is the role or the member.
    pub fn cascade_remove(&mut self, id: RoleId) -> Vec<MembershipEdge> {
        let mut removed = Vec::new();

        let parents: Vec<RoleId> = self.parents_of(id).map(|(role, _)| role).collect();
        for role_id in parents {
            removed.extend(self.remove_edge(role_id, id));
        }

        let members: Vec<RoleId> = self.members_of(id).collect();
        for member_id in members {
            removed.extend(self.remove_edge(id, member_id));
        }

        removed
    }

    /// Returns the roles `member` is directly a member of, with grantors.
    pub fn parents_of(&self, member_id: RoleId) -> impl Iterator<Item = (RoleId, RoleId)> + '_ {
        self.parents
            .get(&member_id)
            .into_iter()
            .flat_map(|roles| roles.iter().map(|(role, grantor)| (*role, *grantor)))
    }

    /// Returns the direct members of `role`.
    pub fn members_of(&self, role_id: RoleId) -> impl Iterator<Item = RoleId> + '_ {
        self.members
            .get(&role_id)
            .into_iter()
            .flat_map(|members| members.iter().copied())
    }

    /// Returns every role reachable from `id` by following member → role
    /// edges. `id` itself is not included.
    pub fn ancestors_of(&self, id: RoleId) -> BTreeSet<RoleId> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<RoleId> = self.parents_of(id).map(|(role, _)| role).collect();

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.parents_of(current)
                    .map(|(role, _)| role)
                    .filter(|role| !visited.contains(role)),
            );
        }

        visited
    }

    /// Returns true if `member` is transitively a member of `role`.
    pub fn is_member(&self, role_id: RoleId, member_id: RoleId) -> bool {
        self.ancestors_of(member_id).contains(&role_id)
    }

    /// Returns every edge, ordered by (role, member).
    pub fn edges(&self) -> Vec<MembershipEdge> {
        let mut edges: Vec<MembershipEdge> = self
            .parents
            .iter()
            .flat_map(|(member_id, roles)| {
                roles.iter().map(|(role_id, grantor_id)| MembershipEdge {
                    role_id: *role_id,
                    member_id: *member_id,
                    grantor_id: *grantor_id,
                })
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.parents.values().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANTOR: RoleId = RoleId::User(100);

    fn u(id: u64) -> RoleId {
        RoleId::User(id)
    }

    #[test]
    fn add_and_remove_edge() {
        let mut graph = MembershipGraph::new();

        assert_eq!(graph.add_edge(u(1), u(2), GRANTOR), Ok(EdgeInsert::Inserted));
        assert!(graph.is_direct_member(u(1), u(2)));
        assert!(!graph.is_direct_member(u(2), u(1)));
        assert_eq!(graph.grantor(u(1), u(2)), Some(GRANTOR));
        assert_eq!(graph.edge_count(), 1);

        let removed = graph.remove_edge(u(1), u(2)).expect("edge exists");
        assert_eq!(removed.grantor_id, GRANTOR);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph, MembershipGraph::new());
    }

    #[test]
    fn remove_absent_edge_is_noop() {
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(1), u(2), GRANTOR).unwrap();

        assert_eq!(graph.remove_edge(u(2), u(1)), None);
        assert_eq!(graph.remove_edge(u(3), u(4)), None);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn redundant_grant_keeps_original_grantor() {
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(1), u(2), GRANTOR).unwrap();

        let second = graph.add_edge(u(1), u(2), u(50)).unwrap();
        assert_eq!(second, EdgeInsert::AlreadyMember { grantor_id: GRANTOR });
        assert_eq!(graph.grantor(u(1), u(2)), Some(GRANTOR));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn self_membership_rejected() {
        let mut graph = MembershipGraph::new();
        assert_eq!(
            graph.add_edge(u(1), u(1), GRANTOR),
            Err(GraphError::SelfMembership(u(1)))
        );
    }

    #[test]
    fn transitive_cycle_rejected() {
        // 1 ∈ 2, 2 ∈ 3: granting 1 to 3 (3 ∈ 1) would close 1 → 2 → 3 → 1.
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(2), u(1), GRANTOR).unwrap();
        graph.add_edge(u(3), u(2), GRANTOR).unwrap();

        assert_eq!(
            graph.add_edge(u(1), u(3), GRANTOR),
            Err(GraphError::CircularMembership {
                role: u(1),
                member: u(3),
            })
        );
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn transitive_member_cannot_get_direct_edge() {
        // 1 ∈ 2 ∈ 3; 1 already reaches 3.
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(2), u(1), GRANTOR).unwrap();
        graph.add_edge(u(3), u(2), GRANTOR).unwrap();

        assert_eq!(
            graph.add_edge(u(3), u(1), GRANTOR),
            Err(GraphError::TransitiveMembership {
                role: u(3),
                member: u(1),
            })
        );
        assert_eq!(graph.edge_count(), 2);
        assert!(!graph.is_direct_member(u(3), u(1)));
    }

    #[test]
    fn reserved_endpoints_rejected() {
        let mut graph = MembershipGraph::new();
        assert_eq!(
            graph.add_edge(RoleId::Public, u(1), GRANTOR),
            Err(GraphError::ReservedEndpoint(RoleId::Public))
        );
        assert_eq!(
            graph.add_edge(u(1), RoleId::System(1), GRANTOR),
            Err(GraphError::ReservedEndpoint(RoleId::System(1)))
        );
    }

    #[test]
    fn diamond_ancestors_are_deduplicated() {
        //      4
        //     / \
        //    2   3
        //     \ /
        //      1
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(2), u(1), GRANTOR).unwrap();
        graph.add_edge(u(3), u(1), GRANTOR).unwrap();
        graph.add_edge(u(4), u(2), GRANTOR).unwrap();
        graph.add_edge(u(4), u(3), GRANTOR).unwrap();

        assert_eq!(graph.ancestors_of(u(1)), BTreeSet::from([u(2), u(3), u(4)]));
        assert!(graph.is_member(u(4), u(1)));
        assert!(!graph.is_member(u(1), u(4)));
    }

    #[test]
    fn cascade_removes_both_directions() {
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(2), u(1), GRANTOR).unwrap();
        graph.add_edge(u(3), u(2), GRANTOR).unwrap();
        graph.add_edge(u(4), u(5), GRANTOR).unwrap();

        let removed = graph.cascade_remove(u(2));
        assert_eq!(removed.len(), 2);
        assert!(
            graph
                .edges()
                .iter()
                .all(|e| e.role_id != u(2) && e.member_id != u(2))
        );
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.members_of(u(3)).next().is_none());
    }

    #[test]
    fn edges_are_ordered() {
        let mut graph = MembershipGraph::new();
        graph.add_edge(u(3), u(1), GRANTOR).unwrap();
        graph.add_edge(u(2), u(1), GRANTOR).unwrap();
        graph.add_edge(u(2), u(4), GRANTOR).unwrap();

        let pairs: Vec<(RoleId, RoleId)> = graph
            .edges()
            .into_iter()
            .map(|e| (e.role_id, e.member_id))
            .collect();
        assert_eq!(pairs, vec![(u(2), u(1)), (u(2), u(4)), (u(3), u(1))]);
    }
}
