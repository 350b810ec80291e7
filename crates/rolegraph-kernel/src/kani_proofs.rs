//! Kani verification harnesses for the kernel state machine
//!
//! Each proof verifies a specific safety property of the role catalog.
//!
//! # Running Proofs
//!
//! ```bash
//! # Verify all proofs
//! cargo kani --package rolegraph-kernel
//!
//! # Verify specific proof
//! cargo kani --harness verify_self_membership_rejected
//! ```

#[cfg(kani)]
mod verification {
    use crate::command::Command;
    use crate::graph::{GraphError, MembershipGraph};
    use crate::kernel::{KernelError, apply_committed};
    use crate::state::State;
    use rolegraph_types::{MZ_SYSTEM_ROLE_ID, RoleAttributes, RoleId};

    /// **Proof 1: No role can be granted to itself**
    ///
    /// **Property:** `add_edge(r, r, _)` never inserts an edge
    #[kani::proof]
    fn verify_self_membership_rejected() {
        let raw: u64 = kani::any();
        let role = RoleId::User(raw);

        let mut graph = MembershipGraph::new();
        let result = graph.add_edge(role, role, MZ_SYSTEM_ROLE_ID);

        assert_eq!(result, Err(GraphError::SelfMembership(role)));
        assert_eq!(graph.edge_count(), 0);
    }

    /// **Proof 2: Two-node cycles are rejected**
    ///
    /// **Property:** after `a ∈ b`, granting `b ∈ a` fails and leaves one edge
    #[kani::proof]
    #[kani::unwind(4)]
    fn verify_two_cycle_rejected() {
        let a_raw: u64 = kani::any();
        let b_raw: u64 = kani::any();
        kani::assume(a_raw != b_raw);
        let a = RoleId::User(a_raw);
        let b = RoleId::User(b_raw);

        let mut graph = MembershipGraph::new();
        assert!(graph.add_edge(b, a, MZ_SYSTEM_ROLE_ID).is_ok());

        let result = graph.add_edge(a, b, MZ_SYSTEM_ROLE_ID);
        assert!(matches!(result, Err(GraphError::CircularMembership { .. })));
        assert_eq!(graph.edge_count(), 1);
    }

    /// **Proof 3: Reserved roles are never GRANT endpoints**
    #[kani::proof]
    fn verify_reserved_endpoint_rejected() {
        let raw: u64 = kani::any();
        let member = RoleId::User(raw);

        let mut graph = MembershipGraph::new();
        assert!(graph.add_edge(RoleId::Public, member, MZ_SYSTEM_ROLE_ID).is_err());
        assert!(graph.add_edge(member, MZ_SYSTEM_ROLE_ID, MZ_SYSTEM_ROLE_ID).is_err());
        assert_eq!(graph.edge_count(), 0);
    }

    /// **Proof 4: Reserved roles cannot be dropped**
    #[kani::proof]
    fn verify_reserved_roles_cannot_be_dropped() {
        let pick: bool = kani::any();
        let target = if pick { RoleId::Public } else { MZ_SYSTEM_ROLE_ID };

        let result = apply_committed(State::new(), Command::drop_roles([target]));
        assert!(matches!(result, Err(KernelError::ReservedRoleName(_))));
    }

    /// **Proof 5: Created roles are never superusers**
    #[kani::proof]
    fn verify_created_role_is_not_superuser() {
        let inherit: bool = kani::any();
        let attributes = RoleAttributes::new().with_inherit(inherit);

        let result = apply_committed(State::new(), Command::create_role("joe", attributes));
        kani::assume(result.is_ok());
        let (state, _) = result.unwrap();

        let role = state.lookup("joe").unwrap();
        assert!(role.id.is_user());
        assert!(!role.is_superuser);
        assert_eq!(role.attributes.inherit, inherit);
    }
}
