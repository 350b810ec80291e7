//! Effective attribute resolution.
//!
//! A role's effective attributes are its own attributes plus those of every
//! role it reaches through membership edges, where a hop out of a role is
//! only followed if that role has INHERIT enabled. Superusers resolve to every
//! attribute.

use std::collections::BTreeSet;

use rolegraph_kernel::State;
use rolegraph_types::{AttributeSet, RoleId};

/// Computes the effective attribute set for `role_id`.
///
/// Unknown roles resolve to the empty set. Every role implicitly belongs to
/// PUBLIC, so PUBLIC's attributes are included whenever the role inherits.
pub fn effective_attributes(state: &State, role_id: RoleId) -> AttributeSet {
    let Some(role) = state.get_role(&role_id) else {
        return AttributeSet::empty();
    };
    if role.is_superuser {
        return AttributeSet::all();
    }

    let mut effective = role.attributes.attributes;
    if !role.attributes.inherit {
        return effective;
    }

    if let Some(public) = state.public_role() {
        effective = effective.union(public.attributes.attributes);
    }

    // Roles whose parents still need to be visited. Only inheriting roles
    // are ever pushed.
    let mut visited = BTreeSet::from([role_id]);
    let mut stack = vec![role_id];

    while let Some(current) = stack.pop() {
        for (parent_id, _grantor) in state.membership().parents_of(current) {
            if !visited.insert(parent_id) {
                continue;
            }
            let Some(parent) = state.get_role(&parent_id) else {
                continue;
            };
            effective = effective.union(parent.attributes.attributes);
            if parent.attributes.inherit {
                stack.push(parent_id);
            }
        }

        if effective.is_all() {
            break;
        }
    }

    effective
}
