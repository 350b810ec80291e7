//! Kani bounded model checking proofs for authorization correctness.
//!
//! These proofs verify the gate's bypass rules:
//! - Superuser bypass: superusers are allowed every operation
//! - RBAC switch: a disabled gate allows every operation
//! - Table completeness: every operation maps to an attribute that denies
//!   a principal without attributes

use crate::{
    enforcement::{AllowReason, AuthorizationGate, Decision, Principal},
    permissions::Operation,
};
use rolegraph_kernel::State;
use rolegraph_types::RoleId;

fn any_operation() -> Operation {
    let index: usize = kani::any();
    kani::assume(index < Operation::ALL.len());
    Operation::ALL[index]
}

//=============================================================================
// Superuser Bypass
//=============================================================================

/// **Property**: A session superuser is allowed regardless of stored
/// attributes.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_superuser_bypass() {
    let raw: u64 = kani::any();
    let operation = any_operation();
    let state = State::new();
    let gate = AuthorizationGate::new(true).without_audit();

    let decision = gate.check(&state, &Principal::superuser(RoleId::User(raw)), operation);
    assert_eq!(decision, Decision::Allow(AllowReason::Superuser));
}

//=============================================================================
// RBAC Switch
//=============================================================================

/// **Property**: With checks disabled every principal is allowed.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_disabled_gate_allows() {
    let raw: u64 = kani::any();
    let operation = any_operation();
    let state = State::new();
    let gate = AuthorizationGate::new(false).without_audit();

    let decision = gate.check(&state, &Principal::new(RoleId::User(raw)), operation);
    assert_eq!(decision, Decision::Allow(AllowReason::RbacDisabled));
}

//=============================================================================
// Table Completeness
//=============================================================================

/// **Property**: An unknown, non-superuser principal is denied every
/// operation, and the denial names the operation's required attribute.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(10)]
fn verify_deny_names_required_attribute() {
    let raw: u64 = kani::any();
    let operation = any_operation();
    let state = State::new();
    let gate = AuthorizationGate::new(true).without_audit();

    match gate.check(&state, &Principal::new(RoleId::User(raw)), operation) {
        Decision::Deny(reason) => {
            assert_eq!(reason.operation, operation);
            assert_eq!(reason.missing_attribute, operation.required_attribute());
        }
        Decision::Allow(_) => panic!("unexpected allow"),
    }
}
