//! # rolegraph-rbac: Attribute-based authorization
//!
//! Answers "may this principal perform this privileged operation?" for the
//! role catalog:
//! - **Operation table** mapping each gated statement to a required attribute
//! - **Attribute resolution** through the membership graph, honoring INHERIT
//! - **Authorization gate** with the RBAC switch and superuser bypass
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Privileged statement + Principal            │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AuthorizationGate                           │
//! │  ├─ enable_rbac_checks off → Allow           │
//! │  ├─ superuser → Allow                        │
//! │  └─ effective_attributes ∋ required → Allow  │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Allow(reason)                             │
//! │  - Deny { operation, missing_attribute }     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! | Operation              | Required attribute |
//! |------------------------|--------------------|
//! | CREATE / ALTER / DROP ROLE | CREATEROLE     |
//! | GRANT / REVOKE ROLE    | CREATEROLE         |
//! | CREATE DATABASE        | CREATEDB           |
//! | CREATE CLUSTER         | CREATECLUSTER      |
//! | CREATE CLUSTER REPLICA | CREATECLUSTER      |
//!
//! ## Example
//!
//! ```
//! use rolegraph_kernel::State;
//! use rolegraph_rbac::{AuthorizationGate, Operation, Principal};
//! use rolegraph_types::MZ_SYSTEM_ROLE_ID;
//!
//! let state = State::new();
//! let gate = AuthorizationGate::new(true);
//!
//! let principal = Principal::new(MZ_SYSTEM_ROLE_ID);
//! assert!(gate.check(&state, &principal, Operation::CreateRole).is_allowed());
//! ```

pub mod enforcement;
pub mod permissions;
pub mod resolver;

// Re-export commonly used types
pub use enforcement::{
    AllowReason, AuthorizationGate, Decision, DenyReason, EnforcementError, Principal,
};
pub use permissions::Operation;
pub use resolver::effective_attributes;

// Kani proofs for bounded model checking
#[cfg(kani)]
mod kani_proofs;
