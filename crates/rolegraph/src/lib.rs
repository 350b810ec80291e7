//! # Rolegraph
//!
//! Role-based access control for database DDL.
//!
//! Rolegraph keeps a catalog of roles, their capability attributes, and a
//! directed graph of role memberships. Every privileged statement passes
//! through an authorization gate that resolves the acting role's effective
//! attributes over that graph:
//!
//! - **Transitive inheritance** - attributes flow from a role to its members
//!   through chains of INHERIT roles
//! - **Cycle-free membership** - no role can become a member of itself
//! - **Reserved identities** - `mz_system` and `PUBLIC` are never GRANT,
//!   REVOKE or DROP endpoints
//! - **All-or-nothing statements** - a multi-target GRANT, REVOKE or DROP
//!   either applies completely or not at all
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Catalog                             │
//! │  ┌─────────┐   ┌─────────────┐   ┌──────────┐   ┌─────────┐  │
//! │  │ Session │ → │    Gate     │ → │  Kernel  │ → │ Effects │  │
//! │  │  (DDL)  │   │ (resolver)  │   │(pure FSM)│   │ (audit) │  │
//! │  └─────────┘   └─────────────┘   └──────────┘   └─────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use rolegraph::{Catalog, RoleAttributes, Attribute};
//!
//! let catalog = Catalog::new();
//! let admin = catalog.system_session();
//!
//! admin.create_role("creators", RoleAttributes::new().with_attribute(Attribute::CreateDb))?;
//! admin.create_role("joe", RoleAttributes::new())?;
//! admin.grant_role("creators", &["joe"])?;
//!
//! // joe inherits CREATEDB from creators
//! let joe = catalog.session("joe")?;
//! joe.create_database("analytics")?;
//!
//! // but not CREATEROLE
//! let err = joe.create_role("bob", RoleAttributes::new()).unwrap_err();
//! assert_eq!(err.summary(), "permission denied to create role");
//! # Ok::<(), rolegraph::RolegraphError>(())
//! ```
//!
//! # Modules
//!
//! - **Facade**: [`Catalog`], [`Session`] - Main API
//! - **Errors and notices**: [`RolegraphError`], [`Notice`]
//! - **Views**: [`RoleRow`], [`RoleMemberRow`]

mod catalog;
mod coordinator;
mod error;
mod notice;
mod session;
mod views;

pub use catalog::{Catalog, ExecuteResult};
pub use error::{Result, RolegraphError};
pub use notice::Notice;
pub use session::Session;
pub use views::{RoleMemberRow, RoleRow, mz_role_members, mz_roles};

// Re-export core types
pub use rolegraph_types::{
    Attribute, AttributeDeltas, AttributeSet, AuditAction, MZ_SYSTEM_ROLE_ID,
    MZ_SYSTEM_ROLE_NAME, MembershipEdge, PUBLIC_ROLE_NAME, Role, RoleAttributes, RoleId,
    RoleName,
};

// Re-export kernel types
pub use rolegraph_kernel::{ClusterMetadata, DatabaseMetadata, KernelError, State};

// Re-export authorization
pub use rolegraph_rbac::{
    AllowReason, Decision, DenyReason, EnforcementError, Operation, Principal,
    effective_attributes,
};

// Re-export configuration
pub use rolegraph_config::{BootstrapRole, ConfigError, ConfigLoader, RolegraphConfig};
