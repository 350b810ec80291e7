//! Principal-scoped handle for DDL and DCL statements.
//!
//! A `Session` runs every statement as one principal. All authorization is
//! handled at this layer before the kernel sees a command.

use rolegraph_kernel::Command;
use rolegraph_rbac::{Decision, Operation, Principal};
use rolegraph_types::{AttributeDeltas, RoleAttributes, RoleId};

use crate::catalog::{Catalog, ExecuteResult};
use crate::coordinator;
use crate::error::{Result, RolegraphError};
use crate::notice::Notice;

/// A session acting as one principal.
///
/// Obtained from [`Catalog::session`], [`Catalog::system_session`] or
/// [`Catalog::session_for`].
#[derive(Clone)]
pub struct Session {
    catalog: Catalog,
    principal: Principal,
}

impl Session {
    pub(crate) fn new(catalog: Catalog, principal: Principal) -> Self {
        Self { catalog, principal }
    }

    /// Returns the acting principal.
    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// Returns the acting role.
    pub fn role_id(&self) -> RoleId {
        self.principal.role_id
    }

    /// Returns the gate's decision for `operation` without running anything.
    pub fn check(&self, operation: Operation) -> Result<Decision> {
        self.catalog.decide(&self.principal, operation)
    }

    // ========================================================================
    // Roles
    // ========================================================================

    /// CREATE ROLE.
    pub fn create_role(&self, name: &str, attributes: RoleAttributes) -> Result<ExecuteResult> {
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::CreateRole)?;
            Ok(Some(Command::create_role(name, attributes)))
        })
    }

    /// ALTER ROLE. Attributes absent from `deltas` keep their value.
    pub fn alter_role(&self, name: &str, deltas: AttributeDeltas) -> Result<ExecuteResult> {
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::AlterRole)?;
            let role_id = ctx.resolve(name)?;
            Ok(Some(Command::alter_role(role_id, deltas)))
        })
    }

    /// DROP ROLE [IF EXISTS] for one or more roles.
    ///
    /// Either every named role is dropped or none is. With `if_exists`,
    /// missing roles are skipped with a notice.
    pub fn drop_roles(&self, names: &[&str], if_exists: bool) -> Result<ExecuteResult> {
        let current = self.principal.role_id;
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::DropRole)?;

            let mut role_ids = Vec::with_capacity(names.len());
            for name in names {
                match ctx.resolve(name) {
                    Ok(id) if id == current => {
                        return Err(RolegraphError::CurrentRoleCannotBeDropped);
                    }
                    Ok(id) => role_ids.push(id),
                    Err(RolegraphError::UnknownRole(_)) if if_exists => {
                        ctx.notice(Notice::RoleDoesNotExist {
                            name: (*name).to_string(),
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            if role_ids.is_empty() {
                return Ok(None);
            }
            Ok(Some(Command::drop_roles(role_ids)))
        })
    }

    // ========================================================================
    // Membership
    // ========================================================================

    /// GRANT `role` TO `members`. The session's role is recorded as grantor.
    pub fn grant_role(&self, role: &str, members: &[&str]) -> Result<ExecuteResult> {
        self.catalog.execute(&self.principal, |ctx| {
            coordinator::plan_grant(ctx, role, members)
        })
    }

    /// REVOKE `role` FROM `members`.
    pub fn revoke_role(&self, role: &str, members: &[&str]) -> Result<ExecuteResult> {
        self.catalog.execute(&self.principal, |ctx| {
            coordinator::plan_revoke(ctx, role, members)
        })
    }

    // ========================================================================
    // Owned objects
    // ========================================================================

    /// CREATE DATABASE, owned by the session's role.
    pub fn create_database(&self, name: &str) -> Result<ExecuteResult> {
        let owner_id = self.principal.role_id;
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::CreateDatabase)?;
            Ok(Some(Command::create_database(name, owner_id)))
        })
    }

    /// CREATE CLUSTER, owned by the session's role.
    pub fn create_cluster(&self, name: &str) -> Result<ExecuteResult> {
        let owner_id = self.principal.role_id;
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::CreateCluster)?;
            Ok(Some(Command::create_cluster(name, owner_id)))
        })
    }

    /// CREATE CLUSTER REPLICA `cluster`.`replica`.
    pub fn create_cluster_replica(&self, cluster: &str, replica: &str) -> Result<ExecuteResult> {
        let owner_id = self.principal.role_id;
        self.catalog.execute(&self.principal, |ctx| {
            ctx.authorize(Operation::CreateClusterReplica)?;
            Ok(Some(Command::create_cluster_replica(
                cluster, replica, owner_id,
            )))
        })
    }

    // ========================================================================
    // System variables
    // ========================================================================

    /// ALTER SYSTEM SET enable_rbac_checks. Superuser only.
    pub fn set_enable_rbac_checks(&self, value: bool) -> Result<()> {
        self.catalog.set_enable_rbac_checks(&self.principal, value)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("principal", &self.principal)
            .finish_non_exhaustive()
    }
}
