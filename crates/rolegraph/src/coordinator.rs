//! Grant/Revoke Coordinator.
//!
//! Validates a multi-target GRANT or REVOKE against one catalog snapshot and
//! produces a single kernel command. Nothing is applied unless every
//! precondition holds for every named role.

use rolegraph_kernel::{Command, KernelError};
use rolegraph_rbac::Operation;
use rolegraph_types::RoleId;
use tracing::debug;

use crate::catalog::StatementContext;
use crate::error::Result;

/// Plans `GRANT role TO members`.
pub(crate) fn plan_grant(
    ctx: &mut StatementContext<'_>,
    role: &str,
    members: &[&str],
) -> Result<Option<Command>> {
    let (role_id, member_ids) = validate(ctx, Operation::GrantRole, role, members)?;
    let grantor_id = ctx.principal.role_id;
    debug!(%role_id, members = member_ids.len(), %grantor_id, "grant planned");
    Ok(Some(Command::grant_role(role_id, member_ids, grantor_id)))
}

/// Plans `REVOKE role FROM members`.
pub(crate) fn plan_revoke(
    ctx: &mut StatementContext<'_>,
    role: &str,
    members: &[&str],
) -> Result<Option<Command>> {
    let (role_id, member_ids) = validate(ctx, Operation::RevokeRole, role, members)?;
    debug!(%role_id, members = member_ids.len(), "revoke planned");
    Ok(Some(Command::revoke_role(role_id, member_ids)))
}

/// Checks, in order: the CREATEROLE gate, name resolution for every
/// endpoint, then reserved endpoints.
fn validate(
    ctx: &mut StatementContext<'_>,
    operation: Operation,
    role: &str,
    members: &[&str],
) -> Result<(RoleId, Vec<RoleId>)> {
    ctx.authorize(operation)?;

    let role_id = ctx.resolve(role)?;
    let member_ids = members
        .iter()
        .map(|name| ctx.resolve(name))
        .collect::<Result<Vec<_>>>()?;

    for id in std::iter::once(&role_id).chain(&member_ids) {
        if id.is_reserved() {
            let name = ctx
                .state
                .get_role(id)
                .map(|r| r.name.clone())
                .ok_or(KernelError::RoleNotFound(*id))?;
            return Err(KernelError::ReservedRoleName(name).into());
        }
    }

    Ok((role_id, member_ids))
}
