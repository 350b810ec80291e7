//! Notices returned alongside successful statements.

use std::fmt;

use rolegraph_kernel::KernelNotice;
use rolegraph_types::RoleName;
use serde::{Deserialize, Serialize};

/// A non-error message for the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notice {
    RoleMembershipAlreadyExists { role: RoleName, member: RoleName },
    RoleMembershipDoesNotExist { role: RoleName, member: RoleName },
    /// `DROP ROLE IF EXISTS` named a missing role.
    RoleDoesNotExist { name: String },
    /// A gated statement ran while `enable_rbac_checks` is off.
    RbacDisabled,
}

impl Notice {
    pub fn hint(&self) -> Option<String> {
        match self {
            Notice::RbacDisabled => Some(
                "To enable RBAC globally run `ALTER SYSTEM SET enable_rbac_checks TO TRUE` \
                as a superuser."
                    .into(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::RoleMembershipAlreadyExists { role, member } => {
                write!(f, "role \"{member}\" is already a member of role \"{role}\"")
            }
            Notice::RoleMembershipDoesNotExist { role, member } => {
                write!(f, "role \"{member}\" is not a member of role \"{role}\"")
            }
            Notice::RoleDoesNotExist { name } => {
                write!(f, "role \"{name}\" does not exist, skipping")
            }
            Notice::RbacDisabled => write!(
                f,
                "RBAC is disabled so no role attributes will be considered \
                when executing statements"
            ),
        }
    }
}

impl From<KernelNotice> for Notice {
    fn from(notice: KernelNotice) -> Self {
        match notice {
            KernelNotice::AlreadyMember { role, member } => {
                Notice::RoleMembershipAlreadyExists { role, member }
            }
            KernelNotice::NotMember { role, member } => {
                Notice::RoleMembershipDoesNotExist { role, member }
            }
        }
    }
}
