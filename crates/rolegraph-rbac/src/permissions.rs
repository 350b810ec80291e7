#![allow(clippy::match_same_arms)]
//! Attribute-gated operations.
//!
//! Every privileged statement maps to exactly one required [`Attribute`]
//! through a fixed table.

use std::fmt::Display;

use rolegraph_types::Attribute;
use serde::{Deserialize, Serialize};

/// A privileged operation checked by the authorization gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    CreateRole,
    AlterRole,
    DropRole,
    GrantRole,
    RevokeRole,
    CreateDatabase,
    CreateCluster,
    CreateClusterReplica,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::CreateRole,
        Operation::AlterRole,
        Operation::DropRole,
        Operation::GrantRole,
        Operation::RevokeRole,
        Operation::CreateDatabase,
        Operation::CreateCluster,
        Operation::CreateClusterReplica,
    ];

    /// Returns the attribute a non-superuser needs to perform this operation.
    pub fn required_attribute(&self) -> Attribute {
        match self {
            Operation::CreateRole => Attribute::CreateRole,
            Operation::AlterRole => Attribute::CreateRole,
            Operation::DropRole => Attribute::CreateRole,
            Operation::GrantRole => Attribute::CreateRole,
            Operation::RevokeRole => Attribute::CreateRole,
            Operation::CreateDatabase => Attribute::CreateDb,
            Operation::CreateCluster => Attribute::CreateCluster,
            Operation::CreateClusterReplica => Attribute::CreateCluster,
        }
    }

    /// Returns the action phrase used in error messages
    /// ("permission denied to <action>").
    pub fn action(&self) -> &'static str {
        match self {
            Operation::CreateRole => "create role",
            Operation::AlterRole => "alter role",
            Operation::DropRole => "drop role",
            Operation::GrantRole => "grant role",
            Operation::RevokeRole => "revoke role",
            Operation::CreateDatabase => "create database",
            Operation::CreateCluster => "create cluster",
            Operation::CreateClusterReplica => "create cluster replica",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.action())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Operation::CreateRole, Attribute::CreateRole)]
    #[test_case(Operation::AlterRole, Attribute::CreateRole)]
    #[test_case(Operation::DropRole, Attribute::CreateRole)]
    #[test_case(Operation::GrantRole, Attribute::CreateRole)]
    #[test_case(Operation::RevokeRole, Attribute::CreateRole)]
    #[test_case(Operation::CreateDatabase, Attribute::CreateDb)]
    #[test_case(Operation::CreateCluster, Attribute::CreateCluster)]
    #[test_case(Operation::CreateClusterReplica, Attribute::CreateCluster)]
    fn operation_requires_attribute(operation: Operation, attribute: Attribute) {
        assert_eq!(operation.required_attribute(), attribute);
    }

    #[test]
    fn every_attribute_gates_something() {
        for attribute in Attribute::ALL {
            assert!(
                Operation::ALL
                    .iter()
                    .any(|op| op.required_attribute() == attribute)
            );
        }
    }

    #[test]
    fn actions_are_lowercase_phrases() {
        for op in Operation::ALL {
            assert_eq!(op.action(), op.action().to_lowercase());
            assert_eq!(op.to_string(), op.action());
        }
    }
}
