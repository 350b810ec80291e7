//! # rolegraph-types: Core types for `rolegraph`
//!
//! This crate contains shared types used across the `rolegraph` system:
//! - Role identity ([`RoleId`], [`RoleName`], [`Role`])
//! - Capability attributes ([`Attribute`], [`AttributeSet`], [`RoleAttributes`], [`AttributeDeltas`])
//! - Membership edges ([`MembershipEdge`])
//! - Reserved identities ([`MZ_SYSTEM_ROLE_ID`], [`PUBLIC_ROLE_NAME`], [`is_reserved_role_name`])
//! - Audit actions ([`AuditAction`])

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

// ============================================================================
// Role IDs - Copy (cheap tagged values)
// ============================================================================

/// Stable identifier for a role.
///
/// System roles are created at bootstrap and can never be granted, revoked,
/// altered, or dropped through the normal statement paths. `Public` is the
/// implicit pseudo-role every role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleId {
    System(u64),
    User(u64),
    Public,
}

impl RoleId {
    /// Returns true for roles created by statements (not bootstrap).
    pub fn is_user(&self) -> bool {
        matches!(self, RoleId::User(_))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, RoleId::System(_))
    }

    pub fn is_public(&self) -> bool {
        matches!(self, RoleId::Public)
    }

    /// Returns true if the role is excluded from GRANT/REVOKE/ALTER/DROP.
    pub fn is_reserved(&self) -> bool {
        !self.is_user()
    }
}

impl Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleId::System(id) => write!(f, "s{id}"),
            RoleId::User(id) => write!(f, "u{id}"),
            RoleId::Public => write!(f, "p"),
        }
    }
}

/// Error returned when a string is not a valid [`RoleId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleIdError(String);

impl Display for ParseRoleIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "couldn't parse role id '{}'", self.0)
    }
}

impl std::error::Error for ParseRoleIdError {}

impl FromStr for RoleId {
    type Err = ParseRoleIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRoleIdError(s.to_string());

        if s == "p" {
            return Ok(RoleId::Public);
        }

        let (kind, digits) = s.split_at_checked(1).ok_or_else(err)?;
        let id: u64 = digits.parse().map_err(|_| err())?;

        match kind {
            "s" => Ok(RoleId::System(id)),
            "u" => Ok(RoleId::User(id)),
            _ => Err(err()),
        }
    }
}

// ============================================================================
// Reserved identities
// ============================================================================

/// Name of the bootstrap superuser.
pub const MZ_SYSTEM_ROLE_NAME: &str = "mz_system";

/// ID of the bootstrap superuser.
pub const MZ_SYSTEM_ROLE_ID: RoleId = RoleId::System(1);

/// Name of the implicit pseudo-role every role is a member of.
pub const PUBLIC_ROLE_NAME: &str = "public";

/// Name prefixes that only system roles may use.
pub const RESERVED_ROLE_PREFIXES: [&str; 2] = ["mz_", "pg_"];

/// Returns whether `name` may not be used for a user role.
///
/// `PUBLIC` is matched case-insensitively since the SQL layer treats it as a
/// keyword; every other comparison is case-sensitive.
///
/// # Examples
///
/// ```
/// use rolegraph_types::is_reserved_role_name;
///
/// assert!(is_reserved_role_name("mz_system"));
/// assert!(is_reserved_role_name("PUBLIC"));
/// assert!(is_reserved_role_name("pg_monitor"));
/// assert!(!is_reserved_role_name("joe"));
/// ```
pub fn is_reserved_role_name(name: &str) -> bool {
    name.eq_ignore_ascii_case(PUBLIC_ROLE_NAME)
        || RESERVED_ROLE_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

// ============================================================================
// Role Name - Clone (contains String, but rarely cloned)
// ============================================================================

/// Name of a role. Case-sensitive and globally unique.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        is_reserved_role_name(&self.0)
    }
}

impl Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoleName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for RoleName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

// ============================================================================
// Attributes - Copy (bit flags)
// ============================================================================

/// A boolean capability that can be granted to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// Create, alter, and drop roles; grant and revoke role membership.
    CreateRole,
    /// Create databases.
    CreateDb,
    /// Create clusters and cluster replicas.
    CreateCluster,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [
        Attribute::CreateRole,
        Attribute::CreateDb,
        Attribute::CreateCluster,
    ];

    /// Returns the SQL keyword for this attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::CreateRole => "CREATEROLE",
            Attribute::CreateDb => "CREATEDB",
            Attribute::CreateCluster => "CREATECLUSTER",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Attribute::CreateRole => 0b001,
            Attribute::CreateDb => 0b010,
            Attribute::CreateCluster => 0b100,
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of [`Attribute`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AttributeSet(u8);

impl AttributeSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(0b111)
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.0 & attribute.bit() != 0
    }

    pub fn insert(&mut self, attribute: Attribute) {
        self.0 |= attribute.bit();
    }

    pub fn remove(&mut self, attribute: Attribute) {
        self.0 &= !attribute.bit();
    }

    /// Returns a copy of the set with `attribute` added.
    pub fn with(mut self, attribute: Attribute) -> Self {
        self.insert(attribute);
        self
    }

    pub fn union(self, other: AttributeSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_all(&self) -> bool {
        *self == Self::all()
    }

    pub fn iter(&self) -> impl Iterator<Item = Attribute> + '_ {
        Attribute::ALL.into_iter().filter(|a| self.contains(*a))
    }
}

impl Debug for AttributeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut set = AttributeSet::empty();
        for attribute in iter {
            set.insert(attribute);
        }
        set
    }
}

/// Attributes stored on a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAttributes {
    pub attributes: AttributeSet,
    /// Whether the role automatically uses the attributes of roles it is a
    /// member of.
    pub inherit: bool,
}

impl RoleAttributes {
    /// Creates attributes with no capabilities and INHERIT on.
    pub const fn new() -> Self {
        Self {
            attributes: AttributeSet::empty(),
            inherit: true,
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.insert(attribute);
        self
    }

    pub fn with_inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.attributes.contains(attribute)
    }
}

impl Default for RoleAttributes {
    fn default() -> Self {
        Self::new()
    }
}

/// Attribute changes requested by ALTER ROLE. `None` leaves the value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributeDeltas {
    pub create_role: Option<bool>,
    pub create_db: Option<bool>,
    pub create_cluster: Option<bool>,
    pub inherit: Option<bool>,
}

impl AttributeDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, attribute: Attribute, value: bool) -> Self {
        match attribute {
            Attribute::CreateRole => self.create_role = Some(value),
            Attribute::CreateDb => self.create_db = Some(value),
            Attribute::CreateCluster => self.create_cluster = Some(value),
        }
        self
    }

    pub fn inherit(mut self, value: bool) -> Self {
        self.inherit = Some(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the deltas on top of `current`.
    pub fn apply(&self, current: RoleAttributes) -> RoleAttributes {
        let mut next = current;
        let changes = [
            (Attribute::CreateRole, self.create_role),
            (Attribute::CreateDb, self.create_db),
            (Attribute::CreateCluster, self.create_cluster),
        ];
        for (attribute, change) in changes {
            match change {
                Some(true) => next.attributes.insert(attribute),
                Some(false) => next.attributes.remove(attribute),
                None => {}
            }
        }
        if let Some(inherit) = self.inherit {
            next.inherit = inherit;
        }
        next
    }
}

// ============================================================================
// Roles and Membership - Clone
// ============================================================================

/// A role record as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub attributes: RoleAttributes,
    /// Superusers bypass every attribute check.
    pub is_superuser: bool,
}

impl Role {
    pub fn new(id: RoleId, name: RoleName, attributes: RoleAttributes) -> Self {
        Self {
            id,
            name,
            attributes,
            is_superuser: false,
        }
    }

    /// Creates the bootstrap superuser record.
    pub fn mz_system() -> Self {
        Self {
            id: MZ_SYSTEM_ROLE_ID,
            name: RoleName::new(MZ_SYSTEM_ROLE_NAME),
            attributes: RoleAttributes {
                attributes: AttributeSet::all(),
                inherit: true,
            },
            is_superuser: true,
        }
    }

    /// Creates the PUBLIC pseudo-role record.
    pub fn public() -> Self {
        Self::new(
            RoleId::Public,
            RoleName::new(PUBLIC_ROLE_NAME),
            RoleAttributes::new(),
        )
    }
}

/// `member` is directly a member of `role`, granted by `grantor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MembershipEdge {
    pub role_id: RoleId,
    pub member_id: RoleId,
    pub grantor_id: RoleId,
}

// ============================================================================
// Audit Actions - Clone (for flexibility in logging)
// ============================================================================

/// Actions recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    RoleCreated {
        role_id: RoleId,
        name: RoleName,
        attributes: RoleAttributes,
    },
    RoleAltered {
        role_id: RoleId,
        before: RoleAttributes,
        after: RoleAttributes,
    },
    RoleDropped {
        role_id: RoleId,
        name: RoleName,
    },
    MembershipGranted(MembershipEdge),
    MembershipRevoked {
        role_id: RoleId,
        member_id: RoleId,
    },
    DatabaseCreated {
        name: String,
        owner_id: RoleId,
    },
    ClusterCreated {
        name: String,
        owner_id: RoleId,
    },
    ClusterReplicaCreated {
        cluster: String,
        replica: String,
        owner_id: RoleId,
    },
}
