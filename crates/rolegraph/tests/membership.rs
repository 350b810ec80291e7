//! Membership graph behavior through GRANT, REVOKE and DROP ROLE.

use std::sync::Arc;

use proptest::prelude::*;
use rolegraph::{
    Attribute, AuditAction, Catalog, KernelError, MZ_SYSTEM_ROLE_ID, Notice, RoleAttributes,
    RoleId, RoleMemberRow, RolegraphError, Session,
};
use test_case::test_case;

/// A catalog with user roles created by the superuser, in order.
fn catalog_with(roles: &[&str]) -> (Catalog, Session) {
    let catalog = Catalog::new();
    let admin = catalog.system_session();
    for name in roles {
        admin.create_role(name, RoleAttributes::new()).unwrap();
    }
    (catalog, admin)
}

fn id(catalog: &Catalog, name: &str) -> RoleId {
    catalog.snapshot().unwrap().lookup(name).unwrap().id
}

// ============================================================================
// Cycles
// ============================================================================

#[test]
fn self_grant_is_rejected() {
    let (catalog, admin) = catalog_with(&["joe"]);

    let err = admin.grant_role("joe", &["joe"]).unwrap_err();

    assert!(matches!(
        err,
        RolegraphError::Kernel(KernelError::CircularRoleMembership { .. })
    ));
    assert_eq!(err.summary(), "role 'joe' is a member of role 'joe'");
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

#[test]
fn transitive_cycle_is_rejected() {
    // group1 is a member of group2, which is a member of joe.
    let (catalog, admin) = catalog_with(&["joe", "group1", "group2"]);
    admin.grant_role("joe", &["group2"]).unwrap();
    admin.grant_role("group2", &["group1"]).unwrap();

    let err = admin.grant_role("group1", &["joe"]).unwrap_err();

    assert_eq!(err.summary(), "role 'group1' is a member of role 'joe'");
    assert_eq!(catalog.mz_role_members().unwrap().len(), 2);
}

#[test]
fn transitive_member_cannot_be_granted_directly() {
    // joe ∈ mid ∈ group1
    let (catalog, admin) = catalog_with(&["group1", "mid", "joe"]);
    admin.grant_role("group1", &["mid"]).unwrap();
    admin.grant_role("mid", &["joe"]).unwrap();

    let err = admin.grant_role("group1", &["joe"]).unwrap_err();

    assert!(matches!(
        err,
        RolegraphError::Kernel(KernelError::CircularRoleMembership { .. })
    ));
    assert_eq!(err.summary(), "role 'joe' is a member of role 'group1'");
    assert_eq!(catalog.mz_role_members().unwrap().len(), 2);
}

#[test]
fn diamond_closing_edge_is_allowed() {
    // joe ∈ left ∈ top and right ∈ top; joe does not reach right yet.
    let (catalog, admin) = catalog_with(&["top", "left", "right", "joe"]);
    admin.grant_role("top", &["left", "right"]).unwrap();
    admin.grant_role("left", &["joe"]).unwrap();

    let result = admin.grant_role("right", &["joe"]).unwrap();

    assert!(result.notices.is_empty());
    assert_eq!(catalog.mz_role_members().unwrap().len(), 4);
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn redundant_grant_is_a_noop_with_notice() {
    let (catalog, admin) = catalog_with(&["group", "joe", "ops"]);
    admin.grant_role("group", &["joe"]).unwrap();

    // ops can manage roles but is a different grantor
    admin
        .alter_role(
            "ops",
            rolegraph::AttributeDeltas::new().set(Attribute::CreateRole, true),
        )
        .unwrap();
    let ops = catalog.session("ops").unwrap();
    let result = ops.grant_role("group", &["joe"]).unwrap();

    assert_eq!(
        result.notice_messages(),
        vec!["role \"joe\" is already a member of role \"group\"".to_string()]
    );
    assert_eq!(
        catalog.mz_role_members().unwrap(),
        vec![RoleMemberRow {
            role_id: id(&catalog, "group"),
            member: id(&catalog, "joe"),
            grantor: MZ_SYSTEM_ROLE_ID,
        }]
    );
}

#[test]
fn revoking_non_member_is_a_noop_with_notice() {
    let (catalog, admin) = catalog_with(&["group", "joe"]);
    let before = catalog.audit_log().unwrap().len();

    let result = admin.revoke_role("group", &["joe"]).unwrap();

    assert_eq!(
        result.notices,
        vec![Notice::RoleMembershipDoesNotExist {
            role: "group".into(),
            member: "joe".into(),
        }]
    );
    assert_eq!(catalog.audit_log().unwrap().len(), before);
}

#[test]
fn revoke_removes_only_named_edges() {
    let (catalog, admin) = catalog_with(&["group", "a", "b", "c"]);
    admin.grant_role("group", &["a", "b", "c"]).unwrap();

    admin.revoke_role("group", &["a", "c"]).unwrap();

    let members: Vec<RoleId> = catalog
        .mz_role_members()
        .unwrap()
        .into_iter()
        .map(|row| row.member)
        .collect();
    assert_eq!(members, vec![id(&catalog, "b")]);
}

// ============================================================================
// Multi-target atomicity
// ============================================================================

#[test]
fn grant_with_unknown_member_applies_nothing() {
    let (catalog, admin) = catalog_with(&["g", "a", "b"]);

    let err = admin.grant_role("g", &["a", "b", "unknown"]).unwrap_err();

    assert_eq!(err.summary(), "unknown role 'unknown'");
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

#[test]
fn grant_with_reserved_member_applies_nothing() {
    let (catalog, admin) = catalog_with(&["g", "a", "b"]);

    let err = admin.grant_role("g", &["a", "b", "mz_system"]).unwrap_err();

    assert_eq!(err.summary(), "role name 'mz_system' is reserved");
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

#[test]
fn grant_with_cycle_in_later_member_applies_nothing() {
    let (catalog, admin) = catalog_with(&["g", "a", "b"]);

    let err = admin.grant_role("g", &["a", "b", "g"]).unwrap_err();

    assert!(matches!(
        err,
        RolegraphError::Kernel(KernelError::CircularRoleMembership { .. })
    ));
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

#[test]
fn unknown_name_is_reported_before_reserved_name() {
    let (_catalog, admin) = catalog_with(&["g"]);
    let err = admin.grant_role("g", &["public", "ghost"]).unwrap_err();
    assert_eq!(err.summary(), "unknown role 'ghost'");
}

#[test]
fn permission_is_checked_before_names() {
    let (catalog, _admin) = catalog_with(&["joe"]);
    let joe = catalog.session("joe").unwrap();

    let err = joe.grant_role("ghost", &["nobody"]).unwrap_err();
    assert_eq!(err.summary(), "permission denied to grant role");
}

// ============================================================================
// Reserved identities
// ============================================================================

#[test_case("mz_system", "joe" ; "reserved role")]
#[test_case("public", "joe" ; "public role")]
#[test_case("joe", "mz_system" ; "reserved member")]
#[test_case("joe", "public" ; "public member")]
fn reserved_endpoints_are_rejected(role: &str, member: &str) {
    let (catalog, admin) = catalog_with(&["joe"]);
    let reserved = if role == "joe" { member } else { role };

    let grant = admin.grant_role(role, &[member]).unwrap_err();
    let revoke = admin.revoke_role(role, &[member]).unwrap_err();

    for err in [grant, revoke] {
        assert_eq!(err.summary(), format!("role name '{reserved}' is reserved"));
    }
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

#[test_case("mz_system")]
#[test_case("public")]
fn reserved_roles_cannot_be_dropped(name: &str) {
    let catalog = Catalog::new();
    catalog
        .system_session()
        .create_role("ops", RoleAttributes::new().with_attribute(Attribute::CreateRole))
        .unwrap();
    let ops = catalog.session("ops").unwrap();

    let err = ops.drop_roles(&[name], false).unwrap_err();
    assert_eq!(err.summary(), format!("role name '{name}' is reserved"));
}

#[test_case("mz_joe")]
#[test_case("pg_joe")]
#[test_case("PUBLIC")]
fn reserved_names_cannot_be_created(name: &str) {
    let catalog = Catalog::new();
    let err = catalog
        .system_session()
        .create_role(name, RoleAttributes::new())
        .unwrap_err();
    assert_eq!(err.summary(), format!("role name '{name}' is reserved"));
}

#[test]
fn duplicate_role_name_is_rejected() {
    let (_catalog, admin) = catalog_with(&["joe"]);
    let err = admin.create_role("joe", RoleAttributes::new()).unwrap_err();
    assert_eq!(err.summary(), "role 'joe' already exists");
}

// ============================================================================
// DROP ROLE
// ============================================================================

#[test]
fn drop_cascades_memberships() {
    let (catalog, admin) = catalog_with(&["group", "x", "y"]);
    admin.grant_role("group", &["x", "y"]).unwrap();
    admin.grant_role("x", &["y"]).unwrap();
    let x = id(&catalog, "x");

    admin.drop_roles(&["x"], false).unwrap();

    let rows = catalog.mz_role_members().unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows.iter().all(|row| row.role_id != x && row.member != x));
    assert!(catalog.audit_log().unwrap().contains(&AuditAction::RoleDropped {
        role_id: x,
        name: "x".into(),
    }));
}

#[test]
fn drop_if_exists_skips_missing_roles() {
    let (catalog, admin) = catalog_with(&["a"]);

    let result = admin.drop_roles(&["a", "ghost"], true).unwrap();

    assert_eq!(
        result.notices,
        vec![Notice::RoleDoesNotExist {
            name: "ghost".to_string()
        }]
    );
    assert!(catalog.snapshot().unwrap().lookup("a").is_none());
}

#[test]
fn drop_without_if_exists_is_all_or_nothing() {
    let (catalog, admin) = catalog_with(&["a"]);

    let err = admin.drop_roles(&["a", "ghost"], false).unwrap_err();

    assert_eq!(err.summary(), "unknown role 'ghost'");
    assert!(catalog.snapshot().unwrap().lookup("a").is_some());
}

#[test]
fn current_role_cannot_be_dropped() {
    let catalog = Catalog::new();
    catalog
        .system_session()
        .create_role("ops", RoleAttributes::new().with_attribute(Attribute::CreateRole))
        .unwrap();
    let ops = catalog.session("ops").unwrap();

    let err = ops.drop_roles(&["ops"], false).unwrap_err();
    assert!(matches!(err, RolegraphError::CurrentRoleCannotBeDropped));
}

#[test]
fn role_owning_objects_cannot_be_dropped() {
    let catalog = Catalog::new();
    let admin = catalog.system_session();
    admin
        .create_role("joe", RoleAttributes::new().with_attribute(Attribute::CreateDb))
        .unwrap();
    catalog.session("joe").unwrap().create_database("db").unwrap();

    let err = admin.drop_roles(&["joe"], false).unwrap_err();

    assert_eq!(
        err.summary(),
        "role 'joe' cannot be dropped because some objects depend on it"
    );
    assert!(err.hint().is_some());
}

#[test]
fn grantor_of_surviving_edge_cannot_be_dropped() {
    let catalog = Catalog::new();
    let admin = catalog.system_session();
    admin
        .create_role("ops", RoleAttributes::new().with_attribute(Attribute::CreateRole))
        .unwrap();
    admin.create_role("g", RoleAttributes::new()).unwrap();
    admin.create_role("m", RoleAttributes::new()).unwrap();
    catalog
        .session("ops")
        .unwrap()
        .grant_role("g", &["m"])
        .unwrap();

    let err = admin.drop_roles(&["ops"], false).unwrap_err();
    assert_eq!(
        err.summary(),
        "cannot drop role 'ops': still depended upon by membership of role 'm' in role 'g'"
    );

    // Dropping the member in the same statement removes the edge first.
    admin.drop_roles(&["ops", "m"], false).unwrap();
    assert!(catalog.mz_role_members().unwrap().is_empty());
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn snapshot_never_sees_partial_grant() {
    let (catalog, admin) = catalog_with(&["g", "a", "b", "c"]);
    let before = catalog.snapshot().unwrap();

    admin.grant_role("g", &["a", "b", "c"]).unwrap();

    assert_eq!(before.membership().edge_count(), 0);
    assert_eq!(catalog.snapshot().unwrap().membership().edge_count(), 3);
}

#[test]
fn concurrent_sessions_serialize() {
    let (catalog, admin) = catalog_with(&["g"]);
    for i in 0..8 {
        admin
            .create_role(&format!("m{i}"), RoleAttributes::new())
            .unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let session = catalog.system_session();
            let member = format!("m{i}");
            std::thread::spawn(move || session.grant_role("g", &[member.as_str()]))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let snapshot: Arc<_> = catalog.snapshot().unwrap();
    assert_eq!(snapshot.membership().edge_count(), 8);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever grants are attempted, no role ever reaches itself and every
    /// failed grant leaves the graph untouched.
    #[test]
    fn grants_never_create_cycles(
        grants in prop::collection::vec((0usize..5, prop::collection::vec(0usize..5, 1..4)), 0..30)
    ) {
        let names = ["r0", "r1", "r2", "r3", "r4"];
        let (catalog, admin) = catalog_with(&names);

        for (role, members) in grants {
            let members: Vec<&str> = members.iter().map(|m| names[*m]).collect();
            let before = catalog.snapshot().unwrap();
            if admin.grant_role(names[role], &members).is_err() {
                let after = catalog.snapshot().unwrap();
                prop_assert!(Arc::ptr_eq(&before, &after));
            }
        }

        let state = catalog.snapshot().unwrap();
        for name in names {
            let id = state.lookup(name).unwrap().id;
            prop_assert!(!state.membership().ancestors_of(id).contains(&id));
        }
    }
}
