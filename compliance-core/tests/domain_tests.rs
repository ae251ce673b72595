use compliance_core::domain::*;
use compliance_core::CoreError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use uuid::Uuid;

// ===== ID Tests =====

#[test]
fn test_user_id_conversions() {
    let uuid = Uuid::new_v4();
    let id = UserId::from(uuid);

    assert_eq!(*id.as_uuid(), uuid);
    assert_eq!(id.to_string(), uuid.to_string());

    let back: Uuid = id.into();
    assert_eq!(back, uuid);
}

#[test]
fn test_user_id_serializes_as_bare_uuid() {
    let uuid = Uuid::new_v4();
    assert_eq!(serde_json::to_value(UserId(uuid)).unwrap(), json!(uuid.to_string()));
}

// ===== Role Tests =====

#[rstest]
#[case("SUPER_ADMIN", Role::SuperAdmin)]
#[case("admin", Role::Admin)]
#[case("Manager", Role::Manager)]
#[case("CONTRACTOR", Role::Contractor)]
#[case("subcontractor", Role::Subcontractor)]
#[case("  BROKER\t", Role::Broker)]
#[case("user", Role::User)]
fn test_role_from_str(#[case] input: &str, #[case] expected: Role) {
    assert_eq!(input.parse::<Role>().unwrap(), expected);
}

#[rstest]
#[case("")]
#[case("ROOT")]
#[case("SUPER ADMIN")]
#[case("SUPERADMIN")]
fn test_unknown_role(#[case] input: &str) {
    assert_eq!(
        input.parse::<Role>(),
        Err(CoreError::UnknownRole(input.to_string()))
    );
}

#[test]
fn test_role_wire_name_matches_serde() {
    for role in Role::ALL {
        assert_eq!(serde_json::to_value(role).unwrap(), json!(role.as_str()));
    }
}

// ===== Principal Tests =====

#[test]
fn test_principal_json_shape() {
    let user_id = UserId::new();
    let principal = Principal::new(user_id, "broker@example.com", Role::Broker);

    assert_eq!(
        serde_json::to_value(&principal).unwrap(),
        json!({
            "user_id": user_id.to_string(),
            "email": "broker@example.com",
            "role": "BROKER",
        })
    );
}

// ===== Policy Tests =====

#[test]
fn test_empty_and_absent_roles_differ() {
    let absent = OperationPolicy::authenticated();
    let empty = OperationPolicy {
        required_roles: Some(RequiredRoles::nobody()),
        is_public: false,
    };

    assert_ne!(absent, empty);
    assert!(absent.required_roles.is_none());
    assert!(empty.required_roles.as_ref().is_some_and(RequiredRoles::is_empty));
}

#[test]
fn test_policy_deserializes_role_list() {
    let policy: OperationPolicy = serde_json::from_value(json!({
        "required_roles": ["ADMIN", "MANAGER"],
        "is_public": false,
    }))
    .unwrap();

    let roles = policy.required_roles.unwrap();
    assert!(roles.contains(Role::Admin));
    assert!(roles.contains(Role::Manager));
    assert!(!roles.contains(Role::SuperAdmin));
}

#[test]
fn test_policy_deserializes_explicit_null_and_empty() {
    let open: OperationPolicy =
        serde_json::from_value(json!({ "required_roles": null, "is_public": false })).unwrap();
    let closed: OperationPolicy =
        serde_json::from_value(json!({ "required_roles": [], "is_public": false })).unwrap();

    assert_eq!(open.required_roles, None);
    assert_eq!(closed.required_roles, Some(RequiredRoles::nobody()));
}

#[test]
fn test_required_roles_collect() {
    let roles: RequiredRoles = [Role::Broker, Role::Broker, Role::User].into_iter().collect();
    assert_eq!(roles.iter().count(), 2);
}
