use scholaris_auth::{TokenSubject, create_access_token, create_refresh_token, verify_refresh_token, verify_token};
use scholaris_config::JwtConfig;
use scholaris_core::permissions;
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
    }
}

#[test]
fn test_access_token_carries_school_and_permissions() {
    let jwt_config = get_test_jwt_config();
    let school_id = Uuid::new_v4();
    let subject = TokenSubject {
        user_id: Uuid::new_v4(),
        email: "warden@example.com",
        role: "staff",
        school_id: Some(school_id),
    };

    let token = create_access_token(&subject, &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, subject.user_id.to_string());
    assert_eq!(claims.school_id, Some(school_id));
    assert!(claims.permissions.contains(&permissions::HOSTEL_WRITE.to_string()));
    assert!(!claims.permissions.contains(&permissions::RADIO_WRITE.to_string()));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let jwt_config = get_test_jwt_config();
    let subject = TokenSubject {
        user_id: Uuid::new_v4(),
        email: "student@example.com",
        role: "student",
        school_id: Some(Uuid::new_v4()),
    };
    let token = create_access_token(&subject, &jwt_config).unwrap();

    let other = JwtConfig {
        secret: "another_secret".to_string(),
        ..get_test_jwt_config()
    };
    assert!(verify_token(&token, &other).is_err());
}

#[test]
fn test_refresh_token_roundtrip() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();
    let token = create_refresh_token(user_id, "parent@example.com", &jwt_config).unwrap();

    let claims = verify_refresh_token(&token, &jwt_config).unwrap();
    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.email, "parent@example.com");
}

#[test]
fn test_garbage_token_is_rejected() {
    assert!(verify_token("not-a-jwt", &get_test_jwt_config()).is_err());
}
