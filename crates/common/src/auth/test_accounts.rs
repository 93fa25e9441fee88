use crate::domain::{User, UserRole};
use chrono::{DateTime, Utc};

pub const ADMIN_TEST_EMAIL: &str = "admin@gmail.com";
pub const VOLUNTEER_TEST_EMAIL: &str = "volunteer@gmail.com";
pub const NGO_TEST_EMAIL: &str = "ngo@gmail.com";

/// Shared password of every test account
pub const TEST_ACCOUNT_PASSWORD: &str = "password";

/// Role configured for a designated test address
pub fn test_account_role(email: &str) -> Option<UserRole> {
    match email {
        ADMIN_TEST_EMAIL => Some(UserRole::Admin),
        VOLUNTEER_TEST_EMAIL => Some(UserRole::Volunteer),
        NGO_TEST_EMAIL => Some(UserRole::Ngo),
        _ => None,
    }
}

/// Build the user a test login signs in as; never touches the provider
pub fn fabricate_test_user(email: &str, role: UserRole, now: DateTime<Utc>) -> User {
    let name = match role {
        UserRole::Admin => "Test Admin",
        UserRole::Ngo => "Test Organization",
        UserRole::Volunteer => "Test Volunteer",
    };

    User {
        id: format!("test-{}", role.as_ref()),
        name: name.to_string(),
        email: email.to_string(),
        role,
        profile_image: None,
        location: None,
        bio: None,
        created_at: now,
    }
}
