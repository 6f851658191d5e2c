//! Authentication test helpers

use notecollab::backend::auth::sessions::create_token;
use notecollab::shared::{Identity, Role};

/// Secret shared by every test server and token
pub const TEST_SECRET: &str = "integration-test-secret";

/// Generate a test JWT token
pub fn token_for(user_id: &str) -> String {
    create_token(
        TEST_SECRET,
        user_id,
        &format!("{}@example.com", user_id),
        Some(user_id),
        3600,
    )
    .expect("Failed to create test token")
}

pub fn user(id: &str) -> Identity {
    Identity::Authenticated {
        id: id.to_string(),
        name: id.to_string(),
        email: format!("{}@example.com", id),
        role: Role::User,
    }
}

pub fn guest(id: &str, name: &str) -> Identity {
    Identity::Guest {
        id: id.to_string(),
        name: name.to_string(),
    }
}
