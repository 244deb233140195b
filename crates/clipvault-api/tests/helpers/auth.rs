use super::TestApp;
use std::time::Duration;
use uuid::Uuid;

/// Test user with a bearer token signed by the app's JWT service.
pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

pub fn create_test_user(app: &TestApp) -> TestUser {
    let user_id = Uuid::new_v4();
    let token = app
        .state
        .jwt
        .issue(user_id, Duration::from_secs(3600))
        .expect("Failed to issue test token");
    TestUser { user_id, token }
}
