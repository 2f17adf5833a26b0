//! Test utilities for Review Seeder
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory document stores (one per test)
//! - AppState factories
//! - Test data generators

use std::sync::Arc;

use crate::{
    config::{Config, StorageBackend},
    db::{Fields, MemoryStore, User, WriteOp},
    state::AppState,
};

pub const TEST_SEED_KEY: &str = "test-seed-key";

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 3000,
        seed_key: TEST_SEED_KEY.to_string(),
        storage: StorageBackend::Memory,
    }
}

/// Create a test AppState backed by a fresh in-memory store.
/// Returns the store as well so tests can inspect what was written.
pub fn setup_test_app_state() -> (AppState, Arc<MemoryStore>) {
    setup_test_app_state_with_store(MemoryStore::new())
}

pub fn setup_test_app_state_with_store(store: MemoryStore) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(store);
    (AppState::new(store.clone(), test_config()), store)
}

// ============================================================================
// Test Data Factories
// ============================================================================

/// Store a user document the way a seed run would write it
pub fn create_test_user(store: &MemoryStore, id: &str, username: &str, name: &str) -> User {
    let user = User::new(
        id.to_string(),
        username.to_string(),
        name.to_string(),
        "Test bio".to_string(),
        format!("https://i.pravatar.cc/300?u={}", id),
    );

    let write = WriteOp::merge_set(&user).expect("Failed to serialize test user");
    let mut fields: Fields = write.fields;
    fields.insert(
        "createdAt".to_string(),
        serde_json::Value::String("2024-01-01T00:00:00Z".to_string()),
    );
    store.insert(write.collection, &write.doc_id, fields);

    user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DocumentStore, USERS};

    #[tokio::test]
    async fn test_create_test_user() {
        let store = MemoryStore::new();
        let user = create_test_user(&store, "u1", "TestUser", "Test User");

        let doc = store.get(USERS, "u1").await.unwrap().unwrap();
        assert_eq!(doc["username"], "TestUser");
        assert_eq!(doc["usernameLowercase"], "testuser");
        assert_eq!(doc["nameLowercase"], user.name_lowercase);
    }

    #[test]
    fn test_parallel_stores() {
        let (_, store1) = setup_test_app_state();
        let (_, store2) = setup_test_app_state();

        create_test_user(&store1, "u1", "one", "One");

        assert_eq!(store1.count(USERS), 1);
        assert_eq!(store2.count(USERS), 0);
    }
}
