//! Integration tests for the Firestore REST backend against a mock server

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use review_seeder::config::FirestoreConfig;
use review_seeder::db::{DocumentStore, FirestoreStore, WriteOp, ARTISTS, USERS};
use review_seeder::error::AppError;

const COMMIT_PATH: &str = "/v1/projects/demo/databases/(default)/documents:commit";
const DOC_PREFIX: &str = "projects/demo/databases/(default)/documents";

fn firestore_config() -> FirestoreConfig {
    FirestoreConfig {
        project_id: "demo".to_string(),
        database_id: "(default)".to_string(),
        access_token: None,
        emulator_host: None,
    }
}

async fn store_for(server: &MockServer) -> FirestoreStore {
    FirestoreStore::with_base_url(
        &format!("{}/v1", server.uri()),
        &firestore_config(),
        Some("test-token".to_string()),
    )
    .unwrap()
}

fn fields(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_commit_sends_merge_writes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "writes": [{
                "update": {
                    "name": format!("{}/artists/4242", DOC_PREFIX),
                    "fields": {
                        "id": { "integerValue": "4242" },
                        "name": { "stringValue": "The Fixtures" }
                    }
                },
                "updateMask": { "fieldPaths": ["id", "name"] },
                "updateTransforms": [
                    { "fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME" }
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}],
            "commitTime": "2024-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    store
        .commit(vec![WriteOp {
            collection: ARTISTS,
            doc_id: "4242".to_string(),
            fields: fields(json!({ "id": 4242, "name": "The Fixtures" })),
            server_timestamps: vec!["createdAt"],
        }])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_commit_error_is_storage_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = store
        .commit(vec![WriteOp {
            collection: USERS,
            doc_id: "u1".to_string(),
            fields: fields(json!({ "bio": "x" })),
            server_timestamps: vec![],
        }])
        .await
        .unwrap_err();

    match err {
        AppError::Storage(msg) => assert!(msg.contains("PERMISSION_DENIED")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_update_requires_existing_document() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(COMMIT_PATH))
        .and(body_partial_json(json!({
            "writes": [{
                "currentDocument": { "exists": true },
                "updateMask": { "fieldPaths": ["username", "usernameLowercase"] }
            }]
        })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let err = store
        .update(
            USERS,
            "ghost",
            fields(json!({ "username": "Foo", "usernameLowercase": "foo" })),
            &["updatedAt"],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_get_decodes_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/{}/users/u1", DOC_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": format!("{}/users/u1", DOC_PREFIX),
            "fields": {
                "username": { "stringValue": "Foo" },
                "usernameLowercase": { "stringValue": "foo" },
                "followersCount": { "integerValue": "0" },
                "updatedAt": { "timestampValue": "2024-01-01T00:00:00Z" }
            },
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    let doc = store.get(USERS, "u1").await.unwrap().unwrap();

    assert_eq!(
        Value::Object(doc),
        json!({
            "username": "Foo",
            "usernameLowercase": "foo",
            "followersCount": 0,
            "updatedAt": "2024-01-01T00:00:00Z"
        })
    );
}

#[tokio::test]
async fn test_get_missing_document() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v1/{}/users/nobody", DOC_PREFIX)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = store_for(&server).await;
    assert_eq!(store.get(USERS, "nobody").await.unwrap(), None);
}
