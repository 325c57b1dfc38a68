//! Integration tests for backend selection from environment-style settings

use anf_storage::{BackendSelector, ErrorKind, StorageError, StorageSettings};

fn settings(vars: &[(&str, &str)]) -> StorageSettings {
    StorageSettings::from_vars(vars.iter().copied()).unwrap()
}

#[tokio::test]
async fn test_blob_backend_is_not_selected() {
    let selector = BackendSelector::new();
    assert!(selector.select(&settings(&[])).await.unwrap().is_none());
    assert!(selector
        .select(&settings(&[("STORAGE_BACKEND", "blob")]))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_enabled_without_endpoint_is_unconfigured() {
    let s = settings(&[
        ("STORAGE_BACKEND", "ANF"),
        ("ANF_ACCESS_KEY", "AKIA"),
        ("ANF_SECRET_KEY", "secret"),
    ]);
    assert!(BackendSelector::new().select(&s).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_secret_is_configuration_error() {
    let s = settings(&[
        ("STORAGE_BACKEND", "anf"),
        ("ANF_OBJECT_API_ENDPOINT", "https://acct.blob.netapp.azure.com"),
        ("ANF_ACCESS_KEY", "AKIA"),
    ]);

    let err = BackendSelector::new().select(&s).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("ANF_SECRET_KEY"));
}

#[tokio::test]
async fn test_unsupported_auth_type() {
    let s = settings(&[
        ("STORAGE_BACKEND", "anf"),
        ("ANF_OBJECT_API_ENDPOINT", "https://acct.blob.netapp.azure.com"),
        ("ANF_AUTH_TYPE", "managed_identity"),
    ]);

    let err = BackendSelector::new().select(&s).await.unwrap_err();
    assert!(matches!(err, StorageError::Configuration(_)));
}

#[tokio::test]
async fn test_invalid_endpoint() {
    let s = settings(&[
        ("STORAGE_BACKEND", "s3"),
        ("ANF_OBJECT_API_ENDPOINT", "::not a url::"),
        ("ANF_ACCESS_KEY", "AKIA"),
        ("ANF_SECRET_KEY", "secret"),
    ]);
    assert!(BackendSelector::new().select(&s).await.is_err());
}

#[tokio::test]
async fn test_memory_backend_from_manifest() {
    let s = StorageSettings::from_toml_str("backend = \"memory\"\n").unwrap();
    let facade = BackendSelector::new().select(&s).await.unwrap().unwrap();

    assert!(facade.create_bucket("m").await.unwrap());
    facade.upload_bytes("hello", "m", "a.txt", None).await.unwrap();
    assert_eq!(facade.get_object_content("m", "a.txt").await, "hello");
}

#[cfg(feature = "s3-native")]
#[tokio::test]
async fn test_object_store_selected_from_manifest() {
    let manifest = r#"
        backend = "anf"
        endpoint = "http://127.0.0.1:9000"
        access_key = "AKIA"
        secret_key = "secret"
        timeout_seconds = 30
    "#;
    let s = StorageSettings::from_toml_str(manifest).unwrap();
    let facade = BackendSelector::new().select(&s).await.unwrap().unwrap();
    assert_eq!(facade.backend_name(), "s3");
}

#[tokio::test]
async fn test_bad_object_store_tunables_ignored_for_blob() {
    let s = StorageSettings::from_vars([
        ("STORAGE_BACKEND", "blob"),
        ("ANF_TIMEOUT_SECONDS", "soon"),
    ])
    .unwrap();
    assert!(BackendSelector::new().select(&s).await.unwrap().is_none());
}

#[tokio::test]
async fn test_blank_secret_in_json_manifest_rejected() {
    let s = StorageSettings::from_json_str(
        r#"{
            "type": "anf_storage",
            "endpoint": "https://acct.blob.netapp.azure.com",
            "auth": {"type": "key", "access_key": "AKIA", "secret_key": ""}
        }"#,
    )
    .unwrap();

    let err = BackendSelector::new().select(&s).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[cfg(feature = "s3-native")]
#[tokio::test]
async fn test_object_store_selected_from_plugin_manifest() {
    let s = StorageSettings::from_json_str(
        r#"{
            "name": "anf_storage_plugin",
            "type": "anf_storage",
            "endpoint": "http://127.0.0.1:9000",
            "auth": {"type": "key", "access_key": "AKIA", "secret_key": "secret"}
        }"#,
    )
    .unwrap();

    let facade = BackendSelector::new().select(&s).await.unwrap().unwrap();
    assert_eq!(facade.backend_name(), "s3");
}
