use recipedb_core::config::RemoteSettings;
use recipedb_core::traits::EmbeddingProvider;
use recipedb_core::Error;
use recipedb_embed::RemoteEmbedder;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, dim: usize) -> RemoteSettings {
    RemoteSettings {
        endpoint: format!("{}/v1/embeddings", server.uri()),
        model: "text-embedding-3-large".into(),
        dim,
        api_key: Some("sk-test".into()),
        api_key_env: "RECIPEDB_TEST_UNSET_KEY".into(),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn posts_request_and_normalizes_first_embedding() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "input": "chicken karahi",
            "model": "text-embedding-3-large",
            "encoding_format": "float"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": [3.0, 4.0] }],
            "model": "text-embedding-3-large"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = RemoteEmbedder::new(&settings(&server, 2)).unwrap();
    let v = embedder.embed("chicken karahi").await.unwrap();
    assert!((v[0] - 0.6).abs() < 1e-5);
    assert!((v[1] - 0.8).abs() < 1e-5);
    assert_eq!(embedder.embedder_id(), "remote:text-embedding-3-large:d2");
}

#[tokio::test]
async fn error_status_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let embedder = RemoteEmbedder::new(&settings(&server, 2)).unwrap();
    let err = embedder.embed("beef").await.unwrap_err();
    assert!(err.is_recoverable());
    match err {
        Error::EmbeddingBackend(msg) => assert!(msg.contains("500") && msg.contains("upstream exploded"), "{msg}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_payload_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let embedder = RemoteEmbedder::new(&settings(&server, 2)).unwrap();
    let err = embedder.embed("beef").await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingBackend(ref m) if m.contains("malformed")), "{err}");
}

#[tokio::test]
async fn empty_data_is_a_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let embedder = RemoteEmbedder::new(&settings(&server, 2)).unwrap();
    let err = embedder.embed("beef").await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingBackend(ref m) if m.contains("no data")), "{err}");
}

#[tokio::test]
async fn unexpected_dimension_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "embedding": [0.1, 0.2, 0.3] }]
        })))
        .mount(&server)
        .await;

    let embedder = RemoteEmbedder::new(&settings(&server, 2)).unwrap();
    let err = embedder.embed("beef").await.unwrap_err();
    assert!(matches!(err, Error::EmbeddingBackend(ref m) if m.contains("3 dims")), "{err}");
}

#[test]
fn missing_api_key_fails_construction() {
    let settings = RemoteSettings {
        api_key: None,
        api_key_env: "RECIPEDB_TEST_DEFINITELY_UNSET".into(),
        ..RemoteSettings::default()
    };
    assert!(matches!(RemoteEmbedder::new(&settings), Err(Error::Configuration(_))));
}
