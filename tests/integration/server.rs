//! The HTTP server over real sockets.

use depmap_cli::cache::TreeCache;
use depmap_cli::resolver::{BuildOptions, DependencyMapper};
use depmap_cli::server;
use depmap_cli::test_utils::StaticRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    url: String,
    mapper: Arc<DependencyMapper<StaticRegistry>>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

async fn start(registry: StaticRegistry) -> TestServer {
    let mapper = Arc::new(DependencyMapper::new(registry, TreeCache::new(), BuildOptions::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let (shutdown, signal) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::serve_with_shutdown(listener, Arc::clone(&mapper), async move {
        let _ = signal.await;
    }));

    TestServer {
        url,
        mapper,
        shutdown,
        handle,
    }
}

fn sample_registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_exact("a", "1.0.0", [("b", "^2.0.0")])
        .with_package("b", "2.0.0", "2.1.0", [("c", "1.0.0")])
        .with_exact("c", "1.0.0", Vec::<(&str, &str)>::new())
}

#[tokio::test]
async fn test_tree_endpoint_wire_format() {
    let server = start(sample_registry()).await;

    let response = reqwest::get(format!("{}/registry/a/1.0.0", server.url)).await.unwrap();
    assert_eq!(response.status(), 200);

    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "a",
            "version": { "originalExpression": "1.0.0", "minimalVersion": "1.0.0" },
            "dependencies": [{
                "name": "b",
                "version": { "originalExpression": "^2.0.0", "minimalVersion": "2.1.0" },
                "dependencies": [{
                    "name": "c",
                    "version": { "originalExpression": "1.0.0", "minimalVersion": "1.0.0" },
                    "dependencies": []
                }]
            }]
        })
    );
}

#[tokio::test]
async fn test_requests_share_the_cache() {
    let server = start(sample_registry()).await;

    for _ in 0..3 {
        let response = reqwest::get(format!("{}/registry/a/1.0.0", server.url)).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    assert_eq!(server.mapper.registry().fetch_count(), 3);
    assert_eq!(server.mapper.cache().keys(), vec!["a@1.0.0", "b@2.1.0", "c@1.0.0"]);
}

#[tokio::test]
async fn test_unknown_package_returns_leaf() {
    let server = start(StaticRegistry::new()).await;

    let json: serde_json::Value = reqwest::get(format!("{}/registry/nope/latest", server.url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["name"], "nope");
    assert!(json["version"]["minimalVersion"].is_null());
    assert_eq!(json["dependencies"], serde_json::json!([]));
}

#[tokio::test]
async fn test_scoped_package_name() {
    let registry = StaticRegistry::new().with_exact("@types/node", "20.0.0", Vec::<(&str, &str)>::new());
    let server = start(registry).await;

    let response =
        reqwest::get(format!("{}/registry/@types%2Fnode/20.0.0", server.url)).await.unwrap();
    assert_eq!(response.status(), 200);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["name"], "@types/node");
}

#[tokio::test]
async fn test_empty_segments_are_bad_requests() {
    let server = start(sample_registry()).await;

    let response = reqwest::get(format!("{}/registry/a/", server.url)).await.unwrap();
    assert_eq!(response.status(), 400);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "error": "Version can't be empty" }));

    for path in ["/registry//1.0.0", "/registry//"] {
        let response = reqwest::get(format!("{}{path}", server.url)).await.unwrap();
        assert_eq!(response.status(), 400, "{path}");
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["error"], "Package name must not be empty");
    }

    assert_eq!(server.mapper.registry().fetch_count(), 0);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let server = start(StaticRegistry::new()).await;

    let health = reqwest::get(format!("{}/health", server.url)).await.unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "ok");

    let missing = reqwest::get(format!("{}/registry/a", server.url)).await.unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = start(StaticRegistry::new()).await;

    server.shutdown.send(()).unwrap();
    server.handle.await.unwrap().unwrap();

    assert!(reqwest::get(format!("{}/health", server.url)).await.is_err());
}
