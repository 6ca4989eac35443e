//! `RegistryClient` against a fake registry.

use depmap_cli::cache::TreeCache;
use depmap_cli::registry::{Registry, RegistryClient, RegistryError, RegistryPackage};
use depmap_cli::resolver::{BuildOptions, DependencyMapper};

use crate::common::FakeRegistry;

fn client(url: &str, retries: usize) -> RegistryClient {
    RegistryClient::with_client(reqwest::Client::new(), url, retries).unwrap()
}

#[tokio::test]
async fn test_fetch_package() {
    let registry = FakeRegistry::new()
        .package("a", "1.0.0", "1.0.0", &[("b", "^2.0.0"), ("c", "latest")])
        .start()
        .await;

    let package = client(&registry.url, 0).fetch("a", "1.0.0").await.unwrap();
    assert_eq!(package, RegistryPackage::new("a", "1.0.0", [("b", "^2.0.0"), ("c", "latest")]));
}

#[tokio::test]
async fn test_fetch_scoped_package() {
    let registry = FakeRegistry::new().package("@types/node", "20.0.0", "20.1.0", &[]).start().await;

    let package = client(&registry.url, 0).fetch("@types/node", "20.0.0").await.unwrap();
    assert_eq!(package.name, "@types/node");
    assert_eq!(package.version, "20.1.0");
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let registry = FakeRegistry::new().start().await;

    let err = client(&registry.url, 3).fetch("nope", "1.0.0").await.unwrap_err();
    assert!(matches!(err, RegistryError::Status { status: 404, .. }));
    assert!(!err.is_transient());
    assert_eq!(registry.hits(), 1);
}

#[tokio::test]
async fn test_malformed_payload_is_decode_error() {
    let registry = FakeRegistry::new()
        .raw("a", "1.0.0", 200, "{\"name\": \"a\"}")
        .raw("b", "1.0.0", 200, "<html>not json</html>")
        .start()
        .await;
    let client = client(&registry.url, 0);

    assert!(matches!(client.fetch("a", "1.0.0").await, Err(RegistryError::Decode { .. })));
    assert!(matches!(client.fetch("b", "1.0.0").await, Err(RegistryError::Decode { .. })));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let registry =
        FakeRegistry::new().package("a", "1.0.0", "1.0.0", &[]).fail_first(2).start().await;

    let package = client(&registry.url, 3).fetch("a", "1.0.0").await.unwrap();
    assert_eq!(package.version, "1.0.0");
    assert_eq!(registry.hits(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let registry =
        FakeRegistry::new().package("a", "1.0.0", "1.0.0", &[]).fail_first(10).start().await;

    let err = client(&registry.url, 2).fetch("a", "1.0.0").await.unwrap_err();
    assert!(matches!(err, RegistryError::Status { status: 503, .. }));
    assert_eq!(registry.hits(), 3);
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&url, 0).fetch("a", "1.0.0").await.unwrap_err();
    assert!(matches!(err, RegistryError::Request { .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_mapper_over_http() {
    let registry = FakeRegistry::new()
        .package("a", "1.0.0", "1.0.0", &[("b", "^2.0.0"), ("c", "1.0.0")])
        .package("b", "2.0.0", "2.1.0", &[("c", "1.0.0")])
        .package("c", "1.0.0", "1.0.0", &[])
        .start()
        .await;
    let mapper = DependencyMapper::new(client(&registry.url, 0), TreeCache::new(), BuildOptions::default());

    let tree = mapper.get_dependency_tree("a", "1.0.0").await.unwrap();
    assert_eq!(tree.node_count(), 4);
    assert_eq!(tree.dependency("b").unwrap().version().minimal_version(), Some("2.1.0"));
    assert!(registry.hits() <= 4);

    let hits = registry.hits();
    let again = mapper.get_dependency_tree("a", "1.0.0").await.unwrap();
    assert_eq!(again, tree);
    assert_eq!(registry.hits(), hits);
}
