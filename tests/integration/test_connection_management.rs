//! Connection strategy, timeout and close integration tests

use super::common::*;
use anyhow::Result;
use futures::future::join_all;
use proximadb_orm::store::ConnectBehavior;
use proximadb_orm::{
    ClientConfig, CollectionClient, ConnectionState, ConnectionStrategy, MemoryStore, OrmError,
    SearchRequest,
};
use std::time::Duration;

#[tokio::test]
async fn test_per_call_strategy_closes_connections() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let config = ClientConfig {
        connection_strategy: ConnectionStrategy::PerCall,
        ..ClientConfig::default()
    };
    let client = create_test_client(&store, config)?;

    client.create().await?;
    client.insert(&create_article_batch(3)).await?;
    let hits = client
        .search(&SearchRequest::new(query_near(2)).top_k(1))
        .await?;
    assert_eq!(hits[0].document.id, 2);

    assert_eq!(store.connect_attempts(), 3);
    assert_eq!(store.open_connections(), 0);
    assert_eq!(client.state(), ConnectionState::Unconnected);

    println!("✅ Per-call strategy opened and closed one connection per operation");
    Ok(())
}

#[tokio::test]
async fn test_cached_strategy_connects_once_under_concurrency() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    store.set_connect_behavior(ConnectBehavior::Delay(Duration::from_millis(50)));
    let client = create_test_client(&store, ClientConfig::default())?;
    assert_eq!(client.state(), ConnectionState::Unconnected);

    let results = join_all((0..8).map(|_| client.create())).await;
    for result in results {
        result?;
    }

    assert_eq!(store.connect_attempts(), 1);
    assert_eq!(store.open_connections(), 1);
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(store.index_build_count(client.collection_name()), 1);

    println!("✅ Eight concurrent operations shared one connection");
    Ok(())
}

#[tokio::test]
async fn test_close_then_reconnect() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;
    assert_eq!(store.open_connections(), 1);

    client.close().await?;
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(store.open_connections(), 0);

    client.insert(&create_article_batch(1)).await?;
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(store.connect_attempts(), 2);

    // Closing twice is harmless
    client.close().await?;
    client.close().await?;

    println!("✅ Closed client reconnected on next operation");
    Ok(())
}

#[tokio::test]
async fn test_connect_timeout_on_silent_store() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    store.set_connect_behavior(ConnectBehavior::Hang);
    let config = ClientConfig {
        connect_timeout_ms: 50,
        ..ClientConfig::default()
    };
    let client = create_test_client(&store, config)?;

    let error = client.create().await.unwrap_err();
    assert!(matches!(error, OrmError::ConnectTimeout { timeout_ms: 50, .. }));
    assert!(error.is_timeout());
    assert!(error.is_connection_error());

    println!("✅ Silent store produced ConnectTimeout: {}", error);
    Ok(())
}

#[tokio::test]
async fn test_connect_errors_are_classified() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;

    store.set_connect_behavior(ConnectBehavior::DeadlineExceeded);
    let error = client.create().await.unwrap_err();
    assert!(matches!(error, OrmError::ConnectTimeout { .. }));

    store.set_connect_behavior(ConnectBehavior::Refuse("connection refused".to_string()));
    let error = client.create().await.unwrap_err();
    match &error {
        OrmError::Connection { address, message } => {
            assert_eq!(address, "localhost:19530");
            assert!(message.contains("connection refused"));
        }
        other => panic!("expected a connection error, got {:?}", other),
    }
    assert!(!error.is_timeout());

    // A failed attempt is not cached
    store.set_connect_behavior(ConnectBehavior::Accept);
    client.create().await?;
    assert_eq!(store.connect_attempts(), 3);
    assert_eq!(client.state(), ConnectionState::Connected);

    println!("✅ Connect failures classified and retried");
    Ok(())
}

#[tokio::test]
async fn test_request_timeout() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let config = ClientConfig {
        request_timeout_ms: 50,
        ..ClientConfig::default()
    };
    let client = create_test_client(&store, config)?;

    store.set_latency(Some(Duration::from_millis(500)));
    let error = client.create().await.unwrap_err();
    assert!(matches!(
        error,
        OrmError::Timeout {
            operation: "create_collection",
            timeout_ms: 50
        }
    ));

    store.set_latency(None);
    client.create().await?;

    println!("✅ Slow store call bounded by the request timeout");
    Ok(())
}

#[tokio::test]
async fn test_address_normalization() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = CollectionClient::<Article>::builder(store.clone())
        .address("milvus.lan")
        .collection_name(generate_test_collection_name())
        .build()?;
    client.create().await?;

    assert_eq!(client.address(), "milvus.lan:19530");
    assert_eq!(store.connected_addresses(), vec!["milvus.lan:19530".to_string()]);

    let result = CollectionClient::<Article>::builder(store.clone())
        .address("  ")
        .build();
    assert!(matches!(result, Err(OrmError::Config(_))));

    println!("✅ Address normalized with the default port");
    Ok(())
}
