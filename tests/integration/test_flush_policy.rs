//! Flush policy and visibility integration tests

use super::common::*;
use anyhow::Result;
use futures::future::join_all;
use proximadb_orm::core::errors::StoreError;
use proximadb_orm::{
    ClientConfig, CollectionClient, FlushPolicy, FlushTracker, MemoryStore, SearchRequest,
};
use std::io::Write;

fn config_with(policy: FlushPolicy) -> ClientConfig {
    ClientConfig {
        flush_policy: policy,
        flush_interval_ms: 60_000,
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn test_always_flushes_every_insert() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, config_with(FlushPolicy::Always))?;
    client.create().await?;

    assert!(client.insert(&create_article_batch(2)).await?.flushed);
    assert!(client.insert(&[create_article(3, axis_embedding(3))]).await?.flushed);

    let name = client.collection_name();
    assert_eq!(store.flush_count(name), 2);
    assert_eq!(store.sealed_row_count(name), 3);

    println!("✅ Always policy flushed after each insert");
    Ok(())
}

#[tokio::test]
async fn test_throttled_flush_visibility_window() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, config_with(FlushPolicy::Throttled))?;
    client.create().await?;

    assert!(client.insert(&create_article_batch(3)).await?.flushed);
    let late = vec![create_article(4, axis_embedding(4))];
    assert!(!client.insert(&late).await?.flushed);

    let name = client.collection_name();
    assert_eq!(store.flush_count(name), 1);
    assert_eq!(store.row_count(name), 4);
    assert_eq!(store.sealed_row_count(name), 3);

    // Inside the window the late article is not searchable yet
    let hits = client
        .search(&SearchRequest::new(query_near(4)).top_k(4))
        .await?;
    assert!(hits.iter().all(|hit| hit.document.id != 4));

    client.flush().await?;
    let hits = client
        .search(&SearchRequest::new(query_near(4)).top_k(1))
        .await?;
    assert_eq!(hits[0].document.id, 4);

    println!("✅ Throttled policy deferred the second flush");
    Ok(())
}

#[tokio::test]
async fn test_never_flushes_implicitly() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, config_with(FlushPolicy::Never))?;
    client.create().await?;

    let outcome = client.insert(&create_article_batch(3)).await?;
    assert!(!outcome.flushed);
    assert_eq!(store.flush_count(client.collection_name()), 0);

    let hits = client.search(&SearchRequest::new(query_near(1))).await?;
    assert!(hits.is_empty());

    client.flush().await?;
    let hits = client.search(&SearchRequest::new(query_near(1))).await?;
    assert_eq!(hits.len(), 3);

    println!("✅ Never policy left flushing to the caller");
    Ok(())
}

#[tokio::test]
async fn test_concurrent_inserts_share_one_flush() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let tracker = FlushTracker::shared();
    let name = generate_test_collection_name();

    let build = || {
        CollectionClient::<Article>::builder(store.clone())
            .config(config_with(FlushPolicy::Throttled))
            .collection_name(name.clone())
            .flush_tracker(tracker.clone())
            .build()
    };
    let first = build()?;
    let second = build()?;
    first.create().await?;

    let batches: Vec<Vec<Article>> = (0..8)
        .map(|batch| {
            (0..4)
                .map(|i| create_article(batch * 4 + i, random_embedding()))
                .collect()
        })
        .collect();
    let results = join_all(batches.iter().enumerate().map(|(i, batch)| {
        let client = if i % 2 == 0 { &first } else { &second };
        client.insert(batch)
    }))
    .await;

    let mut flushed = 0;
    for result in results {
        let outcome = result?;
        assert_eq!(outcome.inserted, 4);
        if outcome.flushed {
            flushed += 1;
        }
    }

    assert_eq!(flushed, 1);
    assert_eq!(store.flush_count(&name), 1);
    assert_eq!(store.row_count(&name), 32);
    assert_eq!(tracker.len(), 1);

    println!("✅ Eight concurrent inserts, one flush, no lost rows");
    Ok(())
}

#[tokio::test]
async fn test_failed_flush_is_retried() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, config_with(FlushPolicy::Throttled))?;
    client.create().await?;

    store.fail_next("flush", StoreError::Unavailable("data node busy".to_string()));
    let outcome = client.insert(&create_article_batch(2)).await?;
    assert_eq!(outcome.inserted, 2);
    assert!(!outcome.flushed);
    assert_eq!(store.row_count(client.collection_name()), 2);
    assert_eq!(store.sealed_row_count(client.collection_name()), 0);
    assert!(client.flush_tracker().last_flush(client.collection_name()).is_none());

    let outcome = client.insert(&[create_article(3, axis_embedding(3))]).await?;
    assert!(outcome.flushed);
    assert_eq!(store.sealed_row_count(client.collection_name()), 3);

    println!("✅ Failed flush released its claim");
    Ok(())
}

#[tokio::test]
async fn test_config_file_drives_client() -> Result<()> {
    init_test_env();

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
address = "vectors.internal"
flush_policy = "never"
connection_strategy = "per_call"

[search]
top_k = 2
"#
    )?;

    let config = ClientConfig::from_toml_file(file.path())?;
    let store = MemoryStore::new();
    let client = create_test_client(&store, config)?;
    client.create().await?;
    client.insert(&create_article_batch(4)).await?;
    client.flush().await?;

    let hits = client.search(&SearchRequest::new(query_near(1))).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(store.flush_count(client.collection_name()), 1);
    assert_eq!(store.open_connections(), 0);
    assert!(store
        .connected_addresses()
        .iter()
        .all(|address| address == "vectors.internal:19530"));

    println!("✅ Client honoured the TOML configuration");
    Ok(())
}
