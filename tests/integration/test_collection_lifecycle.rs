//! Collection lifecycle integration tests: create, insert, search, delete, drop

use super::common::*;
use anyhow::Result;
use proximadb_orm::core::errors::{ConfigError, MarshalError, StoreError};
use proximadb_orm::{
    impl_document, ClientConfig, CollectionClient, DimensionMismatchPolicy, MemoryStore,
    MetricType, OrmError, PrimaryKey, SearchRequest,
};

#[tokio::test]
async fn test_search_returns_nearest_article() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;

    let outcome = client.insert(&create_article_batch(3)).await?;
    assert_eq!(outcome.inserted, 3);
    assert!(outcome.flushed);
    assert!(outcome.anomalies.is_empty());

    let hits = client
        .search(&SearchRequest::new(query_near(2)).top_k(1))
        .await?;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.id, 2);
    assert_eq!(hits[0].document.label, "article-2");
    // Only output fields travel back
    assert!(hits[0].document.embedding.is_empty());

    let score = hits[0].score.expect("store reports scores");
    assert!((score - 0.9).abs() < 1e-5);
    assert_eq!(hits[0].document.score, score);

    println!("✅ Top-1 search returned article 2 with score {}", score);
    Ok(())
}

#[tokio::test]
async fn test_deleted_article_is_not_returned() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;
    client.insert(&create_article_batch(3)).await?;

    let removed = client.delete(&[PrimaryKey::Int64(2)]).await?;
    assert_eq!(removed, 1);

    let hits = client
        .search(&SearchRequest::new(query_near(2)).top_k(3))
        .await?;
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|hit| hit.document.id != 2));

    println!("✅ Deleted article no longer appears in search results");
    Ok(())
}

#[tokio::test]
async fn test_create_is_idempotent() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    let name = client.collection_name().to_string();

    client.create().await?;
    client.create().await?;

    // A second client for the same collection also tolerates existing objects
    let other = CollectionClient::<Article>::builder(store.clone())
        .collection_name(name.clone())
        .build()?;
    other.create().await?;

    assert!(store.has_collection(&name));
    assert!(store.has_partition(&name, "_default"));
    assert_eq!(store.index_build_count(&name), 1);
    let schema = store.schema(&name).expect("collection exists");
    assert_eq!(schema.primary_key_field, "id");
    assert_eq!(schema.fields.len(), 3);

    println!("✅ Repeated create built the index once");
    Ok(())
}

#[tokio::test]
async fn test_create_with_partition_and_index() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = CollectionClient::<Article>::builder(store.clone())
        .collection_name(generate_test_collection_name())
        .partition_name("articles_2025")
        .index(
            proximadb_orm::IndexSpec::new(proximadb_orm::IndexType::IvfFlat, MetricType::L2)
                .with_param("nlist", 16),
        )
        .build()?;
    client.create().await?;

    let name = client.collection_name();
    assert!(store.has_partition(name, "articles_2025"));
    let index = store.index_spec(name, "embedding").expect("index exists");
    assert_eq!(index.metric, MetricType::L2);

    client.insert(&create_article_batch(3)).await?;
    let hits = client
        .search(&SearchRequest::new(axis_embedding(3)).top_k(1))
        .await?;
    assert_eq!(hits[0].document.id, 3);
    assert_eq!(hits[0].score, Some(0.0));

    // An explicit request metric still takes precedence
    let result = client
        .search(&SearchRequest::new(axis_embedding(3)).metric(MetricType::InnerProduct))
        .await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "search",
            source: StoreError::Rejected(_)
        })
    ));

    println!("✅ Custom partition and L2 index honoured without a request metric");
    Ok(())
}

#[tokio::test]
async fn test_create_propagates_store_failure() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    store.fail_next(
        "create_collection",
        StoreError::Unavailable("coordinator restarting".to_string()),
    );

    let result = client.create().await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "create_collection",
            source: StoreError::Unavailable(_)
        })
    ));
    assert!(!store.has_collection(client.collection_name()));

    client.create().await?;
    assert!(store.has_collection(client.collection_name()));

    println!("✅ Non-exists create failure surfaced to the caller");
    Ok(())
}

#[tokio::test]
async fn test_default_collection_name() -> Result<()> {
    init_test_env();

    let client = CollectionClient::<Article>::builder(MemoryStore::new()).build()?;
    assert_eq!(client.collection_name(), "Articles");
    assert_eq!(client.partition_name(), "_default");
    assert_eq!(client.index_field(), Some("embedding"));
    assert_eq!(client.output_fields(), &["id".to_string(), "label".to_string()]);
    assert_eq!(client.address(), "localhost:19530");

    println!("✅ Collection name derived from the document type");
    Ok(())
}

#[tokio::test]
async fn test_search_batch_and_filter() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;
    client.insert(&create_article_batch(5)).await?;

    let batches = client
        .search_batch(&SearchRequest::batch(vec![query_near(1), query_near(4)]).top_k(2))
        .await?;
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0][0].document.id, 1);
    assert_eq!(batches[1][0].document.id, 4);

    let flattened = client
        .search(&SearchRequest::batch(vec![query_near(1), query_near(4)]).top_k(2))
        .await?;
    assert_eq!(flattened.len(), 4);
    assert_eq!(flattened[0].document.id, 1);
    assert_eq!(flattened[2].document.id, 4);

    let filtered = client
        .search(
            &SearchRequest::new(query_near(1))
                .expression("id > 2 and label != \"article-5\"")
                .top_k(5),
        )
        .await?;
    let mut ids: Vec<i64> = filtered.iter().map(|hit| hit.document.id).collect();
    ids.sort();
    assert_eq!(ids, vec![3, 4]);

    println!("✅ Batched and filtered searches return hits per query");
    Ok(())
}

#[tokio::test]
async fn test_search_validation() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;

    let hits = client.search(&SearchRequest::default()).await?;
    assert!(hits.is_empty());

    let result = client.search(&SearchRequest::new(query_near(1)).top_k(0)).await;
    assert!(matches!(
        result,
        Err(OrmError::Config(ConfigError::InvalidValue { .. }))
    ));

    let result = client
        .search(&SearchRequest::new(query_near(1)).metric(MetricType::L2))
        .await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "search",
            source: StoreError::Rejected(_)
        })
    ));

    println!("✅ Invalid searches rejected");
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct Pairing {
    id: i64,
    left: Vec<f32>,
    right: Vec<f32>,
}

impl_document!(Pairing {
    id: i64 => "pk,out",
    left: Vec<f32> => "in,dim=4",
    right: Vec<f32> => "in,dim=4",
});

#[tokio::test]
async fn test_search_without_index_field() -> Result<()> {
    init_test_env();

    let client = CollectionClient::<Pairing>::builder(MemoryStore::new()).build()?;
    assert_eq!(client.index_field(), None);

    let result = client.search(&SearchRequest::new(vec![0.0f32; 4])).await;
    assert!(matches!(
        result,
        Err(OrmError::Config(ConfigError::NoIndexField { .. }))
    ));

    println!("✅ Search without an index field reports NoIndexField");
    Ok(())
}

#[tokio::test]
async fn test_dimension_mismatch_policies() -> Result<()> {
    init_test_env();

    let mut articles = create_article_batch(3);
    articles[1].embedding.push(0.5);

    let store = MemoryStore::new();
    let strict = create_test_client(&store, ClientConfig::default())?;
    strict.create().await?;
    let result = strict.insert(&articles).await;
    match result {
        Err(OrmError::Marshal(MarshalError::DimensionMismatch { anomalies })) => {
            assert_eq!(anomalies.len(), 1);
            assert_eq!(anomalies[0].row, 1);
            assert_eq!(anomalies[0].expected, DIMENSION);
            assert_eq!(anomalies[0].actual, DIMENSION + 1);
        }
        other => panic!("expected a dimension mismatch, got {:?}", other),
    }
    assert_eq!(store.row_count(strict.collection_name()), 0);

    let lenient = CollectionClient::<Article>::builder(store.clone())
        .collection_name(generate_test_collection_name())
        .dimension_mismatch(DimensionMismatchPolicy::DropRows)
        .build()?;
    lenient.create().await?;
    let outcome = lenient.insert(&articles).await?;
    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.anomalies.len(), 1);
    assert_eq!(store.row_count(lenient.collection_name()), 2);

    println!("✅ Dimension mismatch rejected or dropped per policy");
    Ok(())
}

#[tokio::test]
async fn test_empty_insert_skips_the_store() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;

    let outcome = client.insert(&[]).await?;
    assert_eq!(outcome.inserted, 0);
    assert!(!outcome.flushed);
    assert_eq!(store.connect_attempts(), 0);

    println!("✅ Empty insert never connected");
    Ok(())
}

#[tokio::test]
async fn test_remove_by_value_and_key_types() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;
    let articles = create_article_batch(4);
    client.insert(&articles).await?;

    let removed = client.remove(&articles[..2]).await?;
    assert_eq!(removed, 2);
    assert_eq!(store.row_count(client.collection_name()), 2);

    let result = client.delete(&[PrimaryKey::from("3")]).await;
    assert!(matches!(result, Err(OrmError::UnsupportedKeyType { .. })));

    assert_eq!(client.delete(&[]).await?, 0);

    println!("✅ Remove by value deleted the matching keys");
    Ok(())
}

#[tokio::test]
async fn test_drop_collection() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;
    client.insert(&create_article_batch(2)).await?;
    assert!(client.flush_tracker().last_flush(client.collection_name()).is_some());

    client.drop_collection().await?;
    assert!(!store.has_collection(client.collection_name()));
    assert!(client.flush_tracker().last_flush(client.collection_name()).is_none());

    let result = client.drop_collection().await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            source: StoreError::NotFound(_),
            ..
        })
    ));

    println!("✅ Collection dropped");
    Ok(())
}

#[tokio::test]
async fn test_random_embeddings_round_trip_labels() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = create_test_client(&store, ClientConfig::default())?;
    client.create().await?;

    let articles: Vec<Article> = (1..=20).map(|id| create_article(id, random_embedding())).collect();
    client.insert(&articles).await?;

    let hits = client
        .search(&SearchRequest::new(articles[7].embedding.clone()).top_k(20))
        .await?;
    assert_eq!(hits.len(), 20);
    for hit in &hits {
        assert_eq!(hit.document.label, format!("article-{}", hit.document.id));
    }
    let scores: Vec<f32> = hits.iter().filter_map(|hit| hit.score).collect();
    assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));

    println!("✅ {} hits rebuilt with consistent labels", hits.len());
    Ok(())
}
