//! Binary vector documents end to end: create, insert, search, unmarshal

use super::common::*;
use anyhow::Result;
use proximadb_orm::core::errors::{MarshalError, StoreError};
use proximadb_orm::{
    impl_document, ClientConfig, CollectionClient, IndexType, MemoryStore, MetricType, OrmError,
    SearchRequest,
};

#[derive(Debug, Clone, Default, PartialEq)]
struct Fingerprint {
    id: i64,
    source: String,
    bits: Vec<u8>,
    distance: f32,
}

impl_document!(Fingerprint {
    id: i64 => "in,out,pk",
    source: String => "in,out",
    bits: Vec<u8> => "in,dim=16,indexed",
    distance: f32 => "score",
});

fn fingerprint(id: i64, bits: [u8; 2]) -> Fingerprint {
    Fingerprint {
        id,
        source: format!("scan-{}", id),
        bits: bits.to_vec(),
        distance: 0.0,
    }
}

fn fingerprint_client(store: &MemoryStore) -> proximadb_orm::Result<CollectionClient<Fingerprint>> {
    CollectionClient::<Fingerprint>::builder(store.clone())
        .collection_name(generate_test_collection_name())
        .build()
}

#[tokio::test]
async fn test_binary_vectors_default_to_hamming() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = fingerprint_client(&store)?;
    assert_eq!(client.index_spec().metric, MetricType::Hamming);

    client.create().await?;
    let index = store
        .index_spec(client.collection_name(), "bits")
        .expect("index exists");
    assert_eq!(index.metric, MetricType::Hamming);
    assert_eq!(index.index_type, IndexType::AutoIndex);

    let schema = store.schema(client.collection_name()).expect("collection exists");
    let bits = schema.field("bits").expect("bits field");
    assert_eq!(bits.dimension(), Some(16));
    assert_eq!(bits.vector_len(), Some(2));

    println!("✅ Binary index field created with HAMMING by default");
    Ok(())
}

#[tokio::test]
async fn test_binary_vector_search_round_trip() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = fingerprint_client(&store)?;
    client.create().await?;

    let prints = vec![
        fingerprint(1, [0b0000_0000, 0b0000_0000]),
        fingerprint(2, [0b1111_0000, 0b1010_1010]),
        fingerprint(3, [0b1111_1111, 0b1111_1111]),
    ];
    assert_eq!(client.insert(&prints).await?.inserted, 3);

    let hits = client
        .search(&SearchRequest::new(vec![0b1111_0000u8, 0b1010_1011]).top_k(2))
        .await?;

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].document.id, 2);
    assert_eq!(hits[0].document.source, "scan-2");
    assert_eq!(hits[0].score, Some(1.0));
    assert_eq!(hits[0].document.distance, 1.0);
    // Inbound-only vector is not requested back
    assert!(hits[0].document.bits.is_empty());
    assert_eq!(hits[1].document.id, 3);

    println!("✅ Hamming search returned the nearest fingerprint");
    Ok(())
}

#[tokio::test]
async fn test_binary_vector_length_checks() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let client = fingerprint_client(&store)?;
    client.create().await?;

    let mut wide = fingerprint(1, [0, 0]);
    wide.bits.push(0xFF);
    let result = client.insert(&[wide, fingerprint(2, [1, 1])]).await;
    match result {
        Err(OrmError::Marshal(MarshalError::DimensionMismatch { anomalies })) => {
            assert_eq!(anomalies.len(), 1);
            assert_eq!(anomalies[0].row, 0);
            assert_eq!(anomalies[0].field, "bits");
            assert_eq!(anomalies[0].expected, 2);
            assert_eq!(anomalies[0].actual, 3);
        }
        other => panic!("expected a dimension mismatch, got {:?}", other),
    }
    assert_eq!(store.row_count(client.collection_name()), 0);

    client.insert(&[fingerprint(2, [1, 1])]).await?;
    let result = client
        .search(&SearchRequest::new(vec![1u8, 1, 1]))
        .await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "search",
            source: StoreError::Rejected(_)
        })
    ));

    let result = client
        .search(&SearchRequest::new(vec![1u8, 1]).metric(MetricType::Jaccard))
        .await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "search",
            source: StoreError::Rejected(_)
        })
    ));

    println!("✅ Byte-length mismatches rejected on insert and search");
    Ok(())
}

#[tokio::test]
async fn test_configured_search_metric_applies() -> Result<()> {
    init_test_env();

    let store = MemoryStore::new();
    let config = ClientConfig {
        search: proximadb_orm::core::SearchDefaults {
            metric: Some(MetricType::Jaccard),
            ..Default::default()
        },
        ..ClientConfig::default()
    };
    let client = CollectionClient::<Fingerprint>::builder(store.clone())
        .config(config)
        .collection_name(generate_test_collection_name())
        .index(proximadb_orm::IndexSpec::new(IndexType::BinFlat, MetricType::Jaccard))
        .build()?;
    client.create().await?;
    client
        .insert(&[fingerprint(1, [0xFF, 0x00]), fingerprint(2, [0x0F, 0x0F])])
        .await?;

    let hits = client
        .search(&SearchRequest::new(vec![0xFFu8, 0x00]).top_k(1))
        .await?;
    assert_eq!(hits[0].document.id, 1);
    assert_eq!(hits[0].score, Some(0.0));

    // The configured metric wins over the index metric, so a mismatch reaches the store
    let mismatched = CollectionClient::<Fingerprint>::builder(store.clone())
        .config(ClientConfig {
            search: proximadb_orm::core::SearchDefaults {
                metric: Some(MetricType::Hamming),
                ..Default::default()
            },
            ..ClientConfig::default()
        })
        .collection_name(client.collection_name())
        .index(proximadb_orm::IndexSpec::new(IndexType::BinFlat, MetricType::Jaccard))
        .build()?;
    let result = mismatched.search(&SearchRequest::new(vec![0xFFu8, 0x00])).await;
    assert!(matches!(
        result,
        Err(OrmError::Remote {
            operation: "search",
            source: StoreError::Rejected(_)
        })
    ));

    println!("✅ Configured metric used for searches that name none");
    Ok(())
}
