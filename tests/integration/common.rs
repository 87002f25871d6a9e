//! Common utilities for integration tests

use proximadb_orm::{impl_document, ClientConfig, CollectionClient, MemoryStore};
use rand::Rng;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

pub const DIMENSION: usize = 8;

/// Initialize test environment
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Generate unique collection name for testing
pub fn generate_test_collection_name() -> String {
    format!("test_articles_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub id: i64,
    pub label: String,
    pub embedding: Vec<f32>,
    pub score: f32,
}

impl_document!(Article {
    id: i64 => "in,out,primary-key",
    label: String => "in,out,max-length=64",
    embedding: Vec<f32> => "in,dimension=8,indexed",
    score: f32 => "score",
});

/// Unit vector along `axis`, so inner products separate documents cleanly
pub fn axis_embedding(axis: usize) -> Vec<f32> {
    let mut embedding = vec![0.0; DIMENSION];
    embedding[axis % DIMENSION] = 1.0;
    embedding
}

pub fn random_embedding() -> Vec<f32> {
    let mut rng = rand::thread_rng();
    (0..DIMENSION).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn create_article(id: i64, embedding: Vec<f32>) -> Article {
    Article {
        id,
        label: format!("article-{}", id),
        embedding,
        score: 0.0,
    }
}

/// Articles 1..=count, article `n` pointing along axis `n`
pub fn create_article_batch(count: i64) -> Vec<Article> {
    (1..=count)
        .map(|id| create_article(id, axis_embedding(id as usize)))
        .collect()
}

/// Query close to `axis_embedding(axis)`
pub fn query_near(axis: usize) -> Vec<f32> {
    let mut query: Vec<f32> = axis_embedding(axis).iter().map(|v| v * 0.9).collect();
    for (i, v) in query.iter_mut().enumerate() {
        if i != axis % DIMENSION {
            *v += 0.05;
        }
    }
    query
}

/// Client over `store` for a fresh collection
pub fn create_test_client(
    store: &MemoryStore,
    config: ClientConfig,
) -> proximadb_orm::Result<CollectionClient<Article>> {
    CollectionClient::<Article>::builder(store.clone())
        .config(config)
        .collection_name(generate_test_collection_name())
        .build()
}
