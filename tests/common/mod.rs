// Common test utilities and fixtures

use searchpool::{Config, SearchPool, SearchPoolBuilder};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, STORED, TEXT};

/// Schema with a single searchable "title" field
#[allow(dead_code)] // Used across integration test crates
pub fn title_schema() -> Schema {
    let mut builder = Schema::builder();
    builder.add_text_field("title", TEXT | STORED);
    builder.build()
}

/// Create a pool with temporary storage and a registered "docs" index
#[allow(dead_code)]
pub fn create_test_pool() -> SearchPool {
    let mut config = Config::default();

    // Use temporary directory for tests
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    config.storage.index_root = temp_dir.path().to_path_buf();
    // Keep temp dir alive for duration of test
    std::mem::forget(temp_dir);

    SearchPoolBuilder::new(config)
        .register("docs", title_schema)
        .build()
        .expect("Failed to build pool")
}

/// Resolve the "title" field of a pool's "docs" index
#[allow(dead_code)]
pub fn title_field(pool: &SearchPool) -> Field {
    pool.entry("docs")
        .expect("Failed to open docs index")
        .handle()
        .schema()
        .get_field("title")
        .expect("Missing title field")
}

/// Count hits for a term query against the "docs" index
#[allow(dead_code)]
pub fn count_hits(pool: &SearchPool, query_str: &str) -> usize {
    let entry = pool.entry("docs").expect("Failed to open docs index");
    let title = entry
        .handle()
        .schema()
        .get_field("title")
        .expect("Missing title field");

    let session = pool
        .get_searcher("docs")
        .expect("Failed to acquire searcher");

    let parser = QueryParser::for_index(entry.handle().index(), vec![title]);
    let query = parser.parse_query(query_str).expect("Failed to parse query");

    session
        .search(&query, &TopDocs::with_limit(100))
        .expect("Search failed")
        .len()
}
