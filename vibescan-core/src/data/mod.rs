//! Data ingestion: column resolution, CSV loading, canonicalization.

pub mod canonicalize;
pub mod ingest;
pub mod schema;

pub use canonicalize::{canonicalize, CanonicalizeStats};
pub use ingest::{load_series, load_series_from_reader, LoadError, LoadOptions};
pub use schema::{
    find_column, normalize_header, resolve_columns, CanonicalColumn, ColumnError, ColumnMap,
    COLUMN_ALIASES,
};
