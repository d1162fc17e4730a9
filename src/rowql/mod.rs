pub mod datasource;
pub mod query;
pub mod sql;
pub mod writer;

// Re-export the embedding API
pub use query::{run_query, Query, QueryOptions};
pub use sql::{SqlError, SqlResult, Value};
