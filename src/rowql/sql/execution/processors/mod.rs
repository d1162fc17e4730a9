//! Stage processors for pipeline execution:
//! - projection (SELECT / DISTINCT / PARTIALS / `*` expansion)
//! - grouping (GROUP BY buffering with deferred aggregates)
//! - ordering (stable sort over precomputed key tuples)
//! - windowing (OFFSET / LIMIT, with the streaming short-circuit)

pub mod group;
pub mod limit;
pub mod order;
pub mod select;

pub use group::GroupBuffer;
pub use limit::LimitWindow;
pub use order::sort_rows;
pub use select::Projector;
