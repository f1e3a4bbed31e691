//! Database layer - catalog storage backends and query rendering

pub mod memory;
pub mod postgres;
pub mod query_builder;
pub mod traits;

pub use memory::MemoryCatalogStore;
pub use postgres::PostgresCatalogStore;
pub use query_builder::{BindValue, Filter, SearchQuery, SearchQueryBuilder};
pub use traits::CatalogStore;
