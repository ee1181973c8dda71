//! Repository implementations for database access.
//!
//! Each major entity has a repository that wraps a SQLx connection or
//! transaction, provides strongly-typed CRUD operations, and returns models
//! from [`crate::db::models`]. Core CRUD follows the [`Repository`] trait;
//! entity-specific operations (edge management, embed-scoped lookups, the
//! guarded primary-option count) are inherent methods.
//!
//! # Common Pattern
//!
//! ```ignore
//! use optioneer::db::handlers::{Configurators, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Configurators::new(&mut tx);
//!     let configurator = repo.get_by_id(id).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod billing;
pub mod categories;
pub mod clients;
pub mod configurators;
pub mod options;
pub mod quotes;
pub mod repository;
pub mod themes;

pub use billing::BlockPurchases;
pub use categories::Categories;
pub use clients::Clients;
pub use configurators::Configurators;
pub use options::Options;
pub use quotes::Quotes;
pub use repository::Repository;
pub use themes::Themes;
