pub mod config;
pub mod error;
pub mod executor;
pub mod model;
pub mod orm;
pub mod query_builder;
pub mod schema;
pub mod validator;

// Re-export them for easier access from the crate root
pub use config::*;
pub use error::*;
pub use executor::*;
pub use model::*;
pub use orm::*;
pub use query_builder::{Attributes, QueryBuilder, SortBy, SortOrder, quote_identifier};
pub use schema::*;
pub use validator::{ValidatedInput, validate};
