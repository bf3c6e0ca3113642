pub mod error;
pub mod store;

pub use error::CatalogError;
pub use store::CatalogStore;
