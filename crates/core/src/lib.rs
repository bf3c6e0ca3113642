pub mod id;
pub mod name;
pub mod record;

pub use id::{FileId, filter_ids};
pub use name::{sanitize_name, storage_name};
pub use record::FileRecord;
