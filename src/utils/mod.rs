pub mod collection_ext;
pub mod error;
pub mod string_ext;

pub use collection_ext::{find_duplicates, unique_ordered, unique_ordered_by, vec_to_map};
pub use error::{ApiError, ApiResult};
pub use string_ext::{StringExt, clean_optional_string, normalize_text};
