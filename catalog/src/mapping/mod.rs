pub mod decode;
pub mod types;

pub use decode::{diff_mappings, parse_mapping_response, MappingMismatch};
pub use types::{Document, DocumentMapping, FieldMapping, FieldType, IndexSettings};
