pub mod aggregate;
pub mod demo;
pub mod documents;
pub mod index;
pub mod search;

pub use aggregate::{run_agg, run_sub_agg};
pub use demo::run_demo;
pub use documents::{run_count, run_delete, run_get, run_index, run_index_list};
pub use index::{run_create_index, run_delete_index, run_verify_mapping};
pub use search::{run_find_all, run_match, run_native, run_page, run_price_between, run_sort};
