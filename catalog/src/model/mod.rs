pub mod item;

pub use item::{sample_items, single_item, Item, ITEM_INDEX, TITLE_ANALYZER};
