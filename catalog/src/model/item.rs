use serde::{Deserialize, Serialize};

use crate::mapping::{Document, DocumentMapping, FieldMapping};

pub const ITEM_INDEX: &str = "item";

/// Chinese-aware analyzer provided by the IK analysis plugin
pub const TITLE_ANALYZER: &str = "ik_max_word";

/// A catalog item
///
/// Missing fields decode to their defaults, so a search with a source
/// filter still yields items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    /// Image URL, kept in `_source` but not searchable
    pub images: String,
}

impl Item {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        category: impl Into<String>,
        brand: impl Into<String>,
        price: f64,
        images: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            brand: brand.into(),
            price,
            images: images.into(),
        }
    }
}

impl Document for Item {
    fn mapping() -> DocumentMapping {
        DocumentMapping::new(ITEM_INDEX)
            .shards(1)
            .replicas(0)
            .field("id", FieldMapping::long())
            .field("title", FieldMapping::text().analyzer(TITLE_ANALYZER))
            .field("category", FieldMapping::keyword())
            .field("brand", FieldMapping::keyword())
            .field("price", FieldMapping::double())
            .field("images", FieldMapping::keyword().not_indexed())
    }

    fn document_id(&self) -> String {
        self.id.to_string()
    }

    fn set_document_id(&mut self, id: &str) {
        if let Ok(id) = id.parse() {
            self.id = id;
        }
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item(id={}, title={}, category={}, brand={}, price={}, images={})",
            self.id, self.title, self.category, self.brand, self.price, self.images
        )
    }
}

/// The item used for single-document indexing
pub fn single_item() -> Item {
    Item::new(1, "小米手机8", "手机", "小米", 3499.0, "http://sdfdf.jpg")
}

/// Five phones from three brands, used for bulk indexing and the query walkthrough
pub fn sample_items() -> Vec<Item> {
    const IMAGE: &str = "http://image.leyou.com/13123.jpg";
    vec![
        Item::new(1, "小米手机7", "手机", "小米", 3299.0, IMAGE),
        Item::new(2, "坚果手机R1", "手机", "锤子", 3699.0, IMAGE),
        Item::new(3, "华为META10", "手机", "华为", 4499.0, IMAGE),
        Item::new(4, "小米Mix2S", "手机", "小米", 4299.0, IMAGE),
        Item::new(5, "荣耀V10", "手机", "华为", 2799.0, IMAGE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_mapping() {
        let mapping = Item::mapping();
        assert_eq!(mapping.index_name, "item");
        assert_eq!(Item::index_name(), "item");

        assert_eq!(
            mapping.create_index_body(),
            json!({
                "settings": {"number_of_shards": 1, "number_of_replicas": 0},
                "mappings": {
                    "properties": {
                        "id": {"type": "long"},
                        "title": {"type": "text", "analyzer": "ik_max_word"},
                        "category": {"type": "keyword"},
                        "brand": {"type": "keyword"},
                        "price": {"type": "double"},
                        "images": {"type": "keyword", "index": false}
                    }
                }
            })
        );
    }

    #[test]
    fn test_item_source_shape() {
        let item = single_item();
        assert_eq!(item.document_id(), "1");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({
                "id": 1,
                "title": "小米手机8",
                "category": "手机",
                "brand": "小米",
                "price": 3499.0,
                "images": "http://sdfdf.jpg"
            })
        );
    }

    #[test]
    fn test_display() {
        let item = Item::new(5, "荣耀V10", "手机", "华为", 2799.0, "x.jpg");
        assert_eq!(
            item.to_string(),
            "Item(id=5, title=荣耀V10, category=手机, brand=华为, price=2799, images=x.jpg)"
        );
    }

    #[test]
    fn test_sample_items_have_unique_ids() {
        let items = sample_items();
        let mut ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        ids.dedup();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_partial_source_decodes() {
        let mut item: Item = serde_json::from_value(json!({"title": "荣耀V10", "price": 2799.0})).unwrap();
        assert_eq!(item.title, "荣耀V10");
        assert_eq!(item.price, 2799.0);
        assert!(item.images.is_empty());

        item.set_document_id("5");
        assert_eq!(item.id, 5);
        item.set_document_id("not-a-number");
        assert_eq!(item.id, 5);
    }
}
