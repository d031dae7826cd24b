use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Sort on one field
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub property: String,
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(
            self.property.clone(),
            json!({ "order": self.direction.as_str() }),
        );
        Value::Object(obj)
    }
}

/// Ordered list of sort fields; earlier orders take precedence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by<S: AsRef<str>>(direction: Direction, properties: &[S]) -> Self {
        Self {
            orders: properties
                .iter()
                .map(|p| Order {
                    property: p.as_ref().to_string(),
                    direction,
                })
                .collect(),
        }
    }

    pub fn by_orders(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn and(mut self, other: Sort) -> Self {
        self.orders.extend(other.orders);
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn to_json(&self) -> Vec<Value> {
        self.orders.iter().map(Order::to_json).collect()
    }
}
