//! Shared test entities and data

#![allow(dead_code)]

use std::sync::Arc;

use aeroquery::executor::InMemoryCollection;
use aeroquery::schema::{Entity, Property, ValueKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub rating: Option<f64>,
    pub tag: Option<String>,
}

impl Entity for Product {
    const TYPE_NAME: &'static str = "Product";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::scalar("Id", ValueKind::Int, |p: &Product| p.id.into()),
            Property::scalar("Name", ValueKind::String, |p: &Product| {
                p.name.as_str().into()
            }),
            Property::scalar("Price", ValueKind::Int, |p: &Product| p.price.into()),
            Property::scalar("Rating", ValueKind::Float, |p: &Product| p.rating.into()),
            Property::scalar("Tag", ValueKind::String, |p: &Product| p.tag.as_deref().into()),
        ]
    }
}

pub fn product(id: i64, name: &str, price: i64) -> Product {
    Product {
        id,
        name: name.to_string(),
        price,
        rating: None,
        tag: None,
    }
}

/// The three-row example collection
pub fn abc() -> Vec<Product> {
    vec![product(1, "a", 5), product(2, "b", 3), product(3, "c", 5)]
}

/// A larger collection with ties, nulls and mixed values
pub fn catalog() -> Vec<Product> {
    let names = ["pear", "apple", "fig", "kiwi", "apple", "plum", "date", "fig"];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let id = i as i64 + 1;
            Product {
                id,
                name: name.to_string(),
                price: (id * 7) % 5,
                rating: if id % 3 == 0 { None } else { Some(id as f64 / 2.0) },
                tag: if id % 2 == 0 { Some(format!("t{}", id % 4)) } else { None },
            }
        })
        .collect()
}

pub fn source(rows: Vec<Product>) -> InMemoryCollection<Product> {
    InMemoryCollection::new(Arc::new(rows))
}
