//! Restaurant ordering domain
//!
//! Four entity types sharing an integer id and audit timestamps. Orders
//! reference a customer; order items reference an order and a menu item.
//! Back-reference id lists are filled in by the store and never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{navigation_value, Entity, Property, Value, ValueKind};

fn id_list(ids: &[i64]) -> Value {
    Value::Json(serde_json::Value::from(ids.to_vec()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Ids of this customer's orders
    #[serde(skip)]
    pub orders: Vec<i64>,
}

impl Entity for Customer {
    const TYPE_NAME: &'static str = "Customer";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::scalar("id", ValueKind::Int, |c: &Customer| c.id.into()),
            Property::scalar("createdOn", ValueKind::DateTime, |c: &Customer| {
                c.created_on.into()
            }),
            Property::scalar("updatedOn", ValueKind::DateTime, |c: &Customer| {
                c.updated_on.into()
            }),
            Property::scalar("firstName", ValueKind::String, |c: &Customer| {
                c.first_name.as_str().into()
            }),
            Property::scalar("lastName", ValueKind::String, |c: &Customer| {
                c.last_name.as_str().into()
            }),
            Property::scalar("email", ValueKind::String, |c: &Customer| {
                c.email.as_str().into()
            }),
            Property::scalar("phone", ValueKind::String, |c: &Customer| {
                c.phone.as_deref().into()
            }),
            Property::navigation("orders", |c: &Customer| id_list(&c.orders)).hidden(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    pub item_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    /// Ids of order items referencing this menu item
    #[serde(skip)]
    pub order_items: Vec<i64>,
}

impl Entity for MenuItem {
    const TYPE_NAME: &'static str = "MenuItem";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::scalar("id", ValueKind::Int, |m: &MenuItem| m.id.into()),
            Property::scalar("createdOn", ValueKind::DateTime, |m: &MenuItem| {
                m.created_on.into()
            }),
            Property::scalar("updatedOn", ValueKind::DateTime, |m: &MenuItem| {
                m.updated_on.into()
            }),
            Property::scalar("itemName", ValueKind::String, |m: &MenuItem| {
                m.item_name.as_str().into()
            }),
            Property::scalar("description", ValueKind::String, |m: &MenuItem| {
                m.description.as_deref().into()
            }),
            Property::scalar("price", ValueKind::Float, |m: &MenuItem| m.price.into()),
            Property::scalar("category", ValueKind::String, |m: &MenuItem| {
                m.category.as_deref().into()
            }),
            Property::navigation("orderItems", |m: &MenuItem| id_list(&m.order_items)).hidden(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(rename = "customerID")]
    pub customer_id: i64,
    pub order_date: DateTime<Utc>,
    pub total_amount: f64,
    pub status: String,
    /// Loaded only when the store links related rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<Customer>,
    #[serde(skip)]
    pub order_items: Vec<i64>,
}

impl Entity for Order {
    const TYPE_NAME: &'static str = "Order";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::scalar("id", ValueKind::Int, |o: &Order| o.id.into()),
            Property::scalar("createdOn", ValueKind::DateTime, |o: &Order| {
                o.created_on.into()
            }),
            Property::scalar("updatedOn", ValueKind::DateTime, |o: &Order| {
                o.updated_on.into()
            }),
            Property::scalar("customerID", ValueKind::Int, |o: &Order| {
                o.customer_id.into()
            }),
            Property::scalar("orderDate", ValueKind::DateTime, |o: &Order| {
                o.order_date.into()
            }),
            Property::scalar("totalAmount", ValueKind::Float, |o: &Order| {
                o.total_amount.into()
            }),
            Property::scalar("status", ValueKind::String, |o: &Order| {
                o.status.as_str().into()
            }),
            Property::navigation("customer", |o: &Order| navigation_value(o.customer.as_ref())),
            Property::navigation("orderItems", |o: &Order| id_list(&o.order_items)).hidden(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
    #[serde(rename = "orderID")]
    pub order_id: i64,
    #[serde(rename = "menuItemID")]
    pub menu_item_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_item: Option<MenuItem>,
}

impl Entity for OrderItem {
    const TYPE_NAME: &'static str = "OrderItem";

    fn properties() -> Vec<Property<Self>> {
        vec![
            Property::scalar("id", ValueKind::Int, |i: &OrderItem| i.id.into()),
            Property::scalar("createdOn", ValueKind::DateTime, |i: &OrderItem| {
                i.created_on.into()
            }),
            Property::scalar("updatedOn", ValueKind::DateTime, |i: &OrderItem| {
                i.updated_on.into()
            }),
            Property::scalar("orderID", ValueKind::Int, |i: &OrderItem| i.order_id.into()),
            Property::scalar("menuItemID", ValueKind::Int, |i: &OrderItem| {
                i.menu_item_id.into()
            }),
            Property::scalar("quantity", ValueKind::Int, |i: &OrderItem| i.quantity.into()),
            Property::scalar("unitPrice", ValueKind::Float, |i: &OrderItem| {
                i.unit_price.into()
            }),
            Property::navigation("order", |i: &OrderItem| navigation_value(i.order.as_ref())),
            Property::navigation("menuItem", |i: &OrderItem| {
                navigation_value(i.menu_item.as_ref())
            }),
        ]
    }
}
