//! In-memory catalog storage
//!
//! Holds two immutable snapshots of every collection: plain rows, and rows
//! with navigation properties linked. Queries that expand navigation read
//! the linked snapshot; everything else reads the plain one.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::InMemoryCollection;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::Entity;

use super::entities::{Customer, MenuItem, Order, OrderItem};

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid seed data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate id {id} in {collection}")]
    DuplicateId { collection: Collection, id: i64 },

    #[error("{collection} {id} references missing {field} {target}")]
    DanglingReference {
        collection: Collection,
        id: i64,
        field: &'static str,
        target: i64,
    },
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Io { .. } => "CATALOG_IO_ERROR",
            CatalogError::Parse(_) => "CATALOG_PARSE_ERROR",
            CatalogError::DuplicateId { .. } => "CATALOG_DUPLICATE_ID",
            CatalogError::DanglingReference { .. } => "CATALOG_DANGLING_REFERENCE",
        }
    }
}

/// Named entity collections exposed by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Customers,
    MenuItems,
    Orders,
    OrderItems,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Customers,
        Collection::MenuItems,
        Collection::Orders,
        Collection::OrderItems,
    ];

    /// Returns the route name
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Customers => "customers",
            Collection::MenuItems => "menuItems",
            Collection::Orders => "orders",
            Collection::OrderItems => "orderItems",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    /// Case-insensitive route name lookup
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown collection '{}'", s))
    }
}

/// Seed file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
}

/// One snapshot of every collection
#[derive(Debug, Clone, Default)]
pub struct Tables {
    customers: Arc<Vec<Customer>>,
    menu_items: Arc<Vec<MenuItem>>,
    orders: Arc<Vec<Order>>,
    order_items: Arc<Vec<OrderItem>>,
}

/// An entity type stored in the catalog
pub trait CatalogEntity: Entity + Clone + fmt::Debug {
    const COLLECTION: Collection;

    fn table(tables: &Tables) -> &Arc<Vec<Self>>;

    /// Primary key
    fn id(&self) -> i64;
}

impl CatalogEntity for Customer {
    const COLLECTION: Collection = Collection::Customers;

    fn table(tables: &Tables) -> &Arc<Vec<Self>> {
        &tables.customers
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl CatalogEntity for MenuItem {
    const COLLECTION: Collection = Collection::MenuItems;

    fn table(tables: &Tables) -> &Arc<Vec<Self>> {
        &tables.menu_items
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl CatalogEntity for Order {
    const COLLECTION: Collection = Collection::Orders;

    fn table(tables: &Tables) -> &Arc<Vec<Self>> {
        &tables.orders
    }

    fn id(&self) -> i64 {
        self.id
    }
}

impl CatalogEntity for OrderItem {
    const COLLECTION: Collection = Collection::OrderItems;

    fn table(tables: &Tables) -> &Arc<Vec<Self>> {
        &tables.order_items
    }

    fn id(&self) -> i64 {
        self.id
    }
}

/// Read-only catalog of all collections
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    plain: Tables,
    linked: Tables,
}

fn check_unique<T>(collection: Collection, rows: &[T], id: fn(&T) -> i64) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(id(row)) {
            return Err(CatalogError::DuplicateId {
                collection,
                id: id(row),
            });
        }
    }
    Ok(())
}

fn back_refs<T>(rows: &[T], owner: fn(&T) -> i64, id: fn(&T) -> i64) -> HashMap<i64, Vec<i64>> {
    let mut refs: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        refs.entry(owner(row)).or_default().push(id(row));
    }
    refs
}

impl CatalogStore {
    /// Creates an empty catalog
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a catalog from seed rows, checking ids and references
    pub fn new(seed: Seed) -> Result<Self, CatalogError> {
        let Seed {
            mut customers,
            mut menu_items,
            mut orders,
            mut order_items,
        } = seed;

        check_unique(Collection::Customers, &customers, |c| c.id)?;
        check_unique(Collection::MenuItems, &menu_items, |m| m.id)?;
        check_unique(Collection::Orders, &orders, |o| o.id)?;
        check_unique(Collection::OrderItems, &order_items, |i| i.id)?;

        let customer_ids: HashSet<i64> = customers.iter().map(|c| c.id).collect();
        let menu_ids: HashSet<i64> = menu_items.iter().map(|m| m.id).collect();
        let order_ids: HashSet<i64> = orders.iter().map(|o| o.id).collect();

        for order in &orders {
            if !customer_ids.contains(&order.customer_id) {
                return Err(CatalogError::DanglingReference {
                    collection: Collection::Orders,
                    id: order.id,
                    field: "customerID",
                    target: order.customer_id,
                });
            }
        }
        for item in &order_items {
            if !order_ids.contains(&item.order_id) {
                return Err(CatalogError::DanglingReference {
                    collection: Collection::OrderItems,
                    id: item.id,
                    field: "orderID",
                    target: item.order_id,
                });
            }
            if !menu_ids.contains(&item.menu_item_id) {
                return Err(CatalogError::DanglingReference {
                    collection: Collection::OrderItems,
                    id: item.id,
                    field: "menuItemID",
                    target: item.menu_item_id,
                });
            }
        }

        // Back-reference id lists
        let mut by_customer = back_refs(&orders, |o| o.customer_id, |o| o.id);
        let mut by_menu = back_refs(&order_items, |i| i.menu_item_id, |i| i.id);
        let mut by_order = back_refs(&order_items, |i| i.order_id, |i| i.id);

        for customer in &mut customers {
            customer.orders = by_customer.remove(&customer.id).unwrap_or_default();
        }
        for menu_item in &mut menu_items {
            menu_item.order_items = by_menu.remove(&menu_item.id).unwrap_or_default();
        }
        for order in &mut orders {
            order.order_items = by_order.remove(&order.id).unwrap_or_default();
            order.customer = None;
        }
        for item in &mut order_items {
            item.order = None;
            item.menu_item = None;
        }

        // Linked snapshot
        let customer_map: HashMap<i64, &Customer> = customers.iter().map(|c| (c.id, c)).collect();
        let linked_orders: Vec<Order> = orders
            .iter()
            .map(|o| {
                let mut linked = o.clone();
                linked.customer = customer_map.get(&o.customer_id).map(|c| (*c).clone());
                linked
            })
            .collect();

        let order_map: HashMap<i64, &Order> = linked_orders.iter().map(|o| (o.id, o)).collect();
        let menu_map: HashMap<i64, &MenuItem> = menu_items.iter().map(|m| (m.id, m)).collect();
        let linked_items: Vec<OrderItem> = order_items
            .iter()
            .map(|i| {
                let mut linked = i.clone();
                linked.order = order_map.get(&i.order_id).map(|o| (*o).clone());
                linked.menu_item = menu_map.get(&i.menu_item_id).map(|m| (*m).clone());
                linked
            })
            .collect();

        let customers = Arc::new(customers);
        let menu_items = Arc::new(menu_items);

        Ok(Self {
            plain: Tables {
                customers: Arc::clone(&customers),
                menu_items: Arc::clone(&menu_items),
                orders: Arc::new(orders),
                order_items: Arc::new(order_items),
            },
            linked: Tables {
                customers,
                menu_items,
                orders: Arc::new(linked_orders),
                order_items: Arc::new(linked_items),
            },
        })
    }

    /// Parses seed JSON and builds a catalog
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let seed: Seed = serde_json::from_str(json)?;
        Self::new(seed)
    }

    /// Loads a seed file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store = Self::from_json(&json)?;

        let rows = store.total_rows().to_string();
        let path = path.display().to_string();
        log_event_with_fields(Event::SeedLoaded, &[("path", &path), ("rows", &rows)]);

        Ok(store)
    }

    /// Starts a query over one collection.
    ///
    /// `linked` selects the snapshot with navigation properties loaded.
    pub fn query<E: CatalogEntity>(&self, linked: bool) -> InMemoryCollection<E> {
        let tables = if linked { &self.linked } else { &self.plain };
        InMemoryCollection::new(Arc::clone(E::table(tables)))
    }

    /// Looks up one row by primary key, without navigation loaded
    pub fn get<E: CatalogEntity>(&self, id: i64) -> Option<E> {
        E::table(&self.plain).iter().find(|row| row.id() == id).cloned()
    }

    /// Menu items ordered in one order, one per order item in storage order.
    ///
    /// An unknown order has no items.
    pub fn order_details(&self, order_id: i64) -> Vec<MenuItem> {
        self.plain
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .filter_map(|item| self.get::<MenuItem>(item.menu_item_id))
            .collect()
    }

    /// Orders placed by the first customer with this exact email.
    ///
    /// An unknown email has no orders.
    pub fn orders_for_email(&self, email: &str) -> Vec<Order> {
        let Some(customer) = self.plain.customers.iter().find(|c| c.email == email) else {
            return Vec::new();
        };
        self.plain
            .orders
            .iter()
            .filter(|order| order.customer_id == customer.id)
            .cloned()
            .collect()
    }

    /// Returns the number of rows in a collection
    pub fn len(&self, collection: Collection) -> usize {
        match collection {
            Collection::Customers => self.plain.customers.len(),
            Collection::MenuItems => self.plain.menu_items.len(),
            Collection::Orders => self.plain.orders.len(),
            Collection::OrderItems => self.plain.order_items.len(),
        }
    }

    pub fn total_rows(&self) -> usize {
        Collection::ALL.iter().map(|c| self.len(*c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Queryable;

    const SEED: &str = r#"{
        "customers": [
            {"id": 1, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
             "firstName": "Ada", "lastName": "Byron", "email": "ada@example.com"}
        ],
        "menuItems": [
            {"id": 10, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
             "itemName": "Risotto", "price": 12.5, "category": "main"}
        ],
        "orders": [
            {"id": 100, "createdOn": "2024-02-01T00:00:00Z", "updatedOn": "2024-02-01T00:00:00Z",
             "customerID": 1, "orderDate": "2024-02-01T12:00:00Z", "totalAmount": 25.0,
             "status": "open"}
        ],
        "orderItems": [
            {"id": 1000, "createdOn": "2024-02-01T00:00:00Z", "updatedOn": "2024-02-01T00:00:00Z",
             "orderID": 100, "menuItemID": 10, "quantity": 2, "unitPrice": 12.5}
        ]
    }"#;

    #[test]
    fn test_collection_names_case_insensitive() {
        assert_eq!("MENUITEMS".parse::<Collection>().unwrap(), Collection::MenuItems);
        assert!("tables".parse::<Collection>().is_err());
    }

    #[test]
    fn test_back_references_filled() {
        let store = CatalogStore::from_json(SEED).unwrap();
        assert_eq!(store.plain.customers[0].orders, vec![100]);
        assert_eq!(store.plain.orders[0].order_items, vec![1000]);
        assert_eq!(store.total_rows(), 4);
    }

    #[tokio::test]
    async fn test_linked_snapshot_loads_navigation() {
        let store = CatalogStore::from_json(SEED).unwrap();

        let plain = store.query::<OrderItem>(false).materialize().await.unwrap();
        assert!(plain[0].order.is_none());

        let linked = store.query::<OrderItem>(true).materialize().await.unwrap();
        let order = linked[0].order.as_ref().unwrap();
        assert_eq!(order.customer.as_ref().unwrap().first_name, "Ada");
        assert_eq!(linked[0].menu_item.as_ref().unwrap().item_name, "Risotto");
    }

    #[test]
    fn test_get_by_id() {
        let store = CatalogStore::from_json(SEED).unwrap();
        let order = store.get::<Order>(100).unwrap();
        assert_eq!(order.status, "open");
        assert!(order.customer.is_none());
        assert!(store.get::<Order>(101).is_none());
        assert_eq!(store.get::<MenuItem>(10).unwrap().item_name, "Risotto");
    }

    #[test]
    fn test_order_details_and_orders_for_email() {
        let store = CatalogStore::from_json(SEED).unwrap();

        let details = store.order_details(100);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, 10);
        assert!(store.order_details(999).is_empty());

        let orders = store.orders_for_email("ada@example.com");
        assert_eq!(orders.iter().map(|o| o.id).collect::<Vec<_>>(), vec![100]);
        assert!(store.orders_for_email("nobody@example.com").is_empty());
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let seed = SEED.replace("\"customerID\": 1", "\"customerID\": 9");
        let err = CatalogStore::from_json(&seed).unwrap_err();
        assert_eq!(err.code(), "CATALOG_DANGLING_REFERENCE");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut seed: Seed = serde_json::from_str(SEED).unwrap();
        let copy = seed.customers[0].clone();
        seed.customers.push(copy);
        let err = CatalogStore::new(seed).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { id: 1, .. }));
    }
}
