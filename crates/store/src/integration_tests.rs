//! Repository tests against an in-memory SQLite database.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePool;

use orderdesk_core::{CustomerCode, EmployeeId, OrderId, ProductId, ShipperId};
use orderdesk_orders::{
    Customer, Employee, NewOrder, NewOrderDetail, OrderRepository, OrderRepositoryError, Product,
    Shipper, ShippingAddress,
};

use crate::repository::SqliteOrderRepository;
use crate::schema::Store;

async fn test_store() -> Store {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    store.migrate().await.unwrap();
    store
}

/// Classic reference rows the write path expects to find (seeded, the way the
/// original sample database ships them).
async fn seed_reference_data(pool: &SqlitePool) {
    sqlx::raw_sql(
        r#"
        INSERT INTO categories (category_id, category_name) VALUES (4, 'Dairy Products');
        INSERT INTO suppliers (supplier_id, company_name) VALUES (5, 'Cooperativa de Quesos Las Cabras');
        INSERT INTO customers (customer_id, company_name) VALUES ('ALFKI', 'Alfreds Futterkiste');
        INSERT INTO employees (employee_id, first_name, last_name, country) VALUES (1, 'Nancy', 'Davolio', 'USA');
        INSERT INTO shippers (shipper_id, company_name) VALUES (1, 'Speedy Express');
        INSERT INTO products (product_id, product_name, supplier_id, category_id, unit_price)
            VALUES (11, 'Queso Cabrales', 5, 4, 21.0);
        INSERT INTO products (product_id, product_name, supplier_id, category_id, unit_price)
            VALUES (42, 'Singaporean Hokkien Fried Mee', 5, 4, 14.0);
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

fn order_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1996, 7, 4, 0, 0, 0).unwrap()
}

fn required_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1996, 8, 1, 0, 0, 0).unwrap()
}

fn detail(product_id: i64, unit_price: f64, quantity: i32, discount: f64) -> NewOrderDetail {
    NewOrderDetail {
        product: Product::new(ProductId::new(product_id)),
        unit_price,
        quantity,
        discount,
    }
}

fn sample_order(details: Vec<NewOrderDetail>) -> NewOrder {
    NewOrder {
        order_date: order_date(),
        required_date: required_date(),
        shipped_date: None,
        freight: 32.38,
        ship_name: Some("Alfreds Futterkiste".to_string()),
        shipping_address: ShippingAddress {
            address: "Obere Str. 57".to_string(),
            city: "Berlin".to_string(),
            region: None,
            postal_code: "12209".to_string(),
            country: "Germany".to_string(),
        },
        customer: Customer::new(CustomerCode::new("ALFKI").unwrap()),
        employee: Employee::new(EmployeeId::new(1)),
        shipper: Shipper::new(ShipperId::new(1)),
        details,
    }
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn get_order_rejects_non_positive_ids_before_touching_storage() {
    // No schema: a query against this store would fail with a database error,
    // so the typed not-found error proves the precondition short-circuits.
    let store = Store::connect("sqlite::memory:").await.unwrap();
    let repo = SqliteOrderRepository::new(store.pool().clone());

    for id in [0, -1, -42] {
        let err = repo.get_order(OrderId::new(id)).await.unwrap_err();
        assert!(matches!(err, OrderRepositoryError::OrderNotFound(_)));
    }
}

#[tokio::test]
async fn remove_order_rejects_non_positive_ids_before_touching_storage() {
    let store = Store::connect("sqlite::memory:").await.unwrap();
    let repo = SqliteOrderRepository::new(store.pool().clone());

    for id in [0, -1] {
        let err = repo.remove_order(OrderId::new(id)).await.unwrap_err();
        assert!(matches!(err, OrderRepositoryError::OutOfRange(_)));
    }
}

#[tokio::test]
async fn get_order_returns_not_found_for_missing_rows() {
    let store = test_store().await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let err = repo.get_order(OrderId::new(10_248)).await.unwrap_err();
    assert!(matches!(err, OrderRepositoryError::OrderNotFound(_)));
}

#[tokio::test]
async fn add_then_get_round_trips_the_full_aggregate() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let order_id = repo
        .add_order(&sample_order(vec![detail(11, 18.0, 5, 0.0)]))
        .await
        .unwrap();
    assert!(order_id.is_positive());

    let order = repo.get_order(order_id).await.unwrap();
    assert_eq!(order.id, order_id);
    assert_eq!(order.order_date, order_date());
    assert_eq!(order.required_date, required_date());
    assert_eq!(order.shipped_date, None);
    assert_eq!(order.freight, 32.38);
    assert_eq!(order.shipping_address.city, "Berlin");
    assert_eq!(order.shipping_address.country, "Germany");

    // Every cross-reference comes back as a resolved sub-object.
    assert_eq!(order.customer.code.as_str(), "ALFKI");
    assert_eq!(
        order.customer.company_name.as_deref(),
        Some("Alfreds Futterkiste")
    );
    assert_eq!(order.employee.id.get(), 1);
    assert_eq!(order.employee.first_name.as_deref(), Some("Nancy"));
    assert_eq!(order.shipper.id.get(), 1);
    assert_eq!(order.shipper.company_name.as_deref(), Some("Speedy Express"));

    assert_eq!(order.details.len(), 1);
    let line = &order.details[0];
    assert_eq!(line.quantity, 5);
    assert_eq!(line.unit_price, 18.0);
    assert_eq!(line.discount, 0.0);
    assert_eq!(line.product.id.get(), 11);
    assert_eq!(line.product.name.as_deref(), Some("Queso Cabrales"));
    assert_eq!(
        line.product.category.as_ref().unwrap().name.as_deref(),
        Some("Dairy Products")
    );
    assert_eq!(line.product.supplier.as_ref().unwrap().id.get(), 5);
}

#[tokio::test]
async fn existing_reference_rows_are_not_duplicated() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    repo.add_order(&sample_order(vec![detail(11, 18.0, 5, 0.0)]))
        .await
        .unwrap();
    repo.add_order(&sample_order(vec![detail(11, 18.0, 2, 0.1)]))
        .await
        .unwrap();

    assert_eq!(count(store.pool(), "customers").await, 1);
    assert_eq!(count(store.pool(), "employees").await, 1);
    assert_eq!(count(store.pool(), "shippers").await, 1);
    assert_eq!(count(store.pool(), "categories").await, 1);
    assert_eq!(count(store.pool(), "products").await, 2);
    assert_eq!(count(store.pool(), "orders").await, 2);
}

#[tokio::test]
async fn missing_references_are_created_on_demand() {
    let store = test_store().await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    // Empty database: customer, employee, shipper and product all get created
    // from the keys the order carries.
    let order_id = repo
        .add_order(&sample_order(vec![detail(77, 9.5, 3, 0.0)]))
        .await
        .unwrap();
    assert!(order_id.is_positive());

    assert_eq!(count(store.pool(), "customers").await, 1);
    assert_eq!(count(store.pool(), "employees").await, 1);
    assert_eq!(count(store.pool(), "shippers").await, 1);
    assert_eq!(count(store.pool(), "products").await, 1);

    // The on-demand product has no supplier or category, so the eager read
    // flags the aggregate as incompletely referenced.
    let err = repo.get_order(order_id).await.unwrap_err();
    assert!(matches!(err, OrderRepositoryError::Repository { .. }));
}

#[tokio::test]
async fn invalid_details_leave_nothing_committed() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let invalid = [
        detail(11, 18.0, 0, 0.0),   // quantity
        detail(11, 18.0, -3, 0.0),  // quantity
        detail(11, 0.0, 5, 0.0),    // unit price
        detail(11, -1.0, 5, 0.0),   // unit price
        detail(11, 18.0, 5, -0.1),  // discount
        detail(0, 18.0, 5, 0.0),    // product id
    ];

    for bad in invalid {
        let err = repo
            .add_order(&sample_order(vec![detail(42, 14.0, 1, 0.0), bad]))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderRepositoryError::Repository { .. }));
    }

    assert_eq!(count(store.pool(), "orders").await, 0);
    assert_eq!(count(store.pool(), "order_details").await, 0);
}

#[tokio::test]
async fn update_replaces_the_full_detail_set() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let order_id = repo
        .add_order(&sample_order(vec![detail(11, 18.0, 5, 0.0)]))
        .await
        .unwrap();

    let mut replacement = sample_order(vec![detail(42, 14.0, 7, 0.25)]);
    replacement.freight = 99.0;
    replacement.ship_name = Some("Around the Horn".to_string());
    repo.update_order(order_id, &replacement).await.unwrap();

    let order = repo.get_order(order_id).await.unwrap();
    assert_eq!(order.freight, 99.0);
    assert_eq!(order.ship_name.as_deref(), Some("Around the Horn"));
    assert_eq!(order.details.len(), 1);
    assert_eq!(order.details[0].product.id.get(), 42);
    assert_eq!(order.details[0].quantity, 7);
    assert_eq!(order.details[0].discount, 0.25);
}

#[tokio::test]
async fn update_accepts_a_zero_discount() {
    // Zero is a legitimate discount on update as well as on add.
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let order_id = repo
        .add_order(&sample_order(vec![detail(11, 18.0, 5, 0.15)]))
        .await
        .unwrap();

    repo.update_order(order_id, &sample_order(vec![detail(11, 18.0, 5, 0.0)]))
        .await
        .unwrap();

    let order = repo.get_order(order_id).await.unwrap();
    assert_eq!(order.details[0].discount, 0.0);
}

#[tokio::test]
async fn update_of_a_missing_order_is_not_found() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let err = repo
        .update_order(OrderId::new(10_248), &sample_order(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderRepositoryError::OrderNotFound(_)));
}

#[tokio::test]
async fn update_with_an_unknown_product_rolls_back_wholesale() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let order_id = repo
        .add_order(&sample_order(vec![detail(11, 18.0, 5, 0.0)]))
        .await
        .unwrap();

    let err = repo
        .update_order(
            order_id,
            &sample_order(vec![detail(42, 14.0, 1, 0.0), detail(999, 5.0, 1, 0.0)]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderRepositoryError::Repository { .. }));

    // The transaction covers the whole replace: the original line survives.
    let order = repo.get_order(order_id).await.unwrap();
    assert_eq!(order.details.len(), 1);
    assert_eq!(order.details[0].product.id.get(), 11);
}

#[tokio::test]
async fn remove_deletes_the_order_and_its_details() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let order_id = repo
        .add_order(&sample_order(vec![
            detail(11, 18.0, 5, 0.0),
            detail(42, 14.0, 2, 0.0),
        ]))
        .await
        .unwrap();

    repo.remove_order(order_id).await.unwrap();

    assert_eq!(count(store.pool(), "orders").await, 0);
    assert_eq!(count(store.pool(), "order_details").await, 0);

    let err = repo.get_order(order_id).await.unwrap_err();
    assert!(matches!(err, OrderRepositoryError::OrderNotFound(_)));

    // Reference rows persist independently of the orders that created them.
    assert_eq!(count(store.pool(), "customers").await, 1);
    assert_eq!(count(store.pool(), "products").await, 2);
}

#[tokio::test]
async fn remove_of_a_missing_order_is_not_found() {
    let store = test_store().await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let err = repo.remove_order(OrderId::new(10_248)).await.unwrap_err();
    assert!(matches!(err, OrderRepositoryError::OrderNotFound(_)));
}

#[tokio::test]
async fn list_orders_pages_in_insertion_order() {
    let store = test_store().await;
    seed_reference_data(store.pool()).await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    let mut inserted = Vec::new();
    for _ in 0..15 {
        inserted.push(
            repo.add_order(&sample_order(vec![detail(11, 18.0, 1, 0.0)]))
                .await
                .unwrap(),
        );
    }

    let first_page = repo.list_orders(0, 10).await.unwrap();
    assert_eq!(first_page, &inserted[..10]);

    let second_page = repo.list_orders(10, 10).await.unwrap();
    assert_eq!(second_page, &inserted[10..]);

    let beyond = repo.list_orders(15, 10).await.unwrap();
    assert!(beyond.is_empty());
}

#[tokio::test]
async fn list_orders_rejects_bad_bounds() {
    let store = test_store().await;
    let repo = SqliteOrderRepository::new(store.pool().clone());

    assert!(matches!(
        repo.list_orders(-1, 10).await.unwrap_err(),
        OrderRepositoryError::OutOfRange(_)
    ));
    assert!(matches!(
        repo.list_orders(0, 0).await.unwrap_err(),
        OrderRepositoryError::OutOfRange(_)
    ));
    assert!(matches!(
        repo.list_orders(0, -5).await.unwrap_err(),
        OrderRepositoryError::OutOfRange(_)
    ));
}
