//! SQLite-backed implementation of the order repository.
//!
//! Writes that touch more than one row run inside a single transaction; a
//! transaction dropped before commit rolls back, so every error path aborts
//! the whole write. Reference rows (customer, employee, shipper, category,
//! product) are created on first use and never modified afterwards.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use tracing::instrument;

use orderdesk_core::OrderId;
use orderdesk_orders::{
    Category, Customer, Employee, NewOrder, NewOrderDetail, Order, OrderRepository,
    OrderRepositoryError, Product, RepositoryResult, Shipper, ShippingAddress,
};

use crate::rows::{OrderDetailRow, OrderRow};

const SELECT_ORDER: &str = r#"
SELECT
    o.order_id, o.customer_id, o.employee_id, o.order_date, o.required_date,
    o.shipped_date, o.ship_via, o.freight, o.ship_name, o.ship_address,
    o.ship_city, o.ship_region, o.ship_postal_code, o.ship_country,
    c.company_name AS customer_company_name,
    e.first_name   AS employee_first_name,
    e.last_name    AS employee_last_name,
    e.country      AS employee_country,
    s.company_name AS shipper_company_name
FROM orders o
LEFT JOIN customers c ON c.customer_id = o.customer_id
LEFT JOIN employees e ON e.employee_id = o.employee_id
LEFT JOIN shippers  s ON s.shipper_id  = o.ship_via
WHERE o.order_id = ?
"#;

const SELECT_ORDER_DETAILS: &str = r#"
SELECT
    d.product_id, d.unit_price, d.quantity, d.discount,
    p.product_id   AS joined_product_id,
    p.product_name, p.category_id, p.supplier_id,
    c.category_name,
    s.company_name AS supplier_company_name
FROM order_details d
LEFT JOIN products   p ON p.product_id  = d.product_id
LEFT JOIN categories c ON c.category_id = p.category_id
LEFT JOIN suppliers  s ON s.supplier_id = p.supplier_id
WHERE d.order_id = ?
ORDER BY d.rowid
"#;

/// Order repository over a SQLite pool.
///
/// Clone-cheap; the pool handles connection management, so the repository can
/// be shared across request handlers.
#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    #[instrument(skip(self), err)]
    async fn get_order(&self, order_id: OrderId) -> RepositoryResult<Order> {
        // Non-positive ids can never match a stored row; skip the round trip.
        if !order_id.is_positive() {
            return Err(OrderRepositoryError::OrderNotFound(order_id));
        }

        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(order_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_order", e))?;

        let Some(row) = row else {
            return Err(OrderRepositoryError::OrderNotFound(order_id));
        };

        let detail_rows: Vec<OrderDetailRow> = sqlx::query_as(SELECT_ORDER_DETAILS)
            .bind(order_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_order_details", e))?;

        let details = detail_rows
            .into_iter()
            .map(OrderDetailRow::into_detail)
            .collect::<RepositoryResult<Vec<_>>>()?;

        row.into_order(details)
    }

    #[instrument(skip(self), err)]
    async fn list_orders(&self, skip: i64, count: i64) -> RepositoryResult<Vec<OrderId>> {
        if skip < 0 {
            return Err(OrderRepositoryError::OutOfRange(
                "skip value cannot be negative",
            ));
        }
        if count <= 0 {
            return Err(OrderRepositoryError::OutOfRange(
                "count value must be greater than zero",
            ));
        }

        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT order_id FROM orders ORDER BY order_id LIMIT ? OFFSET ?")
                .bind(count)
                .bind(skip)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("select_order_ids", e))?;

        Ok(ids.into_iter().map(OrderId::new).collect())
    }

    #[instrument(skip(self, order), err)]
    async fn add_order(&self, order: &NewOrder) -> RepositoryResult<OrderId> {
        // Validate the whole aggregate before the first write so a bad line
        // never leaves partial rows behind.
        order
            .validate()
            .map_err(|e| OrderRepositoryError::repository(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        ensure_reference(
            &mut tx,
            &CustomerSeed {
                customer: &order.customer,
                address: &order.shipping_address,
            },
        )
        .await?;
        ensure_reference(&mut tx, &EmployeeSeed(&order.employee)).await?;
        ensure_reference(&mut tx, &ShipperSeed(&order.shipper)).await?;

        let order_id = insert_order_row(&mut tx, order).await?;

        for detail in &order.details {
            if let Some(category) = &detail.product.category {
                ensure_reference(&mut tx, &CategorySeed(category)).await?;
            }
            ensure_reference(&mut tx, &ProductSeed(&detail.product)).await?;
            insert_detail_row(&mut tx, order_id, detail).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(order_id)
    }

    #[instrument(skip(self, order), err)]
    async fn update_order(&self, order_id: OrderId, order: &NewOrder) -> RepositoryResult<()> {
        order
            .validate()
            .map_err(|e| OrderRepositoryError::repository(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let existing = sqlx::query("SELECT 1 FROM orders WHERE order_id = ?")
            .bind(order_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("select_order", e))?;
        if existing.is_none() {
            return Err(OrderRepositoryError::OrderNotFound(order_id));
        }

        // Full replace of the scalar and reference fields.
        sqlx::query(
            r#"
            UPDATE orders SET
                customer_id = ?, employee_id = ?, order_date = ?, required_date = ?,
                shipped_date = ?, ship_via = ?, freight = ?, ship_name = ?,
                ship_address = ?, ship_city = ?, ship_region = ?,
                ship_postal_code = ?, ship_country = ?
            WHERE order_id = ?
            "#,
        )
        .bind(order.customer.code.as_str())
        .bind(order.employee.id.get())
        .bind(order.order_date)
        .bind(order.required_date)
        .bind(order.shipped_date)
        .bind(order.shipper.id.get())
        .bind(order.freight)
        .bind(order.ship_name.as_deref())
        .bind(&order.shipping_address.address)
        .bind(&order.shipping_address.city)
        .bind(order.shipping_address.region.as_deref())
        .bind(&order.shipping_address.postal_code)
        .bind(&order.shipping_address.country)
        .bind(order_id.get())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_order", e))?;

        // Full replace of the line-item set: drop everything, re-insert.
        sqlx::query("DELETE FROM order_details WHERE order_id = ?")
            .bind(order_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_details", e))?;

        for detail in &order.details {
            // Unlike the add path, an updated line must reference a product
            // that already exists, together with its current supplier and
            // category rows.
            let product = sqlx::query("SELECT 1 FROM products WHERE product_id = ?")
                .bind(detail.product.id.get())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("select_product", e))?;
            if product.is_none() {
                return Err(OrderRepositoryError::repository(format!(
                    "unknown product {} on an order detail",
                    detail.product.id
                )));
            }

            insert_detail_row(&mut tx, order_id, detail).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn remove_order(&self, order_id: OrderId) -> RepositoryResult<()> {
        if !order_id.is_positive() {
            return Err(OrderRepositoryError::OutOfRange(
                "order id must be greater than zero",
            ));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;

        let existing = sqlx::query("SELECT 1 FROM orders WHERE order_id = ?")
            .bind(order_id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("select_order", e))?;
        if existing.is_none() {
            return Err(OrderRepositoryError::OrderNotFound(order_id));
        }

        // Details first to satisfy the foreign-key dependency.
        sqlx::query("DELETE FROM order_details WHERE order_id = ?")
            .bind(order_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_details", e))?;

        let result = sqlx::query("DELETE FROM orders WHERE order_id = ?")
            .bind(order_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        if result.rows_affected() == 0 {
            return Err(OrderRepositoryError::repository(
                "failed to delete order record",
            ));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(())
    }
}

async fn insert_order_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order: &NewOrder,
) -> RepositoryResult<OrderId> {
    let result = sqlx::query(
        r#"
        INSERT INTO orders (
            customer_id, employee_id, order_date, required_date, shipped_date,
            ship_via, freight, ship_name, ship_address, ship_city, ship_region,
            ship_postal_code, ship_country
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order.customer.code.as_str())
    .bind(order.employee.id.get())
    .bind(order.order_date)
    .bind(order.required_date)
    .bind(order.shipped_date)
    .bind(order.shipper.id.get())
    .bind(order.freight)
    .bind(order.ship_name.as_deref())
    .bind(&order.shipping_address.address)
    .bind(&order.shipping_address.city)
    .bind(order.shipping_address.region.as_deref())
    .bind(&order.shipping_address.postal_code)
    .bind(&order.shipping_address.country)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_order", e))?;

    if result.rows_affected() == 0 {
        return Err(OrderRepositoryError::repository(
            "failed to create order record",
        ));
    }

    Ok(OrderId::new(result.last_insert_rowid()))
}

async fn insert_detail_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    order_id: OrderId,
    detail: &NewOrderDetail,
) -> RepositoryResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO order_details (order_id, product_id, unit_price, quantity, discount)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(order_id.get())
    .bind(detail.product.id.get())
    .bind(detail.unit_price)
    .bind(detail.quantity)
    .bind(detail.discount)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_order_detail", e))?;

    if result.rows_affected() == 0 {
        return Err(OrderRepositoryError::repository(
            "failed to create order detail record",
        ));
    }

    Ok(())
}

/// A reference row that can be created on demand: check existence by key,
/// insert when absent. Existing rows are never updated here.
#[async_trait]
trait ReferenceSeed {
    /// Entity kind, used in error messages.
    const KIND: &'static str;

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error>;

    /// Insert the row, returning the affected-row count.
    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error>;
}

/// Get-or-create: the single pattern shared by every reference table.
async fn ensure_reference<R: ReferenceSeed + Sync>(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    seed: &R,
) -> RepositoryResult<()> {
    let conn: &mut SqliteConnection = &mut *tx;

    if seed
        .exists(conn)
        .await
        .map_err(|e| map_sqlx_error(R::KIND, e))?
    {
        return Ok(());
    }

    let affected = seed
        .insert(conn)
        .await
        .map_err(|e| map_sqlx_error(R::KIND, e))?;
    if affected == 0 {
        return Err(OrderRepositoryError::repository(format!(
            "failed to create {} record",
            R::KIND
        )));
    }

    Ok(())
}

/// Customer created from an incoming order; address columns are taken from the
/// order's shipping address.
struct CustomerSeed<'a> {
    customer: &'a Customer,
    address: &'a ShippingAddress,
}

#[async_trait]
impl ReferenceSeed for CustomerSeed<'_> {
    const KIND: &'static str = "customer";

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM customers WHERE customer_id = ?")
            .bind(self.customer.code.as_str())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (customer_id, company_name, address, city, region, postal_code, country)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.customer.code.as_str())
        .bind(self.customer.company_name.as_deref())
        .bind(&self.address.address)
        .bind(&self.address.city)
        .bind(self.address.region.as_deref())
        .bind(&self.address.postal_code)
        .bind(&self.address.country)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

struct EmployeeSeed<'a>(&'a Employee);

#[async_trait]
impl ReferenceSeed for EmployeeSeed<'_> {
    const KIND: &'static str = "employee";

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM employees WHERE employee_id = ?")
            .bind(self.0.id.get())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO employees (employee_id, first_name, last_name, country) VALUES (?, ?, ?, ?)",
        )
        .bind(self.0.id.get())
        .bind(self.0.first_name.as_deref())
        .bind(self.0.last_name.as_deref())
        .bind(self.0.country.as_deref())
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

struct ShipperSeed<'a>(&'a Shipper);

#[async_trait]
impl ReferenceSeed for ShipperSeed<'_> {
    const KIND: &'static str = "shipper";

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM shippers WHERE shipper_id = ?")
            .bind(self.0.id.get())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO shippers (shipper_id, company_name) VALUES (?, ?)")
            .bind(self.0.id.get())
            .bind(self.0.company_name.as_deref())
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}

struct CategorySeed<'a>(&'a Category);

#[async_trait]
impl ReferenceSeed for CategorySeed<'_> {
    const KIND: &'static str = "category";

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM categories WHERE category_id = ?")
            .bind(self.0.id.get())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO categories (category_id, category_name) VALUES (?, ?)")
                .bind(self.0.id.get())
                .bind(self.0.name.as_deref())
                .execute(&mut *conn)
                .await?;
        Ok(result.rows_affected())
    }
}

struct ProductSeed<'a>(&'a Product);

#[async_trait]
impl ReferenceSeed for ProductSeed<'_> {
    const KIND: &'static str = "product";

    async fn exists(&self, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM products WHERE product_id = ?")
            .bind(self.0.id.get())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO products (product_id, product_name, category_id) VALUES (?, ?, ?)",
        )
        .bind(self.0.id.get())
        .bind(self.0.name.as_deref())
        .bind(self.0.category.as_ref().map(|c| c.id.get()))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> OrderRepositoryError {
    OrderRepositoryError::wrap(format!("database failure in {operation}"), err)
}
