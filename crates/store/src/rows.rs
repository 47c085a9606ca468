//! Storage-shaped row types and their mapping into domain records.
//!
//! Rows are decoded column-by-column (`try_get`) so a schema drift shows up as
//! a decode error naming the column, not a silent default.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use orderdesk_core::{CategoryId, CustomerCode, EmployeeId, OrderId, ProductId, ShipperId, SupplierId};
use orderdesk_orders::{
    Category, Customer, Employee, Order, OrderDetail, OrderRepositoryError, Product, RepositoryResult,
    Shipper, ShippingAddress, Supplier,
};

/// The order row joined with its customer, employee and shipper.
#[derive(Debug)]
pub struct OrderRow {
    pub order_id: i64,
    pub customer_id: Option<String>,
    pub employee_id: i64,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub ship_via: i64,
    pub freight: f64,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: Option<String>,
    pub customer_company_name: Option<String>,
    pub employee_first_name: Option<String>,
    pub employee_last_name: Option<String>,
    pub employee_country: Option<String>,
    pub shipper_company_name: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for OrderRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            order_id: row.try_get("order_id")?,
            customer_id: row.try_get("customer_id")?,
            employee_id: row.try_get("employee_id")?,
            order_date: row.try_get("order_date")?,
            required_date: row.try_get("required_date")?,
            shipped_date: row.try_get("shipped_date")?,
            ship_via: row.try_get("ship_via")?,
            freight: row.try_get("freight")?,
            ship_name: row.try_get("ship_name")?,
            ship_address: row.try_get("ship_address")?,
            ship_city: row.try_get("ship_city")?,
            ship_region: row.try_get("ship_region")?,
            ship_postal_code: row.try_get("ship_postal_code")?,
            ship_country: row.try_get("ship_country")?,
            customer_company_name: row.try_get("customer_company_name")?,
            employee_first_name: row.try_get("employee_first_name")?,
            employee_last_name: row.try_get("employee_last_name")?,
            employee_country: row.try_get("employee_country")?,
            shipper_company_name: row.try_get("shipper_company_name")?,
        })
    }
}

impl OrderRow {
    /// Assemble the domain aggregate from this row and its detail rows.
    pub fn into_order(self, details: Vec<OrderDetail>) -> RepositoryResult<Order> {
        let code = self.customer_id.as_deref().ok_or_else(|| {
            OrderRepositoryError::repository("order row has no customer reference")
        })?;
        let code = CustomerCode::new(code).map_err(|e| {
            OrderRepositoryError::repository(format!("order row has a malformed customer code: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.order_id),
            order_date: self.order_date,
            required_date: self.required_date,
            shipped_date: self.shipped_date,
            freight: self.freight,
            ship_name: self.ship_name,
            shipping_address: ShippingAddress {
                address: self.ship_address.unwrap_or_default(),
                city: self.ship_city.unwrap_or_default(),
                region: self.ship_region,
                postal_code: self.ship_postal_code.unwrap_or_default(),
                country: self.ship_country.unwrap_or_default(),
            },
            customer: Customer {
                code,
                company_name: self.customer_company_name,
            },
            employee: Employee {
                id: EmployeeId::new(self.employee_id),
                first_name: self.employee_first_name,
                last_name: self.employee_last_name,
                country: self.employee_country,
            },
            shipper: Shipper {
                id: ShipperId::new(self.ship_via),
                company_name: self.shipper_company_name,
            },
            details,
        })
    }
}

/// A detail row joined with its product and the product's category/supplier.
#[derive(Debug)]
pub struct OrderDetailRow {
    pub product_id: i64,
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
    /// Product key re-selected from the joined products table; `None` means the
    /// referenced product row is missing.
    pub joined_product_id: Option<i64>,
    pub product_name: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub category_name: Option<String>,
    pub supplier_company_name: Option<String>,
}

impl<'r> FromRow<'r, SqliteRow> for OrderDetailRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(OrderDetailRow {
            product_id: row.try_get("product_id")?,
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            discount: row.try_get("discount")?,
            joined_product_id: row.try_get("joined_product_id")?,
            product_name: row.try_get("product_name")?,
            category_id: row.try_get("category_id")?,
            supplier_id: row.try_get("supplier_id")?,
            category_name: row.try_get("category_name")?,
            supplier_company_name: row.try_get("supplier_company_name")?,
        })
    }
}

impl OrderDetailRow {
    /// Resolve the joined columns into a fully populated detail, failing on a
    /// corrupt or incompletely loaded aggregate.
    pub fn into_detail(self) -> RepositoryResult<OrderDetail> {
        if self.joined_product_id.is_none() {
            return Err(OrderRepositoryError::repository(
                "unable to load the product of an order detail",
            ));
        }

        let (Some(category_id), Some(supplier_id)) = (self.category_id, self.supplier_id) else {
            return Err(OrderRepositoryError::repository(
                "unable to load the supplier or category of a product",
            ));
        };

        Ok(OrderDetail {
            product: Product {
                id: ProductId::new(self.product_id),
                name: self.product_name,
                category: Some(Category {
                    id: CategoryId::new(category_id),
                    name: self.category_name,
                }),
                supplier: Some(Supplier {
                    id: SupplierId::new(supplier_id),
                    company_name: self.supplier_company_name,
                }),
            },
            unit_price: self.unit_price,
            quantity: self.quantity,
            discount: self.discount,
        })
    }
}
