//! Connection handling and schema migration.
//!
//! The eight tables mirror the classic Northwind layout; string columns carry
//! the reference lengths as type affinities. Non-key columns of the reference
//! tables are nullable so that rows created on demand from a brief order
//! (key-only data) can be stored.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Idempotent DDL, applied at startup.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    category_id   INTEGER PRIMARY KEY,
    category_name NVARCHAR(15),
    description   TEXT
);

CREATE TABLE IF NOT EXISTS suppliers (
    supplier_id   INTEGER PRIMARY KEY,
    company_name  NVARCHAR(40),
    contact_name  NVARCHAR(30),
    contact_title NVARCHAR(30),
    address       NVARCHAR(60),
    city          NVARCHAR(15),
    region        NVARCHAR(15),
    postal_code   NVARCHAR(10),
    country       NVARCHAR(15),
    phone         NVARCHAR(24),
    fax           NVARCHAR(24),
    home_page     TEXT
);

CREATE TABLE IF NOT EXISTS customers (
    customer_id   NVARCHAR(5) PRIMARY KEY,
    company_name  NVARCHAR(40),
    contact_name  NVARCHAR(30),
    contact_title NVARCHAR(30),
    address       NVARCHAR(60),
    city          NVARCHAR(15),
    region        NVARCHAR(15),
    postal_code   NVARCHAR(10),
    country       NVARCHAR(15),
    phone         NVARCHAR(24),
    fax           NVARCHAR(24)
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id       INTEGER PRIMARY KEY,
    last_name         NVARCHAR(20),
    first_name        NVARCHAR(10),
    title             NVARCHAR(30),
    title_of_courtesy NVARCHAR(25),
    birth_date        DATETIME,
    hire_date         DATETIME,
    address           NVARCHAR(60),
    city              NVARCHAR(15),
    region            NVARCHAR(15),
    postal_code       NVARCHAR(10),
    country           NVARCHAR(15),
    home_phone        NVARCHAR(24),
    extension         NVARCHAR(4),
    notes             TEXT,
    reports_to        INTEGER REFERENCES employees (employee_id),
    photo_path        NVARCHAR(255)
);

CREATE TABLE IF NOT EXISTS shippers (
    shipper_id   INTEGER PRIMARY KEY,
    company_name NVARCHAR(40),
    phone        NVARCHAR(24)
);

CREATE TABLE IF NOT EXISTS products (
    product_id        INTEGER PRIMARY KEY,
    product_name      NVARCHAR(40),
    supplier_id       INTEGER REFERENCES suppliers (supplier_id),
    category_id       INTEGER REFERENCES categories (category_id),
    quantity_per_unit NVARCHAR(20),
    unit_price        REAL,
    units_in_stock    INTEGER,
    units_on_order    INTEGER,
    reorder_level     INTEGER,
    discontinued      INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS orders (
    order_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    customer_id      NVARCHAR(5) REFERENCES customers (customer_id),
    employee_id      INTEGER NOT NULL REFERENCES employees (employee_id),
    order_date       DATETIME NOT NULL,
    required_date    DATETIME NOT NULL,
    shipped_date     DATETIME,
    ship_via         INTEGER NOT NULL REFERENCES shippers (shipper_id),
    freight          REAL NOT NULL DEFAULT 0,
    ship_name        NVARCHAR(40),
    ship_address     NVARCHAR(60),
    ship_city        NVARCHAR(15),
    ship_region      NVARCHAR(15),
    ship_postal_code NVARCHAR(10),
    ship_country     NVARCHAR(15)
);

CREATE TABLE IF NOT EXISTS order_details (
    order_id   INTEGER NOT NULL REFERENCES orders (order_id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products (product_id) ON DELETE CASCADE,
    unit_price REAL NOT NULL,
    quantity   INTEGER NOT NULL,
    discount   REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (order_id, product_id)
);
"#;

/// Handle to the SQLite database: owns the connection pool and knows how to
/// bring the schema up.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open a pool for `url` (e.g. `sqlite:orderdesk.db` or `sqlite::memory:`).
    ///
    /// Foreign keys are enabled on every connection. An in-memory database is
    /// pinned to a single never-recycled connection, because each SQLite
    /// `:memory:` connection is its own database.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if in_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Apply the schema. Safe to call on every startup.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
