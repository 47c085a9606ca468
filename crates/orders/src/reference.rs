//! Reference entities shared across orders.
//!
//! These are lookup-style records (customer, employee, shipper, product with its
//! category and supplier) created on first reference from an incoming order when
//! absent. Only the key is guaranteed: a brief order carries keys alone, so every
//! non-key field is optional.

use serde::{Deserialize, Serialize};

use orderdesk_core::{CategoryId, CustomerCode, EmployeeId, ProductId, ShipperId, SupplierId};

/// Customer, keyed by company code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub code: CustomerCode,
    pub company_name: Option<String>,
}

impl Customer {
    pub fn new(code: CustomerCode) -> Self {
        Self {
            code,
            company_name: None,
        }
    }
}

/// Employee handling an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub country: Option<String>,
}

impl Employee {
    pub fn new(id: EmployeeId) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            country: None,
        }
    }
}

/// Shipping company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipper {
    pub id: ShipperId,
    pub company_name: Option<String>,
}

impl Shipper {
    pub fn new(id: ShipperId) -> Self {
        Self {
            id,
            company_name: None,
        }
    }
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: Option<String>,
}

/// Product supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub company_name: Option<String>,
}

/// Product referenced by an order line.
///
/// On the read path the category and supplier are resolved sub-objects; on the
/// write path they may be absent (the product is then created on demand without
/// them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: Option<String>,
    pub category: Option<Category>,
    pub supplier: Option<Supplier>,
}

impl Product {
    pub fn new(id: ProductId) -> Self {
        Self {
            id,
            name: None,
            category: None,
            supplier: None,
        }
    }
}
