use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, OrderId};

use crate::reference::{Customer, Employee, Product, Shipper};

/// Destination address of a shipment, flattened onto the order row in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
}

/// One order line.
///
/// Identity is the (order, product) pair; a detail has no lifecycle of its own
/// outside its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub product: Product,
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
}

/// Fully resolved order aggregate, as returned by the read path.
///
/// Every cross-reference is a materialized sub-object; nothing is lazily
/// loaded after this value exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub freight: f64,
    pub ship_name: Option<String>,
    pub shipping_address: ShippingAddress,
    pub customer: Customer,
    pub employee: Employee,
    pub shipper: Shipper,
    pub details: Vec<OrderDetail>,
}

/// Order line on the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderDetail {
    pub product: Product,
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
}

impl NewOrderDetail {
    /// Validate the line against the repository's write contract:
    /// unit price and quantity strictly positive, discount non-negative,
    /// product key set.
    pub fn validate(&self) -> DomainResult<()> {
        if self.product.id.get() == 0 {
            return Err(DomainError::validation("order detail has no product id"));
        }
        if self.unit_price <= 0.0 {
            return Err(DomainError::validation("unit price must be positive"));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.discount < 0.0 {
            return Err(DomainError::validation("discount must not be negative"));
        }
        Ok(())
    }
}

/// Write-side order aggregate (the "brief" shape).
///
/// Customer, employee and shipper are required by construction; they carry the
/// keys used to create the reference rows on demand when absent from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    pub shipped_date: Option<DateTime<Utc>>,
    pub freight: f64,
    pub ship_name: Option<String>,
    pub shipping_address: ShippingAddress,
    pub customer: Customer,
    pub employee: Employee,
    pub shipper: Shipper,
    pub details: Vec<NewOrderDetail>,
}

impl NewOrder {
    /// Validate every line of the aggregate.
    pub fn validate(&self) -> DomainResult<()> {
        for detail in &self.details {
            detail.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_core::{CustomerCode, EmployeeId, ProductId, ShipperId};
    use proptest::prelude::*;

    fn test_address() -> ShippingAddress {
        ShippingAddress {
            address: "Obere Str. 57".to_string(),
            city: "Berlin".to_string(),
            region: None,
            postal_code: "12209".to_string(),
            country: "Germany".to_string(),
        }
    }

    fn detail(product_id: i64, unit_price: f64, quantity: i32, discount: f64) -> NewOrderDetail {
        NewOrderDetail {
            product: Product::new(ProductId::new(product_id)),
            unit_price,
            quantity,
            discount,
        }
    }

    fn order_with(details: Vec<NewOrderDetail>) -> NewOrder {
        NewOrder {
            order_date: Utc::now(),
            required_date: Utc::now(),
            shipped_date: None,
            freight: 32.38,
            ship_name: Some("Vins et alcools Chevalier".to_string()),
            shipping_address: test_address(),
            customer: Customer::new(CustomerCode::new("ALFKI").unwrap()),
            employee: Employee::new(EmployeeId::new(1)),
            shipper: Shipper::new(ShipperId::new(1)),
            details,
        }
    }

    #[test]
    fn valid_detail_passes() {
        assert!(detail(11, 18.0, 5, 0.0).validate().is_ok());
    }

    #[test]
    fn zero_discount_is_valid() {
        // Zero is a legitimate discount on both the add and the update path.
        assert!(detail(11, 18.0, 5, 0.0).validate().is_ok());
        assert!(detail(11, 18.0, 5, 0.15).validate().is_ok());
    }

    #[test]
    fn detail_without_product_id_is_rejected() {
        let err = detail(0, 18.0, 5, 0.0).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn order_validation_covers_all_lines() {
        let order = order_with(vec![detail(11, 18.0, 5, 0.0), detail(42, 9.8, -1, 0.0)]);
        assert!(order.validate().is_err());

        let order = order_with(vec![detail(11, 18.0, 5, 0.0), detail(42, 9.8, 10, 0.0)]);
        assert!(order.validate().is_ok());
    }

    #[test]
    fn order_without_lines_is_valid() {
        assert!(order_with(vec![]).validate().is_ok());
    }

    proptest! {
        #[test]
        fn non_positive_quantity_is_always_rejected(quantity in i32::MIN..=0) {
            prop_assert!(detail(11, 18.0, quantity, 0.0).validate().is_err());
        }

        #[test]
        fn non_positive_unit_price_is_always_rejected(unit_price in -1_000.0f64..=0.0) {
            prop_assert!(detail(11, unit_price, 5, 0.0).validate().is_err());
        }

        #[test]
        fn negative_discount_is_always_rejected(discount in -1_000.0f64..0.0) {
            prop_assert!(detail(11, 18.0, 5, discount).validate().is_err());
        }

        #[test]
        fn non_negative_discount_is_always_accepted(discount in 0.0f64..=1.0) {
            prop_assert!(detail(11, 18.0, 5, discount).validate().is_ok());
        }
    }
}
