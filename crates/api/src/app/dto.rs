use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use orderdesk_core::{CustomerCode, EmployeeId, OrderId, ProductId, ShipperId};
use orderdesk_orders::{
    Customer, Employee, NewOrder, NewOrderDetail, Order, Product, Shipper, ShippingAddress,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// The "brief" order shape used by the write endpoints: flattened shipping
/// address, key-only references.
#[derive(Debug, Deserialize)]
pub struct BriefOrderRequest {
    pub customer_id: String,
    pub employee_id: i64,
    pub shipper_id: i64,
    pub order_date: DateTime<Utc>,
    pub required_date: DateTime<Utc>,
    #[serde(default)]
    pub shipped_date: Option<DateTime<Utc>>,
    pub freight: f64,
    #[serde(default)]
    pub ship_name: Option<String>,
    pub ship_address: String,
    pub ship_city: String,
    #[serde(default)]
    pub ship_region: Option<String>,
    pub ship_postal_code: String,
    pub ship_country: String,
    pub order_details: Vec<BriefOrderDetailRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BriefOrderDetailRequest {
    pub product_id: i64,
    pub unit_price: f64,
    pub quantity: i32,
    pub discount: f64,
}

impl BriefOrderRequest {
    /// Map the transport shape onto the domain write aggregate.
    pub fn into_new_order(self) -> Result<NewOrder, axum::response::Response> {
        let code = CustomerCode::new(self.customer_id).map_err(|e| {
            errors::json_error(StatusCode::BAD_REQUEST, "invalid_customer_code", e.to_string())
        })?;

        Ok(NewOrder {
            order_date: self.order_date,
            required_date: self.required_date,
            shipped_date: self.shipped_date,
            freight: self.freight,
            ship_name: self.ship_name,
            shipping_address: ShippingAddress {
                address: self.ship_address,
                city: self.ship_city,
                region: self.ship_region,
                postal_code: self.ship_postal_code,
                country: self.ship_country,
            },
            customer: Customer::new(code),
            employee: Employee::new(EmployeeId::new(self.employee_id)),
            shipper: Shipper::new(ShipperId::new(self.shipper_id)),
            details: self
                .order_details
                .into_iter()
                .map(|d| NewOrderDetail {
                    product: Product::new(ProductId::new(d.product_id)),
                    unit_price: d.unit_price,
                    quantity: d.quantity,
                    discount: d.discount,
                })
                .collect(),
        })
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// List entries carry the bare identity only; callers needing the aggregate
/// fetch the single-order endpoint.
pub fn brief_order_to_json(order_id: OrderId) -> serde_json::Value {
    serde_json::json!({ "order_id": order_id })
}

pub fn full_order_to_json(order: Order) -> serde_json::Value {
    serde_json::json!({
        "order_id": order.id,
        "order_date": order.order_date,
        "required_date": order.required_date,
        "shipped_date": order.shipped_date,
        "freight": order.freight,
        "ship_name": order.ship_name,
        "shipping_address": {
            "address": order.shipping_address.address,
            "city": order.shipping_address.city,
            "region": order.shipping_address.region,
            "postal_code": order.shipping_address.postal_code,
            "country": order.shipping_address.country,
        },
        "customer": {
            "code": order.customer.code,
            "company_name": order.customer.company_name,
        },
        "employee": {
            "id": order.employee.id,
            "first_name": order.employee.first_name,
            "last_name": order.employee.last_name,
            "country": order.employee.country,
        },
        "shipper": {
            "id": order.shipper.id,
            "company_name": order.shipper.company_name,
        },
        "order_details": order.details.into_iter().map(|d| serde_json::json!({
            "product": {
                "id": d.product.id,
                "name": d.product.name,
                "category": d.product.category.map(|c| serde_json::json!({
                    "id": c.id,
                    "name": c.name,
                })),
                "supplier": d.product.supplier.map(|s| serde_json::json!({
                    "id": s.id,
                    "company_name": s.company_name,
                })),
            },
            "unit_price": d.unit_price,
            "quantity": d.quantity,
            "discount": d.discount,
        })).collect::<Vec<_>>(),
    })
}
