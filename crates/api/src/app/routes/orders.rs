use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use orderdesk_core::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(add_order))
        .route(
            "/:order_id",
            get(get_order).put(update_order).delete(remove_order),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub skip: Option<i64>,
    pub count: Option<i64>,
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    if order_id <= 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "order id must be greater than zero",
        );
    }

    match services.orders.get_order(OrderId::new(order_id)).await {
        Ok(order) => (StatusCode::OK, Json(dto::full_order_to_json(order))).into_response(),
        Err(e) => errors::repository_error_to_response("get_order", e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListOrdersQuery>,
) -> axum::response::Response {
    let skip = query.skip.unwrap_or(0);
    let count = query.count.unwrap_or(10);
    if skip < 0 || count <= 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "out_of_range",
            "skip must be non-negative and count positive",
        );
    }

    match services.orders.list_orders(skip, count).await {
        Ok(ids) => {
            let items = ids
                .into_iter()
                .map(dto::brief_order_to_json)
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::repository_error_to_response("list_orders", e),
    }
}

pub async fn add_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::BriefOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_body",
            "request body is missing or malformed",
        );
    };

    let order = match body.into_new_order() {
        Ok(order) => order,
        Err(response) => return response,
    };

    match services.orders.add_order(&order).await {
        Ok(order_id) => (
            StatusCode::OK,
            Json(serde_json::json!({ "order_id": order_id })),
        )
            .into_response(),
        Err(e) => errors::repository_error_to_response("add_order", e),
    }
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
    body: Result<Json<dto::BriefOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Ok(Json(body)) = body else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_body",
            "request body is missing or malformed",
        );
    };
    if order_id <= 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "order id must be greater than zero",
        );
    }

    let order = match body.into_new_order() {
        Ok(order) => order,
        Err(response) => return response,
    };

    match services
        .orders
        .update_order(OrderId::new(order_id), &order)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_to_response("update_order", e),
    }
}

pub async fn remove_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<i64>,
) -> axum::response::Response {
    if order_id <= 0 {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "order id must be greater than zero",
        );
    }

    match services.orders.remove_order(OrderId::new(order_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::repository_error_to_response("remove_order", e),
    }
}
