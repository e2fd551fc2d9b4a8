//! Public catalog endpoints and cart pricing.

use super::AppState;
use super::error::ApiError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use jeason_core::Product;
use jeason_core::cart::{CartLine, CartTotal};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/categories", get(list_categories))
        .route("/api/cart/total", post(cart_total))
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<CatalogQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.office.list_products(query.category.as_deref())?))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.office.product(id)?))
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.office.categories()?))
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartLine>,
}

async fn cart_total(
    State(state): State<AppState>,
    payload: Result<Json<CartRequest>, JsonRejection>,
) -> Result<Json<CartTotal>, ApiError> {
    let Json(cart) = payload?;
    Ok(Json(state.office.price_cart(&cart.items)?))
}
