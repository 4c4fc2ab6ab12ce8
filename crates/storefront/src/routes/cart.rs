//! Cart route handlers.
//!
//! The cart lives in the visitor's session. Every mutating handler applies
//! one reducer step and the store saves it before the response is built.

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};
use promtech_core::ProductId;
use promtech_core::stores::{Cart, CartItem, MAX_QUANTITY};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::{DataResponse, check_price, check_quantity, data, item_text};
use crate::stores::open_cart;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub slug: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

impl AddItemRequest {
    fn validate(self) -> Result<CartItem> {
        let title = item_text("title", &self.title)?;
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }
        check_price("price", self.price)?;
        check_quantity("quantity", self.quantity)?;

        Ok(CartItem {
            id: self.id,
            title,
            price: self.price,
            sku: item_text("sku", &self.sku)?,
            image: self.image,
            quantity: self.quantity,
            slug: self.slug,
        })
    }
}

/// Body of `PATCH /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<DataResponse<Cart>>> {
    let cart = open_cart(session).await?;
    Ok(data(cart.into_state()))
}

/// Append a row. The same product added twice occupies two rows.
#[instrument(skip(session, payload))]
pub async fn add(
    session: Session,
    payload: std::result::Result<Json<AddItemRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Cart>>> {
    let Json(request) = payload?;
    let item = request.validate()?;

    let mut cart = open_cart(session).await?;
    cart.update(|cart| cart.add_item(item)).await??;

    Ok(data(cart.into_state()))
}

/// Set the quantity of the first row for a product.
///
/// Quantities below one are ignored and the cart is returned unchanged;
/// removing a row takes an explicit `DELETE`.
#[instrument(skip(session, payload))]
pub async fn update_quantity(
    session: Session,
    path: std::result::Result<Path<ProductId>, PathRejection>,
    payload: std::result::Result<Json<UpdateQuantityRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Cart>>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    if request.quantity > i64::from(MAX_QUANTITY) {
        return Err(AppError::BadRequest(format!(
            "quantity must not exceed {MAX_QUANTITY}"
        )));
    }
    let mut cart = open_cart(session).await?;

    if request.quantity >= 1 && !cart.state().items.iter().any(|item| item.id == id) {
        return Err(AppError::NotFound("Cart item".to_string()));
    }

    cart.update(|cart| cart.update_item_quantity(id, request.quantity))
        .await??;

    Ok(data(cart.into_state()))
}

/// Remove the first row for a product.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<DataResponse<Cart>>> {
    let Path(id) = path?;
    let mut cart = open_cart(session).await?;

    if cart.update(|cart| cart.remove_item(id)).await?.is_none() {
        return Err(AppError::NotFound("Cart item".to_string()));
    }

    Ok(data(cart.into_state()))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<DataResponse<Cart>>> {
    let mut cart = open_cart(session).await?;
    cart.update(Cart::clear).await?;
    Ok(data(cart.into_state()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(title: &str, price: i64) -> AddItemRequest {
        AddItemRequest {
            id: ProductId::new(7),
            title: title.to_string(),
            price: Decimal::new(price, 0),
            sku: " PR-40 ".to_string(),
            image: None,
            quantity: 0,
            slug: Some("press-40".to_string()),
        }
    }

    #[test]
    fn test_validate_trims_fields() {
        let item = request("  Пресс 40 т ", 120_000).validate().unwrap();
        assert_eq!(item.title, "Пресс 40 т");
        assert_eq!(item.sku, "PR-40");
    }

    #[test]
    fn test_validate_rejects_blank_title_and_negative_price() {
        assert!(matches!(
            request(" ", 10).validate(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            request("Пресс", -1).validate(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_rows() {
        let mut huge_price = request("Пресс", 0);
        huge_price.price = Decimal::MAX;
        assert!(matches!(huge_price.validate(), Err(AppError::BadRequest(_))));

        let mut huge_quantity = request("Пресс", 10);
        huge_quantity.quantity = u32::MAX;
        assert!(matches!(huge_quantity.validate(), Err(AppError::BadRequest(_))));

        let mut long_sku = request("Пресс", 10);
        long_sku.sku = "X".repeat(201);
        assert!(matches!(long_sku.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_add_request_defaults_quantity() {
        let request: AddItemRequest =
            serde_json::from_str(r#"{"id": 3, "title": "Станок", "price": "1500.50"}"#).unwrap();
        assert_eq!(request.quantity, 1);
        assert_eq!(request.price, Decimal::new(150_050, 2));
    }
}
