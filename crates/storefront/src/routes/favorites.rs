//! Favorites route handlers.

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};
use promtech_core::ProductId;
use promtech_core::stores::{FavoriteItem, Favorites};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::{DataResponse, check_price, data, item_text};
use crate::stores::open_favorites;

/// Body of `POST /api/favorites/items`.
#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Show the favorites.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<DataResponse<Favorites>>> {
    let favorites = open_favorites(session).await?;
    Ok(data(favorites.into_state()))
}

/// Save a product. Saving it again changes nothing.
#[instrument(skip(session, payload))]
pub async fn add(
    session: Session,
    payload: std::result::Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> Result<Json<DataResponse<Favorites>>> {
    let Json(request) = payload?;
    let title = item_text("title", &request.title)?;
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    check_price("price", request.price)?;

    let item = FavoriteItem {
        id: request.id,
        title,
        price: request.price,
        sku: item_text("sku", &request.sku)?,
        image: request.image,
        slug: request.slug,
    };

    let mut favorites = open_favorites(session).await?;
    if !favorites.update(|favorites| favorites.add_item(item)).await?? {
        tracing::debug!("Product already in favorites");
    }

    Ok(data(favorites.into_state()))
}

/// Forget a product.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    path: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<DataResponse<Favorites>>> {
    let Path(id) = path?;
    let mut favorites = open_favorites(session).await?;

    if favorites
        .update(|favorites| favorites.remove_item(id))
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Favorite".to_string()));
    }

    Ok(data(favorites.into_state()))
}
