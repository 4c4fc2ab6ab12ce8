//! Form submission handlers.
//!
//! A submission is validated, then stored in the CMS and announced to the
//! sales chat at the same time. Neither side waits for or undoes the other:
//! the response says which of the two went through so that a half-delivered
//! submission can be reconciled by hand.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use promtech_core::stores::{Cart, CartItem, TotalOverflow};
use promtech_core::{CurrencyCode, Email, Phone, ProductId, format_amount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::cms::{CmsError, LeadKind, NewLead, NewOrder, OrderLine};
use crate::error::{AppError, Result};
use crate::routes::{check_price, check_quantity, item_text};
use crate::services::{MAX_MESSAGE_LENGTH, NotifyError, TelegramMessage};
use crate::state::AppState;
use crate::stores::open_cart;

const MAX_NAME_LENGTH: usize = 200;
const MAX_TEXT_LENGTH: usize = 2000;
const MAX_ORDER_ITEMS: usize = 50;
/// Room kept after the item lines for the total.
const ORDER_FOOTER_RESERVE: usize = 120;

// =============================================================================
// Request and response bodies
// =============================================================================

/// Body of the lead and test-request forms.
#[derive(Debug, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Product the visitor asked about.
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Page the form was sent from.
    #[serde(default)]
    pub source: Option<String>,
}

/// One line of an order submitted with explicit items.
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub sku: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Body of the order form. Without `items` the session cart is ordered.
#[derive(Debug, Deserialize)]
pub struct OrderForm {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<OrderItemInput>>,
}

/// Outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormResponse {
    pub success: bool,
    /// The CMS stored the record.
    pub saved: bool,
    /// The sales chat was notified.
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormResponse {
    fn from_outcome(saved: bool, notified: bool) -> Self {
        let message = match (saved, notified) {
            (true, true) => None,
            (true, false) => Some("Request saved, but the sales team was not notified".to_string()),
            (false, true) => Some("Sales team notified, but the request was not saved".to_string()),
            (false, false) => Some("Request could not be delivered".to_string()),
        };
        Self {
            success: saved && notified,
            saved,
            notified,
            message,
        }
    }
}

impl IntoResponse for FormResponse {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(self)).into_response()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validated contact block shared by all forms.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Contact {
    name: String,
    phone: Phone,
    email: Option<Email>,
}

fn validate_contact(name: &str, phone: &str, email: Option<&str>) -> Result<Contact> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::BadRequest(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    let phone = Phone::parse(phone).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let email = match email.map(str::trim).filter(|e| !e.is_empty()) {
        Some(email) => Some(Email::parse(email).map_err(|e| AppError::BadRequest(e.to_string()))?),
        None => None,
    };

    Ok(Contact {
        name: name.to_string(),
        phone,
        email,
    })
}

/// Trim optional free text, dropping blanks and rejecting oversized input.
fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn build_lead(kind: LeadKind, form: LeadForm) -> Result<NewLead> {
    let contact = validate_contact(&form.name, &form.phone, form.email.as_deref())?;

    Ok(NewLead {
        kind,
        name: contact.name,
        phone: contact.phone.to_string(),
        email: contact.email.map(|e| e.to_string()),
        comment: optional_text("comment", form.comment)?,
        product: optional_text("product", form.product)?,
        city: optional_text("city", form.city)?,
        source: optional_text("source", form.source)?,
    })
}

fn order_lines(items: Vec<OrderItemInput>) -> Result<Vec<OrderLine>> {
    items
        .into_iter()
        .map(|item| {
            let title = item_text("item title", &item.title)?;
            if title.is_empty() {
                return Err(AppError::BadRequest("item title is required".to_string()));
            }
            if item.quantity == 0 {
                return Err(AppError::BadRequest("item quantity must be at least 1".to_string()));
            }
            check_quantity("item quantity", item.quantity)?;
            check_price("item price", item.price)?;
            Ok(OrderLine {
                product_id: item.id,
                title,
                sku: item_text("item sku", &item.sku)?,
                price: item.price,
                quantity: item.quantity,
            })
        })
        .collect()
}

fn cart_lines(cart: &Cart) -> Vec<OrderLine> {
    cart.items
        .iter()
        .map(|item: &CartItem| OrderLine {
            product_id: item.id,
            title: item.title.clone(),
            sku: item.sku.clone(),
            price: item.price,
            quantity: item.quantity,
        })
        .collect()
}

fn order_total(lines: &[OrderLine]) -> Result<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            line.price
                .checked_mul(Decimal::from(line.quantity))
                .and_then(|amount| total.checked_add(amount))
        })
        .ok_or_else(|| AppError::from(TotalOverflow))
}

// =============================================================================
// Notifications
// =============================================================================

fn lead_message(lead: &NewLead) -> String {
    let title = match lead.kind {
        LeadKind::Lead => "Новая заявка",
        LeadKind::TestRequest => "Заявка на тест оборудования",
    };

    TelegramMessage::new(title)
        .field("Имя", Some(lead.name.as_str()))
        .field("Телефон", Some(lead.phone.as_str()))
        .field("Email", lead.email.as_deref())
        .field("Город", lead.city.as_deref())
        .field("Товар", lead.product.as_deref())
        .field("Комментарий", lead.comment.as_deref())
        .field("Страница", lead.source.as_deref())
        .build()
}

fn order_message(order: &NewOrder) -> String {
    let mut message = TelegramMessage::new("Новый заказ")
        .field("Имя", Some(order.name.as_str()))
        .field("Телефон", Some(order.phone.as_str()))
        .field("Email", order.email.as_deref())
        .field("Компания", order.company.as_deref())
        .field("Комментарий", order.comment.as_deref())
        .blank();

    let budget = MAX_MESSAGE_LENGTH - ORDER_FOOTER_RESERVE;
    for (shown, line) in order.items.iter().enumerate() {
        let sku = if line.sku.is_empty() {
            String::new()
        } else {
            format!(" ({})", line.sku)
        };
        let text = format!(
            "{} × {}{sku}: {}",
            line.quantity,
            line.title,
            format_amount(
                line.price.saturating_mul(Decimal::from(line.quantity)),
                CurrencyCode::RUB
            )
        );
        let next = message.clone().line(&text);
        if next.visible_len() > budget {
            message = message.line(&format!("… и ещё {} поз.", order.items.len() - shown));
            break;
        }
        message = next;
    }

    message
        .blank()
        .field("Итого", Some(format_amount(order.total, CurrencyCode::RUB).as_str()))
        .build()
}

// =============================================================================
// Delivery
// =============================================================================

fn log_outcome<T>(
    what: &'static str,
    saved: &std::result::Result<T, CmsError>,
    notified: &std::result::Result<(), NotifyError>,
) {
    if let Err(e) = saved {
        tracing::error!(form = what, error = %e, "Failed to store submission in CMS");
    }
    if let Err(e) = notified {
        tracing::error!(form = what, error = %e, "Failed to notify sales chat");
    }
}

async fn deliver_lead(state: &AppState, kind: LeadKind, form: LeadForm) -> Result<FormResponse> {
    let lead = build_lead(kind, form)?;
    let text = lead_message(&lead);

    let (saved, notified) = tokio::join!(
        state.cms().create_lead(&lead),
        state.telegram().send_message(&text)
    );
    log_outcome("lead", &saved, &notified);

    if let Ok(id) = &saved {
        tracing::info!(submission_id = %id, kind = ?lead.kind, "Lead stored");
    }

    Ok(FormResponse::from_outcome(saved.is_ok(), notified.is_ok()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Callback or price request.
#[instrument(skip(state, payload))]
pub async fn lead(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LeadForm>, JsonRejection>,
) -> Result<FormResponse> {
    let Json(form) = payload?;
    deliver_lead(&state, LeadKind::Lead, form).await
}

/// Request to test equipment on the customer's material.
#[instrument(skip(state, payload))]
pub async fn test_request(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LeadForm>, JsonRejection>,
) -> Result<FormResponse> {
    let Json(form) = payload?;
    deliver_lead(&state, LeadKind::TestRequest, form).await
}

/// Order draft, from explicit items or the session cart.
///
/// A stored order empties the session cart.
#[instrument(skip(state, session, payload))]
pub async fn order(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<OrderForm>, JsonRejection>,
) -> Result<FormResponse> {
    let Json(form) = payload?;
    let contact = validate_contact(&form.name, &form.phone, form.email.as_deref())?;
    let comment = optional_text("comment", form.comment)?;
    let company = optional_text("company", form.company)?;

    let mut cart = open_cart(session).await?;
    let items = match form.items {
        Some(items) => order_lines(items)?,
        None => cart_lines(cart.state()),
    };
    if items.is_empty() {
        return Err(AppError::BadRequest("order has no items".to_string()));
    }
    if items.len() > MAX_ORDER_ITEMS {
        return Err(AppError::BadRequest(format!(
            "order must have at most {MAX_ORDER_ITEMS} items"
        )));
    }
    let total = order_total(&items)?;

    let order = NewOrder {
        name: contact.name,
        phone: contact.phone.to_string(),
        email: contact.email.map(|e| e.to_string()),
        comment,
        company,
        total,
        items,
    };
    let text = order_message(&order);

    let (saved, notified) = tokio::join!(
        state.cms().create_order(&order),
        state.telegram().send_message(&text)
    );
    log_outcome("order", &saved, &notified);

    if let Ok(id) = &saved {
        tracing::info!(submission_id = %id, lines = order.items.len(), "Order stored");
        cart.update(Cart::clear).await?;
    }

    Ok(FormResponse::from_outcome(saved.is_ok(), notified.is_ok()))
}
