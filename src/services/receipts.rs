//! Receipts for delivered orders.
//!
//! [`ReceiptService`] assembles a [`ReceiptData`] record from the frozen order
//! snapshot and hands it to a [`ReceiptRenderer`]. The default renderer draws
//! a single A4 document with `printpdf`.

use crate::{
    entities::{order::OrderStatus, User},
    errors::ServiceError,
    services::orders::{Actor, OrderService},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub line_amount: Decimal,
}

/// Everything printed on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptData {
    pub order_id: Uuid,
    pub user_name: String,
    pub order_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub items: Vec<ReceiptLine>,
}

#[derive(Debug, Clone)]
pub struct RenderedReceipt {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

pub fn receipt_filename(order_id: Uuid) -> String {
    format!("order_{}_receipt.pdf", order_id)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    async fn render(&self, receipt: &ReceiptData) -> Result<Vec<u8>, ServiceError>;
}

/// Draws receipts as A4 PDF pages with the built-in Helvetica font.
#[derive(Debug, Clone, Default)]
pub struct PdfReceiptRenderer;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 25.0;
const ROW_HEIGHT: f32 = 7.0;

impl PdfReceiptRenderer {
    fn draw(receipt: &ReceiptData) -> Result<Vec<u8>, ServiceError> {
        let (doc, page, layer) = PdfDocument::new(
            format!("Order Receipt {}", receipt.order_id),
            Mm(PAGE_WIDTH),
            Mm(PAGE_HEIGHT),
            "receipt",
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;

        let mut layer = doc.get_page(page).get_layer(layer);
        let mut y = PAGE_HEIGHT - MARGIN;

        layer.use_text("Order Receipt", 18.0, Mm(MARGIN), Mm(y), &bold);
        y -= ROW_HEIGHT * 2.0;
        for line in [
            format!("User: {}", receipt.user_name),
            format!("Order Date: {}", receipt.order_date.format("%Y-%m-%d %H:%M")),
            format!("Total Amount: ${}", receipt.total_amount),
        ] {
            layer.use_text(line, 12.0, Mm(MARGIN), Mm(y), &regular);
            y -= ROW_HEIGHT;
        }

        y -= ROW_HEIGHT;
        draw_row(&layer, &bold, y, "Product Name", "Quantity", "Total Price");
        y -= ROW_HEIGHT;

        for item in &receipt.items {
            if y < MARGIN {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "receipt");
                layer = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT - MARGIN;
            }
            draw_row(
                &layer,
                &regular,
                y,
                &item.name,
                &item.quantity.to_string(),
                &format!("${}", item.line_amount),
            );
            y -= ROW_HEIGHT;
        }

        doc.save_to_bytes().map_err(render_error)
    }
}

fn draw_row(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    y: f32,
    name: &str,
    quantity: &str,
    amount: &str,
) {
    layer.use_text(name, 10.0, Mm(MARGIN), Mm(y), font);
    layer.use_text(quantity, 10.0, Mm(120.0), Mm(y), font);
    layer.use_text(amount, 10.0, Mm(150.0), Mm(y), font);
}

fn render_error(err: printpdf::Error) -> ServiceError {
    ServiceError::ExternalServiceError(format!("receipt rendering failed: {}", err))
}

#[async_trait]
impl ReceiptRenderer for PdfReceiptRenderer {
    async fn render(&self, receipt: &ReceiptData) -> Result<Vec<u8>, ServiceError> {
        let receipt = receipt.clone();
        tokio::task::spawn_blocking(move || Self::draw(&receipt))
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("receipt task failed: {}", e)))?
    }
}

/// Builds receipts for orders that have been delivered.
#[derive(Clone)]
pub struct ReceiptService {
    db: Arc<DatabaseConnection>,
    orders: OrderService,
    renderer: Arc<dyn ReceiptRenderer>,
}

impl ReceiptService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        orders: OrderService,
        renderer: Arc<dyn ReceiptRenderer>,
    ) -> Self {
        Self {
            db,
            orders,
            renderer,
        }
    }

    /// Receipt data for an order the actor can see. Only delivered orders
    /// have a receipt.
    pub async fn receipt_data(&self, actor: Actor, order_id: Uuid) -> Result<ReceiptData, ServiceError> {
        let order = self.orders.get_order(actor, order_id).await?;
        if order.status != OrderStatus::Delivered {
            return Err(ServiceError::InvalidOperation(format!(
                "receipt is available once order {} is delivered",
                order_id
            )));
        }

        let user_name = User::find_by_id(order.user_id)
            .one(&*self.db)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();

        Ok(ReceiptData {
            order_id: order.id,
            user_name,
            order_date: order.created_at,
            total_amount: order.total_amount,
            items: order
                .items_snapshot
                .lines()
                .iter()
                .map(|line| ReceiptLine {
                    name: line.product_name.clone(),
                    quantity: line.quantity,
                    line_amount: line.line_amount,
                })
                .collect(),
        })
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn render(&self, actor: Actor, order_id: Uuid) -> Result<RenderedReceipt, ServiceError> {
        let data = self.receipt_data(actor, order_id).await?;
        let bytes = self.renderer.render(&data).await?;
        info!(order_id = %order_id, size = bytes.len(), "Receipt rendered");

        Ok(RenderedReceipt {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: receipt_filename(order_id),
        })
    }
}
