//! Business services.
//!
//! Each service owns a shared database handle and the event sender. Operations
//! that must join a caller's transaction also expose an `*_in` variant that
//! takes any [`sea_orm::ConnectionTrait`].

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod couriers;
pub mod inventory;
pub mod orders;
pub mod pricing;
pub mod promos;
pub mod receipts;

pub use accounts::AccountService;
pub use cart::{CartLine, CartService};
pub use catalog::CatalogService;
pub use couriers::CourierService;
pub use inventory::InventoryService;
pub use orders::{Actor, OrderService};
pub use promos::{PromoCheck, PromoService};
pub use receipts::{PdfReceiptRenderer, ReceiptRenderer, ReceiptService, RenderedReceipt};
