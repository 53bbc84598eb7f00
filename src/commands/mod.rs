//! Write operations that span several tables and must commit atomically.

use crate::{db::DbPool, errors::ServiceError, events::EventSender};
use async_trait::async_trait;
use std::sync::Arc;

pub mod orders;

/// A unit of work run inside one transaction. Events go out only after the
/// commit succeeds.
#[async_trait]
pub trait Command: Send + Sync {
    type Result;

    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError>;
}
