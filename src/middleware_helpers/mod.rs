pub mod request_id;

pub use crate::tracing::REQUEST_ID_HEADER;
pub use request_id::request_id_middleware;
