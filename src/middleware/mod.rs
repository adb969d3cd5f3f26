pub mod alert;
pub mod logging;
pub mod request_id;

pub use alert::AlertLayer;
pub use logging::LoggingLayer;
pub use request_id::{RequestId, RequestIdLayer, REQUEST_ID_HEADER};
