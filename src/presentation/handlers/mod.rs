mod ask;
mod error;
mod health;
mod index;
mod upload;

pub use ask::{AskRequest, AskResponse, ask_handler};
pub use error::{ApiError, ErrorResponse, status_for};
pub use health::{HealthResponse, health_handler};
pub use index::{app_js_handler, index_handler};
pub use upload::{IMAGE_FIELD, PDF_FIELDS, UploadResponse, upload_handler};
