mod app_state;
mod bootstrap;

pub use app_state::AppState;
pub use bootstrap::{
    BootstrapError, build_app_state, build_embedder, build_ingestion_service,
    build_model_services, build_vector_store,
};
