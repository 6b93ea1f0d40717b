//! MedAssist Gateway HTTP API Server
//!
//! Serves the chatbot endpoints (`/collect_user_info`, `/answer_query`) and
//! the claim-form extraction upload (`/extract`).

pub mod error;
pub mod handlers;
pub mod server;
pub mod session_registry;
pub mod types;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState, MAX_UPLOAD_BYTES};
pub use session_registry::SessionRegistry;
