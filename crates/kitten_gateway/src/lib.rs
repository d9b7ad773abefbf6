pub mod error;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use server::{AppState, GatewayServer};
pub use types::SpeechRequestBody;
