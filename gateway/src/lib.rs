pub mod api;
pub mod client;
pub mod error;
pub mod scripted;

pub use api::{DocumentUpload, UploadError};
pub use client::{Gateway, HttpGateway};
pub use error::{GatewayBuildError, GatewayError, GatewayErrorKind, Operation};
pub use scripted::{GatewayCall, ScriptedGateway, ScriptedReply};
