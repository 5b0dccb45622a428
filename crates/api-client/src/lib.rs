//! Client for the ConsistentVideo generation backend
//!
//! [`ApiClient`] wraps every backend endpoint of the
//! synopsis -> entities -> scenes -> cuts -> images -> videos -> final video
//! pipeline. Calls are recorded in a shared [`cv_state::LogStore`].
//!
//! # Example
//! ```no_run
//! use cv_api_client::{ClientConfig, StudioContext};
//! use cv_types::GenerateScenesRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = StudioContext::in_memory(ClientConfig::from_env())?;
//! ctx.api.ready().await;
//!
//! let response = ctx
//!     .api
//!     .generate_scenes(&GenerateScenesRequest {
//!         story_text: Some("A lighthouse keeper finds a map".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//! ctx.ui.scenes.set(response.scenes);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod context;
mod discovery;
mod error;
mod form;

pub use client::{ApiClient, DebugInfo};
pub use config::{
    ClientConfig, DEFAULT_API_URL, DEFAULT_DISCOVERY_PORT, RetryPolicy, STUDIO_TOML, StudioToml,
};
pub use context::StudioContext;
pub use error::{ApiError, Result};
pub use form::EncodedForm;
