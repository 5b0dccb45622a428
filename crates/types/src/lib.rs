//! Shared types for the ConsistentVideo pipeline client
//!
//! Everything that crosses the wire to the generation backend, or that is
//! persisted on the client side, is defined here so the state crate and the
//! API client agree on one representation.
//!
//! - [`EntityTuple`] / [`Entity`] - characters, locations and objects
//! - [`Scene`] / [`Cut`] - open, backend-defined story records
//! - [`ProjectState`] - the persisted project configuration
//! - [`ApiLogEntry`] - one row of the request ledger
//! - request/response bodies for every backend endpoint

mod entity;
mod error;
mod log;
mod models;
mod project;
mod requests;
mod responses;
mod story;

pub use entity::{Entity, EntityTuple, EntityType};
pub use error::TypesError;
pub use log::{ApiLogEntry, LogStatus, LogUpdate};
pub use models::{ImageModel, ImageQuality, ImageSize, ImageStyle, TextModel, VideoModel};
pub use project::ProjectState;
pub use requests::{
    ConcatVideosRequest, CreateEntitiesRequest, CutSelection, FileUpload,
    GenerateCutImagesRequest, GenerateCutVideosRequest, GenerateCutsRequest,
    GenerateScenesRequest, MultimodalEditRequest, MultimodalOperation, MultipartRequest,
    SynopsisAnalyzeRequest,
};
pub use responses::{
    ConcatVideosResponse, CreateEntitiesResponse, CutMedia, GenerateCutImagesResponse,
    GenerateCutVideosResponse, GenerateCutsResponse, GenerateScenesResponse,
    MultimodalEditResponse, ServerInfo, StoryText, SynopsisAnalyzeResponse,
};
pub use story::{Cut, Scene, cut_id, parse_cut_id};
