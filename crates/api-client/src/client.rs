//! Pipeline API client
//!
//! Every call is recorded in the shared [`LogStore`]: a `pending` row is
//! added before the request goes out and is settled to `success` or `error`
//! once the outcome is known.

use cv_state::LogStore;
use cv_types::{
    ApiLogEntry, ConcatVideosRequest, ConcatVideosResponse, CreateEntitiesRequest,
    CreateEntitiesResponse, Cut, CutMedia, EntityTuple, GenerateCutImagesRequest,
    GenerateCutImagesResponse, GenerateCutVideosRequest, GenerateCutVideosResponse,
    GenerateCutsRequest, GenerateCutsResponse, GenerateScenesRequest, GenerateScenesResponse,
    LogUpdate, MultimodalEditRequest, MultimodalEditResponse, MultimodalOperation,
    MultipartRequest, Scene, StoryText, SynopsisAnalyzeRequest, SynopsisAnalyzeResponse,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::config::{ClientConfig, RetryPolicy};
use crate::discovery::EndpointResolver;
use crate::error::{ApiError, Result};
use crate::form::EncodedForm;

/// A pipeline stage backed by one multipart endpoint
struct Stage {
    path: &'static str,
    /// Prefix of the error returned to callers
    label: &'static str,
}

const ANALYZE_SYNOPSIS: Stage = Stage {
    path: "/analyze-synopsis",
    label: "synopsis analysis",
};
const CREATE_ENTITIES: Stage = Stage {
    path: "/create-entities",
    label: "entity creation",
};
const MULTIMODAL_EDIT: Stage = Stage {
    path: "/multimodal/edit-or-add",
    label: "entity edit",
};
const GENERATE_SCENES: Stage = Stage {
    path: "/generate-scenes",
    label: "scene generation",
};
const GENERATE_CUTS: Stage = Stage {
    path: "/generate-cuts",
    label: "cut generation",
};
const GENERATE_CUT_IMAGES: Stage = Stage {
    path: "/generate-cut-images",
    label: "cut image generation",
};
const GENERATE_CUT_VIDEOS: Stage = Stage {
    path: "/generate-cut-videos",
    label: "cut video generation",
};
const CONCAT_VIDEOS: Stage = Stage {
    path: "/concat-videos",
    label: "video concatenation",
};

/// A read-only endpoint listing previously generated artifacts
struct Listing {
    path: &'static str,
    /// Ledger message when the backend has nothing (404)
    missing: &'static str,
    loaded: &'static str,
}

const LOAD_ENTITY_LIST: Listing = Listing {
    path: "/load-entity-list",
    missing: "No entity list found",
    loaded: "Entity list loaded successfully",
};
const LOAD_SCENES: Listing = Listing {
    path: "/load-scenes",
    missing: "No scenes found",
    loaded: "Scenes loaded successfully",
};
const LOAD_CUTS: Listing = Listing {
    path: "/load-cuts",
    missing: "No cuts found",
    loaded: "Cuts loaded successfully",
};
const LOAD_SYNOPSIS_TEXT: Listing = Listing {
    path: "/load-synopsis-text",
    missing: "No synopsis text found",
    loaded: "Synopsis text loaded successfully",
};
const LOAD_STORY_TEXT: Listing = Listing {
    path: "/load-story-text",
    missing: "No story text found",
    loaded: "Story text loaded successfully",
};
const LOAD_CUT_IMAGES: Listing = Listing {
    path: "/load-cut-images",
    missing: "No cut images found",
    loaded: "Cut images loaded successfully",
};
const LOAD_CUT_VIDEOS: Listing = Listing {
    path: "/load-cut-videos",
    missing: "No cut videos found",
    loaded: "Cut videos loaded successfully",
};
const LIST_PROJECTS: Listing = Listing {
    path: "/list-projects",
    missing: "No projects found",
    loaded: "Projects listed successfully",
};

#[derive(Deserialize, Default)]
struct EntityListBody {
    #[serde(default)]
    entity_list: Option<Vec<EntityTuple>>,
}

#[derive(Deserialize, Default)]
struct ScenesBody {
    #[serde(default)]
    scenes: Option<Vec<Scene>>,
}

#[derive(Deserialize, Default)]
struct CutsBody {
    #[serde(default)]
    cuts: Option<Vec<Vec<Cut>>>,
}

#[derive(Deserialize, Default)]
struct TextBody {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct ImagesBody {
    #[serde(default)]
    images: Option<Vec<CutMedia>>,
}

#[derive(Deserialize, Default)]
struct VideosBody {
    #[serde(default)]
    videos: Option<Vec<CutMedia>>,
}

#[derive(Deserialize, Default)]
struct ProjectsBody {
    #[serde(default)]
    projects: Option<Vec<String>>,
}

/// Which address the client talks to, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugInfo {
    pub base_url: String,
    pub dynamic_base_url: Option<String>,
    pub current_url: String,
    pub page_host: Option<String>,
}

/// Client for the generation backend
///
/// Cloning is cheap; clones share the HTTP connection pool, the resolved
/// endpoint and the request ledger.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: EndpointResolver,
    retry: RetryPolicy,
    logs: LogStore,
}

impl ApiClient {
    /// Build a client and start endpoint discovery in the background
    ///
    /// Discovery needs a tokio runtime; outside of one the configured
    /// `api_url` is used as-is.
    pub fn new(config: ClientConfig, logs: LogStore) -> Result<Self> {
        let http = Client::builder().build()?;
        let endpoint = EndpointResolver::spawn(&http, &config);

        debug!(
            "API client created: base_url={}, page_host={:?}, retries={}",
            endpoint.base_url(),
            config.page_host,
            config.retry.max_retries
        );

        Ok(Self {
            http,
            endpoint,
            retry: config.retry,
            logs,
        })
    }

    /// Resolves once endpoint discovery has finished
    pub async fn ready(&self) {
        self.endpoint.ready().await
    }

    /// Address requests go to right now
    pub fn base_url(&self) -> String {
        self.endpoint.current()
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    pub fn debug_info(&self) -> DebugInfo {
        DebugInfo {
            base_url: self.endpoint.base_url().to_string(),
            dynamic_base_url: self.endpoint.dynamic(),
            current_url: self.endpoint.current(),
            page_host: self.endpoint.page_host().map(str::to_string),
        }
    }

    // Pipeline operations

    /// Extract entity drafts from a synopsis
    ///
    /// The only operation that retries: transient failures are retried per
    /// the configured [`RetryPolicy`], 4xx answers fail immediately.
    pub async fn analyze_synopsis(
        &self,
        request: &SynopsisAnalyzeRequest,
    ) -> Result<SynopsisAnalyzeResponse> {
        self.post_form(
            &ANALYZE_SYNOPSIS,
            request,
            Some(&self.retry),
            "Synopsis analysis complete",
        )
        .await
    }

    pub async fn create_entities(
        &self,
        request: &CreateEntitiesRequest,
    ) -> Result<CreateEntitiesResponse> {
        self.post_form(&CREATE_ENTITIES, request, None, "Entities created successfully")
            .await
    }

    /// Edit the entity at `request.index`, or add a new one
    pub async fn multimodal_edit(
        &self,
        request: &MultimodalEditRequest,
    ) -> Result<MultimodalEditResponse> {
        let message = match request.operation {
            MultimodalOperation::Edit => "Entity edited successfully",
            MultimodalOperation::Add => "Entity added successfully",
        };
        self.post_form(&MULTIMODAL_EDIT, request, None, message).await
    }

    pub async fn generate_scenes(
        &self,
        request: &GenerateScenesRequest,
    ) -> Result<GenerateScenesResponse> {
        self.post_form(&GENERATE_SCENES, request, None, "Scenes generated successfully")
            .await
    }

    pub async fn generate_cuts(&self, request: &GenerateCutsRequest) -> Result<GenerateCutsResponse> {
        self.post_form(&GENERATE_CUTS, request, None, "Cuts generated successfully")
            .await
    }

    pub async fn generate_cut_images(
        &self,
        request: &GenerateCutImagesRequest,
    ) -> Result<GenerateCutImagesResponse> {
        self.post_form(
            &GENERATE_CUT_IMAGES,
            request,
            None,
            "Cut images generated successfully",
        )
        .await
    }

    pub async fn generate_cut_videos(
        &self,
        request: &GenerateCutVideosRequest,
    ) -> Result<GenerateCutVideosResponse> {
        self.post_form(
            &GENERATE_CUT_VIDEOS,
            request,
            None,
            "Cut videos generated successfully",
        )
        .await
    }

    pub async fn concat_videos(&self, request: &ConcatVideosRequest) -> Result<ConcatVideosResponse> {
        self.post_form(&CONCAT_VIDEOS, request, None, "Videos concatenated successfully")
            .await
    }

    // Load operations. These never fail: problems are recorded in the
    // ledger and an empty value is returned.

    pub async fn load_entity_list(&self, work_dir: &str, entity_set_name: &str) -> Vec<EntityTuple> {
        self.load::<EntityListBody>(&LOAD_ENTITY_LIST, &project_query(work_dir, entity_set_name))
            .await
            .entity_list
            .unwrap_or_default()
    }

    pub async fn load_scenes(&self, work_dir: &str, entity_set_name: &str) -> Vec<Scene> {
        self.load::<ScenesBody>(&LOAD_SCENES, &project_query(work_dir, entity_set_name))
            .await
            .scenes
            .unwrap_or_default()
    }

    /// Cuts grouped by scene
    pub async fn load_cuts(&self, work_dir: &str, entity_set_name: &str) -> Vec<Vec<Cut>> {
        self.load::<CutsBody>(&LOAD_CUTS, &project_query(work_dir, entity_set_name))
            .await
            .cuts
            .unwrap_or_default()
    }

    pub async fn load_synopsis_text(&self, work_dir: &str, entity_set_name: &str) -> String {
        self.load::<TextBody>(&LOAD_SYNOPSIS_TEXT, &project_query(work_dir, entity_set_name))
            .await
            .text
            .unwrap_or_default()
    }

    /// Story text and the file it came from; `source` is `"none"` when absent
    pub async fn load_story_text(&self, work_dir: &str, entity_set_name: &str) -> StoryText {
        self.load::<StoryText>(&LOAD_STORY_TEXT, &project_query(work_dir, entity_set_name))
            .await
    }

    pub async fn load_cut_images(&self, work_dir: &str, entity_set_name: &str) -> Vec<CutMedia> {
        self.load::<ImagesBody>(&LOAD_CUT_IMAGES, &project_query(work_dir, entity_set_name))
            .await
            .images
            .unwrap_or_default()
    }

    pub async fn load_cut_videos(&self, work_dir: &str, entity_set_name: &str) -> Vec<CutMedia> {
        self.load::<VideosBody>(&LOAD_CUT_VIDEOS, &project_query(work_dir, entity_set_name))
            .await
            .videos
            .unwrap_or_default()
    }

    /// Entity set names found under `work_dir`
    pub async fn list_projects(&self, work_dir: &str) -> Vec<String> {
        self.load::<ProjectsBody>(&LIST_PROJECTS, &[("work_dir", work_dir)])
            .await
            .projects
            .unwrap_or_default()
    }

    /// Single `GET /health`; any failure is reported as `false`
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url());
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check against {} failed: {}", url, e);
                false
            }
        }
    }

    // Media URLs. The synchronous builders use whatever address is resolved
    // so far; the `_async` variants wait for discovery first.

    pub fn image_url(&self, work_dir: &str, entity_set_name: &str, relative_path: &str) -> String {
        self.media_url(
            "/static/image",
            &[
                ("work_dir", work_dir),
                ("entity_set_name", entity_set_name),
                ("relative_path", relative_path),
            ],
        )
    }

    pub fn video_url(&self, work_dir: &str, entity_set_name: &str, relative_path: &str) -> String {
        self.media_url(
            "/static/video",
            &[
                ("work_dir", work_dir),
                ("entity_set_name", entity_set_name),
                ("relative_path", relative_path),
            ],
        )
    }

    pub fn final_video_url(&self, work_dir: &str, entity_set_name: &str) -> String {
        self.media_url("/final-video", &project_query(work_dir, entity_set_name))
    }

    pub async fn image_url_async(
        &self,
        work_dir: &str,
        entity_set_name: &str,
        relative_path: &str,
    ) -> String {
        self.ready().await;
        self.image_url(work_dir, entity_set_name, relative_path)
    }

    pub async fn video_url_async(
        &self,
        work_dir: &str,
        entity_set_name: &str,
        relative_path: &str,
    ) -> String {
        self.ready().await;
        self.video_url(work_dir, entity_set_name, relative_path)
    }

    pub async fn final_video_url_async(&self, work_dir: &str, entity_set_name: &str) -> String {
        self.ready().await;
        self.final_video_url(work_dir, entity_set_name)
    }

    fn media_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let url = format!("{}{}?{}", self.base_url(), path, encode_query(query));
        debug!("Generated media URL: {}", url);
        url
    }

    // Request plumbing

    fn log_request(&self, endpoint: &str, method: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.logs
            .add_log(ApiLogEntry::pending(id.clone(), endpoint, method));
        id
    }

    /// POST `request` as a multipart form and settle its ledger row
    ///
    /// With a retry policy, statuses are classified (4xx terminal, 5xx
    /// retried); without one any non-success status fails the call.
    async fn post_form<Req, Resp>(
        &self,
        stage: &Stage,
        request: &Req,
        retry: Option<&RetryPolicy>,
        success: &str,
    ) -> Result<Resp>
    where
        Req: MultipartRequest,
        Resp: DeserializeOwned,
    {
        let log_id = self.log_request(stage.path, "POST");

        match self.send_form(stage.path, request, retry).await {
            Ok(response) => {
                self.logs.update_log(&log_id, LogUpdate::success(success));
                info!("{} {}", stage.path, success);
                Ok(response)
            }
            Err(e) => {
                let error_msg = e.to_string();
                warn!("{} failed: {}", stage.path, error_msg);
                self.logs.update_log(&log_id, LogUpdate::error(error_msg));
                Err(ApiError::Operation {
                    operation: stage.label,
                    source: Box::new(e),
                })
            }
        }
    }

    async fn send_form<Req, Resp>(
        &self,
        path: &str,
        request: &Req,
        retry: Option<&RetryPolicy>,
    ) -> Result<Resp>
    where
        Req: MultipartRequest,
        Resp: DeserializeOwned,
    {
        let form = EncodedForm::encode(request)?;
        let url = format!("{}{}", self.base_url(), path);

        let response = match retry {
            Some(retry) => self.send_with_retry(&url, &form, retry).await?,
            None => {
                let response = self.http.post(&url).multipart(form.to_multipart()?).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ApiError::Status {
                        status: status.as_u16(),
                    });
                }
                response
            }
        };

        decode(response).await
    }

    async fn send_with_retry(
        &self,
        url: &str,
        form: &EncodedForm,
        retry: &RetryPolicy,
    ) -> Result<Response> {
        let attempts = retry.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("POST {} (attempt {}/{})", url, attempt, attempts);

            match self.send_once(url, form).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        "POST {} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        url, attempt, attempts, e, delay
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if !e.is_retryable() {
                        warn!("Client error detected, not retrying: {}", e);
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, form: &EncodedForm) -> Result<Response> {
        let response = self
            .http
            .post(url)
            .multipart(form.to_multipart()?)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.is_client_error() {
            let body = match response.text().await {
                Ok(text) => text,
                Err(_) => "Unknown error (failed to read response body)".to_string(),
            };
            return Err(ApiError::Request {
                status: status.as_u16(),
                body,
            });
        }

        Err(ApiError::Server {
            status: status.as_u16(),
        })
    }

    /// GET a listing endpoint; 404 means "nothing yet" and is not an error
    async fn load<T>(&self, listing: &Listing, query: &[(&str, &str)]) -> T
    where
        T: DeserializeOwned + Default,
    {
        let log_id = self.log_request(listing.path, "GET");
        let url = format!("{}{}?{}", self.base_url(), listing.path, encode_query(query));

        match self.fetch_listing::<T>(&url).await {
            Ok(Some(body)) => {
                self.logs.update_log(&log_id, LogUpdate::success(listing.loaded));
                body
            }
            Ok(None) => {
                debug!("{}: {}", listing.path, listing.missing);
                self.logs.update_log(&log_id, LogUpdate::success(listing.missing));
                T::default()
            }
            Err(e) => {
                warn!("GET {} failed: {}", listing.path, e);
                self.logs.update_log(&log_id, LogUpdate::error(e.to_string()));
                T::default()
            }
        }
    }

    /// `Ok(None)` when the backend answers 404
    async fn fetch_listing<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }
        decode(response).await.map(Some)
    }
}

fn project_query<'a>(work_dir: &'a str, entity_set_name: &'a str) -> [(&'static str, &'a str); 2] {
    [("work_dir", work_dir), ("entity_set_name", entity_set_name)]
}

fn encode_query(query: &[(&str, &str)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish()
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client(api_url: &str) -> ApiClient {
        let config = ClientConfig::new()
            .with_api_url(api_url)
            .with_discovery(false);
        ApiClient::new(config, LogStore::new()).unwrap()
    }

    #[test]
    fn test_query_is_form_urlencoded_in_order() {
        assert_eq!(
            encode_query(&[("work_dir", "/data/my work"), ("entity_set_name", "a&b=c")]),
            "work_dir=%2Fdata%2Fmy+work&entity_set_name=a%26b%3Dc"
        );
    }

    #[test]
    fn test_media_urls() {
        let client = offline_client("http://studio:8000");

        assert_eq!(
            client.image_url("/w", "pilot", "cut_images/S0001-C0001.png"),
            "http://studio:8000/static/image?work_dir=%2Fw&entity_set_name=pilot&relative_path=cut_images%2FS0001-C0001.png"
        );
        assert_eq!(
            client.video_url("/w", "pilot", "clips/a b.mp4"),
            "http://studio:8000/static/video?work_dir=%2Fw&entity_set_name=pilot&relative_path=clips%2Fa+b.mp4"
        );
        assert_eq!(
            client.final_video_url("/w", "pilot"),
            "http://studio:8000/final-video?work_dir=%2Fw&entity_set_name=pilot"
        );
    }

    #[test]
    fn test_debug_info_without_discovery() {
        let client = offline_client("http://studio:8000/");
        let info = client.debug_info();
        assert_eq!(info.base_url, "http://studio:8000");
        assert_eq!(info.dynamic_base_url, None);
        assert_eq!(info.current_url, "http://studio:8000");
        assert_eq!(info.page_host, None);
    }

    #[tokio::test]
    async fn test_async_url_waits_for_ready() {
        let client = offline_client("http://studio:8000");
        assert_eq!(
            client.final_video_url_async("w", "s").await,
            "http://studio:8000/final-video?work_dir=w&entity_set_name=s"
        );
    }
}
