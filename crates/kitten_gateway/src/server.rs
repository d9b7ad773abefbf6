use crate::error::ApiError;
use crate::types::{
    HealthConfig, HealthResponse, ModelInfo, ModelList, RootInfo, SpeechRequestBody, VoiceData,
    VoiceList,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use kitten_core::{GatewayConfig, SERVER_VERSION};
use kitten_pipeline::SpeechPipeline;
use kitten_voice::{encode, EngineCell, NATIVE_FORMATS};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const HEADER_CHUNKS_PROCESSED: &str = "x-chunks-processed";
pub const HEADER_TEXT_LENGTH: &str = "x-text-length";

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<SpeechPipeline>,
    config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(config: GatewayConfig, engine: Arc<EngineCell>) -> Self {
        let pipeline = SpeechPipeline::new(&config, engine);
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.request_timeout_secs.max(1))
    }
}

/// The OpenAI-compatible HTTP server.
///
/// - `POST /v1/audio/speech`: synthesize text, returns audio bytes
/// - `GET /v1/audio/voices`: public voice names and their engine voices
/// - `GET /v1/models`: model ids accepted in requests
/// - `GET /health`: engine readiness and active limits
/// - `GET /`: server info
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(config: GatewayConfig, engine: Arc<EngineCell>) -> Self {
        let host = config.server.host.clone();
        let port = config.server.port;
        Self {
            state: AppState::new(config, engine),
            host,
            port,
        }
    }

    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Bind the configured address.
    pub async fn listen(&self) -> Result<TcpListener> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Gateway failed to bind {}", addr))?;
        tracing::info!("Gateway listening on {}", addr);
        Ok(listener)
    }

    /// Serve on `listener` until `shutdown` resolves; in-flight requests finish first.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Gateway server error")
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/v1/models", get(list_models))
        .route("/v1/audio/voices", get(list_voices))
        .route("/v1/audio/speech", post(create_speech))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Route handlers
// ============================================================================

async fn root() -> Json<RootInfo> {
    let endpoints = BTreeMap::from([
        ("speech", "/v1/audio/speech"),
        ("models", "/v1/models"),
        ("voices", "/v1/audio/voices"),
        ("health", "/health"),
    ]);
    Json(RootInfo {
        message: "KittenTTS API Server",
        status: "running",
        version: SERVER_VERSION,
        endpoints,
    })
}

async fn list_models() -> Json<ModelList> {
    Json(ModelList::available())
}

/// GET /v1/audio/voices: native voices come from the engine once it is up.
async fn list_voices(State(state): State<AppState>) -> Json<VoiceList> {
    let voices = state.pipeline.voices();
    let native = match state.pipeline.engine().get() {
        Ok(engine) => engine.capabilities().native_voices,
        Err(_) => voices.engine_voices(),
    };
    let openai_compatible = voices.public_names();
    Json(VoiceList {
        object: "list",
        data: VoiceData {
            total_voices: openai_compatible.len(),
            openai_compatible,
            native,
            voice_mapping: voices.mapping().clone(),
        },
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.pipeline.engine().get().ok();
    let model_info = engine.as_ref().map(|engine| {
        let capabilities = engine.capabilities();
        ModelInfo {
            model_type: engine.provider_name(),
            voices_available: capabilities.native_voices.len(),
            capabilities,
        }
    });
    let limits = state.pipeline.limits();
    Json(HealthResponse {
        status: if engine.is_some() {
            "healthy"
        } else {
            "model_not_loaded"
        },
        model_loaded: engine.is_some(),
        server_version: SERVER_VERSION,
        model_info,
        supported_formats: NATIVE_FORMATS.to_vec(),
        config: HealthConfig {
            max_text_length: limits.max_text_length,
            max_total_chars: limits.max_total_chars,
            max_chars_per_chunk: limits.max_chars_per_chunk,
            chunking_enabled: limits.enable_chunking,
            available_voices: state.pipeline.voices().len(),
        },
    })
}

/// POST /v1/audio/speech: runs the full pipeline, then encodes the result.
///
/// The request is cancelled when it exceeds `server.request_timeout_secs` or
/// when the client goes away and axum drops this future.
async fn create_speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let format = body.format();
    tracing::info!(
        "Speech request: model={}, voice={}, format={}, {} chars",
        body.model,
        body.voice,
        format.extension(),
        body.input.chars().count()
    );
    let request = body.into_request();

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();
    let timeout = state.request_timeout();
    let outcome = match tokio::time::timeout(timeout, state.pipeline.run(&request, &cancel)).await
    {
        Ok(result) => result?,
        Err(_) => {
            cancel.cancel();
            return Err(ApiError::timeout(timeout));
        }
    };

    let chunks_processed = outcome.chunks_processed;
    let text_length = outcome.text_length;
    let audio = outcome.audio;
    let encoded = tokio::task::spawn_blocking(move || encode(&audio, format))
        .await
        .map_err(|e| ApiError::internal(e.into()))?
        .map_err(ApiError::internal)?;

    tracing::info!(
        "Successfully generated {} bytes of {} audio",
        encoded.bytes.len(),
        encoded.format.extension()
    );

    let content_length = encoded.bytes.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, encoded.format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", encoded.filename()),
        )
        .header(header::CONTENT_LENGTH, content_length.to_string())
        .header(HEADER_CHUNKS_PROCESSED, chunks_processed.to_string())
        .header(HEADER_TEXT_LENGTH, text_length.to_string())
        .body(Body::from(encoded.bytes))
        .map_err(|e| ApiError::internal(e.into()))
}
