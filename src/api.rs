use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Json, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{
    app_state::{AppState, Status},
    error::{AssistantError, AssistantResult},
    ingest,
    models::{DocumentSource, SessionInfo},
    router::Reply,
    session::ExtractionContext,
};

type ApiError = (StatusCode, Json<serde_json::Value>);

/// Tamaño máximo de un documento subido.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// --- Payloads y Respuestas de la API ---

#[derive(Deserialize)]
pub struct ChatPayload {
    message: String,
}

#[derive(Deserialize)]
pub struct UploadParams {
    name: String,
}

#[derive(Deserialize)]
pub struct AnalyzeUrlPayload {
    url: String,
}

#[derive(Deserialize)]
pub struct AnalyzeTextPayload {
    text: String,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    active: bool,
    info: Option<SessionInfo>,
}

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route(
            "/api/analyze/file",
            post(analyze_file_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/analyze/url", post(analyze_url_handler))
        .route("/api/analyze/text", post(analyze_text_handler))
        .route("/api/session", get(session_handler))
        .route("/api/status", get(status_handler))
        .route("/api/shutdown", post(shutdown_handler))
        .with_state(app_state)
}

/// CORS limitado al origen desde el que se sirve el frontend.
pub fn cors_layer(server_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(server_url)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

// --- Handlers ---

#[axum::debug_handler]
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Json<Reply> {
    let message = state.preprocessor.preprocess(&payload.message);

    let mut session = state.session.lock().unwrap();
    let mut rng = state.rng.lock().unwrap();
    let reply = state.router.route(&mut session, &message, &mut *rng);

    if let Reply::EndSession { summary } = &reply {
        info!("Sesión de extracción cerrada ({}).", summary.info.source);
    }
    Json(reply)
}

/// Recibe el fichero en el cuerpo de la petición; `name` indica el formato.
#[axum::debug_handler]
async fn analyze_file_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<SessionInfo>, ApiError> {
    let name = params.name.trim().to_string();
    if name.is_empty() || body.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Falta el nombre o el contenido del fichero."})),
        ));
    }

    let source = DocumentSource::File(name.clone());
    run_analysis(&state, source.clone(), move || {
        let text = ingest::read_upload_text(&name, &body)?;
        ingest::analyze_document(source, text)
    })
    .await
}

#[axum::debug_handler]
async fn analyze_url_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeUrlPayload>,
) -> Result<Json<SessionInfo>, ApiError> {
    let url = ingest::parse_document_url(&payload.url).map_err(error_response)?;
    let source = DocumentSource::Url(url.to_string());

    state.set_status(true, format!("Descargando {url}..."));
    let text = match ingest::fetch_url_text(&state.http, &url).await {
        Ok(text) => text,
        Err(err) => {
            state.set_status(false, format!("Error descargando {url}: {err}"));
            return Err(error_response(err));
        }
    };

    run_analysis(&state, source.clone(), move || ingest::analyze_document(source, text)).await
}

#[axum::debug_handler]
async fn analyze_text_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeTextPayload>,
) -> Result<Json<SessionInfo>, ApiError> {
    let title = payload
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "văn bản dán".to_string());
    let source = DocumentSource::Text(title);
    let text = payload.text;

    run_analysis(&state, source.clone(), move || ingest::analyze_document(source, text)).await
}

#[axum::debug_handler]
async fn session_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    let info = state.session_info();
    Json(SessionResponse {
        active: info.is_some(),
        info,
    })
}

#[axum::debug_handler]
async fn status_handler(State(state): State<AppState>) -> Json<Status> {
    Json(state.status.lock().unwrap().clone())
}

#[axum::debug_handler]
async fn shutdown_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Petición de apagado recibida.");
    if let Some(sender) = state.shutdown_sender.lock().unwrap().take() {
        let _ = sender.send(());
    }
    StatusCode::OK
}

// --- Utilidades ---

/// Ejecuta el análisis del documento en un hilo bloqueante y, si sale bien,
/// sustituye la sesión activa.
async fn run_analysis<F>(
    state: &AppState,
    source: DocumentSource,
    job: F,
) -> Result<Json<SessionInfo>, ApiError>
where
    F: FnOnce() -> AssistantResult<ExtractionContext> + Send + 'static,
{
    state.set_status(true, format!("Analizando {source}..."));

    let result = match tokio::task::spawn_blocking(job).await {
        Ok(result) => result,
        Err(e) => {
            error!("La tarea de análisis falló: {}", e);
            state.set_status(false, "Error interno analizando el documento.");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "La tarea de análisis falló."})),
            ));
        }
    };

    match result {
        Ok(context) => {
            let info = state.install_session(context);
            state.set_status(
                false,
                format!("Documento listo: {} frases ({}).", info.sentences, info.source),
            );
            Ok(Json(info))
        }
        Err(err) => {
            state.set_status(false, format!("Error analizando {source}: {err}"));
            Err(error_response(err))
        }
    }
}

fn error_response(err: AssistantError) -> ApiError {
    let status = match &err {
        AssistantError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        AssistantError::EmptyDocument(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssistantError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        AssistantError::Fetch(_) => StatusCode::BAD_GATEWAY,
        AssistantError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
        AssistantError::Io(_) | AssistantError::DimensionMismatch { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    if status.is_server_error() {
        error!("{}", err);
    }
    (status, Json(json!({ "error": err.to_string() })))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::abbrev::AbbreviationExpander;
    use crate::config::AppConfig;
    use crate::intent::IntentSet;
    use crate::knowledge::KnowledgeBase;
    use crate::router::ResponseRouter;
    use crate::session::NOT_RELEVANT_MESSAGE;

    fn test_state() -> AppState {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        AppState {
            http: ingest::http_client(config.fetch_timeout).unwrap(),
            config,
            router: Arc::new(ResponseRouter::new(KnowledgeBase::default(), IntentSet::default())),
            preprocessor: Arc::new(AbbreviationExpander::new([("tt", "tóm tắt")])),
            session: Arc::new(Mutex::new(None)),
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(5))),
            status: Arc::new(Mutex::new(Status::default())),
            shutdown_sender: Arc::new(Mutex::new(None)),
        }
    }

    async fn chat(state: &AppState, message: &str) -> Reply {
        let Json(reply) = chat_handler(
            State(state.clone()),
            Json(ChatPayload {
                message: message.to_string(),
            }),
        )
        .await;
        reply
    }

    async fn analyze_text(state: &AppState, text: &str) -> Result<Json<SessionInfo>, ApiError> {
        analyze_text_handler(
            State(state.clone()),
            Json(AnalyzeTextPayload {
                text: text.to_string(),
                title: Some("thú cưng".to_string()),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn text_analysis_opens_session() {
        let state = test_state();
        let Json(info) = analyze_text(&state, "Con mèo ngồi trên ghế. Con chó chạy trong sân.")
            .await
            .unwrap();
        assert_eq!(info.sentences, 2);
        assert!(state.session_info().is_some());
        assert!(!state.status.lock().unwrap().is_busy);

        let reply = chat(&state, "mèo").await;
        assert_eq!(reply.as_text(), Some("con mèo ngồi trên ghế"));
        let reply = chat(&state, "1 + 1").await;
        assert_eq!(reply.as_text(), Some(NOT_RELEVANT_MESSAGE));
    }

    #[tokio::test]
    async fn preprocessor_runs_before_routing() {
        let state = test_state();
        analyze_text(&state, "Con mèo ngồi trên ghế. Con chó chạy trong sân.")
            .await
            .unwrap();
        let reply = chat(&state, "tt").await;
        assert!(reply.as_text().unwrap().starts_with("- "));
    }

    #[tokio::test]
    async fn closing_message_clears_session() {
        let state = test_state();
        analyze_text(&state, "Con mèo ngồi trên ghế. Con chó chạy trong sân.")
            .await
            .unwrap();
        let reply = chat(&state, "xong rồi").await;
        assert!(matches!(reply, Reply::EndSession { .. }));
        assert!(state.session_info().is_none());

        let reply = chat(&state, "1 + 1").await;
        assert_eq!(reply.as_text(), Some("Kết quả của phép tính là: 2"));
    }

    #[tokio::test]
    async fn empty_document_keeps_previous_session() {
        let state = test_state();
        analyze_text(&state, "Con mèo ngồi trên ghế. Con chó chạy trong sân.")
            .await
            .unwrap();
        let (status, _) = analyze_text(&state, "Ngắn.").await.unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(state.session_info().unwrap().sentences, 2);
    }

    #[tokio::test]
    async fn last_finished_analysis_wins() {
        let state = test_state();
        let first = ExtractionContext::analyze(
            DocumentSource::Text("uno".into()),
            "Tài liệu thứ nhất có một câu dài.".into(),
        );
        let second = ExtractionContext::analyze(
            DocumentSource::Text("dos".into()),
            "Tài liệu thứ hai có câu dài. Và thêm một câu dài nữa.".into(),
        );
        // el segundo análisis termina antes que el primero
        state.install_session(second);
        state.install_session(first);
        let info = state.session_info().unwrap();
        assert_eq!(info.source, DocumentSource::Text("uno".into()));
        assert_eq!(info.sentences, 1);
    }

    async fn upload(state: &AppState, name: &str, body: &[u8]) -> Result<Json<SessionInfo>, ApiError> {
        analyze_file_handler(
            State(state.clone()),
            Query(UploadParams { name: name.into() }),
            Bytes::copy_from_slice(body),
        )
        .await
    }

    #[tokio::test]
    async fn empty_upload_is_bad_request() {
        let state = test_state();
        let (status, _) = upload(&state, "tai-lieu.txt", b"").await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = upload(&state, " ", b"abc").await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn uploaded_file_opens_session() {
        let state = test_state();
        let body = "# Tiêu đề\nHà Nội là thủ đô của Việt Nam.\n";
        let Json(info) = upload(&state, "tai-lieu.md", body.as_bytes()).await.unwrap();
        assert_eq!(info.sentences, 1);
        assert_eq!(info.source, DocumentSource::File("tai-lieu.md".into()));
    }

    #[tokio::test]
    async fn upload_name_does_not_read_server_files() {
        let state = test_state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "Mật khẩu bí mật của người dùng nằm ở đây.").unwrap();

        let Json(info) = upload(
            &state,
            &path.display().to_string(),
            "Tài liệu được gửi lên từ trình duyệt.".as_bytes(),
        )
        .await
        .unwrap();
        assert_eq!(info.sentences, 1);

        let reply = chat(&state, "tóm tắt").await;
        let summary = reply.as_text().unwrap();
        assert!(summary.contains("tài liệu được gửi lên từ trình duyệt"));
        assert!(!summary.contains("mật khẩu"));
    }

    #[tokio::test]
    async fn unsupported_upload_is_415() {
        let state = test_state();
        let (status, _) = upload(&state, "bang.xlsx", &[0u8, 1, 2]).await.unwrap_err();
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(state.session_info().is_none());
    }

    #[test]
    fn cors_is_limited_to_served_origin() {
        assert!(cors_layer("http://127.0.0.1:3322").is_ok());
        assert!(cors_layer("http://bad\norigin").is_err());
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_before_fetching() {
        let state = test_state();
        let (status, _) = analyze_url_handler(
            State(state),
            Json(AnalyzeUrlPayload {
                url: "ftp://example.com/doc.txt".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn blank_chat_message_is_silent() {
        let state = test_state();
        let reply = tokio_test::block_on(chat(&state, "  "));
        assert!(matches!(reply, Reply::Silent));
    }

    #[test]
    fn shutdown_fires_sender_once() {
        let state = test_state();
        let (tx, mut rx) = tokio::sync::oneshot::channel();
        *state.shutdown_sender.lock().unwrap() = Some(tx);
        tokio_test::block_on(shutdown_handler(State(state.clone())));
        assert!(rx.try_recv().is_ok());
        assert!(state.shutdown_sender.lock().unwrap().is_none());
    }
}
