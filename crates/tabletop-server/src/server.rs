//! HTTP server and request handling.

use crate::protocol::{
    ActionRequest, ActionResult, CreateGameRequest, DevelopmentsQuery, ErrorBody, GameView,
    StagesResponse,
};
use crate::session::{GameSession, SessionError};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tabletop_core::deck::{
    self, developments_file, Manifest, StageSummary, MANIFEST_FILE, POLICIES_FILE,
    STAGE_SUMMARIES_FILE,
};
use tabletop_core::{Deck, DeckError};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors returned to HTTP clients as `{ "error": ... }`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<DeckError> for ApiError {
    fn from(e: DeckError) -> Self {
        match &e {
            DeckError::Io { path, source } if source.kind() == ErrorKind::NotFound => {
                ApiError::NotFound(path.display().to_string())
            }
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Server state shared across all requests.
pub struct ServerState {
    /// Root of the deck being served
    pub deck_dir: PathBuf,
    /// Hosted games
    pub sessions: DashMap<Uuid, GameSession>,
}

impl ServerState {
    pub fn new(deck_dir: PathBuf) -> Self {
        Self {
            deck_dir,
            sessions: DashMap::new(),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, relative: &str) -> Result<T, ApiError> {
        let path = self.deck_dir.join(relative);
        let text = read_file(&path).await?;
        serde_json::from_str(&text).map_err(|source| DeckError::Json { path, source }.into())
    }

    async fn read_jsonl(&self, relative: &str) -> Result<Vec<Value>, ApiError> {
        let path = self.deck_dir.join(relative);
        let text = read_file(&path).await?;
        deck::parse_jsonl(&text)
            .map_err(|(line, source)| DeckError::JsonLine { path, line, source }.into())
    }

    async fn load_deck(&self) -> Result<Deck, ApiError> {
        let dir = self.deck_dir.clone();
        tokio::task::spawn_blocking(move || Deck::load(dir))
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}

async fn read_file(path: &std::path::Path) -> Result<String, ApiError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        DeckError::Io {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Build the API router.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/manifest", get(get_manifest))
        .route("/api/policies", get(get_policies))
        .route("/api/developments", get(get_developments))
        .route("/api/stages", get(get_stages))
        .route("/images/:kind/:file", get(get_image))
        .route("/api/games", post(create_game))
        .route("/api/games/:id", get(get_game).delete(delete_game))
        .route("/api/games/:id/actions", post(apply_action))
        .with_state(state)
}

/// Run the HTTP server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Tabletop server listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ==================== Deck Files ====================

async fn get_manifest(State(state): State<Arc<ServerState>>) -> Result<Json<Value>, ApiError> {
    state.read_json(MANIFEST_FILE).await.map(Json)
}

async fn get_policies(State(state): State<Arc<ServerState>>) -> Result<Json<Vec<Value>>, ApiError> {
    state.read_jsonl(POLICIES_FILE).await.map(Json)
}

async fn get_developments(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<DevelopmentsQuery>,
) -> Result<Json<Vec<Value>>, ApiError> {
    if let Some(stage) = query.stage {
        return state.read_jsonl(&developments_file(stage)).await.map(Json);
    }

    let cards_dir = state.deck_dir.join("cards");
    let files = tokio::task::spawn_blocking(move || deck::development_files(&cards_dir))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let mut cards = Vec::new();
    for (stage, _) in files {
        cards.extend(state.read_jsonl(&developments_file(stage)).await?);
    }
    Ok(Json(cards))
}

async fn get_stages(State(state): State<Arc<ServerState>>) -> Result<Json<StagesResponse>, ApiError> {
    let manifest: Manifest = state.read_json(MANIFEST_FILE).await?;
    let summaries: Vec<StageSummary> = match state.read_json(STAGE_SUMMARIES_FILE).await {
        Ok(summaries) => summaries,
        Err(ApiError::NotFound(_)) => Vec::new(),
        Err(e) => return Err(e),
    };

    Ok(Json(StagesResponse {
        count: manifest.stages.count,
        definitions: manifest.stages.definitions,
        summaries,
    }))
}

async fn get_image(
    State(state): State<Arc<ServerState>>,
    Path((kind, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !matches!(kind.as_str(), "policy" | "development") {
        return Err(ApiError::NotFound(format!("images/{}", kind)));
    }
    if file.is_empty() || file.starts_with('.') || file.contains(['/', '\\']) {
        warn!("Rejected image path {:?}", file);
        return Err(ApiError::BadRequest("Invalid image name".to_string()));
    }
    let content_type = image_content_type(&file)
        .ok_or_else(|| ApiError::NotFound(format!("images/{}/{}", kind, file)))?;

    let path = state.deck_dir.join("images").join(&kind).join(&file);
    let bytes = tokio::fs::read(&path).await.map_err(|source| {
        ApiError::from(DeckError::Io {
            path: path.clone(),
            source,
        })
    })?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

fn image_content_type(file: &str) -> Option<&'static str> {
    let ext = file.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

// ==================== Sessions ====================

async fn create_game(
    State(state): State<Arc<ServerState>>,
    body: Option<Json<CreateGameRequest>>,
) -> Result<(StatusCode, Json<GameView>), ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let deck = state.load_deck().await?;
    let seed = request.seed.unwrap_or_else(rand::random);

    let id = Uuid::new_v4();
    let session = GameSession::new(id, deck, seed);
    let view = session.to_view();
    state.sessions.insert(id, session);

    info!("Created game {} with seed {}", id, seed);
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_game(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameView>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("game {}", id)))?;
    Ok(Json(session.to_view()))
}

async fn apply_action(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResult>, ApiError> {
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(format!("game {}", id)))?;

    let events = session.apply_action(request.action)?;
    let game = session.to_view();
    Ok(Json(ActionResult { events, game }))
}

async fn delete_game(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(&id)
        .ok_or_else(|| ApiError::NotFound(format!("game {}", id)))?;
    info!("Removed game {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tower::ServiceExt;

    fn policy_json(id: &str) -> Value {
        json!({
            "id": id,
            "title": format!("{} Initiative", id),
            "short_description": "",
            "description": "",
            "category": "labor",
            "cost": {"budget_level": 2, "implementation_complexity": 2, "notes": ""},
            "timeline": {"time_to_launch": "months", "time_to_impact": "1-2y"},
            "impact_score": 3,
            "tags": ["job_displacement"],
            "addresses_tags": [],
            "side_effect_tags": [],
            "prerequisites_policy_tags": [],
            "synergy_policy_tags": [],
            "role_restrictions": [],
            "art_prompt": "",
            "flavor_quote": ""
        })
    }

    fn development_json(id: &str, stage: u32) -> Value {
        json!({
            "id": id,
            "stage": stage,
            "title": format!("{} Shift", id),
            "short_description": "",
            "description": "",
            "valence": "positive",
            "arrows_up": 2,
            "arrows_down": 0,
            "severity": 2,
            "tags": ["productivity_growth"],
            "thread_id": "thread_0",
            "supersedes": null,
            "activation": {"type": "immediate", "required_policy_tags": []},
            "effects": [],
            "art_prompt": "",
            "suggested_visibility": "faceup"
        })
    }

    fn jsonl(rows: &[Value]) -> String {
        rows.iter().map(|r| r.to_string() + "\n").collect()
    }

    fn write_deck(root: &std::path::Path) {
        fs::create_dir_all(root.join("cards")).unwrap();
        fs::create_dir_all(root.join("meta")).unwrap();
        fs::create_dir_all(root.join("images/policy")).unwrap();

        let manifest = json!({
            "deck_id": "test-deck",
            "scenario": {"name": "Baseline"},
            "gameplay_defaults": {},
            "stages": {"count": 2, "definitions": [
                {"id": 0, "name": "Stage 0"},
                {"id": 1, "name": "Stage 1"}
            ]}
        });
        fs::write(root.join("manifest.json"), manifest.to_string()).unwrap();

        let policies: Vec<Value> = (0..8).map(|i| policy_json(&format!("policy_{:03}", i))).collect();
        fs::write(root.join("cards/policies.jsonl"), jsonl(&policies)).unwrap();

        for stage in 0..2 {
            let devs: Vec<Value> = (0..8)
                .map(|i| development_json(&format!("dev_s{}_{:02}", stage, i), stage))
                .collect();
            fs::write(
                root.join(format!("cards/developments.stage{}.jsonl", stage)),
                jsonl(&devs),
            )
            .unwrap();
        }

        fs::write(root.join("images/policy/policy_000.png"), [0x89, b'P', b'N', b'G']).unwrap();
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn test_app() -> (tempfile::TempDir, Arc<ServerState>) {
        let dir = tempfile::tempdir().unwrap();
        write_deck(dir.path());
        let state = Arc::new(ServerState::new(dir.path().to_path_buf()));
        (dir, state)
    }

    #[tokio::test]
    async fn test_manifest_and_cards() {
        let (_dir, state) = test_app();

        let (status, manifest) = get_json(router(state.clone()), "/api/manifest").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(manifest["deck_id"], "test-deck");

        let (_, policies) = get_json(router(state.clone()), "/api/policies").await;
        assert_eq!(policies.as_array().unwrap().len(), 8);

        let (_, all) = get_json(router(state.clone()), "/api/developments").await;
        assert_eq!(all.as_array().unwrap().len(), 16);
        assert_eq!(all[0]["id"], "dev_s0_00");
        assert_eq!(all[8]["id"], "dev_s1_00");

        let (_, one) = get_json(router(state.clone()), "/api/developments?stage=1").await;
        assert_eq!(one.as_array().unwrap().len(), 8);

        let (status, _) = get_json(router(state), "/api/developments?stage=5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stages_without_summaries() {
        let (_dir, state) = test_app();
        let (status, stages) = get_json(router(state), "/api/stages").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stages["count"], 2);
        assert_eq!(stages["definitions"][1]["name"], "Stage 1");
        assert_eq!(stages["summaries"], json!([]));
    }

    #[tokio::test]
    async fn test_missing_deck_is_not_found() {
        let state = Arc::new(ServerState::new(PathBuf::from("/nonexistent/deck")));
        let (status, body) = get_json(router(state), "/api/manifest").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("manifest.json"));
    }

    #[tokio::test]
    async fn test_images() {
        let (_dir, state) = test_app();

        let request = Request::builder()
            .uri("/images/policy/policy_000.png")
            .body(Body::empty())
            .unwrap();
        let response = router(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let request = Request::builder()
            .uri("/images/policy/..secret.png")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let request = Request::builder()
            .uri("/images/other/x.png")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router(state), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_game_session_flow() {
        let (_dir, state) = test_app();

        let (status, created) = post_json(router(state.clone()), "/api/games", json!({"seed": 5})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["seed"], 5);
        assert_eq!(created["table"]["hand"].as_array().unwrap().len(), 5);
        let id = created["game_id"].as_str().unwrap().to_string();

        let (status, result) = post_json(
            router(state.clone()),
            &format!("/api/games/{}/actions", id),
            json!({"action": "AdvanceRound"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["game"]["table"]["round"], 1);
        assert_eq!(result["game"]["can_undo"], true);

        let (status, error) = post_json(
            router(state.clone()),
            &format!("/api/games/{}/actions", id),
            json!({"action": {"PlayPolicy": "missing"}}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["error"].as_str().unwrap().contains("missing"));

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/games/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router(state.clone()), request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.is_empty());
    }
}
