use crate::catalog::{only_globo, only_globo_sections, Catalog};
use crate::config::Settings;
use crate::error::CatalogError;
use crate::favorites::{FavoriteStore, FilePreferences, PreferenceStore};
use crate::models::{MediaType, Movie, MovieDetail, MovieSection, PagedMovies};
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

pub async fn run_server(settings: Settings) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(match settings.tmdb_base_url.as_deref() {
        Some(base) => TmdbClient::with_base_url(settings.tmdb_api_key.clone(), base)?,
        None => TmdbClient::new(settings.tmdb_api_key.clone())?,
    });

    let file_prefs = FilePreferences::new(settings.favorites_path.clone());
    info!("Favorites stored in {}", file_prefs.path().display());
    let prefs: Arc<dyn PreferenceStore> = Arc::new(file_prefs);
    let favorites = Arc::new(FavoriteStore::load(prefs).await);

    let state = AppState {
        catalog: Arc::new(Catalog::new(tmdb, favorites)),
    };
    let app = build_router(state).layer(TraceLayer::new_for_http());

    info!("Listening on {}", settings.bind_addr);
    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/home", get(home))
        .route("/search", get(search))
        .route("/content/:media_type/:id", get(content_details))
        .route("/favorites", get(list_favorites).put(replace_favorites))
        .route("/favorites/toggle", post(toggle_favorite))
        .route("/favorites/:media_type/:id", get(favorite_status))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
struct HomeQuery {
    #[serde(default)]
    globo_only: bool,
}

async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeQuery>,
) -> Result<Json<Vec<MovieSection>>, CatalogError> {
    let sections = state.catalog.home_sections().await?;
    if params.globo_only {
        return Ok(Json(only_globo_sections(sections)));
    }
    Ok(Json(sections))
}

#[derive(Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default)]
    globo_only: bool,
}

fn default_page() -> u32 {
    1
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<PagedMovies>, CatalogError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(CatalogError::BadRequest("query must not be empty".to_string()));
    }
    if params.page == 0 {
        return Err(CatalogError::BadRequest("page starts at 1".to_string()));
    }
    let mut found = state.catalog.search_content(query, params.page).await?;
    if params.globo_only {
        found.results = only_globo(found.results);
    }
    Ok(Json(found))
}

fn parse_media_type(raw: &str) -> Result<MediaType, CatalogError> {
    raw.parse()
        .map_err(|e: anyhow::Error| CatalogError::BadRequest(e.to_string()))
}

fn parse_id(raw: &str) -> Result<i32, CatalogError> {
    raw.trim()
        .parse()
        .map_err(|_| CatalogError::BadRequest(format!("id must be an integer, got '{}'", raw)))
}

async fn content_details(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> Result<Json<MovieDetail>, CatalogError> {
    let media_type = parse_media_type(&media_type)?;
    let id = parse_id(&id)?;
    Ok(Json(state.catalog.content_details(id, media_type).await?))
}

async fn list_favorites(State(state): State<AppState>) -> Json<Vec<Movie>> {
    Json(state.catalog.favorites())
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Json(movie): Json<Movie>,
) -> Result<Json<Vec<Movie>>, CatalogError> {
    Ok(Json(state.catalog.toggle_favorite(&movie).await?))
}

async fn replace_favorites(
    State(state): State<AppState>,
    Json(movies): Json<Vec<Movie>>,
) -> Result<Json<Vec<Movie>>, CatalogError> {
    state.catalog.replace_favorites(movies).await?;
    Ok(Json(state.catalog.favorites()))
}

async fn favorite_status(
    State(state): State<AppState>,
    Path((media_type, id)): Path<(String, String)>,
) -> Result<Json<Value>, CatalogError> {
    let media_type = parse_media_type(&media_type)?;
    let id = parse_id(&id)?;
    Ok(Json(json!({
        "id": id,
        "media_type": media_type,
        "favorite": state.catalog.is_favorite(id, media_type),
    })))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
