// Best Card Finder - Web Server
// REST API with Axum over the search engine and saved-card store

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use best_card::{
    delete_saved_card, get_saved_card_records, insert_saved_card, load_saved_cards,
    open_database, AppConfig, CardGroup, CardRef, Catalog, MatchResult, SavedCardRef,
    SearchEngine, SuggestionGroup,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<RwLock<SearchEngine>>,
    db: Arc<Mutex<Connection>>,
    config: Arc<AppConfig>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

fn internal_error(context: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "{}", context);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, context)
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(default)]
    grouped: bool,
}

#[derive(Deserialize)]
struct SuggestParams {
    #[serde(default)]
    q: String,
    #[serde(default)]
    grouped: bool,
}

/// Flat list, or grouped by category with synonym terms included
#[derive(Serialize)]
#[serde(untagged)]
enum SuggestResponse {
    Flat(Vec<String>),
    Grouped(Vec<SuggestionGroup>),
}

/// Either flat rows or one row per card
#[derive(Serialize)]
#[serde(untagged)]
enum SearchResponse {
    Rows(Vec<MatchResult>),
    Grouped(Vec<CardGroup>),
}

#[derive(Serialize)]
struct ReloadResponse {
    changed: bool,
    cards: usize,
    fingerprint: String,
}

#[derive(Serialize)]
struct SavedChange {
    changed: bool,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/search?q=...&grouped=true - Ranked benefits for a query
async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    run_search(&state, params.q.as_deref().unwrap_or(""), params.grouped)
}

/// GET /api/search/:query - Same, with the query in the path
///
/// `Path` has already percent-decoded the segment; it is searched as-is.
async fn search_path(State(state): State<AppState>, Path(query): Path<String>) -> Response {
    run_search(&state, &query, false)
}

fn run_search(state: &AppState, query: &str, grouped: bool) -> Response {
    let saved = {
        let conn = match state.db.lock() {
            Ok(conn) => conn,
            Err(e) => return internal_error("Database lock poisoned", e),
        };
        match load_saved_cards(&conn) {
            Ok(saved) => saved,
            Err(e) => return internal_error("Failed to load saved cards", e),
        }
    };

    let engine = match state.engine.read() {
        Ok(engine) => engine,
        Err(e) => return internal_error("Engine lock poisoned", e),
    };

    let response = if grouped {
        engine.search_grouped(query, &saved).map(SearchResponse::Grouped)
    } else {
        engine.search(query, &saved).map(SearchResponse::Rows)
    };

    match response {
        Some(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        None => error_response(StatusCode::BAD_REQUEST, "Query must not be empty"),
    }
}

/// GET /api/suggestions?q=...&grouped=true - Autocomplete entries
async fn suggestions(State(state): State<AppState>, Query(params): Query<SuggestParams>) -> Response {
    let engine = match state.engine.read() {
        Ok(engine) => engine,
        Err(e) => return internal_error("Engine lock poisoned", e),
    };
    let limit = state.config.suggestion_limit;

    let data = if params.grouped {
        SuggestResponse::Grouped(engine.suggestion_groups(&params.q, limit))
    } else {
        SuggestResponse::Flat(
            engine
                .suggestions_matching(&params.q, limit)
                .into_iter()
                .map(str::to_string)
                .collect(),
        )
    };

    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// GET /api/cards - All cards, sorted for selection lists
async fn get_cards(State(state): State<AppState>) -> Response {
    match state.engine.read() {
        Ok(engine) => {
            let cards: Vec<CardRef> = engine.cards_sorted();
            (StatusCode::OK, Json(ApiResponse::ok(cards))).into_response()
        }
        Err(e) => internal_error("Engine lock poisoned", e),
    }
}

/// GET /api/saved - Saved cards with timestamps
async fn get_saved(State(state): State<AppState>) -> Response {
    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(e) => return internal_error("Database lock poisoned", e),
    };

    match get_saved_card_records(&conn) {
        Ok(records) => (StatusCode::OK, Json(ApiResponse::ok(records))).into_response(),
        Err(e) => internal_error("Failed to load saved cards", e),
    }
}

/// POST /api/saved - Save a card ({"bank": ..., "card_name": ...})
async fn add_saved(State(state): State<AppState>, Json(card): Json<SavedCardRef>) -> Response {
    let known = match state.engine.read() {
        Ok(engine) => engine.index().contains_card(&card.bank, &card.card_name),
        Err(e) => return internal_error("Engine lock poisoned", e),
    };
    if !known {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Card not in catalog: {} - {}", card.bank, card.card_name),
        );
    }

    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(e) => return internal_error("Database lock poisoned", e),
    };

    match insert_saved_card(&conn, &card) {
        Ok(changed) => (StatusCode::OK, Json(ApiResponse::ok(SavedChange { changed }))).into_response(),
        Err(e) => internal_error("Failed to save card", e),
    }
}

/// DELETE /api/saved - Unsave a card
async fn remove_saved(State(state): State<AppState>, Json(card): Json<SavedCardRef>) -> Response {
    let conn = match state.db.lock() {
        Ok(conn) => conn,
        Err(e) => return internal_error("Database lock poisoned", e),
    };

    match delete_saved_card(&conn, &card) {
        Ok(changed) => (StatusCode::OK, Json(ApiResponse::ok(SavedChange { changed }))).into_response(),
        Err(e) => internal_error("Failed to remove card", e),
    }
}

/// POST /api/reload - Re-read the catalog file; rebuilds only if it changed
async fn reload(State(state): State<AppState>) -> Response {
    let catalog = match Catalog::from_file(&state.config.catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, format!("{:#}", e)),
    };

    let mut engine = match state.engine.write() {
        Ok(engine) => engine,
        Err(e) => return internal_error("Engine lock poisoned", e),
    };

    let changed = engine.reload(catalog);
    let response = ReloadResponse {
        changed,
        cards: engine.cards().len(),
        fingerprint: engine.index().catalog().fingerprint().to_string(),
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    best_card::logging::init_tracing("info,tower_http=debug");

    println!("🌐 Best Card Finder - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if let Err(e) = run().await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let catalog = Catalog::from_file(&config.catalog_path)?;
    let engine = SearchEngine::new(catalog, config.synonym_table()?).with_limit(config.result_limit);
    println!("✓ Catalog loaded: {} cards from {:?}", engine.cards().len(), config.catalog_path);

    let conn = open_database(&config.database_path)?;
    println!("✓ Database opened: {:?}", config.database_path);

    let bind = config.server.bind.clone();

    // Create shared state
    let state = AppState {
        engine: Arc::new(RwLock::new(engine)),
        db: Arc::new(Mutex::new(conn)),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;

    println!("\n🚀 Server running on http://{}", bind);
    println!("   API: http://{}/api/search?q=grab", bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/search", get(search))
        .route("/search/:query", get(search_path))
        .route("/suggestions", get(suggestions))
        .route("/cards", get(get_cards))
        .route("/saved", get(get_saved).post(add_saved).delete(remove_saved))
        .route("/reload", post(reload))
        .with_state(state);

    // Build main router
    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use best_card::setup_database;
    use serde_json::{json, Value};

    fn state() -> AppState {
        let catalog = Catalog::from_value(json!({
            "DBS": [{
                "card_name": "Live Fresh",
                "benefits": {
                    "ride_hailing": {
                        "description": "5% cashback on rides",
                        "merchants": [{ "name": "Grab" }]
                    },
                    "a%26b": { "description": "2% on literal percent keys" }
                }
            }]
        }))
        .unwrap();

        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        AppState {
            engine: Arc::new(RwLock::new(SearchEngine::new(
                catalog,
                best_card::SynonymTable::builtin(),
            ))),
            db: Arc::new(Mutex::new(conn)),
            config: Arc::new(AppConfig::default()),
        }
    }

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_path_query_searched_as_extracted() {
        // "/api/search/a%2526b" reaches the handler as "a%26b"
        let response = search_path(State(state()), Path("a%26b".to_string())).await;
        let (status, body) = body_json(response).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["category"], "a%26b");
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let response = search_path(State(state()), Path("  ".to_string())).await;
        let (status, body) = body_json(response).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_grouped_suggestions_include_synonym_terms() {
        let params = SuggestParams {
            q: "tax".to_string(),
            grouped: true,
        };
        let (status, body) = body_json(suggestions(State(state()), Query(params)).await).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["category"], "ride_hailing");
        assert_eq!(body["data"][0]["items"], json!(["taxi"]));

        let flat = SuggestParams {
            q: "gra".to_string(),
            grouped: false,
        };
        let (_, body) = body_json(suggestions(State(state()), Query(flat)).await).await;
        assert_eq!(body["data"], json!(["Grab"]));
    }
}
