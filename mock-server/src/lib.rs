use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Index name -> aliases pointing at it.
pub type Aliases = Arc<RwLock<HashMap<String, Vec<String>>>>;

#[derive(Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub text: Vec<String>,
    pub analyzer: Option<String>,
    pub tokenizer: Option<String>,
    #[serde(default)]
    pub filter: Vec<String>,
}

#[derive(Deserialize)]
pub struct AnalyzeParams {
    pub format: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub token: String,
    pub position: usize,
}

#[derive(Deserialize)]
pub struct ScrollParams {
    pub scroll: Option<String>,
    pub scroll_id: Option<String>,
}

#[derive(Deserialize)]
pub struct ScrollBody {
    pub scroll_id: String,
}

#[derive(Deserialize)]
pub struct ClearScrollBody {
    #[serde(default)]
    pub scroll_id: Vec<String>,
}

pub fn app() -> Router {
    app_with_aliases(HashMap::new())
}

pub fn app_with_aliases(aliases: HashMap<String, Vec<String>>) -> Router {
    let aliases: Aliases = Arc::new(RwLock::new(aliases));
    Router::new()
        .route("/_analyze", post(analyze))
        .route("/{index}/_analyze", post(analyze_index))
        .route(
            "/_search/scroll",
            get(scroll_get).post(scroll_post).delete(clear_scroll),
        )
        .route("/_alias", get(all_aliases))
        .route("/{index}/_alias", get(index_aliases))
        .with_state(aliases)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_aliases(
    listener: TcpListener,
    aliases: HashMap<String, Vec<String>>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_aliases(aliases)).await
}

async fn analyze(
    Query(params): Query<AnalyzeParams>,
    Json(body): Json<AnalyzeBody>,
) -> Json<Value> {
    Json(tokenize(&body, params.format.as_deref()))
}

async fn analyze_index(
    State(aliases): State<Aliases>,
    Path(index): Path<String>,
    Query(params): Query<AnalyzeParams>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<Value>, StatusCode> {
    if !aliases.read().await.contains_key(&index) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(tokenize(&body, params.format.as_deref())))
}

fn tokenize(body: &AnalyzeBody, format: Option<&str>) -> Value {
    let lowercase = body.filter.iter().any(|f| f == "lowercase");
    let keyword = body.tokenizer.as_deref() == Some("keyword") || body.analyzer.as_deref() == Some("keyword");
    let tokens: Vec<Token> = body
        .text
        .iter()
        .flat_map(|text| {
            if keyword {
                vec![text.as_str()]
            } else {
                text.split_whitespace().collect()
            }
        })
        .enumerate()
        .map(|(position, raw)| Token {
            token: if lowercase { raw.to_lowercase() } else { raw.to_string() },
            position,
        })
        .collect();
    match format {
        Some("text") => {
            let joined: Vec<&str> = tokens.iter().map(|t| t.token.as_str()).collect();
            json!({ "tokens": joined.join(" ") })
        }
        _ => json!({ "tokens": tokens }),
    }
}

async fn scroll_get(Query(params): Query<ScrollParams>) -> Result<Json<Value>, StatusCode> {
    let id = params.scroll_id.ok_or(StatusCode::BAD_REQUEST)?;
    Ok(Json(scroll_page(&id, params.scroll.as_deref())))
}

async fn scroll_post(
    Query(params): Query<ScrollParams>,
    Json(body): Json<ScrollBody>,
) -> Json<Value> {
    Json(scroll_page(&body.scroll_id, params.scroll.as_deref()))
}

fn scroll_page(id: &str, keep_alive: Option<&str>) -> Value {
    tracing::debug!(id_len = id.len(), keep_alive = ?keep_alive, "scroll page");
    json!({ "_scroll_id": id, "hits": { "hits": [] } })
}

async fn clear_scroll(Json(body): Json<ClearScrollBody>) -> Json<Value> {
    Json(json!({ "succeeded": true, "num_freed": body.scroll_id.len() }))
}

async fn all_aliases(State(aliases): State<Aliases>) -> Json<Value> {
    let aliases = aliases.read().await;
    let names: Vec<&String> = aliases.keys().collect();
    Json(alias_listing(&aliases, names))
}

async fn index_aliases(
    State(aliases): State<Aliases>,
    Path(indices): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let aliases = aliases.read().await;
    let mut names = Vec::new();
    for name in indices.split(',') {
        let (key, _) = aliases.get_key_value(name).ok_or(StatusCode::NOT_FOUND)?;
        names.push(key);
    }
    Ok(Json(alias_listing(&aliases, names)))
}

fn alias_listing(aliases: &HashMap<String, Vec<String>>, names: Vec<&String>) -> Value {
    let listing: BTreeMap<&String, Value> = names
        .into_iter()
        .map(|name| {
            let entries: serde_json::Map<String, Value> = aliases[name]
                .iter()
                .map(|alias| (alias.clone(), json!({})))
                .collect();
            (name, json!({ "aliases": entries }))
        })
        .collect();
    json!(listing)
}
