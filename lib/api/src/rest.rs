use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use dealscout_core::{Document, FusedResult, Strategy};
use dealscout_pipeline::{MarkdownRenderer, QueryPipeline, ResultRenderer, SearchOutcome, StageFailure};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Slack on top of the pipeline deadline before the request is abandoned
const BLOCKING_GRACE_MS: u64 = 2_000;

#[derive(Error, Debug)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn into_response(self) -> HttpResponse {
        let body = serde_json::json!({ "error": self.to_string() });
        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(body),
            ApiError::Unavailable(_) => HttpResponse::ServiceUnavailable().json(body),
            ApiError::Internal(_) => HttpResponse::InternalServerError().json(body),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ResponseFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    /// Skip routing; "strict" / "flexible" (or "structured" / "semantic")
    strategy: Option<String>,
    #[serde(default)]
    format: ResponseFormat,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    id: &'a str,
    score: f64,
    document: &'a Document,
}

#[derive(Serialize)]
struct SearchResponse<'a> {
    query: &'a str,
    strategy: Strategy,
    rationale: &'a str,
    shape: Option<&'static str>,
    hits: Vec<SearchHit<'a>>,
    failures: &'a [StageFailure],
    timed_out: bool,
    elapsed_ms: u64,
}

impl<'a> SearchResponse<'a> {
    fn new(query: &'a str, outcome: &'a SearchOutcome) -> Self {
        Self {
            query,
            strategy: outcome.decision.strategy,
            rationale: &outcome.decision.rationale,
            shape: outcome.compiled.as_ref().map(|c| c.shape()),
            hits: hits(&outcome.result),
            failures: &outcome.failures,
            timed_out: outcome.timed_out,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}

fn hits(result: &FusedResult) -> Vec<SearchHit<'_>> {
    result
        .hits
        .iter()
        .map(|hit| SearchHit {
            id: hit.id.as_str(),
            score: hit.score,
            document: &hit.document,
        })
        .collect()
}

pub struct RestApi;

impl RestApi {
    pub async fn start(pipeline: Arc<QueryPipeline>, port: u16) -> std::io::Result<()> {
        info!("REST API listening on 0.0.0.0:{}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(pipeline.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Route table, shared by the server and tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/search", web::post().to(search))
        .route("/explain", web::post().to(explain))
        .route("/catalog", web::get().to(get_catalog))
        .route("/catalog/refresh", web::post().to(refresh_catalog));
}

fn parse_strategy(raw: Option<&str>) -> Result<Option<Strategy>, ApiError> {
    raw.map(str::parse::<Strategy>)
        .transpose()
        .map_err(ApiError::BadRequest)
}

/// Run the blocking pipeline off the async workers, bounded by its own
/// deadline plus a grace period. An abandoned run still answers with an
/// empty result.
async fn run_pipeline(
    pipeline: &Arc<QueryPipeline>,
    query: String,
    strategy: Option<Strategy>,
) -> Result<SearchOutcome, ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let limit = Duration::from_millis(pipeline.config().query_timeout_ms + BLOCKING_GRACE_MS);
    let worker = Arc::clone(pipeline);
    let text = query.clone();
    let blocking = web::block(move || worker.search_with(&text, strategy));

    match tokio::time::timeout(limit, blocking).await {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(e)) => Err(ApiError::Internal(format!("search worker failed: {}", e))),
        Err(_) => {
            warn!(query = %query, stage = "request", "search abandoned after {}ms", limit.as_millis());
            Ok(SearchOutcome::abandoned(limit))
        }
    }
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    })))
}

async fn search(
    pipeline: web::Data<Arc<QueryPipeline>>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let strategy = match parse_strategy(req.strategy.as_deref()) {
        Ok(strategy) => strategy,
        Err(e) => return Ok(e.into_response()),
    };

    let outcome = match run_pipeline(&pipeline, req.query.clone(), strategy).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok(e.into_response()),
    };

    match req.format {
        ResponseFormat::Json => Ok(HttpResponse::Ok().json(SearchResponse::new(&req.query, &outcome))),
        ResponseFormat::Markdown => Ok(HttpResponse::Ok()
            .content_type("text/markdown; charset=utf-8")
            .body(MarkdownRenderer.render(&req.query, &outcome))),
    }
}

async fn explain(
    pipeline: web::Data<Arc<QueryPipeline>>,
    req: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let req = req.into_inner();
    let strategy = match parse_strategy(req.strategy.as_deref()) {
        Ok(strategy) => strategy,
        Err(e) => return Ok(e.into_response()),
    };

    match run_pipeline(&pipeline, req.query, strategy).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(e) => Ok(e.into_response()),
    }
}

async fn get_catalog(pipeline: web::Data<Arc<QueryPipeline>>) -> ActixResult<HttpResponse> {
    let pipeline = Arc::clone(&pipeline);
    match web::block(move || pipeline.catalog()).await {
        Ok(catalog) => Ok(HttpResponse::Ok().json(catalog.as_ref())),
        Err(e) => Ok(ApiError::Internal(e.to_string()).into_response()),
    }
}

async fn refresh_catalog(pipeline: web::Data<Arc<QueryPipeline>>) -> ActixResult<HttpResponse> {
    let pipeline = Arc::clone(&pipeline);
    match web::block(move || pipeline.refresh_catalog()).await {
        Ok(Ok(catalog)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true,
            "fields": catalog.fields.len()
        }))),
        Ok(Err(e)) => Ok(ApiError::Unavailable(e.to_string()).into_response()),
        Err(e) => Ok(ApiError::Internal(e.to_string()).into_response()),
    }
}
