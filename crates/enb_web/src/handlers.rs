use axum::{
    extract::{Path, Query, State},
    Json,
};
use enb_core::config::DEFAULT_NOTIFY_THRESHOLD;
use enb_core::{ArticleRef, Company, Keyword, PickupRecord, RelevanceScore};
use enb_pickup::{HighRelevanceReport, ProcessingReport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ArticleCreate {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct KeywordCreate {
    pub word: String,
}

#[derive(Debug, Deserialize)]
pub struct CompanyCreate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdQuery {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_NOTIFY_THRESHOLD
}

#[derive(Debug, Default, Deserialize)]
pub struct RunQuery {
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkippedArticle {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineRun {
    pub persisted: bool,
    pub results: Vec<PickupRecord>,
    pub skipped: Vec<SkippedArticle>,
}

fn deleted(kind: &str) -> Json<Value> {
    Json(json!({ "message": format!("{} deleted successfully", kind) }))
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Energy News Bot API" }))
}

pub async fn create_article(
    State(state): State<AppState>,
    Json(body): Json<ArticleCreate>,
) -> ApiResult<Json<ArticleRef>> {
    Ok(Json(state.service.add_article(&body.url).await?))
}

pub async fn list_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<ArticleRef>>> {
    Ok(Json(state.service.list_articles().await?))
}

pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.service.delete_article(id).await?;
    Ok(deleted("Article"))
}

pub async fn create_keyword(
    State(state): State<AppState>,
    Json(body): Json<KeywordCreate>,
) -> ApiResult<Json<Keyword>> {
    Ok(Json(state.service.add_keyword(&body.word).await?))
}

pub async fn list_keywords(State(state): State<AppState>) -> ApiResult<Json<Vec<Keyword>>> {
    Ok(Json(state.service.list_keywords().await?))
}

pub async fn delete_keyword(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.service.delete_keyword(id).await?;
    Ok(deleted("Keyword"))
}

pub async fn create_company(
    State(state): State<AppState>,
    Json(body): Json<CompanyCreate>,
) -> ApiResult<Json<Company>> {
    Ok(Json(state.service.add_company(&body.name).await?))
}

pub async fn list_companies(State(state): State<AppState>) -> ApiResult<Json<Vec<Company>>> {
    Ok(Json(state.service.list_companies().await?))
}

pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    state.service.delete_company(id).await?;
    Ok(deleted("Company"))
}

pub async fn article_relevance(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RelevanceScore>> {
    Ok(Json(state.service.article_relevance(id).await?))
}

pub async fn run_pipeline(
    State(state): State<AppState>,
    Query(query): Query<RunQuery>,
) -> ApiResult<Json<PipelineRun>> {
    let report = state.service.run_pipeline(query.persist).await?;
    Ok(Json(PipelineRun {
        persisted: query.persist,
        results: report.records(),
        skipped: report
            .skipped()
            .map(|(article, reason)| SkippedArticle {
                url: article.url.clone(),
                reason: reason.to_string(),
            })
            .collect(),
    }))
}

pub async fn process_articles(State(state): State<AppState>) -> ApiResult<Json<ProcessingReport>> {
    Ok(Json(state.service.process_articles().await?))
}

pub async fn post_high_relevance(
    State(state): State<AppState>,
    Query(query): Query<ThresholdQuery>,
) -> ApiResult<Json<HighRelevanceReport>> {
    Ok(Json(state.service.post_high_relevance(query.threshold).await?))
}

pub async fn live_pickup_results(State(state): State<AppState>) -> ApiResult<Json<Vec<PickupRecord>>> {
    Ok(Json(state.service.live_pickup_results().await?))
}

pub async fn stored_pickup_results(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PickupRecord>>> {
    Ok(Json(state.service.stored_pickup_results().await?))
}
