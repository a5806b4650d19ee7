use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use super::validation::{parse_body, Validator};
use crate::{
    auth::AuthUser,
    domain::{
        matching::{
            EntityKind, FilterSet, MatchRequest, ProjectTalentMatches, Recommendations,
            RelatedSkills, SimilarPortfolios, TalentProjectMatches, TalentSearchResults,
        },
        models::EntityId,
    },
    routes::ApiError,
    AppState,
};

const SEARCH_DEFAULT_LIMIT: usize = 20;
const SEARCH_DEFAULT_MIN_SIMILARITY: f64 = 0.5;
const MATCH_DEFAULT_LIMIT: usize = 20;
const MATCH_DEFAULT_MIN_SIMILARITY: f64 = 0.6;
const PORTFOLIO_DEFAULT_LIMIT: usize = 10;
const PORTFOLIO_DEFAULT_MIN_SIMILARITY: f64 = 0.6;
const SKILL_DEFAULT_LIMIT: usize = 15;
const SKILL_DEFAULT_MIN_SIMILARITY: f64 = 0.7;
const RECOMMENDATION_DEFAULT_LIMIT: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search/talents", post(search_talents))
        .route("/projects/:id/match-talents", post(match_talents))
        .route("/talents/:id/match-projects", post(match_projects))
        .route("/talents/:id/recommendations", get(recommendations))
        .route("/portfolios/:id/similar", get(similar_portfolios))
        .route("/skills/:id/related", get(related_skills))
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    data: T,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchTalentsBody {
    query: Option<String>,
    limit: Option<i64>,
    min_similarity: Option<f64>,
    filters: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct MatchBody {
    limit: Option<i64>,
    min_similarity: Option<f64>,
    filters: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    limit: Option<i64>,
    min_similarity: Option<f64>,
}

fn parse_id(raw: &str, label: &str) -> Result<EntityId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("{label} not found")))
}

fn list_params(params: Result<Query<ListParams>, QueryRejection>) -> Result<ListParams, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::invalid_field("query", rejection.body_text()))
}

fn match_request(
    app_state: &AppState,
    kind: EntityKind,
    limit: usize,
    min_similarity: f64,
    filters: &Map<String, Value>,
) -> Result<MatchRequest, ApiError> {
    let filters = FilterSet::parse(kind, filters).map_err(|e| app_state.api_error(e))?;
    MatchRequest::new(limit, min_similarity)
        .map(|request| request.with_filters(filters))
        .map_err(|e| app_state.api_error(e))
}

#[instrument(name = "POST /search/talents", skip(app_state, body))]
async fn search_talents(
    State(app_state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<TalentSearchResults>>, ApiError> {
    let body: SearchTalentsBody = parse_body(&body)?;
    let max_limit = app_state.matching().config().max_limit;

    let mut validator = Validator::new();
    let query = validator.query(body.query.as_deref());
    let limit = validator.limit(body.limit, SEARCH_DEFAULT_LIMIT, max_limit);
    let min_similarity =
        validator.min_similarity(body.min_similarity, SEARCH_DEFAULT_MIN_SIMILARITY);
    let filters = validator.filters(body.filters);
    validator.finish()?;

    let request = match_request(&app_state, EntityKind::Talent, limit, min_similarity, &filters)?;
    let results = app_state
        .matching()
        .search_talents(&query, request)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(results))
}

#[instrument(name = "POST /projects/:id/match-talents", skip(app_state, body))]
async fn match_talents(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<ProjectTalentMatches>>, ApiError> {
    let body: MatchBody = parse_body(&body)?;
    let max_limit = app_state.matching().config().max_limit;

    let mut validator = Validator::new();
    let limit = validator.limit(body.limit, MATCH_DEFAULT_LIMIT, max_limit);
    let min_similarity =
        validator.min_similarity(body.min_similarity, MATCH_DEFAULT_MIN_SIMILARITY);
    let filters = validator.filters(body.filters);
    validator.finish()?;

    let id = parse_id(&id, "Project")?;
    let project = app_state
        .matching()
        .project(id)
        .await
        .map_err(|e| app_state.api_error(e))?;

    if !user.can_act_for(project.recruiter_id) {
        return Err(ApiError::forbidden(
            "Unauthorized to view matches for this project",
        ));
    }

    let request = match_request(&app_state, EntityKind::Talent, limit, min_similarity, &filters)?;
    let matches = app_state
        .matching()
        .match_talents_to_project(&project, request)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(matches))
}

#[instrument(name = "POST /talents/:id/match-projects", skip(app_state, body))]
async fn match_projects(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<TalentProjectMatches>>, ApiError> {
    let body: MatchBody = parse_body(&body)?;
    let max_limit = app_state.matching().config().max_limit;

    let mut validator = Validator::new();
    let limit = validator.limit(body.limit, MATCH_DEFAULT_LIMIT, max_limit);
    let min_similarity =
        validator.min_similarity(body.min_similarity, MATCH_DEFAULT_MIN_SIMILARITY);
    let filters = validator.filters(body.filters);
    validator.finish()?;

    let id = parse_id(&id, "Talent profile")?;
    let talent = app_state
        .matching()
        .talent(id)
        .await
        .map_err(|e| app_state.api_error(e))?;

    if !user.can_act_for(talent.user_id) {
        return Err(ApiError::forbidden("Unauthorized to view these matches"));
    }

    let request = match_request(&app_state, EntityKind::Project, limit, min_similarity, &filters)?;
    let matches = app_state
        .matching()
        .match_projects_to_talent(&talent, request)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(matches))
}

#[instrument(name = "GET /talents/:id/recommendations", skip(app_state))]
async fn recommendations(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<Recommendations>>, ApiError> {
    let params = list_params(params)?;
    let max_limit = app_state.matching().config().max_similar_limit;

    let mut validator = Validator::new();
    let limit = validator.limit(params.limit, RECOMMENDATION_DEFAULT_LIMIT, max_limit);
    validator.finish()?;

    let id = parse_id(&id, "Talent profile")?;
    let talent = app_state
        .matching()
        .talent(id)
        .await
        .map_err(|e| app_state.api_error(e))?;

    if !user.can_act_for(talent.user_id) {
        return Err(ApiError::forbidden(
            "Unauthorized to view these recommendations",
        ));
    }

    let recommendations = app_state
        .matching()
        .recommendations(&talent, limit)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(recommendations))
}

#[instrument(name = "GET /portfolios/:id/similar", skip(app_state))]
async fn similar_portfolios(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<SimilarPortfolios>>, ApiError> {
    let params = list_params(params)?;
    let max_limit = app_state.matching().config().max_similar_limit;

    let mut validator = Validator::new();
    let limit = validator.limit(params.limit, PORTFOLIO_DEFAULT_LIMIT, max_limit);
    let min_similarity =
        validator.min_similarity(params.min_similarity, PORTFOLIO_DEFAULT_MIN_SIMILARITY);
    validator.finish()?;

    let id = parse_id(&id, "Portfolio")?;
    let source = app_state
        .matching()
        .portfolio(id)
        .await
        .map_err(|e| app_state.api_error(e))?;

    let request = match_request(
        &app_state,
        EntityKind::Portfolio,
        limit,
        min_similarity,
        &Map::new(),
    )?;
    let similar = app_state
        .matching()
        .find_similar_portfolios(&source, request)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(similar))
}

#[instrument(name = "GET /skills/:id/related", skip(app_state))]
async fn related_skills(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ApiResponse<RelatedSkills>>, ApiError> {
    let params = list_params(params)?;
    let max_limit = app_state.matching().config().max_similar_limit;

    let mut validator = Validator::new();
    let limit = validator.limit(params.limit, SKILL_DEFAULT_LIMIT, max_limit);
    let min_similarity =
        validator.min_similarity(params.min_similarity, SKILL_DEFAULT_MIN_SIMILARITY);
    validator.finish()?;

    let id = parse_id(&id, "Skill")?;
    let source = app_state
        .matching()
        .skill(id)
        .await
        .map_err(|e| app_state.api_error(e))?;

    let request = match_request(&app_state, EntityKind::Skill, limit, min_similarity, &Map::new())?;
    let related = app_state
        .matching()
        .find_related_skills(&source, request)
        .await
        .map_err(|e| app_state.api_error(e))?;

    Ok(ApiResponse::ok(related))
}
