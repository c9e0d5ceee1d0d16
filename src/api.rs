use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;

use crate::analytics::{DailyTally, Summary, MAX_REPORT_DAYS};
use crate::board::{FoodBoard, NewNotification};
use crate::clock::Clock;
use crate::error::{BoardError, CommunityError, LifecycleError, StoreError};
use crate::feedback::{DishRating, Feedback, NewFeedback};
use crate::freshness::{evaluate_freshness, expires_at, Freshness};
use crate::geo::Coordinate;
use crate::lifecycle::{self, LifecycleState};
use crate::location::Location;
use crate::notification::{FoodNotification, NotificationId};
use crate::poll::{NewPoll, Poll};
use crate::ranking::RankedLocation;
use crate::report::{LeftoverReport, NewReport};

pub const DEFAULT_REPORT_DAYS: u32 = 7;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<FoodBoard>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(board: Arc<FoodBoard>, clock: Arc<dyn Clock>) -> Self {
        Self { board, clock }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/notifications", get(list_active).post(post_notification))
        .route("/notifications/{id}", get(get_notification))
        .route("/notifications/{id}/claim", post(claim_notification))
        .route("/locations", get(list_locations))
        .route("/locations/ranked", get(ranked_locations))
        .route("/stats/claimed", get(stats_claimed))
        .route("/stats/daily", get(stats_daily))
        .route("/stats/summary", get(stats_summary))
        .route("/feedback", get(list_feedback).post(post_feedback))
        .route("/feedback/ratings", get(dish_ratings))
        .route("/reports", get(list_reports).post(post_report))
        .route("/polls", get(list_polls).post(post_poll))
        .route("/polls/{id}/vote", post(vote_poll))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("invalid query: {0}")]
    Query(#[from] QueryRejection),

    #[error("invalid body: {0}")]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Board(BoardError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Board(BoardError::UnknownLocation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Board(BoardError::Lifecycle(LifecycleError::Validation(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Board(BoardError::Lifecycle(LifecycleError::AlreadyClaimed(_))) => StatusCode::CONFLICT,
            ApiError::Board(BoardError::Lifecycle(LifecycleError::Expired(_))) => StatusCode::GONE,
            ApiError::Board(BoardError::Store(StoreError::Duplicate(_))) => StatusCode::CONFLICT,
            ApiError::Board(BoardError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Board(BoardError::Community(e)) => match e {
                CommunityError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CommunityError::PollNotFound(_) | CommunityError::UnknownOption { .. } => StatusCode::NOT_FOUND,
                CommunityError::PollClosed(_) => StatusCode::GONE,
                CommunityError::AlreadyVoted { .. } => StatusCode::CONFLICT,
            },
        };
        if status.is_server_error() {
            tracing::error!(target: "api", "request failed: {self}");
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// A notification as the display layer sees it at one instant.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: FoodNotification,
    pub freshness: Freshness,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub lifecycle: LifecycleState,
}

impl NotificationView {
    fn at(notification: FoodNotification, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            freshness: evaluate_freshness(&notification, now),
            expires_at: expires_at(notification.created_at()),
            lifecycle: lifecycle::state(&notification, now),
            notification,
        }
    }
}

async fn post_notification(
    State(state): State<AppState>,
    body: Result<Json<NewNotification>, JsonRejection>,
) -> Result<(StatusCode, Json<NotificationView>), ApiError> {
    let Json(body) = body?;
    let now = state.clock.now();
    let n = state.board.post(body, now).await?;
    Ok((StatusCode::CREATED, Json(NotificationView::at(n, now))))
}

async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let now = state.clock.now();
    let out = state
        .board
        .active(now)
        .await?
        .into_iter()
        .map(|n| NotificationView::at(n, now))
        .collect();
    Ok(Json(out))
}

async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationView>, ApiError> {
    let now = state.clock.now();
    let n = state.board.get(&NotificationId::from(id)).await?;
    Ok(Json(NotificationView::at(n, now)))
}

async fn claim_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationView>, ApiError> {
    let now = state.clock.now();
    let n = state.board.claim(&NotificationId::from(id), now).await?;
    Ok(Json(NotificationView::at(n, now)))
}

async fn list_locations(State(state): State<AppState>) -> Json<Vec<Location>> {
    Json(state.board.directory().all().to_vec())
}

#[derive(Debug, Deserialize)]
struct RankQuery {
    lat: Option<f64>,
    lon: Option<f64>,
}

async fn ranked_locations(
    State(state): State<AppState>,
    q: Result<Query<RankQuery>, QueryRejection>,
) -> Result<Json<Vec<RankedLocation>>, ApiError> {
    let Query(q) = q?;
    let user = match (q.lat, q.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some(Coordinate::new(lat, lon)),
        (None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "lat and lon must be given together as finite numbers".to_string(),
            ))
        }
    };
    let now = state.clock.now();
    Ok(Json(state.board.ranked(user, now).await?))
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    day: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ClaimedOut {
    day: NaiveDate,
    claimed: usize,
}

async fn stats_claimed(
    State(state): State<AppState>,
    q: Result<Query<DayQuery>, QueryRejection>,
) -> Result<Json<ClaimedOut>, ApiError> {
    let Query(q) = q?;
    let day = q.day.unwrap_or_else(|| state.clock.now().date_naive());
    let claimed = state.board.claimed_on(day).await?;
    Ok(Json(ClaimedOut { day, claimed }))
}

#[derive(Debug, Deserialize)]
struct DaysQuery {
    days: Option<u32>,
}

async fn stats_daily(
    State(state): State<AppState>,
    q: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<Vec<DailyTally>>, ApiError> {
    let Query(q) = q?;
    let days = q.days.unwrap_or(DEFAULT_REPORT_DAYS).clamp(1, MAX_REPORT_DAYS);
    let now = state.clock.now();
    Ok(Json(state.board.daily_report(now, days).await?))
}

async fn stats_summary(State(state): State<AppState>) -> Result<Json<Summary>, ApiError> {
    let now = state.clock.now();
    Ok(Json(state.board.summary(now).await?))
}

async fn post_feedback(
    State(state): State<AppState>,
    body: Result<Json<NewFeedback>, JsonRejection>,
) -> Result<(StatusCode, Json<Feedback>), ApiError> {
    let Json(body) = body?;
    let f = state.board.rate_dish(body, state.clock.now())?;
    Ok((StatusCode::CREATED, Json(f)))
}

async fn list_feedback(State(state): State<AppState>) -> Json<Vec<Feedback>> {
    Json(state.board.feedback())
}

async fn dish_ratings(State(state): State<AppState>) -> Json<Vec<DishRating>> {
    Json(state.board.dish_ratings())
}

async fn post_report(
    State(state): State<AppState>,
    body: Result<Json<NewReport>, JsonRejection>,
) -> Result<(StatusCode, Json<LeftoverReport>), ApiError> {
    let Json(body) = body?;
    let r = state.board.report_leftovers(body, state.clock.now())?;
    Ok((StatusCode::CREATED, Json(r)))
}

async fn list_reports(State(state): State<AppState>) -> Json<Vec<LeftoverReport>> {
    Json(state.board.reports())
}

/// A poll with its open/closed state at request time.
#[derive(Debug, Serialize)]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    pub is_open: bool,
    pub shares_pct: Vec<f64>,
}

impl PollView {
    fn at(poll: Poll, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            is_open: poll.is_open(now),
            shares_pct: poll.shares_pct(),
            poll,
        }
    }
}

async fn post_poll(
    State(state): State<AppState>,
    body: Result<Json<NewPoll>, JsonRejection>,
) -> Result<(StatusCode, Json<PollView>), ApiError> {
    let Json(body) = body?;
    let now = state.clock.now();
    let p = state.board.open_poll(body, now)?;
    Ok((StatusCode::CREATED, Json(PollView::at(p, now))))
}

async fn list_polls(State(state): State<AppState>) -> Json<Vec<PollView>> {
    let now = state.clock.now();
    Json(state.board.polls().into_iter().map(|p| PollView::at(p, now)).collect())
}

#[derive(Debug, Deserialize)]
struct VoteBody {
    voter: String,
    option_id: String,
}

async fn vote_poll(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> Result<Json<PollView>, ApiError> {
    let Json(body) = body?;
    let now = state.clock.now();
    let p = state.board.vote(&id, &body.voter, &body.option_id, now)?;
    Ok(Json(PollView::at(p, now)))
}
