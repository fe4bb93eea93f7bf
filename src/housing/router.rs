//! HTTP endpoints for the housing entities: CRUD per entity, the two ranking
//! endpoints, and the reservation status filter.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AccommodationDraft, AccommodationId, MemberDraft, MemberId, RatingChange, RatingDraft,
    RatingId, ReservationChange, ReservationDraft, ReservationId, ReservationStatus,
};
use super::eligibility::RatingViolation;
use super::repository::{HousingRepository, NotificationPublisher, RepositoryError};
use super::service::{
    AccommodationService, AccommodationServiceError, MemberService, RatingService,
    RatingServiceError, ReservationService, ReservationServiceError,
};
use super::validate::ReservationViolation;
use crate::geo::AddressResolver;

#[derive(Debug, Deserialize)]
struct RankQuery {
    #[serde(default)]
    reverse: bool,
}

#[derive(Debug, Deserialize)]
struct ReservationListQuery {
    status: Option<String>,
}

fn error_body(message: impl ToString) -> Json<serde_json::Value> {
    Json(json!({ "error": message.to_string() }))
}

fn repository_error_response(error: RepositoryError) -> Response {
    let status = match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error_body(error)).into_response()
}

fn accommodation_error_response(error: AccommodationServiceError) -> Response {
    match error {
        AccommodationServiceError::Geocode(err) => {
            (StatusCode::BAD_GATEWAY, error_body(err)).into_response()
        }
        AccommodationServiceError::Repository(err) => repository_error_response(err),
        AccommodationServiceError::UnknownReferencePoint { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, error_body(error)).into_response()
        }
    }
}

fn reservation_error_response(error: ReservationServiceError) -> Response {
    match error {
        ReservationServiceError::Violation(ReservationViolation::OverlapConflict {
            ..
        }) => (StatusCode::CONFLICT, error_body(error)).into_response(),
        ReservationServiceError::Violation(_)
        | ReservationServiceError::UnknownAccommodation(_)
        | ReservationServiceError::UnknownMember(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error_body(error)).into_response()
        }
        ReservationServiceError::Repository(err) => repository_error_response(err),
    }
}

fn rating_error_response(error: RatingServiceError) -> Response {
    match error {
        RatingServiceError::Violation(RatingViolation::DuplicateRating) => {
            (StatusCode::CONFLICT, error_body(error)).into_response()
        }
        RatingServiceError::Violation(_)
        | RatingServiceError::UnknownAccommodation(_)
        | RatingServiceError::UnknownMember(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error_body(error)).into_response()
        }
        RatingServiceError::Repository(err) => repository_error_response(err),
    }
}

/// Router builder for accommodation CRUD and distance ranking.
pub fn accommodation_router<S, G>(service: Arc<AccommodationService<S, G>>) -> Router
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    Router::new()
        .route(
            "/api/v1/accommodations",
            get(list_accommodations::<S, G>).post(create_accommodation::<S, G>),
        )
        .route(
            "/api/v1/accommodations/ranked/:campus",
            get(rank_accommodations::<S, G>),
        )
        .route(
            "/api/v1/accommodations/:id",
            get(get_accommodation::<S, G>)
                .put(update_accommodation::<S, G>)
                .delete(delete_accommodation::<S, G>),
        )
        .with_state(service)
}

async fn create_accommodation<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
    Json(draft): Json<AccommodationDraft>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    match service.create(draft).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

async fn list_accommodations<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

async fn get_accommodation<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    match service.get(&AccommodationId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

async fn update_accommodation<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
    Path(id): Path<u64>,
    Json(draft): Json<AccommodationDraft>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    match service.update(&AccommodationId(id), draft).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

async fn delete_accommodation<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    match service.delete(&AccommodationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

async fn rank_accommodations<S, G>(
    State(service): State<Arc<AccommodationService<S, G>>>,
    Path(campus): Path<String>,
    Query(query): Query<RankQuery>,
) -> Response
where
    S: HousingRepository + 'static,
    G: AddressResolver + 'static,
{
    // Closest-first unless the caller reverses.
    match service.rank_by_distance(&campus, query.reverse) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => accommodation_error_response(err),
    }
}

/// Router builder for member CRUD.
pub fn member_router<S>(service: Arc<MemberService<S>>) -> Router
where
    S: HousingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/members",
            get(list_members::<S>).post(create_member::<S>),
        )
        .route(
            "/api/v1/members/:id",
            get(get_member::<S>)
                .put(update_member::<S>)
                .delete(delete_member::<S>),
        )
        .with_state(service)
}

async fn create_member<S>(
    State(service): State<Arc<MemberService<S>>>,
    Json(draft): Json<MemberDraft>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.create(draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => repository_error_response(err),
    }
}

async fn list_members<S>(State(service): State<Arc<MemberService<S>>>) -> Response
where
    S: HousingRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => repository_error_response(err),
    }
}

async fn get_member<S>(
    State(service): State<Arc<MemberService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.get(&MemberId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => repository_error_response(err),
    }
}

async fn update_member<S>(
    State(service): State<Arc<MemberService<S>>>,
    Path(id): Path<u64>,
    Json(draft): Json<MemberDraft>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.update(&MemberId(id), draft) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => repository_error_response(err),
    }
}

async fn delete_member<S>(
    State(service): State<Arc<MemberService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.delete(&MemberId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => repository_error_response(err),
    }
}

/// Router builder for reservation CRUD and the signed/unsigned filter.
pub fn reservation_router<S, N>(service: Arc<ReservationService<S, N>>) -> Router
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/reservations",
            get(list_reservations::<S, N>).post(create_reservation::<S, N>),
        )
        .route(
            "/api/v1/reservations/:id",
            get(get_reservation::<S, N>)
                .put(update_reservation::<S, N>)
                .delete(delete_reservation::<S, N>),
        )
        .with_state(service)
}

async fn create_reservation<S, N>(
    State(service): State<Arc<ReservationService<S, N>>>,
    Json(draft): Json<ReservationDraft>,
) -> Response
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.create(draft) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => reservation_error_response(err),
    }
}

async fn list_reservations<S, N>(
    State(service): State<Arc<ReservationService<S, N>>>,
    Query(query): Query<ReservationListQuery>,
) -> Response
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let result = match query.status.as_deref() {
        Some(raw) => match ReservationStatus::from_label(raw) {
            Some(status) => service.list_by_status(status),
            None => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    error_body(format!("unknown reservation status '{raw}'")),
                )
                    .into_response()
            }
        },
        None => service.list(),
    };

    match result {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => reservation_error_response(err),
    }
}

async fn get_reservation<S, N>(
    State(service): State<Arc<ReservationService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&ReservationId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => reservation_error_response(err),
    }
}

async fn update_reservation<S, N>(
    State(service): State<Arc<ReservationService<S, N>>>,
    Path(id): Path<u64>,
    Json(change): Json<ReservationChange>,
) -> Response
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.update(&ReservationId(id), change) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => reservation_error_response(err),
    }
}

async fn delete_reservation<S, N>(
    State(service): State<Arc<ReservationService<S, N>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.delete(&ReservationId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => reservation_error_response(err),
    }
}

/// Router builder for rating CRUD and rating ranking.
pub fn rating_router<S>(service: Arc<RatingService<S>>) -> Router
where
    S: HousingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/ratings",
            get(list_ratings::<S>).post(create_rating::<S>),
        )
        .route("/api/v1/ratings/ranked", get(rank_ratings::<S>))
        .route(
            "/api/v1/ratings/:id",
            get(get_rating::<S>)
                .put(update_rating::<S>)
                .delete(delete_rating::<S>),
        )
        .with_state(service)
}

async fn create_rating<S>(
    State(service): State<Arc<RatingService<S>>>,
    Json(draft): Json<RatingDraft>,
) -> Response
where
    S: HousingRepository + 'static,
{
    let today = Local::now().date_naive();
    match service.create(draft, today) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(err) => rating_error_response(err),
    }
}

async fn list_ratings<S>(State(service): State<Arc<RatingService<S>>>) -> Response
where
    S: HousingRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => rating_error_response(err),
    }
}

async fn rank_ratings<S>(
    State(service): State<Arc<RatingService<S>>>,
    Query(query): Query<RankQuery>,
) -> Response
where
    S: HousingRepository + 'static,
{
    // Highest-rated first unless the caller reverses.
    match service.rank_by_rating(!query.reverse) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => rating_error_response(err),
    }
}

async fn get_rating<S>(
    State(service): State<Arc<RatingService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.get(&RatingId(id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => rating_error_response(err),
    }
}

async fn update_rating<S>(
    State(service): State<Arc<RatingService<S>>>,
    Path(id): Path<u64>,
    Json(change): Json<RatingChange>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.update(&RatingId(id), change) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => rating_error_response(err),
    }
}

async fn delete_rating<S>(
    State(service): State<Arc<RatingService<S>>>,
    Path(id): Path<u64>,
) -> Response
where
    S: HousingRepository + 'static,
{
    match service.delete(&RatingId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => rating_error_response(err),
    }
}
