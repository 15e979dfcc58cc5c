//! Owner dashboard route handlers: subscription, quota, entitlements and sales.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use yupay_core::{Action, Decision, PlanTier, QuotaSummary, Subscription, UserId};

use crate::error::{AppError, Result};
use crate::services::{SaleRecorded, SubscriptionService};
use crate::state::AppState;

type OwnerPath = std::result::Result<Path<UserId>, PathRejection>;

fn owner_id(path: OwnerPath) -> Result<UserId> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Body of `POST /api/owners/{owner_id}/subscription`.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan: PlanTier,
}

/// Body of `POST /api/owners/{owner_id}/entitlements`.
#[derive(Debug, Deserialize)]
pub struct EntitlementRequest {
    pub action: Action,
}

/// Open a subscription for an owner.
#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    owner: OwnerPath,
    body: std::result::Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Subscription>)> {
    let owner_id = owner_id(owner)?;
    let request = json_body(body)?;

    let subscription = SubscriptionService::new(state.pool(), state.catalog())
        .subscribe(owner_id, request.plan, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}

/// Remaining sales, products and stores for an owner.
#[instrument(skip(state))]
pub async fn quota(State(state): State<AppState>, owner: OwnerPath) -> Result<Json<QuotaSummary>> {
    let owner_id = owner_id(owner)?;

    let summary = SubscriptionService::new(state.pool(), state.catalog())
        .quota(owner_id, Utc::now())
        .await?;

    Ok(Json(summary))
}

/// Evaluate an action without recording it.
///
/// Always `200` with the decision, allowed or not.
#[instrument(skip(state))]
pub async fn entitlements(
    State(state): State<AppState>,
    owner: OwnerPath,
    body: std::result::Result<Json<EntitlementRequest>, JsonRejection>,
) -> Result<Json<Decision>> {
    let owner_id = owner_id(owner)?;
    let request = json_body(body)?;

    let decision = SubscriptionService::new(state.pool(), state.catalog())
        .check(owner_id, request.action, Utc::now())
        .await?;

    Ok(Json(decision))
}

/// Record a sale. Responds `402` with the decision when the plan is exhausted.
#[instrument(skip(state))]
pub async fn record_sale(
    State(state): State<AppState>,
    owner: OwnerPath,
) -> Result<Json<SaleRecorded>> {
    let owner_id = owner_id(owner)?;

    let recorded = SubscriptionService::new(state.pool(), state.catalog())
        .record_sale(owner_id, Utc::now())
        .await?;

    Ok(Json(recorded))
}
