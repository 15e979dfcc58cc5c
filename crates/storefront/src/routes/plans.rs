//! Plan catalog route handlers.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use yupay_core::{PlanLimits, PlanTier};

use crate::state::AppState;

/// One tier as listed on the pricing page.
#[derive(Serialize)]
struct PlanView<'a> {
    tier: PlanTier,
    #[serde(flatten)]
    limits: &'a PlanLimits,
}

/// List every plan tier, cheapest first.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Response {
    let plans: Vec<PlanView<'_>> = state
        .catalog()
        .iter()
        .map(|(tier, limits)| PlanView { tier, limits })
        .collect();

    Json(plans).into_response()
}
