use axum::{extract::State, Json};
use serde::Serialize;

use super::guards::Authorized;
use crate::{
    error::Result,
    services::{GeneratedCounts, SeedCounts, SeedPlan, Seeder},
    state::AppState,
};

#[derive(Serialize)]
pub struct SeedResponse {
    pub ok: bool,
    pub message: String,
    pub counts: GeneratedCounts,
}

pub async fn seed(
    State(state): State<AppState>,
    Authorized(params): Authorized,
) -> Result<Json<SeedResponse>> {
    let counts = SeedCounts::resolve(|name| params.get(name));
    let plan = SeedPlan::generate(counts, &mut rand::thread_rng());

    let report = Seeder::new(state.store.clone()).run(plan).await?;

    Ok(Json(SeedResponse {
        ok: true,
        message: report.message(),
        counts: report.counts,
    }))
}
