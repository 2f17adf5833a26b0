use axum::{extract::State, Json};
use serde::Serialize;

use super::guards::{Authorized, RequestParams};
use crate::{
    db::Fields,
    error::{AppError, Result},
    services::{UserPatch, UserPatcher},
    state::AppState,
};

#[derive(Serialize)]
pub struct UpdateUserResponse {
    pub ok: bool,
    pub user: Fields,
}

impl TryFrom<&RequestParams> for UserPatch {
    type Error = AppError;

    fn try_from(params: &RequestParams) -> Result<Self> {
        UserPatch::new(params.body_or_query("id"), params.body_or_query("updates"))
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    Authorized(params): Authorized,
) -> Result<Json<UpdateUserResponse>> {
    let patch = UserPatch::try_from(&params)?;

    let user = UserPatcher::new(state.store.clone()).apply(&patch).await?;

    Ok(Json(UpdateUserResponse { ok: true, user }))
}
