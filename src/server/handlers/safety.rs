use axum::extract::{Extension, Json};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::dispatch::AlertLevel;
use crate::error::Error;
use crate::server::SharedEngine;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    message: String,
    level: Option<AlertLevel>,
}

pub async fn create(
    Extension(engine): Extension<SharedEngine>,
    Json(params): Json<CreateParams>,
) -> Result<StatusCode, Error> {
    let level = params.level.unwrap_or(AlertLevel::Critical);

    engine.send_safety_alert(params.message, level).await?;

    Ok(StatusCode::ACCEPTED)
}
