use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::engine::Snapshot;
use crate::error::Error;
use crate::server::SharedEngine;

#[derive(Serialize, Deserialize)]
pub struct BlockedParams {
    blocked: bool,
}

pub async fn find(Extension(engine): Extension<SharedEngine>) -> Json<Snapshot> {
    engine.snapshot().into()
}

pub async fn toggle_online(
    Extension(engine): Extension<SharedEngine>,
) -> Result<Json<Snapshot>, Error> {
    engine.toggle_online().await?;

    Ok(engine.snapshot().into())
}

pub async fn set_blocked(
    Extension(engine): Extension<SharedEngine>,
    Json(params): Json<BlockedParams>,
) -> Json<Snapshot> {
    engine.set_blocked(params.blocked);

    engine.snapshot().into()
}

pub async fn reconcile(Extension(engine): Extension<SharedEngine>) -> Json<Snapshot> {
    engine.reconcile().await;

    engine.snapshot().into()
}

pub async fn reconnect(
    Extension(engine): Extension<SharedEngine>,
) -> Result<Json<Snapshot>, Error> {
    engine.reconnect().await?;

    Ok(engine.snapshot().into())
}
