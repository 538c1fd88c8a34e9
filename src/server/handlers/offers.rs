use axum::extract::{Extension, Json, Path};

use crate::engine::Snapshot;
use crate::entities::{OfferId, OfferKind};
use crate::error::Error;
use crate::server::SharedEngine;

pub async fn accept(
    Extension(engine): Extension<SharedEngine>,
    Path((kind, id)): Path<(OfferKind, OfferId)>,
) -> Result<Json<Snapshot>, Error> {
    engine.accept_offer(kind, id).await?;

    Ok(engine.snapshot().into())
}

pub async fn reject(
    Extension(engine): Extension<SharedEngine>,
    Path((kind, id)): Path<(OfferKind, OfferId)>,
) -> Result<Json<Snapshot>, Error> {
    engine.reject_offer(kind, id).await?;

    Ok(engine.snapshot().into())
}
