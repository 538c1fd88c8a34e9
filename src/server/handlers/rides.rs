use axum::extract::{Extension, Json, Path};

use crate::entities::{Ride, RideId};
use crate::error::Error;
use crate::server::SharedEngine;

pub async fn start(
    Extension(engine): Extension<SharedEngine>,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = engine.start_ride(id).await?;

    Ok(ride.into())
}

pub async fn complete(
    Extension(engine): Extension<SharedEngine>,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = engine.complete_ride(id).await?;

    Ok(ride.into())
}

pub async fn cancel(
    Extension(engine): Extension<SharedEngine>,
    Path(id): Path<RideId>,
) -> Result<Json<Ride>, Error> {
    let ride = engine.cancel_ride(id).await?;

    Ok(ride.into())
}
