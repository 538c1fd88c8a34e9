use axum::extract::{Extension, Json, Path};

use crate::entities::{Vacation, VacationId};
use crate::error::Error;
use crate::server::SharedEngine;

pub async fn start(
    Extension(engine): Extension<SharedEngine>,
    Path(id): Path<VacationId>,
) -> Result<Json<Vacation>, Error> {
    let vacation = engine.start_vacation(id).await?;

    Ok(vacation.into())
}

pub async fn complete(
    Extension(engine): Extension<SharedEngine>,
    Path(id): Path<VacationId>,
) -> Result<Json<Vacation>, Error> {
    let vacation = engine.complete_vacation(id).await?;

    Ok(vacation.into())
}
