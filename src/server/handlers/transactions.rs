use axum::extract::{Extension, Json};

use crate::entities::Transaction;
use crate::error::Error;
use crate::server::SharedEngine;

pub async fn list(
    Extension(engine): Extension<SharedEngine>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let transactions = engine.transactions().await?;

    Ok(transactions.into())
}
