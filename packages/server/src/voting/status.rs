use std::time::Duration;

use ballot_common::ElectionStatus;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use tracing::{error, info};

use crate::entity::election;

/// Run the election status sweeper as a background task.
pub async fn run_status_sweeper(db: DatabaseConnection, interval_secs: u64) {
    info!(interval_secs, "Starting election status sweeper");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_statuses(&db, Utc::now()).await {
            Ok(0) => {}
            Ok(updated) => info!(updated, "Election statuses refreshed"),
            Err(e) => error!(error = %e, "Election status sweep failed"),
        }
    }
}

/// Rewrite the stored status of every election whose window says otherwise.
/// Returns the number of rows changed.
pub async fn sweep_statuses<C: ConnectionTrait>(
    db: &C,
    now: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let completed = election::Entity::update_many()
        .col_expr(
            election::Column::Status,
            Expr::value(ElectionStatus::Completed.as_str()),
        )
        .filter(election::Column::EndDate.lt(now))
        .filter(election::Column::Status.ne(ElectionStatus::Completed))
        .exec(db)
        .await?;

    let active = election::Entity::update_many()
        .col_expr(
            election::Column::Status,
            Expr::value(ElectionStatus::Active.as_str()),
        )
        .filter(election::Column::StartDate.lte(now))
        .filter(election::Column::EndDate.gte(now))
        .filter(election::Column::Status.ne(ElectionStatus::Active))
        .exec(db)
        .await?;

    let upcoming = election::Entity::update_many()
        .col_expr(
            election::Column::Status,
            Expr::value(ElectionStatus::Upcoming.as_str()),
        )
        .filter(election::Column::StartDate.gt(now))
        .filter(election::Column::Status.ne(ElectionStatus::Upcoming))
        .exec(db)
        .await?;

    Ok(completed.rows_affected + active.rows_affected + upcoming.rows_affected)
}
