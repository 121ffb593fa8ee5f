use chrono::Utc;
use sea_orm::sea_query::{Expr, Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;
use uuid::Uuid;

use crate::config::BootstrapAdminConfig;
use crate::entity::{profile, vote};
use crate::models::auth::normalize_email;
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Tally query:
    // SELECT candidate_id, COUNT(id) FROM votes WHERE election_id = ? GROUP BY candidate_id
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_votes_election_candidate")
        .table(vote::Entity)
        .col(vote::Column::ElectionId)
        .col(vote::Column::CandidateId)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_votes_election_candidate exists");

    // Dashboard lookups of a voter's ballots across elections.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_votes_voter")
        .table(vote::Entity)
        .col(vote::Column::VoterId)
        .to_string(PostgresQueryBuilder);
    db.execute_unprepared(&stmt).await?;
    info!("Ensured index idx_votes_voter exists");

    Ok(())
}

/// Create the configured administrator when absent, or restore its admin flag.
pub async fn seed_admin(db: &DatabaseConnection, admin: &BootstrapAdminConfig) -> anyhow::Result<()> {
    let email = normalize_email(&admin.email);
    let password = hash::hash_password_blocking(admin.password.clone())
        .await
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;

    let now = Utc::now();
    let model = profile::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email.clone()),
        password: Set(password),
        first_name: Set(admin.first_name.clone()),
        last_name: Set(admin.last_name.clone()),
        student_id: Set(None),
        is_admin: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let result = profile::Entity::insert(model)
        .on_conflict(
            OnConflict::column(profile::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {}
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    let promoted = profile::Entity::update_many()
        .col_expr(profile::Column::IsAdmin, Expr::value(true))
        .filter(profile::Column::Email.eq(&email))
        .filter(profile::Column::IsAdmin.eq(false))
        .exec(db)
        .await?;

    if promoted.rows_affected > 0 {
        info!(email = %email, "Restored administrator flag");
    }
    info!(email = %email, "Ensured administrator account exists");

    Ok(())
}
