use ballot_common::ElectionStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "elections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    #[sea_orm(indexed)]
    pub start_date: DateTimeUtc,
    #[sea_orm(indexed)]
    pub end_date: DateTimeUtc,

    /// Last status written by the sweeper or an admin write. Responses derive
    /// the live status from the dates instead.
    pub status: ElectionStatus,

    pub created_by: Option<Uuid>,
    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub creator: BelongsTo<Option<super::profile::Entity>>,

    #[sea_orm(has_many)]
    pub candidates: HasMany<super::candidate::Entity>,

    #[sea_orm(has_many)]
    pub votes: HasMany<super::vote::Entity>,

    #[sea_orm(has_many)]
    pub enrollments: HasMany<super::election_voter::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Status derived from the voting window at `now`.
    pub fn status_at(&self, now: DateTimeUtc) -> ElectionStatus {
        ElectionStatus::at(now, self.start_date, self.end_date)
    }
}
