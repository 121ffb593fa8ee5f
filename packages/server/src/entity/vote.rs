use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One cast ballot. Rows are only ever inserted by the ballot service.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// At most one vote per (election, voter).
    #[sea_orm(unique_key = "election_voter")]
    pub election_id: Uuid,
    #[sea_orm(unique_key = "election_voter")]
    pub voter_id: Uuid,

    pub candidate_id: Uuid,

    #[sea_orm(belongs_to, from = "election_id", to = "id")]
    pub election: HasOne<super::election::Entity>,
    #[sea_orm(belongs_to, from = "candidate_id", to = "id")]
    pub candidate: HasOne<super::candidate::Entity>,
    #[sea_orm(belongs_to, from = "voter_id", to = "id")]
    pub voter: HasOne<super::profile::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
