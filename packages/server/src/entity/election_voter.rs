use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enrollment of a profile on an election's voter list.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "election_voters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub election_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub voter_id: Uuid,
    #[sea_orm(belongs_to, from = "election_id", to = "id")]
    pub election: HasOne<super::election::Entity>,
    #[sea_orm(belongs_to, from = "voter_id", to = "id")]
    pub voter: HasOne<super::profile::Entity>,

    pub enrolled_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
