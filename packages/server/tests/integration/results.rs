use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, QueryFilter};

use ballot_common::ElectionStatus;
use ballot_server::entity::election;
use ballot_server::voting::status::sweep_statuses;

use crate::common::{TestApp, Window, candidate_ids, routes, uuid_of};

mod tally {
    use super::*;

    #[tokio::test]
    async fn results_rank_candidates_and_report_turnout() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Active, &["Alice", "Bob", "Carol"])
            .await;
        let id = uuid_of(&election["id"]);
        let ids = candidate_ids(&election);

        for (n, candidate) in [ids[1], ids[1], ids[0]].into_iter().enumerate() {
            let voter = app.create_voter(&format!("voter{n}@example.edu")).await;
            let res = app.cast_vote(&voter.token, id, candidate).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app.get_with_token(&routes::results(id), &admin.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_votes"], 3);
        // Three voters and the admin are registered.
        assert_eq!(res.body["eligible_voters"], 4);
        assert_eq!(res.body["turnout_percentage"], 75);
        assert_eq!(res.body["winner"], ids[1].to_string());
        assert_eq!(res.body["winner_name"], "Bob");
        assert_eq!(res.body["is_tie"], false);

        let rows = res.body["candidates"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["candidate_name"], "Bob");
        assert_eq!(rows[0]["vote_count"], 2);
        assert_eq!(rows[1]["candidate_name"], "Alice");
        assert_eq!(rows[2]["candidate_name"], "Carol");
        assert_eq!(rows[2]["vote_count"], 0);
        assert_eq!(rows[2]["percentage"], 0.0);
    }

    #[tokio::test]
    async fn equal_leaders_are_reported_as_a_tie() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Active, &["Alice", "Bob"])
            .await;
        let id = uuid_of(&election["id"]);
        let ids = candidate_ids(&election);

        let first = app.create_voter("first@example.edu").await;
        let second = app.create_voter("second@example.edu").await;
        app.cast_vote(&first.token, id, ids[1]).await;
        app.cast_vote(&second.token, id, ids[0]).await;

        let res = app.get_with_token(&routes::results(id), &admin.token).await;

        assert_eq!(res.body["is_tie"], true);
        // Ties fall back to candidate order.
        assert_eq!(res.body["candidates"][0]["candidate_id"], ids[0].to_string());
        assert_eq!(res.body["candidates"][0]["percentage"], 50.0);
    }

    #[tokio::test]
    async fn election_without_ballots_has_no_winner() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Completed, &["Alice"])
            .await;

        let res = app
            .get_with_token(&routes::results(uuid_of(&election["id"])), &admin.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total_votes"], 0);
        assert!(res.body["winner"].is_null());
        assert_eq!(res.body["candidates"][0]["vote_count"], 0);
    }
}

mod visibility {
    use super::*;

    #[tokio::test]
    async fn voters_see_results_only_after_the_election_closes() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let id = uuid_of(&election["id"]);

        app.cast_vote(&voter.token, id, candidate_ids(&election)[0])
            .await;

        let res = app.get_with_token(&routes::results(id), &voter.token).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "RESULTS_NOT_AVAILABLE");

        app.close_election(&admin.token, id).await;

        let res = app.get_with_token(&routes::results(id), &voter.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "completed");
        assert_eq!(res.body["total_votes"], 1);
    }

    #[tokio::test]
    async fn results_of_an_unknown_election_are_not_found() {
        let app = TestApp::spawn().await;
        let voter = app.create_voter("voter@example.edu").await;

        let res = app
            .get_with_token(&routes::results(uuid::Uuid::now_v7()), &voter.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod status_sweep {
    use super::*;

    #[tokio::test]
    async fn sweep_rewrites_stale_stored_statuses() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &[]).await;
        let id = uuid_of(&election["id"]);

        let past = Utc::now() - Duration::hours(1);
        election::Entity::update_many()
            .col_expr(election::Column::EndDate, Expr::value(past))
            .filter(election::Column::Id.eq(id))
            .exec(&app.db)
            .await
            .unwrap();

        let updated = sweep_statuses(&app.db, Utc::now()).await.unwrap();
        assert_eq!(updated, 1);

        let stored = election::Entity::find_by_id(id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ElectionStatus::Completed);

        let updated = sweep_statuses(&app.db, Utc::now()).await.unwrap();
        assert_eq!(updated, 0);
    }
}
