use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use ballot_server::config::EligibilityMode;
use ballot_server::entity::vote;

use crate::common::{TestApp, Window, candidate_ids, routes, uuid_of};

async fn stored_votes(app: &TestApp, election_id: uuid::Uuid) -> u64 {
    vote::Entity::find()
        .filter(vote::Column::ElectionId.eq(election_id))
        .count(&app.db)
        .await
        .unwrap()
}

mod casting {
    use super::*;

    #[tokio::test]
    async fn voter_casts_one_ballot_and_gets_a_receipt() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Active, &["Alice", "Bob"])
            .await;
        let id = uuid_of(&election["id"]);
        let candidates = candidate_ids(&election);

        let res = app.cast_vote(&voter.token, id, candidates[0]).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["election_id"], id.to_string());
        assert!(res.body.get("candidate_id").is_none());

        let res = app.cast_vote(&voter.token, id, candidates[1]).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "ALREADY_VOTED");
    }

    #[tokio::test]
    async fn ballots_outside_the_window_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;

        for window in [Window::Upcoming, Window::Completed] {
            let election = app.create_election(&admin.token, window, &["A"]).await;
            let id = uuid_of(&election["id"]);
            let res = app
                .cast_vote(&voter.token, id, candidate_ids(&election)[0])
                .await;

            assert_eq!(res.status, 409);
            assert_eq!(res.body["code"], "ELECTION_NOT_ACTIVE");
            assert_eq!(stored_votes(&app, id).await, 0);
        }
    }

    #[tokio::test]
    async fn candidate_from_another_election_is_invalid() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let first = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let second = app.create_election(&admin.token, Window::Active, &["B"]).await;

        let res = app
            .cast_vote(
                &voter.token,
                uuid_of(&first["id"]),
                candidate_ids(&second)[0],
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "INVALID_CANDIDATE");
        assert_eq!(stored_votes(&app, uuid_of(&first["id"])).await, 0);
        assert_eq!(stored_votes(&app, uuid_of(&second["id"])).await, 0);
    }

    #[tokio::test]
    async fn unknown_election_is_not_found() {
        let app = TestApp::spawn().await;
        let voter = app.create_voter("voter@example.edu").await;

        let res = app
            .cast_vote(&voter.token, uuid::Uuid::now_v7(), uuid::Uuid::now_v7())
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn concurrent_ballots_record_exactly_one_vote() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Active, &["Alice", "Bob"])
            .await;
        let id = uuid_of(&election["id"]);
        let candidates = candidate_ids(&election);

        let (first, second) = futures::join!(
            app.cast_vote(&voter.token, id, candidates[0]),
            app.cast_vote(&voter.token, id, candidates[1]),
        );

        let mut statuses = [first.status, second.status];
        statuses.sort();
        assert_eq!(statuses, [201, 409], "{} / {}", first.text, second.text);
        let rejected = if first.status == 409 { &first } else { &second };
        assert_eq!(rejected.body["code"], "ALREADY_VOTED");

        let stored = vote::Entity::find()
            .filter(vote::Column::ElectionId.eq(id))
            .filter(vote::Column::VoterId.eq(voter.profile_id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(stored, 1);
    }
}

mod checks {
    use super::*;

    #[tokio::test]
    async fn vote_status_tracks_the_callers_ballot() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let id = uuid_of(&election["id"]);

        let res = app.get_with_token(&routes::vote_status(id), &voter.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["is_active"], true);
        assert_eq!(res.body["is_eligible"], true);
        assert_eq!(res.body["has_voted"], false);

        app.cast_vote(&voter.token, id, candidate_ids(&election)[0])
            .await;

        let res = app.get_with_token(&routes::vote_status(id), &voter.token).await;
        assert_eq!(res.body["has_voted"], true);

        let res = app
            .get_with_token(&routes::has_voted(id, voter.profile_id), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["has_voted"], true);
    }

    #[tokio::test]
    async fn voter_cannot_ask_about_someone_elses_ballot() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &["A"]).await;

        let res = app
            .get_with_token(
                &routes::has_voted(uuid_of(&election["id"]), admin.profile_id),
                &voter.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn active_check_follows_the_window() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let active = app.create_election(&admin.token, Window::Active, &[]).await;
        let upcoming = app.create_election(&admin.token, Window::Upcoming, &[]).await;

        let res = app
            .get_with_token(&routes::active(uuid_of(&active["id"])), &admin.token)
            .await;
        assert_eq!(res.body["is_active"], true);

        let res = app
            .get_with_token(&routes::active(uuid_of(&upcoming["id"])), &admin.token)
            .await;
        assert_eq!(res.body["is_active"], false);

        let res = app
            .get_with_token(&routes::active(uuid::Uuid::now_v7()), &admin.token)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["is_active"], false);
    }
}

mod enrollment {
    use super::*;

    #[tokio::test]
    async fn only_enrolled_profiles_may_vote() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let enrolled = app.create_voter("enrolled@example.edu").await;
        let outsider = app.create_voter("outsider@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let id = uuid_of(&election["id"]);
        let candidate = candidate_ids(&election)[0];

        let res = app
            .post_with_token(
                &routes::enrollment(id),
                &json!({"profile_ids": [enrolled.profile_id]}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["enrolled"], 1);

        let res = app.cast_vote(&outsider.token, id, candidate).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "NOT_ELIGIBLE");
        assert_eq!(stored_votes(&app, id).await, 0);

        let res = app.cast_vote(&enrolled.token, id, candidate).await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn enrolling_twice_adds_nobody_new() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let election = app.create_election(&admin.token, Window::Upcoming, &[]).await;
        let id = uuid_of(&election["id"]);
        let body = json!({"profile_ids": [voter.profile_id]});

        let res = app.post_with_token(&routes::enrollment(id), &body, &admin.token).await;
        assert_eq!(res.body["enrolled"], 1);
        let res = app.post_with_token(&routes::enrollment(id), &body, &admin.token).await;
        assert_eq!(res.body["enrolled"], 0);

        let res = app.get_with_token(&routes::enrollment(id), &admin.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 1);

        let res = app
            .delete_with_token(&routes::enrollment_entry(id, voter.profile_id), &admin.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::vote_status(id), &voter.token).await;
        assert_eq!(res.body["is_eligible"], false);
    }

    #[tokio::test]
    async fn a_voter_who_voted_cannot_be_removed_from_the_roll() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let voted = app.create_voter("voted@example.edu").await;
        let pending = app.create_voter("pending@example.edu").await;
        let election = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let id = uuid_of(&election["id"]);

        app.post_with_token(
            &routes::enrollment(id),
            &json!({"profile_ids": [voted.profile_id, pending.profile_id]}),
            &admin.token,
        )
        .await;
        let res = app.cast_vote(&voted.token, id, candidate_ids(&election)[0]).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app
            .delete_with_token(&routes::enrollment_entry(id, voted.profile_id), &admin.token)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let res = app
            .delete_with_token(&routes::enrollment_entry(id, pending.profile_id), &admin.token)
            .await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::results(id), &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["eligible_voters"], 1);
        assert_eq!(res.body["turnout_percentage"], 100);
    }

    #[tokio::test]
    async fn enrolling_an_unknown_profile_fails() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let election = app.create_election(&admin.token, Window::Upcoming, &[]).await;

        let res = app
            .post_with_token(
                &routes::enrollment(uuid_of(&election["id"])),
                &json!({"profile_ids": [uuid::Uuid::now_v7()]}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}
