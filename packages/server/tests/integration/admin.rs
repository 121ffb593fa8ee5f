use serde_json::json;

use ballot_server::config::EligibilityMode;

use crate::common::{TestApp, Window, candidate_ids, routes, uuid_of};

mod voters {
    use super::*;

    #[tokio::test]
    async fn admin_lists_and_searches_profiles() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        app.create_voter("zoe@example.edu").await;

        let res = app.get_with_token(routes::ADMIN_VOTERS, &admin.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);

        let res = app
            .get_with_token(&format!("{}?search=zoe", routes::ADMIN_VOTERS), &admin.token)
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["email"], "zoe@example.edu");
    }

    #[tokio::test]
    async fn voter_cannot_list_profiles() {
        let app = TestApp::spawn().await;
        let voter = app.create_voter("voter@example.edu").await;

        let res = app.get_with_token(routes::ADMIN_VOTERS, &voter.token).await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn admin_promotes_a_voter() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;

        let res = app
            .patch_with_token(
                &routes::admin_voter(voter.profile_id),
                &json!({"is_admin": true}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_admin"], true);

        // The existing token picks up the new role on the next request.
        let res = app.get_with_token(routes::ADMIN_STATS, &voter.token).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn admin_cannot_demote_themselves() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;

        let res = app
            .patch_with_token(
                &routes::admin_voter(admin.profile_id),
                &json!({"is_admin": false}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }
}

mod dashboards {
    use super::*;

    #[tokio::test]
    async fn voter_dashboard_groups_elections_by_status() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        app.create_election(&admin.token, Window::Upcoming, &["A"]).await;
        let active = app.create_election(&admin.token, Window::Active, &["A", "B"]).await;
        app.create_election(&admin.token, Window::Completed, &["A"]).await;

        app.cast_vote(
            &voter.token,
            uuid_of(&active["id"]),
            candidate_ids(&active)[0],
        )
        .await;

        let res = app.get_with_token(routes::DASHBOARD, &voter.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["upcoming"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["active"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["completed"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["active"][0]["has_voted"], true);
        assert_eq!(res.body["active"][0]["candidate_count"], 2);
        assert!(res.body["upcoming"][0]["has_voted"].is_null());
        assert_eq!(res.body["completed"][0]["has_voted"], false);
        assert_eq!(res.body["completed"][0]["total_votes"], 0);
    }

    #[tokio::test]
    async fn enrollment_dashboard_lists_only_enrolled_elections() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let enrolled = app.create_election(&admin.token, Window::Active, &["A"]).await;
        app.create_election(&admin.token, Window::Active, &["A"]).await;

        let res = app
            .post_with_token(
                &routes::enrollment(uuid_of(&enrolled["id"])),
                &json!({"profile_ids": [voter.profile_id]}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(routes::DASHBOARD, &voter.token).await;

        let active = res.body["active"].as_array().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0]["id"], enrolled["id"]);
    }

    #[tokio::test]
    async fn admin_stats_count_participation() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let first = app.create_election(&admin.token, Window::Active, &["A"]).await;
        let second = app.create_election(&admin.token, Window::Active, &["B"]).await;
        app.create_election(&admin.token, Window::Upcoming, &[]).await;

        for election in [&first, &second] {
            let res = app
                .cast_vote(
                    &voter.token,
                    uuid_of(&election["id"]),
                    candidate_ids(election)[0],
                )
                .await;
            assert_eq!(res.status, 201);
        }

        let res = app.get_with_token(routes::ADMIN_STATS, &admin.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total_profiles"], 2);
        assert_eq!(res.body["total_admins"], 1);
        assert_eq!(res.body["total_votes"], 2);
        assert_eq!(res.body["voters_participated"], 1);
        assert_eq!(res.body["overall_turnout"], 50);
        assert_eq!(res.body["elections"]["active"], 2);
        assert_eq!(res.body["elections"]["upcoming"], 1);
        assert_eq!(res.body["elections"]["total"], 3);

        let recent = res.body["recent_elections"].as_array().unwrap();
        assert_eq!(recent.len(), 3);
        // Newest first: the upcoming election was created last.
        assert_eq!(recent[0]["status"], "upcoming");
        assert_eq!(recent[0]["candidate_count"], 0);
        assert_eq!(recent[0]["total_votes"], 0);
        assert_eq!(recent[0]["turnout_percentage"], 0);
        assert!(recent[0]["winner_name"].is_null());

        assert_eq!(recent[1]["id"], second["id"]);
        assert_eq!(recent[1]["candidate_count"], 1);
        assert_eq!(recent[1]["total_votes"], 1);
        assert_eq!(recent[1]["eligible_voters"], 2);
        assert_eq!(recent[1]["turnout_percentage"], 50);
        assert_eq!(recent[1]["winner_name"], "B");
        assert_eq!(recent[2]["winner_name"], "A");
    }

    #[tokio::test]
    async fn admin_stats_use_the_roll_for_eligible_voters() {
        let app = TestApp::spawn_with(EligibilityMode::Enrollment).await;
        let admin = app.create_admin("admin@example.edu").await;
        let voter = app.create_voter("voter@example.edu").await;
        let other = app.create_voter("other@example.edu").await;
        let election = app
            .create_election(&admin.token, Window::Active, &["A", "B"])
            .await;
        let id = uuid_of(&election["id"]);

        app.post_with_token(
            &routes::enrollment(id),
            &json!({"profile_ids": [voter.profile_id, other.profile_id]}),
            &admin.token,
        )
        .await;
        let res = app.cast_vote(&voter.token, id, candidate_ids(&election)[1]).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.get_with_token(routes::ADMIN_STATS, &admin.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let summary = &res.body["recent_elections"][0];
        assert_eq!(summary["id"], election["id"]);
        assert_eq!(summary["status"], "active");
        assert_eq!(summary["candidate_count"], 2);
        assert_eq!(summary["total_votes"], 1);
        assert_eq!(summary["eligible_voters"], 2);
        assert_eq!(summary["turnout_percentage"], 50);
        assert_eq!(summary["winner_name"], "B");
    }
}
