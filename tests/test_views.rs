mod common;

#[cfg(test)]
mod tests {
    use crate::common::{body_string, init_app, location, login, TestState};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use sea_orm::{EntityTrait, PaginatorTrait};
    use yatube::orm::follows;

    const POST_CARD: &str = "<article class=\"post\">";

    fn count_cards(body: &str) -> usize {
        body.matches(POST_CARD).count()
    }

    async fn count_follows(state: &TestState) -> u64 {
        follows::Entity::find()
            .count(state.db())
            .await
            .expect("count")
    }

    #[actix_rt::test]
    async fn test_thirteen_posts_split_into_ten_and_three() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        let group = state.create_group("Test group", "test").await;
        for i in 0..13 {
            state
                .create_post(&user, &format!("Post number {}", i), Some(&group))
                .await;
        }
        let app = init_app(&state).await;
        let cookie = login(&app, "test_user").await;
        state.create_user("reader").await;

        for base in ["/", "/group/test/", "/test_user/"] {
            let req = test::TestRequest::get().uri(base).to_request();
            let body = body_string(test::call_service(&app, req).await).await;
            assert_eq!(count_cards(&body), 10, "first page of {}", base);

            let req = test::TestRequest::get()
                .uri(&format!("{}?page=2", base))
                .cookie(cookie.clone())
                .to_request();
            let body = body_string(test::call_service(&app, req).await).await;
            assert_eq!(count_cards(&body), 3, "second page of {}", base);
        }
    }

    #[actix_rt::test]
    async fn test_out_of_range_page_is_last_page() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        for i in 0..13 {
            state
                .create_post(&user, &format!("Post number {}", i), None)
                .await;
        }
        let app = init_app(&state).await;

        let req = test::TestRequest::get()
            .uri("/test_user/?page=99")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(count_cards(&body_string(resp).await), 3);

        let req = test::TestRequest::get()
            .uri("/test_user/?page=last")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(count_cards(&body_string(resp).await), 10);
    }

    #[actix_rt::test]
    async fn test_newest_post_comes_first() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        state.create_post(&user, "Older post", None).await;
        state.create_post(&user, "Newer post", None).await;
        let app = init_app(&state).await;

        let req = test::TestRequest::get().uri("/test_user/").to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        let newer = body.find("Newer post").expect("newer post shown");
        let older = body.find("Older post").expect("older post shown");
        assert!(newer < older);
    }

    #[actix_rt::test]
    async fn test_post_with_group_is_listed_everywhere() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        let group = state.create_group("Test group", "test").await;
        state.create_post(&user, "Grouped post", Some(&group)).await;
        let app = init_app(&state).await;

        for page in ["/", "/group/test/", "/test_user/"] {
            let req = test::TestRequest::get().uri(page).to_request();
            let body = body_string(test::call_service(&app, req).await).await;
            assert!(body.contains("Grouped post"), "{}", page);
        }
    }

    #[actix_rt::test]
    async fn test_post_without_group_is_not_in_groups() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        let group = state.create_group("Test group", "test").await;
        state.create_group("Other group", "other").await;
        state.create_post(&user, "Grouped post", Some(&group)).await;
        state.create_post(&user, "Loose post", None).await;
        let app = init_app(&state).await;

        for page in ["/group/test/", "/group/other/"] {
            let req = test::TestRequest::get().uri(page).to_request();
            let body = body_string(test::call_service(&app, req).await).await;
            assert!(!body.contains("Loose post"), "{}", page);
        }

        let req = test::TestRequest::get().uri("/group/other/").to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(!body.contains("Grouped post"));
    }

    #[actix_rt::test]
    async fn test_post_page_context() {
        let state = TestState::new().await;
        let user = state.create_user("test_user").await;
        state.create_post(&user, "First", None).await;
        let post = state.create_post(&user, "Second", None).await;
        let app = init_app(&state).await;

        let req = test::TestRequest::get()
            .uri(&format!("/test_user/{}/", post.id))
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(body.contains("Second"));
        assert!(body.contains("Posts: 2"));
        // Guests get no comment form.
        assert!(!body.contains("Add a comment"));
    }

    #[actix_rt::test]
    async fn test_follow_and_unfollow() {
        let state = TestState::new().await;
        state.create_user("follower").await;
        state.create_user("author").await;
        let app = init_app(&state).await;
        let cookie = login(&app, "follower").await;

        let req = test::TestRequest::get()
            .uri("/author/follow/")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/author/");
        assert_eq!(count_follows(&state).await, 1);

        // Following twice changes nothing.
        let req = test::TestRequest::get()
            .uri("/author/follow/")
            .cookie(cookie.clone())
            .to_request();
        test::call_service(&app, req).await;
        assert_eq!(count_follows(&state).await, 1);

        let req = test::TestRequest::get()
            .uri("/author/")
            .cookie(cookie.clone())
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(body.contains("/author/unfollow/"));
        assert!(body.contains("Followers: 1"));

        let req = test::TestRequest::get()
            .uri("/author/unfollow/")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(count_follows(&state).await, 0);

        // Unfollowing again is a no-op.
        let req = test::TestRequest::get()
            .uri("/author/unfollow/")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(count_follows(&state).await, 0);
    }

    #[actix_rt::test]
    async fn test_cannot_follow_self_or_nobody() {
        let state = TestState::new().await;
        state.create_user("loner").await;
        let app = init_app(&state).await;
        let cookie = login(&app, "loner").await;

        let req = test::TestRequest::get()
            .uri("/loner/follow/")
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(count_follows(&state).await, 0);

        let req = test::TestRequest::get()
            .uri("/nobody/follow/")
            .cookie(cookie)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_follow_feed_shows_followed_authors_only() {
        let state = TestState::new().await;
        let author = state.create_user("author").await;
        state.create_user("follower").await;
        state.create_user("stranger").await;
        state.create_post(&author, "Post for followers", None).await;
        let app = init_app(&state).await;
        let follower = login(&app, "follower").await;
        let stranger = login(&app, "stranger").await;

        let req = test::TestRequest::get()
            .uri("/author/follow/")
            .cookie(follower.clone())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/follow/")
            .cookie(follower)
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(body.contains("Post for followers"));

        let req = test::TestRequest::get()
            .uri("/follow/")
            .cookie(stranger)
            .to_request();
        let body = body_string(test::call_service(&app, req).await).await;
        assert!(!body.contains("Post for followers"));
        assert_eq!(count_cards(&body), 0);
    }
}
