use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, patch};
use axum::{Json, Router};
use backlog_board::client::{BacklogClient, ClientError};
use backlog_board::models::*;
use chrono::Utc;
use uuid::Uuid;

/// What the stub store saw: query strings, headers, and PATCH bodies.
#[derive(Clone, Default)]
struct Recorded {
    queries: Arc<Mutex<Vec<String>>>,
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    auth_headers: Arc<Mutex<Vec<(Option<String>, Option<String>)>>>,
}

impl Recorded {
    fn record_request(&self, query: &Option<String>, headers: &HeaderMap) {
        self.queries
            .lock()
            .unwrap()
            .push(query.clone().unwrap_or_default());
        let apikey = headers
            .get("apikey")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bearer = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.auth_headers.lock().unwrap().push((apikey, bearer));
    }
}

fn sample_story(title: &str, order_index: i64) -> UserStory {
    let now = Utc::now();
    UserStory {
        id: Uuid::new_v4(),
        project_id: Uuid::nil(),
        title: title.to_string(),
        description: String::new(),
        order_index,
        created_at: now,
        updated_at: now,
    }
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{}", addr)
}

fn client_for(base_url: String) -> BacklogClient {
    BacklogClient::new(base_url, Some("test-key".to_string()), Uuid::nil())
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn returns_stories_in_delivered_order() {
        let stories = vec![sample_story("First", 0), sample_story("Second", 1)];
        let router = Router::new().route(
            "/rest/v1/user_stories",
            get({
                let stories = stories.clone();
                move || {
                    let stories = stories.clone();
                    async move { Json(stories) }
                }
            }),
        );
        let client = client_for(serve(router).await);

        let listed = client.list_stories().await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "First");
        assert_eq!(listed[1].title, "Second");
    }

    #[tokio::test]
    async fn scopes_to_the_project_and_orders_by_sequence_index() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/rest/v1/user_stories",
                get(
                    |State(recorded): State<Recorded>, headers: HeaderMap, RawQuery(q): RawQuery| async move {
                        recorded.record_request(&q, &headers);
                        Json(Vec::<UserStory>::new())
                    },
                ),
            )
            .with_state(recorded.clone());
        let client = client_for(serve(router).await);

        client.list_stories().await.expect("list");

        let queries = recorded.queries.lock().unwrap();
        assert!(queries[0].contains(&format!("project_id=eq.{}", Uuid::nil())));
        assert!(queries[0].contains("order=order_index.asc"));
    }

    #[tokio::test]
    async fn sends_the_store_auth_headers() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/rest/v1/tasks",
                get(
                    |State(recorded): State<Recorded>, headers: HeaderMap, RawQuery(q): RawQuery| async move {
                        recorded.record_request(&q, &headers);
                        Json(Vec::<Task>::new())
                    },
                ),
            )
            .with_state(recorded.clone());
        let client = client_for(serve(router).await);

        client.list_tasks().await.expect("list");

        let headers = recorded.auth_headers.lock().unwrap();
        assert_eq!(headers[0].0.as_deref(), Some("test-key"));
        assert_eq!(headers[0].1.as_deref(), Some("Bearer test-key"));
    }

    #[tokio::test]
    async fn maps_unauthorized_responses() {
        let router = Router::new().route(
            "/rest/v1/user_stories",
            get(|| async { StatusCode::UNAUTHORIZED }),
        );
        let client = client_for(serve(router).await);

        let err = client.list_stories().await.expect_err("should fail");
        assert!(matches!(err, ClientError::Unauthorized));
    }
}

mod updating {
    use super::*;

    #[tokio::test]
    async fn patches_only_the_changed_fields_plus_a_timestamp() {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/rest/v1/tasks",
                patch(
                    |State(recorded): State<Recorded>,
                     headers: HeaderMap,
                     RawQuery(q): RawQuery,
                     Json(body): Json<serde_json::Value>| async move {
                        recorded.record_request(&q, &headers);
                        recorded.bodies.lock().unwrap().push(body);
                        StatusCode::NO_CONTENT
                    },
                ),
            )
            .with_state(recorded.clone());
        let client = client_for(serve(router).await);

        let id = Uuid::new_v4();
        let before = Utc::now();
        let stamp = client
            .update_task(
                id,
                &UpdateTaskInput {
                    title: Some("T2".to_string()),
                    description: None,
                },
            )
            .await
            .expect("update");

        assert!(stamp >= before);

        let queries = recorded.queries.lock().unwrap();
        assert_eq!(queries[0], format!("id=eq.{}", id));

        let bodies = recorded.bodies.lock().unwrap();
        let body = bodies[0].as_object().expect("object body");
        assert_eq!(body.get("title").and_then(|v| v.as_str()), Some("T2"));
        assert!(!body.contains_key("description"));
        assert!(body.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn maps_not_found_responses() {
        let router = Router::new().route(
            "/rest/v1/features",
            patch(|| async { (StatusCode::NOT_FOUND, "no such feature") }),
        );
        let client = client_for(serve(router).await);

        let err = client
            .update_feature(
                Uuid::new_v4(),
                &UpdateFeatureInput {
                    title: Some("x".to_string()),
                    description: None,
                },
            )
            .await
            .expect_err("should fail");
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}

mod loading {
    use super::*;

    async fn empty_list<T: serde::Serialize + Send + 'static>() -> Json<Vec<T>> {
        Json(Vec::new())
    }

    #[tokio::test]
    async fn load_all_fetches_all_three_sets() {
        let story = sample_story("Login", 0);
        let router = Router::new()
            .route(
                "/rest/v1/user_stories",
                get({
                    let story = story.clone();
                    move || {
                        let story = story.clone();
                        async move { Json(vec![story]) }
                    }
                }),
            )
            .route("/rest/v1/features", get(empty_list::<Feature>))
            .route("/rest/v1/tasks", get(empty_list::<Task>));
        let client = client_for(serve(router).await);

        let snapshot = client.load_all().await.expect("load");
        assert_eq!(snapshot.stories.len(), 1);
        assert!(snapshot.features.is_empty());
        assert!(snapshot.tasks.is_empty());
    }

    #[tokio::test]
    async fn load_all_fails_when_any_single_fetch_fails() {
        let router = Router::new()
            .route("/rest/v1/user_stories", get(empty_list::<UserStory>))
            .route("/rest/v1/features", get(empty_list::<Feature>))
            .route(
                "/rest/v1/tasks",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
            );
        let client = client_for(serve(router).await);

        let err = client.load_all().await.expect_err("should fail");
        assert!(matches!(err, ClientError::Server(_)));
    }
}
