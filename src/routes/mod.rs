use axum::{
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use handlers::*;
use middlewares::*;

use crate::{
    config::Config,
    db::{boards::BoardRepository, users::UserRepository, DocumentStore},
};

mod extract;
mod handlers;
mod middlewares;

pub struct _AppState {
    pub store: Box<dyn DocumentStore>,
    pub config: Config,
}

impl _AppState {
    pub fn boards(&self) -> BoardRepository<'_> {
        BoardRepository::new(self.store.as_ref())
            .with_ownership_check(self.config.enforce_board_ownership)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self.store.as_ref())
    }
}

type AppState = &'static _AppState;

pub fn make_routes(state: _AppState) -> Router {
    let handle_404: fn() -> _ =
        || async { (StatusCode::NOT_FOUND, Json(json!({ "err": "Not found" }))) };

    let app_state: AppState = Box::leak(Box::new(state));

    let boards = Router::new()
        .route("/", get(get_boards).post(add_board))
        .route(
            "/:board_id",
            get(get_board_by_id).put(update_board).delete(delete_board),
        )
        .route("/:board_id/closed", get(get_archived_cards))
        .route("/dashboard/:board_id", get(get_dashboard_data));

    let users = Router::new()
        .route("/", get(get_users))
        .route(
            "/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/:user_id/mention", post(add_user_mention));

    let auth = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login));

    Router::new()
        .nest("/api/board", boards)
        .nest("/api/user", users)
        .nest("/api/auth", auth)
        .layer(axum::middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
        .fallback_service(handle_404.into_service())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, Response},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{config::StoreBackend, db::MemoryStore, session::USER_ID_HEADER};

    fn app(enforce_board_ownership: bool) -> Router {
        make_routes(_AppState {
            store: Box::new(MemoryStore::new()),
            config: Config {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
                store_backend: StoreBackend::Memory,
                redis_url: String::new(),
                enforce_board_ownership,
            },
        })
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response<axum::body::BoxBody>) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn board_lifecycle() {
        let app = app(false);

        let (status, board) = send(
            &app,
            request(
                "POST",
                "/api/board",
                Some(json!({
                    "title": "Sprint",
                    "createdBy": {"_id": "u1", "fullname": "Ada"},
                    "isStarred": true
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["isStarred"], json!(false));
        assert_eq!(board["labels"].as_array().unwrap().len(), 6);
        assert_eq!(board["members"], json!([{"_id": "u1", "fullname": "Ada"}]));
        let id = board["_id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            &app,
            request(
                "PUT",
                &format!("/api/board/{id}"),
                Some(json!({
                    "board": {
                        "_id": id,
                        "groups": [{
                            "id": "g1",
                            "title": "Todo",
                            "cards": [
                                {"id": "c1", "title": "Fix bug", "labelIds": ["l101"], "dueDate": 1},
                                {"id": "c2", "title": "Fix bug 2", "isArchive": true}
                            ]
                        }]
                    },
                    "activity": {
                        "txt": "added a card",
                        "byMember": {"_id": "u1", "fullname": "Ada"},
                        "card": {"id": "c1", "title": "Fix bug"}
                    }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], json!("Sprint"));
        assert_eq!(updated["activities"][0]["txt"], json!("added a card"));
        assert_eq!(updated["activities"][0]["card"]["id"], json!("c1"));
        assert_eq!(updated["activities"][0]["groupId"], Value::Null);

        let (_, filtered) = send(&app, request("GET", &format!("/api/board/{id}?txt=FIX"), None)).await;
        let cards = filtered["groups"][0]["cards"].as_array().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["title"], json!("Fix bug"));

        let (_, raw) = send(&app, request("GET", &format!("/api/board/{id}"), None)).await;
        assert_eq!(raw["groups"][0]["cards"].as_array().unwrap().len(), 2);

        let (_, closed) = send(&app, request("GET", &format!("/api/board/{id}/closed"), None)).await;
        assert_eq!(closed, json!([{
            "id": "c2",
            "title": "Fix bug 2",
            "isArchive": true,
            "isDone": false,
            "labelIds": [],
            "members": []
        }]));

        let (_, stats) = send(&app, request("GET", &format!("/api/board/dashboard/{id}"), None)).await;
        assert_eq!(stats["groupsCount"], json!(1));
        assert_eq!(stats["cardsCount"], json!(1));
        assert_eq!(stats["overdueCount"], json!(1));
        assert_eq!(stats["tasksPerLabel"], json!({"": 1}));
        assert_eq!(stats["tasksPerMember"], json!({}));

        let (status, message) = send(&app, request("DELETE", &format!("/api/board/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message, json!({"msg": "Deleted successfully"}));

        let (status, err) = send(&app, request("GET", &format!("/api/board/{id}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(err["err"].as_str().unwrap().contains(&id));
    }

    #[tokio::test]
    async fn activity_is_prepended_to_stored_history() {
        let app = app(false);
        let (_, board) = send(
            &app,
            request("POST", "/api/board", Some(json!({"title": "History"}))),
        )
        .await;
        let uri = format!("/api/board/{}", board["_id"].as_str().unwrap());

        for txt in ["first", "second"] {
            let (status, _) = send(
                &app,
                request(
                    "PUT",
                    &uri,
                    Some(json!({"board": {}, "activity": {"txt": txt, "groupId": "g1"}})),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, board) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(board["activities"][0]["txt"], json!("second"));
        assert_eq!(board["activities"][1]["txt"], json!("first"));
        assert_eq!(board["activities"][1]["groupId"], json!("g1"));
        assert_eq!(board["activities"][1]["card"], json!({}));
    }

    #[tokio::test]
    async fn creator_defaults_to_calling_user() {
        let app = app(false);
        let (_, user) = send(
            &app,
            request(
                "POST",
                "/api/auth/signup",
                Some(json!({"username": "ada", "password": "pw", "fullname": "Ada Lovelace"})),
            ),
        )
        .await;
        let user_id = user["_id"].as_str().unwrap();

        let mut add = request("POST", "/api/board", Some(json!({"title": "Mine"})));
        add.headers_mut()
            .insert(USER_ID_HEADER, user_id.parse().unwrap());
        let (status, board) = send(&app, add).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["createdBy"]["fullname"], json!("Ada Lovelace"));
        assert_eq!(board["members"][0]["_id"], json!(user_id));
    }

    #[tokio::test]
    async fn ownership_enforced_when_configured() {
        let app = app(true);
        let (_, board) = send(
            &app,
            request(
                "POST",
                "/api/board",
                Some(json!({"title": "Owned", "createdBy": {"_id": "u1", "fullname": "Ada"}})),
            ),
        )
        .await;
        let uri = format!("/api/board/{}", board["_id"].as_str().unwrap());

        let (status, _) = send(&app, request("DELETE", &uri, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut stranger = request("DELETE", &uri, None);
        stranger
            .headers_mut()
            .insert(USER_ID_HEADER, "u2".parse().unwrap());
        send(&app, stranger).await;
        let (status, _) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::OK);

        let mut owner = request("DELETE", &uri, None);
        owner.headers_mut().insert(USER_ID_HEADER, "u1".parse().unwrap());
        send(&app, owner).await;
        let (status, _) = send(&app, request("GET", &uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn auth_and_user_routes() {
        let app = app(false);
        let signup = |username: &str| {
            request(
                "POST",
                "/api/auth/signup",
                Some(json!({"username": username, "password": "pw", "fullname": "Ada Lovelace"})),
            )
        };

        let (status, user) = send(&app, signup("ada")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(user.get("password").is_none());
        let (status, _) = send(&app, signup("ada")).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            request("POST", "/api/auth/signup", Some(json!({"username": "x"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/auth/login",
                Some(json!({"username": "ada", "password": "nope"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let user_uri = format!("/api/user/{}", user["_id"].as_str().unwrap());
        let (status, _) = send(
            &app,
            request("PUT", &user_uri, Some(json!({"password": "changed"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (status, logged_in) = send(
            &app,
            request(
                "POST",
                "/api/auth/login",
                Some(json!({"username": "ada", "password": "changed"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in["_id"], user["_id"]);

        let (_, mentioned) = send(
            &app,
            request(
                "POST",
                &format!("{user_uri}/mention"),
                Some(json!({"txt": "look at this", "boardId": "b1"})),
            ),
        )
        .await;
        assert_eq!(mentioned["mentions"][0]["txt"], json!("look at this"));

        let (_, found) = send(&app, request("GET", "/api/user?txt=LOVE", None)).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        send(&app, request("DELETE", &user_uri, None)).await;
        let (status, _) = send(&app, request("GET", &user_uri, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_routes_are_json_404() {
        let (status, body) = send(&app(false), request("GET", "/nowhere", None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"err": "Not found"}));
    }

    #[tokio::test]
    async fn malformed_input_is_a_json_error() {
        let app = app(false);

        let bad_body = Request::builder()
            .method("POST")
            .uri("/api/board")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, bad_body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["err"].as_str().is_some_and(|err| !err.is_empty()));

        let (status, body) = send(&app, request("GET", "/api/user?txt=a&txt=b", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["err"].is_string());
    }

    #[tokio::test]
    async fn renaming_user_to_taken_username_conflicts() {
        let app = app(false);
        let signup = |username: &str| {
            request(
                "POST",
                "/api/auth/signup",
                Some(json!({"username": username, "password": "pw", "fullname": username})),
            )
        };
        let (_, ada) = send(&app, signup("ada")).await;
        let (_, bob) = send(&app, signup("bob")).await;

        let bob_uri = format!("/api/user/{}", bob["_id"].as_str().unwrap());
        let (status, body) = send(
            &app,
            request("PUT", &bob_uri, Some(json!({"username": "ada"}))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["err"].is_string());

        let (_, found) = send(&app, request("GET", "/api/user?txt=ada", None)).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, logged_in) = send(
            &app,
            request(
                "POST",
                "/api/auth/login",
                Some(json!({"username": "ada", "password": "pw"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logged_in["_id"], ada["_id"]);
    }
}
