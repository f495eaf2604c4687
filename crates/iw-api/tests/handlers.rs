//! End-to-end handler tests against an in-memory SQLite repo and real
//! session tokens.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use iw_api::configure_routes;
use iw_api::handlers::{AppState, SESSION_COOKIE};
use iw_auth_simple::SimpleAuthProvider;
use iw_core::models::{Post, User};
use iw_core::traits::{AuthProvider, BlogRepo, MediaStore, PostFilter};
use iw_db_sqlite::SqliteBlogRepo;

/// Media store stand-in: accepts everything, composes predictable URLs.
struct NullMediaStore;

#[async_trait]
impl MediaStore for NullMediaStore {
    async fn save_upload(&self, _data: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        Ok("stubmedia".to_string())
    }

    fn media_url(&self, media_id: &str) -> String {
        format!("/static/uploads/{media_id}")
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        format!("/static/uploads/thumb_{media_id}")
    }
}

/// Media store stand-in that counts how often anything is saved.
struct CountingMediaStore(Arc<AtomicUsize>);

#[async_trait]
impl MediaStore for CountingMediaStore {
    async fn save_upload(&self, _data: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok("counted".to_string())
    }

    fn media_url(&self, media_id: &str) -> String {
        format!("/static/uploads/{media_id}")
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        format!("/static/uploads/thumb_{media_id}")
    }
}

struct TestEnv {
    repo: Arc<SqliteBlogRepo>,
    auth: Arc<SimpleAuthProvider>,
    state: web::Data<AppState>,
}

async fn env() -> TestEnv {
    let repo = Arc::new(
        SqliteBlogRepo::new("sqlite::memory:")
            .await
            .expect("in-memory repo"),
    );
    let dyn_repo: Arc<dyn BlogRepo> = repo.clone();
    let auth = Arc::new(SimpleAuthProvider::new("test-secret", dyn_repo.clone()));

    let state = web::Data::new(AppState {
        repo: dyn_repo,
        store: Arc::new(NullMediaStore),
        auth: auth.clone(),
    });

    TestEnv { repo, auth, state }
}

fn user(name: &str) -> User {
    User {
        id: Uuid::now_v7(),
        username: name.to_string(),
        joined_at: Utc::now(),
    }
}

fn post(author: &User, text: &str) -> Post {
    Post {
        id: Uuid::now_v7(),
        text: text.to_string(),
        pub_date: Utc::now(),
        author_id: author.id,
        group_id: None,
        image: None,
    }
}

fn session_cookie(env: &TestEnv, user: &User) -> Cookie<'static> {
    Cookie::new(SESSION_COOKIE, env.auth.issue_token(user))
}

fn multipart_text_body(text: &str) -> (&'static str, String) {
    let body = format!(
        "--XBOUNDARYX\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n--XBOUNDARYX--\r\n"
    );
    ("multipart/form-data; boundary=XBOUNDARYX", body)
}

fn multipart_with_image(text: &str, image: &[u8]) -> (&'static str, Vec<u8>) {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--XBOUNDARYX\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n{text}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        b"--XBOUNDARYX\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n",
    );
    body.extend_from_slice(image);
    body.extend_from_slice(b"\r\n--XBOUNDARYX--\r\n");
    ("multipart/form-data; boundary=XBOUNDARYX", body)
}

fn location(resp: &ServiceResponse<impl MessageBody>) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn feed_renders_posts() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();
    env.repo.create_post(post(&leo, "hello world")).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("hello world"));
    assert!(body.contains("/profile/leo/"));
}

#[actix_web::test]
async fn unknown_group_is_404() {
    let env = env().await;
    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/group/nonexistent-slug/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_post_is_404() {
    let env = env().await;
    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", Uuid::now_v7()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn anonymous_create_redirects_to_login_and_inserts_nothing() {
    let env = env().await;
    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;

    let (content_type, body) = multipart_text_body("should not exist");
    let req = test::TestRequest::post()
        .uri("/create/")
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/auth/login/?next=/create/"));

    let feed = env.repo.list_posts(PostFilter::All).await.unwrap();
    assert!(feed.is_empty());
}

#[actix_web::test]
async fn authenticated_create_lands_on_profile() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let (content_type, body) = multipart_text_body("fresh post");
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(session_cookie(&env, &leo))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/profile/leo/");

    let feed = env.repo.list_posts(PostFilter::All).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].post.text, "fresh post");
    assert_eq!(feed[0].post.author_id, leo.id);
}

#[actix_web::test]
async fn blank_create_rerenders_form_without_persisting() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let (content_type, body) = multipart_text_body("   ");
    let req = test::TestRequest::post()
        .uri("/create/")
        .cookie(session_cookie(&env, &leo))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("This field is required."));

    assert!(env.repo.list_posts(PostFilter::All).await.unwrap().is_empty());
}

#[actix_web::test]
async fn non_owner_edit_redirects_and_changes_nothing() {
    let env = env().await;
    let leo = user("leo");
    let mia = user("mia");
    env.repo.create_user(leo.clone()).await.unwrap();
    env.repo.create_user(mia.clone()).await.unwrap();
    let p = post(&leo, "original text");
    env.repo.create_post(p.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let (content_type, body) = multipart_text_body("hijacked");
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", p.id))
        .cookie(session_cookie(&env, &mia))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", p.id));

    let view = env.repo.get_post(p.id).await.unwrap().unwrap();
    assert_eq!(view.post.text, "original text");
}

#[actix_web::test]
async fn non_owner_edit_with_upload_stores_no_media() {
    let repo = Arc::new(
        SqliteBlogRepo::new("sqlite::memory:")
            .await
            .expect("in-memory repo"),
    );
    let dyn_repo: Arc<dyn BlogRepo> = repo.clone();
    let auth = Arc::new(SimpleAuthProvider::new("test-secret", dyn_repo.clone()));
    let saves = Arc::new(AtomicUsize::new(0));
    let state = web::Data::new(AppState {
        repo: dyn_repo,
        store: Arc::new(CountingMediaStore(saves.clone())),
        auth: auth.clone(),
    });

    let leo = user("leo");
    let mia = user("mia");
    repo.create_user(leo.clone()).await.unwrap();
    repo.create_user(mia.clone()).await.unwrap();
    let p = post(&leo, "original text");
    repo.create_post(p.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .configure(configure_routes),
    )
    .await;
    let (content_type, body) = multipart_with_image("hijacked", b"fakeimagebytes");
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", p.id))
        .cookie(Cookie::new(SESSION_COOKIE, auth.issue_token(&mia)))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", p.id));
    assert_eq!(saves.load(Ordering::SeqCst), 0);

    let view = repo.get_post(p.id).await.unwrap().unwrap();
    assert_eq!(view.post.text, "original text");
    assert!(view.post.image.is_none());
}

#[actix_web::test]
async fn owner_edit_updates_text_but_not_pub_date() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();
    let p = post(&leo, "original text");
    env.repo.create_post(p.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let (content_type, body) = multipart_text_body("revised text");
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit/", p.id))
        .cookie(session_cookie(&env, &leo))
        .insert_header(("content-type", content_type))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let view = env.repo.get_post(p.id).await.unwrap().unwrap();
    assert_eq!(view.post.text, "revised text");
    assert_eq!(
        view.post.pub_date.timestamp_micros(),
        p.pub_date.timestamp_micros()
    );
    assert_eq!(view.post.author_id, leo.id);
}

#[actix_web::test]
async fn comment_appends_and_redirects_to_detail() {
    let env = env().await;
    let leo = user("leo");
    let mia = user("mia");
    env.repo.create_user(leo.clone()).await.unwrap();
    env.repo.create_user(mia.clone()).await.unwrap();
    let p = post(&leo, "commentable");
    env.repo.create_post(p.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", p.id))
        .cookie(session_cookie(&env, &mia))
        .set_form([("text", "nice one")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), format!("/posts/{}/", p.id));

    let comments = env.repo.list_comments(p.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment.text, "nice one");
    assert_eq!(comments[0].author.username, "mia");
}

#[actix_web::test]
async fn anonymous_comment_redirects_to_login() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();
    let p = post(&leo, "quiet post");
    env.repo.create_post(p.clone()).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", p.id))
        .set_form([("text", "drive-by")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/auth/login/"));
    assert!(env.repo.list_comments(p.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn profile_shows_author_and_count() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();
    for i in 0..3 {
        env.repo.create_post(post(&leo, &format!("post {i}"))).await.unwrap();
    }

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/profile/leo/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert!(body.contains("Posts by leo"));
    assert!(body.contains("3 post(s) in total"));
}

#[actix_web::test]
async fn second_page_holds_the_remainder() {
    let env = env().await;
    let leo = user("leo");
    env.repo.create_user(leo.clone()).await.unwrap();
    for i in 0..13 {
        env.repo.create_post(post(&leo, &format!("numbered {i}"))).await.unwrap();
    }

    let app = test::init_service(
        App::new()
            .app_data(env.state.clone())
            .configure(configure_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/?page=2").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert_eq!(body.matches("<article class=\"post\">").count(), 3);
    assert!(body.contains("Page 2 of 2"));

    // A malformed page parameter clamps to page 1.
    let req = test::TestRequest::get().uri("/?page=bogus").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let body = String::from_utf8_lossy(&body);
    assert_eq!(body.matches("<article class=\"post\">").count(), 10);
}
