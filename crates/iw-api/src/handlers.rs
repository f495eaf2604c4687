//! # iw-api Handlers
//!
//! Thin orchestration between HTTP requests and the iw-core layers: resolve
//! the actor, run the query or mutation, paginate, render. All policy
//! (ownership, validation, immutability) lives in iw-core; all recovery
//! policy (what redirects where, what re-renders) lives here.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use futures_util::TryStreamExt;
use serde::Deserialize;
use uuid::Uuid;

use iw_core::error::AppError;
use iw_core::forms::{CommentForm, FieldError, PostForm};
use iw_core::models::Actor;
use iw_core::pagination::{paginate, parse_page, PAGE_LIMIT};
use iw_core::traits::{AuthProvider, BlogRepo, MediaStore};
use iw_core::{mutation, query};
use iw_ui::{
    GroupTemplate, IndexTemplate, PostCard, PostDetailTemplate, PostFormTemplate, ProfileTemplate,
};

use crate::error::{internal, WebError};

/// Name of the session cookie carrying the auth token.
pub const SESSION_COOKIE: &str = "iw_session";

/// State shared across all workers.
pub struct AppState {
    pub repo: Arc<dyn BlogRepo>,
    pub store: Arc<dyn MediaStore>,
    pub auth: Arc<dyn AuthProvider>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Kept as a raw string so a malformed value clamps to page 1 instead
    /// of failing extraction.
    pub page: Option<String>,
}

/// Resolves the request actor from the session cookie. Any token problem
/// (missing, tampered, stale) degrades to anonymous.
async fn actor_of(req: &HttpRequest, state: &AppState) -> Actor {
    let Some(cookie) = req.cookie(SESSION_COOKIE) else {
        return Actor::Anonymous;
    };
    match state.auth.actor_from_token(cookie.value()).await {
        Ok(Some(user)) => Actor::User(user),
        Ok(None) => Actor::Anonymous,
        Err(err) => {
            log::warn!("session lookup failed: {err}");
            Actor::Anonymous
        }
    }
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}

/// Protected pages send anonymous visitors to the login entry point,
/// remembering where they were headed.
fn login_redirect(state: &AppState, req: &HttpRequest) -> HttpResponse {
    see_other(&format!("{}?next={}", state.auth.login_path(), req.path()))
}

fn html(template: impl Template) -> Result<HttpResponse, WebError> {
    let body = template
        .render()
        .map_err(|err| WebError(AppError::Internal(format!("template error: {err}"))))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

/// Serves the paginated feed at `GET /`.
pub async fn index(
    state: web::Data<AppState>,
    query_params: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let posts = query::feed(state.repo.as_ref()).await?;

    let number = parse_page(query_params.page.as_deref()).unwrap_or(1);
    let page = paginate(posts, number, PAGE_LIMIT)
        .map(|view| PostCard::from_view(view, state.store.as_ref()));

    html(IndexTemplate {
        page: &page,
        base_path: "/",
    })
}

/// Lists the posts of one group at `GET /group/{slug}/`. Unknown slugs
/// are a 404.
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query_params: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let slug = path.into_inner();
    let (group, posts) = query::by_group(state.repo.as_ref(), &slug).await?;

    let number = parse_page(query_params.page.as_deref()).unwrap_or(1);
    let page = paginate(posts, number, PAGE_LIMIT)
        .map(|view| PostCard::from_view(view, state.store.as_ref()));

    html(GroupTemplate {
        group: &group,
        page: &page,
        base_path: &format!("/group/{}/", group.slug),
    })
}

/// Lists an author's posts plus their total count at
/// `GET /profile/{username}/`.
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query_params: web::Query<PageQuery>,
) -> Result<HttpResponse, WebError> {
    let username = path.into_inner();
    let (author, posts, count) = query::by_author(state.repo.as_ref(), &username).await?;

    let number = parse_page(query_params.page.as_deref()).unwrap_or(1);
    let page = paginate(posts, number, PAGE_LIMIT)
        .map(|view| PostCard::from_view(view, state.store.as_ref()));

    html(ProfileTemplate {
        author: &author,
        count,
        page: &page,
        base_path: &format!("/profile/{}/", author.username),
    })
}

/// Shared by the detail GET and the comment-form re-render.
async fn render_detail(
    state: &AppState,
    post_id: Uuid,
    actor: &Actor,
    comment_errors: &[FieldError],
) -> Result<HttpResponse, WebError> {
    let view = state
        .repo
        .get_post(post_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| WebError(AppError::NotFound("post", post_id.to_string())))?;

    let comments = state
        .repo
        .list_comments(post_id)
        .await
        .map_err(internal)?;

    let can_edit = actor
        .user()
        .map(|u| u.id == view.post.author_id)
        .unwrap_or(false);

    html(PostDetailTemplate {
        card: &PostCard::from_view(view, state.store.as_ref()),
        comments: &comments,
        can_edit,
        can_comment: !actor.is_anonymous(),
        comment_errors,
    })
}

/// Shows a post with its comments at `GET /posts/{id}/`.
pub async fn post_detail(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, WebError> {
    let actor = actor_of(&req, &state).await;
    render_detail(&state, path.into_inner(), &actor, &[]).await
}

async fn render_post_form(
    state: &AppState,
    heading: &str,
    action: &str,
    form: &PostForm,
    errors: &[FieldError],
) -> Result<HttpResponse, WebError> {
    let groups = state.repo.list_groups().await.map_err(internal)?;
    html(PostFormTemplate {
        heading,
        action,
        form,
        groups: &groups,
        errors,
    })
}

/// Reads a multipart submission into a `PostForm`. Text fields are
/// collected as strings; an image part is stored immediately and its media
/// id recorded. A rejected upload becomes an inline field error rather
/// than a failed request.
async fn read_post_form(
    state: &AppState,
    mut payload: Multipart,
) -> Result<(PostForm, Vec<FieldError>), WebError> {
    let mut form = PostForm::default();
    let mut errors = Vec::new();

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        WebError(AppError::Validation(format!("malformed form data: {e}")))
    })? {
        let name = field.name().to_string();
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| {
            WebError(AppError::Validation(format!("malformed form data: {e}")))
        })? {
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => form.text = String::from_utf8_lossy(&data).into_owned(),
            "group" => form.group = String::from_utf8_lossy(&data).into_owned(),
            "image" if !data.is_empty() => {
                match state.store.save_upload(data, &content_type).await {
                    Ok(media_id) => form.image = Some(media_id),
                    Err(err) => {
                        log::warn!("upload rejected: {err}");
                        errors.push(FieldError {
                            field: "image",
                            message: "Upload a valid image.".to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    Ok((form, errors))
}

/// Shows the empty new-post form at `GET /create/`.
pub async fn post_create_form(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, WebError> {
    let actor = actor_of(&req, &state).await;
    if actor.is_anonymous() {
        return Ok(login_redirect(&state, &req));
    }

    render_post_form(&state, "New post", "/create/", &PostForm::default(), &[]).await
}

/// Validates and persists a new post submitted to `POST /create/`, then
/// redirects to the author's profile.
pub async fn post_create(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse, WebError> {
    let actor = actor_of(&req, &state).await;
    let Some(username) = actor.user().map(|u| u.username.clone()) else {
        return Ok(login_redirect(&state, &req));
    };

    let (form, mut errors) = read_post_form(&state, payload).await?;
    let draft = match form.clean() {
        Ok(draft) if errors.is_empty() => draft,
        Ok(_) => {
            return render_post_form(&state, "New post", "/create/", &form, &errors).await;
        }
        Err(mut field_errors) => {
            errors.append(&mut field_errors);
            return render_post_form(&state, "New post", "/create/", &form, &errors).await;
        }
    };

    match mutation::create_post(state.repo.as_ref(), &actor, draft).await {
        Ok(_) => Ok(see_other(&format!("/profile/{username}/"))),
        Err(AppError::Validation(message)) => {
            errors.push(FieldError {
                field: "form",
                message,
            });
            render_post_form(&state, "New post", "/create/", &form, &errors).await
        }
        Err(err) => Err(WebError(err)),
    }
}

/// Shows the prefilled edit form at `GET /posts/{id}/edit/`, owner only.
/// A non-owner is sent back to the detail page, never shown an error.
pub async fn post_edit_form(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, WebError> {
    let post_id = path.into_inner();
    let actor = actor_of(&req, &state).await;
    if actor.is_anonymous() {
        return Ok(login_redirect(&state, &req));
    }

    let view = state
        .repo
        .get_post(post_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| WebError(AppError::NotFound("post", post_id.to_string())))?;

    let is_owner = actor
        .user()
        .map(|u| u.id == view.post.author_id)
        .unwrap_or(false);
    if !is_owner {
        return Ok(see_other(&format!("/posts/{post_id}/")));
    }

    let form = PostForm {
        text: view.post.text.clone(),
        group: view
            .post
            .group_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        image: view.post.image.clone(),
    };
    let action = format!("/posts/{post_id}/edit/");
    render_post_form(&state, "Edit post", &action, &form, &[]).await
}

/// Applies an owner-only update of text/group/image submitted to
/// `POST /posts/{id}/edit/`.
pub async fn post_edit(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, WebError> {
    let post_id = path.into_inner();
    let actor = actor_of(&req, &state).await;
    if actor.is_anonymous() {
        return Ok(login_redirect(&state, &req));
    }

    // Ownership is settled before the payload is read, so a non-owner's
    // upload never reaches the media store.
    let existing = state
        .repo
        .get_post(post_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| WebError(AppError::NotFound("post", post_id.to_string())))?;
    let is_owner = actor
        .user()
        .map(|u| u.id == existing.post.author_id)
        .unwrap_or(false);
    if !is_owner {
        return Ok(see_other(&format!("/posts/{post_id}/")));
    }

    let (mut form, mut errors) = read_post_form(&state, payload).await?;
    let action = format!("/posts/{post_id}/edit/");

    // No new upload means the existing attachment stays.
    if form.image.is_none() {
        form.image = existing.post.image;
    }

    let draft = match form.clean() {
        Ok(draft) if errors.is_empty() => draft,
        Ok(_) => return render_post_form(&state, "Edit post", &action, &form, &errors).await,
        Err(mut field_errors) => {
            errors.append(&mut field_errors);
            return render_post_form(&state, "Edit post", &action, &form, &errors).await;
        }
    };

    match mutation::edit_post(state.repo.as_ref(), &actor, post_id, draft).await {
        Ok(()) => Ok(see_other(&format!("/posts/{post_id}/"))),
        // Not the owner: back to the detail page, nothing changed.
        Err(AppError::PermissionDenied(_)) => Ok(see_other(&format!("/posts/{post_id}/"))),
        Err(AppError::Validation(message)) => {
            errors.push(FieldError {
                field: "form",
                message,
            });
            render_post_form(&state, "Edit post", &action, &form, &errors).await
        }
        Err(err) => Err(WebError(err)),
    }
}

/// Appends a comment submitted to `POST /posts/{id}/comment/` and returns
/// to the detail page.
pub async fn add_comment(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, WebError> {
    let post_id = path.into_inner();
    let actor = actor_of(&req, &state).await;
    if actor.is_anonymous() {
        return Ok(login_redirect(&state, &req));
    }

    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            return render_detail(&state, post_id, &actor, &errors).await;
        }
    };

    mutation::create_comment(state.repo.as_ref(), &actor, post_id, &text).await?;
    Ok(see_other(&format!("/posts/{post_id}/")))
}
