//! # iw-ui
//!
//! Askama templates for every page Inkwell serves, plus the `PostCard`
//! view-model that resolves media ids into URLs before rendering.

use askama::Template;
use iw_core::forms::{FieldError, FieldSpec, PostForm, POST_FIELDS};
use iw_core::models::{CommentView, Group, Post, PostView, User};
use iw_core::pagination::Page;
use iw_core::traits::MediaStore;

/// A post prepared for rendering: joined author/group plus resolved image
/// URLs. Built once per listed post, never inside a template.
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
    pub image_url: Option<String>,
    pub thumb_url: Option<String>,
}

impl PostCard {
    pub fn from_view(view: PostView, store: &dyn MediaStore) -> Self {
        let image_url = view.post.image.as_deref().map(|id| store.media_url(id));
        let thumb_url = view.post.image.as_deref().map(|id| store.thumbnail_url(id));
        Self {
            post: view.post,
            author: view.author,
            group: view.group,
            image_url,
            thumb_url,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub page: &'a Page<PostCard>,
    /// Listing path the pagination links append `?page=` to.
    pub base_path: &'a str,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate<'a> {
    pub group: &'a Group,
    pub page: &'a Page<PostCard>,
    pub base_path: &'a str,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub author: &'a User,
    /// Total posts by this author, independent of the current page.
    pub count: i64,
    pub page: &'a Page<PostCard>,
    pub base_path: &'a str,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate<'a> {
    pub card: &'a PostCard,
    pub comments: &'a [CommentView],
    /// Whether the current actor is the post's author.
    pub can_edit: bool,
    /// Whether the current actor may comment (any authenticated user).
    pub can_comment: bool,
    pub comment_errors: &'a [FieldError],
}

/// Shared by the create and edit pages, Django-style: same template, a
/// different action and heading.
#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate<'a> {
    pub heading: &'a str,
    pub action: &'a str,
    pub form: &'a PostForm,
    pub groups: &'a [Group],
    pub errors: &'a [FieldError],
}

impl PostFormTemplate<'_> {
    /// Looks up field metadata from the static form configuration.
    pub fn spec(&self, name: &str) -> &'static FieldSpec {
        POST_FIELDS
            .iter()
            .find(|f| f.name == name)
            .unwrap_or(&POST_FIELDS[0])
    }
}

mod filters {
    /// Escapes post text and turns newlines into `<br />`, the only markup
    /// user text may produce.
    pub fn nl2br(s: &str) -> ::askama::Result<String> {
        let escaped = html_escape::encode_text(s).to_string();
        Ok(escaped
            .lines()
            .collect::<Vec<_>>()
            .join("<br />"))
    }
}
