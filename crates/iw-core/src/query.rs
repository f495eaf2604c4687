//! # Listing Query Layer
//!
//! Produces the filtered, ordered, but *unsliced* sequence of posts for each
//! listing context. Ordering (pub_date descending) and the author/group join
//! are part of the repo contract; this layer adds the slug/username
//! resolution and its not-found semantics. Pure reads, no side effects.

use crate::error::{AppError, Result};
use crate::models::{Group, PostView, User};
use crate::traits::{BlogRepo, PostFilter};

/// All posts, newest first.
pub async fn feed(repo: &dyn BlogRepo) -> Result<Vec<PostView>> {
    repo.list_posts(PostFilter::All)
        .await
        .map_err(AppError::internal)
}

/// Posts belonging to the group with the given slug, newest first.
pub async fn by_group(repo: &dyn BlogRepo, slug: &str) -> Result<(Group, Vec<PostView>)> {
    let group = repo
        .get_group(slug)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("group", slug.to_string()))?;

    let posts = repo
        .list_posts(PostFilter::ByGroup(group.id))
        .await
        .map_err(AppError::internal)?;

    Ok((group, posts))
}

/// Posts authored by the given user, newest first, plus their total count.
/// The count covers the whole history, not just the requested page.
pub async fn by_author(repo: &dyn BlogRepo, username: &str) -> Result<(User, Vec<PostView>, i64)> {
    let author = repo
        .get_user(username)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("user", username.to_string()))?;

    let posts = repo
        .list_posts(PostFilter::ByAuthor(author.id))
        .await
        .map_err(AppError::internal)?;

    let count = repo
        .count_posts_by_author(author.id)
        .await
        .map_err(AppError::internal)?;

    Ok((author, posts, count))
}
