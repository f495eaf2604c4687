//! # Mutation Layer
//!
//! Create/edit operations for posts and comments. Ownership and identity
//! rules live here, not in the handlers: the actor comes in explicitly, the
//! author and timestamps are server-assigned, and a failed check means
//! nothing was written.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::forms::PostDraft;
use crate::models::{Actor, Comment, Post};
use crate::traits::{BlogRepo, PostChanges};

/// Persists a new post authored by `actor`. `pub_date` is assigned here and
/// never changes afterwards; a client-supplied value has no way in.
pub async fn create_post(repo: &dyn BlogRepo, actor: &Actor, draft: PostDraft) -> Result<Uuid> {
    let user = actor.user().ok_or(AppError::AuthenticationRequired)?;

    validate_draft(repo, &draft).await?;

    let post = Post {
        id: Uuid::now_v7(),
        text: draft.text,
        pub_date: Utc::now(),
        author_id: user.id,
        group_id: draft.group_id,
        image: draft.image,
    };
    let id = post.id;

    repo.create_post(post).await.map_err(AppError::internal)?;
    log::info!("post {} created by {}", id, user.username);
    Ok(id)
}

/// Updates `text`/`group`/`image` of an existing post. Only the author may
/// edit; `pub_date` and `author` are untouchable by construction of
/// [`PostChanges`]. The ownership check runs before validation, so a
/// non-owner learns nothing about the submitted data's fate.
pub async fn edit_post(
    repo: &dyn BlogRepo,
    actor: &Actor,
    post_id: Uuid,
    draft: PostDraft,
) -> Result<()> {
    let user = actor.user().ok_or(AppError::AuthenticationRequired)?;

    let view = repo
        .get_post(post_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("post", post_id.to_string()))?;

    if view.post.author_id != user.id {
        return Err(AppError::PermissionDenied(format!(
            "{} is not the author of post {}",
            user.username, post_id
        )));
    }

    validate_draft(repo, &draft).await?;

    let changes = PostChanges {
        text: draft.text,
        group_id: draft.group_id,
        image: draft.image,
    };
    repo.update_post(post_id, changes)
        .await
        .map_err(AppError::internal)
}

/// Appends a comment to a post. Comments are append-only: there is no edit
/// or delete counterpart anywhere in the system.
pub async fn create_comment(
    repo: &dyn BlogRepo,
    actor: &Actor,
    post_id: Uuid,
    text: &str,
) -> Result<Uuid> {
    let user = actor.user().ok_or(AppError::AuthenticationRequired)?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("comment text must not be empty".into()));
    }

    repo.get_post(post_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::NotFound("post", post_id.to_string()))?;

    let comment = Comment {
        id: Uuid::now_v7(),
        post_id,
        author_id: user.id,
        text: text.to_string(),
        created: Utc::now(),
    };
    let id = comment.id;

    repo.create_comment(comment)
        .await
        .map_err(AppError::internal)?;
    Ok(id)
}

/// Shared create/edit rules: non-empty text, and a referenced group must
/// actually exist.
async fn validate_draft(repo: &dyn BlogRepo, draft: &PostDraft) -> Result<()> {
    if draft.text.trim().is_empty() {
        return Err(AppError::Validation("post text must not be empty".into()));
    }

    if let Some(group_id) = draft.group_id {
        repo.get_group_by_id(group_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::Validation(format!("unknown group {group_id}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{post_view_fixture, user_fixture};
    use crate::traits::MockBlogRepo;

    fn draft(text: &str) -> PostDraft {
        PostDraft {
            text: text.to_string(),
            group_id: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn anonymous_create_inserts_nothing() {
        // No create_post expectation: any store call would panic the test.
        let repo = MockBlogRepo::new();

        let err = create_post(&repo, &Actor::Anonymous, draft("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_before_store_access() {
        let repo = MockBlogRepo::new();
        let actor = Actor::User(user_fixture("leo"));

        let err = create_post(&repo, &actor, draft("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_group_is_a_validation_error() {
        let mut repo = MockBlogRepo::new();
        repo.expect_get_group_by_id().returning(|_| Ok(None));
        let actor = Actor::User(user_fixture("leo"));

        let mut d = draft("hello");
        d.group_id = Some(Uuid::now_v7());
        let err = create_post(&repo, &actor, d).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_assigns_author_and_timestamp_server_side() {
        let user = user_fixture("leo");
        let author_id = user.id;

        let mut repo = MockBlogRepo::new();
        repo.expect_create_post()
            .withf(move |post| {
                post.author_id == author_id && post.text == "hello" && post.pub_date <= Utc::now()
            })
            .returning(|_| Ok(()));

        let actor = Actor::User(user);
        create_post(&repo, &actor, draft("hello")).await.unwrap();
    }

    #[tokio::test]
    async fn non_owner_edit_is_denied_without_mutation() {
        let view = post_view_fixture("original");
        let post_id = view.post.id;

        let mut repo = MockBlogRepo::new();
        repo.expect_get_post()
            .returning(move |_| Ok(Some(view.clone())));
        // No update_post expectation: the denial must happen first.

        let stranger = Actor::User(user_fixture("stranger"));
        let err = edit_post(&repo, &stranger, post_id, draft("hijacked"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn owner_edit_passes_only_editable_fields() {
        let view = post_view_fixture("original");
        let post_id = view.post.id;
        let owner = Actor::User(view.author.clone());

        let mut repo = MockBlogRepo::new();
        repo.expect_get_post()
            .returning(move |_| Ok(Some(view.clone())));
        repo.expect_update_post()
            .withf(move |id, changes| {
                *id == post_id && changes.text == "revised" && changes.group_id.is_none()
            })
            .returning(|_, _| Ok(()));

        edit_post(&repo, &owner, post_id, draft("revised"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn edit_of_missing_post_is_not_found() {
        let mut repo = MockBlogRepo::new();
        repo.expect_get_post().returning(|_| Ok(None));

        let actor = Actor::User(user_fixture("leo"));
        let err = edit_post(&repo, &actor, Uuid::now_v7(), draft("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("post", _)));
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let mut repo = MockBlogRepo::new();
        repo.expect_get_post().returning(|_| Ok(None));

        let actor = Actor::User(user_fixture("leo"));
        let err = create_comment(&repo, &actor, Uuid::now_v7(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("post", _)));
    }

    #[tokio::test]
    async fn comment_is_stamped_with_actor_identity() {
        let view = post_view_fixture("a post");
        let post_id = view.post.id;
        let user = user_fixture("replier");
        let author_id = user.id;

        let mut repo = MockBlogRepo::new();
        repo.expect_get_post()
            .returning(move |_| Ok(Some(view.clone())));
        repo.expect_create_comment()
            .withf(move |c| c.post_id == post_id && c.author_id == author_id && c.text == "nice")
            .returning(|_| Ok(()));

        let actor = Actor::User(user);
        create_comment(&repo, &actor, post_id, "  nice  ")
            .await
            .unwrap();
    }
}
