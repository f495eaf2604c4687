//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Comment, CommentView, Group, Post, PostView, User};

/// Which slice of the post table a listing wants. Every variant returns the
/// same shape: posts ordered by `pub_date` descending (ties broken by id),
/// joined with author and group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostFilter {
    All,
    ByGroup(Uuid),
    ByAuthor(Uuid),
}

/// The only fields an edit may touch. `pub_date` and `author_id` are absent
/// on purpose: the port offers no way to rewrite them.
#[derive(Debug, Clone, PartialEq)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<String>,
}

/// Data persistence contract for users, groups, posts, and comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlogRepo: Send + Sync {
    // User operations
    async fn get_user(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    /// Cascades: all posts and comments authored by the user go with them.
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<()>;

    // Group operations
    async fn get_group(&self, slug: &str) -> anyhow::Result<Option<Group>>;
    async fn get_group_by_id(&self, id: Uuid) -> anyhow::Result<Option<Group>>;
    async fn list_groups(&self) -> anyhow::Result<Vec<Group>>;
    async fn create_group(&self, group: Group) -> anyhow::Result<()>;
    /// Nullifies: posts referencing the group keep existing with no group.
    async fn delete_group(&self, id: Uuid) -> anyhow::Result<()>;

    // Post operations
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>>;
    async fn list_posts(&self, filter: PostFilter) -> anyhow::Result<Vec<PostView>>;
    async fn count_posts_by_author(&self, author_id: Uuid) -> anyhow::Result<i64>;
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> anyhow::Result<()>;

    // Comment operations
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>>;
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()>;
}

/// Media storage contract for handling image uploads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media id for the Post model.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
    /// Returns the public URL of the original media.
    fn media_url(&self, media_id: &str) -> String;
    /// Returns the public URL of the thumbnail.
    fn thumbnail_url(&self, media_id: &str) -> String;
}

/// Identity contract: resolves the request actor from a session token.
/// Issuing credentials (login/registration) happens outside this system.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verifies a session token and returns the user it names, if valid.
    async fn actor_from_token(&self, token: &str) -> anyhow::Result<Option<User>>;

    /// Mints a session token for a user. Used by the seed tool and tests.
    fn issue_token(&self, user: &User) -> String;

    /// Where to send anonymous users who attempt a protected action.
    fn login_path(&self) -> &str;
}
