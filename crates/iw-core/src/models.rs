//! # Domain Models
//!
//! These structs represent the core entities of Inkwell.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An author/reader identity. Registration and login live outside this
/// system; we only persist enough of the user to hang posts and comments on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique handle, used in profile URLs (e.g., /profile/leo/)
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

/// A thematic category that posts may optionally belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub title: String,
    /// The URL key (e.g., "travel" for /group/travel/). Globally unique.
    pub slug: String,
    pub description: String,
}

/// The fundamental unit of publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    /// Never empty; the form layer rejects blank submissions.
    pub text: String,
    /// Assigned by the server at creation and never updated afterwards.
    pub pub_date: DateTime<Utc>,
    /// Required. Deleting the author deletes the post.
    pub author_id: Uuid,
    /// Optional. Deleting the group clears this reference, the post survives.
    pub group_id: Option<Uuid>,
    /// Media id of an attached image, resolved by the MediaStore.
    pub image: Option<String>,
}

/// An append-only reply attached to a post. No edit or delete operations
/// exist; a comment disappears only when its post or author does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// A post joined with its author and group in a single read, so listing
/// pages never do per-item lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub post: Post,
    pub author: User,
    pub group: Option<Group>,
}

/// A comment joined with its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: User,
}

/// The identity of the current requester.
#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Anonymous,
    User(User),
}

impl Actor {
    pub fn user(&self) -> Option<&User> {
        match self {
            Actor::User(u) => Some(u),
            Actor::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Actor::Anonymous)
    }
}
