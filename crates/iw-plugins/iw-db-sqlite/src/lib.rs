//! # iw-db-sqlite
//!
//! SQLite implementation of `BlogRepo` via sqlx. Maps the relational model
//! back and forth to the `iw-core` domain models and lets the schema's
//! foreign-key policy do the delete bookkeeping: deleting an author
//! cascades to their posts and comments, deleting a group nullifies the
//! reference and leaves posts standing.

use std::str::FromStr;

use async_trait::async_trait;
use iw_core::models::{Comment, CommentView, Group, Post, PostView, User};
use iw_core::traits::{BlogRepo, PostChanges, PostFilter};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// Schema bootstrap, one statement per entry (sqlx prepares statements
/// individually). `IF NOT EXISTS` keeps restarts idempotent.
const SCHEMA: [&str; 8] = [
    "CREATE TABLE IF NOT EXISTS users (
        id        BLOB PRIMARY KEY,
        username  TEXT NOT NULL UNIQUE,
        joined_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS groups (
        id          BLOB PRIMARY KEY,
        title       TEXT NOT NULL,
        slug        TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id        BLOB PRIMARY KEY,
        text      TEXT NOT NULL CHECK (length(text) > 0),
        pub_date  TEXT NOT NULL,
        author_id BLOB NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        group_id  BLOB REFERENCES groups (id) ON DELETE SET NULL,
        image     TEXT
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id        BLOB PRIMARY KEY,
        post_id   BLOB NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
        author_id BLOB NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        text      TEXT NOT NULL CHECK (length(text) > 0),
        created   TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_pub_date ON posts (pub_date DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts (author_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts (group_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments (post_id)",
];

/// The author/group join every listing read carries, so consumers never do
/// per-item lookups.
const POST_VIEW_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id, p.image,
            u.username, u.joined_at,
            g.title AS group_title, g.slug AS group_slug, g.description AS group_description
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN groups g ON g.id = p.group_id";

pub struct SqliteBlogRepo {
    pool: SqlitePool,
}

impl SqliteBlogRepo {
    /// Connects (creating the file if needed), enables foreign keys, and
    /// bootstraps the schema. The pool holds a single connection so that
    /// `sqlite::memory:` databases stay coherent across calls.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        username: row.get("username"),
        joined_at: row.get("joined_at"),
    }
}

fn post_view_from_row(row: &SqliteRow) -> PostView {
    let group_id = row
        .get::<Option<Vec<u8>>, _>("group_id")
        .map(|blob| blob_to_uuid(&blob));

    let group = group_id.map(|id| Group {
        id,
        title: row.get("group_title"),
        slug: row.get("group_slug"),
        description: row.get("group_description"),
    });

    PostView {
        post: Post {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            text: row.get("text"),
            pub_date: row.get("pub_date"),
            author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            group_id,
            image: row.get("image"),
        },
        author: User {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            username: row.get("username"),
            joined_at: row.get("joined_at"),
        },
        group,
    }
}

#[async_trait]
impl BlogRepo for SqliteBlogRepo {
    async fn get_user(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, joined_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, joined_at FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, username, joined_at) VALUES (?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(user.username)
            .bind(user.joined_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The schema cascades: the user's posts go, and with each post its
    /// comments, as do comments the user left elsewhere.
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_group(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, title, slug, description FROM groups WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Group {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            title: row.get("title"),
            slug: row.get("slug"),
            description: row.get("description"),
        }))
    }

    async fn get_group_by_id(&self, id: Uuid) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM groups WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Group {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            title: row.get("title"),
            slug: row.get("slug"),
            description: row.get("description"),
        }))
    }

    async fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        let rows = sqlx::query("SELECT id, title, slug, description FROM groups ORDER BY title")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Group {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                title: row.get("title"),
                slug: row.get("slug"),
                description: row.get("description"),
            })
            .collect())
    }

    async fn create_group(&self, group: Group) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO groups (id, title, slug, description) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(group.id))
            .bind(group.title)
            .bind(group.slug)
            .bind(group.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Posts referencing the group survive with `group_id` set to NULL.
    async fn delete_group(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostView>> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = ?");
        let row = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_view_from_row))
    }

    async fn list_posts(&self, filter: PostFilter) -> anyhow::Result<Vec<PostView>> {
        // Newest first; v7 id blobs are time-ordered, so the id tie-break
        // preserves insertion order within a timestamp.
        let order = "ORDER BY p.pub_date DESC, p.id DESC";
        let (sql, key) = match filter {
            PostFilter::All => (format!("{POST_VIEW_SELECT} {order}"), None),
            PostFilter::ByGroup(id) => (
                format!("{POST_VIEW_SELECT} WHERE p.group_id = ? {order}"),
                Some(uuid_to_blob(id)),
            ),
            PostFilter::ByAuthor(id) => (
                format!("{POST_VIEW_SELECT} WHERE p.author_id = ? {order}"),
                Some(uuid_to_blob(id)),
            ),
        };

        let mut query = sqlx::query(&sql);
        if let Some(key) = key {
            query = query.bind(key);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(post_view_from_row).collect())
    }

    async fn count_posts_by_author(&self, author_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ?")
            .bind(uuid_to_blob(author_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, text, pub_date, author_id, group_id, image)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(post.text)
        .bind(post.pub_date)
        .bind(uuid_to_blob(post.author_id))
        .bind(post.group_id.map(uuid_to_blob))
        .bind(post.image)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Only the editable columns appear in the statement; `pub_date` and
    /// `author_id` cannot change through this port.
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> anyhow::Result<()> {
        sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(changes.text)
            .bind(changes.group_id.map(uuid_to_blob))
            .bind(changes.image)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created,
                    u.username, u.joined_at
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created ASC, c.id ASC",
        )
        .bind(uuid_to_blob(post_id))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CommentView {
                comment: Comment {
                    id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                    post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
                    author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
                    text: row.get("text"),
                    created: row.get("created"),
                },
                author: User {
                    id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
                    username: row.get("username"),
                    joined_at: row.get("joined_at"),
                },
            })
            .collect())
    }

    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, text, created)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.post_id))
        .bind(uuid_to_blob(comment.author_id))
        .bind(comment.text)
        .bind(comment.created)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
