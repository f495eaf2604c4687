//! Development seeding tool: fills the store with demo users, groups,
//! posts, and comments, and prints session tokens for the demo users so a
//! fresh checkout can be explored with a browser cookie.

use std::sync::Arc;

use chrono::Utc;
use iw_auth_simple::SimpleAuthProvider;
use iw_core::models::{Comment, Group, Post, User};
use iw_core::traits::{AuthProvider, BlogRepo};
use iw_db_sqlite::SqliteBlogRepo;
use uuid::Uuid;

/// Fetches the user by name, creating them on first run.
async fn ensure_user(repo: &dyn BlogRepo, username: &str) -> anyhow::Result<User> {
    if let Some(existing) = repo.get_user(username).await? {
        return Ok(existing);
    }
    let user = User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        joined_at: Utc::now(),
    };
    repo.create_user(user.clone()).await?;
    Ok(user)
}

async fn ensure_group(
    repo: &dyn BlogRepo,
    slug: &str,
    title: &str,
    description: &str,
) -> anyhow::Result<Group> {
    if let Some(existing) = repo.get_group(slug).await? {
        return Ok(existing);
    }
    let group = Group {
        id: Uuid::now_v7(),
        title: title.to_string(),
        slug: slug.to_string(),
        description: description.to_string(),
    };
    repo.create_group(group.clone()).await?;
    Ok(group)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:inkwell.db".to_string());
    let session_secret =
        std::env::var("SESSION_SECRET").unwrap_or_else(|_| "insecure-dev-secret".to_string());

    let repo: Arc<dyn BlogRepo> = Arc::new(SqliteBlogRepo::new(&database_url).await?);
    let auth = SimpleAuthProvider::new(&session_secret, repo.clone());

    let leo = ensure_user(repo.as_ref(), "leo").await?;
    let mia = ensure_user(repo.as_ref(), "mia").await?;

    let travel = ensure_group(
        repo.as_ref(),
        "travel",
        "Travel notes",
        "Places worth the train ticket.",
    )
    .await?;
    ensure_group(
        repo.as_ref(),
        "kitchen",
        "Kitchen experiments",
        "Recipes, failures included.",
    )
    .await?;

    // Posts and a comment, only on a fresh database.
    if repo.count_posts_by_author(leo.id).await? == 0 {
        let first = Post {
            id: Uuid::now_v7(),
            text: "Spent the weekend in the mountains.\nThe cable car is worth every cent."
                .to_string(),
            pub_date: Utc::now(),
            author_id: leo.id,
            group_id: Some(travel.id),
            image: None,
        };
        let first_id = first.id;
        repo.create_post(first).await?;

        repo.create_post(Post {
            id: Uuid::now_v7(),
            text: "Testing the new editor. Hello, Inkwell!".to_string(),
            pub_date: Utc::now(),
            author_id: mia.id,
            group_id: None,
            image: None,
        })
        .await?;

        repo.create_comment(Comment {
            id: Uuid::now_v7(),
            post_id: first_id,
            author_id: mia.id,
            text: "Adding this one to my list.".to_string(),
            created: Utc::now(),
        })
        .await?;

        log::info!("seeded demo posts and a comment");
    }

    for user in [&leo, &mia] {
        println!(
            "session token for {}: {}",
            user.username,
            auth.issue_token(user)
        );
    }

    Ok(())
}
