use anyhow::Result;
use chrono::{Duration, Utc};
use uuid::Uuid;

use insights_server::db::repositories::{CommunityRepository, InsightRepository, UserRepository};
use insights_server::db::Database;
use insights_types::{Community, Insight, User};

fn test_db() -> Result<Database> {
    let db = Database::in_memory()?;
    db.initialize()?;
    Ok(db)
}

fn new_user(users: &UserRepository, username: &str) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        name: format!("{username} name"),
        image: None,
        bio: None,
        onboarded: true,
        joined_at: Utc::now(),
    };
    users.upsert(&user)?;
    Ok(user)
}

/// Seed `count` top-level posts a second apart so feed order is deterministic
fn seed_posts(
    insights: &InsightRepository,
    author: &User,
    community: Option<&Community>,
    count: i64,
) -> Result<Vec<Insight>> {
    let base = Utc::now();
    let mut created = Vec::new();
    for n in 0..count {
        let insight = Insight {
            id: Uuid::new_v4(),
            author_id: author.id,
            community_id: community.map(|c| c.id),
            parent_id: None,
            text: format!("Post number {n}"),
            created_at: base + Duration::seconds(n),
        };
        insights.create(&insight, community)?;
        created.push(insight);
    }
    Ok(created)
}

#[tokio::test]
async fn test_feed_pages_and_is_next() -> Result<()> {
    let db = test_db()?;
    let users = UserRepository::new(db.pool.clone());
    let insights = InsightRepository::new(db.pool.clone());

    let alice = new_user(&users, "alice")?;
    seed_posts(&insights, &alice, None, 5)?;

    let first = insights.fetch_page(1, 2)?;
    assert_eq!(first.posts.len(), 2);
    assert!(first.is_next);

    let second = insights.fetch_page(2, 2)?;
    assert_eq!(second.posts.len(), 2);
    assert!(second.is_next);

    let third = insights.fetch_page(3, 2)?;
    assert_eq!(third.posts.len(), 1);
    assert!(!third.is_next);

    // No overlap between pages
    let mut seen: Vec<Uuid> = Vec::new();
    for page in [&first, &second, &third] {
        for post in &page.posts {
            assert!(!seen.contains(&post.id));
            seen.push(post.id);
        }
    }
    assert_eq!(seen.len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_feed_is_newest_first() -> Result<()> {
    let db = test_db()?;
    let users = UserRepository::new(db.pool.clone());
    let insights = InsightRepository::new(db.pool.clone());

    let alice = new_user(&users, "alice")?;
    let posts = seed_posts(&insights, &alice, None, 4)?;

    let feed = insights.fetch_page(1, 10)?;
    assert_eq!(feed.posts.len(), 4);
    assert!(!feed.is_next);

    // Last created comes back first
    assert_eq!(feed.posts[0].id, posts[3].id);
    for window in feed.posts.windows(2) {
        assert!(window[0].created_at >= window[1].created_at);
    }

    Ok(())
}

#[tokio::test]
async fn test_feed_excludes_replies_and_populates_one_level() -> Result<()> {
    let db = test_db()?;
    let users = UserRepository::new(db.pool.clone());
    let insights = InsightRepository::new(db.pool.clone());

    let alice = new_user(&users, "alice")?;
    let bob = new_user(&users, "bob")?;

    let posts = seed_posts(&insights, &alice, None, 1)?;
    let post = &posts[0];

    let reply = Insight {
        id: Uuid::new_v4(),
        author_id: bob.id,
        community_id: None,
        parent_id: Some(post.id),
        text: "A reply".to_string(),
        created_at: Utc::now() + Duration::seconds(10),
    };
    insights.create_reply(&reply)?;

    let nested = Insight {
        id: Uuid::new_v4(),
        author_id: alice.id,
        community_id: None,
        parent_id: Some(reply.id),
        text: "A nested reply".to_string(),
        created_at: Utc::now() + Duration::seconds(20),
    };
    insights.create_reply(&nested)?;

    let feed = insights.fetch_page(1, 10)?;

    // Replies never show up as feed posts, even newer ones
    assert_eq!(feed.posts.len(), 1);
    assert_eq!(feed.posts[0].id, post.id);

    // One reply level on each post, with a restricted author projection
    let children = &feed.posts[0].children;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].author.username, "bob");
    assert!(children[0].community.is_none());
    assert!(children[0].children.is_empty());
    assert_eq!(children[0].reply_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_feed_populates_community() -> Result<()> {
    let db = test_db()?;
    let users = UserRepository::new(db.pool.clone());
    let communities = CommunityRepository::new(db.pool.clone());
    let insights = InsightRepository::new(db.pool.clone());

    let alice = new_user(&users, "alice")?;
    let club = Community {
        id: Uuid::new_v4(),
        slug: "systems-club".to_string(),
        name: "Systems Club".to_string(),
        image: None,
        created_at: Utc::now(),
    };
    communities.create(&club)?;

    seed_posts(&insights, &alice, Some(&club), 1)?;
    seed_posts(&insights, &alice, None, 1)?;

    let feed = insights.fetch_page(1, 10)?;
    assert_eq!(feed.posts.len(), 2);

    let communal = feed
        .posts
        .iter()
        .find(|p| p.community.is_some())
        .expect("community post should be populated");
    assert_eq!(communal.community.as_ref().unwrap().slug, "systems-club");

    assert!(feed.posts.iter().any(|p| p.community.is_none()));

    Ok(())
}

#[tokio::test]
async fn test_profile_tabs_follow_insight_lists() -> Result<()> {
    let db = test_db()?;
    let users = UserRepository::new(db.pool.clone());
    let communities = CommunityRepository::new(db.pool.clone());
    let insights = InsightRepository::new(db.pool.clone());

    let alice = new_user(&users, "alice")?;
    let bob = new_user(&users, "bob")?;
    let club = Community {
        id: Uuid::new_v4(),
        slug: "systems-club".to_string(),
        name: "Systems Club".to_string(),
        image: None,
        created_at: Utc::now(),
    };
    communities.create(&club)?;

    let alice_posts = seed_posts(&insights, &alice, Some(&club), 2)?;
    seed_posts(&insights, &bob, None, 1)?;

    // Alice's reply to Bob's thread is not part of her tab
    let bob_feed = insights.get_by_author(&bob.id)?;
    let reply = Insight {
        id: Uuid::new_v4(),
        author_id: alice.id,
        community_id: None,
        parent_id: Some(bob_feed[0].id),
        text: "A reply from alice".to_string(),
        created_at: Utc::now() + Duration::seconds(30),
    };
    insights.create_reply(&reply)?;

    let alice_tab = insights.get_by_author(&alice.id)?;
    let alice_ids: Vec<Uuid> = alice_tab.iter().map(|i| i.id).collect();
    assert_eq!(alice_ids, alice_posts.iter().map(|i| i.id).collect::<Vec<_>>());

    let club_tab = insights.get_by_community(&club.id)?;
    assert_eq!(club_tab.len(), 2);
    assert!(club_tab.iter().all(|i| i.community.is_some()));

    Ok(())
}
