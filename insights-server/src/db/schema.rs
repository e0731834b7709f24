/// SQL schema for the Insights database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    image TEXT,
    bio TEXT,
    onboarded INTEGER NOT NULL DEFAULT 0,
    joined_at TEXT NOT NULL
);

-- Communities table
CREATE TABLE IF NOT EXISTS communities (
    id TEXT PRIMARY KEY,
    slug TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    image TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_communities_slug ON communities(slug);

-- Insights table (posts and replies in one collection)
CREATE TABLE IF NOT EXISTS insights (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    community_id TEXT,
    parent_id TEXT,
    text TEXT NOT NULL CHECK(length(text) >= 3),
    created_at TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (community_id) REFERENCES communities(id) ON DELETE SET NULL,
    FOREIGN KEY (parent_id) REFERENCES insights(id) ON DELETE CASCADE
);

-- Create index on created_at for efficient feed sorting
CREATE INDEX IF NOT EXISTS idx_insights_created_at ON insights(created_at DESC);

-- Create index on parent_id for efficient reply lookups
CREATE INDEX IF NOT EXISTS idx_insights_parent_id ON insights(parent_id);

CREATE INDEX IF NOT EXISTS idx_insights_author_id ON insights(author_id);

-- A user's insights list: one row per top-level insight the user created
CREATE TABLE IF NOT EXISTS user_insights (
    user_id TEXT NOT NULL,
    insight_id TEXT NOT NULL,
    PRIMARY KEY (user_id, insight_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (insight_id) REFERENCES insights(id) ON DELETE CASCADE
);

-- A community's insights list
CREATE TABLE IF NOT EXISTS community_insights (
    community_id TEXT NOT NULL,
    insight_id TEXT NOT NULL,
    PRIMARY KEY (community_id, insight_id),
    FOREIGN KEY (community_id) REFERENCES communities(id) ON DELETE CASCADE,
    FOREIGN KEY (insight_id) REFERENCES insights(id) ON DELETE CASCADE
);

-- Indexes for efficient list lookups
CREATE INDEX IF NOT EXISTS idx_user_insights_user ON user_insights(user_id);
CREATE INDEX IF NOT EXISTS idx_community_insights_community ON community_insights(community_id);
"#;

/// Demo data for development
/// - 3 onboarded users
/// - 1 community
/// - A handful of top-level insights and a small reply thread
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- DEMO USERS
-- ============================================================================
INSERT OR IGNORE INTO users (id, username, name, image, bio, onboarded, joined_at) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', 'alice', 'Alice Moran', NULL, 'Writes about distributed systems', 1, '2024-01-01T00:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440002', 'bob', 'Bob Tanaka', NULL, 'Compiler tinkerer', 1, '2024-01-02T00:00:00Z'),
    ('550e8400-e29b-41d4-a716-446655440003', 'charlie', 'Charlie Osei', NULL, NULL, 1, '2024-01-03T00:00:00Z');

-- ============================================================================
-- DEMO COMMUNITIES
-- ============================================================================
INSERT OR IGNORE INTO communities (id, slug, name, image, created_at) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', 'systems-club', 'Systems Club', NULL, '2024-01-01T00:00:00Z');

-- ============================================================================
-- DEMO INSIGHTS
-- ============================================================================
INSERT OR IGNORE INTO insights (id, author_id, community_id, parent_id, text, created_at) VALUES
    -- Top-level posts
    ('650e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440001', NULL, NULL, 'Write-ahead logs are the most underrated idea in systems design.', '2024-01-10T10:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440002', NULL, NULL, 'Spent the weekend reading the SQLite btree source. Worth every hour.', '2024-01-10T12:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', '750e8400-e29b-41d4-a716-446655440001', NULL, 'Kicking off a reading group on consensus protocols this month.', '2024-01-11T09:00:00Z'),
    ('650e8400-e29b-41d4-a716-446655440004', '550e8400-e29b-41d4-a716-446655440003', NULL, NULL, 'Hot take: most services never need more than one machine.', '2024-01-11T15:00:00Z'),
    -- Replies
    ('850e8400-e29b-41d4-a716-446655440001', '550e8400-e29b-41d4-a716-446655440002', NULL, '650e8400-e29b-41d4-a716-446655440001', 'Agreed, and they compose beautifully with snapshots.', '2024-01-10T10:30:00Z'),
    ('850e8400-e29b-41d4-a716-446655440002', '550e8400-e29b-41d4-a716-446655440003', NULL, '650e8400-e29b-41d4-a716-446655440001', 'Any good reading beyond the Postgres docs?', '2024-01-10T11:00:00Z'),
    ('850e8400-e29b-41d4-a716-446655440003', '550e8400-e29b-41d4-a716-446655440001', NULL, '850e8400-e29b-41d4-a716-446655440002', 'The ARIES paper, start to finish.', '2024-01-10T11:15:00Z');

-- ============================================================================
-- INSIGHTS LISTS (top-level creates only; replies are not pushed)
-- ============================================================================
INSERT OR IGNORE INTO user_insights (user_id, insight_id) VALUES
    ('550e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440001'),
    ('550e8400-e29b-41d4-a716-446655440002', '650e8400-e29b-41d4-a716-446655440002'),
    ('550e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440003'),
    ('550e8400-e29b-41d4-a716-446655440003', '650e8400-e29b-41d4-a716-446655440004');

INSERT OR IGNORE INTO community_insights (community_id, insight_id) VALUES
    ('750e8400-e29b-41d4-a716-446655440001', '650e8400-e29b-41d4-a716-446655440003');
"#;
