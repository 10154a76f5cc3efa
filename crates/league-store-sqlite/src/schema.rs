//! SQL schema for the league SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Papers are never deleted. Only arxiv_details is written after insert.
CREATE TABLE IF NOT EXISTS papers (
    paper_id        TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    abstract        TEXT NOT NULL,
    authors         TEXT NOT NULL DEFAULT '[]',   -- JSON array
    category        TEXT NOT NULL,
    subcategory     TEXT NOT NULL,
    year            INTEGER NOT NULL,
    url             TEXT NOT NULL DEFAULT '',
    arxiv_id        TEXT UNIQUE,
    keywords        TEXT NOT NULL DEFAULT '[]',   -- JSON array
    reference_list  TEXT NOT NULL DEFAULT '[]',   -- JSON array
    arxiv_details   TEXT,                         -- JSON ArxivDetails or NULL
    created_at      TEXT NOT NULL
);

-- Counters are an incremental projection of completed matches.
CREATE TABLE IF NOT EXISTS agents (
    agent_id        TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    model           TEXT NOT NULL,
    provider        TEXT NOT NULL,                -- 'openai' | 'anthropic'
    settings        TEXT NOT NULL,                -- JSON GenerationSettings
    matches_played  INTEGER NOT NULL DEFAULT 0,
    matches_won     INTEGER NOT NULL DEFAULT 0,
    matches_drawn   INTEGER NOT NULL DEFAULT 0,
    matches_lost    INTEGER NOT NULL DEFAULT 0,
    points          INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL,
    updated_at      TEXT,
    UNIQUE (name, model)
);

CREATE TABLE IF NOT EXISTS matches (
    match_id          TEXT PRIMARY KEY,
    paper_id          TEXT NOT NULL REFERENCES papers(paper_id),
    opponent_paper_id TEXT REFERENCES papers(paper_id),
    agent1_id         TEXT NOT NULL REFERENCES agents(agent_id),
    agent2_id         TEXT NOT NULL REFERENCES agents(agent_id),
    judge_id          TEXT REFERENCES agents(agent_id),
    status            TEXT NOT NULL DEFAULT 'pending',
    winner_id         TEXT REFERENCES agents(agent_id),
    error             TEXT,
    created_at        TEXT NOT NULL,
    completed_at      TEXT,
    CHECK (agent1_id != agent2_id),
    CHECK (judge_id IS NULL OR (judge_id != agent1_id AND judge_id != agent2_id)),
    CHECK (opponent_paper_id IS NULL OR opponent_paper_id != paper_id)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    match_id    TEXT NOT NULL REFERENCES matches(match_id),
    agent_id    TEXT NOT NULL REFERENCES agents(agent_id),
    paper_id    TEXT NOT NULL REFERENCES papers(paper_id),
    summary     TEXT NOT NULL,
    strengths   TEXT NOT NULL,                    -- JSON array
    weaknesses  TEXT NOT NULL,                    -- JSON array
    questions   TEXT NOT NULL,                    -- JSON array
    rating      INTEGER NOT NULL,
    confidence  TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    UNIQUE (match_id, agent_id)
);

CREATE TABLE IF NOT EXISTS evaluations (
    evaluation_id            TEXT PRIMARY KEY,
    match_id                 TEXT NOT NULL UNIQUE REFERENCES matches(match_id),
    review1_id               TEXT NOT NULL REFERENCES reviews(review_id),
    review2_id               TEXT NOT NULL REFERENCES reviews(review_id),
    winner_id                TEXT REFERENCES agents(agent_id),
    technical_correctness_1  INTEGER NOT NULL,
    technical_correctness_2  INTEGER NOT NULL,
    depth_of_analysis_1      INTEGER NOT NULL,
    depth_of_analysis_2      INTEGER NOT NULL,
    constructive_feedback_1  INTEGER NOT NULL,
    constructive_feedback_2  INTEGER NOT NULL,
    clarity_1                INTEGER NOT NULL,
    clarity_2                INTEGER NOT NULL,
    fairness_1               INTEGER NOT NULL,
    fairness_2               INTEGER NOT NULL,
    reasoning                TEXT NOT NULL,
    created_at               TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feedback (
    feedback_id TEXT PRIMARY KEY,
    match_id    TEXT NOT NULL REFERENCES matches(match_id),
    review_id   TEXT REFERENCES reviews(review_id),
    author      TEXT,
    vote        TEXT,                             -- 'agree' | 'disagree'
    comment     TEXT,
    likes       INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT
);

CREATE INDEX IF NOT EXISTS papers_scope_idx     ON papers(category, subcategory, year);
CREATE INDEX IF NOT EXISTS matches_status_idx   ON matches(status);
CREATE INDEX IF NOT EXISTS matches_created_idx  ON matches(created_at);
CREATE INDEX IF NOT EXISTS reviews_match_idx    ON reviews(match_id);
CREATE INDEX IF NOT EXISTS feedback_match_idx   ON feedback(match_id);

PRAGMA user_version = 1;
";
