//! SQL schema for the Grove SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per distinct path. `path` is the uniqueness authority; the
-- positional labels (trailing positions NULL) back the path predicates.
CREATE TABLE IF NOT EXISTS locations (
    id       INTEGER PRIMARY KEY,
    path     TEXT NOT NULL UNIQUE,
    label_0  TEXT NOT NULL,
    label_1  TEXT,
    label_2  TEXT,
    label_3  TEXT,
    label_4  TEXT,
    label_5  TEXT,
    label_6  TEXT,
    label_7  TEXT,
    label_8  TEXT,
    label_9  TEXT
);

CREATE INDEX IF NOT EXISTS locations_labels_idx
    ON locations(label_0, label_1, label_2, label_3);

CREATE TABLE IF NOT EXISTS posts (
    id              INTEGER PRIMARY KEY,
    klass           TEXT NOT NULL,
    realm           TEXT NOT NULL,
    canonical_path  TEXT NOT NULL,
    document        TEXT NOT NULL DEFAULT '{}',   -- JSON
    external_id     TEXT,
    created_by      INTEGER NOT NULL,
    restricted      INTEGER NOT NULL DEFAULT 0,
    deleted         INTEGER NOT NULL DEFAULT 0,
    version         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT NOT NULL,                -- RFC 3339, microseconds
    updated_at      TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS posts_external_id_idx
    ON posts(realm, external_id) WHERE external_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS posts_klass_idx      ON posts(klass);
CREATE INDEX IF NOT EXISTS posts_created_by_idx ON posts(created_by);

CREATE TABLE IF NOT EXISTS posts_locations (
    post_id     INTEGER NOT NULL REFERENCES posts(id),
    location_id INTEGER NOT NULL REFERENCES locations(id),
    PRIMARY KEY (post_id, location_id)
);

CREATE INDEX IF NOT EXISTS posts_locations_location_idx
    ON posts_locations(location_id);

CREATE TABLE IF NOT EXISTS post_tags (
    post_id INTEGER NOT NULL REFERENCES posts(id),
    tag     TEXT NOT NULL,
    PRIMARY KEY (post_id, tag)
);

CREATE INDEX IF NOT EXISTS post_tags_tag_idx ON post_tags(tag);

CREATE TABLE IF NOT EXISTS occurrences (
    id      INTEGER PRIMARY KEY,
    post_id INTEGER NOT NULL REFERENCES posts(id),
    label   TEXT NOT NULL,
    at      TEXT NOT NULL,
    UNIQUE (post_id, label, at)
);

CREATE INDEX IF NOT EXISTS occurrences_label_at_idx ON occurrences(label, at);

CREATE TABLE IF NOT EXISTS group_memberships (
    id          INTEGER PRIMARY KEY,
    group_id    INTEGER NOT NULL,
    identity_id INTEGER NOT NULL,
    UNIQUE (group_id, identity_id)
);

CREATE INDEX IF NOT EXISTS group_memberships_identity_idx
    ON group_memberships(identity_id);

CREATE TABLE IF NOT EXISTS group_locations (
    id          INTEGER PRIMARY KEY,
    group_id    INTEGER NOT NULL,
    location_id INTEGER NOT NULL REFERENCES locations(id),
    UNIQUE (group_id, location_id)
);

CREATE INDEX IF NOT EXISTS group_locations_location_idx
    ON group_locations(location_id);

-- Changes are strictly append-only.
CREATE TABLE IF NOT EXISTS changes (
    id      INTEGER PRIMARY KEY,
    kind    TEXT NOT NULL,      -- 'create' | 'update' | 'delete'
    post_id INTEGER NOT NULL REFERENCES posts(id),
    time    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS changes_post_idx ON changes(post_id);

CREATE TRIGGER IF NOT EXISTS changes_no_update
BEFORE UPDATE ON changes
BEGIN
    SELECT RAISE(ABORT, 'changes are immutable');
END;

CREATE TRIGGER IF NOT EXISTS changes_no_delete
BEFORE DELETE ON changes
BEGIN
    SELECT RAISE(ABORT, 'changes are immutable');
END;

CREATE TABLE IF NOT EXISTS readmarks (
    id           INTEGER PRIMARY KEY,
    location_id  INTEGER NOT NULL REFERENCES locations(id),
    owner        INTEGER NOT NULL,
    post_id      INTEGER NOT NULL,
    unread_count INTEGER NOT NULL DEFAULT 0,
    UNIQUE (location_id, owner)
);

PRAGMA user_version = 1;
";
