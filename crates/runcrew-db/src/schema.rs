use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Create every table and index if missing. UNIQUE constraints on email,
/// encrypted phone number and crew name are the authoritative uniqueness
/// guard; service-level existence checks only give earlier, clearer errors.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS members (
            id                  TEXT PRIMARY KEY,
            email               TEXT NOT NULL UNIQUE,
            email_verified      INTEGER NOT NULL DEFAULT 0,
            password            TEXT NOT NULL,
            phone_number        TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL,
            nick_name           TEXT NOT NULL,
            gender              TEXT,
            birth_year          INTEGER,
            activity_region     TEXT,
            roles               TEXT NOT NULL,
            profile_image_url   TEXT,
            visibility          TEXT NOT NULL DEFAULT 'PUBLIC',
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS crews (
            id                  TEXT PRIMARY KEY,
            crew_name           TEXT NOT NULL UNIQUE,
            activity_region     TEXT,
            min_age             INTEGER,
            max_age             INTEGER,
            gender              TEXT,
            run_record_open     INTEGER NOT NULL DEFAULT 0,
            leader_required     INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_crews_region
            ON crews(activity_region);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            message_type    TEXT NOT NULL,
            content         TEXT NOT NULL,
            image_url       TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_created
            ON messages(created_at);

        CREATE TABLE IF NOT EXISTS run_records (
            id                  TEXT PRIMARY KEY,
            member_id           TEXT NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            distance_meters     INTEGER NOT NULL,
            duration_seconds    INTEGER NOT NULL,
            run_date            TEXT NOT NULL,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_run_records_member
            ON run_records(member_id, run_date);
        ",
    )?;

    info!("Database schema ready");
    Ok(())
}
