//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the runcrew-types models so the schema can drift from the
//! domain shape without touching callers.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use uuid::Uuid;

use runcrew_types::models::{Audit, Crew, Member, Message, RunRecord};

pub struct MemberRow {
    pub id: String,
    pub email: String,
    pub email_verified: bool,
    pub password: String,
    pub phone_number: String,
    pub name: String,
    pub nick_name: String,
    pub gender: Option<String>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<String>,
    pub roles: String,
    pub profile_image_url: Option<String>,
    pub visibility: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CrewRow {
    pub id: String,
    pub crew_name: String,
    pub activity_region: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub gender: Option<String>,
    pub run_record_open: bool,
    pub leader_required: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub message_type: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct RunRecordRow {
    pub id: String,
    pub member_id: String,
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub run_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fixed-width UTC timestamps so lexical order equals time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') form, no timezone.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

fn parse_audit(created_at: &str, updated_at: &str) -> Result<Audit> {
    Ok(Audit {
        created_at: parse_timestamp(created_at)?,
        updated_at: parse_timestamp(updated_at)?,
    })
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt id '{}'", raw))
}

fn parse_opt<T>(raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|s| s.parse::<T>()).transpose().map_err(Into::into)
}

impl TryFrom<MemberRow> for Member {
    type Error = anyhow::Error;

    fn try_from(row: MemberRow) -> Result<Self> {
        Ok(Member {
            id: parse_id(&row.id)?,
            audit: parse_audit(&row.created_at, &row.updated_at)?,
            email: row.email,
            email_verified: row.email_verified,
            password: row.password,
            phone_number: row.phone_number,
            name: row.name,
            nick_name: row.nick_name,
            gender: parse_opt(row.gender)?,
            birth_year: row.birth_year,
            activity_region: parse_opt(row.activity_region)?,
            roles: serde_json::from_str(&row.roles)
                .with_context(|| format!("Corrupt roles on member '{}'", row.id))?,
            profile_image_url: row.profile_image_url,
            visibility: row.visibility.parse()?,
        })
    }
}

impl TryFrom<CrewRow> for Crew {
    type Error = anyhow::Error;

    fn try_from(row: CrewRow) -> Result<Self> {
        Ok(Crew {
            id: parse_id(&row.id)?,
            audit: parse_audit(&row.created_at, &row.updated_at)?,
            crew_name: row.crew_name,
            activity_region: parse_opt(row.activity_region)?,
            min_age: row.min_age,
            max_age: row.max_age,
            gender: parse_opt(row.gender)?,
            run_record_open: row.run_record_open,
            leader_required: row.leader_required,
        })
    }
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Message {
            id: parse_id(&row.id)?,
            audit: parse_audit(&row.created_at, &row.updated_at)?,
            message_type: row.message_type.parse()?,
            content: row.content,
            image_url: row.image_url,
        })
    }
}

impl TryFrom<RunRecordRow> for RunRecord {
    type Error = anyhow::Error;

    fn try_from(row: RunRecordRow) -> Result<Self> {
        Ok(RunRecord {
            id: parse_id(&row.id)?,
            member_id: parse_id(&row.member_id)?,
            audit: parse_audit(&row.created_at, &row.updated_at)?,
            distance_meters: row.distance_meters,
            duration_seconds: row.duration_seconds,
            run_date: NaiveDate::parse_from_str(&row.run_date, "%Y-%m-%d")
                .with_context(|| format!("Corrupt run_date '{}'", row.run_date))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_sort_lexically() {
        let early = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let late = "2024-01-01T00:00:00.5Z".parse::<DateTime<Utc>>().unwrap();
        assert!(format_timestamp(&early) < format_timestamp(&late));
        assert_eq!(parse_timestamp(&format_timestamp(&late)).unwrap(), late);
    }

    #[test]
    fn parses_sqlite_default_timestamps() {
        let ts = parse_timestamp("2024-03-02 10:11:12").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-02T10:11:12.000000Z");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn corrupt_enum_label_fails_conversion() {
        let row = MessageRow {
            id: Uuid::new_v4().to_string(),
            message_type: "SHOUT".into(),
            content: String::new(),
            image_url: None,
            created_at: "2024-03-02 10:11:12".into(),
            updated_at: "2024-03-02 10:11:12".into(),
        };
        assert!(Message::try_from(row).is_err());
    }
}
