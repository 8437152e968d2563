use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

use runcrew_types::api::{CrewFilter, Page, PageRequest};
use runcrew_types::models::{Crew, Member, Message, RunRecord};

use crate::crew_filter::build_where;
use crate::error::classify;
use crate::models::{CrewRow, MemberRow, MessageRow, RunRecordRow, format_timestamp};
use crate::repository::{CrewRepository, MemberRepository, MessageRepository, RunRecordRepository};

const MEMBER_COLUMNS: &str = "id, email, email_verified, password, phone_number, name, nick_name, \
     gender, birth_year, activity_region, roles, profile_image_url, visibility, created_at, updated_at";

const CREW_COLUMNS: &str = "id, crew_name, activity_region, min_age, max_age, gender, \
     run_record_open, leader_required, created_at, updated_at";

// -- Members --

impl MemberRepository for Connection {
    fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        query_member(self, "id", &id.to_string())
    }

    fn find_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        query_member(self, "email", email)
    }

    fn exists_by_email(&self, email: &str) -> Result<bool> {
        exists(self, "SELECT EXISTS(SELECT 1 FROM members WHERE email = ?1)", email)
    }

    fn exists_by_phone_number(&self, phone_cipher: &str) -> Result<bool> {
        exists(self, "SELECT EXISTS(SELECT 1 FROM members WHERE phone_number = ?1)", phone_cipher)
    }

    fn insert_member(&self, member: &Member) -> Result<()> {
        let roles = serde_json::to_string(&member.roles)?;
        self.execute(
            &format!(
                "INSERT INTO members ({MEMBER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            params![
                member.id.to_string(),
                member.email,
                member.email_verified,
                member.password,
                member.phone_number,
                member.name,
                member.nick_name,
                member.gender.map(|g| g.as_str()),
                member.birth_year,
                member.activity_region.map(|r| r.as_str()),
                roles,
                member.profile_image_url,
                member.visibility.as_str(),
                format_timestamp(&member.audit.created_at),
                format_timestamp(&member.audit.updated_at),
            ],
        )
        .map_err(classify)?;
        Ok(())
    }

    fn update_member(&self, member: &Member) -> Result<bool> {
        let roles = serde_json::to_string(&member.roles)?;
        let changed = self
            .execute(
                "UPDATE members SET
                    email = ?2, email_verified = ?3, password = ?4, phone_number = ?5,
                    name = ?6, nick_name = ?7, gender = ?8, birth_year = ?9,
                    activity_region = ?10, roles = ?11, profile_image_url = ?12,
                    visibility = ?13, updated_at = ?14
                 WHERE id = ?1",
                params![
                    member.id.to_string(),
                    member.email,
                    member.email_verified,
                    member.password,
                    member.phone_number,
                    member.name,
                    member.nick_name,
                    member.gender.map(|g| g.as_str()),
                    member.birth_year,
                    member.activity_region.map(|r| r.as_str()),
                    roles,
                    member.profile_image_url,
                    member.visibility.as_str(),
                    format_timestamp(&member.audit.updated_at),
                ],
            )
            .map_err(classify)?;
        Ok(changed > 0)
    }

    fn update_password(&self, id: Uuid, password: &str, updated_at: DateTime<Utc>) -> Result<bool> {
        let changed = self.execute(
            "UPDATE members SET password = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), password, format_timestamp(&updated_at)],
        )?;
        Ok(changed > 0)
    }

    fn delete_member(&self, id: Uuid) -> Result<bool> {
        let deleted = self.execute("DELETE FROM members WHERE id = ?1", [id.to_string()])?;
        Ok(deleted > 0)
    }
}

fn query_member(conn: &Connection, column: &str, value: &str) -> Result<Option<Member>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {MEMBER_COLUMNS} FROM members WHERE {column} = ?1"))?;

    let row = stmt.query_row([value], member_row).optional()?;
    row.map(Member::try_from).transpose()
}

fn member_row(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        email: row.get(1)?,
        email_verified: row.get(2)?,
        password: row.get(3)?,
        phone_number: row.get(4)?,
        name: row.get(5)?,
        nick_name: row.get(6)?,
        gender: row.get(7)?,
        birth_year: row.get(8)?,
        activity_region: row.get(9)?,
        roles: row.get(10)?,
        profile_image_url: row.get(11)?,
        visibility: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

// -- Crews --

impl CrewRepository for Connection {
    fn insert_crew(&self, crew: &Crew) -> Result<()> {
        self.execute(
            &format!("INSERT INTO crews ({CREW_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            params![
                crew.id.to_string(),
                crew.crew_name,
                crew.activity_region.map(|r| r.as_str()),
                crew.min_age,
                crew.max_age,
                crew.gender.map(|g| g.as_str()),
                crew.run_record_open,
                crew.leader_required,
                format_timestamp(&crew.audit.created_at),
                format_timestamp(&crew.audit.updated_at),
            ],
        )
        .map_err(classify)?;
        Ok(())
    }

    fn find_crew_by_id(&self, id: Uuid) -> Result<Option<Crew>> {
        let mut stmt = self.prepare(&format!("SELECT {CREW_COLUMNS} FROM crews WHERE id = ?1"))?;
        let row = stmt.query_row([id.to_string()], crew_row).optional()?;
        row.map(Crew::try_from).transpose()
    }

    fn exists_by_crew_name(&self, crew_name: &str) -> Result<bool> {
        exists(self, "SELECT EXISTS(SELECT 1 FROM crews WHERE crew_name = ?1)", crew_name)
    }

    fn find_crews(&self, filter: &CrewFilter, page: PageRequest) -> Result<Page<Crew>> {
        let clause = build_where(filter);

        let total: i64 = self.query_row(
            &format!("SELECT COUNT(*) FROM crews{}", clause.sql),
            params_from_iter(clause.params.iter()),
            |row| row.get(0),
        )?;

        // rowid keeps insertion order so pages are stable.
        let n = clause.params.len();
        let sql = format!(
            "SELECT {CREW_COLUMNS} FROM crews{} ORDER BY rowid LIMIT ?{} OFFSET ?{}",
            clause.sql,
            n + 1,
            n + 2
        );
        let mut values = clause.params;
        values.push(rusqlite::types::Value::Integer(i64::from(page.size())));
        values.push(rusqlite::types::Value::Integer(
            i64::try_from(page.offset()).context("Page offset overflow")?,
        ));

        let mut stmt = self.prepare(&sql)?;
        let crews = stmt
            .query_map(params_from_iter(values.iter()), crew_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(Crew::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(crews, page, u64::try_from(total).unwrap_or(0)))
    }
}

fn crew_row(row: &Row<'_>) -> rusqlite::Result<CrewRow> {
    Ok(CrewRow {
        id: row.get(0)?,
        crew_name: row.get(1)?,
        activity_region: row.get(2)?,
        min_age: row.get(3)?,
        max_age: row.get(4)?,
        gender: row.get(5)?,
        run_record_open: row.get(6)?,
        leader_required: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

// -- Messages --

impl MessageRepository for Connection {
    fn insert_message(&self, message: &Message) -> Result<()> {
        self.execute(
            "INSERT INTO messages (id, message_type, content, image_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id.to_string(),
                message.message_type.as_str(),
                message.content,
                message.image_url,
                format_timestamp(&message.audit.created_at),
                format_timestamp(&message.audit.updated_at),
            ],
        )?;
        Ok(())
    }

    fn recent_messages(&self, limit: u32, before: Option<Uuid>) -> Result<Vec<Message>> {
        let mut stmt = self.prepare(
            "SELECT id, message_type, content, image_url, created_at, updated_at
             FROM messages
             WHERE ?1 IS NULL
                OR (created_at, rowid) < (SELECT created_at, rowid FROM messages WHERE id = ?1)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2",
        )?;

        let before = before.map(|id| id.to_string());
        let rows = stmt
            .query_map(params![before, limit], |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    message_type: row.get(1)?,
                    content: row.get(2)?,
                    image_url: row.get(3)?,
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(Message::try_from).collect()
    }
}

// -- Run records --

impl RunRecordRepository for Connection {
    fn insert_run_record(&self, record: &RunRecord) -> Result<()> {
        self.execute(
            "INSERT INTO run_records
                (id, member_id, distance_meters, duration_seconds, run_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.member_id.to_string(),
                record.distance_meters,
                record.duration_seconds,
                record.run_date.format("%Y-%m-%d").to_string(),
                format_timestamp(&record.audit.created_at),
                format_timestamp(&record.audit.updated_at),
            ],
        )?;
        Ok(())
    }

    fn find_run_records_by_member(&self, member_id: Uuid) -> Result<Vec<RunRecord>> {
        let mut stmt = self.prepare(
            "SELECT id, member_id, distance_meters, duration_seconds, run_date, created_at, updated_at
             FROM run_records
             WHERE member_id = ?1
             ORDER BY run_date, rowid",
        )?;

        let rows = stmt
            .query_map([member_id.to_string()], |row| {
                Ok(RunRecordRow {
                    id: row.get(0)?,
                    member_id: row.get(1)?,
                    distance_meters: row.get(2)?,
                    duration_seconds: row.get(3)?,
                    run_date: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(RunRecord::try_from).collect()
    }

    fn delete_all_run_records_by_member(&self, member_id: Uuid) -> Result<usize> {
        let deleted =
            self.execute("DELETE FROM run_records WHERE member_id = ?1", [member_id.to_string()])?;
        Ok(deleted)
    }
}

fn exists(conn: &Connection, sql: &str, value: &str) -> Result<bool> {
    let found: bool = conn.query_row(sql, [value], |row| row.get(0))?;
    Ok(found)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
