//! Named data-access operations. Implemented for `rusqlite::Connection` in
//! `queries`, so the same calls work on a plain connection and inside a
//! `Database::transaction` closure.

use anyhow::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use runcrew_types::api::{CrewFilter, Page, PageRequest};
use runcrew_types::models::{Crew, Member, Message, RunRecord};

pub trait MemberRepository {
    fn find_member_by_id(&self, id: Uuid) -> Result<Option<Member>>;
    fn find_member_by_email(&self, email: &str) -> Result<Option<Member>>;
    fn exists_by_email(&self, email: &str) -> Result<bool>;
    /// `phone_cipher` is the field-cipher output, never plaintext.
    fn exists_by_phone_number(&self, phone_cipher: &str) -> Result<bool>;
    /// Fails with [`crate::UniqueViolation`] on duplicate email or phone.
    fn insert_member(&self, member: &Member) -> Result<()>;
    /// Overwrite every mutable column. Returns false when no row matched.
    fn update_member(&self, member: &Member) -> Result<bool>;
    /// Replace only the stored password. Returns false when no row matched.
    fn update_password(&self, id: Uuid, password: &str, updated_at: DateTime<Utc>) -> Result<bool>;
    fn delete_member(&self, id: Uuid) -> Result<bool>;
}

pub trait CrewRepository {
    fn insert_crew(&self, crew: &Crew) -> Result<()>;
    fn find_crew_by_id(&self, id: Uuid) -> Result<Option<Crew>>;
    fn exists_by_crew_name(&self, crew_name: &str) -> Result<bool>;
    fn find_crews(&self, filter: &CrewFilter, page: PageRequest) -> Result<Page<Crew>>;
}

pub trait MessageRepository {
    fn insert_message(&self, message: &Message) -> Result<()>;
    /// Newest first. With `before`, only messages that sort strictly after
    /// the message with that id; same-timestamp messages tie-break on
    /// insertion order. An unknown cursor id yields an empty page.
    fn recent_messages(&self, limit: u32, before: Option<Uuid>) -> Result<Vec<Message>>;
}

pub trait RunRecordRepository {
    fn insert_run_record(&self, record: &RunRecord) -> Result<()>;
    /// Ordered by run date, oldest first.
    fn find_run_records_by_member(&self, member_id: Uuid) -> Result<Vec<RunRecord>>;
    fn delete_all_run_records_by_member(&self, member_id: Uuid) -> Result<usize>;
}
