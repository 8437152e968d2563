use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    Crew, Gender, Member, Message, MessageType, ProfileVisibility, Region, Role, RunRecord,
};
use crate::validation::{FieldViolation, Violations};

// -- Members --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub name: String,
    pub nick_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<Region>,
    /// Reference to an already-uploaded image.
    pub profile_image: Option<String>,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        v.email("email", &self.email);
        v.password("password", &self.password);
        if v.not_blank("confirm_password", &self.confirm_password)
            && self.password != self.confirm_password
        {
            v.push("confirm_password", "passwords do not match");
        }
        v.phone_number("phone_number", &self.phone_number);
        if v.not_blank("name", &self.name) {
            v.length("name", &self.name, 2, 12);
        }
        if v.not_blank("nick_name", &self.nick_name) {
            v.length("nick_name", &self.nick_name, 2, 12);
        }
        v.birth_year("birth_year", self.birth_year);
        v.into_result()
    }
}

/// Outward view of a member. `phone_number` is plaintext here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberResponse {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub phone_number: String,
    pub name: String,
    pub nick_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<Region>,
    pub roles: Vec<Role>,
    pub profile_image_url: Option<String>,
    pub visibility: ProfileVisibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberResponse {
    pub fn from_member(member: &Member, phone_number: String) -> Self {
        Self {
            id: member.id,
            email: member.email.clone(),
            email_verified: member.email_verified,
            phone_number,
            name: member.name.clone(),
            nick_name: member.nick_name.clone(),
            gender: member.gender,
            birth_year: member.birth_year,
            activity_region: member.activity_region,
            roles: member.roles.clone(),
            profile_image_url: member.profile_image_url.clone(),
            visibility: member.visibility,
            created_at: member.audit.created_at,
            updated_at: member.audit.updated_at,
        }
    }
}

/// Profile fields a member may edit. Every field is overwritten, so a
/// `None` clears the stored value.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMemberRequest {
    pub nick_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<Region>,
}

impl UpdateMemberRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        if v.not_blank("nick_name", &self.nick_name) {
            v.length("nick_name", &self.nick_name, 2, 12);
        }
        v.birth_year("birth_year", self.birth_year);
        v.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordRequest {
    /// Strength rules for the new password. Confirmation equality is
    /// checked by the caller, which reports it as a password mismatch.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        v.password("new_password", &self.new_password);
        v.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileVisibilityRequest {
    pub visibility: ProfileVisibility,
}

// -- Auth --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub member: MemberResponse,
    pub token: String,
}

// -- Paging --

/// Zero-based page index and page size. Every construction path, including
/// deserialization, clamps the size to `1..=MAX_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    page: u32,
    size: u32,
}

#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    page: u32,
    #[serde(default = "default_page_size")]
    size: u32,
}

fn default_page_size() -> u32 {
    PageRequest::DEFAULT_SIZE
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.size)
    }
}

impl PageRequest {
    pub const DEFAULT_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 100;

    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, Self::DEFAULT_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size);
        Self {
            items,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

// -- Crews --

/// Crew search filters. An absent field leaves that dimension unconstrained.
///
/// Age filters describe the caller's range and match crews whose accepted
/// range contains it: `crew.min_age <= min_age` and `crew.max_age >= max_age`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CrewFilter {
    pub activity_region: Option<Region>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub gender: Option<Gender>,
    pub run_record_public: Option<bool>,
    pub leader_required: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCrewRequest {
    pub crew_name: String,
    pub activity_region: Option<Region>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub run_record_open: bool,
    #[serde(default)]
    pub leader_required: bool,
}

impl CreateCrewRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        if v.not_blank("crew_name", &self.crew_name) {
            v.length("crew_name", &self.crew_name, 2, 20);
        }
        for (field, age) in [("min_age", self.min_age), ("max_age", self.max_age)] {
            if age.is_some_and(|a| !(0..=150).contains(&a)) {
                v.push(field, "must be between 0 and 150");
            }
        }
        if let (Some(min), Some(max)) = (self.min_age, self.max_age) {
            if min > max {
                v.push("max_age", "must not be less than min_age");
            }
        }
        v.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewResponse {
    pub id: Uuid,
    pub crew_name: String,
    pub activity_region: Option<Region>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub gender: Option<Gender>,
    pub run_record_open: bool,
    pub leader_required: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Crew> for CrewResponse {
    fn from(crew: Crew) -> Self {
        Self {
            id: crew.id,
            crew_name: crew.crew_name,
            activity_region: crew.activity_region,
            min_age: crew.min_age,
            max_age: crew.max_age,
            gender: crew.gender,
            run_record_open: crew.run_record_open,
            leader_required: crew.leader_required,
            created_at: crew.audit.created_at,
        }
    }
}

// -- Messages --

pub const MAX_MESSAGE_CHARS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMessageRequest {
    pub message_type: MessageType,
    #[serde(default)]
    pub content: String,
    pub image_url: Option<String>,
}

impl NewMessageRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        match self.message_type {
            MessageType::Image => {
                if self.image_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
                    v.push("image_url", "required for IMAGE messages");
                }
            }
            MessageType::Talk => {
                v.not_blank("content", &self.content);
            }
            MessageType::Enter | MessageType::Leave => {}
        }
        if self.content.chars().count() > MAX_MESSAGE_CHARS {
            v.push("content", format!("length must be at most {MAX_MESSAGE_CHARS}"));
        }
        v.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            message_type: message.message_type,
            content: message.content,
            image_url: message.image_url,
            created_at: message.audit.created_at,
        }
    }
}

// -- Run records --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewRunRecordRequest {
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub run_date: NaiveDate,
}

impl NewRunRecordRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut v = Violations::new();
        if self.distance_meters == 0 {
            v.push("distance_meters", "must be positive");
        }
        if self.duration_seconds == 0 {
            v.push("duration_seconds", "must be positive");
        }
        if self.run_date > Utc::now().date_naive() {
            v.push("run_date", "must not be in the future");
        }
        v.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecordResponse {
    pub id: Uuid,
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub run_date: NaiveDate,
    /// Seconds per kilometre, rounded down.
    pub pace_seconds_per_km: u32,
}

impl From<RunRecord> for RunRecordResponse {
    fn from(record: RunRecord) -> Self {
        let pace = u64::from(record.duration_seconds) * 1000
            / u64::from(record.distance_meters.max(1));
        Self {
            id: record.id,
            distance_meters: record.distance_meters,
            duration_seconds: record.duration_seconds,
            run_date: record.run_date,
            pace_seconds_per_km: u32::try_from(pace).unwrap_or(u32::MAX),
        }
    }
}
