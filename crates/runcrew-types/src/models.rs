use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Returned when a stored or submitted enum label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Declares a fieldless enum with a stable SCREAMING_CASE label used both
/// on the wire and in the database.
macro_rules! labeled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labeled_enum!(Gender {
    Male => "MALE",
    Female => "FEMALE",
});

labeled_enum!(
    /// Activity regions a member or crew can run in.
    Region {
        Seoul => "SEOUL",
        Busan => "BUSAN",
        Daegu => "DAEGU",
        Incheon => "INCHEON",
        Gwangju => "GWANGJU",
        Daejeon => "DAEJEON",
        Ulsan => "ULSAN",
        Sejong => "SEJONG",
        Gyeonggi => "GYEONGGI",
        Gangwon => "GANGWON",
        Chungbuk => "CHUNGBUK",
        Chungnam => "CHUNGNAM",
        Jeonbuk => "JEONBUK",
        Jeonnam => "JEONNAM",
        Gyeongbuk => "GYEONGBUK",
        Gyeongnam => "GYEONGNAM",
        Jeju => "JEJU",
    }
);

labeled_enum!(Role {
    User => "ROLE_USER",
    Admin => "ROLE_ADMIN",
});

labeled_enum!(
    /// Chat event kind carried by every stored message.
    MessageType {
        Enter => "ENTER",
        Talk => "TALK",
        Leave => "LEAVE",
        Image => "IMAGE",
    }
);

labeled_enum!(ProfileVisibility {
    Public => "PUBLIC",
    CrewOnly => "CREW_ONLY",
    Private => "PRIVATE",
});

/// Creation/update timestamps embedded in every persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored timestamps keep microsecond precision.
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl Audit {
    pub fn new() -> Self {
        let now = now_micros();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_micros().max(self.created_at);
    }
}

impl Default for Audit {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered member as stored.
///
/// `password` holds an Argon2 PHC string and `phone_number` holds the
/// base64 field ciphertext; neither is ever plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub password: String,
    pub phone_number: String,
    pub name: String,
    pub nick_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<Region>,
    pub roles: Vec<Role>,
    pub profile_image_url: Option<String>,
    pub visibility: ProfileVisibility,
    pub audit: Audit,
}

/// Fields required to build a new [`Member`]. Secrets must already be
/// hashed/encrypted by the caller.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: String,
    pub password_hash: String,
    pub phone_cipher: String,
    pub name: String,
    pub nick_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub activity_region: Option<Region>,
    pub profile_image_url: Option<String>,
}

impl Member {
    pub fn new(fields: NewMember) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: fields.email,
            email_verified: false,
            password: fields.password_hash,
            phone_number: fields.phone_cipher,
            name: fields.name,
            nick_name: fields.nick_name,
            gender: fields.gender,
            birth_year: fields.birth_year,
            activity_region: fields.activity_region,
            roles: vec![Role::User],
            profile_image_url: fields.profile_image_url,
            visibility: ProfileVisibility::Public,
            audit: Audit::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crew {
    pub id: Uuid,
    pub crew_name: String,
    pub activity_region: Option<Region>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    /// `None` means the crew accepts any gender.
    pub gender: Option<Gender>,
    pub run_record_open: bool,
    pub leader_required: bool,
    pub audit: Audit,
}

impl Crew {
    pub fn new(
        crew_name: String,
        activity_region: Option<Region>,
        min_age: Option<i32>,
        max_age: Option<i32>,
        gender: Option<Gender>,
        run_record_open: bool,
        leader_required: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            crew_name,
            activity_region,
            min_age,
            max_age,
            gender,
            run_record_open,
            leader_required,
            audit: Audit::new(),
        }
    }
}

/// A persisted chat event. Messages are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub image_url: Option<String>,
    pub audit: Audit,
}

impl Message {
    pub fn new(message_type: MessageType, content: String, image_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type,
            content,
            image_url,
            audit: Audit::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub run_date: NaiveDate,
    pub audit: Audit,
}

impl RunRecord {
    pub fn new(
        member_id: Uuid,
        distance_meters: u32,
        duration_seconds: u32,
        run_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            distance_meters,
            duration_seconds,
            run_date,
            audit: Audit::new(),
        }
    }
}
