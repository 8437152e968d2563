//! Member, crew, chat-history and run-record services over the SQLite store.
//!
//! Every service method is synchronous and returns [`ServiceResult`]; the
//! [`ErrorCode`] of a failure is what an outer boundary should report.

pub mod auth;
pub mod config;
pub mod crews;
pub mod error;
pub mod members;
pub mod messages;
pub mod run_records;

use std::sync::Arc;

use anyhow::Result;

use runcrew_crypto::FieldCipher;
use runcrew_db::Database;

pub use auth::{Claims, TokenIssuer};
pub use config::ServiceConfig;
pub use crews::CrewService;
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use members::MemberService;
pub use messages::MessageService;
pub use run_records::RunRecordService;

/// All services wired to one database.
pub struct Services {
    pub members: MemberService,
    pub crews: CrewService,
    pub messages: MessageService,
    pub run_records: RunRecordService,
}

impl Services {
    pub fn open(config: &ServiceConfig) -> Result<Self> {
        let db = Arc::new(Database::open(&config.db_path)?);
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Arc<Database>, config: &ServiceConfig) -> Self {
        let cipher = FieldCipher::new(config.pii_key);
        let tokens = TokenIssuer::new(config.jwt_secret.clone(), config.token_ttl_hours);

        Self {
            members: MemberService::new(db.clone(), cipher, tokens),
            crews: CrewService::new(db.clone()),
            messages: MessageService::new(db.clone()),
            run_records: RunRecordService::new(db),
        }
    }
}
