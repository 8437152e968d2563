use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use runcrew_db::{Database, MessageRepository};
use runcrew_types::api::{MessageResponse, NewMessageRequest};
use runcrew_types::models::Message;

use crate::error::{ServiceError, ServiceResult};

pub const MAX_HISTORY_LIMIT: u32 = 200;

/// Persistence for chat events. Delivery to connected clients lives
/// elsewhere; this only records and replays history.
pub struct MessageService {
    db: Arc<Database>,
}

impl MessageService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn record_message(&self, req: NewMessageRequest) -> ServiceResult<MessageResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        let image_url = req.image_url.filter(|url| !url.trim().is_empty());
        let message = Message::new(req.message_type, req.content, image_url);
        self.db.with_conn(|conn| conn.insert_message(&message))?;

        debug!("Recorded {} message {}", message.message_type, message.id);
        Ok(message.into())
    }

    /// Newest first. Pass the id of the oldest message already seen as
    /// `before` to fetch the previous page.
    pub fn recent_messages(
        &self,
        limit: u32,
        before: Option<Uuid>,
    ) -> ServiceResult<Vec<MessageResponse>> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let messages = self.db.with_conn(|conn| conn.recent_messages(limit, before))?;
        Ok(messages.into_iter().map(MessageResponse::from).collect())
    }
}
