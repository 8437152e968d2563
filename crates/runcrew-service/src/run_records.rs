use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use runcrew_db::{Database, MemberRepository, RunRecordRepository};
use runcrew_types::api::{NewRunRecordRequest, RunRecordResponse};
use runcrew_types::models::RunRecord;

use crate::error::{ErrorCode, ServiceError, ServiceResult};

pub struct RunRecordService {
    db: Arc<Database>,
}

impl RunRecordService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn record_run(
        &self,
        member_id: Uuid,
        req: NewRunRecordRequest,
    ) -> ServiceResult<RunRecordResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        let record = self.db.transaction(|conn| {
            if conn.find_member_by_id(member_id)?.is_none() {
                return Err(ServiceError::from(ErrorCode::NotFoundUser));
            }
            let record = RunRecord::new(
                member_id,
                req.distance_meters,
                req.duration_seconds,
                req.run_date,
            );
            conn.insert_run_record(&record)?;
            Ok(record)
        })?;

        Ok(record.into())
    }

    pub fn records_for_member(&self, member_id: Uuid) -> ServiceResult<Vec<RunRecordResponse>> {
        let records = self.db.transaction(|conn| {
            if conn.find_member_by_id(member_id)?.is_none() {
                return Err(ServiceError::from(ErrorCode::NotFoundUser));
            }
            Ok(conn.find_run_records_by_member(member_id)?)
        })?;
        Ok(records.into_iter().map(RunRecordResponse::from).collect())
    }

    pub fn delete_all_for_member(&self, member_id: Uuid) -> ServiceResult<usize> {
        let deleted = self
            .db
            .with_conn(|conn| conn.delete_all_run_records_by_member(member_id))?;
        info!("Deleted {} run records for member {}", deleted, member_id);
        Ok(deleted)
    }
}
