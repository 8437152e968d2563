use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use runcrew_db::{CrewRepository, Database};
use runcrew_types::api::{CreateCrewRequest, CrewFilter, CrewResponse, Page, PageRequest};
use runcrew_types::models::Crew;

use crate::error::{ErrorCode, ServiceError, ServiceResult};

pub struct CrewService {
    db: Arc<Database>,
}

impl CrewService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn register_crew(&self, req: CreateCrewRequest) -> ServiceResult<CrewResponse> {
        req.validate().map_err(ServiceError::Validation)?;

        let crew = self.db.transaction(|conn| {
            if conn.exists_by_crew_name(&req.crew_name)? {
                return Err(ServiceError::from(ErrorCode::AlreadyExistCrew));
            }

            let crew = Crew::new(
                req.crew_name,
                req.activity_region,
                req.min_age,
                req.max_age,
                req.gender,
                req.run_record_open,
                req.leader_required,
            );
            conn.insert_crew(&crew).map_err(ServiceError::from_store)?;
            Ok(crew)
        })?;

        info!("Crew {} registered as '{}'", crew.id, crew.crew_name);
        Ok(crew.into())
    }

    pub fn get_crew(&self, id: Uuid) -> ServiceResult<CrewResponse> {
        let crew = self
            .db
            .with_conn(|conn| conn.find_crew_by_id(id))?
            .ok_or(ErrorCode::NotFoundCrew)?;
        Ok(crew.into())
    }

    /// Page through crews matching every filter that is set. Results come
    /// back in registration order.
    pub fn find_crews(
        &self,
        filter: &CrewFilter,
        page: PageRequest,
    ) -> ServiceResult<Page<CrewResponse>> {
        let crews = self.db.with_conn(|conn| conn.find_crews(filter, page))?;
        debug!(
            "Crew search {:?} page {} matched {} crews",
            filter, page.page(), crews.total_elements
        );
        Ok(crews.map(CrewResponse::from))
    }
}
