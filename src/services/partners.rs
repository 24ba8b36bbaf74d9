use crate::{
    db::DbPool,
    entities::partner,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set, SqlErr,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePartner {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

pub struct PartnerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PartnerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_partner(
        &self,
        input: CreatePartner,
    ) -> Result<partner::Model, ServiceError> {
        input.validate()?;
        let email = input.email.clone();

        let partner = partner::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict(format!("Partner with email '{}' already exists", email))
            }
            _ => ServiceError::db_error(e),
        })?;

        info!("Created partner {} '{}'", partner.id, partner.name);
        if let Err(e) = self
            .event_sender
            .send(Event::PartnerCreated(partner.id))
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(partner)
    }

    pub async fn get_partner(&self, id: i32) -> Result<partner::Model, ServiceError> {
        partner::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Partner {} not found", id)))
    }

    pub async fn list_partners(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<partner::Model>, u64), ServiceError> {
        let paginator = partner::Entity::find()
            .order_by_asc(partner::Column::Id)
            .paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
