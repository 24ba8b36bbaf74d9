use crate::{
    db::DbPool,
    entities::location,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionError, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateLocation {
    #[validate(length(min = 1, max = 64))]
    pub rack: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkCreateLocations {
    #[validate(length(min = 1))]
    pub racks: Vec<String>,
}

pub struct LocationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl LocationService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(rack = %input.rack))]
    pub async fn create_location(
        &self,
        input: CreateLocation,
    ) -> Result<location::Model, ServiceError> {
        input.validate()?;
        let rack = input.rack.clone();

        let location = location::ActiveModel {
            rack: Set(input.rack),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict(format!("Location with rack '{}' already exists", rack))
            }
            _ => ServiceError::db_error(e),
        })?;

        info!("Created location {} rack '{}'", location.id, location.rack);
        if let Err(e) = self
            .event_sender
            .send(Event::LocationCreated(location.id))
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(location)
    }

    /// Creates any racks that do not exist yet and returns every row
    /// matching the requested names, existing ones included.
    #[instrument(skip(self, input), fields(racks = input.racks.len()))]
    pub async fn bulk_create_locations(
        &self,
        input: BulkCreateLocations,
    ) -> Result<Vec<location::Model>, ServiceError> {
        input.validate()?;

        let racks: Vec<String> = input
            .racks
            .into_iter()
            .map(|rack| rack.trim().to_string())
            .filter(|rack| !rack.is_empty())
            .collect();
        if racks.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one non-empty rack name is required".to_string(),
            ));
        }

        let (locations, created_ids) = self
            .db_pool
            .transaction::<_, (Vec<location::Model>, Vec<i32>), ServiceError>(move |txn| {
                Box::pin(async move {
                    let mut existing = location::Entity::find()
                        .filter(location::Column::Rack.is_in(racks.clone()))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut created_ids = Vec::new();
                    for rack in racks {
                        if existing.iter().any(|row| row.rack == rack) {
                            continue;
                        }
                        let row = location::ActiveModel {
                            rack: Set(rack),
                            created_at: Set(Utc::now()),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                        created_ids.push(row.id);
                        existing.push(row);
                    }

                    existing.sort_by_key(|row| row.id);
                    Ok((existing, created_ids))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!("Bulk location create added {} new rack(s)", created_ids.len());
        for id in created_ids {
            if let Err(e) = self.event_sender.send(Event::LocationCreated(id)).await {
                error!("Failed to publish event: {}", e);
            }
        }
        Ok(locations)
    }

    pub async fn list_locations(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<location::Model>, u64), ServiceError> {
        let paginator = location::Entity::find()
            .order_by_asc(location::Column::Id)
            .paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
