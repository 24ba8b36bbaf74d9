use crate::{
    db::DbPool,
    entities::{customer_requested_part, inventory, inventory_log, order_part, part, scrap},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePart {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub alternate_name: Option<String>,
    pub description: Option<String>,
}

/// Partial update of a part's descriptive fields. The quantity counters
/// are owned by the ledger and cannot be written here.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdatePart {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub alternate_name: Option<String>,
    pub description: Option<String>,
}

/// Row counts removed by a part cascade delete.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct PartDeleteSummary {
    pub inventory_logs: u64,
    pub order_parts: u64,
    pub requested_parts: u64,
    pub inventories: u64,
    pub scraps: u64,
}

pub struct PartService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl PartService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_part(&self, input: CreatePart) -> Result<part::Model, ServiceError> {
        input.validate()?;
        let name = input.name.clone();

        let part = part::ActiveModel {
            name: Set(input.name),
            alternate_name: Set(input.alternate_name),
            description: Set(input.description),
            total_qty: Set(0),
            available_qty: Set(0),
            loan_qty: Set(0),
            sell: Set(0),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::Conflict(format!("Part with name '{}' already exists", name))
            }
            _ => ServiceError::db_error(e),
        })?;

        info!("Created part {} '{}'", part.id, part.name);
        if let Err(e) = self.event_sender.send(Event::PartCreated(part.id)).await {
            error!("Failed to publish event: {}", e);
        }
        Ok(part)
    }

    pub async fn get_part(&self, id: i32) -> Result<part::Model, ServiceError> {
        part::Entity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", id)))
    }

    /// Paginated listing with an optional search over name and alternate
    /// name.
    pub async fn list_parts(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<part::Model>, u64), ServiceError> {
        let mut query = part::Entity::find().order_by_asc(part::Column::Id);

        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim());
            query = query.filter(
                Condition::any()
                    .add(part::Column::Name.like(pattern.as_str()))
                    .add(part::Column::AlternateName.like(pattern.as_str())),
            );
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_part(&self, id: i32, input: UpdatePart) -> Result<part::Model, ServiceError> {
        input.validate()?;
        let part = self.get_part(id).await?;
        let new_name = input.name.clone();

        let mut active: part::ActiveModel = part.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(alternate_name) = input.alternate_name {
            active.alternate_name = Set(Some(alternate_name));
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        active.updated_at = Set(Some(Utc::now()));

        let part = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                    "Part with name '{}' already exists",
                    new_name.unwrap_or_default()
                )),
                _ => ServiceError::db_error(e),
            })?;

        if let Err(e) = self.event_sender.send(Event::PartUpdated(part.id)).await {
            error!("Failed to publish event: {}", e);
        }
        Ok(part)
    }

    /// Deletes a part together with every dependent row. Runs as one
    /// transaction so a partial failure cannot orphan anything.
    #[instrument(skip(self))]
    pub async fn delete_part(&self, id: i32) -> Result<PartDeleteSummary, ServiceError> {
        let summary = self
            .db_pool
            .transaction::<_, PartDeleteSummary, ServiceError>(move |txn| {
                Box::pin(async move {
                    let part = part::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", id)))?;

                    let inventory_ids: Vec<i32> = inventory::Entity::find()
                        .filter(inventory::Column::PartId.eq(part.id))
                        .all(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .into_iter()
                        .map(|row| row.id)
                        .collect();

                    let logs = inventory_log::Entity::delete_many()
                        .filter(inventory_log::Column::InventoryId.is_in(inventory_ids))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let order_parts = order_part::Entity::delete_many()
                        .filter(order_part::Column::PartId.eq(part.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let requested_parts = customer_requested_part::Entity::delete_many()
                        .filter(customer_requested_part::Column::PartId.eq(part.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let inventories = inventory::Entity::delete_many()
                        .filter(inventory::Column::PartId.eq(part.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let scraps = scrap::Entity::delete_many()
                        .filter(scrap::Column::PartId.eq(part.id))
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    part::Entity::delete_by_id(part.id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(PartDeleteSummary {
                        inventory_logs: logs.rows_affected,
                        order_parts: order_parts.rows_affected,
                        requested_parts: requested_parts.rows_affected,
                        inventories: inventories.rows_affected,
                        scraps: scraps.rows_affected,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!("Deleted part {} and its dependent rows", id);
        if let Err(e) = self.event_sender.send(Event::PartDeleted(id)).await {
            error!("Failed to publish event: {}", e);
        }
        Ok(summary)
    }
}
