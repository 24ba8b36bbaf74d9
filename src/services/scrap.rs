use crate::{
    db::DbPool,
    entities::{part, scrap},
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set, TransactionError,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewScrap {
    pub part_id: i32,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub remarks: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScrapRecord {
    pub scrap: scrap::Model,
    pub part: part::Model,
}

/// Write-offs for parts damaged beyond repair. Scrapping reduces the
/// part's total and available counters without touching any lot, so the
/// loss shows up in the totals immediately.
pub struct ScrapService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ScrapService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(part_id = input.part_id, qty = input.qty))]
    pub async fn record_scrap(&self, input: NewScrap) -> Result<ScrapRecord, ServiceError> {
        input.validate()?;

        let record = self
            .db_pool
            .transaction::<_, ScrapRecord, ServiceError>(move |txn| {
                Box::pin(async move {
                    let part = part::Entity::find_by_id(input.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", input.part_id))
                        })?;

                    let part = ledger::write_off(txn, part, input.qty).await?;

                    let scrap = scrap::ActiveModel {
                        part_id: Set(input.part_id),
                        qty: Set(input.qty),
                        remarks: Set(input.remarks),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(ScrapRecord { scrap, part })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Scrapped {} units of part {}",
            record.scrap.qty, record.part.id
        );
        if let Err(e) = self
            .event_sender
            .send(Event::ScrapRecorded {
                scrap_id: record.scrap.id,
                part_id: record.part.id,
                qty: record.scrap.qty,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(record)
    }

    pub async fn list_scraps(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<scrap::Model>, u64), ServiceError> {
        let paginator = scrap::Entity::find()
            .order_by_asc(scrap::Column::Id)
            .paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
