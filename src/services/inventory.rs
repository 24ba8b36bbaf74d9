use crate::{
    config::BulkAtomicity,
    db::DbPool,
    entities::{inventory, inventory_log, location, order_part, part},
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceiveStock {
    pub part_id: i32,
    pub location_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub poll: String,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub event_no: Option<String>,
    pub remarks: Option<String>,
}

/// One line of a bulk receipt. Parts and locations are addressed by name
/// here and created on the fly when missing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkReceiveItem {
    #[validate(length(min = 1, max = 255))]
    pub part_name: String,
    #[validate(length(min = 1, max = 64))]
    pub rack: String,
    #[validate(length(min = 1, max = 64))]
    pub poll: String,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub event_no: Option<String>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkReceive {
    #[validate(length(min = 1))]
    pub items: Vec<BulkReceiveItem>,
    /// Overrides the configured atomicity for this request
    pub atomicity: Option<BulkAtomicity>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SetQuantity {
    #[validate(range(min = 0))]
    pub qty: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateLog {
    #[validate(range(min = 0))]
    pub added_qty: i32,
    pub event_no: Option<String>,
    pub remarks: Option<String>,
}

/// Post-commit state of the rows touched by one receipt.
#[derive(Debug, Serialize, ToSchema)]
pub struct StockReceipt {
    pub part: part::Model,
    pub inventory: inventory::Model,
    pub log: inventory_log::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkItemFailure {
    pub index: usize,
    pub part_name: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkReceiveReport {
    pub received: Vec<StockReceipt>,
    pub failures: Vec<BulkItemFailure>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryDetail {
    pub inventory: inventory::Model,
    pub logs: Vec<inventory_log::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryUpdate {
    pub inventory: inventory::Model,
    pub part: part::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogCorrection {
    pub log: inventory_log::Model,
    pub inventory: inventory::Model,
    pub part: part::Model,
}

/// Part and location ids resolved up front for a bulk receipt, so two
/// items naming the same new part cannot race to create it twice.
#[derive(Debug, Clone)]
struct BulkCatalog {
    part_ids: HashMap<String, i32>,
    location_ids: HashMap<String, i32>,
}

pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    default_atomicity: BulkAtomicity,
}

impl InventoryService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        default_atomicity: BulkAtomicity,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            default_atomicity,
        }
    }

    /// Books a single receipt: part totals up, lot quantity up, one log
    /// row appended. All writes commit or roll back together.
    #[instrument(skip(self, input), fields(part_id = input.part_id, qty = input.qty))]
    pub async fn receive(&self, input: ReceiveStock) -> Result<StockReceipt, ServiceError> {
        input.validate()?;

        let receipt = self
            .db_pool
            .transaction::<_, StockReceipt, ServiceError>(move |txn| {
                Box::pin(async move {
                    let part = part::Entity::find_by_id(input.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", input.part_id))
                        })?;

                    location::Entity::find_by_id(input.location_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Location {} not found",
                                input.location_id
                            ))
                        })?;

                    let (part, inventory) =
                        ledger::receive(txn, part, input.location_id, &input.poll, input.qty)
                            .await?;

                    let log = inventory_log::ActiveModel {
                        inventory_id: Set(inventory.id),
                        added_qty: Set(input.qty),
                        event_no: Set(input.event_no),
                        remarks: Set(input.remarks),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(StockReceipt {
                        part,
                        inventory,
                        log,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Received {} units of part {} into inventory {}",
            receipt.log.added_qty, receipt.part.id, receipt.inventory.id
        );
        self.publish_receipt_event(&receipt).await;
        Ok(receipt)
    }

    /// Bulk receipt. Part and location rows are pre-resolved by name;
    /// per-item processing then follows the single-receipt sequence. The
    /// atomicity mode decides whether one failure rolls back the whole
    /// batch or only its own item.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn receive_bulk(&self, input: BulkReceive) -> Result<BulkReceiveReport, ServiceError> {
        input.validate()?;
        let mode = input.atomicity.unwrap_or(self.default_atomicity);

        let report = match mode {
            BulkAtomicity::WholeBatch => {
                // One bad item rejects the whole batch before anything is written
                for item in &input.items {
                    item.validate()?;
                }
                self.receive_bulk_atomic(input.items).await?
            }
            BulkAtomicity::PerItem => self.receive_bulk_per_item(input.items).await?,
        };

        info!(
            "Bulk receipt finished: {} received, {} failed",
            report.received.len(),
            report.failures.len()
        );
        for receipt in &report.received {
            self.publish_receipt_event(receipt).await;
        }
        Ok(report)
    }

    async fn receive_bulk_atomic(
        &self,
        items: Vec<BulkReceiveItem>,
    ) -> Result<BulkReceiveReport, ServiceError> {
        self.db_pool
            .transaction::<_, BulkReceiveReport, ServiceError>(move |txn| {
                Box::pin(async move {
                    let catalog = resolve_catalog(txn, &items).await?;
                    let mut received = Vec::with_capacity(items.len());
                    for item in items {
                        received.push(apply_bulk_item(txn, &catalog, item).await?);
                    }
                    Ok(BulkReceiveReport {
                        received,
                        failures: Vec::new(),
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    async fn receive_bulk_per_item(
        &self,
        items: Vec<BulkReceiveItem>,
    ) -> Result<BulkReceiveReport, ServiceError> {
        // Invalid items go straight into the failure report; only valid
        // ones take part in catalog resolution and application.
        let mut failures = Vec::new();
        let mut valid = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match item.validate() {
                Ok(()) => valid.push((index, item)),
                Err(e) => failures.push(BulkItemFailure {
                    index,
                    part_name: item.part_name.clone(),
                    message: ServiceError::from(e).response_message(),
                }),
            }
        }

        // The pre-resolution commits on its own so every item sees one
        // shared set of part/location rows.
        let catalog = {
            let items: Vec<BulkReceiveItem> =
                valid.iter().map(|(_, item)| item.clone()).collect();
            self.db_pool
                .transaction::<_, BulkCatalog, ServiceError>(move |txn| {
                    Box::pin(async move { resolve_catalog(txn, &items).await })
                })
                .await
                .map_err(|e| match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                })?
        };

        let mut received = Vec::new();
        for (index, item) in valid {
            let part_name = item.part_name.clone();
            let catalog = catalog.clone();
            let outcome = self
                .db_pool
                .transaction::<_, StockReceipt, ServiceError>(move |txn| {
                    Box::pin(async move { apply_bulk_item(txn, &catalog, item).await })
                })
                .await
                .map_err(|e| match e {
                    TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                    TransactionError::Transaction(service_err) => service_err,
                });

            match outcome {
                Ok(receipt) => received.push(receipt),
                Err(err) => {
                    warn!("Bulk receipt item {} '{}' failed: {}", index, part_name, err);
                    failures.push(BulkItemFailure {
                        index,
                        part_name,
                        message: err.response_message(),
                    });
                }
            }
        }

        Ok(BulkReceiveReport { received, failures })
    }

    pub async fn list_inventory(
        &self,
        page: u64,
        limit: u64,
        part_id: Option<i32>,
        location_id: Option<i32>,
    ) -> Result<(Vec<inventory::Model>, u64), ServiceError> {
        let mut query = inventory::Entity::find().order_by_asc(inventory::Column::Id);
        if let Some(part_id) = part_id {
            query = query.filter(inventory::Column::PartId.eq(part_id));
        }
        if let Some(location_id) = location_id {
            query = query.filter(inventory::Column::LocationId.eq(location_id));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    pub async fn get_inventory(&self, id: i32) -> Result<InventoryDetail, ServiceError> {
        let db = self.db_pool.as_ref();
        let inventory = inventory::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory {} not found", id)))?;

        let logs = inventory_log::Entity::find()
            .filter(inventory_log::Column::InventoryId.eq(id))
            .order_by_asc(inventory_log::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(InventoryDetail { inventory, logs })
    }

    /// Sets a lot to an absolute quantity. The difference to the current
    /// value flows into the part's total and available counters.
    #[instrument(skip(self, input), fields(qty = input.qty))]
    pub async fn set_quantity(
        &self,
        id: i32,
        input: SetQuantity,
    ) -> Result<InventoryUpdate, ServiceError> {
        input.validate()?;

        let (update, old_qty) = self
            .db_pool
            .transaction::<_, (InventoryUpdate, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let inventory = inventory::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Inventory {} not found", id))
                        })?;

                    let part = part::Entity::find_by_id(inventory.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", inventory.part_id))
                        })?;

                    let old_qty = inventory.qty;
                    let delta = input.qty - old_qty;
                    let (part, inventory) =
                        ledger::shift_totals(txn, part, inventory, delta).await?;

                    Ok((InventoryUpdate { inventory, part }, old_qty))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::InventoryQuantitySet {
                inventory_id: update.inventory.id,
                old_qty,
                new_qty: update.inventory.qty,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(update)
    }

    /// Removes a lot row. Rejected while order lines or receipt logs
    /// still reference it; any residual quantity is taken back out of the
    /// part's totals.
    #[instrument(skip(self))]
    pub async fn delete_inventory(&self, id: i32) -> Result<(), ServiceError> {
        self.db_pool
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    let inventory = inventory::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Inventory {} not found", id))
                        })?;

                    let order_refs = order_part::Entity::find()
                        .filter(order_part::Column::InventoryId.eq(id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if order_refs > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Inventory {} is referenced by {} order line(s)",
                            id, order_refs
                        )));
                    }

                    let log_refs = inventory_log::Entity::find()
                        .filter(inventory_log::Column::InventoryId.eq(id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if log_refs > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Inventory {} still has {} receipt log(s); remove those first",
                            id, log_refs
                        )));
                    }

                    if inventory.qty > 0 {
                        let part = part::Entity::find_by_id(inventory.part_id)
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "Part {} not found",
                                    inventory.part_id
                                ))
                            })?;
                        ledger::update_part_counters(
                            txn,
                            part,
                            -inventory.qty,
                            -inventory.qty,
                            0,
                            0,
                        )
                        .await?;
                    }

                    inventory::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    Ok(())
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self.event_sender.send(Event::InventoryRowDeleted(id)).await {
            error!("Failed to publish event: {}", e);
        }
        Ok(())
    }

    /// Corrects a receipt log. The difference between the old and new
    /// `added_qty` flows into the lot quantity and the part totals.
    #[instrument(skip(self, input), fields(added_qty = input.added_qty))]
    pub async fn update_log(
        &self,
        log_id: i32,
        input: UpdateLog,
    ) -> Result<LogCorrection, ServiceError> {
        input.validate()?;

        let (correction, old_qty) = self
            .db_pool
            .transaction::<_, (LogCorrection, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let log = inventory_log::Entity::find_by_id(log_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Inventory log {} not found", log_id))
                        })?;

                    let inventory = inventory::Entity::find_by_id(log.inventory_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Inventory {} not found",
                                log.inventory_id
                            ))
                        })?;

                    let part = part::Entity::find_by_id(inventory.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", inventory.part_id))
                        })?;

                    let old_qty = log.added_qty;
                    let delta = input.added_qty - old_qty;
                    let (part, inventory) =
                        ledger::shift_totals(txn, part, inventory, delta).await?;

                    let mut active: inventory_log::ActiveModel = log.into();
                    active.added_qty = Set(input.added_qty);
                    if let Some(event_no) = input.event_no {
                        active.event_no = Set(Some(event_no));
                    }
                    if let Some(remarks) = input.remarks {
                        active.remarks = Set(Some(remarks));
                    }
                    let log = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok((
                        LogCorrection {
                            log,
                            inventory,
                            part,
                        },
                        old_qty,
                    ))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::InventoryLogUpdated {
                log_id: correction.log.id,
                old_qty,
                new_qty: correction.log.added_qty,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(correction)
    }

    /// Removes a receipt log, taking its quantity back out of the lot and
    /// the part totals. Consumed stock cannot be un-received: the delete
    /// is rejected while any order line draws on the lot, or when the
    /// removal would drive a quantity negative.
    #[instrument(skip(self))]
    pub async fn delete_log(&self, log_id: i32) -> Result<InventoryUpdate, ServiceError> {
        let update = self
            .db_pool
            .transaction::<_, InventoryUpdate, ServiceError>(move |txn| {
                Box::pin(async move {
                    let log = inventory_log::Entity::find_by_id(log_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Inventory log {} not found", log_id))
                        })?;

                    let inventory = inventory::Entity::find_by_id(log.inventory_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Inventory {} not found",
                                log.inventory_id
                            ))
                        })?;

                    let order_refs = order_part::Entity::find()
                        .filter(order_part::Column::InventoryId.eq(inventory.id))
                        .count(txn)
                        .await
                        .map_err(ServiceError::db_error)?;
                    if order_refs > 0 {
                        return Err(ServiceError::Conflict(format!(
                            "Inventory {} is consumed by {} order line(s); its logs cannot be deleted",
                            inventory.id, order_refs
                        )));
                    }

                    if inventory.qty < log.added_qty {
                        return Err(ServiceError::Conflict(format!(
                            "Removing log {} would drive inventory {} negative ({} - {})",
                            log.id, inventory.id, inventory.qty, log.added_qty
                        )));
                    }

                    let part = part::Entity::find_by_id(inventory.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", inventory.part_id))
                        })?;
                    if part.available_qty < log.added_qty {
                        return Err(ServiceError::Conflict(format!(
                            "Removing log {} would drive part '{}' available_qty negative",
                            log.id, part.name
                        )));
                    }

                    let (part, inventory) =
                        ledger::shift_totals(txn, part, inventory, -log.added_qty).await?;

                    inventory_log::Entity::delete_by_id(log.id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(InventoryUpdate { inventory, part })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        if let Err(e) = self
            .event_sender
            .send(Event::InventoryLogDeleted(log_id))
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(update)
    }

    async fn publish_receipt_event(&self, receipt: &StockReceipt) {
        if let Err(e) = self
            .event_sender
            .send(Event::InventoryReceived {
                part_id: receipt.part.id,
                location_id: receipt.inventory.location_id,
                qty: receipt.log.added_qty,
                log_id: receipt.log.id,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
    }
}

/// Resolves or creates the part and location rows a batch refers to by
/// name. Returns id maps keyed by the names as given.
async fn resolve_catalog<C: ConnectionTrait>(
    conn: &C,
    items: &[BulkReceiveItem],
) -> Result<BulkCatalog, ServiceError> {
    let mut part_ids = HashMap::new();
    let mut location_ids = HashMap::new();

    for item in items {
        if !part_ids.contains_key(&item.part_name) {
            let existing = part::Entity::find()
                .filter(part::Column::Name.eq(item.part_name.as_str()))
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?;
            let id = match existing {
                Some(row) => row.id,
                None => {
                    part::ActiveModel {
                        name: Set(item.part_name.clone()),
                        total_qty: Set(0),
                        available_qty: Set(0),
                        loan_qty: Set(0),
                        sell: Set(0),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(conn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .id
                }
            };
            part_ids.insert(item.part_name.clone(), id);
        }

        if !location_ids.contains_key(&item.rack) {
            let existing = location::Entity::find()
                .filter(location::Column::Rack.eq(item.rack.as_str()))
                .one(conn)
                .await
                .map_err(ServiceError::db_error)?;
            let id = match existing {
                Some(row) => row.id,
                None => {
                    location::ActiveModel {
                        rack: Set(item.rack.clone()),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(conn)
                    .await
                    .map_err(ServiceError::db_error)?
                    .id
                }
            };
            location_ids.insert(item.rack.clone(), id);
        }
    }

    Ok(BulkCatalog {
        part_ids,
        location_ids,
    })
}

/// Runs the single-receipt sequence for one batch item against the
/// pre-resolved catalog. The part row is re-read here so items sharing a
/// part each see the previous item's counters.
async fn apply_bulk_item<C: ConnectionTrait>(
    conn: &C,
    catalog: &BulkCatalog,
    item: BulkReceiveItem,
) -> Result<StockReceipt, ServiceError> {
    let part_id = *catalog.part_ids.get(&item.part_name).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Part '{}' missing from batch pre-resolution",
            item.part_name
        ))
    })?;
    let location_id = *catalog.location_ids.get(&item.rack).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "Location '{}' missing from batch pre-resolution",
            item.rack
        ))
    })?;

    let part = part::Entity::find_by_id(part_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", part_id)))?;

    let (part, inventory) = ledger::receive(conn, part, location_id, &item.poll, item.qty).await?;

    let log = inventory_log::ActiveModel {
        inventory_id: Set(inventory.id),
        added_qty: Set(item.qty),
        event_no: Set(item.event_no),
        remarks: Set(item.remarks),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(ServiceError::db_error)?;

    Ok(StockReceipt {
        part,
        inventory,
        log,
    })
}
