use crate::{
    db::DbPool,
    entities::{
        customer_request::{self, RequestStatus},
        inventory,
        order::{self, OrderStatus},
        order_part, part, partner,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::ledger,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewOrder {
    pub partner_id: i32,
    pub part_id: i32,
    pub location_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub poll: String,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub case_id: Option<String>,
    pub call_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StatusChange {
    pub status: OrderStatus,
    /// Optionally moves the linked customer request in the same commit
    pub customer_status: Option<RequestStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EditOrderPart {
    pub part_id: i32,
    pub location_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub poll: String,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: order::Model,
    pub part_line: Option<order_part::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreation {
    pub order: order::Model,
    pub part_line: order_part::Model,
    pub request: customer_request::Model,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDeletion {
    pub order_id: i32,
    pub stock_reversed: bool,
}

/// Formats a sequence number under an invoice prefix, zero-padded to
/// five digits.
pub(crate) fn format_invoice(prefix: &str, seq: u32) -> String {
    format!("{}{:05}", prefix, seq)
}

/// Next invoice id under the prefix: one past the suffix of the latest
/// order on file. The sequence follows live rows, so deleting the newest
/// order frees its number for the next creation.
pub(crate) async fn next_invoice_id<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
) -> Result<String, ServiceError> {
    let latest = order::Entity::find()
        .filter(order::Column::InvoiceId.starts_with(prefix))
        .order_by_desc(order::Column::Id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let seq = match latest {
        Some(row) => row.invoice_id[prefix.len()..].parse::<u32>().unwrap_or(0) + 1,
        None => 1,
    };
    Ok(format_invoice(prefix, seq))
}

pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    invoice_prefix: String,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, invoice_prefix: String) -> Self {
        Self {
            db_pool,
            event_sender,
            invoice_prefix,
        }
    }

    /// Creates a direct order: stock is loaned out of the chosen lot, an
    /// invoice id is issued, and a pre-approved customer request is
    /// recorded alongside so every order has a paper trail.
    #[instrument(skip(self, input), fields(partner_id = input.partner_id, part_id = input.part_id, qty = input.qty))]
    pub async fn create_order(&self, input: NewOrder) -> Result<OrderCreation, ServiceError> {
        input.validate()?;

        let prefix = self.invoice_prefix.clone();
        let creation = self
            .db_pool
            .transaction::<_, OrderCreation, ServiceError>(move |txn| {
                Box::pin(async move {
                    partner::Entity::find_by_id(input.partner_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Partner {} not found",
                                input.partner_id
                            ))
                        })?;

                    let part = part::Entity::find_by_id(input.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", input.part_id))
                        })?;

                    let inventory = inventory::Entity::find()
                        .filter(inventory::Column::PartId.eq(input.part_id))
                        .filter(inventory::Column::LocationId.eq(input.location_id))
                        .filter(inventory::Column::Poll.eq(input.poll.as_str()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InsufficientStock(format!(
                                "No stock of part {} at location {} lot '{}'",
                                input.part_id, input.location_id, input.poll
                            ))
                        })?;

                    let (_, inventory) = ledger::loan_out(txn, part, inventory, input.qty).await?;

                    let invoice_id = next_invoice_id(txn, &prefix).await?;
                    let order = order::ActiveModel {
                        invoice_id: Set(invoice_id),
                        partner_id: Set(input.partner_id),
                        status: Set(OrderStatus::Open),
                        qty: Set(input.qty),
                        case_id: Set(input.case_id.clone()),
                        call_date: Set(input.call_date),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let request = customer_request::ActiveModel {
                        partner_id: Set(input.partner_id),
                        status: Set(RequestStatus::Approved),
                        order_id: Set(Some(order.id)),
                        case_id: Set(input.case_id),
                        call_date: Set(input.call_date),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    crate::entities::customer_requested_part::ActiveModel {
                        customer_request_id: Set(request.id),
                        part_id: Set(input.part_id),
                        qty: Set(input.qty),
                        description: Set(input.description.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let part_line = order_part::ActiveModel {
                        order_id: Set(order.id),
                        inventory_id: Set(inventory.id),
                        part_id: Set(input.part_id),
                        qty: Set(input.qty),
                        description: Set(input.description),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(OrderCreation {
                        order,
                        part_line,
                        request,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Created order {} (invoice {}) for partner {}",
            creation.order.id, creation.order.invoice_id, creation.order.partner_id
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OrderCreated {
                order_id: creation.order.id,
                request_id: creation.request.id,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(creation)
    }

    pub async fn get_order(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let found = order::Entity::find_by_id(id)
            .find_also_related(order_part::Entity)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        Ok(OrderDetail {
            order: found.0,
            part_line: found.1,
        })
    }

    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
        partner_id: Option<i32>,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find().order_by_asc(order::Column::Id);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(partner_id) = partner_id {
            query = query.filter(order::Column::PartnerId.eq(partner_id));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }

    /// Moves an order to a new status. Stock moves on exactly two edges:
    /// leaving InTransit into a returned-class status puts the loaned
    /// quantity back, and re-entering InTransit from a returned-class
    /// status lends it out again. Every other transition only relabels.
    /// Entering a terminal status stamps the close date; leaving one
    /// clears it.
    #[instrument(skip(self, input), fields(status = %input.status))]
    pub async fn change_status(
        &self,
        id: i32,
        input: StatusChange,
    ) -> Result<OrderDetail, ServiceError> {
        let (detail, old_status) = self
            .db_pool
            .transaction::<_, (OrderDetail, OrderStatus), ServiceError>(move |txn| {
                Box::pin(async move {
                    let order = order::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", id))
                        })?;

                    let old_status = order.status;
                    let new_status = input.status;

                    let mut part_line = None;
                    if old_status == OrderStatus::InTransit && new_status.is_stock_returned() {
                        let line = find_part_line(txn, order.id).await?;
                        let (part, inventory) = load_line_stock(txn, &line).await?;
                        ledger::put_back(txn, part, inventory, line.qty).await?;
                        part_line = Some(line);
                    } else if old_status.is_stock_returned() && new_status == OrderStatus::InTransit
                    {
                        let line = find_part_line(txn, order.id).await?;
                        let (part, inventory) = load_line_stock(txn, &line).await?;
                        ledger::lend_again(txn, part, inventory, line.qty).await?;
                        part_line = Some(line);
                    }

                    if let Some(customer_status) = input.customer_status {
                        let request = customer_request::Entity::find()
                            .filter(customer_request::Column::OrderId.eq(order.id))
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?
                            .ok_or_else(|| {
                                ServiceError::NotFound(format!(
                                    "No customer request linked to order {}",
                                    order.id
                                ))
                            })?;
                        if request.status.is_final() {
                            return Err(ServiceError::Conflict(format!(
                                "Request {} is already {} and cannot change",
                                request.id, request.status
                            )));
                        }
                        let request_id = request.id;
                        let mut active: customer_request::ActiveModel = request.into();
                        active.status = Set(customer_status);
                        active.updated_at = Set(Some(Utc::now()));
                        active.update(txn).await.map_err(ServiceError::db_error)?;
                        info!(
                            "Request {} moved to {} alongside order {}",
                            request_id, customer_status, id
                        );
                    }

                    let mut active: order::ActiveModel = order.into();
                    active.status = Set(new_status);
                    active.close_date = Set(if new_status.is_terminal() {
                        Some(Utc::now())
                    } else {
                        None
                    });
                    active.updated_at = Set(Some(Utc::now()));
                    let order = active.update(txn).await.map_err(ServiceError::db_error)?;

                    let part_line = match part_line {
                        Some(line) => Some(line),
                        None => order_part::Entity::find()
                            .filter(order_part::Column::OrderId.eq(order.id))
                            .one(txn)
                            .await
                            .map_err(ServiceError::db_error)?,
                    };

                    Ok((OrderDetail { order, part_line }, old_status))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Order {} moved from {} to {}",
            id, old_status, detail.order.status
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                old_status,
                new_status: detail.order.status,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(detail)
    }

    /// Repoints an order's part line at a different part, lot or
    /// quantity. The old loan is unwound first, then the new one is
    /// taken out, so counters on both parts land exactly where a delete
    /// plus re-create would have put them.
    #[instrument(skip(self, input), fields(part_id = input.part_id, qty = input.qty))]
    pub async fn edit_order_part(
        &self,
        id: i32,
        input: EditOrderPart,
    ) -> Result<OrderDetail, ServiceError> {
        input.validate()?;

        let (detail, old_part_id, old_qty) = self
            .db_pool
            .transaction::<_, (OrderDetail, i32, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    let order = order::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", id))
                        })?;

                    let line = find_part_line(txn, order.id).await?;
                    let old_part_id = line.part_id;
                    let old_qty = line.qty;

                    let (old_part, old_inventory) = load_line_stock(txn, &line).await?;
                    ledger::unwind_loan(txn, old_part, old_inventory, old_qty).await?;

                    // Re-read after the unwind so an edit within the same
                    // part or lot sees the freed stock.
                    let new_part = part::Entity::find_by_id(input.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", input.part_id))
                        })?;
                    let new_inventory = inventory::Entity::find()
                        .filter(inventory::Column::PartId.eq(input.part_id))
                        .filter(inventory::Column::LocationId.eq(input.location_id))
                        .filter(inventory::Column::Poll.eq(input.poll.as_str()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InsufficientStock(format!(
                                "No stock of part {} at location {} lot '{}'",
                                input.part_id, input.location_id, input.poll
                            ))
                        })?;
                    let (_, new_inventory) =
                        ledger::loan_out(txn, new_part, new_inventory, input.qty).await?;

                    let mut active: order_part::ActiveModel = line.into();
                    active.inventory_id = Set(new_inventory.id);
                    active.part_id = Set(input.part_id);
                    active.qty = Set(input.qty);
                    if let Some(description) = input.description {
                        active.description = Set(Some(description));
                    }
                    let line = active.update(txn).await.map_err(ServiceError::db_error)?;

                    let mut active: order::ActiveModel = order.into();
                    active.qty = Set(input.qty);
                    active.updated_at = Set(Some(Utc::now()));
                    let order = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok((
                        OrderDetail {
                            order,
                            part_line: Some(line),
                        },
                        old_part_id,
                        old_qty,
                    ))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Order {} part line moved from part {} x{} to part {} x{}",
            id,
            old_part_id,
            old_qty,
            detail.order.qty,
            detail
                .part_line
                .as_ref()
                .map(|l| l.part_id)
                .unwrap_or_default()
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OrderPartEdited {
                order_id: id,
                part_id: old_part_id,
                old_qty,
                new_qty: detail.order.qty,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(detail)
    }

    /// Deletes an order. A reconciled order (returned, cancelled or
    /// closed) leaves the counters alone; deleting one still out in the
    /// field reverses its loan first. The linked customer request is
    /// kept but unlinked.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: i32) -> Result<OrderDeletion, ServiceError> {
        let deletion = self
            .db_pool
            .transaction::<_, OrderDeletion, ServiceError>(move |txn| {
                Box::pin(async move {
                    let order = order::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Order {} not found", id))
                        })?;

                    let line = order_part::Entity::find()
                        .filter(order_part::Column::OrderId.eq(order.id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    let mut stock_reversed = false;
                    if !order.status.is_reconciled() {
                        if let Some(ref line) = line {
                            let (part, inventory) = load_line_stock(txn, line).await?;
                            ledger::unwind_loan(txn, part, inventory, line.qty).await?;
                            stock_reversed = true;
                        }
                    }

                    if let Some(request) = customer_request::Entity::find()
                        .filter(customer_request::Column::OrderId.eq(order.id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                    {
                        let mut active: customer_request::ActiveModel = request.into();
                        active.order_id = Set(None);
                        active.updated_at = Set(Some(Utc::now()));
                        active.update(txn).await.map_err(ServiceError::db_error)?;
                    }

                    if let Some(line) = line {
                        order_part::Entity::delete_by_id(line.id)
                            .exec(txn)
                            .await
                            .map_err(ServiceError::db_error)?;
                    }
                    order::Entity::delete_by_id(order.id)
                        .exec(txn)
                        .await
                        .map_err(ServiceError::db_error)?;

                    Ok(OrderDeletion {
                        order_id: id,
                        stock_reversed,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Deleted order {} (stock reversed: {})",
            deletion.order_id, deletion.stock_reversed
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OrderDeleted {
                order_id: deletion.order_id,
                stock_reversed: deletion.stock_reversed,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(deletion)
    }
}

async fn find_part_line<C: ConnectionTrait>(
    conn: &C,
    order_id: i32,
) -> Result<order_part::Model, ServiceError> {
    order_part::Entity::find()
        .filter(order_part::Column::OrderId.eq(order_id))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} has no part line", order_id)))
}

async fn load_line_stock<C: ConnectionTrait>(
    conn: &C,
    line: &order_part::Model,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let part = part::Entity::find_by_id(line.part_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("Part {} not found", line.part_id)))?;
    let inventory = inventory::Entity::find_by_id(line.inventory_id)
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Inventory {} not found", line.inventory_id))
        })?;
    Ok((part, inventory))
}
