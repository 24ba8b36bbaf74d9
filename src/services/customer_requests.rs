use crate::{
    db::DbPool,
    entities::{
        customer_request::{self, RequestStatus},
        customer_requested_part, inventory,
        order::{self, OrderStatus},
        order_part, part, partner,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{ledger, orders},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewRequest {
    pub partner_id: i32,
    pub part_id: i32,
    #[validate(range(min = 1))]
    pub qty: i32,
    pub case_id: Option<String>,
    pub call_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApproveRequest {
    pub location_id: i32,
    #[validate(length(min = 1, max = 64))]
    pub poll: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestDetail {
    pub request: customer_request::Model,
    pub requested_part: Option<customer_requested_part::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovedRequest {
    pub request: customer_request::Model,
    pub order: order::Model,
    pub part_line: order_part::Model,
}

/// Customer requests are the ask-first path into the ledger: a partner
/// asks for a part, and only approval moves stock and mints an order.
pub struct CustomerRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    invoice_prefix: String,
}

impl CustomerRequestService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, invoice_prefix: String) -> Self {
        Self {
            db_pool,
            event_sender,
            invoice_prefix,
        }
    }

    /// Records a pending request. No stock moves here.
    #[instrument(skip(self, input), fields(partner_id = input.partner_id, part_id = input.part_id))]
    pub async fn submit_request(&self, input: NewRequest) -> Result<RequestDetail, ServiceError> {
        input.validate()?;

        let detail = self
            .db_pool
            .transaction::<_, RequestDetail, ServiceError>(move |txn| {
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

                    part::Entity::find_by_id(input.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", input.part_id))
                        })?;

                    let request = customer_request::ActiveModel {
                        partner_id: Set(input.partner_id),
                        status: Set(RequestStatus::Pending),
                        case_id: Set(input.case_id),
                        call_date: Set(input.call_date),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let requested_part = customer_requested_part::ActiveModel {
                        customer_request_id: Set(request.id),
                        part_id: Set(input.part_id),
                        qty: Set(input.qty),
                        description: Set(input.description),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    Ok(RequestDetail {
                        request,
                        requested_part: Some(requested_part),
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Request {} submitted by partner {}",
            detail.request.id, detail.request.partner_id
        );
        if let Err(e) = self
            .event_sender
            .send(Event::RequestSubmitted(detail.request.id))
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(detail)
    }

    /// Approves a pending request: loans the requested quantity out of
    /// the chosen lot, mints an order with the next invoice id, and links
    /// it back to the request. Finalized requests cannot be approved.
    #[instrument(skip(self, input), fields(location_id = input.location_id))]
    pub async fn approve_request(
        &self,
        id: i32,
        input: ApproveRequest,
    ) -> Result<ApprovedRequest, ServiceError> {
        input.validate()?;

        let prefix = self.invoice_prefix.clone();
        let approved = self
            .db_pool
            .transaction::<_, ApprovedRequest, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = customer_request::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Request {} not found", id))
                        })?;

                    if request.status.is_final() {
                        return Err(ServiceError::Conflict(format!(
                            "Request {} is already {} and cannot change",
                            request.id, request.status
                        )));
                    }
                    if request.order_id.is_some() || request.status == RequestStatus::Approved {
                        return Err(ServiceError::Conflict(format!(
                            "Request {} is already approved",
                            request.id
                        )));
                    }

                    let requested = customer_requested_part::Entity::find()
                        .filter(customer_requested_part::Column::CustomerRequestId.eq(request.id))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "Request {} has no part line",
                                request.id
                            ))
                        })?;

                    let part = part::Entity::find_by_id(requested.part_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Part {} not found", requested.part_id))
                        })?;

                    let inventory = inventory::Entity::find()
                        .filter(inventory::Column::PartId.eq(requested.part_id))
                        .filter(inventory::Column::LocationId.eq(input.location_id))
                        .filter(inventory::Column::Poll.eq(input.poll.as_str()))
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::InsufficientStock(format!(
                                "No stock of part {} at location {} lot '{}'",
                                requested.part_id, input.location_id, input.poll
                            ))
                        })?;

                    let (_, inventory) =
                        ledger::loan_out(txn, part, inventory, requested.qty).await?;

                    let invoice_id = orders::next_invoice_id(txn, &prefix).await?;
                    let order = order::ActiveModel {
                        invoice_id: Set(invoice_id),
                        partner_id: Set(request.partner_id),
                        status: Set(OrderStatus::Open),
                        qty: Set(requested.qty),
                        case_id: Set(request.case_id.clone()),
                        call_date: Set(request.call_date),
                        created_at: Set(Utc::now()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let part_line = order_part::ActiveModel {
                        order_id: Set(order.id),
                        inventory_id: Set(inventory.id),
                        part_id: Set(requested.part_id),
                        qty: Set(requested.qty),
                        description: Set(requested.description.clone()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await
                    .map_err(ServiceError::db_error)?;

                    let mut active: customer_request::ActiveModel = request.into();
                    active.status = Set(RequestStatus::Approved);
                    active.order_id = Set(Some(order.id));
                    active.updated_at = Set(Some(Utc::now()));
                    let request = active.update(txn).await.map_err(ServiceError::db_error)?;

                    Ok(ApprovedRequest {
                        request,
                        order,
                        part_line,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            "Request {} approved; order {} (invoice {}) issued",
            approved.request.id, approved.order.id, approved.order.invoice_id
        );
        if let Err(e) = self
            .event_sender
            .send(Event::OrderCreated {
                order_id: approved.order.id,
                request_id: approved.request.id,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(approved)
    }

    /// Rejects a pending request. No stock has moved, so nothing to
    /// reverse.
    #[instrument(skip(self))]
    pub async fn reject_request(&self, id: i32) -> Result<customer_request::Model, ServiceError> {
        let request = self
            .db_pool
            .transaction::<_, customer_request::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = customer_request::Entity::find_by_id(id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("Request {} not found", id))
                        })?;

                    if request.status.is_final() {
                        return Err(ServiceError::Conflict(format!(
                            "Request {} is already {} and cannot change",
                            request.id, request.status
                        )));
                    }

                    let mut active: customer_request::ActiveModel = request.into();
                    active.status = Set(RequestStatus::Rejected);
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!("Request {} rejected", request.id);
        if let Err(e) = self
            .event_sender
            .send(Event::RequestStatusChanged {
                request_id: request.id,
                new_status: request.status,
            })
            .await
        {
            error!("Failed to publish event: {}", e);
        }
        Ok(request)
    }

    pub async fn get_request(&self, id: i32) -> Result<RequestDetail, ServiceError> {
        let found = customer_request::Entity::find_by_id(id)
            .find_also_related(customer_requested_part::Entity)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", id)))?;

        Ok(RequestDetail {
            request: found.0,
            requested_part: found.1,
        })
    }

    pub async fn list_requests(
        &self,
        page: u64,
        limit: u64,
        status: Option<RequestStatus>,
    ) -> Result<(Vec<customer_request::Model>, u64), ServiceError> {
        let mut query = customer_request::Entity::find().order_by_asc(customer_request::Column::Id);
        if let Some(status) = status {
            query = query.filter(customer_request::Column::Status.eq(status));
        }

        let paginator = query.paginate(self.db_pool.as_ref(), limit);
        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;
        Ok((items, total))
    }
}
