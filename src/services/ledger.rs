//! Owns every mutation of the stock counters.
//!
//! All services route their Part/Inventory counter math through these
//! functions so the balance `total_qty == available_qty + loan_qty` and the
//! non-negativity of every counter are enforced in one place. Each function
//! expects to run on a transaction owned by the caller.

use crate::entities::{inventory, part};
use crate::errors::ServiceError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, SqlErr,
};

fn checked_counter(
    part: &part::Model,
    counter: &str,
    current: i32,
    delta: i32,
) -> Result<i32, ServiceError> {
    let next = current + delta;
    if next < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "Part '{}' {} would drop below zero: have {}, change {}",
            part.name, counter, current, delta
        )));
    }
    Ok(next)
}

/// Applies a delta set to a part's counters. The deltas of every caller
/// satisfy `d_total == d_available + d_loan`, which is what keeps the
/// balance intact across commits.
pub(crate) async fn update_part_counters<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    d_total: i32,
    d_available: i32,
    d_loan: i32,
    d_sell: i32,
) -> Result<part::Model, ServiceError> {
    debug_assert_eq!(d_total, d_available + d_loan);

    let total = checked_counter(&part, "total_qty", part.total_qty, d_total)?;
    let available = checked_counter(&part, "available_qty", part.available_qty, d_available)?;
    let loan = checked_counter(&part, "loan_qty", part.loan_qty, d_loan)?;
    let sell = checked_counter(&part, "sell", part.sell, d_sell)?;

    let mut active: part::ActiveModel = part.into();
    active.total_qty = Set(total);
    active.available_qty = Set(available);
    active.loan_qty = Set(loan);
    active.sell = Set(sell);
    active.updated_at = Set(Some(Utc::now()));
    active.update(conn).await.map_err(ServiceError::db_error)
}

/// Applies a delta to one inventory lot, refusing to go negative.
pub(crate) async fn update_inventory_qty<C: ConnectionTrait>(
    conn: &C,
    inventory: inventory::Model,
    delta: i32,
) -> Result<inventory::Model, ServiceError> {
    let qty = inventory.qty + delta;
    if qty < 0 {
        return Err(ServiceError::InsufficientStock(format!(
            "Inventory {} holds {}, requested {}",
            inventory.id, inventory.qty, -delta
        )));
    }

    let mut active: inventory::ActiveModel = inventory.into();
    active.qty = Set(qty);
    active.updated_at = Set(Some(Utc::now()));
    active.update(conn).await.map_err(ServiceError::db_error)
}

/// Books a receipt of `qty` units: part totals up, lot quantity up,
/// creating the lot row on first receipt into (location, poll).
pub(crate) async fn receive<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    location_id: i32,
    poll: &str,
    qty: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let part = update_part_counters(conn, part, qty, qty, 0, 0).await?;

    let existing = inventory::Entity::find()
        .filter(inventory::Column::PartId.eq(part.id))
        .filter(inventory::Column::LocationId.eq(location_id))
        .filter(inventory::Column::Poll.eq(poll))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;

    let inventory = match existing {
        Some(row) => update_inventory_qty(conn, row, qty).await?,
        None => inventory::ActiveModel {
            part_id: Set(part.id),
            location_id: Set(location_id),
            poll: Set(poll.to_string()),
            qty: Set(qty),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                "Inventory for part {} at location {} lot '{}' was created concurrently",
                part.id, location_id, poll
            )),
            _ => ServiceError::db_error(e),
        })?,
    };

    Ok((part, inventory))
}

/// Loans stock out for a new order line: the lot and the shelf counter go
/// down, the loan and cumulative sell counters go up.
pub(crate) async fn loan_out<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    inventory: inventory::Model,
    qty: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let inventory = update_inventory_qty(conn, inventory, -qty).await?;
    let part = update_part_counters(conn, part, 0, -qty, qty, qty).await?;
    Ok((part, inventory))
}

/// Takes already-returned stock back out when an order re-enters transit.
/// Same movement as `loan_out`, but the sale was already counted.
pub(crate) async fn lend_again<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    inventory: inventory::Model,
    qty: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let inventory = update_inventory_qty(conn, inventory, -qty).await?;
    let part = update_part_counters(conn, part, 0, -qty, qty, 0).await?;
    Ok((part, inventory))
}

/// Puts loaned stock back on the shelf when an order leaves transit.
pub(crate) async fn put_back<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    inventory: inventory::Model,
    qty: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let inventory = update_inventory_qty(conn, inventory, qty).await?;
    let part = update_part_counters(conn, part, 0, qty, -qty, 0).await?;
    Ok((part, inventory))
}

/// Fully unwinds an outstanding loan, sell counter included. Used when an
/// order is deleted or its part line replaced.
pub(crate) async fn unwind_loan<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    inventory: inventory::Model,
    qty: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let inventory = update_inventory_qty(conn, inventory, qty).await?;
    let part = update_part_counters(conn, part, 0, qty, -qty, -qty).await?;
    Ok((part, inventory))
}

/// Shifts the received total up or down without touching the loan side.
/// Used by log corrections and direct quantity sets.
pub(crate) async fn shift_totals<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    inventory: inventory::Model,
    delta: i32,
) -> Result<(part::Model, inventory::Model), ServiceError> {
    let inventory = update_inventory_qty(conn, inventory, delta).await?;
    let part = update_part_counters(conn, part, delta, delta, 0, 0).await?;
    Ok((part, inventory))
}

/// Writes off damaged or lost stock: total and available drop together.
pub(crate) async fn write_off<C: ConnectionTrait>(
    conn: &C,
    part: part::Model,
    qty: i32,
) -> Result<part::Model, ServiceError> {
    update_part_counters(conn, part, -qty, -qty, 0, 0).await
}
