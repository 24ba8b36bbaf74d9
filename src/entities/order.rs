use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle states of a rental order.
///
/// Stock movements hang off exactly two transition edges: leaving
/// `InTransit` into a stock-returned status puts the quantity back on the
/// shelf, and leaving a stock-returned status back into `InTransit` takes
/// it off again. Every other transition only touches `status`/`close_date`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "defective")]
    Defective,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl OrderStatus {
    /// Statuses meaning the part is physically back on the shelf. Moving
    /// between one of these and `InTransit` is what moves stock.
    pub fn is_stock_returned(&self) -> bool {
        matches!(self, Self::Returned | Self::Defective | Self::Closed)
    }

    /// Statuses that stamp `close_date` on entry and clear it on exit.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Returned | Self::Cancelled | Self::Defective | Self::Closed
        )
    }

    /// Statuses whose stock effect is already settled; deleting an order
    /// in one of these performs no counter reversal.
    pub fn is_reconciled(&self) -> bool {
        matches!(self, Self::Returned | Self::Cancelled | Self::Closed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Sequential human-readable invoice code, e.g. "BD-NEC-00042".
    pub invoice_id: String,
    pub partner_id: i32,
    pub status: OrderStatus,
    pub qty: i32,
    pub close_date: Option<DateTime<Utc>>,
    pub case_id: Option<String>,
    pub call_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::partner::Entity",
        from = "Column::PartnerId",
        to = "super::partner::Column::Id"
    )]
    Partner,
    #[sea_orm(has_one = "super::order_part::Entity")]
    OrderPart,
}

impl Related<super::partner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Partner.def()
    }
}

impl Related<super::order_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderPart.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
