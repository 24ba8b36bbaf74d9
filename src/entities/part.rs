use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stock-keeping unit with aggregate quantity counters.
///
/// The counters are owned by the ledger services: `total_qty` must equal
/// `available_qty + loan_qty` after every committed transaction. `sell`
/// accumulates loaned-out quantity and is walked back only when an order
/// is edited or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub alternate_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub total_qty: i32,
    pub available_qty: i32,
    pub loan_qty: i32,
    pub sell: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventories,
    #[sea_orm(has_many = "super::order_part::Entity")]
    OrderParts,
    #[sea_orm(has_many = "super::customer_requested_part::Entity")]
    CustomerRequestedParts,
    #[sea_orm(has_many = "super::scrap::Entity")]
    Scraps,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::order_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderParts.def()
    }
}

impl Related<super::customer_requested_part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerRequestedParts.def()
    }
}

impl Related<super::scrap::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Scraps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Counter balance that must survive every committed ledger operation.
    pub fn counters_balanced(&self) -> bool {
        self.total_qty == self.available_qty + self.loan_qty
    }
}
