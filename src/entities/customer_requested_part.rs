use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "customer_requested_parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub customer_request_id: i32,
    pub part_id: i32,
    pub qty: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer_request::Entity",
        from = "Column::CustomerRequestId",
        to = "super::customer_request::Column::Id"
    )]
    CustomerRequest,
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
}

impl Related<super::customer_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerRequest.def()
    }
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
