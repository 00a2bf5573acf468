use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_id: i32,
    pub name: String,
    pub unit: String,
    /// Materialized sum of the item's ledger; never negative.
    pub current_quantity: i32,
    pub reorder_threshold: i32,
    pub reorder_quantity: i32,
    pub unit_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_category::Entity",
        from = "Column::CategoryId",
        to = "super::inventory_category::Column::Id"
    )]
    InventoryCategory,
    #[sea_orm(has_many = "super::inventory_transaction::Entity")]
    InventoryTransaction,
}

impl Related<super::inventory_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryCategory.def()
    }
}

impl Related<super::inventory_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn needs_reorder(&self) -> bool {
        self.current_quantity <= self.reorder_threshold
    }

    pub fn stock_value(&self) -> Decimal {
        self.unit_cost * Decimal::from(self.current_quantity)
    }
}
