use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue};
use serde::{Deserialize, Serialize};

/// Types of inventory transactions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum TransactionType {
    #[sea_orm(string_value = "Receipt")]
    Receipt,
    #[sea_orm(string_value = "Consumption")]
    Consumption,
    #[sea_orm(string_value = "Adjustment")]
    Adjustment,
}

impl TransactionType {
    /// Positive deltas are receipts; zero and negative deltas are consumption.
    pub fn infer(signed_quantity: i32) -> Self {
        if signed_quantity > 0 {
            TransactionType::Receipt
        } else {
            TransactionType::Consumption
        }
    }

    /// An explicit type wins over inference.
    pub fn resolve(explicit: Option<Self>, signed_quantity: i32) -> Self {
        explicit.unwrap_or_else(|| Self::infer(signed_quantity))
    }
}

/// Immutable ledger row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    pub signed_quantity: i32,
    pub transaction_type: TransactionType,
    pub user_id: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ItemId",
        to = "super::inventory_item::Column::Id"
    )]
    InventoryItem,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Rows are stamped by the ledger from its injected clock; an unstamped
    /// row is rejected rather than given wall-clock time.
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr> {
        if !insert {
            return Err(DbErr::Custom(
                "inventory transactions are append-only".to_string(),
            ));
        }
        if let ActiveValue::NotSet = self.created_at {
            return Err(DbErr::Custom(
                "inventory transactions must carry created_at".to_string(),
            ));
        }
        Ok(self)
    }
}
