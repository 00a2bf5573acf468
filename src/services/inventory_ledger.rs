use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, Iterable, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::clock::Clock;
use crate::db::DbPool;
use crate::entities::inventory_transaction::TransactionType;
use crate::entities::{inventory_category, inventory_item, inventory_transaction};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyInventoryTransaction {
    pub item_id: i32,
    pub signed_quantity: i32,
    /// Inferred from the sign when absent.
    pub transaction_type: Option<TransactionType>,
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewInventoryItem {
    pub category_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub unit: String,
    #[validate(range(min = 0))]
    pub reorder_threshold: i32,
    #[validate(range(min = 0))]
    pub reorder_quantity: i32,
    pub unit_cost: Decimal,
    /// Recorded as an opening `Receipt` when positive.
    #[validate(range(min = 0))]
    pub opening_quantity: i32,
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedTransaction {
    pub transaction: inventory_transaction::Model,
    pub item: inventory_item::Model,
    /// This transaction took the balance from above the reorder threshold to
    /// at or below it.
    pub reorder_point_reached: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceCheck {
    pub item_id: i32,
    pub recorded_quantity: i32,
    pub ledger_sum: i64,
    pub consistent: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub transaction_type: TransactionType,
    pub count: u64,
    pub total_abs_quantity: i64,
    pub average_abs_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub user_id: String,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category_id: i32,
    pub category_name: String,
    pub transaction_count: u64,
    pub total_abs_quantity: i64,
    pub net_quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryStatistics {
    pub window_days: i64,
    pub since: DateTime<Utc>,
    pub total_transactions: u64,
    pub by_type: Vec<TypeSummary>,
    pub top_users: Vec<UserActivity>,
    pub by_category: Vec<CategorySummary>,
}

impl InventoryStatistics {
    /// Groups `transactions` (already filtered to the window, in iteration
    /// order). Users tied on count keep the order in which they first appear.
    pub fn aggregate(
        window_days: i64,
        since: DateTime<Utc>,
        transactions: &[inventory_transaction::Model],
        item_categories: &HashMap<i32, i32>,
        category_names: &HashMap<i32, String>,
        top_users_limit: usize,
    ) -> Self {
        let mut by_type: HashMap<TransactionType, (u64, i64)> = HashMap::new();
        let mut users: Vec<UserActivity> = Vec::new();
        let mut user_index: HashMap<&str, usize> = HashMap::new();
        let mut categories: HashMap<i32, CategorySummary> = HashMap::new();

        for tx in transactions {
            let quantity = i64::from(tx.signed_quantity);

            let entry = by_type.entry(tx.transaction_type).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += quantity.abs();

            match user_index.get(tx.user_id.as_str()) {
                Some(&i) => users[i].transaction_count += 1,
                None => {
                    user_index.insert(tx.user_id.as_str(), users.len());
                    users.push(UserActivity {
                        user_id: tx.user_id.clone(),
                        transaction_count: 1,
                    });
                }
            }

            if let Some(&category_id) = item_categories.get(&tx.item_id) {
                let summary = categories.entry(category_id).or_insert_with(|| CategorySummary {
                    category_id,
                    category_name: category_names
                        .get(&category_id)
                        .cloned()
                        .unwrap_or_default(),
                    transaction_count: 0,
                    total_abs_quantity: 0,
                    net_quantity: 0,
                });
                summary.transaction_count += 1;
                summary.total_abs_quantity += quantity.abs();
                summary.net_quantity += quantity;
            }
        }

        let by_type = TransactionType::iter()
            .filter_map(|t| {
                by_type.get(&t).map(|&(count, total)| TypeSummary {
                    transaction_type: t,
                    count,
                    total_abs_quantity: total,
                    average_abs_quantity: total as f64 / count as f64,
                })
            })
            .collect();

        // stable: ties stay in first-appearance order
        users.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
        users.truncate(top_users_limit);

        let mut by_category: Vec<CategorySummary> = categories.into_values().collect();
        by_category.sort_by(|a, b| {
            b.transaction_count
                .cmp(&a.transaction_count)
                .then_with(|| a.category_name.cmp(&b.category_name))
        });

        Self {
            window_days,
            since,
            total_transactions: transactions.len() as u64,
            by_type,
            top_users: users,
            by_category,
        }
    }
}

/// Append-only inventory ledger with a materialized balance per item.
#[derive(Clone)]
pub struct InventoryLedger {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    clock: Arc<dyn Clock>,
    top_users_limit: usize,
}

impl InventoryLedger {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        clock: Arc<dyn Clock>,
        top_users_limit: usize,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            clock,
            top_users_limit,
        }
    }

    /// Applies one signed delta inside the caller's transaction. Nothing is
    /// written when the balance would go negative.
    pub async fn apply_within<C>(
        conn: &C,
        command: &ApplyInventoryTransaction,
        now: DateTime<Utc>,
    ) -> Result<AppliedTransaction, ServiceError>
    where
        C: ConnectionTrait,
    {
        command.validate()?;
        let item = repositories::find_required::<inventory_item::Entity, _>(
            conn,
            command.item_id,
            "Inventory item",
        )
        .await?;

        let new_balance = item
            .current_quantity
            .checked_add(command.signed_quantity)
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Quantity {} overflows the balance of item {}",
                    command.signed_quantity, item.id
                ))
            })?;
        if new_balance < 0 {
            return Err(Self::negative_balance(&item, command.signed_quantity));
        }

        // Conditional write: a concurrent consumer that got here first makes
        // this touch zero rows instead of driving the balance negative.
        let updated = inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::CurrentQuantity,
                Expr::col(inventory_item::Column::CurrentQuantity).add(command.signed_quantity),
            )
            .col_expr(inventory_item::Column::UpdatedAt, Expr::value(now))
            .filter(inventory_item::Column::Id.eq(item.id))
            .filter(
                Expr::col(inventory_item::Column::CurrentQuantity)
                    .gte(-i64::from(command.signed_quantity)),
            )
            .exec(conn)
            .await
            .map_err(|e| {
                ServiceError::from_check_violation(
                    e,
                    format!("Balance of item {} may not go negative", item.id),
                )
            })?;
        if updated.rows_affected == 0 {
            return Err(Self::negative_balance(&item, command.signed_quantity));
        }

        let transaction_type =
            TransactionType::resolve(command.transaction_type, command.signed_quantity);
        let transaction = inventory_transaction::ActiveModel {
            id: NotSet,
            item_id: Set(item.id),
            signed_quantity: Set(command.signed_quantity),
            transaction_type: Set(transaction_type),
            user_id: Set(command.user_id.clone()),
            notes: Set(command.notes.clone()),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        let after = repositories::find_required::<inventory_item::Entity, _>(
            conn,
            item.id,
            "Inventory item",
        )
        .await?;
        let reorder_point_reached = item.current_quantity > after.reorder_threshold
            && after.current_quantity <= after.reorder_threshold;

        Ok(AppliedTransaction {
            transaction,
            item: after,
            reorder_point_reached,
        })
    }

    fn negative_balance(item: &inventory_item::Model, signed_quantity: i32) -> ServiceError {
        ServiceError::InvariantViolation(format!(
            "Transaction of {} on item {} would result in negative inventory (current balance {})",
            signed_quantity, item.id, item.current_quantity
        ))
    }

    /// Records a signed quantity change against an item's balance.
    #[instrument(skip(self))]
    pub async fn apply_transaction(
        &self,
        command: ApplyInventoryTransaction,
    ) -> Result<AppliedTransaction, ServiceError> {
        let start = std::time::Instant::now();
        let now = self.clock.now();

        let txn = self.db_pool.begin().await?;
        let applied = match Self::apply_within(&txn, &command, now).await {
            Ok(applied) => applied,
            Err(e) => {
                counter!("meal_delivery.inventory.transactions_rejected", 1, "reason" => e.error_code());
                warn!(item_id = command.item_id, error = %e, "Inventory transaction rejected");
                return Err(e);
            }
        };
        txn.commit().await?;

        counter!(
            "meal_delivery.inventory.transactions_recorded",
            1,
            "type" => applied.transaction.transaction_type.to_string()
        );
        histogram!(
            "meal_delivery.inventory.apply_duration_ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        info!(
            transaction_id = applied.transaction.id,
            item_id = applied.item.id,
            signed_quantity = applied.transaction.signed_quantity,
            new_quantity = applied.item.current_quantity,
            "Inventory transaction recorded"
        );
        self.publish(&applied).await;
        Ok(applied)
    }

    async fn publish(&self, applied: &AppliedTransaction) {
        self.event_sender
            .send_or_log(Event::InventoryTransactionRecorded {
                transaction_id: applied.transaction.id,
                item_id: applied.item.id,
                signed_quantity: applied.transaction.signed_quantity,
                transaction_type: applied.transaction.transaction_type,
                new_quantity: applied.item.current_quantity,
            })
            .await;
        if applied.reorder_point_reached {
            self.event_sender
                .send_or_log(Event::InventoryReorderPointReached {
                    item_id: applied.item.id,
                    current_quantity: applied.item.current_quantity,
                    reorder_threshold: applied.item.reorder_threshold,
                    reorder_quantity: applied.item.reorder_quantity,
                })
                .await;
        }
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<inventory_category::Model, ServiceError> {
        if name.trim().is_empty() || name.chars().count() > 100 {
            return Err(ServiceError::ValidationError(
                "category name must be 1 to 100 characters".to_string(),
            ));
        }
        inventory_category::ActiveModel {
            id: NotSet,
            name: Set(name.clone()),
            description: Set(description),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            ServiceError::from_unique_violation(e, format!("Inventory category '{}' already exists", name))
        })
    }

    /// Creates an item at balance zero, then books any opening stock as a
    /// receipt so the balance always equals the ledger.
    #[instrument(skip(self))]
    pub async fn create_item(
        &self,
        input: NewInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let now = self.clock.now();

        let txn = self.db_pool.begin().await?;
        repositories::require::<inventory_category::Entity, _>(
            &txn,
            inventory_category::Column::Id,
            input.category_id,
            "Inventory category",
        )
        .await?;

        let item = inventory_item::ActiveModel {
            id: NotSet,
            category_id: Set(input.category_id),
            name: Set(input.name.clone()),
            unit: Set(input.unit.clone()),
            current_quantity: Set(0),
            reorder_threshold: Set(input.reorder_threshold),
            reorder_quantity: Set(input.reorder_quantity),
            unit_cost: Set(input.unit_cost),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let item = if input.opening_quantity > 0 {
            let opening = ApplyInventoryTransaction {
                item_id: item.id,
                signed_quantity: input.opening_quantity,
                transaction_type: Some(TransactionType::Receipt),
                user_id: input.user_id.clone(),
                notes: Some("Opening balance".to_string()),
            };
            Self::apply_within(&txn, &opening, now).await?.item
        } else {
            item
        };
        txn.commit().await?;

        info!(item_id = item.id, name = %item.name, "Inventory item created");
        Ok(item)
    }

    /// Newest-first ledger rows for one item.
    #[instrument(skip(self))]
    pub async fn item_transactions(
        &self,
        item_id: i32,
        limit: u64,
    ) -> Result<Vec<inventory_transaction::Model>, ServiceError> {
        let db = &*self.db_pool;
        repositories::require::<inventory_item::Entity, _>(
            db,
            inventory_item::Column::Id,
            item_id,
            "Inventory item",
        )
        .await?;

        Ok(inventory_transaction::Entity::find()
            .filter(inventory_transaction::Column::ItemId.eq(item_id))
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .order_by_desc(inventory_transaction::Column::Id)
            .limit(limit)
            .all(db)
            .await?)
    }

    /// Items at or below their reorder threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_items(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(
                Expr::col(inventory_item::Column::CurrentQuantity)
                    .lte(Expr::col(inventory_item::Column::ReorderThreshold)),
            )
            .order_by_asc(inventory_item::Column::Name)
            .order_by_asc(inventory_item::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Recomputes the ledger sum for an item and compares it with the stored balance.
    #[instrument(skip(self))]
    pub async fn verify_item_balance(&self, item_id: i32) -> Result<BalanceCheck, ServiceError> {
        let db = &*self.db_pool;
        let item =
            repositories::find_required::<inventory_item::Entity, _>(db, item_id, "Inventory item")
                .await?;
        let quantities: Vec<i32> = inventory_transaction::Entity::find()
            .select_only()
            .column(inventory_transaction::Column::SignedQuantity)
            .filter(inventory_transaction::Column::ItemId.eq(item_id))
            .into_tuple()
            .all(db)
            .await?;
        let ledger_sum: i64 = quantities.into_iter().map(i64::from).sum();

        let check = BalanceCheck {
            item_id,
            recorded_quantity: item.current_quantity,
            ledger_sum,
            consistent: ledger_sum == i64::from(item.current_quantity),
        };
        if !check.consistent {
            warn!(
                item_id,
                recorded = check.recorded_quantity,
                ledger_sum,
                "Inventory balance does not match its ledger"
            );
        }
        Ok(check)
    }

    /// Per-type, per-user and per-category activity over the last `window_days`.
    #[instrument(skip(self))]
    pub async fn statistics(&self, window_days: i64) -> Result<InventoryStatistics, ServiceError> {
        if window_days <= 0 {
            return Err(ServiceError::ValidationError(format!(
                "window_days must be positive, got {}",
                window_days
            )));
        }
        let since = Duration::try_days(window_days)
            .and_then(|window| self.clock.now().checked_sub_signed(window))
            .ok_or_else(|| {
                ServiceError::ValidationError(format!("window_days {} is too large", window_days))
            })?;
        let db = &*self.db_pool;

        let transactions = inventory_transaction::Entity::find()
            .filter(inventory_transaction::Column::CreatedAt.gte(since))
            .order_by_asc(inventory_transaction::Column::CreatedAt)
            .order_by_asc(inventory_transaction::Column::Id)
            .all(db)
            .await?;

        let mut item_ids: Vec<i32> = transactions.iter().map(|t| t.item_id).collect();
        item_ids.sort_unstable();
        item_ids.dedup();

        let item_categories: HashMap<i32, i32> = if item_ids.is_empty() {
            HashMap::new()
        } else {
            inventory_item::Entity::find()
                .select_only()
                .column(inventory_item::Column::Id)
                .column(inventory_item::Column::CategoryId)
                .filter(inventory_item::Column::Id.is_in(item_ids))
                .into_tuple::<(i32, i32)>()
                .all(db)
                .await?
                .into_iter()
                .collect()
        };
        let category_names: HashMap<i32, String> = inventory_category::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(InventoryStatistics::aggregate(
            window_days,
            since,
            &transactions,
            &item_categories,
            &category_names,
            self.top_users_limit,
        ))
    }
}
