use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Value,
};

use crate::errors::ServiceError;

/// Whether a row of `E` with `column = id` exists.
pub async fn exists<E, C, V>(conn: &C, column: E::Column, id: V) -> Result<bool, ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    V: Into<Value>,
{
    let found: Option<i32> = E::find()
        .select_only()
        .expr(sea_orm::sea_query::Expr::val(1))
        .filter(column.eq(id))
        .limit(1)
        .into_tuple()
        .one(conn)
        .await?;
    Ok(found.is_some())
}

/// Like [`exists`], but absence is a `NotFound` naming `what`.
pub async fn require<E, C>(
    conn: &C,
    column: E::Column,
    id: i32,
    what: &str,
) -> Result<(), ServiceError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if exists::<E, C, i32>(conn, column, id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("{} {} not found", what, id)))
    }
}

/// Loads a row by primary key or fails with `NotFound`.
pub async fn find_required<E, C>(conn: &C, id: i32, what: &str) -> Result<E::Model, ServiceError>
where
    E: EntityTrait,
    E::PrimaryKey: sea_orm::PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("{} {} not found", what, id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory_pool;
    use crate::entities::route;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn existence_lookup_sees_only_real_rows() {
        let db = in_memory_pool().await.unwrap();
        let created = route::ActiveModel {
            name: Set("North".into()),
            description: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db.as_ref())
        .await
        .unwrap();

        assert!(exists::<route::Entity, _, _>(db.as_ref(), route::Column::Id, created.id)
            .await
            .unwrap());
        assert!(!exists::<route::Entity, _, _>(db.as_ref(), route::Column::Id, created.id + 1)
            .await
            .unwrap());

        let missing = require::<route::Entity, _>(db.as_ref(), route::Column::Id, 999, "Route").await;
        assert!(matches!(missing, Err(ServiceError::NotFound(msg)) if msg == "Route 999 not found"));

        let found = find_required::<route::Entity, _>(db.as_ref(), created.id, "Route")
            .await
            .unwrap();
        assert_eq!(found.name, "North");
    }
}
