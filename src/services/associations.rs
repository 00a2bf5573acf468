//! Incremental reconciliation of a client's many-to-many links.
//!
//! The desired state arrives as a plain list of target IDs. The current link
//! set is read back, the two are diffed with set algebra, and only the
//! difference is written: stale links are deleted, new links inserted. Targets
//! that do not exist are skipped silently. Nothing here commits; callers run
//! it inside their own transaction so several kinds reconcile atomically.

use std::collections::BTreeSet;

use metrics::counter;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::entities::{
    client_dietary_restriction, client_eligibility_criterion, dietary_restriction,
    eligibility_criterion,
};
use crate::errors::ServiceError;
use crate::repositories;

/// Describes one link table: who owns a link, what it points at, and how a
/// link row is built.
pub trait AssociationKind {
    type Link: EntityTrait;
    type Target: EntityTrait;

    const NAME: &'static str;

    fn owner_column() -> <Self::Link as EntityTrait>::Column;
    fn target_column() -> <Self::Link as EntityTrait>::Column;
    fn target_id_column() -> <Self::Target as EntityTrait>::Column;
    fn link(owner_id: i32, target_id: i32) -> <Self::Link as EntityTrait>::ActiveModel;
}

pub struct DietaryRestrictions;

impl AssociationKind for DietaryRestrictions {
    type Link = client_dietary_restriction::Entity;
    type Target = dietary_restriction::Entity;

    const NAME: &'static str = "dietary_restrictions";

    fn owner_column() -> client_dietary_restriction::Column {
        client_dietary_restriction::Column::ClientId
    }

    fn target_column() -> client_dietary_restriction::Column {
        client_dietary_restriction::Column::DietaryRestrictionId
    }

    fn target_id_column() -> dietary_restriction::Column {
        dietary_restriction::Column::Id
    }

    fn link(owner_id: i32, target_id: i32) -> client_dietary_restriction::ActiveModel {
        client_dietary_restriction::ActiveModel {
            client_id: Set(owner_id),
            dietary_restriction_id: Set(target_id),
        }
    }
}

pub struct EligibilityCriteria;

impl AssociationKind for EligibilityCriteria {
    type Link = client_eligibility_criterion::Entity;
    type Target = eligibility_criterion::Entity;

    const NAME: &'static str = "eligibility_criteria";

    fn owner_column() -> client_eligibility_criterion::Column {
        client_eligibility_criterion::Column::ClientId
    }

    fn target_column() -> client_eligibility_criterion::Column {
        client_eligibility_criterion::Column::EligibilityCriterionId
    }

    fn target_id_column() -> eligibility_criterion::Column {
        eligibility_criterion::Column::Id
    }

    fn link(owner_id: i32, target_id: i32) -> client_eligibility_criterion::ActiveModel {
        client_eligibility_criterion::ActiveModel {
            client_id: Set(owner_id),
            eligibility_criterion_id: Set(target_id),
        }
    }
}

/// Association kinds a caller can name at runtime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum ClientAssociation {
    DietaryRestrictions,
    EligibilityCriteria,
}

/// `removals = current - desired`, `additions = desired - current`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationDiff {
    pub removals: BTreeSet<i32>,
    pub additions: BTreeSet<i32>,
}

impl AssociationDiff {
    pub fn compute(
        current: impl IntoIterator<Item = i32>,
        desired: impl IntoIterator<Item = i32>,
    ) -> Self {
        let current: BTreeSet<i32> = current.into_iter().collect();
        let desired: BTreeSet<i32> = desired.into_iter().collect();
        Self {
            removals: current.difference(&desired).copied().collect(),
            additions: desired.difference(&current).copied().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub removed: Vec<i32>,
    pub added: Vec<i32>,
    /// Requested targets that do not exist.
    pub skipped: Vec<i32>,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }
}

pub struct AssociationReconciler;

impl AssociationReconciler {
    /// Target IDs currently linked to `owner_id`.
    pub async fn current_ids<K, C>(conn: &C, owner_id: i32) -> Result<BTreeSet<i32>, ServiceError>
    where
        K: AssociationKind,
        C: ConnectionTrait,
    {
        let ids: Vec<i32> = K::Link::find()
            .select_only()
            .column(K::target_column())
            .filter(K::owner_column().eq(owner_id))
            .into_tuple()
            .all(conn)
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Brings the links of `owner_id` to exactly `desired` (minus unknown targets).
    #[instrument(skip(conn, desired), fields(kind = K::NAME))]
    pub async fn reconcile<K, C>(
        conn: &C,
        owner_id: i32,
        desired: &[i32],
    ) -> Result<ReconcileOutcome, ServiceError>
    where
        K: AssociationKind,
        C: ConnectionTrait,
        <K::Link as EntityTrait>::Model: IntoActiveModel<<K::Link as EntityTrait>::ActiveModel>,
    {
        let current = Self::current_ids::<K, C>(conn, owner_id).await?;
        let diff = AssociationDiff::compute(current, desired.iter().copied());
        if diff.is_empty() {
            debug!(owner_id, "Links already match");
            return Ok(ReconcileOutcome::default());
        }

        if !diff.removals.is_empty() {
            K::Link::delete_many()
                .filter(K::owner_column().eq(owner_id))
                .filter(K::target_column().is_in(diff.removals.iter().copied()))
                .exec(conn)
                .await?;
        }

        let mut outcome = ReconcileOutcome {
            removed: diff.removals.into_iter().collect(),
            ..Default::default()
        };
        for target_id in diff.additions {
            if repositories::exists::<K::Target, C, i32>(conn, K::target_id_column(), target_id)
                .await?
            {
                outcome.added.push(target_id);
            } else {
                debug!(owner_id, target_id, "Skipping unknown target");
                outcome.skipped.push(target_id);
            }
        }

        if !outcome.added.is_empty() {
            K::Link::insert_many(outcome.added.iter().map(|&t| K::link(owner_id, t)))
                .exec_without_returning(conn)
                .await?;
        }

        counter!("meal_delivery.associations.removed", outcome.removed.len() as u64, "kind" => K::NAME);
        counter!("meal_delivery.associations.added", outcome.added.len() as u64, "kind" => K::NAME);
        debug!(
            owner_id,
            removed = ?outcome.removed,
            added = ?outcome.added,
            skipped = ?outcome.skipped,
            "Reconciled links"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn set(ids: &[i32]) -> BTreeSet<i32> {
        ids.iter().copied().collect()
    }

    #[test]
    fn diff_is_minimal() {
        let diff = AssociationDiff::compute([1, 2, 3], [2, 3, 4]);
        assert_eq!(diff.removals, set(&[1]));
        assert_eq!(diff.additions, set(&[4]));
    }

    #[test]
    fn duplicates_and_order_in_desired_are_ignored() {
        let diff = AssociationDiff::compute([5], [7, 5, 7, 6]);
        assert!(diff.removals.is_empty());
        assert_eq!(diff.additions, set(&[6, 7]));
    }

    #[test]
    fn matching_sets_produce_no_work() {
        assert!(AssociationDiff::compute([1, 2], [2, 1]).is_empty());
        assert!(AssociationDiff::compute(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn empty_desired_removes_everything() {
        let diff = AssociationDiff::compute([1, 2], Vec::new());
        assert_eq!(diff.removals, set(&[1, 2]));
        assert!(diff.additions.is_empty());
    }

    #[test]
    fn association_names_parse() {
        assert_eq!(
            ClientAssociation::from_str("dietary_restrictions").unwrap(),
            ClientAssociation::DietaryRestrictions
        );
        assert_eq!(ClientAssociation::EligibilityCriteria.to_string(), "eligibility_criteria");
    }
}
