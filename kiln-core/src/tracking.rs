//! Status tracking for backend collections
//!
//! A tracked collection is a list loaded from a listing endpoint. While some
//! of its items have jobs in flight, the console fetches the cheaper status
//! endpoint and merges the result into the list it already holds. Only the
//! `status` field changes during a merge; adding and removing items is left
//! to a full reload.

use std::collections::HashMap;
use std::hash::Hash;

use crate::domain::status::JobStatus;

/// An item of a tracked collection
pub trait Tracked: Clone {
    /// Identifier, stable across reloads of the same entity
    type Key: Eq + Hash + Clone;

    /// Whether an all-digit progress status keeps the item in flight
    const PROGRESS_IS_IN_FLIGHT: bool = false;

    fn key(&self) -> Self::Key;

    fn status(&self) -> &JobStatus;

    /// Copy of the item with only the status replaced
    fn with_status(&self, status: JobStatus) -> Self;

    /// The item's backend job has not reached a terminal state yet
    fn is_in_flight(&self) -> bool {
        let status = self.status();
        status.is_active() || (Self::PROGRESS_IS_IN_FLIGHT && status.progress().is_some())
    }
}

/// A record returned by a status-only endpoint
pub trait StatusRecord {
    type Key: Eq + Hash + Clone;

    fn key(&self) -> Self::Key;

    fn status(&self) -> &JobStatus;
}

/// Merge status updates into `current` using explicit identifier extractors
///
/// The result has the same length and order as `current`. An item whose key
/// appears in `updates` gets that record's status; every other field, and
/// every unmatched item, is copied unchanged. If a key appears more than once
/// in `updates` the first record wins.
pub fn reconcile_by<T, U, K>(
    current: &[T],
    updates: &[U],
    item_key: impl Fn(&T) -> K,
    update_key: impl Fn(&U) -> K,
    apply: impl Fn(&T, &U) -> T,
) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
{
    let mut by_key: HashMap<K, &U> = HashMap::with_capacity(updates.len());
    for update in updates {
        by_key.entry(update_key(update)).or_insert(update);
    }

    current
        .iter()
        .map(|item| match by_key.get(&item_key(item)) {
            Some(update) => apply(item, update),
            None => item.clone(),
        })
        .collect()
}

/// Merge status records into `current`, matching by [`Tracked::key`]
pub fn reconcile<T, U>(current: &[T], updates: &[U]) -> Vec<T>
where
    T: Tracked,
    U: StatusRecord<Key = T::Key>,
{
    reconcile_by(
        current,
        updates,
        |item: &T| item.key(),
        |update: &U| update.key(),
        |item, update| item.with_status(update.status().clone()),
    )
}

/// At least one item still has a job in flight
///
/// An empty list has nothing in flight.
pub fn has_in_flight_items<T: Tracked>(items: &[T]) -> bool {
    items.iter().any(Tracked::is_in_flight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: u32,
        label: String,
        status: JobStatus,
    }

    impl Tracked for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn status(&self) -> &JobStatus {
            &self.status
        }

        fn with_status(&self, status: JobStatus) -> Self {
            Self {
                status,
                ..self.clone()
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct BuildRow(Row);

    impl Tracked for BuildRow {
        type Key = u32;
        const PROGRESS_IS_IN_FLIGHT: bool = true;

        fn key(&self) -> u32 {
            self.0.id
        }

        fn status(&self) -> &JobStatus {
            &self.0.status
        }

        fn with_status(&self, status: JobStatus) -> Self {
            Self(self.0.with_status(status))
        }
    }

    struct Update {
        id: u32,
        status: JobStatus,
    }

    impl StatusRecord for Update {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn status(&self) -> &JobStatus {
            &self.status
        }
    }

    fn row(id: u32, status: &str) -> Row {
        Row {
            id,
            label: format!("row-{}", id),
            status: JobStatus::from(status),
        }
    }

    fn update(id: u32, status: &str) -> Update {
        Update {
            id,
            status: JobStatus::from(status),
        }
    }

    #[test]
    fn test_reconcile_replaces_only_status() {
        let current = vec![row(1, "pending"), row(2, "running"), row(3, "complete")];
        let updates = vec![update(2, "failed"), update(1, "complete")];

        let merged = reconcile(&current, &updates);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], Row { status: JobStatus::Complete, ..current[0].clone() });
        assert_eq!(merged[1], Row { status: JobStatus::Failed, ..current[1].clone() });
        assert_eq!(merged[2], current[2]);
    }

    #[test]
    fn test_reconcile_never_adds_or_removes() {
        let current = vec![row(5, "pending"), row(4, "pending")];
        let updates = vec![update(9, "complete"), update(4, "running")];

        let merged = reconcile(&current, &updates);

        let ids: Vec<u32> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(merged[0].status, JobStatus::Pending);
        assert_eq!(merged[1].status, JobStatus::Running);
    }

    #[test]
    fn test_reconcile_first_duplicate_wins() {
        let current = vec![row(1, "pending")];
        let updates = vec![update(1, "running"), update(1, "failed")];

        assert_eq!(reconcile(&current, &updates)[0].status, JobStatus::Running);
    }

    #[test]
    fn test_reconcile_by_custom_key() {
        let current = vec![row(1, "pending"), row(2, "pending")];
        let updates = vec![("row-2".to_string(), JobStatus::Complete)];

        let merged = reconcile_by(
            &current,
            &updates,
            |r| r.label.clone(),
            |(name, _)| name.clone(),
            |r, (_, status)| r.with_status(status.clone()),
        );

        assert_eq!(merged[0].status, JobStatus::Pending);
        assert_eq!(merged[1].status, JobStatus::Complete);
    }

    #[test]
    fn test_reconcile_empty_inputs() {
        let empty: Vec<Row> = Vec::new();
        assert!(reconcile(&empty, &[update(1, "complete")]).is_empty());

        let current = vec![row(1, "pending")];
        assert_eq!(reconcile::<Row, Update>(&current, &[]), current);
    }

    #[test]
    fn test_in_flight_detection() {
        assert!(!has_in_flight_items::<Row>(&[]));
        assert!(!has_in_flight_items(&[row(1, "complete"), row(2, "failed")]));
        assert!(has_in_flight_items(&[row(1, "complete"), row(2, "pending")]));
        assert!(has_in_flight_items(&[row(1, "running")]));
    }

    #[test]
    fn test_progress_only_counts_where_enabled() {
        assert!(!has_in_flight_items(&[row(1, "57")]));
        assert!(has_in_flight_items(&[BuildRow(row(1, "57"))]));
        assert!(!has_in_flight_items(&[BuildRow(row(1, "complete"))]));
    }
}
