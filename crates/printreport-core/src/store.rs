//! Request-scoped dataset storage
//!
//! An upload hands its dataset to the store and gets back a handle; exports
//! look the dataset up by that handle. Datasets are immutable once stored, so
//! any number of exports can read the same one at the same time.

use crate::{generate_report, Dataset, DateRange, Report, ReportError};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatasetHandle(Uuid);

impl DatasetHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: RwLock<HashMap<DatasetHandle, Arc<Dataset>>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, dataset: Dataset) -> DatasetHandle {
        let handle = DatasetHandle::new();
        let mut datasets = self
            .datasets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        datasets.insert(handle, Arc::new(dataset));
        tracing::debug!(%handle, "stored dataset");
        handle
    }

    pub fn get(&self, handle: &DatasetHandle) -> Option<Arc<Dataset>> {
        self.datasets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(handle)
            .cloned()
    }

    pub fn remove(&self, handle: &DatasetHandle) -> Option<Arc<Dataset>> {
        self.datasets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(handle)
    }

    pub fn len(&self) -> usize {
        self.datasets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export the dataset behind `handle`. An unknown handle is
    /// [`ReportError::NoDataset`].
    pub fn export(&self, handle: &DatasetHandle, range: &DateRange) -> Result<Report, ReportError> {
        let dataset = self.get(handle).ok_or(ReportError::NoDataset)?;
        generate_report(&dataset, range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::load_dataset;
    use chrono::NaiveDate;
    use std::thread;

    const LOG: &str = "Date,User Name,Print Pages\n01/01/2024,alice,5\n02/01/2024,bob,7\n";

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_export() {
        let store = DatasetStore::new();
        let handle = store.insert(load_dataset("log", LOG.as_bytes()).unwrap());

        let report = store.export(&handle, &range((2024, 1, 1), (2024, 1, 31))).unwrap();
        assert_eq!(report.total_pages, 12);
    }

    #[test]
    fn test_unknown_handle_is_no_dataset() {
        let store = DatasetStore::new();
        let err = store
            .export(&DatasetHandle::new(), &range((2024, 1, 1), (2024, 1, 31)))
            .unwrap_err();
        assert!(matches!(err, ReportError::NoDataset));
        assert!(err.is_validation());
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let store = DatasetStore::new();
        let handle = store.insert(load_dataset("log", LOG.as_bytes()).unwrap());
        assert_eq!(store.len(), 1);

        assert!(store.remove(&handle).is_some());
        assert!(store.is_empty());
        assert!(store.get(&handle).is_none());
    }

    #[test]
    fn test_handles_are_distinct() {
        let store = DatasetStore::new();
        let a = store.insert(load_dataset("a", LOG.as_bytes()).unwrap());
        let b = store.insert(load_dataset("b", LOG.as_bytes()).unwrap());

        assert_ne!(a, b);
        assert_eq!(store.get(&a).unwrap().name, "a");
        assert_eq!(store.get(&b).unwrap().name, "b");
    }

    #[test]
    fn test_concurrent_exports_are_independent() {
        let store = Arc::new(DatasetStore::new());
        let handle = store.insert(load_dataset("log", LOG.as_bytes()).unwrap());

        let workers: Vec<_> = [(1, 5), (2, 7)]
            .into_iter()
            .map(|(day, expected)| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let day_range = range((2024, 1, day), (2024, 1, day));
                    let report = store.export(&handle, &day_range).unwrap();
                    assert_eq!(report.total_pages, expected);
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
    }
}
