use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// One LMS user mapped to one EduMind student
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapping {
    pub lms_user_id: i64,
    pub edumind_student_id: String,
}

/// Read side of the LMS user to EduMind student relation.
///
/// `Ok(None)` means the user has no mapping. `Err` is reserved for the store
/// itself failing.
#[async_trait]
pub trait IdentityMappingStore: Send + Sync {
    async fn lookup_by_local_id(&self, lms_user_id: i64) -> Result<Option<String>, Error>;
}

/// Mapping store held in memory, with a reverse index to keep the relation one-to-one.
///
/// Filled once at startup and then only read, so it needs no locking.
#[derive(Clone, Debug, Default)]
pub struct InMemoryMappingStore {
    by_lms_user: HashMap<i64, String>,
    by_student: HashMap<String, i64>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `"<lms_user_id>=<edumind_student_id>"` pairs separated by commas
    pub fn parse(mappings: &str) -> Result<Self, Error> {
        let mut store = Self::new();
        for entry in mappings.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((lms_user_id, student_id)) = entry.split_once('=') else {
                return Err(Error::InvalidConfig(format!(
                    "mapping '{entry}' must look like <lms_user_id>=<student_id>"
                )));
            };
            let lms_user_id = lms_user_id.trim().parse::<i64>().map_err(|e| {
                Error::InvalidConfig(format!(
                    "mapping '{entry}' has an invalid LMS user id: {e}"
                ))
            })?;
            let student_id = student_id.trim();
            if student_id.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "mapping '{entry}' has an empty student id"
                )));
            }
            store.insert(IdentityMapping {
                lms_user_id,
                edumind_student_id: student_id.to_string(),
            })?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, mapping: IdentityMapping) -> Result<(), Error> {
        if let Some(existing) = self.by_lms_user.get(&mapping.lms_user_id) {
            return Err(Error::MappingConflict(format!(
                "LMS user {} is already mapped to {existing}",
                mapping.lms_user_id
            )));
        }
        if let Some(existing) = self.by_student.get(&mapping.edumind_student_id) {
            return Err(Error::MappingConflict(format!(
                "student {} is already mapped to LMS user {existing}",
                mapping.edumind_student_id
            )));
        }

        debug!(
            lms_user_id = mapping.lms_user_id,
            student_id = %mapping.edumind_student_id,
            "adding identity mapping"
        );
        self.by_student
            .insert(mapping.edumind_student_id.clone(), mapping.lms_user_id);
        self.by_lms_user
            .insert(mapping.lms_user_id, mapping.edumind_student_id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_lms_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lms_user.is_empty()
    }
}

#[async_trait]
impl IdentityMappingStore for InMemoryMappingStore {
    async fn lookup_by_local_id(&self, lms_user_id: i64) -> Result<Option<String>, Error> {
        Ok(self.by_lms_user.get(&lms_user_id).cloned())
    }
}

/// Store double that counts lookups
#[cfg(test)]
pub(crate) struct CountingStore {
    inner: InMemoryMappingStore,
    lookup_count: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl CountingStore {
    pub fn new(mappings: &str) -> Self {
        Self {
            inner: InMemoryMappingStore::parse(mappings).unwrap(),
            lookup_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookup_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl IdentityMappingStore for CountingStore {
    async fn lookup_by_local_id(&self, lms_user_id: i64) -> Result<Option<String>, Error> {
        self.lookup_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.lookup_by_local_id(lms_user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reads_pairs() {
        let store = InMemoryMappingStore::parse(" 7=STU0001, 8 = STU0002 ,").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.by_lms_user.get(&8).map(String::as_str), Some("STU0002"));
    }

    #[test]
    fn parse_empty_gives_empty_store() {
        assert!(InMemoryMappingStore::parse("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_malformed_entries() {
        for bad in ["7", "x=STU0001", "7=", "7=STU0001,7=STU0002"] {
            assert!(InMemoryMappingStore::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn insert_keeps_relation_one_to_one() {
        let mut store = InMemoryMappingStore::new();
        store
            .insert(IdentityMapping {
                lms_user_id: 1,
                edumind_student_id: "STU0001".to_string(),
            })
            .unwrap();

        let same_student = store.insert(IdentityMapping {
            lms_user_id: 2,
            edumind_student_id: "STU0001".to_string(),
        });
        assert!(matches!(same_student, Err(Error::MappingConflict(_))));

        let same_user = store.insert(IdentityMapping {
            lms_user_id: 1,
            edumind_student_id: "STU0009".to_string(),
        });
        assert!(matches!(same_user, Err(Error::MappingConflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lookup_distinguishes_unmapped() {
        let store = InMemoryMappingStore::parse("7=STU0001").unwrap();
        assert_eq!(
            store.lookup_by_local_id(7).await.unwrap().as_deref(),
            Some("STU0001")
        );
        assert_eq!(store.lookup_by_local_id(99).await.unwrap(), None);
    }
}
