// crates/sync-engine/src/types.rs
//! Records and transactions exchanged by the reconciliation passes

use crate::error::{MergeError, SyncError, SyncResult};
use guidesync_core::{ContentKey, RecordKind, RemoteId};
use guidesync_guide::GuideCustomFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One guide-sourced entity the service should hold
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredRecord {
    /// Stable guide identifier; unique within one guide snapshot
    pub key: ContentKey,
    /// Display name; not guaranteed unique
    pub name: String,
    /// Document to send to the service
    pub payload: Value,
}

impl DesiredRecord {
    pub fn new(key: impl Into<ContentKey>, name: impl Into<String>, payload: Value) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            payload,
        }
    }
}

impl From<&GuideCustomFormat> for DesiredRecord {
    fn from(cf: &GuideCustomFormat) -> Self {
        Self::new(cf.trash_id.clone(), cf.name.clone(), cf.payload.clone())
    }
}

/// One entity as the service currently holds it
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRecord {
    pub id: RemoteId,
    pub name: String,
    pub payload: Value,
}

impl RemoteRecord {
    /// Wraps a fetched document, which must carry `id` and `name`
    pub fn from_document(kind: RecordKind, payload: Value) -> SyncResult<Self> {
        let id = RemoteId::from_document(&payload).ok_or_else(|| SyncError::InvalidRemoteRecord {
            kind,
            reason: "missing 'id'".to_string(),
        })?;

        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::InvalidRemoteRecord {
                kind,
                reason: format!("record {} has no 'name'", id),
            })?
            .to_string();

        Ok(Self { id, name, payload })
    }

    /// Wraps every fetched document of one kind
    pub fn from_documents(kind: RecordKind, documents: Vec<Value>) -> SyncResult<Vec<Self>> {
        documents
            .into_iter()
            .map(|doc| Self::from_document(kind, doc))
            .collect()
    }
}

/// Persisted link between a content key and the remote record it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub trash_id: ContentKey,
    /// Name at the time the entry was written, for log messages only
    pub name: String,
    pub id: RemoteId,
}

impl CacheEntry {
    pub fn new(trash_id: ContentKey, name: impl Into<String>, id: RemoteId) -> Self {
        Self {
            trash_id,
            name: name.into(),
            id,
        }
    }
}

/// How a desired record found its remote counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Identifier remembered from an earlier run
    Cache,
    /// Case-insensitive name match
    Name,
}

/// One unit of work produced by classification
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    /// No remote counterpart; create `payload`
    New {
        key: ContentKey,
        name: String,
        payload: Value,
    },
    /// Remote counterpart differs; replace it with the merged document
    Updated {
        key: ContentKey,
        name: String,
        id: RemoteId,
        payload: Value,
        matched_by: MatchSource,
    },
    /// Remote counterpart already matches
    Unchanged {
        key: ContentKey,
        name: String,
        id: RemoteId,
        matched_by: MatchSource,
    },
    /// Previously created record no longer desired
    Deleted {
        key: ContentKey,
        name: String,
        id: RemoteId,
    },
}

impl Transaction {
    pub fn key(&self) -> &ContentKey {
        match self {
            Transaction::New { key, .. }
            | Transaction::Updated { key, .. }
            | Transaction::Unchanged { key, .. }
            | Transaction::Deleted { key, .. } => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Transaction::New { name, .. }
            | Transaction::Updated { name, .. }
            | Transaction::Unchanged { name, .. }
            | Transaction::Deleted { name, .. } => name,
        }
    }

    /// Remote identifier, known for everything except New
    pub fn remote_id(&self) -> Option<&RemoteId> {
        match self {
            Transaction::New { .. } => None,
            Transaction::Updated { id, .. }
            | Transaction::Unchanged { id, .. }
            | Transaction::Deleted { id, .. } => Some(id),
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Transaction::Unchanged { .. })
    }
}

/// A desired record that could not be classified
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub key: ContentKey,
    pub name: String,
    pub error: MergeError,
}

/// Output of one classification pass
///
/// Transactions for desired records keep their declaration order; deletions
/// follow them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSet {
    pub transactions: Vec<Transaction>,
    /// Records skipped because their document could not be merged
    pub failures: Vec<RecordFailure>,
    /// Cache entries for records removed outside the tool
    pub stale: Vec<CacheEntry>,
}

impl TransactionSet {
    pub fn new_records(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| matches!(t, Transaction::New { .. }))
    }

    pub fn updated(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| matches!(t, Transaction::Updated { .. }))
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| matches!(t, Transaction::Unchanged { .. }))
    }

    pub fn deleted(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(|t| matches!(t, Transaction::Deleted { .. }))
    }

    /// Returns true if applying the set would issue no remote call
    pub fn is_noop(&self) -> bool {
        !self.transactions.iter().any(Transaction::is_mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_record_from_document() {
        let record =
            RemoteRecord::from_document(RecordKind::CustomFormat, json!({ "id": 3, "name": "x" }))
                .unwrap();
        assert_eq!(record.id, RemoteId::from(3));
        assert_eq!(record.name, "x");
    }

    #[test]
    fn test_remote_record_requires_id_and_name() {
        assert!(matches!(
            RemoteRecord::from_document(RecordKind::CustomFormat, json!({ "name": "x" })),
            Err(SyncError::InvalidRemoteRecord { .. })
        ));
        assert!(RemoteRecord::from_document(RecordKind::CustomFormat, json!({ "id": 1 })).is_err());
    }

    #[test]
    fn test_transaction_set_buckets() {
        let set = TransactionSet {
            transactions: vec![
                Transaction::New {
                    key: "a".into(),
                    name: "A".to_string(),
                    payload: json!({}),
                },
                Transaction::Unchanged {
                    key: "b".into(),
                    name: "B".to_string(),
                    id: RemoteId::from(2),
                    matched_by: MatchSource::Cache,
                },
            ],
            ..Default::default()
        };

        assert_eq!(set.new_records().count(), 1);
        assert_eq!(set.unchanged().count(), 1);
        assert_eq!(set.deleted().count(), 0);
        assert!(!set.is_noop());
        assert_eq!(set.transactions[1].remote_id(), Some(&RemoteId::from(2)));
    }

    #[test]
    fn test_cache_entry_serialization() {
        let entry = CacheEntry::new("a1".into(), "Foo", RemoteId::from(9));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({ "trash_id": "a1", "name": "Foo", "id": 9 }));
    }
}
