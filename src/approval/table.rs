use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::approval::slot::DecisionSlot;
use crate::approval::{ApprovalRequest, PendingSummary};
use crate::decision::Decision;
use crate::error::{GatehookError, Result};

/// One in-flight approval request: the request data plus its decision slot.
#[derive(Debug)]
pub struct PendingEntry {
    pub request: ApprovalRequest,
    slot: DecisionSlot,
}

impl PendingEntry {
    fn new(request: ApprovalRequest) -> (Arc<Self>, oneshot::Receiver<Decision>) {
        let (slot, rx) = DecisionSlot::new();
        (Arc::new(Self { request, slot }), rx)
    }

    /// Attempt to resolve this entry. Returns `true` iff this call won.
    pub fn resolve(&self, decision: Decision) -> bool {
        self.slot.resolve(decision)
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.is_resolved()
    }

    fn summary(&self) -> PendingSummary {
        PendingSummary {
            request_id: self.request.request_id.clone(),
            tool_name: self.request.tool_name.clone(),
            input: self.request.input.clone(),
            tool_use_id: self.request.tool_use_id.clone(),
        }
    }
}

/// The table of in-flight approval requests, keyed by request id.
///
/// Owns every [`PendingEntry`] from registration until the coordinator
/// observes resolution and removes it. Map operations are O(1) under the
/// shard locks; nothing is ever held across an await.
pub struct PendingTable {
    entries: DashMap<String, Arc<PendingEntry>>,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert a new entry. Ids are uuid-generated, so a collision means an
    /// internal bug; it fails loudly rather than overwriting.
    pub fn register(
        &self,
        request: ApprovalRequest,
    ) -> Result<(Arc<PendingEntry>, oneshot::Receiver<Decision>)> {
        match self.entries.entry(request.request_id.clone()) {
            Entry::Occupied(_) => Err(GatehookError::DuplicateRequest {
                request_id: request.request_id,
            }),
            Entry::Vacant(vacant) => {
                let (entry, rx) = PendingEntry::new(request);
                vacant.insert(entry.clone());
                Ok((entry, rx))
            }
        }
    }

    pub fn get(&self, request_id: &str) -> Option<Arc<PendingEntry>> {
        self.entries.get(request_id).map(|e| e.value().clone())
    }

    /// Idempotent: removing an absent id is a no-op.
    pub fn remove(&self, request_id: &str) {
        self.entries.remove(request_id);
    }

    /// Snapshot of everything currently pending.
    pub fn list(&self) -> Vec<PendingSummary> {
        self.entries.iter().map(|e| e.value().summary()).collect()
    }

    /// Remove and return every entry. Used by the shutdown path to deny-all.
    pub fn drain(&self) -> Vec<Arc<PendingEntry>> {
        let ids: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.iter()
            .filter_map(|id| self.entries.remove(id).map(|(_, entry)| entry))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_request(tool: &str) -> ApprovalRequest {
        ApprovalRequest::new(tool, json!({"command": "echo hi"}), None, None)
    }

    #[test]
    fn register_get_remove() {
        let table = PendingTable::new();
        let request = make_request("Bash");
        let id = request.request_id.clone();

        let (entry, _rx) = table.register(request).unwrap();
        assert_eq!(entry.request.tool_name, "Bash");
        assert!(table.get(&id).is_some());

        table.remove(&id);
        assert!(table.get(&id).is_none());

        // removing again is a no-op
        table.remove(&id);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let table = PendingTable::new();
        let request = make_request("Bash");
        let mut duplicate = make_request("Write");
        duplicate.request_id = request.request_id.clone();

        let _held = table.register(request).unwrap();
        let err = table.register(duplicate).unwrap_err();
        assert!(matches!(err, GatehookError::DuplicateRequest { .. }));
    }

    #[test]
    fn list_contains_each_pending_id_once() {
        let table = PendingTable::new();
        let mut ids = Vec::new();
        let mut held = Vec::new();
        for _ in 0..5 {
            let request = make_request("Bash");
            ids.push(request.request_id.clone());
            held.push(table.register(request).unwrap());
        }

        let mut listed: Vec<String> = table.list().into_iter().map(|s| s.request_id).collect();
        listed.sort();
        ids.sort();
        assert_eq!(listed, ids);
    }

    #[test]
    fn drain_empties_the_table() {
        let table = PendingTable::new();
        let mut held = Vec::new();
        for _ in 0..3 {
            held.push(table.register(make_request("Bash")).unwrap());
        }

        let drained = table.drain();
        assert_eq!(drained.len(), 3);
        assert!(table.is_empty());
    }
}
