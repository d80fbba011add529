//! # Event Journal
//!
//! Append-only record of every state change the vault commits. Entries are
//! numbered from 1 with no gaps, so a consumer can resume with
//! [`EventJournal::since`] after the last sequence number it processed.
//!
//! Rejected operations leave no trace here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gamevault_protocol::{Address, Amount, AssetId};

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// Tokens pulled from `account` and credited to it.
    Deposited {
        asset: AssetId,
        account: Address,
        amount: Amount,
    },
    /// Native currency wrapped and credited to `account`.
    NativeDeposited {
        asset: AssetId,
        account: Address,
        amount: Amount,
    },
    /// Tokens debited from `account` and pushed to it.
    Withdrawn {
        asset: AssetId,
        account: Address,
        amount: Amount,
    },
    /// Wrapped balance debited from `account` and paid out as native currency.
    NativeWithdrawn {
        asset: AssetId,
        account: Address,
        amount: Amount,
    },
    /// Internal movement between two accounts.
    Transferred {
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Amount,
        net: Amount,
        fee: Amount,
    },
    AssetAdded {
        asset: AssetId,
    },
    AssetRemoved {
        asset: AssetId,
    },
    FeeSwitched {
        fee_on: bool,
    },
    ControllerChanged {
        previous: Address,
        current: Address,
    },
}

/// A journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the journal, starting at 1.
    pub seq: u64,
    /// Globally unique id.
    pub id: Uuid,
    /// Wall-clock time the change was committed.
    pub recorded_at: DateTime<Utc>,
    /// What happened.
    pub event: VaultEvent,
}

/// Ordered, append-only list of [`EventRecord`]s.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventJournal {
    records: Vec<EventRecord>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` and returns its sequence number.
    pub fn record(&mut self, event: VaultEvent) -> u64 {
        let seq = self.next_seq();
        self.records.push(EventRecord {
            seq,
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            event,
        });
        seq
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with a sequence number strictly greater than `seq`.
    pub fn since(&self, seq: u64) -> &[EventRecord] {
        let start = self.records.partition_point(|r| r.seq <= seq);
        &self.records[start..]
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_seq(&self) -> u64 {
        self.records.last().map_or(1, |r| r.seq + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(label: &str) -> VaultEvent {
        VaultEvent::AssetAdded {
            asset: AssetId::derive(label),
        }
    }

    #[test]
    fn sequence_starts_at_one_and_is_dense() {
        let mut journal = EventJournal::new();
        assert!(journal.is_empty());
        assert_eq!(journal.record(added("A")), 1);
        assert_eq!(journal.record(added("B")), 2);
        assert_eq!(journal.record(VaultEvent::FeeSwitched { fee_on: true }), 3);

        let seqs: Vec<u64> = journal.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(journal.last().map(|r| r.seq), Some(3));
    }

    #[test]
    fn since_returns_strictly_newer() {
        let mut journal = EventJournal::new();
        for label in ["A", "B", "C", "D"] {
            journal.record(added(label));
        }
        assert_eq!(journal.since(0).len(), 4);
        assert_eq!(journal.since(2).first().map(|r| r.seq), Some(3));
        assert!(journal.since(4).is_empty());
        assert!(journal.since(99).is_empty());
    }

    #[test]
    fn record_ids_are_unique() {
        let mut journal = EventJournal::new();
        journal.record(added("A"));
        journal.record(added("A"));
        let records = journal.records();
        assert_ne!(records[0].id, records[1].id);
        assert!(records[0].recorded_at <= records[1].recorded_at);
    }

    #[test]
    fn event_json_roundtrip() {
        let event = VaultEvent::Transferred {
            asset: AssetId::derive("MOCK"),
            from: Address::derive("alice"),
            to: Address::derive("bob"),
            amount: 1_000,
            net: 997,
            fee: 3,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("Transferred"));
        let recovered: VaultEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered, event);
    }
}
