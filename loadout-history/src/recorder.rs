use crate::diff::parts_diff;
use chrono::{DateTime, Utc};
use loadout_types::build::Build;
use loadout_types::history::{EditHistoryEntry, EditType};
use loadout_types::schema::LOADOUT_HISTORY_V1;
use tracing::debug;

/// Source of entry timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Builds history entries from before/after snapshots. Stateless apart from
/// its clock; ordering across calls is the ledger's concern.
#[derive(Debug, Clone, Default)]
pub struct EditHistoryRecorder<C = SystemClock> {
    clock: C,
}

impl EditHistoryRecorder<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> EditHistoryRecorder<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns `None` when there is nothing to record: neither build is
    /// present, or both carry the same serial.
    pub fn record(
        &self,
        session_id: &str,
        user_id: u64,
        previous: Option<&Build>,
        next: Option<&Build>,
    ) -> Option<EditHistoryEntry> {
        let (edit_type, subject) = match (previous, next) {
            (None, None) => return None,
            (Some(before), Some(after)) if before.serial == after.serial => {
                debug!(serial = %after.serial, "identical builds, nothing to record");
                return None;
            }
            (None, Some(after)) => (EditType::Create, after),
            (Some(before), None) => (EditType::Delete, before),
            (Some(_), Some(after)) => (EditType::Update, after),
        };

        Some(EditHistoryEntry {
            schema: LOADOUT_HISTORY_V1.to_string(),
            session_id: session_id.to_string(),
            user_id,
            timestamp: self.clock.now(),
            edit_type,
            item_name: subject.display_name(),
            item_type: subject.item_type.clone(),
            manufacturer: subject.manufacturer.clone(),
            serial: subject.serial.clone(),
            component_string: subject.component_string.clone(),
            parts_json: parts_diff(previous, next),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use loadout_types::build::SelectedPart;
    use loadout_types::catalog::PartFamily;
    use loadout_types::ids::{ItemType, Manufacturer, PairingId, PartId, SlotKey};
    use std::collections::BTreeMap;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn recorder() -> EditHistoryRecorder<FixedClock> {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        EditHistoryRecorder::with_clock(FixedClock(at))
    }

    fn build(barrel: u32) -> Build {
        let mut selected_parts = BTreeMap::new();
        selected_parts.insert(
            SlotKey::new(12, 0),
            SelectedPart {
                family: PartFamily::Weapon,
                id: PartId(barrel),
                name: format!("barrel {barrel}"),
                part_type: "Barrel".to_string(),
            },
        );
        Build {
            manufacturer: Manufacturer::new("jakobs"),
            item_type: ItemType::new("pistol"),
            pairing_id: PairingId(5),
            selected_parts,
            element_combo: None,
            serial: format!("LB1|5|0|12.0={barrel}"),
            component_string: format!("Jakobs Pistol\nBarrel #0: barrel {barrel} [{barrel}]\n"),
        }
    }

    #[test]
    fn create_names_the_item_and_adds_every_slot() {
        let entry = recorder()
            .record("session-1", 42, None, Some(&build(85)))
            .expect("entry");
        assert_eq!(entry.schema, LOADOUT_HISTORY_V1);
        assert_eq!(entry.edit_type, EditType::Create);
        assert_eq!(entry.item_name, "Jakobs Pistol");
        assert_eq!(entry.user_id, 42);
        assert_eq!(entry.parts_json.added.len(), 1);
    }

    #[test]
    fn delete_carries_the_deleted_serial() {
        let entry = recorder()
            .record("session-1", 42, Some(&build(85)), None)
            .expect("entry");
        assert_eq!(entry.edit_type, EditType::Delete);
        assert_eq!(entry.serial, "LB1|5|0|12.0=85");
        assert!(entry.component_string.contains("[85]"));
        assert_eq!(entry.parts_json.removed.len(), 1);
    }

    #[test]
    fn update_records_the_new_build() {
        let entry = recorder()
            .record("s", 1, Some(&build(85)), Some(&build(86)))
            .expect("entry");
        assert_eq!(entry.edit_type, EditType::Update);
        assert_eq!(entry.serial, "LB1|5|0|12.0=86");
        assert_eq!(entry.parts_json.changed.len(), 1);
        assert!(entry.parts_json.added.is_empty());
    }

    #[test]
    fn identical_or_absent_builds_record_nothing() {
        let r = recorder();
        assert!(r.record("s", 1, Some(&build(85)), Some(&build(85))).is_none());
        assert!(r.record("s", 1, None, None).is_none());
    }

    #[test]
    fn entry_timestamp_comes_from_the_clock() {
        let r = recorder();
        let entry = r.record("s", 1, None, Some(&build(85))).expect("entry");
        assert_eq!(entry.timestamp, r.clock().0);
    }
}
