use loadout_types::build::Build;
use loadout_types::history::{ElementChange, PartChange, PartsDiff};
use std::collections::BTreeSet;

/// Minimal slot-level difference between two builds.
///
/// A missing `previous` lists every slot of `next` as added; a missing `next`
/// lists every slot of `previous` as removed. Slots holding the same part on
/// both sides are left out.
pub fn parts_diff(previous: Option<&Build>, next: Option<&Build>) -> PartsDiff {
    let mut diff = PartsDiff::default();
    let before = previous.map(|b| &b.selected_parts);
    let after = next.map(|b| &b.selected_parts);

    let slots: BTreeSet<_> = before
        .into_iter()
        .chain(after)
        .flat_map(|parts| parts.keys().copied())
        .collect();

    for slot in slots {
        let old = before.and_then(|parts| parts.get(&slot));
        let new = after.and_then(|parts| parts.get(&slot));
        match (old, new) {
            (None, Some(part)) => {
                diff.added.insert(slot, part.clone());
            }
            (Some(part), None) => {
                diff.removed.insert(slot, part.clone());
            }
            (Some(from), Some(to)) if from.family != to.family || from.id != to.id => {
                diff.changed.insert(
                    slot,
                    PartChange {
                        from: from.clone(),
                        to: to.clone(),
                    },
                );
            }
            _ => {}
        }
    }

    let combo_before = previous.and_then(|b| b.element_combo.as_ref()).map(|c| c.id);
    let combo_after = next.and_then(|b| b.element_combo.as_ref()).map(|c| c.id);
    if combo_before != combo_after {
        diff.element = Some(ElementChange {
            from: combo_before,
            to: combo_after,
        });
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadout_types::build::SelectedPart;
    use loadout_types::catalog::PartFamily;
    use loadout_types::element::{Element, ElementCombo};
    use loadout_types::ids::{ComboId, ItemType, Manufacturer, PairingId, PartId, SlotKey};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn build(parts: &[(u16, u8, u32)], combo: Option<u32>) -> Build {
        let selected_parts: BTreeMap<_, _> = parts
            .iter()
            .map(|&(code, index, id)| {
                (
                    SlotKey::new(code, index),
                    SelectedPart {
                        family: PartFamily::Weapon,
                        id: PartId(id),
                        name: format!("part {id}"),
                        part_type: "Barrel".to_string(),
                    },
                )
            })
            .collect();
        Build {
            manufacturer: Manufacturer::new("jakobs"),
            item_type: ItemType::new("pistol"),
            pairing_id: PairingId(5),
            selected_parts,
            element_combo: combo.map(|id| ElementCombo {
                id: ComboId(id),
                primary_element: Element::Fire,
                secondary_element: None,
                underbarrel: false,
            }),
            serial: String::new(),
            component_string: String::new(),
        }
    }

    #[test]
    fn one_swapped_slot_of_five_is_one_change() {
        let before = build(&[(10, 0, 81), (12, 0, 85), (14, 0, 90), (15, 0, 92), (17, 0, 96)], None);
        let after = build(&[(10, 0, 81), (12, 0, 85), (14, 0, 91), (15, 0, 92), (17, 0, 96)], None);
        let diff = parts_diff(Some(&before), Some(&after));
        assert_eq!(diff.len(), 1);
        let change = &diff.changed[&SlotKey::new(14, 0)];
        assert_eq!((change.from.id, change.to.id), (PartId(90), PartId(91)));
    }

    #[test]
    fn create_and_delete_list_every_slot() {
        let b = build(&[(10, 0, 81), (12, 0, 85)], Some(2));
        let created = parts_diff(None, Some(&b));
        assert_eq!(created.added.len(), 2);
        assert!(created.removed.is_empty());
        assert_eq!(
            created.element,
            Some(ElementChange {
                from: None,
                to: Some(ComboId(2)),
            })
        );

        let deleted = parts_diff(Some(&b), None);
        assert_eq!(deleted.removed.len(), 2);
        assert!(deleted.added.is_empty());
    }

    #[test]
    fn additions_removals_and_element_are_separated() {
        let before = build(&[(10, 0, 81), (13, 0, 87)], Some(2));
        let after = build(&[(10, 0, 81), (15, 0, 92)], Some(29));
        let diff = parts_diff(Some(&before), Some(&after));
        assert_eq!(diff.added.keys().copied().collect::<Vec<_>>(), vec![SlotKey::new(15, 0)]);
        assert_eq!(diff.removed.keys().copied().collect::<Vec<_>>(), vec![SlotKey::new(13, 0)]);
        assert!(diff.changed.is_empty());
        assert_eq!(diff.element.map(|e| e.to), Some(Some(ComboId(29))));
    }

    #[test]
    fn identical_builds_diff_to_nothing() {
        let b = build(&[(10, 0, 81)], Some(2));
        assert!(parts_diff(Some(&b), Some(&b)).is_empty());
        assert!(parts_diff(None, None).is_empty());
    }
}
