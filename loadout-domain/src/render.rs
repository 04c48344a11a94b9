//! Human-readable component listing for a composed build.

use loadout_catalog::CatalogStore;
use loadout_types::build::SelectedPart;
use loadout_types::element::ElementCombo;
use loadout_types::ids::{ItemType, Manufacturer, SlotKey};
use std::collections::BTreeMap;

pub(crate) fn component_string(
    catalog: &CatalogStore,
    manufacturer: &Manufacturer,
    item_type: &ItemType,
    combo: Option<&ElementCombo>,
    parts: &BTreeMap<SlotKey, SelectedPart>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", manufacturer.title(), item_type.title()));
    if let Some(combo) = combo {
        out.push_str(&format!("Element: {}\n", combo));
    }
    for (slot, part) in parts {
        let label = catalog
            .slot_rule(slot.code)
            .map(|rule| rule.label.as_str())
            .unwrap_or(part.part_type.as_str());
        out.push_str(&format!(
            "{} #{}: {} [{}]\n",
            label, slot.index, part.name, part.id
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::reference_catalog;
    use loadout_types::catalog::PartFamily;
    use loadout_types::element::Element;
    use loadout_types::ids::{ComboId, PartId};

    #[test]
    fn lists_header_element_and_slots_in_order() {
        let mut parts = BTreeMap::new();
        parts.insert(
            SlotKey::new(13, 1),
            SelectedPart {
                family: PartFamily::Weapon,
                id: PartId(88),
                name: "JAK_PS.part_barrel_01_a".to_string(),
                part_type: "Barrel Accessory".to_string(),
            },
        );
        parts.insert(
            SlotKey::new(12, 0),
            SelectedPart {
                family: PartFamily::Weapon,
                id: PartId(85),
                name: "JAK_PS.part_barrel_01".to_string(),
                part_type: "Barrel".to_string(),
            },
        );
        let combo = ElementCombo {
            id: ComboId(29),
            primary_element: Element::Shock,
            secondary_element: Some(Element::Radiation),
            underbarrel: true,
        };

        let text = component_string(
            reference_catalog(),
            &Manufacturer::new("jakobs"),
            &ItemType::new("pistol"),
            Some(&combo),
            &parts,
        );
        assert_eq!(
            text,
            "Jakobs Pistol\n\
             Element: Shock + Radiation (underbarrel)\n\
             Barrel #0: JAK_PS.part_barrel_01 [85]\n\
             Barrel Accessory #1: JAK_PS.part_barrel_01_a [88]\n"
        );
    }

    #[test]
    fn bare_build_is_just_the_header() {
        let text = component_string(
            reference_catalog(),
            &Manufacturer::new("maliwan"),
            &ItemType::new("energy_shield"),
            None,
            &BTreeMap::new(),
        );
        assert_eq!(text, "Maliwan Energy Shield\n");
    }
}
