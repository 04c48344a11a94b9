use loadout_types::catalog::{GENERIC_MANUFACTURER_PART, WeaponPartDefinition};

/// Part-string markers for rows filed under the generic manufacturer type.
/// Licensed markers come first: they are also cross-compatible.
const GENERIC_RULES: &[(&str, &str, bool)] = &[
    (".part_barrel_licensed_", "Barrel Accessory", true),
    (".part_mag_torgue_", "Magazine", true),
    (".part_shield_", "Body Accessory", false),
    (".part_grip_", "Grip", false),
];

/// Resolves the true slot type of a generic weapon row. Returns `false` when
/// the row is generic and no marker matches.
pub(crate) fn reclassify(part: &mut WeaponPartDefinition) -> bool {
    if part.part_type != GENERIC_MANUFACTURER_PART {
        return true;
    }
    let lower = part.part_string.to_ascii_lowercase();
    match GENERIC_RULES.iter().find(|(marker, _, _)| lower.contains(marker)) {
        Some((_, part_type, licensed)) => {
            part.part_type = (*part_type).to_string();
            part.cross_compatible |= *licensed;
            true
        }
        None => false,
    }
}
