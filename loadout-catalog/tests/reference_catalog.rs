use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use loadout_catalog::{CatalogError, CatalogStore, ComboQuery, Predicate};
use loadout_types::catalog::{PartDefinition, PartFamily};
use loadout_types::element::Element;
use loadout_types::ids::{ComboId, ItemType, Manufacturer, PartId};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn catalog_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../catalog")
}

fn reference() -> CatalogStore {
    CatalogStore::load(&catalog_dir()).expect("reference catalog loads")
}

fn ids(parts: &[&loadout_catalog::CatalogPart]) -> Vec<u32> {
    parts.iter().map(|p| p.id().0).collect()
}

#[test]
fn shock_radiation_underbarrel_is_combo_29() {
    let store = reference();
    let combo = store
        .find_combo(Element::Shock, Some(Element::Radiation), true)
        .expect("combo present");
    assert_eq!(combo.id, ComboId(29));
}

#[test]
fn kinetic_never_carries_a_secondary() {
    let store = reference();
    assert!(
        store
            .find_combo(Element::Kinetic, Some(Element::Radiation), false)
            .is_none()
    );
    let kinetic = store.element_combos_for(&ComboQuery::primary(Element::Kinetic));
    assert_eq!(kinetic.len(), 1);
    assert!(kinetic[0].is_single());
}

#[test]
fn partial_combo_lookups_narrow_progressively() {
    let store = reference();
    let by_primary = store.element_combos_for(&ComboQuery::primary(Element::Shock));
    let by_pair = store.element_combos_for(&ComboQuery::primary(Element::Shock).secondary(Element::Radiation));
    let exact = store.element_combos_for(
        &ComboQuery::primary(Element::Shock)
            .secondary(Element::Radiation)
            .underbarrel(true),
    );
    assert_eq!(by_primary.len(), 9);
    assert_eq!(by_pair.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![29, 30]);
    assert_eq!(exact.iter().map(|c| c.id.0).collect::<Vec<_>>(), vec![29]);
}

#[test]
fn jakobs_does_not_make_smgs() {
    let store = reference();
    assert!(!store.is_valid_pairing(&Manufacturer::new("jakobs"), &ItemType::new("smg")));
    assert!(store.is_valid_pairing(&Manufacturer::new("Jakobs"), &ItemType::new("pistol")));
    assert!(
        store
            .parts_for(&Manufacturer::new("jakobs"), &ItemType::new("smg"), None)
            .is_empty()
    );
}

#[test]
fn parts_for_is_ascending_and_includes_licensed_parts() {
    let store = reference();
    let accessories = store.parts_for(
        &Manufacturer::new("maliwan"),
        &ItemType::new("smg"),
        Some("Barrel Accessory"),
    );
    assert_eq!(ids(&accessories), vec![168, 169, 170, 236, 451]);

    let all = store.parts_for(&Manufacturer::new("maliwan"), &ItemType::new("smg"), None);
    let all_ids = ids(&all);
    let mut sorted = all_ids.clone();
    sorted.sort();
    assert_eq!(all_ids, sorted);
    assert!(all_ids.contains(&526), "licensed torgue magazine fits smgs");
    assert!(!all_ids.contains(&161), "jakobs licensed barrel excludes smgs");
}

#[test]
fn generic_rows_are_reclassified_on_load() {
    let store = reference();
    let part = store
        .part(PartFamily::Weapon, PartId(84))
        .expect("shield segment row");
    assert_eq!(part.definition.part_type(), "Body Accessory");
    assert!(!part.definition.is_cross_compatible());

    let licensed = store.part(PartFamily::Weapon, PartId(451)).expect("licensed");
    assert_eq!(licensed.definition.part_type(), "Barrel Accessory");
    assert!(licensed.definition.is_cross_compatible());
}

#[test]
fn shield_parts_filter_by_shield_kind() {
    let store = reference();
    let perks = store.parts_for(&Manufacturer::new("maliwan"), &ItemType::new("energy_shield"), None);
    let perk_ids = ids(&perks);
    assert!(perk_ids.contains(&1), "general perks fit energy shields");
    assert!(perk_ids.contains(&16), "energy perks fit energy shields");
    assert!(!perk_ids.contains(&20), "armour perks do not");
}

#[test]
fn repeat_repkit_rows_stay_distinct() {
    let store = reference();
    for offset in 0..23 {
        let original = store
            .part(PartFamily::Repkit, PartId(52 + offset))
            .expect("original row");
        let repeat = store
            .part(PartFamily::Repkit, PartId(75 + offset))
            .expect("repeat row");
        assert_ne!(original.id(), repeat.id());
        match (&original.definition, &repeat.definition) {
            (PartDefinition::Repkit(a), PartDefinition::Repkit(b)) => {
                assert_eq!(a.name, b.name);
                assert_eq!(a.description, b.description);
            }
            other => panic!("unexpected definitions: {other:?}"),
        }
    }
}

#[test]
fn requirements_are_parsed_once_and_cached() {
    let store = reference();
    let accessory = store
        .part(PartFamily::Weapon, PartId(87))
        .expect("barrel accessory");
    assert_eq!(accessory.predicate, Predicate::HasPart(PartId(85)));
    assert_eq!(
        store.parse_requirements("part:85").expect("parse"),
        accessory.predicate
    );
}

#[test]
fn summary_reports_counts_and_fingerprint() {
    let store = reference();
    let summary = store.summary();
    assert_eq!(summary.element_combos, 46);
    assert_eq!(summary.parts.get(&PartFamily::Repkit), Some(&97));
    assert_eq!(summary.parts.get(&PartFamily::Shield), Some(&24));
    assert_eq!(summary.fingerprint, store.fingerprint());
    assert_eq!(reference().fingerprint(), store.fingerprint());
}

fn copy_catalog(to: &Utf8Path) {
    let from = catalog_dir();
    fs::create_dir_all(to.join("parts")).expect("mkdir");
    fs::copy(from.join("catalog.json"), to.join("catalog.json")).expect("copy manifest");
    for entry in fs::read_dir(from.join("parts")).expect("read parts") {
        let entry = entry.expect("entry");
        let name = entry.file_name();
        fs::copy(entry.path(), to.join("parts").join(name.to_string_lossy().as_ref()))
            .expect("copy shard");
    }
}

#[test]
fn duplicate_row_in_extra_shard_aborts_load() {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    copy_catalog(&root);
    fs::write(
        root.join("parts/zz_extra.json"),
        r#"{"schema": "loadout.parts.v1", "family": "gadget",
            "parts": [{"id": 1, "name": "Singularity Copy", "perk_type": "Payload"}]}"#,
    )
    .expect("write shard");

    let err = CatalogStore::load(&root).expect_err("duplicate gadget id");
    assert!(matches!(err, CatalogError::Duplicate { collection: "parts", .. }));
}

#[test]
fn dangling_requirement_in_extra_shard_aborts_load() {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    copy_catalog(&root);
    fs::write(
        root.join("parts/zz_extra.json"),
        r#"{"schema": "loadout.parts.v1", "family": "gadget",
            "parts": [{"id": 500, "name": "Orphan", "perk_type": "Augment", "requirements": "part:499"}]}"#,
    )
    .expect("write shard");

    let err = CatalogStore::load(&root).expect_err("dangling");
    assert!(matches!(err, CatalogError::DanglingReference { target: "part", .. }));
}
