use loadout_catalog::Predicate;
use loadout_catalog::requirements::parse;
use loadout_types::ids::{ItemType, Manufacturer, PartId};
use proptest::prelude::*;

fn atom() -> impl Strategy<Value = Predicate> {
    prop_oneof![
        (0u32..1000).prop_map(|id| Predicate::HasPart(PartId(id))),
        prop::sample::select(vec!["pistol", "smg", "assault_rifle", "energy_shield"])
            .prop_map(|t| Predicate::ItemType(ItemType::new(t))),
        prop::sample::select(vec!["jakobs", "maliwan", "tediore"])
            .prop_map(|m| Predicate::Manufacturer(Manufacturer::new(m))),
    ]
}

fn predicate() -> impl Strategy<Value = Predicate> {
    atom().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 2..4).prop_map(Predicate::All),
            prop::collection::vec(inner, 2..4).prop_map(Predicate::Any),
        ]
    })
}

/// Parsing flattens directly nested groups of the same combinator.
fn flatten(predicate: Predicate) -> Predicate {
    match predicate {
        Predicate::All(items) => Predicate::All(
            items
                .into_iter()
                .map(flatten)
                .flat_map(|p| match p {
                    Predicate::All(inner) => inner,
                    other => vec![other],
                })
                .collect(),
        ),
        Predicate::Any(items) => Predicate::Any(
            items
                .into_iter()
                .map(flatten)
                .flat_map(|p| match p {
                    Predicate::Any(inner) => inner,
                    other => vec![other],
                })
                .collect(),
        ),
        other => other,
    }
}

proptest! {
    #[test]
    fn parser_never_panics(text in "\\PC{0,40}") {
        let _ = parse(&text);
    }

    #[test]
    fn rendered_predicates_parse_back(p in predicate()) {
        let text = p.to_string();
        let parsed = parse(&text).expect("rendered predicate parses");
        prop_assert_eq!(flatten(parsed), flatten(p));
    }
}
