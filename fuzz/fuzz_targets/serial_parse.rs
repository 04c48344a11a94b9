#![no_main]

use camino::Utf8PathBuf;
use libfuzzer_sys::fuzz_target;
use loadout_catalog::CatalogStore;
use loadout_domain::{BuildComposer, ResolverConfig};
use std::sync::OnceLock;

fn catalog() -> &'static CatalogStore {
    static STORE: OnceLock<CatalogStore> = OnceLock::new();
    STORE.get_or_init(|| {
        let dir = Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../catalog");
        CatalogStore::load(&dir).expect("reference catalog loads")
    })
}

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else { return };

    let composer = BuildComposer::new(catalog(), ResolverConfig::default());
    if let Ok(build) = composer.parse(s) {
        let again = composer.parse(&build.serial).expect("canonical serial parses");
        assert_eq!(again, build);
    }
});
