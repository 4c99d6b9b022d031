//! Cross-cutting behavior of [`Table`] and [`Array`] that's easiest to
//! exercise end-to-end rather than inside each module's own unit tests.

use arenapool::config::AllocatorConfig;
use arenapool::pool::Pool;
use arenapool::{Array, Table};

#[test]
fn table_overlay_preserves_duplicates_and_order() {
    let pool = Pool::new(AllocatorConfig::default());
    let defaults = Table::new(&pool);
    defaults.set("Accept", "text/html");
    defaults.set("X-Request-Id", "default");

    let overrides = Table::new(&pool);
    overrides.set("X-Request-Id", "abc-123");
    overrides.add("X-Extra", "1");

    let effective = defaults.overlay(&pool, &overrides);

    assert_eq!(
        effective.get_all("X-Request-Id"),
        vec!["default".to_string(), "abc-123".to_string()]
    );
    assert_eq!(effective.get("Accept").as_deref(), Some("text/html"));
    assert_eq!(effective.get("X-Extra").as_deref(), Some("1"));
}

#[test]
fn table_lookup_ignores_header_name_case_everywhere() {
    let pool = Pool::new(AllocatorConfig::default());
    let headers = Table::new(&pool);
    headers.set("Content-Length", "42");
    headers.merge("content-length", "also-42");

    assert_eq!(
        headers.get("CONTENT-LENGTH").as_deref(),
        Some("42, also-42")
    );
}

#[test]
fn array_of_pool_allocated_ids_grows_across_many_pushes() {
    let pool = Pool::new(AllocatorConfig::builder().min_alloc(32).build().unwrap());
    let ids: Array<u64> = Array::new(&pool);
    for i in 0..500 {
        ids.push(i);
    }
    assert_eq!(ids.len(), 500);
    assert_eq!(ids.as_slice()[0], 0);
    assert_eq!(ids.as_slice()[499], 499);
}

#[test]
fn array_copy_to_survives_the_source_pool_clearing() {
    let source = Pool::new(AllocatorConfig::default());
    let sink = Pool::new(AllocatorConfig::default());

    let original: Array<i32> = Array::new(&source);
    original.extend_from(&[10, 20, 30]);
    let copy = original.copy_to(&sink);

    source.clear();
    assert_eq!(copy.as_slice(), &[10, 20, 30]);
}
