//! The two-pass pool formatter: in-place writes when they fit, a single
//! grown allocation when they don't.

use arenapool::config::AllocatorConfig;
use arenapool::pool::Pool;
use arenapool::pformat;

#[test]
fn format_exactly_filling_the_active_block_does_not_corrupt_later_allocations() {
    let pool = Pool::new(AllocatorConfig::builder().min_alloc(64).build().unwrap());

    let s = pformat!(pool, "{}", "x".repeat(1000));
    assert_eq!(s.len(), 1000);

    // A later allocation must land on fresh, unrelated memory.
    let tag = pool.strdup("tag");
    assert_eq!(tag, "tag");
}

#[test]
fn repeated_overflowing_formats_each_produce_correct_output() {
    let pool = Pool::new(AllocatorConfig::builder().min_alloc(32).build().unwrap());

    let outputs: Vec<String> = (0..20)
        .map(|i| pformat!(pool, "entry-{i}-{}", "x".repeat(i * 7)).to_string())
        .collect();

    for (i, out) in outputs.iter().enumerate() {
        let expected = format!("entry-{i}-{}", "x".repeat(i * 7));
        assert_eq!(out, &expected);
    }
}

#[test]
fn format_with_no_arguments_produces_an_empty_string() {
    let pool = Pool::new(AllocatorConfig::default());
    let s = pool.format(format_args!(""));
    assert_eq!(s, "");
}

#[test]
fn small_format_reuses_the_active_block_rather_than_growing() {
    let pool = Pool::new(AllocatorConfig::default());
    pool.alloc(16).unwrap();
    let before = pool.bytes_in_pool();

    let _ = pformat!(pool, "{}", "short");

    assert_eq!(pool.bytes_in_pool(), before);
}
