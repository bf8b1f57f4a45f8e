use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sharedcache_agent::options::{find_option, AgentOptions};

const TYPICAL: &str =
    "cacheDir=/tmp/sharedClasses,expectedCacheCount=5,useCommandLineValues=false,deleteCaches=true,cachePrefix=wl_";

// Many near-misses before the real key: embedded in values, missing '=',
// prefixed by other characters.
fn adversarial() -> String {
    let mut options = String::new();
    for i in 0..2_000 {
        options.push_str(&format!("xcachePrefix{i}=cachePrefix,cachePrefix{i},"));
    }
    options.push_str("cachePrefix=wl_");
    options
}

fn bench_find_option(c: &mut Criterion) {
    c.bench_function("find_option_typical", |b| {
        b.iter(|| find_option(black_box(TYPICAL), black_box("cachePrefix")))
    });

    let hostile = adversarial();
    c.bench_function("find_option_adversarial", |b| {
        b.iter(|| find_option(black_box(&hostile), black_box("cachePrefix")))
    });
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("agent_options_parse", |b| {
        b.iter(|| AgentOptions::parse(black_box(TYPICAL)))
    });
}

criterion_group!(benches, bench_find_option, bench_parse);
criterion_main!(benches);
