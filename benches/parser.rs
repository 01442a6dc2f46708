use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use git_versioner::git::parser::{parse_commit_list, parse_short_stats, parse_timestamp};

// Sample git outputs for realistic benchmarking
const FULL_SHORTSTAT: &str = " 12 files changed, 340 insertions(+), 27 deletions(-)\n";
const INSERT_ONLY_SHORTSTAT: &str = " 1 file changed, 1 insertion(+)\n";
const LOCALIZED_SHORTSTAT: &str = " 2 Dateien geändert, 5 Zeilen hinzugefügt(+), 1 Zeile entfernt(-)\n";

fn generate_rev_list(num_commits: usize) -> String {
    let mut output = String::new();
    for i in 0..num_commits {
        output.push_str(&format!("{:040x}\n", i));
    }
    output
}

fn bench_parse_short_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_short_stats");

    group.bench_with_input(BenchmarkId::new("full", "3 segments"), &FULL_SHORTSTAT, |b, input| {
        b.iter(|| parse_short_stats(black_box(input)))
    });

    group.bench_with_input(
        BenchmarkId::new("partial", "2 segments"),
        &INSERT_ONLY_SHORTSTAT,
        |b, input| b.iter(|| parse_short_stats(black_box(input))),
    );

    group.bench_with_input(
        BenchmarkId::new("localized", "3 segments"),
        &LOCALIZED_SHORTSTAT,
        |b, input| b.iter(|| parse_short_stats(black_box(input))),
    );

    group.finish();
}

fn bench_parse_commit_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_commit_list");

    for count in [100, 10_000, 100_000] {
        let rev_list = generate_rev_list(count);
        group.bench_with_input(
            BenchmarkId::new("commits", count),
            &rev_list,
            |b, input| b.iter(|| parse_commit_list(black_box(input).lines())),
        );
    }

    group.finish();
}

fn bench_parse_timestamp(c: &mut Criterion) {
    c.bench_function("parse_timestamp", |b| {
        b.iter(|| parse_timestamp(black_box("'1700000000'")))
    });
}

criterion_group!(
    benches,
    bench_parse_short_stats,
    bench_parse_commit_list,
    bench_parse_timestamp
);
criterion_main!(benches);
