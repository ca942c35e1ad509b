//! Performance benchmarks for nautilus-tmsu.
//!
//! Run with: cargo bench
//!
//! Target performance:
//! - Parsing a directory's worth of tag listings: < 1ms
//! - Queue round trip with an instant runner: < 100us

use std::io;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nautilus_tmsu::completion::{self, TagCompleter};
use nautilus_tmsu::dispatch;
use nautilus_tmsu::executor::RawOutput;
use nautilus_tmsu::tmsu::{join_tags, parse_tag_list, split_tags};
use nautilus_tmsu::{Command, ProcessRunner, TaskQueue};

fn tags_output(count: usize) -> String {
    let mut output = String::from("/home/u/media/a.jpg\n");
    for i in 0..count {
        output.push_str(&format!("tag\\ number\\ {}\n", i));
    }
    output
}

/// Benchmark parsing `tmsu tags -1` output.
fn bench_parse_tags(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_tag_list");

    for count in [1, 10, 100] {
        let output = tags_output(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &output, |b, output| {
            b.iter(|| black_box(parse_tag_list(black_box(output))))
        });
    }

    group.finish();
}

/// Benchmark escaping tags for the command line and splitting typed input.
fn bench_tag_arguments(c: &mut Criterion) {
    let tags: Vec<String> = (0..20).map(|i| format!("tag number {}", i)).collect();
    let typed = join_tags(&tags);

    c.bench_function("join_tags", |b| b.iter(|| black_box(join_tags(black_box(&tags)))));
    c.bench_function("split_tags", |b| b.iter(|| black_box(split_tags(black_box(&typed)))));
}

/// Benchmark completion against a large tag vocabulary.
fn bench_completion(c: &mut Criterion) {
    let candidates: Vec<String> = (0..1000).map(|i| format!("Holiday-{}", i)).collect();
    let completer = TagCompleter::new(candidates);
    let text = "sea beach holi";

    let mut group = c.benchmark_group("completion");

    group.bench_function("current_word", |b| {
        b.iter(|| black_box(completion::current_word(black_box(text), text.len())))
    });

    group.bench_function("matches_1000", |b| {
        b.iter(|| black_box(completer.matches(black_box(text), text.len())))
    });

    group.finish();
}

/// Runner that answers every command instantly
struct InstantRunner;

impl ProcessRunner for InstantRunner {
    fn run(&self, _command: &Command) -> io::Result<RawOutput> {
        Ok(RawOutput {
            success: true,
            code: Some(0),
            stdout: b"/a.jpg\nsea\n".to_vec(),
            stderr: Vec::new(),
        })
    }
}

/// Benchmark one submit, worker run and UI delivery.
fn bench_queue_round_trip(c: &mut Criterion) {
    let (dispatcher, ui) = dispatch::channel();
    let queue = match TaskQueue::spawn(Arc::new(InstantRunner), Arc::new(dispatcher)) {
        Ok(queue) => queue,
        Err(e) => panic!("failed to start queue: {}", e),
    };

    c.bench_function("queue_round_trip", |b| {
        b.iter(|| {
            queue.submit(Command::new("tmsu", ["tags"]), |_, result| {
                black_box(result.is_ok());
            });
            ui.run_next(Duration::from_secs(1))
        })
    });
}

criterion_group!(
    benches,
    bench_parse_tags,
    bench_tag_arguments,
    bench_completion,
    bench_queue_round_trip,
);
criterion_main!(benches);
