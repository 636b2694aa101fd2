//! Benchmarks for report export.
//!
//! Run with: cargo bench
//!
//! Reports are synthetic: sections of headings, paragraphs with inline
//! styling, lists and a table per section.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use research_export::layout::{FlowEngine, HelveticaMetrics, PrintStyle};
use research_export::{classify, ExportCoordinator, ExportFormat};

/// Creates a synthetic report with the given number of sections.
fn create_report(sections: usize) -> String {
    let mut report = String::from("# Market Research Report\n\n");

    for i in 0..sections {
        report.push_str(&format!("## Section {}\n\n", i + 1));
        report.push_str(
            "Demand grew **steadily** across *all* regions, driven by `api` adoption \
             and partner programmes described in [the appendix](https://example.com/appendix).\n\n",
        );
        report.push_str("- First finding with **bold** text\n");
        report.push_str("- Second finding\n");
        report.push_str("1. Recommendation one\n2. Recommendation two\n\n");
        report.push_str("| Region | Q1 | Q2 | Growth |\n|---|---|---|---|\n");
        for r in 0..4 {
            report.push_str(&format!("| Region {} | {} | {} | {}% |\n", r, 100 + r, 120 + r, 5 + r));
        }
        report.push('\n');
    }

    report
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for sections in [1, 10, 50] {
        let report = create_report(sections);
        group.bench_with_input(BenchmarkId::from_parameter(sections), &report, |b, report| {
            b.iter(|| classify(black_box(report)))
        });
    }

    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let style = PrintStyle::default();
    let metrics = HelveticaMetrics::new();

    for sections in [1, 10, 50] {
        let blocks = classify(&create_report(sections));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &blocks, |b, blocks| {
            b.iter(|| FlowEngine::new(&style, &metrics).layout(black_box(blocks)))
        });
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let coordinator = ExportCoordinator::new().with_text_measure(Arc::new(HelveticaMetrics::new()));
    let report = create_report(10);

    for format in [ExportFormat::Html, ExportFormat::Pdf, ExportFormat::Word] {
        group.bench_function(format.name(), |b| {
            b.iter(|| coordinator.export(format, black_box(&report), "Benchmark"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_layout, bench_export);
criterion_main!(benches);
