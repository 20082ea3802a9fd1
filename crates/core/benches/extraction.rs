use criterion::{Criterion, black_box, criterion_group, criterion_main};
use noteify_core::{
    Document, FormatConfig, LocateConfig, NoteConfig, SanitizeConfig, build_fragment, format_content, locate_content,
    sanitize_html,
};

fn load_article() -> String {
    std::fs::read_to_string("../../tests/fixtures/article.html").unwrap()
}

fn bench_sanitize(c: &mut Criterion) {
    let html = load_article();
    let config = SanitizeConfig::default();

    c.bench_function("sanitize", |b| b.iter(|| sanitize_html(black_box(&html), &config)));
}

fn bench_locate(c: &mut Criterion) {
    let html = load_article();
    let doc = Document::parse_sanitized(&html, &SanitizeConfig::default());
    let config = LocateConfig::default();

    c.bench_function("locate", |b| b.iter(|| locate_content(black_box(&doc), &config).paragraph_count));
}

fn bench_format(c: &mut Criterion) {
    let html = load_article();
    let doc = Document::parse_sanitized(&html, &SanitizeConfig::default());
    let block = locate_content(&doc, &LocateConfig::default());
    let config = FormatConfig::default();

    c.bench_function("format", |b| b.iter(|| format_content(black_box(&doc), &block, &config)));
}

fn bench_full_fragment(c: &mut Criterion) {
    let html = load_article();
    let config = NoteConfig::default();

    c.bench_function("build_fragment", |b| b.iter(|| build_fragment(black_box(&html), &config)));
}

criterion_group!(benches, bench_sanitize, bench_locate, bench_format, bench_full_fragment);
criterion_main!(benches);
