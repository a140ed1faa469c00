use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_model::{MarkSet, Value};
use serde_json::json;

const HEADINGS: usize = 100;
const PARAGRAPHS: usize = 8;

fn huge_document() -> serde_json::Value {
    let mut nodes = Vec::new();
    for h in 0..HEADINGS {
        nodes.push(json!({
            "object": "block",
            "type": "heading",
            "nodes": [{ "object": "text", "leaves": [{ "text": format!("Heading number {h}") }] }]
        }));
        for p in 0..PARAGRAPHS {
            nodes.push(json!({
                "object": "block",
                "type": "paragraph",
                "nodes": [{
                    "object": "text",
                    "leaves": [{ "text": format!("Paragraph {p} under heading {h}, with a sentence or two of filler text.") }]
                }]
            }));
        }
    }
    json!({ "object": "document", "nodes": nodes })
}

fn construct_huge_document(c: &mut Criterion) {
    let json = huge_document();
    c.bench_function("construct_huge_document", |b| {
        b.iter(|| Value::from_json(black_box(&json)))
    });
}

fn lookup_after_text_edit(c: &mut Criterion) {
    let value = Value::from_json(&huge_document()).unwrap();
    let last = value.document.last_text().unwrap().key().clone();
    let path = value.document.path_of(&last).unwrap();

    c.bench_function("lookup_after_text_edit", |b| {
        b.iter(|| {
            let edited = value
                .document
                .update_text(&path, |t| t.insert_text(0, "x", &MarkSet::new()))
                .unwrap();
            edited.path_of(black_box(&last)).unwrap()
        })
    });
}

fn walk_texts(c: &mut Criterion) {
    let value = Value::from_json(&huge_document()).unwrap();
    c.bench_function("walk_texts", |b| {
        b.iter(|| value.document.texts().map(|t| t.len()).sum::<usize>())
    });
}

criterion_group!(benches, construct_huge_document, lookup_after_text_edit, walk_texts);
criterion_main!(benches);
