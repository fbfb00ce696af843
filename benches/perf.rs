use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;

use tui_messagetree::{
    MessageData, MessageLabel, MessageTree, MessageTreeState, MessageTreeView, TreeViewStyle,
    label_all, serialize, to_json, validate,
};

/// Builds `roots` menus, each `fanout` options wide and `depth` levels deep.
fn seed(roots: usize, fanout: usize, depth: usize) -> Vec<MessageData> {
    fn level(fanout: usize, depth: usize, prefix: &str) -> Vec<MessageData> {
        if depth == 0 {
            return Vec::new();
        }
        (1..=fanout)
            .map(|idx| {
                let content = format!("{prefix}.{idx}");
                let children = level(fanout, depth - 1, &content);
                MessageData::new(content, children)
            })
            .collect()
    }
    (1..=roots)
        .map(|idx| {
            let content = idx.to_string();
            let children = level(fanout, depth, &content);
            MessageData::new(content, children)
        })
        .collect()
}

fn bench_labels(c: &mut Criterion) {
    let mut group = c.benchmark_group("labels");
    for (roots, fanout, depth) in [(4, 4, 3), (8, 6, 4)] {
        let tree = MessageTree::from_data(&seed(roots, fanout, depth));
        group.bench_with_input(
            BenchmarkId::new("label_all", tree.len()),
            &tree,
            |b, tree| b.iter(|| black_box(label_all(tree))),
        );
    }
    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let tree = MessageTree::from_data(&seed(8, 6, 4));
    group.bench_function("serialize", |b| b.iter(|| black_box(serialize(&tree))));
    group.bench_function("to_json", |b| b.iter(|| black_box(to_json(&tree))));
    group.bench_function("validate", |b| b.iter(|| black_box(validate(&tree))));
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let tree = MessageTree::from_data(&seed(8, 6, 4));
    let area = Rect::new(0, 0, 80, 40);

    for virtualize_rows in [false, true] {
        let mut state = MessageTreeState::with_capacity(tree.len());
        let mut buffer = Buffer::empty(area);
        group.bench_with_input(
            BenchmarkId::new("view", if virtualize_rows { "virtual" } else { "full" }),
            &virtualize_rows,
            |b, &virtualize_rows| {
                b.iter(|| {
                    state.invalidate();
                    let style = TreeViewStyle {
                        virtualize_rows,
                        ..TreeViewStyle::default()
                    };
                    MessageTreeView::new(&tree, &MessageLabel, style).render(
                        area,
                        &mut buffer,
                        &mut state,
                    );
                    black_box(&buffer);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_labels, bench_codec, bench_render);
criterion_main!(benches);
