use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use studylist::client::reorder;
use studylist::models::{Material, MaterialDraft, MaterialType, ReorderEntry, Topic};

fn large_topic(materials: usize) -> Topic {
    let now = Utc::now();
    let mut topic = Topic::new("Benchmark".to_string(), vec![], None, None, now);
    for i in 0..materials {
        let draft = MaterialDraft {
            material_type: MaterialType::ALL[i % MaterialType::ALL.len()],
            title: format!("Material {}", i),
            url: None,
            favicon: None,
            rating: None,
            order: None,
            reading_time: Some(45),
        };
        let material = Material::new(draft, i as i64, now);
        topic.materials.push(material);
    }
    topic
}

fn benchmark_reorder(c: &mut Criterion) {
    let topic = large_topic(2_000);

    // Reverse the whole list in one request
    let reversed: Vec<ReorderEntry> = topic
        .materials
        .iter()
        .enumerate()
        .map(|(i, m)| ReorderEntry {
            id: m.id.clone(),
            order: (topic.materials.len() - i) as i64,
            material_type: m.material_type,
        })
        .collect();

    let mut group = c.benchmark_group("reorder");

    group.bench_function("apply_reorder_reverse_2000", |b| {
        b.iter_batched(
            || topic.clone(),
            |mut t| t.apply_reorder(black_box(&reversed)),
            criterion::BatchSize::LargeInput,
        )
    });

    group.bench_function("client_move_first_to_last_2000", |b| {
        b.iter_batched(
            || reorder::ordered(&topic.materials),
            |mut list| {
                let last = list.len() - 1;
                reorder::move_item(&mut list, black_box(0), Some(last));
                reorder::reorder_request(&list)
            },
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, benchmark_reorder);
criterion_main!(benches);
