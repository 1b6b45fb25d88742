use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use livefix_core::boundary::{find_last_bounded, locate_completed_sentence, locate_completed_word};
use livefix_core::cache::{CacheEntry, CacheKey, CorrectionCache};

static INPUTS: &[(&str, &str)] = &[
    ("short", "வநக்கம் "),
    ("medium", "வணக்கம் நான் இன்று பள்ளிக்கு போறேன், "),
    (
        "long",
        "காலையில் எழுந்து படிக்க்றேன். பிறகு நண்பர்களுடன் பேசி வர்றேன். மாலையில் எழுத்றேன் ",
    ),
];

fn bench_word(c: &mut Criterion) {
    let mut group = c.benchmark_group("boundary/word");
    for &(label, text) in INPUTS {
        let trigger = text.chars().count();
        group.bench_with_input(BenchmarkId::new(label, trigger), &text, |b, &text| {
            b.iter(|| locate_completed_word(text, trigger, 2));
        });
    }
    group.finish();
}

fn bench_sentence(c: &mut Criterion) {
    let text = INPUTS[2].1;
    let trigger = text.find("வர்றேன்.").map_or(0, |b| text[..b].chars().count() + 8);
    c.bench_function("boundary/sentence", |b| {
        b.iter(|| locate_completed_sentence(text, trigger, 2));
    });
}

fn bench_fallback_search(c: &mut Criterion) {
    let text = INPUTS[2].1.repeat(20);
    c.bench_function("boundary/find_last_bounded", |b| {
        b.iter(|| find_last_bounded(&text, "படிக்க்றேன்"));
    });
}

fn bench_cache(c: &mut Criterion) {
    let words: Vec<String> = (0..1024).map(|i| format!("சொல்{i}")).collect();
    c.bench_function("cache/put_get_evict", |b| {
        b.iter(|| {
            let mut cache = CorrectionCache::new(512);
            for w in &words {
                cache.put(
                    CacheKey::word(w),
                    CacheEntry {
                        corrected_text: w.clone(),
                        suggestions: Vec::new(),
                        fetched_at_generation: 0,
                    },
                );
                let _ = cache.get(&CacheKey::word(w));
            }
            cache.len()
        });
    });
}

criterion_group!(
    benches,
    bench_word,
    bench_sentence,
    bench_fallback_search,
    bench_cache
);
criterion_main!(benches);
