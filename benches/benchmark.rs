use criterion::{criterion_group, criterion_main, Criterion};

use comment_rank::topics::NmfConfig;
use comment_rank::vocab::VectorizerConfig;
use comment_rank::{Document, LemmaTokenizer, Sentiment, SimilarityPipeline};

/// Deterministic synthetic comment corpus: two stances drawing from
/// different word pools, mixed by a fixed recurrence.
fn synthetic_corpus(n: usize) -> Vec<Document> {
    const SUPPORTIVE: &[&str] = &[
        "clean", "water", "wetland", "protect", "important", "resource", "quality", "waterway",
        "preserve", "ecosystem",
    ];
    const OPPOSED: &[&str] = &[
        "oppose", "regulation", "burdensome", "overreach", "federal", "rule", "farm", "cost",
        "property", "repeal",
    ];
    let mut state = 0x2545_f491u64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    (0..n)
        .map(|i| {
            let (pool, label) = if i % 2 == 0 {
                (SUPPORTIVE, Sentiment::Supportive)
            } else {
                (OPPOSED, Sentiment::Opposed)
            };
            let words: Vec<&str> = (0..20)
                .map(|_| pool[(next() % pool.len() as u64) as usize])
                .collect();
            Document::labeled(words.join(" "), label)
        })
        .collect()
}

fn fit_and_query_benchmark(c: &mut Criterion) {
    let corpus = synthetic_corpus(200);
    let texts: Vec<&str> = corpus.iter().map(|d| d.text.as_str()).collect();
    let config = VectorizerConfig {
        max_df: 0.95,
        min_df: 2,
    };

    c.bench_function("fit_similarity_pipeline", |b| {
        b.iter(|| {
            let mut pipeline =
                SimilarityPipeline::new(LemmaTokenizer::new(), config, NmfConfig::default());
            pipeline.fit(&texts).unwrap();
            pipeline.index(&corpus).unwrap();
            pipeline
        });
    });

    let mut pipeline = SimilarityPipeline::new(LemmaTokenizer::new(), config, NmfConfig::default());
    pipeline.fit(&texts).unwrap();
    pipeline.index(&corpus).unwrap();

    c.bench_function("find_similar", |b| {
        b.iter(|| {
            pipeline
                .find_similar("we must protect clean water and wetlands", 5)
                .unwrap()
        });
    });
}

criterion_group!(benches, fit_and_query_benchmark);
criterion_main!(benches);
