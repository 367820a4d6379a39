use std::{env, fs, process::ExitCode};

use tracing::info;
use tracing_subscriber::EnvFilter;

use comment_rank::classify::LogisticConfig;
use comment_rank::pipeline::DEFAULT_TOP_N;
use comment_rank::topics::NmfConfig;
use comment_rank::vocab::VectorizerConfig;
use comment_rank::{Document, LemmaTokenizer, PipelineError, Sentiment, SentimentPipeline, SimilarityPipeline};

const SENTIMENT_BLOB: &str = "sentiment_clf.cbor";
const SIMILARITY_BLOB: &str = "similarity_pipe.cbor";

const TEST_COMMENT: &str = "This revision removes bodies of water that are important \
    for pollution filtration, nutrient cycling, among other ecosystem services. \
    We need to make sure important water resources like wetlands are protected \
    from degradation!";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let labeled_path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: comment-rank <labeled-comments> [training-comments]");
            eprintln!("  labeled-comments: lines of `<0|1>\\t<comment text>`");
            eprintln!("  training-comments: optional extra unlabeled corpus, one comment per line");
            return ExitCode::FAILURE;
        }
    };
    let train_path = args.next();

    match run(&labeled_path, train_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(labeled_path: &str, train_path: Option<&str>) -> Result<(), PipelineError> {
    let labeled = load_labeled(labeled_path)?;
    info!(docs = labeled.len(), "labeled comments loaded");

    // Training corpus for the topic model: the full unlabeled set when
    // given, otherwise the labeled comments themselves.
    let mut train_texts: Vec<String> = labeled.iter().map(|d| d.text.clone()).collect();
    if let Some(path) = train_path {
        let extra: Vec<String> = fs::read_to_string(path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.to_string())
            .collect();
        info!(docs = extra.len(), "training comments loaded");
        train_texts.extend(extra);
    }

    // Sentiment classifier
    println!("{}", "-".repeat(50));
    println!("Training sentiment classifier");
    let texts: Vec<&str> = labeled.iter().map(|d| d.text.as_str()).collect();
    let labels: Vec<Sentiment> = labeled.iter().filter_map(|d| d.label).collect();
    let mut sentiment = SentimentPipeline::new(
        LemmaTokenizer::new(),
        VectorizerConfig::default(),
        LogisticConfig::default(),
    );
    sentiment.fit(&texts, &labels)?;
    fs::write(SENTIMENT_BLOB, sentiment.save()?)?;
    println!("saved {SENTIMENT_BLOB}");

    let (label, confidence) = sentiment.classify(TEST_COMMENT)?;
    println!("\n{TEST_COMMENT}\n");
    println!("Sentiment:  {label}");
    println!("Confidence: {confidence:.3}");

    // Similarity pipeline
    println!("{}", "-".repeat(50));
    println!("Training NMF similarity pipeline");
    let mut similarity = SimilarityPipeline::new(
        LemmaTokenizer::new(),
        VectorizerConfig::default(),
        NmfConfig::default(),
    );
    similarity.fit(&train_texts)?;
    similarity.index(&labeled)?;
    fs::write(SIMILARITY_BLOB, similarity.save()?)?;
    println!("saved {SIMILARITY_BLOB}");

    for topic in 0..similarity.n_topics() {
        let terms: Vec<String> = similarity
            .topic_terms(topic, 6)?
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        println!("topic {topic}: {}", terms.join(", "));
    }

    println!("\nFive most similar labeled comments:");
    let hits = similarity.find_similar(TEST_COMMENT, DEFAULT_TOP_N)?;
    println!("{hits}");
    Ok(())
}

/// Parse `<0|1>\t<text>` lines. Malformed lines are skipped, not fatal; an
/// entirely unusable file is.
fn load_labeled(path: &str) -> Result<Vec<Document>, PipelineError> {
    let raw = fs::read_to_string(path)?;
    let docs: Vec<Document> = raw
        .lines()
        .filter_map(|line| {
            let (label, text) = line.split_once('\t')?;
            let label = Sentiment::from_index(label.trim().parse().ok()?)?;
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(Document::labeled(text, label))
        })
        .collect();
    if docs.is_empty() {
        return Err(PipelineError::EmptyCorpus);
    }
    Ok(docs)
}
