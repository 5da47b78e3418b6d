mod chat;
mod stats;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use faqbot_core::{
    evaluate_cases, load_corpus, save_artifact, CsvInteractionLog, EngineConfig, EvalCase,
    FaqEngine, InteractionSink, MemoryInteractionLog, RandomResponse, RawEvalCase, ResponsePicker,
    Threshold, DEFAULT_MODEL_PATH, DEFAULT_REQUIRED_PASS_RATE,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "faqbot")]
#[command(about = "Answer questions from a fixed FAQ corpus")]
struct Cli {
    /// JSON engine configuration; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct EngineArgs {
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Model artifact produced by `faqbot build`.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Build the model from the corpus at startup instead of loading it.
    #[arg(long)]
    no_model: bool,
    #[arg(long)]
    threshold: Option<f32>,
    #[arg(long)]
    stop_words: bool,
    #[arg(long)]
    synonyms: bool,
    #[arg(long)]
    group_by_intent: bool,
}

impl EngineArgs {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(corpus) = &self.corpus {
            config.corpus_path = corpus.clone();
        }
        if let Some(model) = &self.model {
            config.model_path = Some(model.clone());
        }
        if self.no_model {
            config.model_path = None;
        }
        if let Some(threshold) = self.threshold {
            config.threshold = Threshold::new(threshold);
        }
        config.use_stop_words |= self.stop_words;
        config.use_synonym_expansion |= self.synonyms;
        config.group_by_intent |= self.group_by_intent;
    }
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Interaction log destination.
    #[arg(long)]
    log: Option<PathBuf>,
    #[arg(long)]
    no_log: bool,
    /// Seed for picking among an intent's responses.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the model artifact from the corpus.
    Build {
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Answer a single question.
    Ask {
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        question: String,
    },
    /// Interactive question/answer session on stdin.
    Chat {
        #[command(flatten)]
        engine: EngineArgs,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Run evaluation cases against the engine.
    Eval {
        #[command(flatten)]
        engine: EngineArgs,
        #[arg(long)]
        cases: PathBuf,
        #[arg(long, default_value_t = DEFAULT_REQUIRED_PASS_RATE)]
        min_pass_rate: f32,
    },
    /// Summarize the interaction log.
    Stats {
        #[arg(long)]
        log: Option<PathBuf>,
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn engine_config(base: &EngineConfig, args: &EngineArgs) -> EngineConfig {
    let mut config = base.clone();
    args.apply(&mut config);
    config
}

fn open_engine(config: &EngineConfig) -> Result<FaqEngine> {
    FaqEngine::open(config).context("engine is not available")
}

fn make_picker(seed: Option<u64>) -> Box<dyn ResponsePicker> {
    match seed {
        Some(seed) => Box::new(RandomResponse::seeded(seed)),
        None => Box::new(RandomResponse::from_thread_rng()),
    }
}

fn make_sink(config: &EngineConfig, session: &SessionArgs) -> Box<dyn InteractionSink> {
    if session.no_log {
        return Box::new(MemoryInteractionLog::new());
    }
    let path = session.log.as_ref().unwrap_or(&config.log_path);
    Box::new(CsvInteractionLog::new(path))
}

fn read_eval_cases_json(path: &Path) -> Result<Vec<EvalCase>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let raw: Vec<RawEvalCase> =
        serde_json::from_reader(BufReader::new(file)).context("parse eval cases json")?;
    let cases = raw
        .into_iter()
        .map(RawEvalCase::into_eval_case)
        .collect::<faqbot_core::Result<Vec<_>>>()?;
    Ok(cases)
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let base = load_config(&cli)?;

    match &cli.command {
        Commands::Build { engine, output } => {
            let mut config = engine_config(&base, engine);
            let output = output
                .clone()
                .or_else(|| config.model_path.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
            config.model_path = None;

            let corpus = load_corpus(&config.corpus_path)
                .with_context(|| format!("load corpus {}", config.corpus_path.display()))?;
            let built = FaqEngine::build(corpus, &config).context("build model")?;
            save_artifact(&output, &built.to_artifact())
                .with_context(|| format!("write model {}", output.display()))?;

            info!(output = %output.display(), "model artifact written");
            println!(
                "indexed_entries={} terms={} output={}",
                built.index().len(),
                built.vocabulary().len(),
                output.display()
            );
        }
        Commands::Ask {
            engine,
            session,
            question,
        } => {
            let config = engine_config(&base, engine);
            let faq = open_engine(&config)?;
            let sink = make_sink(&config, session);
            let mut picker = make_picker(session.seed);

            let reply = faq.respond(question, faq.gate(), picker.as_mut(), sink.as_ref());
            println!(
                "decision={:?} score={:.4} matched_question={} intent={}",
                reply.matched.decision(),
                reply.score(),
                reply.matched_question,
                reply.matched_intent.as_deref().unwrap_or("null")
            );
            println!("answer={}", reply.answer);
        }
        Commands::Chat { engine, session } => {
            let config = engine_config(&base, engine);
            let faq = open_engine(&config)?;
            let sink = make_sink(&config, session);
            let mut picker = make_picker(session.seed);

            let stdin = io::stdin();
            let history = chat::run_chat(
                &faq,
                faq.gate(),
                picker.as_mut(),
                sink.as_ref(),
                stdin.lock(),
                io::stdout().lock(),
            )?;
            info!(turns = history.turns().len(), "chat session ended");
        }
        Commands::Eval {
            engine,
            cases,
            min_pass_rate,
        } => {
            let config = engine_config(&base, engine);
            let faq = open_engine(&config)?;
            let cases = read_eval_cases_json(cases)?;
            let summary = evaluate_cases(&faq, &cases, faq.gate());

            println!(
                "total={} passed={} failed={} pass_rate={:.4} required={:.4} meets_threshold={}",
                summary.total,
                summary.passed,
                summary.failed,
                summary.pass_rate,
                min_pass_rate,
                summary.meets(*min_pass_rate)
            );

            for o in &summary.outcomes {
                println!(
                    "case={} passed={} decision={:?} matched={} score={:.4} latency={:.3}ms",
                    o.case_id,
                    o.passed,
                    o.actual_decision,
                    o.actual_question,
                    o.score,
                    o.latency_ms
                );
            }
            println!("avg_latency={:.3}ms", summary.mean_latency_ms());

            if !summary.meets(*min_pass_rate) {
                anyhow::bail!(
                    "pass rate {:.4} is below the required {:.4}",
                    summary.pass_rate,
                    min_pass_rate
                );
            }
        }
        Commands::Stats { log, top } => {
            let path = log.as_ref().unwrap_or(&base.log_path);
            if !path.exists() {
                println!("no interactions logged yet at {}", path.display());
                return Ok(());
            }
            let records = stats::read_log(path)?;
            let summary = stats::summarize(&records, *top);

            println!(
                "total={} accepted={} acceptance_rate={:.4} mean_score={:.4}",
                summary.total,
                summary.accepted,
                summary.acceptance_rate(),
                summary.mean_score
            );
            for (question, count) in &summary.top_questions {
                println!("count={count} question={question}");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "faqbot",
            "ask",
            "--question",
            "hi",
            "--threshold",
            "2.0",
            "--no-model",
            "--stop-words",
        ])
        .expect("parse");
        let Commands::Ask { engine, .. } = &cli.command else {
            panic!("expected ask");
        };

        let config = engine_config(&EngineConfig::default(), engine);
        assert_eq!(config.threshold.value(), 1.0);
        assert_eq!(config.model_path, None);
        assert!(config.use_stop_words);
        assert!(!config.use_synonym_expansion);
    }

    #[test]
    fn stats_defaults() {
        let cli = Cli::try_parse_from(["faqbot", "stats"]).expect("parse");
        assert!(matches!(cli.command, Commands::Stats { log: None, top: 5 }));
    }

    #[test]
    fn seeded_picker_is_reproducible() {
        let pool: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut first = make_picker(Some(9));
        let mut second = make_picker(Some(9));
        for _ in 0..10 {
            assert_eq!(first.pick(&pool), second.pick(&pool));
        }
    }
}
