use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use geopulse_audit::{run_audit, AuditReport, CancelToken, LexiconSentiment, StageDeps};
use geopulse_common::{AuditConfig, Config, TargetProvider};
use geopulse_providers::{text_generator, web_searcher, ProviderKeys};

/// Audit how visible a brand is in AI assistant answers.
#[derive(Parser, Debug)]
#[command(name = "geopulse", version, about)]
struct Args {
    /// Brand or company name to audit.
    brand: String,

    /// Target assistant persona to simulate (chatgpt, gemini, claude, perplexity).
    #[arg(long, default_value = "chatgpt")]
    provider: String,

    /// LLM backend that runs the audit itself (openai, anthropic).
    #[arg(long, default_value = "openai")]
    generator: String,

    /// Search backend (tavily, serper). Defaults to the one the target
    /// persona typically sees.
    #[arg(long)]
    search: Option<String>,

    /// Number of audit questions to generate.
    #[arg(long, default_value_t = 5)]
    questions: usize,

    /// Evidence cap per question.
    #[arg(long, default_value_t = 5)]
    max_results: usize,

    /// Alternate brand names that count as mentions (comma separated).
    #[arg(long, value_delimiter = ',')]
    alias: Vec<String>,

    /// Emit the full report as JSON instead of a text summary.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geopulse=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    config.log_redacted();

    let target: TargetProvider = args.provider.parse()?;
    let keys = ProviderKeys {
        openai: config.openai_api_key,
        anthropic: config.anthropic_api_key,
        tavily: config.tavily_api_key,
        serper: config.serper_api_key,
    };

    let generator = text_generator(&args.generator, &keys)?;
    let search_name = args
        .search
        .as_deref()
        .unwrap_or_else(|| target.default_search_provider());
    let searcher = web_searcher(search_name, &keys)?;

    let audit_config = AuditConfig {
        question_count: args.questions,
        max_search_results: args.max_results,
        brand_aliases: args.alias,
        ..AuditConfig::default()
    };
    let deps = StageDeps {
        generator,
        searcher,
        sentiment: Arc::new(LexiconSentiment),
    };

    info!(brand = %args.brand, target = %target, search = search_name, "Starting audit");
    let report = run_audit(&args.brand, target, &audit_config, &deps, &CancelToken::new()).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &AuditReport) {
    println!();
    println!(
        "Visibility of {} on {}: {:.0}%",
        report.brand,
        report.target,
        report.score * 100.0
    );
    println!();

    for q in &report.questions {
        let status = if !q.answered {
            "simulation failed".to_string()
        } else if q.mention_count == 0 {
            "not mentioned".to_string()
        } else {
            format!("{} mention(s), {:?} sentiment", q.mention_count, q.sentiment)
        };
        println!("  {}. [{}] {}", q.index + 1, q.intent, q.text);
        println!("     {status}");
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for (i, rec) in report.recommendations.iter().enumerate() {
            println!("  {}. {rec}", i + 1);
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            match w.question {
                Some(q) => println!("  [{} q{}] {}", w.stage, q + 1, w.message),
                None => println!("  [{}] {}", w.stage, w.message),
            }
        }
    }
}
