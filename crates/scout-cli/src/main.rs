use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scout_client::{LlmClient, LlmConfig, MainContentCleaner, ReqwestFetcher, SearchClient, SearchConfig};
use scout_core::models::{ExtractedDocument, Provider, QueryOptions, SearchEngine};
use scout_core::plan::{DEFAULT_PLANNER_MODEL, plan};
use scout_core::scrape::{DEFAULT_MAX_CONCURRENT, ScrapeService};
use scout_core::traits::LanguageModel;

const RULER_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "scout", version, about = "Web scraping, search and LLM tooling for agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch pages concurrently and print their main content
    Scrape {
        /// URLs to scrape
        #[arg(required = true)]
        urls: Vec<String>,

        /// Maximum number of requests in flight
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
        max_concurrent: usize,

        /// Print the records as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Enable debug logging
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },

    /// Search the web
    Search {
        /// Search query
        query: String,

        /// Number of results to return
        #[arg(short = 'n', long, default_value_t = 10)]
        num_results: usize,

        /// Backend: auto, serpapi, google or ddg
        #[arg(short, long, default_value = "auto")]
        engine: SearchEngine,

        /// Enable debug logging
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },

    /// Send a prompt to an LLM provider
    Ask {
        /// Prompt text
        #[arg(short, long)]
        prompt: String,

        /// openai, azure, anthropic, deepseek or gemini
        #[arg(long, default_value = "openai")]
        provider: Provider,

        /// Model name (provider default when omitted)
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature
        #[arg(long, default_value_t = 0.7)]
        temperature: f64,

        /// Maximum number of tokens in the reply
        #[arg(long, default_value_t = 4000)]
        max_tokens: u32,

        /// Image to attach to the prompt
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Enable debug logging
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },

    /// Ask a planning model to break down a task
    Plan {
        /// Task description
        #[arg(short, long)]
        prompt: String,

        /// File whose content is embedded in the prompt
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// openai or anthropic
        #[arg(long, default_value = "openai")]
        provider: Provider,

        /// Model name (o1 for openai when omitted)
        #[arg(short, long)]
        model: Option<String>,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Scrape { verbose, .. }
            | Commands::Search { verbose, .. }
            | Commands::Ask { verbose, .. } => *verbose,
            Commands::Plan { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.command.verbose() { "scout=debug" } else { "scout=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scrape {
            urls,
            max_concurrent,
            json,
            ..
        } => cmd_scrape(&urls, max_concurrent, json).await?,
        Commands::Search {
            query,
            num_results,
            engine,
            ..
        } => cmd_search(&query, engine, num_results).await?,
        Commands::Ask {
            prompt,
            provider,
            model,
            temperature,
            max_tokens,
            image,
            ..
        } => {
            let options = QueryOptions {
                model,
                temperature,
                max_tokens,
                image_path: image,
            };
            cmd_ask(&prompt, provider, &options).await?;
        }
        Commands::Plan {
            prompt,
            file,
            provider,
            model,
        } => cmd_plan(&prompt, file.as_deref(), provider, model).await?,
    }

    Ok(())
}

async fn cmd_scrape(urls: &[String], max_concurrent: usize, json: bool) -> Result<()> {
    let fetcher = ReqwestFetcher::new().context("Failed to create HTTP client")?;
    let service = ScrapeService::new(fetcher, MainContentCleaner::new());

    tracing::info!(urls = urls.len(), max_concurrent, "Starting scrape");

    let documents = service
        .scrape_urls(urls, Some(max_concurrent))
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        for doc in &documents {
            print!("{}", render_document(doc));
        }
    }

    Ok(())
}

fn render_document(doc: &ExtractedDocument) -> String {
    let ruler = "-".repeat(RULER_WIDTH);

    let mut out = format!(
        "URL: {}\nStatus: {}\n",
        doc.url(),
        if doc.success() { "Success" } else { "Failed" }
    );
    match (doc.error(), doc.extracted_content()) {
        (Some(error), _) => out.push_str(&format!("Error: {error}\n\n")),
        (None, content) => out.push_str(&format!(
            "\nContent:\n{ruler}\n{}\n{ruler}\n\n\n",
            content.unwrap_or_default()
        )),
    }
    out
}

async fn cmd_search(query: &str, engine: SearchEngine, num_results: usize) -> Result<()> {
    let client = SearchClient::new(SearchConfig::from_env()).context("Failed to create HTTP client")?;

    let results = client
        .search(query, engine, num_results)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if results.is_empty() {
        println!("No results found for '{query}'");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("\n=== Result {} ===", i + 1);
        println!("URL: {}", result.url);
        println!("Title: {}", result.title);
        println!("Snippet: {}", result.snippet);
    }

    Ok(())
}

async fn cmd_ask(prompt: &str, provider: Provider, options: &QueryOptions) -> Result<()> {
    let client = LlmClient::new(LlmConfig::from_env()).context("Failed to create HTTP client")?;

    let reply = client
        .ask(provider, prompt, options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("{reply}");
    Ok(())
}

async fn cmd_plan(
    task: &str,
    file: Option<&std::path::Path>,
    provider: Provider,
    model: Option<String>,
) -> Result<()> {
    let file_content = match file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?,
        ),
        None => None,
    };

    let model = model.or_else(|| match provider {
        Provider::OpenAi => Some(DEFAULT_PLANNER_MODEL.to_string()),
        _ => None,
    });
    let options = QueryOptions {
        model,
        ..QueryOptions::default()
    };

    let client = LlmClient::new(LlmConfig::from_env()).context("Failed to create HTTP client")?;
    let result = plan(&client, provider, task, file_content.as_deref(), &options)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("\n{} PLANNING RESULT {}", "-".repeat(5), "-".repeat(5));
    println!("{result}");
    println!("{}", "-".repeat(27));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_scrape_defaults() {
        let cli = Cli::try_parse_from(["scout", "scrape", "https://a.example", "https://b.example"])
            .unwrap();
        match cli.command {
            Commands::Scrape {
                urls,
                max_concurrent,
                json,
                verbose,
            } => {
                assert_eq!(urls.len(), 2);
                assert_eq!(max_concurrent, DEFAULT_MAX_CONCURRENT);
                assert!(!json);
                assert!(!verbose);
            }
            _ => panic!("expected scrape"),
        }
    }

    #[test]
    fn test_cli_scrape_requires_a_url() {
        assert!(Cli::try_parse_from(["scout", "scrape"]).is_err());
    }

    #[test]
    fn test_cli_parses_search_engine() {
        let cli = Cli::try_parse_from(["scout", "search", "rust", "-n", "3", "-e", "ddg"]).unwrap();
        match cli.command {
            Commands::Search {
                engine,
                num_results,
                ..
            } => {
                assert_eq!(engine, SearchEngine::DuckDuckGo);
                assert_eq!(num_results, 3);
            }
            _ => panic!("expected search"),
        }
        assert!(Cli::try_parse_from(["scout", "search", "rust", "-e", "bing"]).is_err());
    }

    #[test]
    fn test_cli_parses_ask_provider() {
        let cli = Cli::try_parse_from([
            "scout",
            "ask",
            "--prompt",
            "hi",
            "--provider",
            "anthropic",
            "-v",
        ])
        .unwrap();
        assert!(cli.command.verbose());
        match cli.command {
            Commands::Ask {
                provider,
                temperature,
                max_tokens,
                ..
            } => {
                assert_eq!(provider, Provider::Anthropic);
                assert_eq!(temperature, 0.7);
                assert_eq!(max_tokens, 4000);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_render_successful_document() {
        let doc = ExtractedDocument::extracted("https://a.example".into(), 200, "Hello".into());
        let ruler = "-".repeat(80);
        assert_eq!(
            render_document(&doc),
            format!("URL: https://a.example\nStatus: Success\n\nContent:\n{ruler}\nHello\n{ruler}\n\n\n")
        );
    }

    #[test]
    fn test_render_failed_document() {
        let doc = ExtractedDocument::failed("https://b.example".into(), Some(404), "HTTP error: 404".into());
        assert_eq!(
            render_document(&doc),
            "URL: https://b.example\nStatus: Failed\nError: HTTP error: 404\n\n"
        );
    }
}
