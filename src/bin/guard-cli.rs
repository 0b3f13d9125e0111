use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "guard-cli")]
#[command(about = "Management CLI for the upstream guard", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "GUARD_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List circuit breakers and their state
    Breakers,
    /// Force a breaker back to closed
    ResetBreaker {
        /// Dependency name, e.g. "embeddings"
        name: String,
    },
    /// Show cache size and hit rate
    Cache,
    /// Zero the cache hit/miss counters
    ResetStats,
    /// Drop every cached entry
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, path) = endpoint(&cli.command);

    let res = client
        .request(method, format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await?;

    Ok(())
}

/// Admin API method and path for a subcommand.
fn endpoint(command: &Commands) -> (Method, String) {
    match command {
        Commands::Status => (Method::GET, "/admin/status".to_string()),
        Commands::Breakers => (Method::GET, "/admin/breakers".to_string()),
        Commands::ResetBreaker { name } => (Method::POST, format!("/admin/breakers/{}/reset", name)),
        Commands::Cache => (Method::GET, "/admin/cache".to_string()),
        Commands::ResetStats => (Method::POST, "/admin/cache/reset-stats".to_string()),
        Commands::ClearCache => (Method::POST, "/admin/cache/clear".to_string()),
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        std::process::exit(1);
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        println!("OK");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["guard-cli", "--key", "secret"].iter().chain(args)).unwrap()
    }

    #[test]
    fn test_reset_breaker_path() {
        let cli = parse(&["reset-breaker", "embeddings"]);
        assert_eq!(
            endpoint(&cli.command),
            (Method::POST, "/admin/breakers/embeddings/reset".to_string())
        );
        assert_eq!(cli.url, "http://localhost:8081");
        assert_eq!(cli.key, "secret");
    }

    #[test]
    fn test_subcommand_endpoints() {
        let cases = [
            ("status", Method::GET, "/admin/status"),
            ("breakers", Method::GET, "/admin/breakers"),
            ("cache", Method::GET, "/admin/cache"),
            ("reset-stats", Method::POST, "/admin/cache/reset-stats"),
            ("clear-cache", Method::POST, "/admin/cache/clear"),
        ];
        for (arg, method, path) in cases {
            assert_eq!(endpoint(&parse(&[arg]).command), (method, path.to_string()), "{arg}");
        }
    }

    #[test]
    fn test_reset_breaker_requires_name() {
        assert!(Cli::try_parse_from(["guard-cli", "--key", "k", "reset-breaker"]).is_err());
    }
}
