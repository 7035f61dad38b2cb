mod place;

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "huizenjacht-cli")]
#[command(about = "Huizenjacht place resolver command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a listing or address to a coordinate and print it as JSON
    Resolve {
        /// Listing page to scrape for location hints
        #[arg(long)]
        url: Option<String>,
        /// Free-text street address
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
        /// Defaults to `HUIZENJACHT_DEFAULT_COUNTRY`
        #[arg(long)]
        country: Option<String>,
        /// Include the resolution trace (hints, queries, match rule)
        #[arg(long)]
        debug: bool,
    },
    /// Fetch a listing page and print the location hints found in it
    Hints {
        #[arg(long)]
        url: String,
    },
    /// Run the city-name sanitizer on a string
    Sanitize {
        /// Raw city text, e.g. "Superbe villa à Biot"
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = huizenjacht_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Resolve {
            url,
            address,
            city,
            postal_code,
            country,
            debug,
        }) => {
            let query = huizenjacht_geocode::LocationQuery {
                listing_url: url,
                free_address: address,
                city,
                postal_code,
                country,
            };
            place::run_resolve(&config, &query, debug).await?;
        }
        Some(Commands::Hints { url }) => place::run_hints(&config, &url).await?,
        Some(Commands::Sanitize { text }) => place::run_sanitize(&text),
        None => Cli::command().print_help()?,
    }

    Ok(())
}
