//! CLI entry point for spacetraveling

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(version)]
#[command(about = "A static blog generator backed by a headless Prismic CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Read posts from a JSON fixture file instead of the CMS
    #[arg(short, long, global = true)]
    fixtures: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Regenerate routes that are still fresh
        #[arg(long)]
        force: bool,

        /// Posts per listing page
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Start a local server that generates routes on demand
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// List posts by walking the paginated listing
    List {
        /// Stop after this many pages
        #[arg(long)]
        pages: Option<usize>,
    },

    /// Clean the public folder and the revalidation record
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "spacetraveling=debug,info"
    } else {
        "spacetraveling=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let fixtures = cli.fixtures.as_deref();

    match cli.command {
        Commands::Generate { force, page_size } => {
            let mut site = spacetraveling::Site::new(&base_dir)?;
            if let Some(size) = page_size {
                site.config.page_size = size;
            }
            let source = site.content_source(fixtures)?;

            tracing::info!("Generating static files...");
            let report = spacetraveling::commands::generate::run(&site, source, force).await?;
            println!("Generated successfully! ({})", report.summary());
        }

        Commands::Server { port, ip, open } => {
            let site = spacetraveling::Site::new(&base_dir)?;
            let source = site.content_source(fixtures)?;
            let generator = site.generator(source)?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            spacetraveling::server::start(&site, generator, &ip, port, open).await?;
        }

        Commands::List { pages } => {
            let site = spacetraveling::Site::new(&base_dir)?;
            let source = site.content_source(fixtures)?;
            spacetraveling::commands::list::run(&site, source.as_ref(), pages).await?;
        }

        Commands::Clean => {
            let site = spacetraveling::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("spacetraveling version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
