//! Repairlog CLI - bulk import of assets and repairs
//!
//! ```bash
//! repairlog serve                          # Start HTTP server (port 3000)
//! repairlog import assets assets.csv       # Import assets
//! repairlog import repairs repairs.csv     # Import repairs for existing assets
//! repairlog template repairs -o tpl.csv    # Write an example file
//! repairlog decode export.csv              # Show detected encoding and text
//! repairlog assets                         # List assets
//! ```

use clap::{Parser, Subcommand};
use repairlog::api::types::AssetSummary;
use repairlog::import::report::write_rejections;
use repairlog::import::template::write_template;
use repairlog::{
    resolve, run_import, AppConfig, AssetStore, ImportOptions, Requester, SchemaKind,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "repairlog")]
#[command(about = "Maintenance and repair records with bulk CSV import", long_about = None)]
struct Cli {
    /// Data directory (overrides REPAIRLOG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file of assets or repairs
    Import {
        /// Record kind: assets or repairs
        kind: SchemaKind,

        /// Input CSV file
        input: PathBuf,

        /// User to import as (default: REPAIRLOG_DEFAULT_USER)
        #[arg(short, long)]
        user: Option<u64>,

        /// Import with admin visibility
        #[arg(long)]
        admin: bool,

        /// Validate only, write nothing
        #[arg(long)]
        dry_run: bool,

        /// Write rejected rows to this CSV file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the full result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Write the example CSV for a kind
    Template {
        /// Record kind: assets or repairs
        kind: SchemaKind,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect a file's encoding and print its decoded text
    Decode {
        /// Input file
        input: PathBuf,
    },

    /// List assets
    Assets {
        /// User to list for (default: REPAIRLOG_DEFAULT_USER)
        #[arg(short, long)]
        user: Option<u64>,

        /// List every user's assets
        #[arg(long)]
        admin: bool,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: REPAIRLOG_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match AppConfig::from_env() {
        Ok(mut config) => {
            if let Some(dir) = cli.data_dir {
                config.data_dir = dir;
            }
            run(cli.command, config).await
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Import {
            kind,
            input,
            user,
            admin,
            dry_run,
            report,
            json,
        } => {
            let requester = requester(user, admin, &config);
            cmd_import(kind, &input, requester, dry_run, report.as_deref(), json, &config)
        }

        Commands::Template { kind, output } => cmd_template(kind, output.as_deref()),

        Commands::Decode { input } => cmd_decode(&input),

        Commands::Assets { user, admin } => cmd_assets(requester(user, admin, &config), &config),

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            repairlog::server::start_server(config).await
        }
    }
}

fn requester(user: Option<u64>, admin: bool, config: &AppConfig) -> Requester {
    let user_id = user.unwrap_or(config.default_user_id);
    if admin {
        Requester::admin(user_id)
    } else {
        Requester::user(user_id)
    }
}

fn cmd_import(
    kind: SchemaKind,
    input: &Path,
    requester: Requester,
    dry_run: bool,
    report_path: Option<&Path>,
    json: bool,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Importing {}: {}", kind, input.display());

    let bytes = fs::read(input)?;
    let mut store = AssetStore::open(&config.data_dir)?;
    let options = ImportOptions {
        dry_run,
        ..Default::default()
    };

    let report = run_import(&bytes, kind, &requester, &mut store, options)?;

    if let Some(path) = report_path {
        write_rejections(&report.batch, fs::File::create(path)?)?;
        eprintln!("   💾 Rejections saved to: {}", path.display());
    }

    if json {
        let response = repairlog::api::types::ImportResponse::from(report);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    eprintln!("\n📊 Summary");
    eprintln!("   Rows:     {}", report.batch.total_rows());
    eprintln!("   Accepted: {}", report.batch.accepted_count());
    eprintln!("   Rejected: {}", report.batch.rejected_count());
    if !dry_run {
        eprintln!("   Saved:    {}", report.persisted);
    }
    for message in report.error_messages() {
        eprintln!("   - {}", message);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_template(kind: SchemaKind, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            write_template(kind, fs::File::create(path)?)?;
            eprintln!("💾 Template saved to: {}", path.display());
        }
        None => write_template(kind, io::stdout().lock())?,
    }
    Ok(())
}

fn cmd_decode(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(input)?;
    let decoded = resolve(&bytes)?;

    eprintln!("📄 {}", input.display());
    eprintln!("   Encoding: {}", decoded.encoding);
    eprintln!("   Lines: {}", decoded.lines().len());
    if decoded.had_replacements {
        eprintln!("   ⚠️  Some bytes could not be decoded and were replaced");
    }

    print!("{}", decoded.text);
    Ok(())
}

fn cmd_assets(requester: Requester, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = AssetStore::open(&config.data_dir)?;
    let assets = store.list_assets(&requester);

    if assets.is_empty() {
        eprintln!("No assets found in {}", store.dir().display());
        return Ok(());
    }

    eprintln!("📦 {} assets:\n", assets.len());
    for asset in assets {
        let summary = AssetSummary::new(asset, store.repairs_for(&asset.id).len());
        println!(
            "  {} {:<30} {:<10} {} repairs",
            summary.id,
            summary.name,
            summary.asset_type.to_code(),
            summary.repair_count
        );
    }

    Ok(())
}
