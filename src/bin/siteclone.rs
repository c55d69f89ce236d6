use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use siteclone::fetch::fetch_bytes;
use siteclone::snapshot::{self, SnapshotMetadata};
use siteclone::{
    CloneConfig, CloneRequest, InMemoryBlobStore, InMemoryStore, SiteCloner, SourceGraph,
    StarterBundle, export_bundle, export_snapshot,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "siteclone")]
#[command(about = "Inspect, clone and convert site snapshots")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print metadata, record counts and files of a snapshot
    Inspect {
        /// Snapshot file or http(s) URL
        source: String,
    },
    /// Clone a snapshot or bundle under a new identity
    Clone {
        /// Snapshot file, bundle file or http(s) URL
        source: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        host: String,
        #[arg(long)]
        group: Option<String>,
        /// Treat the source as a JSON starter bundle
        #[arg(long)]
        bundle: bool,
        /// Write the cloned site as a new snapshot
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Turn a snapshot into a JSON starter bundle
    ExportBundle {
        /// Snapshot file or http(s) URL
        source: String,
        #[arg(long)]
        starter_id: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = CloneConfig::from_env().map_err(|err| anyhow!(err))?;

    match cli.command {
        Command::Inspect { source } => inspect(&source, &config).await,
        Command::Clone {
            source,
            name,
            host,
            group,
            bundle,
            out,
        } => {
            let mut request = CloneRequest::new(&name, &host);
            if let Some(group) = group {
                request = request.group(&group);
            }
            clone(&source, bundle, &request, out.as_deref(), &config).await
        }
        Command::ExportBundle {
            source,
            starter_id,
            out,
        } => convert_to_bundle(&source, &starter_id, &out, &config).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn read_source(source: &str, config: &CloneConfig) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return fetch_bytes(source, config)
            .await
            .with_context(|| format!("failed to download {}", source));
    }
    fs::read(source).with_context(|| format!("failed to read {}", source))
}

async fn inspect(source: &str, config: &CloneConfig) -> Result<()> {
    let bytes = read_source(source, config).await?;
    let snapshot = snapshot::decode(&bytes).context("failed to decode snapshot")?;

    println!("created_at:       {}", snapshot.metadata.created_at);
    println!("source instance:  {}", snapshot.metadata.source_instance_id);
    println!("source version:   {}", snapshot.metadata.source_instance_version);
    println!();
    for (collection, records) in snapshot.records.collections() {
        println!("{:<28} {:>7}", collection, records.len());
    }
    println!();
    println!(
        "{} files, {} bytes",
        snapshot.files.len(),
        snapshot.file_bytes()
    );
    for file in &snapshot.files {
        println!("  {:<40} {:>10}", file.name, file.size());
    }
    Ok(())
}

async fn clone(
    source: &str,
    bundle: bool,
    request: &CloneRequest,
    out: Option<&Path>,
    config: &CloneConfig,
) -> Result<()> {
    let bytes = read_source(source, config).await?;
    let graph = if bundle {
        SourceGraph::from_bundle(StarterBundle::from_slice(&bytes).context("failed to parse bundle")?)
    } else {
        SourceGraph::from_snapshot(snapshot::decode(&bytes).context("failed to decode snapshot")?)?
    };

    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let outcome = SiteCloner::new(&store, &blobs)
        .with_config(config.clone())
        .clone_site(&graph, request)
        .await
        .context("clone failed")?;

    println!("new site: {}", outcome.site.id);
    println!("{}", outcome.report);

    if let Some(out) = out {
        let metadata = SnapshotMetadata::now("siteclone", env!("CARGO_PKG_VERSION"));
        let exported = export_snapshot(&store, &blobs, &outcome.site.id, metadata, config).await?;
        let encoded = snapshot::encode(&exported)?;
        fs::write(out, encoded).with_context(|| format!("failed to write {}", out.display()))?;
        println!("Wrote {}", out.display());
    }
    Ok(())
}

async fn convert_to_bundle(
    source: &str,
    starter_id: &str,
    out: &Path,
    config: &CloneConfig,
) -> Result<()> {
    let bytes = read_source(source, config).await?;
    let graph = SourceGraph::from_snapshot(snapshot::decode(&bytes).context("failed to decode snapshot")?)?;
    let name = graph.root.get_str("name").unwrap_or(starter_id).to_string();
    let host = graph.root.get_str("host").unwrap_or_default().to_string();

    let store = InMemoryStore::with_site_schema();
    let blobs = InMemoryBlobStore::new();
    let outcome = SiteCloner::new(&store, &blobs)
        .with_config(config.clone())
        .clone_site(&graph, &CloneRequest::new(&name, &host))
        .await
        .context("failed to load snapshot")?;

    let bundle = export_bundle(&store, &outcome.site.id, starter_id, config).await?;
    fs::write(out, bundle.to_vec_pretty()?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}
