//! marksmith command-line interface.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use marksmith::database::Database;
use marksmith::platform;
use marksmith::services::deduplicator;
use marksmith::services::exporter::{self, ExportFormat};
use marksmith::services::profile_discovery::{discover_profiles, select_profile};
use marksmith::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use marksmith::types::bookmark::{BookmarkKind, NodeId};
use marksmith::types::errors::SessionError;
use marksmith::types::settings::AppSettings;
use marksmith::{EditSession, ProcessScanGuard};

#[derive(Parser, Debug)]
#[command(name = "marksmith", version)]
#[command(about = "Edit Firefox/LibreWolf bookmarks without risking places.sqlite", long_about = None)]
struct Cli {
    /// Path to a places.sqlite file
    #[arg(long, global = true, conflicts_with = "profile")]
    db: Option<PathBuf>,
    /// Profile name from profiles.ini (default profile when omitted)
    #[arg(long, global = true)]
    profile: Option<String>,
    /// Settings file (platform config dir when omitted)
    #[arg(long, global = true)]
    config: Option<String>,
    /// Stage the change, print it, then discard it
    #[arg(long, global = true)]
    dry_run: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List profiles that have a bookmark database
    Profiles,
    /// Print the bookmark tree
    Tree {
        /// Only print the subtree under this folder id
        #[arg(long)]
        folder: Option<i64>,
    },
    /// List bookmarks that share a URL
    Dedup,
    /// Write the tree to a JSON or HTML file
    Export {
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check every http(s) bookmark for dead links
    #[cfg(feature = "audit")]
    Audit {
        /// Only print dead or timed-out links
        #[arg(long)]
        dead_only: bool,
    },
    /// Rename a bookmark or folder
    Rename { id: i64, title: String },
    /// Change the URL of a bookmark (and every bookmark sharing its place)
    SetUrl { id: i64, url: String },
    /// Delete a bookmark or separator
    Delete { id: i64 },
    /// Move a node under another folder
    Move { id: i64, parent: i64, position: i64 },
    /// Add a bookmark at the end of a folder
    Add { parent: i64, title: String, url: String },
    /// Add a bookmark to the scratch folder
    ScratchAdd { title: String, url: String },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    /// Set a dot-separated key, e.g. `audit.workers 20`
    Set { key: String, value: String },
    Reset,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = SettingsEngine::new(cli.config.clone());
    let settings = match engine.load() {
        Ok(settings) => settings,
        // A broken settings file must not lock out `config reset`.
        Err(e) if matches!(cli.command, Commands::Config { .. }) => {
            tracing::warn!(error = %e, "settings unreadable, using defaults");
            AppSettings::default()
        }
        Err(e) => return Err(e).context("failed to load settings"),
    };

    match &cli.command {
        Commands::Profiles => list_profiles(),
        Commands::Tree { folder } => print_tree(&cli, folder.map(NodeId)),
        Commands::Dedup => print_duplicates(&cli),
        Commands::Export { format, output } => export(&cli, &settings, *format, output.clone()),
        #[cfg(feature = "audit")]
        Commands::Audit { dead_only } => audit(&cli, &settings, *dead_only),
        Commands::Rename { id, title } => edit(&cli, &settings, |s| {
            Ok(match s.update_title(NodeId(*id), title)? {
                true => format!("renamed {} to {:?}", id, title),
                false => format!("{} already titled {:?}", id, title),
            })
        }),
        Commands::SetUrl { id, url } => edit(&cli, &settings, |s| {
            Ok(match s.update_url(NodeId(*id), url)? {
                true => format!("set URL of {} to {}", id, url),
                false => format!("{} already points at {}", id, url),
            })
        }),
        Commands::Delete { id } => edit(&cli, &settings, |s| {
            s.delete(NodeId(*id))?;
            Ok(format!("deleted {}", id))
        }),
        Commands::Move { id, parent, position } => edit(&cli, &settings, |s| {
            s.move_node(NodeId(*id), NodeId(*parent), *position)?;
            Ok(format!("moved {} to folder {} at {}", id, parent, position))
        }),
        Commands::Add { parent, title, url } => edit(&cli, &settings, |s| {
            let id = s.add(NodeId(*parent), title, url)?;
            Ok(format!("added {} under {}", id, parent))
        }),
        Commands::ScratchAdd { title, url } => edit(&cli, &settings, |s| {
            let id = s.scratch_add(title, url)?;
            Ok(format!("added {} to the scratch folder", id))
        }),
        Commands::Config { action } => configure(&mut engine, action),
    }
}

fn resolve_source(cli: &Cli) -> Result<PathBuf> {
    if let Some(db) = &cli.db {
        return Ok(db.clone());
    }
    let home = platform::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let profiles = discover_profiles(&home)?;
    let profile = select_profile(&profiles, cli.profile.as_deref()).ok_or_else(|| {
        anyhow!(
            "no profile named {:?}",
            cli.profile.as_deref().unwrap_or_default()
        )
    })?;
    Ok(profile.places_path.clone())
}

fn list_profiles() -> Result<()> {
    let home = platform::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    for p in discover_profiles(&home)? {
        let marker = if p.is_default { "*" } else { " " };
        println!("{} {:<10} {:<24} {}", marker, p.browser, p.name, p.places_path.display());
    }
    Ok(())
}

fn print_tree(cli: &Cli, folder: Option<NodeId>) -> Result<()> {
    let tree = Database::open_read_only(resolve_source(cli)?)?.load_tree()?;
    let start = folder.unwrap_or_else(|| tree.root());
    let base = tree
        .depth(start)
        .ok_or_else(|| anyhow!("no node with id {}", start))?;

    let mut stack = vec![start];
    while let Some(id) = stack.pop() {
        let Some(node) = tree.get(id) else { continue };
        let depth = tree.depth(id).unwrap_or(base) - base;
        let indent = "  ".repeat(depth);
        match &node.kind {
            BookmarkKind::Folder => println!("{}[{}] {}/", indent, node.id, node.title),
            BookmarkKind::Bookmark(place) => {
                println!("{}[{}] {} <{}>", indent, node.id, node.title, place.url)
            }
            BookmarkKind::Separator => println!("{}[{}] ----", indent, node.id),
        }
        stack.extend(node.children().iter().rev().copied());
    }
    Ok(())
}

fn print_duplicates(cli: &Cli) -> Result<()> {
    let db = Database::open_read_only(resolve_source(cli)?)?;
    let groups = deduplicator::find_duplicates(db.connection())?;
    if groups.is_empty() {
        println!("no duplicate URLs");
    }
    for group in &groups {
        println!("{} ({} bookmarks)", group.url, group.bookmarks.len());
        for b in &group.bookmarks {
            println!("    [{}] {}", b.id, b.title);
        }
    }
    Ok(())
}

fn export(
    cli: &Cli,
    settings: &AppSettings,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let tree = Database::open_read_only(resolve_source(cli)?)?.load_tree()?;
    let path = match output {
        Some(p) => p,
        None => {
            let dir = settings
                .general
                .export_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            dir.join(format!("bookmarks.{}", format.extension()))
        }
    };
    exporter::export_to_file(&tree, format, &path)?;
    println!("exported {} nodes to {}", tree.len(), path.display());
    Ok(())
}

#[cfg(feature = "audit")]
fn audit(cli: &Cli, settings: &AppSettings, dead_only: bool) -> Result<()> {
    use marksmith::services::link_auditor::{self, LinkAuditor};
    use marksmith::types::audit::LinkStatus;

    let tree = Database::open_read_only(resolve_source(cli)?)?.load_tree()?;
    let targets = link_auditor::targets_from_tree(&tree);
    let total = targets.len();
    let auditor = LinkAuditor::new(&settings.audit)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let results = runtime.block_on(auditor.audit_all(targets));

    for r in &results {
        if dead_only && r.status == LinkStatus::Alive {
            continue;
        }
        let code = r.status_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{:<8} {:>4} [{}] {}", format!("{:?}", r.status), code, r.node, r.url);
    }
    println!(
        "{} checked, {} dead or timed out",
        total,
        link_auditor::dead_links(&results).len()
    );
    Ok(())
}

/// Stages one change, then commits it (or discards it with `--dry-run`).
fn edit<F>(cli: &Cli, settings: &AppSettings, change: F) -> Result<()>
where
    F: FnOnce(&mut EditSession) -> Result<String, SessionError>,
{
    let source = resolve_source(cli)?;
    let mut session = EditSession::open(&source, settings)?;
    println!("{}", change(&mut session)?);

    if cli.dry_run {
        session.rollback()?;
        println!("dry run: staged changes discarded");
        return Ok(());
    }

    let guard = ProcessScanGuard::from_settings(&settings.liveness);
    match session.commit(&guard) {
        Ok(Some(report)) => {
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            println!("committed {} bytes (sha256 {})", report.bytes, report.digest);
            Ok(())
        }
        Ok(None) => {
            println!("nothing to commit");
            Ok(())
        }
        Err(SessionError::Commit(e)) if !e.is_recoverable() => {
            eprintln!("!!! {}", e);
            bail!("commit failed; do not open the browser until the files above are checked")
        }
        Err(e) => Err(e).context("commit failed; the bookmark file was not changed"),
    }
}

fn configure(engine: &mut SettingsEngine, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", engine.get_config_path().display());
            println!("{}", serde_json::to_string_pretty(engine.get_settings())?);
        }
        ConfigAction::Set { key, value } => {
            let parsed = serde_json::from_str(value)
                .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
            engine.set_value(key, parsed)?;
            println!("{} updated", key);
        }
        ConfigAction::Reset => {
            engine.reset()?;
            println!("settings reset to defaults");
        }
    }
    Ok(())
}
