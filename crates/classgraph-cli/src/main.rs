//! CLI binary for classgraph: extract class dependency graphs and render diagrams.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use classgraph_core::config::ClassGraphConfig;
use classgraph_core::graph::{GraphDocument, NodeKind};
use classgraph_core::model::{ClassArena, RelationKind};
use classgraph_core::storage;
use classgraph_export::DiagramFormat;
use classgraph_parser::TypeFilter;
use std::path::{Path, PathBuf};

/// Files handed to the worker pool between progress updates.
const PARSE_CHUNK: usize = 256;

#[derive(Parser)]
#[command(name = "classgraph", about = "Class dependency graphs for Java, C++, C# and Kotlin")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a source tree and write a graph file
    Analyze {
        /// Directory to scan (defaults to the project root)
        root: Option<PathBuf>,

        /// Glob patterns to include files (repeatable)
        #[arg(long)]
        include: Vec<String>,

        /// Glob patterns to exclude files (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Diagram written next to the graph: plantuml, dot, mermaid, none
        /// (defaults to output.diagram)
        #[arg(short, long)]
        format: Option<String>,

        /// Print the graph JSON to stdout instead of writing files
        #[arg(long)]
        stdout: bool,
    },

    /// Render a graph file as a diagram on stdout
    Export {
        /// Graph JSON file
        graph: PathBuf,

        /// Output format: plantuml, dot, mermaid
        #[arg(short, long, default_value = "plantuml")]
        format: String,
    },

    /// Show summary statistics of a graph (defaults to the latest one)
    Info {
        /// Graph JSON file
        graph: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a graph for dangling edges, duplicates and self loops
    Validate {
        /// Graph JSON file
        graph: Option<PathBuf>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;

    match cli.command {
        Commands::Analyze {
            root,
            include,
            exclude,
            format,
            stdout,
        } => cmd_analyze(
            &project_root,
            root.as_deref(),
            &include,
            &exclude,
            format.as_deref(),
            stdout,
        ),
        Commands::Export { graph, format } => cmd_export(&graph, &format),
        Commands::Info { graph, json } => cmd_info(&project_root, graph, json),
        Commands::Validate { graph } => cmd_validate(&project_root, graph),
    }
}

fn build_glob_set(patterns: &[String], flag: &str) -> Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = globset::GlobSetBuilder::new();
    for p in patterns {
        builder.add(
            globset::Glob::new(p).with_context(|| format!("invalid {flag} glob: {p}"))?,
        );
    }
    Ok(Some(
        builder
            .build()
            .with_context(|| format!("invalid {flag} glob set"))?,
    ))
}

/// Collect source files under `root`, then apply the include/exclude globs
/// to their root-relative paths.
fn collect_source_files(
    root: &Path,
    config: &ClassGraphConfig,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>> {
    use indicatif::{ProgressBar, ProgressStyle};

    let include_set = build_glob_set(include, "--include")?;
    let exclude_set = build_glob_set(exclude, "--exclude")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("invalid spinner template")?,
    );
    spinner.set_message("Scanning files...");

    let mut files = Vec::new();
    for path in classgraph_parser::collect_sources(root, &config.analysis) {
        let rel_path = path.strip_prefix(root).unwrap_or(&path);
        if let Some(ref inc) = include_set
            && !inc.is_match(rel_path)
        {
            continue;
        }
        if let Some(ref exc) = exclude_set
            && exc.is_match(rel_path)
        {
            continue;
        }
        files.push(path);
        spinner.set_message(format!("{} files collected", files.len()));
        spinner.tick();
    }
    spinner.finish_and_clear();
    Ok(files)
}

fn cmd_analyze(
    project_root: &Path,
    root: Option<&Path>,
    include: &[String],
    exclude: &[String],
    format: Option<&str>,
    stdout: bool,
) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let config = ClassGraphConfig::load(project_root)?;
    let diagram = match format {
        Some(f) => DiagramFormat::from_setting(f)?,
        None => DiagramFormat::from_setting(&config.output.diagram)?,
    };

    let root = root.map_or_else(|| project_root.to_path_buf(), |r| project_root.join(r));
    if !root.is_dir() {
        anyhow::bail!("{} is not a directory", root.display());
    }

    let filter = TypeFilter::load(&config.ignore_dir(project_root))?;
    let files = collect_source_files(&root, &config, include, exclude)?;
    if files.is_empty() {
        eprintln!(
            "No source files found in {}. Supported extensions: java, cpp, h, hpp, cs, kt",
            root.display()
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.analysis.jobs)
        .build()
        .context("failed to start worker pool")?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Parsing [{bar:30.cyan/blue}] {pos}/{len} files")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );
    let mut arena = ClassArena::new();
    for chunk in files.chunks(PARSE_CHUNK) {
        arena.append(pool.install(|| classgraph_parser::analyze_files(chunk, &filter)));
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    let source_path = root
        .canonicalize()
        .unwrap_or_else(|_| root.clone())
        .display()
        .to_string();
    let doc = classgraph_resolver::GraphBuilder::new(&filter)
        .source_path(source_path)
        .build(arena.records());

    if stdout {
        println!("{}", classgraph_core::schema::to_json(&doc)?);
        return Ok(());
    }

    let out_dir = config.output_dir(project_root);
    let graph_path = storage::save(&out_dir, &doc)?;
    eprintln!("\nGraph written to {}", graph_path.display());
    if let Some(diagram) = diagram {
        let rendered = classgraph_export::render(&doc, diagram);
        let diagram_path = storage::save_sidecar(&graph_path, diagram.extension(), &rendered)?;
        eprintln!("Diagram written to {}", diagram_path.display());
    }
    eprintln!("  Files: {}", files.len());
    eprintln!("  Classes: {}", arena.len());
    eprintln!(
        "  Nodes: {} ({} external)",
        doc.nodes.len(),
        doc.placeholder_count()
    );
    eprintln!("  Edges: {}", doc.links.len());

    Ok(())
}

fn cmd_export(graph: &Path, format: &str) -> Result<()> {
    let doc = storage::load(graph)?;
    let format: DiagramFormat = format.parse()?;
    print!("{}", classgraph_export::render(&doc, format));
    Ok(())
}

/// The graph file named on the command line, or the newest one in the
/// configured output directory.
fn resolve_graph_path(project_root: &Path, graph: Option<PathBuf>) -> Result<Option<PathBuf>> {
    if let Some(path) = graph {
        return Ok(Some(path));
    }
    let config = ClassGraphConfig::load(project_root)?;
    storage::latest(&config.output_dir(project_root))
}

fn cmd_info(project_root: &Path, graph: Option<PathBuf>, json: bool) -> Result<()> {
    let Some(path) = resolve_graph_path(project_root, graph)? else {
        eprintln!("No graph found. Run `classgraph analyze` first.");
        return Ok(());
    };
    let doc = storage::load(&path)?;

    let declared = doc.nodes.len() - doc.placeholder_count();
    let interfaces = doc
        .nodes
        .iter()
        .filter(|n| !n.placeholder && n.kind == NodeKind::Interface)
        .count();
    let language = doc.language.map_or("none", |l| l.name());

    if json {
        let summary = serde_json::json!({
            "graph": path.display().to_string(),
            "version": doc.version,
            "language": doc.language,
            "analysisSourcePath": doc.analysis_source_path,
            "nodes": doc.nodes.len(),
            "declared": declared,
            "interfaces": interfaces,
            "external": doc.placeholder_count(),
            "edges": {
                "extended": doc.count_edges(RelationKind::Extended),
                "implemented": doc.count_edges(RelationKind::Implemented),
                "depended": doc.count_edges(RelationKind::Depended),
            },
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Graph: {}", path.display());
    if let Ok(modified) = std::fs::metadata(&path).and_then(|m| m.modified()) {
        let written: chrono::DateTime<chrono::Local> = modified.into();
        println!("Written: {}", written.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("Version: {}", doc.version);
    println!("Language: {}", language);
    println!("Source: {}", doc.analysis_source_path);
    println!();
    println!("Classes: {} ({} interfaces)", declared, interfaces);
    println!("External types: {}", doc.placeholder_count());
    println!("Extended edges: {}", doc.count_edges(RelationKind::Extended));
    println!(
        "Implemented edges: {}",
        doc.count_edges(RelationKind::Implemented)
    );
    println!("Depended edges: {}", doc.count_edges(RelationKind::Depended));
    println!("Total edges: {}", doc.links.len());

    Ok(())
}

fn cmd_validate(project_root: &Path, graph: Option<PathBuf>) -> Result<()> {
    let Some(path) = resolve_graph_path(project_root, graph)? else {
        anyhow::bail!("No graph found. Run `classgraph analyze` first.");
    };
    let doc: GraphDocument = storage::load(&path)?;
    let issues = doc.validate();

    if issues.is_empty() {
        eprintln!("Graph is valid. No integrity issues found.");
        eprintln!("  {} nodes, {} edges", doc.nodes.len(), doc.links.len());
        return Ok(());
    }
    for issue in &issues {
        println!("WARN: {}", issue);
    }
    anyhow::bail!("found {} integrity issue(s) in {}", issues.len(), path.display())
}
