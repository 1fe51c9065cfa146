//! Agent kernel tool server.
//!
//! Serves the Thinking Tuple tools over JSON-RPC on stdio. Assets resolve from
//! `<project>/.claude/` first and fall back to the bundled resources directory.

use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use agent_kernel::io::assets::AssetSource;
use agent_kernel::io::paths::{KernelPaths, default_resources_dir};
use agent_kernel::kernel::Kernel;
use agent_kernel::logging;
use agent_kernel::server::{self, SERVER_NAME, SERVER_VERSION};
use agent_kernel::tools::tool_definitions;

const RESOURCE_KINDS: &[&str] = &[
    "CLAUDE.md",
    "principles",
    "commands",
    "commands/metadata.yaml",
    "skills",
    "agents",
    "agents/registry.yaml",
    "domain_packs",
];

#[derive(Parser)]
#[command(
    name = "agent-kernel",
    version,
    about = "Thinking Tuple tool server for reasoning agents"
)]
struct Cli {
    /// Project root whose `.claude/` overrides bundled assets.
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Bundled assets directory.
    #[arg(long, global = true, env = "AGENT_KERNEL_RESOURCES")]
    resources_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Serve tools over JSON-RPC on stdin/stdout (default).
    Serve,
    /// Print resolved directories and which assets are available.
    Info,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = resolve_paths(&cli)?;
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => cmd_serve(&paths),
        Command::Info => cmd_info(&paths),
    }
}

fn resolve_paths(cli: &Cli) -> Result<KernelPaths> {
    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolve current directory")?,
    };
    let resources_dir = cli
        .resources_dir
        .clone()
        .unwrap_or_else(|| default_resources_dir(&project_dir));
    Ok(KernelPaths::new(project_dir, resources_dir))
}

fn cmd_serve(paths: &KernelPaths) -> Result<()> {
    let mut kernel = Kernel::open(paths)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    server::serve(&mut kernel, stdin.lock(), BufWriter::new(stdout.lock()))
}

fn cmd_info(paths: &KernelPaths) -> Result<()> {
    let kernel = Kernel::open(paths)?;
    let config = kernel.config();
    println!("{SERVER_NAME} {SERVER_VERSION}");
    println!("project:   {}", paths.project_dir.display());
    println!("resources: {}", paths.resources_dir.display());
    println!("config:    {}", paths.config_path.display());
    println!("state:     {}", paths.state_dir(&config.state_dir).display());
    println!(
        "limits:    max_iterations={} guidance_excerpt_chars={} chars_per_token={}",
        config.max_iterations, config.guidance_excerpt_chars, config.chars_per_token
    );
    println!("assets:");
    for kind in RESOURCE_KINDS {
        let source = kernel
            .assets()
            .source_of(kind)
            .map_or("missing", AssetSource::as_str);
        println!("  {kind:<24} {source}");
    }
    println!("tools: {}", tool_definitions().len());
    Ok(())
}
