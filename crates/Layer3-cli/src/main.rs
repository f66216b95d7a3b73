//! Tessera CLI - Main entry point
//!
//! 화면 없이 플러그인 엔진을 구동합니다.
//!
//! - `tessera plan` - 인스턴스를 만들지 않고 초기화 순서와 진단만 출력
//! - `tessera run`  - 헤드리스 패널에서 모든 플러그인을 시작하고 결과 보고

mod builtin;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tessera_core::plugin::{ManifestLoader, PlanReport, PluginManager, PluginScope};
use tessera_core::ui::HeadlessToolkit;
use tessera_core::{PluginContext, PluginSummary, ScheduleDiagnostic};
use tessera_foundation::{
    builtin_plugins_dir, default_notifier, user_plugins_dir, ConfigStore, RunLoop,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tessera - plugin engine for the desktop panel
#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(ClapArgs, Debug)]
struct RootArgs {
    /// Additional plugin root, scanned after the built-in and user roots
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,

    /// Skip the built-in and user plugin directories
    #[arg(long)]
    no_default_roots: bool,

    /// Config file (default: ~/.config/tessera/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the initialization plan without starting any plugin
    Plan {
        #[command(flatten)]
        roots: RootArgs,
    },
    /// Start all plugins on a headless panel and report the result
    Run {
        #[command(flatten)]
        roots: RootArgs,

        /// Stop the run-loop after this many seconds
        #[arg(short, long, default_value = "5")]
        timeout: u64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (stdout은 보고용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match args.command {
        Command::Plan { roots } => plan_cmd(&roots),
        Command::Run { roots, timeout } => run_cmd(&roots, Duration::from_secs(timeout)).await,
    }
}

/// 설정과 루트로 매니저 구성
fn build_manager(roots: &RootArgs, run_loop: &RunLoop) -> anyhow::Result<PluginManager> {
    let path = match &roots.config {
        Some(path) => path.clone(),
        None => ConfigStore::default_path()?,
    };
    let config = ConfigStore::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;

    let ctx = PluginContext::new(
        config,
        Rc::new(HeadlessToolkit),
        default_notifier(),
        run_loop.clone(),
    );
    let manager = PluginManager::new(ctx, Box::new(ManifestLoader::new(builtin::factories())));

    if !roots.no_default_roots {
        match builtin_plugins_dir() {
            Ok(dir) => manager.add_root(dir, PluginScope::Builtin),
            Err(e) => warn!("No built-in plugins: {}", e),
        }
        match user_plugins_dir() {
            Ok(dir) => manager.add_root(dir, PluginScope::User),
            Err(e) => warn!("No user plugins: {}", e),
        }
    }
    for root in &roots.roots {
        manager.add_root(root, PluginScope::Extra);
    }
    Ok(manager)
}

// ============================================================================
// plan
// ============================================================================

fn plan_cmd(roots: &RootArgs) -> anyhow::Result<()> {
    let run_loop = RunLoop::new();
    let manager = build_manager(roots, &run_loop)?;
    let plan = manager.plan();

    if roots.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &PlanReport) {
    println!("\nInitialization order\n");
    println!("{:<4} {:<36} {:<24} {:>8} {:>6}", "#", "ID", "PLACEMENT", "PRIORITY", "INDEX");
    println!("{}", "-".repeat(82));
    for (i, entry) in plan.order.iter().enumerate() {
        println!(
            "{:<4} {:<36} {:<24} {:>8} {:>6}",
            i + 1,
            entry.id,
            entry.placement,
            entry.priority,
            entry.index
        );
        if !entry.deps.is_empty() {
            println!("     deps: {}", entry.deps.join(", "));
        }
    }

    print_diagnostics(&plan.diagnostics);

    if !plan.skipped.is_empty() {
        println!("\nSkipped modules\n");
        for skipped in &plan.skipped {
            println!("  {} - {}", skipped.import_path, skipped.reason);
        }
    }

    if !plan.search_roots.is_empty() {
        println!("\nExtra search roots\n");
        for root in &plan.search_roots {
            println!("  {}", root.display());
        }
    }
    println!();
}

fn print_diagnostics(diagnostics: &[ScheduleDiagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\nUnschedulable plugins\n");
    for diagnostic in diagnostics {
        println!("  {}", diagnostic);
    }
}

// ============================================================================
// run
// ============================================================================

/// 실행 결과 보고
#[derive(Debug, Serialize)]
struct RunReport {
    summary: PluginSummary,
    live: Vec<String>,
    diagnostics: Vec<ScheduleDiagnostic>,
    /// 컨테이너 -> 할당 폭
    regions: BTreeMap<String, f64>,
    startup_finished: bool,
}

async fn run_cmd(roots: &RootArgs, timeout: Duration) -> anyhow::Result<()> {
    let run_loop = RunLoop::new();
    let manager = build_manager(roots, &run_loop)?;

    manager.load_plugins();
    if tokio::time::timeout(timeout, run_loop.run()).await.is_err() {
        info!("Run-loop still busy after {:?}, stopping", timeout);
    }

    let ctx = manager.context();
    let regions = ctx
        .container_names()
        .into_iter()
        .filter_map(|name| {
            let width = ctx.container(&name)?.allocated_width();
            Some((name, width))
        })
        .collect();
    let report = RunReport {
        summary: manager.summary(),
        live: manager.live_ids(),
        diagnostics: manager.diagnostics(),
        regions,
        startup_finished: ctx.startup_finished(),
    };

    if roots.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_run(&report);
    }

    manager.shutdown();
    Ok(())
}

fn print_run(report: &RunReport) {
    let s = &report.summary;
    println!("\nPlugins\n");
    println!("  validated:   {}", s.total);
    println!("  running:     {}", s.live);
    println!("  failed:      {}", s.failed);
    println!("  unscheduled: {}", s.unscheduled);
    println!("  disabled:    {}", s.disabled);
    println!("  skipped:     {}", s.skipped);

    if !report.live.is_empty() {
        println!("\nRunning (load order)\n");
        for id in &report.live {
            println!("  {}", id);
        }
    }

    print_diagnostics(&report.diagnostics);

    if !report.regions.is_empty() {
        println!("\nContainers\n");
        for (name, width) in &report.regions {
            println!("  {:<32} {:>8.1}px", name, width);
        }
    }

    if !report.startup_finished {
        println!("\nStartup did not finish before the timeout");
    }
    println!();
}
