use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kfr_recipe::pipeline::{CMake, HttpFetcher, RunLayout};
use kfr_recipe::preflight::check_host_tools;
use kfr_recipe::profile::Profile;
use kfr_recipe::recipe::{self, inspect};
use kfr_recipe::{validate, BuildTemplate, HostPlatform, OptionSet, PlatformFacts, RecipeRun};
use tracing::info;

/// Overrides the download cache location.
const CACHE_ENV: &str = "KFR_RECIPE_CACHE";

#[derive(Parser)]
#[command(name = "kfr-recipe")]
#[command(version)]
#[command(about = "Fetch, patch, build and package the KFR DSP library", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole recipe for one configuration
    Create {
        #[command(flatten)]
        config: ConfigArgs,
        #[command(flatten)]
        dirs: DirArgs,
    },
    /// Run every job of the template selected by CONAN_OPTIONS
    Run {
        #[command(flatten)]
        dirs: DirArgs,
    },
    /// Validate a configuration and print its identity without building
    Inspect {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Check that the host tools for a configuration are installed
    CheckTools {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Remove downloaded source archives
    CleanCache,
}

#[derive(Args)]
struct ConfigArgs {
    /// TOML profile with [settings] and [options] tables
    #[arg(long)]
    profile: Option<PathBuf>,
    /// Setting override, e.g. -s compiler=clang
    #[arg(short = 's', long = "setting", value_name = "NAME=VALUE")]
    settings: Vec<String>,
    /// Option override, e.g. -o header_only=False
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    options: Vec<String>,
}

#[derive(Args)]
struct DirArgs {
    /// Folder the run works in
    #[arg(long, default_value = "kfr-build")]
    workdir: PathBuf,
    /// Folder holding the recipe exports (0001-lib.patch)
    #[arg(long, default_value = ".")]
    recipe_dir: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Create { config, dirs } => create(&config, &dirs),
        Commands::Run { dirs } => run_template(&dirs),
        Commands::Inspect { config } => inspect_config(&config),
        Commands::CheckTools { config } => check_tools(&config),
        Commands::CleanCache => clean_cache(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn resolve_config(args: &ConfigArgs) -> Result<(OptionSet, PlatformFacts)> {
    let mut options = OptionSet::default();
    let mut platform = PlatformFacts::detect_host();

    if let Some(path) = &args.profile {
        Profile::load(path)?
            .apply(&mut options, &mut platform)
            .with_context(|| format!("applying profile '{}'", path.display()))?;
    }
    for assignment in &args.settings {
        platform
            .apply_assignment(assignment)
            .with_context(|| format!("parsing setting '{}'", assignment))?;
    }
    for assignment in &args.options {
        options
            .apply_assignment(assignment)
            .with_context(|| format!("parsing option '{}'", assignment))?;
    }
    Ok((options, platform))
}

fn downloads_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_ENV) {
        return PathBuf::from(dir);
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("kfr-recipe")
        .join("downloads")
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving current directory")?;
    Ok(cwd.join(path))
}

fn base_layout(dirs: &DirArgs) -> Result<RunLayout> {
    Ok(RunLayout::new(
        absolute(&dirs.workdir)?,
        absolute(&dirs.recipe_dir)?,
        downloads_dir(),
    ))
}

fn create(args: &ConfigArgs, dirs: &DirArgs) -> Result<()> {
    let (options, platform) = resolve_config(args)?;
    let layout = base_layout(dirs)?;
    build_one(layout, &options, &platform)
}

fn run_template(dirs: &DirArgs) -> Result<()> {
    let template = BuildTemplate::from_env();
    let host = PlatformFacts::detect_host();
    let jobs = template.jobs(&host);
    let base = base_layout(dirs)?;
    info!("template {:?} with {} job(s)", template, jobs.len());

    for job in &jobs {
        println!("[{}:{}] building {}...", recipe::NAME, recipe::VERSION, job.name);
        build_one(base.job(&job.name), &job.options, &job.platform)
            .with_context(|| format!("job '{}'", job.name))?;
    }
    println!("{} job(s) finished", jobs.len());
    Ok(())
}

fn build_one(layout: RunLayout, options: &OptionSet, platform: &PlatformFacts) -> Result<()> {
    // Contradictory options fail here, before any tool lookup or download.
    let config = validate(options, platform)?;
    check_host_tools(&config)?;

    let fetcher = HttpFetcher::new()?;
    let cmake = CMake::find()?;
    let record = layout.run_record();
    let package_folder = layout.package_folder();

    let outcome = RecipeRun::new(layout, &fetcher, &cmake)
        .execute(options, platform)
        .with_context(|| format!("building {}/{}", recipe::NAME, recipe::VERSION))?;

    println!("  package id: {} ({:?})", outcome.identity.key, outcome.identity.compatibility);
    println!("  package:    {}", package_folder.display());
    println!("  files:      {}", outcome.manifest.len());
    println!("  libs:       {}", outcome.info.libs.join(" "));
    println!("  defines:    {}", outcome.info.defines.join(" "));
    println!("  record:     {}", record.display());
    Ok(())
}

fn inspect_config(args: &ConfigArgs) -> Result<()> {
    let (options, platform) = resolve_config(args)?;
    let inspection = inspect(&options, &platform, HostPlatform::detect())?;
    println!("{}", serde_json::to_string_pretty(&inspection)?);
    Ok(())
}

fn check_tools(args: &ConfigArgs) -> Result<()> {
    let (options, platform) = resolve_config(args)?;
    let config = validate(&options, &platform)?;
    check_host_tools(&config)?;
    println!("all required host tools found");
    Ok(())
}

fn clean_cache() -> Result<()> {
    let dir = downloads_dir();
    if dir.exists() {
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("removing download cache '{}'", dir.display()))?;
    }
    println!("cleared {}", dir.display());
    Ok(())
}
