use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use treesite::config::{self, SiteConfig};
use treesite::vcs::{GitRepository, NoRepository, RepositoryReader};
use treesite::{output, site};

/// Build switches that override `config.toml`.
#[derive(clap::Args, Clone, Default)]
struct BuildArgs {
    /// Write RSS feeds for sections and categories (needs a site URL)
    #[arg(long)]
    rss: bool,

    /// Generate index pages even where an index.md exists
    #[arg(long)]
    addlist: bool,

    /// Absolute base URL of the published site
    #[arg(long)]
    site_url: Option<String>,

    /// Minify HTML, CSS, JS and XML output
    #[arg(long)]
    minify: bool,

    /// Log every directory and file as it is processed
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser)]
#[command(name = "treesite")]
#[command(about = "Static site generator for directory trees of markdown")]
#[command(long_about = "\
Static site generator for directory trees of markdown

Every .md file becomes an HTML page next to where it sits in the tree.
Directories without an index.md get a generated index listing their posts
and subdirectories, with a client-side search box.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── index.md                     # Template: landing → home page
  ├── about.md                     # Plain page → about.html
  └── blog/                        # Section (configured under [sections.blog])
      ├── First Post.md            # → blog/First-Post.html
      ├── tags/                    # Generated: one page per tag
      ├── feed.xml                 # Generated with --rss and a site URL
      └── Linux/                   # Category
          └── Kernel Notes.md      # → blog/Linux/Kernel-Notes.html

Metadata resolution (first available wins):
  Title:   front matter Title → file name (My Post.md → \"My Post\")
  Date:    front matter Date → last commit date
  Author:  front matter Author → last commit author → site.author

Run 'treesite gen-config' to generate a documented config.toml.")]
#[command(version = env!("TREESITE_BUILD_ID"))]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the content tree into the output directory
    Build(BuildArgs),
    /// List every document a build would render, without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();

    // --verbose enables DEBUG, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Command::Build(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("treesite=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build(args) => {
            let mut site_config = config::load_config(&cli.source)?;
            apply_overrides(&mut site_config, &args);
            site_config.validate()?;
            init_thread_pool(&site_config.processing);

            let git = GitRepository::discover(&cli.source, &site_config.build.git_web_url);
            let reader: &dyn RepositoryReader = match &git {
                Some(git) => git,
                None => &NoRepository,
            };

            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let report = site::build(&cli.source, &cli.output, &site_config, reader)?;
            output::print_build_report(&report, &cli.output);
        }
        Command::Check => {
            let site_config = config::load_config(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let documents = site::check(&cli.source, &site_config)?;
            output::print_check_output(&documents);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Command-line switches only ever turn features on; they never disable
/// something `config.toml` enabled.
fn apply_overrides(site_config: &mut SiteConfig, args: &BuildArgs) {
    site_config.build.rss |= args.rss;
    site_config.build.generate_list |= args.addlist;
    site_config.build.minify |= args.minify;
    if let Some(url) = &args.site_url {
        site_config.site.url = url.clone();
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
