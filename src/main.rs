use clap::{CommandFactory, Parser, Subcommand};
use dil_release::config::{self, ToolsConfig};
use dil_release::layout::{ProjectLayout, resolve};
use dil_release::phobos_doc::{self, DocOptions};
use dil_release::release::{self, ReleaseOptions};
use dil_release::tools::{ArchiveFormat, SystemTools};
use dil_release::version::Version;
use dil_release::{output, winpath};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "dil-release")]
#[command(about = "Release packaging and Phobos documentation for the dil D compiler")]
#[command(long_about = "\
Release packaging and Phobos documentation for the dil D compiler

Expected project layout (--root):

  dil/
  ├── dil-release.toml           # Optional tool config
  ├── bin/dil                    # Documentation generator (built if missing)
  ├── src/dil/Version.d          # VERSION_MAJOR / VERSION_MINOR / VERSION_SUFFIX
  ├── data/                      # html.css, dilconf.d, macros_dil.ddoc
  └── kandil/                    # kandil.ddoc, css/, js/, img/

Examples:

  dil-release phobos-doc 2.031 ../dmd/src/phobos --kandil --pdf
  dil-release release 1.123 --docs --gz --zip

Run 'dil-release gen-config' to generate a documented dil-release.toml.")]
#[command(version = version_string())]
struct Cli {
    /// dil project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/dil-release.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct PhobosDocArgs {
    /// Phobos version, e.g. 2.031
    version: Option<String>,
    /// Phobos source folder (holding std.ddoc and phobos.d)
    phobos_dir: Option<PathBuf>,
    /// Output folder (default: docs.destination from the config)
    destination_dir: Option<PathBuf>,
    /// Create a 7z archive
    #[arg(long)]
    zip: bool,
    /// Create a PDF document (kandil only)
    #[arg(long)]
    pdf: bool,
    /// Use kandil as the documentation front-end
    #[arg(long)]
    kandil: bool,
}

#[derive(clap::Args)]
struct ReleaseArgs {
    /// Release version, e.g. 1.123 or 1.123-rc1
    version: Option<String>,
    #[arg(hide = true)]
    extra: Vec<String>,
    /// Generate debug symbols for debug builds
    #[arg(short = 's', long = "dsymbols")]
    debug_symbols: bool,
    /// Generate documentation
    #[arg(short, long)]
    docs: bool,
    /// Don't compile code
    #[arg(short, long = "no-bin")]
    no_binaries: bool,
    /// Create a 7z archive
    #[arg(long = "7z")]
    seven_zip: bool,
    /// Create a tar.gz archive
    #[arg(long)]
    gz: bool,
    /// Create a tar.bz2 archive
    #[arg(long)]
    bz2: bool,
    /// Create a zip archive
    #[arg(long)]
    zip: bool,
    /// Create a PDF document
    #[arg(long)]
    pdf: bool,
    /// Copy modified files from the (git) working directory
    #[arg(short = 'm')]
    copy_modified: bool,
    /// Use SRC folder instead of checking out code with git
    #[arg(long, value_name = "SRC")]
    src: Option<PathBuf>,
    /// Specify EXE_PATH if dmd is not in your PATH
    #[arg(long, value_name = "EXE_PATH")]
    dmd_exe: Option<String>,
    /// Where to build the release and archives (default: release.build_dir)
    #[arg(long, value_name = "DIR")]
    builddir: Option<PathBuf>,
    /// Permanently append P to PATH in the Windows (or wine's) registry, then exit
    #[arg(long, value_name = "P")]
    winpath: Option<String>,
    /// Write SHA256SUMS for the created archives
    #[arg(long)]
    checksums: bool,
}

impl ReleaseArgs {
    fn formats(&self) -> BTreeSet<ArchiveFormat> {
        [
            (self.gz, ArchiveFormat::TarGz),
            (self.bz2, ArchiveFormat::TarBz2),
            (self.zip, ArchiveFormat::Zip),
            (self.seven_zip, ArchiveFormat::SevenZip),
        ]
        .into_iter()
        .filter_map(|(wanted, format)| wanted.then_some(format))
        .collect()
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate HTML (and PDF) documentation for Phobos
    PhobosDoc(PhobosDocArgs),
    /// Build a release folder, binaries and archives
    Release(ReleaseArgs),
    /// Print a stock dil-release.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::PhobosDoc(args) => {
            let (Some(version), Some(phobos_dir)) = (&args.version, &args.phobos_dir) else {
                return print_subcommand_help("phobos-doc");
            };
            let version = Version::parse_doc(version)?;
            let config = config::load_config(&cli.root, cli.config.as_deref())?;
            let dest = args
                .destination_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.docs.destination));
            let opts = DocOptions {
                version,
                phobos_src: resolve(&cli.root, phobos_dir),
                dest: resolve(&cli.root, &dest),
                zip: args.zip,
                pdf: args.pdf,
                kandil: args.kandil,
            };
            let project = ProjectLayout::new(&cli.root);
            let tools = SystemTools::new(&config.tools);

            println!(
                "==> Phobos {} documentation → {}",
                opts.version,
                opts.dest.display()
            );
            let summary =
                phobos_doc::run(&tools, &config, &project, &opts, |e| output::print_event(&e))?;
            output::print_doc_summary(&summary);
        }
        Command::Release(args) => {
            let mut config = config::load_config(&cli.root, cli.config.as_deref())?;
            if let Some(exe) = &args.dmd_exe {
                config.tools.compiler = exe.clone();
            }
            let tools = SystemTools::new(&config.tools);

            if let Some(entry) = &args.winpath {
                if winpath::append_to_path(&tools, entry)? {
                    println!("==> Appended {entry} to PATH");
                }
                return Ok(());
            }
            let Some(version) = &args.version else {
                return print_subcommand_help("release");
            };
            if !args.extra.is_empty() {
                println!("Warning! Arguments ignored: {}", args.extra.join(" "));
            }
            let version = Version::parse_release(version)?;
            let opts = release_options(&cli.root, &config, &args, version);
            let project = ProjectLayout::new(&cli.root);

            println!("==> Release dil {} → {}", opts.version, opts.dest().display());
            let summary =
                release::run(&tools, &config, &project, &opts, |e| output::print_event(&e))?;
            output::print_release_summary(&summary);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn release_options(
    root: &Path,
    config: &ToolsConfig,
    args: &ReleaseArgs,
    version: Version,
) -> ReleaseOptions {
    let build_dir = args
        .builddir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.release.build_dir));
    ReleaseOptions {
        version,
        debug_symbols: args.debug_symbols,
        docs: args.docs,
        no_binaries: args.no_binaries,
        pdf: args.pdf,
        copy_modified: args.copy_modified,
        src: args.src.as_deref().map(|src| resolve(root, src)),
        compiler: config.tools.compiler.clone(),
        build_dir: resolve(root, &build_dir),
        formats: args.formats(),
        checksums: args.checksums,
    }
}

/// Print a subcommand's help; used when required positionals are missing.
fn print_subcommand_help(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(sub) = cmd.find_subcommand_mut(name) {
        sub.print_help()?;
    }
    Ok(())
}

/// `RUST_LOG` filter, raised to debug with `-v`.
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
