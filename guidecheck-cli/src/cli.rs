//! Command-line parsing and dispatch.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use guidecheck::{LanguageRegistry, check_fs, extract_document, output};
use tracing::debug;

use crate::config::FileConfig;
use crate::logging::init_tracing;
use crate::render::write_colored;

#[derive(Parser, Debug)]
#[command(
    name = "guidecheck",
    version,
    about = "Check multi-variant Markdown style guides for broken snippets and structural drift",
    long_about = "Extracts fenced code snippets and section trees from every guide variant, \
syntax-checks the snippets and aligns each variant against a reference.\n\n\
Configuration precedence: CLI > guidecheck.toml > defaults.",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a set of guide variants
    #[command(
        after_help = "Examples:\n  guidecheck check guides/\n  guidecheck check guides/ --reference en --format json\n  guidecheck check en.md fr.md --strict"
    )]
    Check(CheckArgs),
    /// Print the section tree of one file
    Outline {
        /// Markdown file to outline
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
    /// List recognized snippet language tags
    Languages {
        /// Config file with extra aliases or skipped languages
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Files or directories to scan (default: config `paths`, then ".")
    pub paths: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Glob of paths to leave out (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Variant to align against (document id or file stem)
    #[arg(long, value_name = "VARIANT")]
    pub reference: Option<String>,

    /// Fuzzy title matches need an edit distance below this
    #[arg(long, value_name = "N")]
    pub fuzzy_threshold: Option<usize>,

    /// Language tag to recognize but never check (repeatable)
    #[arg(long, value_name = "TAG")]
    pub skip_language: Vec<String>,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,

    /// Skip section alignment
    #[arg(long)]
    pub no_align: bool,

    /// Skip snippet validation
    #[arg(long)]
    pub no_validate: bool,

    /// Config file (default: ./guidecheck.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// When to color human output
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when stdout is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn enabled(self, is_terminal: bool) -> bool {
        match self {
            Self::Auto => is_terminal && std::env::var_os("NO_COLOR").is_none(),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Parse the process arguments, run, and return the exit code.
///
/// # Errors
///
/// Returns an error on corpus-load failure or invalid configuration.
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = std::io::stdout();
    let is_terminal = stdout.is_terminal();
    let mut out = stdout.lock();
    execute(&cli, &mut out, is_terminal)
}

/// Run a parsed command, writing results to `out`. `is_terminal` feeds
/// `--color auto`.
///
/// # Errors
///
/// Returns an error on corpus-load failure or invalid configuration.
pub fn execute(cli: &Cli, out: &mut dyn Write, is_terminal: bool) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Check(args) => check(args, out, args.color.enabled(is_terminal)),
        Commands::Outline { file, format } => outline(file, *format, out),
        Commands::Languages { config } => languages(config.as_deref(), out),
    }
}

fn check(args: &CheckArgs, out: &mut dyn Write, color: bool) -> anyhow::Result<i32> {
    let file = FileConfig::load(args.config.as_deref())?;
    let mut fs_config = file.fs_config();
    let mut check_config = file.check_config()?;

    if args.paths.is_empty() {
        if fs_config.paths.is_empty() {
            fs_config.paths = vec![PathBuf::from(".")];
        }
    } else {
        fs_config.paths.clone_from(&args.paths);
    }
    fs_config.exclude.extend(args.exclude.iter().cloned());

    if let Some(reference) = &args.reference {
        check_config.reference = Some(reference.clone());
    }
    if let Some(threshold) = args.fuzzy_threshold {
        check_config.fuzzy_threshold = threshold;
    }
    check_config
        .skip_languages
        .extend(args.skip_language.iter().cloned());
    if args.no_align {
        check_config.align_sections = false;
    }
    if args.no_validate {
        check_config.validate_snippets = false;
    }
    debug!(?fs_config, ?check_config, "effective configuration");

    let mut report = check_fs(&fs_config, &check_config)?;
    if args.strict || file.strict.unwrap_or(false) {
        report.promote_warnings();
    }

    match args.format {
        OutputFormat::Json => output::write_json(&report, out)?,
        OutputFormat::Human if color => {
            // `colored` would otherwise consult the real stdout.
            colored::control::set_override(true);
            write_colored(&report, out)?;
        }
        OutputFormat::Human => output::write_human(&report, out)?,
    }
    Ok(report.exit_code())
}

fn outline(path: &Path, format: OutputFormat, out: &mut dyn Write) -> anyhow::Result<i32> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let id = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
    let document = extract_document(&id, &content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?,
        OutputFormat::Human => output::write_outline(&document, out)?,
    }
    Ok(0)
}

fn languages(config: Option<&Path>, out: &mut dyn Write) -> anyhow::Result<i32> {
    let check_config = FileConfig::load(config)?.check_config()?;
    let registry = LanguageRegistry::for_config(&check_config);

    for info in registry.languages() {
        if info.aliases.is_empty() {
            writeln!(out, "{}", info.name)?;
        } else {
            writeln!(out, "{} ({})", info.name, info.aliases.join(", "))?;
        }
    }
    let unchecked: Vec<&str> = registry.unchecked_tags().collect();
    writeln!(out)?;
    writeln!(out, "not checked: {}", unchecked.join(", "))?;
    Ok(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_check_defaults() {
        let cli = parse(&["guidecheck", "check"]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(args.paths.is_empty());
        assert_eq!(args.format, OutputFormat::Human);
        assert_eq!(args.color, ColorChoice::Auto);
        assert!(!args.strict);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_check_all_flags() {
        let cli = parse(&[
            "guidecheck",
            "-vv",
            "check",
            "en.md",
            "fr.md",
            "--format",
            "json",
            "--exclude",
            "drafts/*",
            "--exclude",
            "old/*",
            "--reference",
            "en",
            "--fuzzy-threshold",
            "2",
            "--skip-language",
            "php",
            "--strict",
            "--no-align",
            "--no-validate",
            "--config",
            "ci.toml",
            "--color",
            "never",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.paths, vec![PathBuf::from("en.md"), PathBuf::from("fr.md")]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.exclude, vec!["drafts/*".to_owned(), "old/*".to_owned()]);
        assert_eq!(args.reference.as_deref(), Some("en"));
        assert_eq!(args.fuzzy_threshold, Some(2));
        assert_eq!(args.skip_language, vec!["php".to_owned()]);
        assert!(args.strict && args.no_align && args.no_validate);
        assert_eq!(args.config, Some(PathBuf::from("ci.toml")));
        assert!(!args.color.enabled(true));
    }

    #[test]
    fn test_outline_requires_file() {
        assert!(Cli::try_parse_from(["guidecheck", "outline"]).is_err());
        let cli = parse(&["guidecheck", "outline", "en.md", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Commands::Outline {
                format: OutputFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_format_rejected() {
        assert!(Cli::try_parse_from(["guidecheck", "check", "--format", "xml"]).is_err());
    }
}
