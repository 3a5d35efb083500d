//! Minimal CLI: declarations → (analyze | plan)
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use copygen::decl::Declarations;
use copygen::render::{Outline, render_plan};
use copygen::{Analysis, Diagnostic, GenerateConfig, GenerateError};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// plan deep-copy and equality methods for record types from front-end declarations
#[derive(Parser, Debug)]
#[command(name = "copygen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// classify every declared type and print which ones need a deep copy
    Analyze(AnalyzeOut),
    /// synthesize the per-field instructions for the requested types
    Plan(PlanOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the declaration document in each input (e.g. /frontend/decls)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SelectionSettings {
    /// type to generate methods for (repeatable)
    #[arg(long = "type", short = 't')]
    types: Vec<String>,

    /// field to leave out, as Type.Field (repeatable)
    #[arg(long, short)]
    exclude: Vec<String>,

    /// operations to generate: copy, equals, all, or Type.Copy / Type.Equals / Type.All
    #[arg(long, short)]
    method: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct AnalyzeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    selection: SelectionSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    selection: SelectionSettings,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Outline,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Load and merge every input document, in the order given.
    fn load(&self) -> anyhow::Result<Declarations> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut decls = Declarations::new();
        for source_path in source_paths {
            let doc = Declarations::from_path(&source_path, self.json_pointer.as_deref())
                .with_context(|| format!("failed to load {}", source_path.display()))?;
            tracing::debug!(path = %source_path.display(), types = doc.types.len(), "loaded declarations");
            decls.merge(doc);
        }
        Ok(decls)
    }
}

impl SelectionSettings {
    fn config(&self) -> anyhow::Result<GenerateConfig> {
        let config = GenerateConfig::from_selectors(&self.types, &self.exclude, &self.method)?;
        Ok(config)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Analyze(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                // 1) build state
                let decls = target.input_settings.load()?;
                let mut analysis = Analysis::new(target.selection.config()?);
                analysis.declare(&decls)?;

                // 2) report
                let report = analysis.report();
                print_diagnostics(&report.diagnostics);
                let src = serde_json::to_string_pretty(&report)?;
                write_output(target.out.as_deref(), &src)
            }
            Command::Plan(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                // 1) build state
                let decls = target.input_settings.load()?;
                let mut analysis = Analysis::new(target.selection.config()?);
                analysis.declare(&decls)?;

                // 2) synthesize
                let plan = analysis.plan()?;
                print_diagnostics(plan.all_diagnostics());

                // 3) render
                let src = match target.format {
                    OutputFormat::Json => serde_json::to_string_pretty(&plan)?,
                    OutputFormat::Outline => {
                        let mut outline = Outline::new();
                        render_plan(&plan, &mut outline)?;
                        outline.into_string()
                    }
                };
                write_output(target.out.as_deref(), &src)
            }
        }
    }
}

/// Logs go to stderr so stdout stays the plan. `RUST_LOG` overrides the
/// default `warn` level.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_diagnostics<'a>(diagnostics: impl IntoIterator<Item = &'a Diagnostic>) {
    for diag in diagnostics {
        eprintln!("{} {diag}", "warning:".yellow().bold());
    }
}

fn write_output(out: Option<&Path>, src: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, src).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{src}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, GenerateError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(GenerateError::NoMatches { pattern: pattern.to_string() });
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
