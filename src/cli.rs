//! Minimal CLI: load raw declaration modules → resolve → (target source | debug view)
use std::fs;
use std::io::{self, Write as _};
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use colored::Colorize as _;

use crate::decl;
use crate::diag::Diagnostic;
use crate::emit::{self, Lang};
use crate::resolve::{self, ModuleSet, Resolved};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// convert structured type declarations into flow, typescript, or elm types
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve embeddings and emit declarations for a target language
    Emit(EmitOut),
    /// resolve embeddings and print the resolved set as pretty JSON
    Resolve(ResolveOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more module files. May be literal paths or quoted glob patterns.
    ///
    /// The first module named is the primary set; the others back
    /// `module.Name` embedded-type lookups.
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// narrate loaded files and emitted counts on stderr
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct EmitOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// target language. One of: flow, ts, elm
    #[arg(long, short)]
    lang: String,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResolveOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Emit(target) => {
                // unknown language is a configuration-time failure; check it
                // before touching any input
                let lang: Lang = target.lang.parse()?;
                let resolved = target.input_settings.load_resolve()?;
                report(&resolved.diagnostics);

                let count = match target.out.as_ref() {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            fs::create_dir_all(parent)
                                .with_context(|| format!("creating {}", parent.display()))?;
                        }
                        let file = fs::File::create(path)
                            .with_context(|| format!("creating {}", path.display()))?;
                        let mut out = io::BufWriter::new(file);
                        let count = emit::emit_all(&resolved.decls, lang, &mut out)?;
                        out.flush()?;
                        count
                    }
                    None => {
                        let stdout = io::stdout();
                        emit::emit_all(&resolved.decls, lang, &mut stdout.lock())?
                    }
                };
                if target.input_settings.verbose {
                    eprintln!("emitted {count} declarations");
                }
                Ok(())
            }
            Command::Resolve(target) => {
                let resolved = target.input_settings.load_resolve()?;
                report(&resolved.diagnostics);

                let mut json = serde_json::to_string_pretty(&resolved.decls)?;
                json.push('\n');
                match target.out.as_ref() {
                    Some(path) => {
                        if let Some(parent) = path.parent() {
                            fs::create_dir_all(parent)
                                .with_context(|| format!("creating {}", parent.display()))?;
                        }
                        fs::write(path, &json)
                            .with_context(|| format!("writing {}", path.display()))?;
                    }
                    None => {
                        io::stdout().write_all(json.as_bytes())?;
                    }
                }
                if target.input_settings.verbose {
                    eprintln!("resolved {} declarations", resolved.decls.len());
                }
                Ok(())
            }
        }
    }
}

impl InputSettings {
    fn load_resolve(&self) -> anyhow::Result<Resolved> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        anyhow::ensure!(!source_paths.is_empty(), "no input files given");

        let mut modules = Vec::new();
        for source_path in &source_paths {
            let module = decl::load_module(source_path)?;
            if self.verbose {
                eprintln!(
                    "loaded module `{}` from {} ({} declarations)",
                    module.module,
                    source_path.display(),
                    module.declarations.len()
                );
            }
            modules.push(module);
        }

        // every module backs embedded-type lookups, including the primary one
        let primary = modules[0].clone();
        let mut set = ModuleSet::default();
        for module in modules {
            set.insert(module);
        }
        Ok(resolve::resolve(&primary, &set))
    }
}

fn report(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("{} {d}", "warning:".yellow().bold());
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
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
            // an explicit glob that matches nothing is an input mistake
            anyhow::ensure!(matched_any, "glob pattern matched no files: {pattern}");
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
