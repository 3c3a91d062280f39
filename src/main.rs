use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

use erlscope::config::{Config, OutputFormat};
use erlscope::diagnostics::{FragmentError, render_error};
use erlscope::parser::ast::Form;
use erlscope::span::Spanned;
use erlscope::{DeclarationSource, SourceDirLoader, pretty};

#[derive(Parser)]
#[command(name = "erlscope", version, about = "Free-variable analysis for Erlang fragments")]
struct Cli {
    /// Output format (overrides erlscope.toml)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Path to a config file (defaults to erlscope.toml in the current dir or an ancestor)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the free variables of an expression sequence
    FreeVars {
        /// Source file, or - for stdin
        #[arg(default_value = "-")]
        file: String,
    },
    /// Parse declarations (or a snippet) and pretty-print them
    Parse {
        /// Source file, or - for stdin
        #[arg(default_value = "-")]
        file: String,
        /// Treat the input as an expression sequence instead of declarations
        #[arg(long)]
        expr: bool,
    },
    /// Split a unit's declarations around one function
    Split {
        /// Unit name; loads <dir>/<unit>.erl
        unit: String,
        /// Function name
        name: String,
        /// Function arity
        arity: usize,
        /// Directory holding unit sources (overrides [loader] dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Dump the token stream with line numbers
    Tokens {
        /// Source file, or - for stdin
        #[arg(default_value = "-")]
        file: String,
        /// Line number of the first character (overrides [lexer] start_line)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        start_line: Option<u32>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn read_input(file: &str) -> Result<String, FragmentError> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| FragmentError::io(format!("could not read stdin: {e}"), PathBuf::from("-")))?;
        Ok(source)
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| FragmentError::io(format!("could not read file: {e}"), PathBuf::from(file)))
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, FragmentError> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Config::discover(&cwd)
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: could not serialize output: {e}");
            std::process::exit(1);
        }
    }
}

/// Render `err` against `source` and exit with status 1.
fn fail(source: &str, err: &FragmentError) -> ! {
    render_error(source, err);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_ref()).unwrap_or_else(|err| fail("", &err));
    let format = cli.format.unwrap_or(config.format);

    match cli.command {
        Commands::FreeVars { file } => {
            let source = read_input(&file).unwrap_or_else(|err| fail("", &err));
            let free = erlscope::parse_snippet_at(&source, config.start_line)
                .and_then(|expr| erlscope::free_variables(&expr))
                .unwrap_or_else(|err| fail(&source, &err));
            match format {
                OutputFormat::Json => print_json(&free),
                OutputFormat::Text => {
                    for name in &free {
                        println!("{name}");
                    }
                }
            }
        }
        Commands::Parse { file, expr } => {
            let source = read_input(&file).unwrap_or_else(|err| fail("", &err));
            if expr {
                let tree = erlscope::parse_snippet_at(&source, config.start_line)
                    .unwrap_or_else(|err| fail(&source, &err));
                match format {
                    OutputFormat::Json => print_json(&tree),
                    OutputFormat::Text => println!("{}", pretty::pretty_print_expr(&tree)),
                }
            } else {
                let forms = erlscope::tokenize(&source, config.start_line)
                    .and_then(|(tokens, _)| erlscope::parser::parse_declaration_tokens(&tokens))
                    .unwrap_or_else(|err| fail(&source, &err));
                match format {
                    OutputFormat::Json => print_json(&forms),
                    OutputFormat::Text => print!("{}", pretty::pretty_print_forms(&forms)),
                }
            }
        }
        Commands::Split { unit, name, arity, dir } => {
            let loader = SourceDirLoader::new(dir.unwrap_or(config.loader_dir));
            let declarations = loader.load_declarations(&unit).unwrap_or_else(|err| {
                let source = std::fs::read_to_string(loader.path_for(&unit)).unwrap_or_default();
                fail(&source, &err)
            });
            let split = match erlscope::split_at(declarations, &name, arity) {
                Ok(split) => split,
                Err(not_found) => {
                    eprintln!("error: {not_found} in unit '{unit}'");
                    std::process::exit(1);
                }
            };
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "before": split.before,
                    "matched": split.matched,
                    "after": split.after,
                })),
                OutputFormat::Text => {
                    print_partition("before", &split.before);
                    print_partition("matched", std::slice::from_ref(&split.matched));
                    print_partition("after", &split.after);
                }
            }
        }
        Commands::Tokens { file, start_line } => {
            let source = read_input(&file).unwrap_or_else(|err| fail("", &err));
            let start_line = start_line.unwrap_or(config.start_line);
            let (tokens, end_line) =
                erlscope::tokenize(&source, start_line).unwrap_or_else(|err| fail(&source, &err));
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "tokens": tokens
                        .iter()
                        .map(|tok| serde_json::json!({ "line": tok.span.line, "text": tok.node.to_string() }))
                        .collect::<Vec<_>>(),
                    "end_line": end_line,
                })),
                OutputFormat::Text => {
                    for tok in &tokens {
                        println!("{:>5}  {}", tok.span.line, tok.node);
                    }
                }
            }
        }
    }
}

fn print_partition(label: &str, forms: &[Spanned<Form>]) {
    println!("%% {label} ({} declarations)", forms.len());
    print!("{}", pretty::pretty_print_forms(forms));
}
