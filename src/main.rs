use clap::{Parser as ClapParser, Subcommand};
use hyperlambda::TypeRegistry;
use hyperlambda::cli::{self, CheckOptions, CheckResult, CliError, EvalOptions};
use std::io::{self, Read};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(ClapParser)]
#[command(name = "hl")]
#[command(about = "hl - Parse, canonicalise and query Hyperlambda documents")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate Hyperlambda and print it in canonical form
    Check {
        /// Hyperlambda input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Keep comments
        #[arg(short, long)]
        comments: bool,

        /// Only validate syntax, don't print the document
        #[arg(long)]
        syntax_only: bool,

        /// Print the JSON projection of the document
        #[arg(long)]
        json: bool,

        /// Read the JSON projection instead of Hyperlambda
        #[arg(long)]
        from_json: bool,
    },

    /// Evaluate an expression against the document root
    Eval {
        /// The expression, for instance `../*/foo/*`
        expression: String,

        /// Hyperlambda input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Print the resulting nodes as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered type tags
    Types,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = TypeRegistry::new();
    let result = match cli.command {
        Commands::Check {
            input,
            comments,
            syntax_only,
            json,
            from_json,
        } => read_input(input).and_then(|input| {
            let options = CheckOptions {
                input,
                comments,
                syntax_only,
                json,
                from_json,
            };
            cli::execute_check(&options, &registry)
        }),
        Commands::Eval {
            expression,
            input,
            json,
        } => read_input(input).and_then(|input| {
            let options = EvalOptions {
                expression,
                input,
                json,
            };
            cli::execute_eval(&options, &registry)
        }),
        Commands::Types => {
            for tag in cli::list_types(&registry) {
                println!("{}", tag);
            }
            std::process::exit(0);
        }
    };

    match result.and_then(print_result) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn print_result(result: CheckResult) -> Result<(), CliError> {
    match result {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Hyperlambda(text) => print!("{}", text),
        CheckResult::Json(json) => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}
