use clap::{Parser, Subcommand};
use ldml2json::config::render_transforms;
use ldml2json::traits::Parser as _;
use ldml2json::{ConvertOptions, Converter, RecordSet};
use ldml2json_cli::convert::input_locale;
use ldml2json_cli::{ConvertArgs, build_converter, collect_routes, print_routes, run_convert_command};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log rewrite and routing decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert record files into JSON sections.
    Convert {
        /// Record files (TSV or JSON) to convert
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<String>,

        /// Output directory
        #[arg(short, long)]
        output: String,

        /// Data kind: `main` for locale data, `rbnf` for number format rules,
        /// `supplemental` otherwise
        #[arg(short, long, default_value = "main")]
        kind: String,

        /// Locale of the input (defaults to the file stem)
        #[arg(short, long)]
        locale: Option<String>,

        /// Section rules file
        #[arg(long)]
        sections: Option<String>,

        /// Path rewrite rules file
        #[arg(long)]
        transforms: Option<String>,

        /// CLDR version written into identity items
        #[arg(long)]
        cldr_version: Option<String>,

        /// Also write the catch-all `other` section
        #[arg(long)]
        other: bool,

        /// Do not copy identity items into every section
        #[arg(long)]
        no_identity: bool,

        /// Keep data for every numbering system
        #[arg(long)]
        full_numbers: bool,

        /// Input is fully resolved
        #[arg(long)]
        resolved: bool,

        /// Write sections under their package directories
        #[arg(long)]
        packages: bool,
    },

    /// Show the section each record routes to.
    Route {
        /// Record file (TSV or JSON)
        #[arg(short, long)]
        input: String,

        /// Data kind: `main` for locale data, `supplemental` otherwise
        #[arg(short, long, default_value = "main")]
        kind: String,

        /// Locale of the input (defaults to the file stem)
        #[arg(short, long)]
        locale: Option<String>,

        /// Section rules file
        #[arg(long)]
        sections: Option<String>,

        /// Path rewrite rules file
        #[arg(long)]
        transforms: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the active path rewrite rules.
    Rules {
        /// Path rewrite rules file
        #[arg(long)]
        transforms: Option<String>,

        /// CLDR version rules to prepend
        #[arg(long)]
        cldr_version: Option<String>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (true, _) => LevelFilter::Debug,
        (_, true) => LevelFilter::Error,
        _ => LevelFilter::Warn,
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
}

fn run(commands: Commands) -> Result<(), String> {
    match commands {
        Commands::Convert {
            input,
            output,
            kind,
            locale,
            sections,
            transforms,
            cldr_version,
            other,
            no_identity,
            full_numbers,
            resolved,
            packages,
        } => {
            let mut options = ConvertOptions::default()
                .with_write_other(other)
                .with_copy_identity(!no_identity)
                .with_full_numbers(full_numbers)
                .with_resolved(resolved);
            if let Some(version) = cldr_version {
                options = options.with_cldr_version(version);
            }
            let args = ConvertArgs {
                inputs: input,
                output,
                kind,
                locale,
                sections,
                transforms,
                packages,
                options,
            };
            let total = run_convert_command(&args)?;
            log::info!("{} values written", total);
            Ok(())
        }
        Commands::Route {
            input,
            kind,
            locale,
            sections,
            transforms,
            json,
        } => {
            let converter = build_converter(
                sections.as_deref(),
                transforms.as_deref(),
                ConvertOptions::default(),
            )?;
            let records =
                RecordSet::read_from(&input).map_err(|e| format!("Error reading '{}': {}", input, e))?;
            let locale = input_locale(&input, locale.as_deref());
            let prefix = Converter::path_prefix(&kind, locale.as_deref());
            let routes = collect_routes(&converter, &records.records, &prefix);
            print_routes(&routes, json)
        }
        Commands::Rules {
            transforms,
            cldr_version,
        } => {
            let mut options = ConvertOptions::default();
            if let Some(version) = cldr_version {
                options = options.with_cldr_version(version);
            }
            let converter = build_converter(None, transforms.as_deref(), options)?;
            print!("{}", render_transforms(&converter.rewriter().specs()));
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args.commands) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
