//! openapi2idl CLI
//!
//! Command-line interface for converting OpenAPI documents into Protobuf or
//! Thrift IDL files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use openapi2idl_common::{ConvertOptions, IdlFile, Target};
use openapi2idl_generator::{FileSink, IdlGenerator, OutputSink, StdoutSink};
use openapi2idl_parser::{Conversion, OpenApiParser};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openapi2idl")]
#[command(version, about = "Convert OpenAPI documents into Protobuf or Thrift IDL", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document and display a summary of the resulting IR
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize a document\n  \
        openapi2idl inspect petstore.yaml\n\n  \
        # Dump the Thrift IR as JSON\n  \
        openapi2idl inspect petstore.json --target thrift --json")]
    Inspect {
        /// Path to the OpenAPI document (.json, .yaml or .yml)
        spec: PathBuf,

        /// Target the IR is built for
        #[arg(short, long, value_enum, default_value_t = TargetArg::Proto)]
        target: TargetArg,

        /// Print the full IR as pretty JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a document into an IDL file
    #[command(after_help = "EXAMPLES:\n  \
        # Protobuf to stdout\n  \
        openapi2idl convert petstore.yaml --target proto\n\n  \
        # Thrift into a file, keeping source names\n  \
        openapi2idl convert petstore.json \\\n    \
        --target thrift \\\n    \
        --no-naming \\\n    \
        --output ./idl/petstore.thrift\n\n  \
        # Options from a YAML file, package overridden on the command line\n  \
        openapi2idl convert petstore.yaml --config openapi2idl.yaml --package pets.v1")]
    Convert {
        /// Path to the OpenAPI document (.json, .yaml or .yml)
        spec: PathBuf,

        /// Output dialect (defaults to the config file's, then proto)
        #[arg(short, long, value_enum)]
        target: Option<TargetArg>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep source names instead of PascalCase types and snake_case fields
        #[arg(long)]
        no_naming: bool,

        /// Do not emit api.* HTTP binding options
        #[arg(long)]
        no_api_options: bool,

        /// Emit openapi.* documentation options (Protobuf only)
        #[arg(long)]
        openapi_options: bool,

        /// Package name (derived from info.title if not specified)
        #[arg(long)]
        package: Option<String>,

        /// YAML file with conversion options
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    /// Protocol Buffers (proto3)
    Proto,
    /// Apache Thrift
    Thrift,
}

impl From<TargetArg> for Target {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Proto => Target::Proto,
            TargetArg::Thrift => Target::Thrift,
        }
    }
}

/// Flags of the `convert` subcommand that feed [`ConvertOptions`]
#[derive(Debug, Default)]
struct OptionFlags {
    target: Option<TargetArg>,
    no_naming: bool,
    no_api_options: bool,
    openapi_options: bool,
    package: Option<String>,
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { spec, target, json } => {
            inspect_command(&spec, target.into(), json)?;
        }
        Commands::Convert {
            spec,
            target,
            output,
            no_naming,
            no_api_options,
            openapi_options,
            package,
            config,
        } => {
            let options = resolve_options(OptionFlags {
                target,
                no_naming,
                no_api_options,
                openapi_options,
                package,
                config,
            })?;
            convert_command(&spec, &options, output.as_deref(), cli.verbose)?;
        }
    }

    Ok(())
}

/// Log to stderr so IDL written to stdout stays clean
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Config file first, then explicit flags on top
fn resolve_options(flags: OptionFlags) -> Result<ConvertOptions> {
    let mut options = match &flags.config {
        Some(path) => ConvertOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ConvertOptions::default(),
    };

    if let Some(target) = flags.target {
        options.target = target.into();
    }
    if flags.no_naming {
        options.naming = false;
    }
    if flags.no_api_options {
        options.api_options = false;
    }
    if flags.openapi_options {
        options.openapi_options = true;
    }
    if flags.package.is_some() {
        options.package = flags.package;
    }
    Ok(options)
}

fn load(spec_path: &Path, options: &ConvertOptions) -> Result<Conversion> {
    eprintln!("{} Loading document: {}", "→".cyan(), spec_path.display());
    let parser = OpenApiParser::from_file(spec_path).context("Failed to load OpenAPI document")?;

    eprintln!("{} Lowering for {}", "→".cyan(), options.target.to_string().yellow());
    parser
        .convert(options)
        .context("Failed to convert OpenAPI document")
}

fn report_collisions(conversion: &Conversion) {
    for collision in &conversion.collisions {
        eprintln!(
            "{} Name collision: {} ({} kept, {} dropped)",
            "⚠".yellow(),
            collision.name.yellow(),
            collision.existing,
            collision.incoming
        );
    }
}

fn inspect_command(spec_path: &Path, target: Target, json: bool) -> Result<()> {
    let options = ConvertOptions::for_target(target);
    let conversion = load(spec_path, &options)?;
    report_collisions(&conversion);

    if json {
        let dumped =
            serde_json::to_string_pretty(&conversion.file).context("Failed to serialize IR")?;
        println!("{}", dumped);
        return Ok(());
    }

    print_summary(&conversion.file);
    Ok(())
}

fn print_summary(file: &IdlFile) {
    println!("\n{}", "✓ Conversion successful!".green().bold());
    println!("\n{}", "IDL File:".bold());
    println!("  Package: {}", file.package.yellow());
    println!("  Imports: {}", file.imports.len());
    println!("  Enums: {}", file.enums.len());
    println!("  Structs: {}", file.structs.len());
    println!("  Unions: {}", file.unions.len());
    println!("  Services: {}", file.services.len());

    for service in &file.services {
        println!("\n  • {} ({} methods)", service.name.cyan(), service.methods.len());
        for method in &service.methods {
            let binding = method
                .options
                .iter()
                .find(|o| o.name.starts_with("api."))
                .and_then(|o| o.value.as_str().map(|path| format!(" [{} {}]", o.name, path)))
                .unwrap_or_default();
            println!(
                "    {}({}) -> {}{}",
                method.name,
                method.inputs.join(", "),
                method.output,
                binding.dimmed()
            );
        }
    }
}

fn convert_command(
    spec_path: &Path,
    options: &ConvertOptions,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    if verbose {
        eprintln!("  Target: {}", options.target);
        eprintln!("  Naming: {}", options.naming);
        eprintln!("  API options: {}", options.api_options);
        eprintln!("  OpenAPI options: {}", options.openapi_options);
        if let Some(package) = &options.package {
            eprintln!("  Package: {}", package);
        }
    }

    let conversion = load(spec_path, options)?;
    report_collisions(&conversion);
    eprintln!(
        "{} Lowered {} declarations and {} methods",
        "✓".green(),
        conversion.file.enums.len() + conversion.file.structs.len() + conversion.file.unions.len(),
        conversion.file.method_count()
    );

    let generator =
        IdlGenerator::new(conversion.file, options.target).context("Failed to create generator")?;

    let mut sink: Box<dyn OutputSink> = match output {
        Some(path) => Box::new(FileSink::new(path)),
        None => Box::new(StdoutSink),
    };
    generator
        .write_to(sink.as_mut())
        .context("Failed to write IDL")?;

    if let Some(path) = output {
        eprintln!("\n{}", "✓ Conversion complete!".green().bold());
        eprintln!("  📄 {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_without_config() {
        let options = resolve_options(OptionFlags {
            target: Some(TargetArg::Thrift),
            no_naming: true,
            package: Some("pets".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(options.target, Target::Thrift);
        assert!(!options.naming);
        assert!(options.api_options);
        assert_eq!(options.package.as_deref(), Some("pets"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("options.yaml");
        fs::write(&path, "target: thrift\npackage: from_file\nopenapi_options: false\n").unwrap();

        let options = resolve_options(OptionFlags {
            openapi_options: true,
            package: Some("from_flag".to_string()),
            config: Some(path.clone()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(options.target, Target::Thrift);
        assert!(options.openapi_options);
        assert_eq!(options.package.as_deref(), Some("from_flag"));

        let untouched = resolve_options(OptionFlags {
            config: Some(path),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(untouched.package.as_deref(), Some("from_file"));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let result = resolve_options(OptionFlags {
            config: Some(PathBuf::from("/nonexistent/options.yaml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_convert_subcommand_parsing() {
        let cli = Cli::try_parse_from([
            "openapi2idl",
            "convert",
            "pets.yaml",
            "--target",
            "thrift",
            "--no-api-options",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                spec,
                target,
                no_api_options,
                output,
                ..
            } => {
                assert_eq!(spec, PathBuf::from("pets.yaml"));
                assert_eq!(target, Some(TargetArg::Thrift));
                assert!(no_api_options);
                assert!(output.is_none());
            }
            Commands::Inspect { .. } => panic!("expected convert"),
        }
    }
}
