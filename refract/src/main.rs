use clap::{Parser, Subcommand};
use log::{info, warn};
use refract_core::{Compiler, Options, Preprocess};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "refract")]
#[command(about = "A GLSL to JavaScript transpiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a shader to JavaScript
    Compile {
        /// Input shader file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to the input name with a .js extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Keep composite construction calls instead of expanding them
        #[arg(long)]
        no_optimize: bool,

        /// Skip macro/conditional preprocessing
        #[arg(long)]
        no_preprocess: bool,
    },

    /// Compile a shader without writing output
    Check {
        /// Input shader file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Skip macro/conditional preprocessing
        #[arg(long)]
        no_preprocess: bool,
    },
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Compilation error: {0}")]
    CompilationError(#[from] refract_core::error::CompileError),
}

fn main() -> Result<(), DriverError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            no_optimize,
            no_preprocess,
        } => compile_file(input, output, no_optimize, no_preprocess),
        Commands::Check {
            input,
            no_preprocess,
        } => check_file(input, no_preprocess),
    }
}

fn build_compiler(no_optimize: bool, no_preprocess: bool) -> Compiler {
    Compiler::with_options(Options {
        optimize: !no_optimize,
        preprocess: if no_preprocess {
            Preprocess::Off
        } else {
            Preprocess::Standard
        },
        debug: false,
    })
}

fn compile_file(
    input: PathBuf,
    output: Option<PathBuf>,
    no_optimize: bool,
    no_preprocess: bool,
) -> Result<(), DriverError> {
    let source = fs::read_to_string(&input)?;
    let mut compiler = build_compiler(no_optimize, no_preprocess);
    let javascript = compiler.compile(&source)?;

    for warning in compiler.warnings() {
        warn!("{}: {}", input.display(), warning.message);
    }

    let output = output.unwrap_or_else(|| input.with_extension("js"));
    fs::write(&output, javascript)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn check_file(input: PathBuf, no_preprocess: bool) -> Result<(), DriverError> {
    let source = fs::read_to_string(&input)?;
    let mut compiler = build_compiler(false, no_preprocess);
    compiler.compile(&source)?;

    for warning in compiler.warnings() {
        warn!("{}: {}", input.display(), warning.message);
    }
    info!("{} is valid", input.display());
    Ok(())
}
