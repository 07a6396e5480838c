use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="panelcount",
          version=&**FULL_VERSION,
          about="Per-sample target allele counts for a variant panel",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Convert a genotype matrix into per-sample target allele counts")]
    Count(CountArgs),
    #[clap(about = "Check how each panel site resolves against a genotype matrix")]
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("count")))]
#[command(arg_required_else_help(true))]
pub struct CountArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "panel")]
    #[clap(help = "Panel CSV with variant identifier and target allele columns")]
    #[clap(value_name = "PANEL")]
    #[arg(value_parser = check_file_exists)]
    pub panel_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "matrix")]
    #[clap(help = "Tab-separated genotype matrix (CHROM POS ID REF ALT samples...)")]
    #[clap(value_name = "MATRIX")]
    #[arg(value_parser = check_file_exists)]
    pub matrix_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output")]
    #[clap(help = "Output CSV with one row per sample")]
    #[clap(value_name = "OUTPUT")]
    #[arg(value_parser = check_output_path)]
    pub output_path: PathBuf,

    #[clap(long = "diagnostics")]
    #[clap(help = "Write per-cell diagnostics (sample, variant, reason) to this TSV")]
    #[clap(value_name = "DIAGNOSTICS")]
    #[arg(value_parser = check_output_path)]
    pub diagnostics_path: Option<PathBuf>,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "na-warn-frac")]
    #[clap(value_name = "FRAC")]
    #[clap(help = "Warn about sites whose fraction of NA cells exceeds this value")]
    #[clap(default_value = "0.5")]
    #[arg(value_parser = ensure_unit_float)]
    pub na_warn_frac: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "max-retries")]
    #[clap(value_name = "RETRIES")]
    #[clap(help = "Retries for transient matrix read failures")]
    #[clap(default_value = "3")]
    pub max_retries: usize,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("validate")))]
#[command(arg_required_else_help(true))]
pub struct ValidateArgs {
    #[clap(required = true)]
    #[clap(short = 'p')]
    #[clap(long = "panel")]
    #[clap(help = "Panel CSV with variant identifier and target allele columns")]
    #[clap(value_name = "PANEL")]
    #[arg(value_parser = check_file_exists)]
    pub panel_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'm')]
    #[clap(long = "matrix")]
    #[clap(help = "Tab-separated genotype matrix (CHROM POS ID REF ALT samples...)")]
    #[clap(value_name = "MATRIX")]
    #[arg(value_parser = check_file_exists)]
    pub matrix_path: PathBuf,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_output_path(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if path.file_name().is_none() {
        return Err(format!("Output path has no file name: {}", s));
    }
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(path.to_path_buf())
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}
