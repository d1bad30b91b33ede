//! CLI tool for tss-converter - turns a workbook into Step 1 templates
//!
//! Usage:
//!   tss_converter_cli convert "Sample File.xlsx" -o output   # templates + archive
//!   tss_converter_cli sheets "Sample File.xlsx"              # which sheets qualify
//!   tss_converter_cli inspect "44x53 - Step1.xlsx"           # verify a template
//!   tss_converter_cli dump book.xlsx -o book.json            # workbook model as JSON
//!   tss_converter_cli keepalive --url https://host/ --once   # one keep-alive round

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tss_converter::archive::format_size;
use tss_converter::classify::sheet_has_data;
use tss_converter::keepalive::{self, HttpProbe};
use tss_converter::{
    inspect_template, ConverterConfig, Gate, Outcome, Pipeline, Progress, Stage, Upload,
};

/// Default config file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "tss_converter.toml";

/// Turn each non-empty sheet of an Excel workbook into a Step 1 template
#[derive(Parser, Debug)]
#[command(name = "tss_converter_cli", version, about)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build one template per non-empty sheet and bundle them into a ZIP
    Convert {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory the templates and archive are written to
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,

        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        /// Write the individual templates only
        #[arg(long)]
        no_archive: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the workbook's sheets and whether each would get a template
    Sheets {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Check a generated template against the required structure
    Inspect {
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },

    /// Parse a workbook and print its model as JSON
    Dump {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write JSON here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Ping the keep-alive URL with bounded retries
    Keepalive {
        /// Overrides keepalive.url from the config
        #[arg(long)]
        url: Option<String>,

        /// Run a single round instead of looping
        #[arg(long)]
        once: bool,

        #[arg(short, long, value_name = "CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Explicit path, else `tss_converter.toml` in the working directory, else defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<ConverterConfig> {
    if let Some(path) = path {
        return ConverterConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return ConverterConfig::load(local)
            .with_context(|| format!("loading config {}", local.display()));
    }
    tracing::debug!("Using default embedded configuration");
    Ok(ConverterConfig::default())
}

fn read_input(path: &Path) -> anyhow::Result<(String, Vec<u8>)> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(ToString::to_string)
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, bytes))
}

fn run(command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Convert {
            input,
            output,
            config,
            no_archive,
            json,
        } => convert(&input, &output, config.as_deref(), no_archive, json),
        Command::Sheets {
            input,
            config,
            json,
        } => sheets(&input, config.as_deref(), json),
        Command::Inspect { template, config } => inspect(&template, config.as_deref()),
        Command::Dump { input, output } => dump(&input, output.as_deref()),
        Command::Keepalive { url, once, config } => keep_alive(url, once, config.as_deref()),
    }
}

fn convert(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    no_archive: bool,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let config = load_config(config)?;
    let (name, bytes) = read_input(input)?;

    let mut on_progress = |p: Progress| {
        if p.stage == Stage::Building && p.total > 0 {
            tracing::info!("building templates {}/{}", p.completed, p.total);
        }
    };
    let outcome = Pipeline::new(&config).run(Upload::new(&name, &bytes), &mut on_progress);

    if let Some(bundle) = outcome.bundle() {
        if !bundle.templates.is_empty() {
            fs::create_dir_all(output)
                .with_context(|| format!("creating {}", output.display()))?;
        }
        for template in &bundle.templates {
            let path = output.join(&template.file_name);
            fs::write(&path, &template.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        if let (Some(archive), false) = (&bundle.archive, no_archive) {
            let path = output.join(&archive.file_name);
            fs::write(&path, &archive.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.report())?);
    } else {
        print_summary(&outcome, output, no_archive);
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(outcome: &Outcome, output: &Path, no_archive: bool) {
    if let Some(message) = outcome.user_message() {
        match &message.detail {
            Some(detail) => eprintln!("{message}: {detail}"),
            None => eprintln!("{message}"),
        }
    }

    let Some(bundle) = outcome.bundle() else {
        return;
    };
    let summary = bundle.download_summary();
    for entry in &summary.files {
        println!(
            "{}  ({})",
            output.join(&entry.file_name).display(),
            entry.size
        );
    }
    for failure in &bundle.failures {
        println!("skipped {:?}: {}", failure.sheet_name, failure.fault);
    }
    if let (Some(archive), false) = (&bundle.archive, no_archive) {
        let size = u64::try_from(archive.bytes.len()).unwrap_or(u64::MAX);
        println!(
            "{}  ({} files, {})",
            output.join(&archive.file_name).display(),
            archive.members.len(),
            format_size(size)
        );
    }
}

#[derive(serde::Serialize)]
struct SheetLine<'a> {
    name: &'a str,
    cells: usize,
    qualifies: bool,
}

fn sheets(input: &Path, config: Option<&Path>, json: bool) -> anyhow::Result<ExitCode> {
    let config = load_config(config)?;
    let (name, bytes) = read_input(input)?;

    let workbook = match Gate::new(&config).admit(&Upload::new(&name, &bytes)) {
        Ok(workbook) => workbook,
        Err(err) => {
            let message = err.user_message();
            eprintln!("{message}");
            if let Some(detail) = message.detail {
                eprintln!("  {detail}");
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    let lines: Vec<SheetLine<'_>> = workbook
        .sheets
        .iter()
        .map(|sheet| SheetLine {
            name: &sheet.name,
            cells: sheet.cells.len(),
            qualifies: sheet_has_data(sheet),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        println!("{} ({}, {} sheets)", workbook.source_name, workbook.format, lines.len());
        for line in &lines {
            let mark = if line.qualifies { "data " } else { "empty" };
            println!("  [{mark}] {}  ({} cells)", line.name, line.cells);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect(template: &Path, config: Option<&Path>) -> anyhow::Result<ExitCode> {
    let config = load_config(config)?;
    let (name, bytes) = read_input(template)?;

    let defects = inspect_template(&bytes, &config.template);
    if defects.is_empty() {
        println!("{name}: ok");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{name}: {} defect(s)", defects.len());
    for defect in &defects {
        println!("  - {defect}");
    }
    Ok(ExitCode::FAILURE)
}

fn dump(input: &Path, output: Option<&Path>) -> anyhow::Result<ExitCode> {
    let (name, bytes) = read_input(input)?;
    let json = tss_converter::parse_to_json(&bytes, &name)
        .with_context(|| format!("parsing {}", input.display()))?;

    match output {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
            eprintln!("Written: {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn keep_alive(url: Option<String>, once: bool, config: Option<&Path>) -> anyhow::Result<ExitCode> {
    let config = load_config(config)?;
    let settings = &config.keepalive;
    let Some(url) = url.or_else(|| settings.url.clone()) else {
        bail!("no keep-alive URL: pass --url or set keepalive.url in the config");
    };

    let probe = HttpProbe::new(settings)?;
    let reports = keepalive::run(
        &probe,
        &url,
        settings,
        once.then_some(1),
        std::thread::sleep,
    );

    let ok = reports.last().is_some_and(|report| report.ok);
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
