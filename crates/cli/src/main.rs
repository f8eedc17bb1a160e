// colcheck CLI - verify wizard-typed columns and correct unexpected values

mod backend;
mod exit_codes;
mod interactive;
mod report;
mod wizard_file;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;

use colcheck_config::Settings;
use colcheck_core::{HostError, VerificationRequest};
use colcheck_engine::MemoryHost;
use colcheck_verify::{check_column, check_columns, run_verification, SessionOptions, Verification};

use backend::{load_csv, write_csv, Backend, Source};
use exit_codes::{
    host_hint, EXIT_ERROR, EXIT_HOST, EXIT_IO, EXIT_REVERTED, EXIT_SUCCESS, EXIT_UNEXPECTED_VALUES,
    EXIT_USAGE, EXIT_WIZARD_FILE,
};
use wizard_file::{CliWizard, Outcome, WizardFile, WizardFileError};

#[derive(Parser)]
#[command(name = "colcheck")]
#[command(about = "Verify typed columns and correct unexpected values")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/colcheck/settings.json)
    #[arg(long, global = true, env = "COLCHECK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify the columns a wizard typed and correct unexpected values
    #[command(after_help = "\
Wizard file:
  name = \"Address import\"
  [[columns]]
  name = \"Postcode\"
  expression = 'postcode ~ /^[A-Z]{1,2}[0-9]/'
  expected_type = \"postcode\"
  example_value = \"SW1A 1AA\"

Interactive commands:
  inspect            list the unexpected values of the current column
  set <row> <value>  stage a correction for a listed row
  fix                apply staged corrections and verify again
  done               stop correcting the current column
  accept             keep the current column as it is
  retry              run a failed verification query again
  undo               revert everything back to before the wizard ran

Examples:
  colcheck verify address.toml --csv addresses.csv --output fixed.csv
  colcheck verify address.toml --csv addresses.csv --check --json
  colcheck verify address.toml --project 2048531263977 --host http://127.0.0.1:3333")]
    Verify {
        /// Wizard file (TOML) listing the typed columns
        wizard: PathBuf,

        /// Table to verify, as CSV with a header row
        #[arg(long, conflicts_with = "project")]
        csv: Option<PathBuf>,

        /// Write the corrected table here once every column is resolved
        #[arg(long, short = 'o', requires = "csv")]
        output: Option<PathBuf>,

        /// Project id on the host (default: host.project from settings)
        #[arg(long)]
        project: Option<String>,

        /// Host URL (default: host.url from settings)
        #[arg(long, value_name = "URL")]
        host: Option<String>,

        /// Only report verdicts; exit 3 if a column needs attention
        #[arg(long)]
        check: bool,

        /// Report as JSON (with --check)
        #[arg(long, requires = "check")]
        json: bool,

        /// Flagged values listed per inspection (default: session.displayLimit)
        #[arg(long)]
        display_limit: Option<usize>,
    },

    /// Classify one column of a CSV file and print its verdict
    #[command(after_help = "\
Examples:
  colcheck classify --csv orders.csv --column Qty --expression 'integer : integer' --expected integer
  colcheck classify --csv orders.csv --column Placed --expression 'date : date' --expected date --json")]
    Classify {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long)]
        column: String,

        /// Transform expression yielding a type label, or "error"
        #[arg(long)]
        expression: String,

        /// Type label the column should have
        #[arg(long)]
        expected: String,

        /// Example of a valid value
        #[arg(long, default_value = "")]
        example: String,

        #[arg(long)]
        json: bool,
    },

    /// Show the settings file path and the effective settings
    Config {
        /// Write a commented settings file if none exists
        #[arg(long)]
        init: bool,

        /// Store a default project id
        #[arg(long, value_name = "ID")]
        set_project: Option<String>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);
    let (settings, settings_problem) = match Settings::read(&config_path) {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    };
    init_logging(&settings.log_level);
    if let Some(problem) = settings_problem {
        log::warn!("{}; using default settings", problem);
    }

    let result = match cli.command {
        Commands::Verify { wizard, csv, output, project, host, check, json, display_limit } => {
            let options = SessionOptions {
                display_limit: display_limit.unwrap_or(settings.display_limit).max(1),
                correction_limit: settings.correction_limit,
            };
            source_for(csv, project, host, &settings).and_then(|source| {
                if check {
                    cmd_check(&wizard, &source, &settings, json)
                } else {
                    cmd_verify(&wizard, &source, &settings, options, output)
                }
            })
        }
        Commands::Classify { csv, column, expression, expected, example, json } => {
            cmd_classify(csv, column, expression, expected, example, json)
        }
        Commands::Config { init, set_project } => cmd_config(&config_path, settings, init, set_project),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// `RUST_LOG` wins over `log.level`.
fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn host(err: &HostError, host_url: Option<&str>) -> Self {
        Self { code: EXIT_HOST, message: err.to_string(), hint: host_hint(err, host_url) }
    }

    pub fn wizard(err: WizardFileError) -> Self {
        let hint = match &err {
            WizardFileError::Invalid(_) | WizardFileError::Toml(_) => {
                Some("see `colcheck verify --help` for the file layout".to_string())
            }
            WizardFileError::Io(_) => None,
        };
        Self { code: EXIT_WIZARD_FILE, message: err.to_string(), hint }
    }

    /// Exit with `code` and print nothing more.
    pub fn exit(code: u8) -> Self {
        Self { code, message: String::new(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn source_for(
    csv: Option<PathBuf>,
    project: Option<String>,
    host: Option<String>,
    settings: &Settings,
) -> Result<Source, CliError> {
    if let Some(path) = csv {
        if host.is_some() {
            return Err(CliError::args("--host only applies to --project"));
        }
        return Ok(Source::Csv(path));
    }
    match project.or_else(|| settings.host_project.clone()) {
        Some(id) => Ok(Source::Project { id, host }),
        None => Err(CliError::args("no table given")
            .with_hint("pass --csv FILE or --project ID (or set host.project in settings)")),
    }
}

// ============================================================================
// verify
// ============================================================================

fn cmd_verify(
    wizard_path: &Path,
    source: &Source,
    settings: &Settings,
    options: SessionOptions,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let wizard_file = WizardFile::load(wizard_path).map_err(CliError::wizard)?;
    log::info!(
        "wizard '{}': {} of {} column(s) verified",
        wizard_file.name,
        wizard_file.verified_count(),
        wizard_file.columns.len()
    );
    let mut backend = Backend::open(source, settings)?;
    let url = backend.url().map(str::to_string);

    let mut wizard = CliWizard::start(&wizard_file.name, backend.host())
        .map_err(|e| CliError::host(&e, url.as_deref()))?;

    let finished = match run_verification(backend.host(), &mut wizard, &wizard_file.columns, options) {
        Verification::AllClear => {
            println!("All columns verified.");
            true
        }
        Verification::NeedsAttention(mut session) => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            interactive::drive(&mut session, stdin.lock(), &mut stdout)?
        }
    };

    match wizard.outcome() {
        Outcome::Completed => {
            if let Some(path) = output {
                match backend.table() {
                    Some(table) => {
                        write_csv(table, &path)?;
                        log::info!("wrote {}", path.display());
                    }
                    None => return Err(CliError::args("--output requires --csv")),
                }
            }
            Ok(())
        }
        Outcome::Reverted => Err(CliError {
            code: EXIT_REVERTED,
            message: format!("wizard '{}' was undone", wizard_file.name),
            hint: None,
        }),
        Outcome::Pending if !finished => Err(CliError {
            code: EXIT_UNEXPECTED_VALUES,
            message: "input ended before every column was resolved".to_string(),
            hint: Some("answer 'accept' to keep a column as it is, or 'undo'".to_string()),
        }),
        Outcome::Pending => Err(CliError {
            code: EXIT_ERROR,
            message: "session finished without completing the wizard".to_string(),
            hint: None,
        }),
    }
}

fn cmd_check(wizard_path: &Path, source: &Source, settings: &Settings, json: bool) -> Result<(), CliError> {
    let wizard_file = WizardFile::load(wizard_path).map_err(CliError::wizard)?;
    let mut backend = Backend::open(source, settings)?;

    let checks = check_columns(backend.host(), &wizard_file.columns);
    let report = report::CheckReport::new(&wizard_file.name, checks);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        report.write_text(&mut out).map_err(|e| CliError::io(e.to_string()))?;
    }

    if report.unavailable > 0 {
        let hint = backend.url().map(|url| format!("is the host running at {}?", url));
        return Err(CliError { code: EXIT_HOST, message: String::new(), hint });
    }
    if report.needs_attention > 0 {
        return Err(CliError::exit(EXIT_UNEXPECTED_VALUES));
    }
    Ok(())
}

// ============================================================================
// classify
// ============================================================================

fn cmd_classify(
    csv: PathBuf,
    column: String,
    expression: String,
    expected: String,
    example: String,
    json: bool,
) -> Result<(), CliError> {
    let mut host = MemoryHost::new(load_csv(&csv)?);
    let request = VerificationRequest::new(column, expression, expected, example);
    let verdict = check_column(&mut host, &request).map_err(|e| CliError::host(&e, None))?;

    if json {
        let text = serde_json::to_string_pretty(&verdict).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", text);
    } else {
        println!("{}: {}", verdict.severity, verdict.message);
        println!(
            "dominant type {} on {} of {} rows, {} unexpected",
            if verdict.dominant_type.is_empty() { "-" } else { &verdict.dominant_type },
            verdict.dominant_type_count,
            verdict.total_rows,
            verdict.error_count,
        );
    }

    if verdict.success {
        Ok(())
    } else {
        Err(CliError::exit(EXIT_UNEXPECTED_VALUES))
    }
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(
    path: &Path,
    mut settings: Settings,
    init: bool,
    set_project: Option<String>,
) -> Result<(), CliError> {
    if init {
        let created = Settings::create_default_file(path)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
        if created {
            println!("created {}", path.display());
        }
    }
    if let Some(project) = set_project {
        settings.host_project = Some(project);
        settings
            .save_to(path)
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))?;
    }

    println!("{}", path.display());
    let text = serde_json::to_string_pretty(&settings).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
