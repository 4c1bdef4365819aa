//! Impact CLI - Command-line interface for Screen Impact
//!
//! Commands:
//! - calculate: Score questionnaire submissions (batch mode)
//! - validate: Check submissions without scoring them
//! - share: Print the share text for a submission
//! - doctor: Diagnose configuration and reference data
//! - schema: Print input/output schema information

use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use screen_impact::encoder::ShareMessage;
use screen_impact::reference::BUILTIN_REFERENCE_VERSION;
use screen_impact::types::{MAX_CHILD_AGE, MAX_DAILY_MINUTES, MIN_CHILD_AGE};
use screen_impact::{
    parse_submission, split_submissions, EngineConfig, ImpactEngine, ImpactError, ReferenceData,
    ENGINE_VERSION, PRODUCER_NAME,
};

/// Impact - screen-time impact diagnostic engine
#[derive(Parser)]
#[command(name = "impact")]
#[command(author = "Grenadille")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn screen-time questionnaires into impact diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score submissions and write results
    Calculate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Wrap each result in a report envelope
        #[arg(long)]
        report: bool,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference data file (JSON)
        #[arg(long)]
        reference: Option<PathBuf>,
    },

    /// Validate submissions without scoring them
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the share text for each submission
    Share {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// URL of the shared page, printed after the text
        #[arg(long)]
        url: Option<String>,

        /// Print the clipboard fallback text instead
        #[arg(long)]
        clipboard: bool,
    },

    /// Diagnose configuration and reference data
    Doctor {
        /// Engine configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference data file to check
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one submission per line)
    Ndjson,
    /// A single submission object or a JSON array of submissions
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Questionnaire submission
    Input,
    /// Impact result
    Output,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ImpactCliError> {
    match cli.command {
        Commands::Calculate {
            input,
            output,
            input_format,
            output_format,
            report,
            config,
            reference,
        } => cmd_calculate(
            &input,
            &output,
            input_format,
            output_format,
            report,
            config.as_deref(),
            reference.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Share {
            input,
            input_format,
            url,
            clipboard,
        } => cmd_share(&input, input_format, url.as_deref(), clipboard),

        Commands::Doctor {
            config,
            reference,
            json,
        } => cmd_doctor(config.as_deref(), reference.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_calculate(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    report: bool,
    config: Option<&Path>,
    reference: Option<&Path>,
) -> Result<(), ImpactCliError> {
    let engine = load_engine(config, reference)?;
    let submissions = parse_records(&read_input(input)?, &input_format)?;

    if submissions.is_empty() {
        return Err(ImpactCliError::NoSubmissions);
    }
    info!("scoring {} submission(s)", submissions.len());

    let mut records: Vec<serde_json::Value> = Vec::with_capacity(submissions.len());
    for record in submissions {
        let data = parse_submission(&record)?;
        let value = if report {
            serde_json::to_value(engine.report(&data)?)?
        } else {
            serde_json::to_value(engine.calculate(&data)?)?
        };
        records.push(value);
    }

    let output_data = format_output(&records, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), ImpactCliError> {
    let submissions = parse_records(&read_input(input)?, &input_format)?;
    let engine = ImpactEngine::new();

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();
    let mut adjusted = 0;
    for (index, record) in submissions.iter().enumerate() {
        match parse_submission(record).and_then(|data| engine.normalize(&data)) {
            Ok(normalized) => {
                if !normalized.adjustments.is_empty() {
                    adjusted += 1;
                }
            }
            Err(e) => errors.push(ValidationErrorDetail {
                index,
                error: e.to_string(),
            }),
        }
    }

    let report = ValidationReport {
        total_submissions: submissions.len(),
        valid_submissions: submissions.len() - errors.len(),
        invalid_submissions: errors.len(),
        clamped_submissions: adjusted,
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total submissions:   {}", report.total_submissions);
        println!("Valid submissions:   {}", report.valid_submissions);
        println!("Invalid submissions: {}", report.invalid_submissions);
        println!("Clamped submissions: {}", report.clamped_submissions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Submission {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_submissions > 0 {
        Err(ImpactCliError::ValidationFailed(report.invalid_submissions))
    } else {
        Ok(())
    }
}

fn cmd_share(
    input: &Path,
    input_format: InputFormat,
    url: Option<&str>,
    clipboard: bool,
) -> Result<(), ImpactCliError> {
    let submissions = parse_records(&read_input(input)?, &input_format)?;
    if submissions.is_empty() {
        return Err(ImpactCliError::NoSubmissions);
    }

    let engine = ImpactEngine::new();
    for record in submissions {
        let result = engine.calculate(&parse_submission(&record)?)?;
        if clipboard {
            println!("{}", ShareMessage::clipboard_text(&result));
            continue;
        }
        let share = ShareMessage::from_result(&result, url);
        println!("{}", share.text);
        if let Some(url) = &share.url {
            println!("{}", url);
        }
    }

    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    reference: Option<&Path>,
    json: bool,
) -> Result<(), ImpactCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    }];

    checks.push(match config {
        Some(path) => check_file(path, "config", |content| {
            let config = EngineConfig::from_json(content)?;
            Ok(format!(
                "Config valid (recommendation cap {}, ages {}-{})",
                config.recommendation_cap, config.trajectory.min_age, config.trajectory.max_age
            ))
        }),
        None => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        },
    });

    checks.push(match reference {
        Some(path) => check_file(path, "reference", |content| {
            let reference = ReferenceData::from_json(content)?;
            Ok(format!(
                "Reference data valid (version {}, {} curve points)",
                reference.version,
                reference.average_hours_by_age.len()
            ))
        }),
        None => DoctorCheck {
            name: "reference".to_string(),
            status: CheckStatus::Ok,
            message: format!("Using built-in reference data {}", BUILTIN_REFERENCE_VERSION),
        },
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch input ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Impact Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ImpactCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_file(
    path: &Path,
    name: &str,
    parse: impl Fn(&str) -> Result<String, ImpactError>,
) -> DoctorCheck {
    let (status, message) = if !path.exists() {
        (CheckStatus::Warning, format!("{} file does not exist", name))
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match parse(&content) {
                Ok(summary) => (CheckStatus::Ok, summary),
                Err(e) => (CheckStatus::Error, e.to_string()),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read {} file: {}", name, e)),
        }
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), ImpactCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: questionnaire submission");
                println!();
                println!("- childAge: integer, {}-{}", MIN_CHILD_AGE, MAX_CHILD_AGE);
                println!(
                    "- dailyScreenMinutes: {{ leisure, school?, social? }} minutes per day (clamped to 0-{})",
                    MAX_DAILY_MINUTES
                );
                println!("- bedtimeDeviceUse: true/false or never|rarely|sometimes|often|always");
                println!("- behavioralFlags: each none|low|moderate|high|severe");
                println!("  - sleepComplaints, physicalInactivity, attentionComplaints");
                println!("  - academicDecline, familyDisconnect, socialWithdrawal");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: impact result");
                println!();
                println!("- totalScore: 0-100 (100 = usage within the age average, no adverse impact)");
                println!("- belowAverage: true exactly when totalScore is 100");
                println!("- sleepImpact, physicalHealthImpact, attentionImpact,");
                println!("  academicImpact, familyImpact, socialImpact: {{ score, label, descriptor }}");
                println!("- shockPhrase: headline for the most affected dimension");
                println!("- comparisonData: {{ chartData: [{{ age, moyenne, enfant }}], markerAge }}");
                println!("- recommendations: distinct tailored suggestions");
            }
        }
    }

    Ok(())
}

// Helper functions

fn load_engine(config: Option<&Path>, reference: Option<&Path>) -> Result<ImpactEngine, ImpactCliError> {
    let config_json = config.map(fs::read_to_string).transpose()?;
    let reference_json = reference.map(fs::read_to_string).transpose()?;
    debug!(
        "loading engine (config: {}, reference: {})",
        config.map_or("default".into(), |p| p.display().to_string()),
        reference.map_or("built-in".into(), |p| p.display().to_string())
    );
    Ok(ImpactEngine::from_json(
        config_json.as_deref(),
        reference_json.as_deref(),
    )?)
}

fn read_input(input: &Path) -> Result<String, ImpactCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Split input into one JSON document per submission
fn parse_records(input: &str, format: &InputFormat) -> Result<Vec<String>, ImpactCliError> {
    match format {
        InputFormat::Ndjson => Ok(input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        InputFormat::Json => Ok(split_submissions(input)?),
    }
}

fn format_output(
    records: &[serde_json::Value],
    format: &OutputFormat,
) -> Result<String, ImpactCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

fn get_input_json_schema() -> String {
    let level = serde_json::json!({
        "type": "string",
        "enum": ["none", "low", "moderate", "high", "severe"]
    });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "SimulationData",
        "description": "Screen-time questionnaire submission",
        "type": "object",
        "required": ["childAge", "dailyScreenMinutes", "bedtimeDeviceUse", "behavioralFlags"],
        "properties": {
            "childAge": {
                "type": "integer",
                "minimum": MIN_CHILD_AGE,
                "maximum": MAX_CHILD_AGE
            },
            "dailyScreenMinutes": {
                "type": "object",
                "required": ["leisure"],
                "properties": {
                    "leisure": { "type": "integer" },
                    "school": { "type": "integer" },
                    "social": { "type": "integer" }
                }
            },
            "bedtimeDeviceUse": {
                "oneOf": [
                    { "type": "boolean" },
                    { "type": "string", "enum": ["never", "rarely", "sometimes", "often", "always"] }
                ]
            },
            "behavioralFlags": {
                "type": "object",
                "required": [
                    "sleepComplaints", "physicalInactivity", "attentionComplaints",
                    "academicDecline", "familyDisconnect", "socialWithdrawal"
                ],
                "properties": {
                    "sleepComplaints": level,
                    "physicalInactivity": level,
                    "attentionComplaints": level,
                    "academicDecline": level,
                    "familyDisconnect": level,
                    "socialWithdrawal": level
                }
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let impact = serde_json::json!({
        "type": "object",
        "required": ["score", "label", "descriptor"],
        "properties": {
            "score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "label": { "type": "string", "enum": ["low", "moderate", "high", "severe"] },
            "descriptor": { "type": "string" }
        }
    });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "ImpactResult",
        "description": "Screen-time impact diagnostic",
        "type": "object",
        "required": [
            "totalScore", "belowAverage", "sleepImpact", "physicalHealthImpact",
            "attentionImpact", "academicImpact", "familyImpact", "socialImpact",
            "shockPhrase", "comparisonData", "recommendations"
        ],
        "properties": {
            "totalScore": { "type": "integer", "minimum": 0, "maximum": 100 },
            "belowAverage": { "type": "boolean" },
            "sleepImpact": impact,
            "physicalHealthImpact": impact,
            "attentionImpact": impact,
            "academicImpact": impact,
            "familyImpact": impact,
            "socialImpact": impact,
            "shockPhrase": { "type": "string" },
            "comparisonData": {
                "type": "object",
                "properties": {
                    "chartData": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "age": { "type": "integer" },
                                "moyenne": { "type": "number" },
                                "enfant": { "type": ["number", "null"] }
                            }
                        }
                    },
                    "markerAge": { "type": "integer" }
                }
            },
            "recommendations": { "type": "array", "items": { "type": "string" } }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum ImpactCliError {
    Io(io::Error),
    Impact(ImpactError),
    Json(serde_json::Error),
    NoSubmissions,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for ImpactCliError {
    fn from(e: io::Error) -> Self {
        ImpactCliError::Io(e)
    }
}

impl From<ImpactError> for ImpactCliError {
    fn from(e: ImpactError) -> Self {
        ImpactCliError::Impact(e)
    }
}

impl From<serde_json::Error> for ImpactCliError {
    fn from(e: serde_json::Error) -> Self {
        ImpactCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ImpactCliError> for CliError {
    fn from(e: ImpactCliError) -> Self {
        match e {
            ImpactCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ImpactCliError::Impact(e) if e.is_validation() => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'impact validate' for details".to_string()),
            },
            ImpactCliError::Impact(ImpactError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'impact doctor --config <file>'".to_string()),
            },
            ImpactCliError::Impact(ImpactError::InvalidReference(msg)) => CliError {
                code: "REFERENCE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'impact doctor --reference <file>'".to_string()),
            },
            ImpactCliError::Impact(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            ImpactCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ImpactCliError::NoSubmissions => CliError {
                code: "NO_SUBMISSIONS".to_string(),
                message: "No submissions found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ImpactCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} submissions failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            ImpactCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_submissions: usize,
    valid_submissions: usize,
    invalid_submissions: usize,
    clamped_submissions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
