// Passport MRZ scanner command line

use clap::{ArgAction, Parser};
use mrzscan::{
    config::OcrProviderKind,
    models::NormalizedRecord,
    processing::GivenNamePolicy,
    PassportScanner, Result, ScanConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "mrzscan", version, about = "Scan a passport image and decode its MRZ")]
struct Cli {
    /// Passport image to scan
    #[arg(required_unless_present = "raw_text")]
    image: Option<PathBuf>,

    /// OCR engine to use
    #[arg(long, value_enum)]
    provider: Option<OcrProviderKind>,

    /// OCR language code
    #[arg(long)]
    language: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "MRZSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Skip OCR and read already recognized text from this file
    #[arg(long)]
    raw_text: Option<PathBuf>,

    #[arg(long)]
    no_preprocess: bool,

    /// Otsu binarization after contrast normalization
    #[arg(long)]
    binarize: bool,

    /// Fail when any check digit does not match
    #[arg(long)]
    strict: bool,

    /// Show every given name instead of only the first
    #[arg(long)]
    full_given_names: bool,

    /// Two-digit years below this are 20YY
    #[arg(long)]
    century_pivot: Option<u8>,

    /// Print the record as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply_to(&self, config: &mut ScanConfig) {
        if let Some(provider) = self.provider {
            config.ocr.provider = provider;
        }
        if let Some(language) = &self.language {
            config.ocr.language = language.clone();
        }
        if let Some(pivot) = self.century_pivot {
            config.century_pivot = pivot;
        }
        if self.no_preprocess {
            config.preprocess = false;
        }
        if self.binarize {
            config.binarize = true;
        }
        if self.strict {
            config.require_valid_checksums = true;
        }
        if self.full_given_names {
            config.given_names = GivenNamePolicy::Full;
        }
    }
}

// Function to print a detailed scan report
fn print_detailed_report(record: &NormalizedRecord) {
    println!("\n===============================================");
    println!("            PASSPORT MRZ SCAN REPORT");
    println!("===============================================\n");

    println!("DOCUMENT ({}):", record.format.name());
    for (label, value) in record.fields() {
        println!("  {:<16} {}", format!("{}:", label), value.unwrap_or("-"));
    }

    println!(
        "\nCHECK DIGITS: {}",
        if record.valid { "PASSED" } else { "FAILED" }
    );
    for field in &record.failed_checks {
        println!("  - {} does not match", field);
    }

    if !record.issues.is_empty() {
        println!("\nISSUES FOUND:");
        for issue in &record.issues {
            println!("  - [{}] {}", issue.issue_type.label(), issue.message);
        }
    }

    println!("\nFULL MRZ LINE:\n  {}", record.full_mrz_line);
}

fn run(cli: &Cli) -> Result<NormalizedRecord> {
    let mut config = ScanConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    let scanner = PassportScanner::new(config);

    if let Some(path) = &cli.raw_text {
        let text = std::fs::read_to_string(path)?;
        return scanner.scan(&text);
    }

    let provider = scanner.config().build_provider()?;
    match &cli.image {
        Some(image_path) => {
            log::info!("Scanning passport image at {}", image_path.display());
            scanner.scan_file(image_path, provider.as_ref())
        }
        None => Err(mrzscan::ScanError::Config(
            "an image path or --raw-text is required".to_string(),
        )),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(record) => {
            if cli.json {
                match serde_json::to_string_pretty(&record) {
                    Ok(json) => println!("{}", json),
                    Err(err) => {
                        eprintln!("Failed to serialize record: {}", err);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_detailed_report(&record);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}: {}", err.user_message(), err);
            ExitCode::FAILURE
        }
    }
}
