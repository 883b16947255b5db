use mrzscan::{PassportScanner, ScanConfig, ScanError};
use std::io::Read;
use std::path::Path;

// Decode MRZ lines from already recognized text (a file argument or stdin)
fn main() -> Result<(), ScanError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(Path::new(&path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let scanner = PassportScanner::new(ScanConfig::load(None)?);
    let fields = scanner.decode_text(&text)?;

    println!("MRZ Check ({})", fields.format.name());
    println!("---------------");
    for check in fields.check_digits.iter() {
        println!(
            "  {:<16} embedded {}  computed {}  {}",
            check.field.as_str(),
            check.embedded,
            check.computed,
            if check.valid { "OK" } else { "MISMATCH" }
        );
    }
    println!(
        "\n  Document is {}",
        if fields.valid { "VALID" } else { "INVALID" }
    );

    // Show the decoded fields even when strict checksums are configured
    let record = scanner.normalize(&fields);
    for (label, value) in record.fields() {
        println!("  {:<16} {}", format!("{}:", label), value.unwrap_or("-"));
    }

    Ok(())
}
