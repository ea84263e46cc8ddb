use std::path::PathBuf;

use fbpick::artifact::{FingerprintAlgorithm, fingerprint_file};

fn main() {
    let mut algorithm = FingerprintAlgorithm::Sha256;
    let mut paths = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--algorithm" => match args.next().as_deref() {
                Some("sha256") => algorithm = FingerprintAlgorithm::Sha256,
                Some("blake3") => algorithm = FingerprintAlgorithm::Blake3,
                other => {
                    eprintln!("Unknown algorithm: {}", other.unwrap_or("<missing>"));
                    std::process::exit(2);
                }
            },
            "--help" | "-h" => {
                print_help();
                return;
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        print_help();
        std::process::exit(2);
    }

    let mut failed = false;
    for path in paths {
        match fingerprint_file(&path, algorithm) {
            Ok(fingerprint) => println!("{fingerprint}  {}", path.display()),
            Err(err) => {
                eprintln!("{err}");
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}

fn print_help() {
    println!("Usage: fbpick-fingerprint [--algorithm sha256|blake3] <file>...");
    println!("Prints the value to pin as [model].weights_fingerprint in config.toml.");
}
