//! Parse, sign, or verify a statement associated to an artifact bundle.

use bt_artifact::Registry;
use bt_crypto::{parse_private_key, SigningKey};
use bt_statement::Statement;
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "parse" => parse(&args[2..]),
        "sign" => sign(&args[2..]),
        "verify" => verify(&args[2..]),
        "-h" | "--help" => {
            print_usage(&args[0]);
            process::exit(0);
        }
        command => {
            eprintln!("Unknown command: {}", command);
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} parse --statement FILE", program);
    eprintln!(
        "  {} sign --statement FILE --private-key FILE --signed-statement OUT",
        program
    );
    eprintln!("  {} verify --signed-statement FILE --public-key FILE", program);
}

/// Extract the value following a `--flag` argument
fn flag_value(args: &[String], flag: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter
                .next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {}", flag).into());
        }
    }
    Err(format!("Missing required option {}", flag).into())
}

fn read_statement(path: &str, registry: &Registry) -> Result<Statement, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("read statement {:?} failed: {}", path, e))?;
    Ok(Statement::parse(&bytes, registry)?)
}

fn parse(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = flag_value(args, "--statement")?;

    let registry = Registry::with_builtin();
    let statement = read_statement(&path, &registry)?;

    println!("{}", serde_json::to_string_pretty(&statement)?);
    Ok(())
}

fn sign(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let statement_path = flag_value(args, "--statement")?;
    let key_path = flag_value(args, "--private-key")?;
    let output_path = flag_value(args, "--signed-statement")?;

    let registry = Registry::with_builtin();
    let mut statement = read_statement(&statement_path, &registry)?;

    let pem = fs::read_to_string(&key_path)
        .map_err(|e| format!("read private key {:?} failed: {}", key_path, e))?;
    let (seed, public) = parse_private_key(&pem)?;
    let key = SigningKey::from_seed(&seed, &public)?;

    // append the new signature, do not overwrite any existing one
    bt_statement::sign(&mut statement, &key)?;

    fs::write(&output_path, serde_json::to_string_pretty(&statement)?)
        .map_err(|e| format!("write signed statement {:?} failed: {}", output_path, e))?;

    eprintln!("signed statement written to: {:?}", output_path);
    Ok(())
}

fn verify(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let statement_path = flag_value(args, "--signed-statement")?;
    let key_path = flag_value(args, "--public-key")?;

    let registry = Registry::with_builtin();
    let statement = read_statement(&statement_path, &registry)?;

    let public_key = fs::read_to_string(&key_path)
        .map_err(|e| format!("read public key {:?} failed: {}", key_path, e))?;

    bt_statement::verify_signature(&statement, public_key.trim())?;

    eprintln!("signature is valid");
    Ok(())
}
