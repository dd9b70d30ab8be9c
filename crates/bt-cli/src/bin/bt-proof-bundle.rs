//! Parse or create a boot transparency proof bundle.

use bt_artifact::Registry;
use bt_sigsum::SigsumEngine;
use bt_statement::Statement;
use bt_tessera::TesseraEngine;
use bt_transparency::{EngineRegistry, ProofBundle, SIGSUM};
use serde_json::value::RawValue;
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
        "create" => create(&args[2..]),
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
    eprintln!("  {} parse --bundle FILE", program);
    eprintln!(
        "  {} create --engine ID --signed-statement FILE --probe FILE --inclusion-proof FILE",
        program
    );
    eprintln!();
    eprintln!("Engine IDs: 1 Sigsum, 2 Tessera");
}

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

fn engines() -> EngineRegistry {
    let mut engines = EngineRegistry::new();
    engines
        .register(Box::new(SigsumEngine::new(false)))
        .expect("engine formats are distinct");
    engines
        .register(Box::new(TesseraEngine::new()))
        .expect("engine formats are distinct");
    engines
}

fn parse(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = flag_value(args, "--bundle")?;
    let bytes = fs::read(&path).map_err(|e| format!("read proof bundle {:?} failed: {}", path, e))?;

    // the envelope selects the engine; the engine validates the rest
    let envelope = ProofBundle::parse(&bytes)?;
    let engines = engines();
    let engine = engines.engine(envelope.format)?;

    let (_, normalized) = engine.parse_proof(&bytes)?;
    println!("{}", String::from_utf8_lossy(&normalized));
    Ok(())
}

fn create(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let engine_id = flag_value(args, "--engine")?;
    let statement_path = flag_value(args, "--signed-statement")?;
    let probe_path = flag_value(args, "--probe")?;
    let proof_path = flag_value(args, "--inclusion-proof")?;

    let format: u16 = engine_id
        .parse()
        .map_err(|_| format!("invalid transparency engine: {}", engine_id))?;

    let statement_bytes = fs::read(&statement_path)
        .map_err(|e| format!("read statement {:?} failed: {}", statement_path, e))?;
    let registry = Registry::with_builtin();
    Statement::parse(&statement_bytes, &registry)
        .map_err(|e| format!("parse statement {:?} failed: {}", statement_path, e))?;

    let probe_bytes =
        fs::read(&probe_path).map_err(|e| format!("read probe {:?} failed: {}", probe_path, e))?;
    let proof_bytes = fs::read(&proof_path)
        .map_err(|e| format!("read inclusion proof {:?} failed: {}", proof_path, e))?;

    // Sigsum proofs are ASCII documents and travel as a JSON string;
    // Tessera proofs are already JSON
    let proof = if format == SIGSUM {
        serde_json::to_string(&String::from_utf8_lossy(&proof_bytes))?
    } else {
        String::from_utf8(proof_bytes).map_err(|_| "inclusion proof is not valid UTF-8")?
    };

    let bundle = ProofBundle {
        format,
        statement: RawValue::from_string(String::from_utf8(statement_bytes).map_err(|_| "statement is not valid UTF-8")?)?,
        probe: Some(RawValue::from_string(String::from_utf8(probe_bytes).map_err(|_| "probe is not valid UTF-8")?)?),
        proof: Some(RawValue::from_string(proof)?),
    };
    let assembled = serde_json::to_vec(&bundle)?;

    // re-parse the preliminary bundle to ensure it is consistent with the
    // engine format
    let engines = engines();
    let engine = engines.engine(format)?;
    let (_, normalized) = engine.parse_proof(&assembled)?;

    println!("{}", String::from_utf8_lossy(&normalized));
    Ok(())
}
