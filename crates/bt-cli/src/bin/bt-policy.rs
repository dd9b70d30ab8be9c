//! Parse or check a boot transparency policy.

use bt_artifact::Registry;
use bt_policy::Policy;
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
        "check" => check(&args[2..]),
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
    eprintln!("  {} parse --policy-file FILE", program);
    eprintln!("  {} check --policy-file FILE --signed-statement FILE", program);
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

fn read_policy(path: &str, registry: &Registry) -> Result<Policy, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("read policy {:?} failed: {}", path, e))?;
    Ok(Policy::parse(&bytes, registry)?)
}

fn parse(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = flag_value(args, "--policy-file")?;

    let registry = Registry::with_builtin();
    let policy = read_policy(&path, &registry)?;

    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}

fn check(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let policy_path = flag_value(args, "--policy-file")?;
    let statement_path = flag_value(args, "--signed-statement")?;

    let registry = Registry::with_builtin();
    let policy = read_policy(&policy_path, &registry)?;

    let bytes = fs::read(&statement_path)
        .map_err(|e| format!("read statement {:?} failed: {}", statement_path, e))?;
    let statement = Statement::parse(&bytes, &registry)?;

    bt_policy::check(&policy, &statement, &registry)?;

    eprintln!("signed statement is matching the policy");
    Ok(())
}
