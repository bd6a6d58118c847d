//! repack CLI - Command-line interface
//!
//! Commands:
//!   repack   - Propose a field mapping between two record types
//!   schema   - Print JSON schemas for config, report and document formats

mod cli;

use cli::{cmd_repack, cmd_schema};
use repack::logging::{self, Profile};
use repack::VERSION;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    let verbose = args[1..].iter().any(|a| a == "-v" || a == "--verbose");
    let profile = match std::env::var("REPACK_LOG_FORMAT").as_deref() {
        Ok("json") => Profile::Json,
        _ => Profile::Cli,
    };
    logging::init(profile, verbose);

    let result = match args[1].as_str() {
        "repack" => cmd_repack(&args[2..]),
        // bare flags: `repack -src ... -dst ...`
        flag if flag.starts_with('-') && flag != "--version" && flag != "--help" && flag != "-h" => {
            cmd_repack(&args[1..])
        }
        "schema" => cmd_schema(&args[2..]),
        "version" | "--version" => {
            println!("repack {}", VERSION);
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            Err("Unknown command".into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"
repack - propose field mappings between record types

USAGE:
    repack <COMMAND> [OPTIONS]
    repack -src <locator>#<Type> -dst <locator>#<Type> [OPTIONS]

COMMANDS:
    repack                           Match -dst fields against -src fields
    schema [config|report|document]  Print JSON schema
    version                          Print version

LOCATORS:
    <file.go|dir>#Type               Go struct (directory: all non-test .go files)
    <file.rs|dir>#Type               Rust struct with named fields
    <file.yaml|file.json>#Type       Schema document

OPTIONS:
    -src, --src <locator>            Source type (required)
    -dst, --dst <locator>            Destination type (required)
    -i, --ignore <a,b,...>           Field names to leave out of matching
    --flat                           Print `dst = src` lines instead of a literal
    --json                           Print the match report as JSON
    --lang <go|rust>                 Literal syntax (default: go)
    --strategy <optimal|greedy>      Assignment strategy (default: optimal)
    --output <file>                  Output file (default: stdout)
    -v, --verbose                    Debug logging on stderr (RUST_LOG overrides)

CONFIG:
    .repack.yaml in the current directory or any parent; flags take precedence.

EXAMPLES:
    repack -src store/user.go#UserRow -dst api/user.go#User
    repack -src store/user.go#UserRow -dst api/user.go#User -i CreatedAt --flat
    repack -src src/model.rs#Customer -dst schema.yaml#CustomerDto --lang rust
"#
    );
}
