//! Schema CLI command

use repack::*;

pub fn cmd_schema(args: &[String]) -> Result<()> {
    let schema_name = args.first().map(|s| s.as_str()).unwrap_or("list");

    match schema_name {
        "list" => {
            println!("Available schemas: config, report, document");
            Ok(())
        }
        "config" => print_schema::<RepackConfig>(),
        "report" => print_schema::<MatchReport>(),
        "document" => print_schema::<SchemaDocument>(),
        _ => Err(format!(
            "Unknown schema: {}. Use 'config', 'report' or 'document'.",
            schema_name
        )
        .into()),
    }
}

fn print_schema<T: schemars::JsonSchema>() -> Result<()> {
    let schema = schemars::schema_for!(T);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
