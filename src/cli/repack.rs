//! `repack` command: match two record types and print the mapping

use super::util::{split_list, write_output};
use repack::*;
use std::path::PathBuf;

/// Output form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Nested,
    Flat,
    Json,
}

/// Parsed `repack` arguments
#[derive(Debug, Clone)]
pub struct RepackArgs {
    pub src: TypeLocator,
    pub dst: TypeLocator,
    pub mode: OutputMode,
    pub overrides: Overrides,
    pub output: Option<PathBuf>,
}

const USAGE: &str =
    "Usage: repack -src <locator>#<Type> -dst <locator>#<Type> [-i a,b] [--flat|--json]";

impl RepackArgs {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut src = None;
        let mut dst = None;
        let mut flat = false;
        let mut json = false;
        let mut overrides = Overrides::default();
        let mut output = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) if name.starts_with('-') => (name, Some(value.to_string())),
                _ => (arg.as_str(), None),
            };
            let mut value = || -> Result<String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => iter
                        .next()
                        .cloned()
                        .ok_or_else(|| Error::InvalidArguments(format!("{} needs a value", name))),
                }
            };
            match name {
                "-src" | "--src" => src = Some(TypeLocator::parse(&value()?)?),
                "-dst" | "--dst" => dst = Some(TypeLocator::parse(&value()?)?),
                "-i" | "--ignore" => overrides.ignore.extend(split_list(&value()?)),
                "--lang" | "-l" => overrides.target = Some(value()?.parse()?),
                "--strategy" => overrides.strategy = Some(value()?.parse()?),
                "--output" | "-o" => output = Some(PathBuf::from(value()?)),
                "--flat" => flat = true,
                "--json" => json = true,
                "-v" | "--verbose" => {}
                other => {
                    return Err(Error::InvalidArguments(format!(
                        "unexpected argument '{}'\n{}",
                        other, USAGE
                    )))
                }
            }
        }

        let mode = match (flat, json) {
            (true, true) => {
                return Err(Error::InvalidArguments(
                    "--flat and --json are mutually exclusive".into(),
                ))
            }
            (true, false) => OutputMode::Flat,
            (false, true) => OutputMode::Json,
            (false, false) => OutputMode::Nested,
        };

        match (src, dst) {
            (Some(src), Some(dst)) => Ok(Self {
                src,
                dst,
                mode,
                overrides,
                output,
            }),
            (None, _) => Err(Error::InvalidArguments(format!("missing -src\n{}", USAGE))),
            (_, None) => Err(Error::InvalidArguments(format!("missing -dst\n{}", USAGE))),
        }
    }
}

pub fn cmd_repack(args: &[String]) -> Result<()> {
    let args = RepackArgs::parse(args)?;
    let current_dir = std::env::current_dir().map_err(Error::Io)?;
    let config = RepackConfig::discover(&current_dir)?.merge(&args.overrides);
    let content = run(&args, &config)?;
    write_output(&args.output, &content)
}

/// Load both schemas, match them and format the result
pub fn run(args: &RepackArgs, config: &RepackConfig) -> Result<String> {
    let loader = SchemaLoader::new(config.walk.opaque_types.clone())
        .with_packages(config.walk.packages.iter().map(PathBuf::from).collect());
    let destination = loader.load(&args.dst)?;
    let source = loader.load(&args.src)?;

    let options = config.match_options();
    let report = match_schemas(&destination.root, &source.root, &options)?;

    match args.mode {
        OutputMode::Flat => Ok(report.to_report()),
        OutputMode::Json => {
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            Ok(json)
        }
        OutputMode::Nested => render_schemas(&destination, &source, &report, &options, &config.render),
    }
}
