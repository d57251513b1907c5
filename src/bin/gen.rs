//! tzmap-gen: CLI tool for building time zone map archives from GeoJSON.

use clap::Parser;
use std::path::PathBuf;
use tzmap::archive::write_archive_file;
use tzmap::builder::build_from_source;
use tzmap::config::DEFAULT_ID_PROPERTY;
use tzmap::{BuildConfig, Compression};

#[derive(Parser)]
#[command(name = "tzmap-gen")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Build time zone map archives from GeoJSON boundaries", long_about = None)]
struct Cli {
    /// GeoJSON file (.geojson, .zip or .gz) or timezone-boundary-builder release tag
    source: String,

    /// Version label written into the archive, e.g. 1.0:2024a
    #[arg(value_name = "VERSION")]
    map_version: String,

    /// Output pairs: <uncompressed|gzip|zstd> <path>
    #[arg(num_args = 2.., required = true, value_names = ["COMPRESSION", "OUTPUT"])]
    outputs: Vec<String>,

    /// GeoJSON property holding the zone identifier
    #[arg(long, default_value = DEFAULT_ID_PROPERTY)]
    id_property: String,

    /// Repair geometry on a single thread
    #[arg(long)]
    sequential: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Validate outputs before the expensive part.
    let outputs = parse_outputs(&cli.outputs)?;

    let mut config = BuildConfig::new(&cli.map_version).with_id_property(&cli.id_property);
    if cli.sequential {
        config = config.sequential();
    }

    let entries = build_from_source(&cli.source, config)?;

    for (compression, path) in &outputs {
        write_archive_file(path, *compression, &entries)?;
        println!("Wrote {:?} ({})", path, compression);
    }
    Ok(())
}

fn parse_outputs(args: &[String]) -> Result<Vec<(Compression, PathBuf)>, Box<dyn std::error::Error>> {
    if args.len() % 2 != 0 {
        return Err(format!(
            "outputs must be <compression> <path> pairs, got {} arguments",
            args.len()
        )
        .into());
    }
    args.chunks(2)
        .map(|pair| Ok((pair[0].parse::<Compression>()?, PathBuf::from(&pair[1]))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_outputs() {
        let outputs = parse_outputs(&args(&["zstd", "a.tar.zst", "uncompressed", "b.tar"])).unwrap();
        assert_eq!(
            outputs,
            vec![
                (Compression::Zstd, PathBuf::from("a.tar.zst")),
                (Compression::None, PathBuf::from("b.tar")),
            ]
        );
    }

    #[test]
    fn test_parse_outputs_rejects_odd_count() {
        assert!(parse_outputs(&args(&["zstd", "a.tar.zst", "gzip"])).is_err());
    }

    #[test]
    fn test_parse_outputs_rejects_unknown_compression() {
        assert!(parse_outputs(&args(&["lzma", "a.tar.xz"])).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let err = Cli::try_parse_from(["tzmap-gen", "--version"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_parses_positionals() {
        let cli = Cli::try_parse_from([
            "tzmap-gen",
            "--sequential",
            "2024a",
            "1.0:2024a",
            "gzip",
            "out.tar.gz",
        ])
        .unwrap();
        assert_eq!(cli.source, "2024a");
        assert_eq!(cli.map_version, "1.0:2024a");
        assert_eq!(cli.outputs, args(&["gzip", "out.tar.gz"]));
        assert!(cli.sequential);
        assert_eq!(cli.id_property, "tzid");
    }
}
