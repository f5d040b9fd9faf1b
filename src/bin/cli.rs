//! AtlasTable CLI
//!
//! Inspect SSTables and read named columns from their rows.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use atlastable::db::schema::table_name_from_path;
use atlastable::db::{Column, ColumnFamily, Comparator, ComparatorType, SchemaRegistry};
use atlastable::{AtlasError, Config, NamesLookup, Result, SSTable, SSTableReader};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasTable CLI
#[derive(Parser, Debug)]
#[command(name = "atlastable-cli")]
#[command(about = "Read named columns from AtlasTable SSTables")]
#[command(version)]
struct Args {
    /// TOML configuration (schema, partitioner, row layout)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read named columns of one row
    Get {
        /// SSTable file
        #[arg(short, long)]
        file: PathBuf,

        /// Row key
        #[arg(short, long)]
        key: String,

        /// Column family name
        #[arg(long)]
        cf: String,

        /// Comparator, overriding the configured schema
        #[arg(long)]
        comparator: Option<ComparatorType>,

        /// Column names to read
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List row keys
    Keys {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check the row section checksum
    Verify {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write a small SSTable from `key=column:value` triples
    Load {
        #[arg(short, long)]
        file: PathBuf,

        /// Column family name
        #[arg(long)]
        cf: String,

        /// Comparator for the column names
        #[arg(long, default_value = "UTF8Type")]
        comparator: ComparatorType,

        /// Cells as key=column:value
        #[arg(required = true)]
        cells: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlastable=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Commands::Get {
            file,
            key,
            cf,
            comparator,
            names,
        } => {
            let comparator = resolve_comparator(&config, &file, &cf, comparator)?;
            let names = names
                .iter()
                .map(|name| encode_name(comparator.as_ref(), name))
                .collect::<Result<Vec<_>>>()?;

            let reader = SSTableReader::open(&file, &config)?;
            match reader.get_named_columns(&key, &cf, names, Arc::clone(&comparator))? {
                NamesLookup::RowNotFound => println!("row {:?} not found", key),
                NamesLookup::NoMatch => println!("row {:?} has none of the requested columns", key),
                found @ NamesLookup::Found(_) => {
                    for column in found.columns() {
                        print_column(comparator.as_ref(), column);
                    }
                }
            }
        }

        Commands::Keys { file } => {
            let reader = SSTableReader::open(&file, &config)?;
            for key in reader.keys() {
                println!("{}", key);
            }
        }

        Commands::Verify { file } => {
            let reader = SSTableReader::open(&file, &config)?;
            reader.verify_checksum()?;
            println!("{}: {} rows, checksum ok", file.display(), reader.row_count());
        }

        Commands::Load {
            file,
            cf,
            comparator,
            cells,
        } => {
            let comparator = comparator.build();
            let timestamp = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_micros() as i64)
                .unwrap_or_default();

            let mut rows: BTreeMap<String, ColumnFamily> = BTreeMap::new();
            for cell in &cells {
                let (key, name, value) = parse_cell(cell)?;
                let name = encode_name(comparator.as_ref(), name)?;
                rows.entry(key.to_string())
                    .or_insert_with(|| ColumnFamily::new(cf.clone(), Arc::clone(&comparator)))
                    .add_column(Column::new(name, value.as_bytes().to_vec(), timestamp));
            }

            let sstable = SSTable::write(&file, &config, rows)?;
            println!(
                "wrote {} rows ({} bytes) to {}",
                sstable.row_count(),
                sstable.file_size,
                file.display()
            );
        }
    }

    Ok(())
}

/// Explicit flag, then the configured schema, then raw bytes
fn resolve_comparator(
    config: &Config,
    file: &Path,
    cf: &str,
    explicit: Option<ComparatorType>,
) -> Result<Arc<dyn Comparator>> {
    if let Some(ty) = explicit {
        return Ok(ty.build());
    }
    let registry = SchemaRegistry::from_config(config);
    match table_name_from_path(file) {
        Some(table) if !registry.is_empty() => registry.comparator_for(&table, cf),
        _ => Ok(ComparatorType::default().build()),
    }
}

/// Command-line text → column name bytes for `comparator`
fn encode_name(comparator: &dyn Comparator, name: &str) -> Result<Vec<u8>> {
    let bytes = if comparator.name() == "LongType" {
        let value: i64 = name
            .parse()
            .map_err(|_| AtlasError::Serialization(format!("not a long: {:?}", name)))?;
        value.to_be_bytes().to_vec()
    } else {
        name.as_bytes().to_vec()
    };
    comparator.validate(&bytes)?;
    Ok(bytes)
}

fn parse_cell(cell: &str) -> Result<(&str, &str, &str)> {
    let invalid = || AtlasError::Config(format!("expected key=column:value, got {:?}", cell));
    let (key, rest) = cell.split_once('=').ok_or_else(invalid)?;
    let (name, value) = rest.split_once(':').ok_or_else(invalid)?;
    if key.is_empty() || name.is_empty() {
        return Err(invalid());
    }
    Ok((key, name, value))
}

fn print_column(comparator: &dyn Comparator, column: &Column) {
    if column.is_marked_for_delete() {
        println!(
            "{} (deleted, ts={})",
            comparator.get_string(column.name()),
            column.timestamp()
        );
    } else {
        println!(
            "{} = {} (ts={})",
            comparator.get_string(column.name()),
            String::from_utf8_lossy(column.value()),
            column.timestamp()
        );
    }
}
