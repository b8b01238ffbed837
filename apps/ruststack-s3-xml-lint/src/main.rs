//! RustStack S3 XML lint - validate S3 XML documents against a schema.
//!
//! Each file is decoded against the named root definition. Valid files print
//! `ok`; invalid files print the failing element path and error kind. The
//! process exits non-zero if any file fails.
//!
//! # Usage
//!
//! ```text
//! ruststack-s3-xml-lint --root ListMultipartUploadsResult uploads.xml
//! ruststack-s3-xml-lint --root Inventory --schema-file defs.json --reencode a.xml b.xml
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_XML_MAX_DEPTH` | `64` | Maximum element nesting depth |
//! | `S3_XML_UNKNOWN_ELEMENTS` | `reject` | `reject` or `skip` undeclared elements |
//! | `S3_XML_WRITE_DECLARATION` | `true` | Emit the XML declaration when re-encoding |
//! | `S3_XML_NAMESPACE` | S3 namespace | Root namespace when re-encoding (empty disables) |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ruststack_s3_schema::SchemaDocument;
use ruststack_s3_schema::SchemaRegistry;
use ruststack_s3_schema::builtin::register_s3_schemas;
use ruststack_s3_xml::{CodecConfig, XmlCodec};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ruststack-s3-xml-lint")]
#[command(about = "Validate S3 XML documents against RustStack schemas", long_about = None)]
struct Cli {
    /// Root definition each document must conform to.
    #[arg(long)]
    root: String,

    /// JSON schema document registered next to the built-in S3 schemas.
    #[arg(long, value_name = "PATH")]
    schema_file: Option<PathBuf>,

    /// Print the canonical re-encoding of every valid document.
    #[arg(long)]
    reencode: bool,

    /// Documents to check.
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`. Logs go to
/// stderr so they never mix with re-encoded output.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Build the codec over the built-in schemas plus an optional schema file.
fn build_codec(schema_file: Option<&Path>, config: CodecConfig) -> Result<XmlCodec> {
    let registry = SchemaRegistry::new();
    register_s3_schemas(&registry).context("failed to register built-in S3 schemas")?;
    if let Some(path) = schema_file {
        let added = SchemaDocument::from_path(path)
            .and_then(|doc| doc.register_into(&registry))
            .with_context(|| format!("failed to load schema file {}", path.display()))?;
        info!(path = %path.display(), definitions = added, "loaded schema file");
    }
    Ok(XmlCodec::new(Arc::new(registry), config))
}

/// Check one file. Returns the report line, and the canonical form of a
/// valid document when `reencode` is set. `Err` means the file failed.
fn lint_file(
    codec: &XmlCodec,
    root: &str,
    path: &Path,
    reencode: bool,
) -> Result<Option<String>, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read file: {e}"))?;
    let record = codec.decode(&bytes, root).map_err(|e| e.to_string())?;
    debug!(path = %path.display(), elements = record.element_count(), "document is valid");

    if !reencode {
        return Ok(None);
    }
    let encoded = codec.encode(&record, root).map_err(|e| e.to_string())?;
    String::from_utf8(encoded.to_vec())
        .map(Some)
        .map_err(|e| format!("re-encoded document is not UTF-8: {e}"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_owned());
    init_tracing(&log_level)?;

    let codec = build_codec(cli.schema_file.as_deref(), CodecConfig::from_env())?;
    codec
        .registry()
        .resolve_element(&cli.root)
        .with_context(|| format!("unknown root definition {}", cli.root))?;

    let mut failures = 0usize;
    for path in &cli.files {
        match lint_file(&codec, &cli.root, path, cli.reencode) {
            Ok(canonical) => {
                println!("{}: ok", path.display());
                if let Some(xml) = canonical {
                    println!("{xml}");
                }
            }
            Err(reason) => {
                failures += 1;
                println!("{}: {reason}", path.display());
            }
        }
    }

    info!(files = cli.files.len(), failures, "lint finished");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
