//! Reading and writing result payload files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::Payload;
use crate::validate::{parse_payload, ValidationOptions};

/// Read a file as untyped JSON, without schema checks.
pub fn read_json(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read, validate, and decode a payload file.
pub fn read_payload(path: &Path, options: ValidationOptions) -> Result<Payload> {
    let value = read_json(path)?;
    parse_payload(value, options).map_err(|source| Error::Schema {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a payload as pretty-printed JSON, creating parent directories.
pub fn write_payload(path: &Path, payload: &Payload) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            tracing::info!("Created output directory {}", parent.display());
        }
    }

    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, payload)?;
    writer.write_all(b"\n").map_err(|e| Error::io(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}
