//! Bundle codec: a dataset plus its variable settings in one file.
//!
//! The on-disk form is a zip archive holding a single `data.json` entry:
//!
//! ```json
//! { "type": "crossfilterBundle", "version": "1.0.0",
//!   "dataset": { "columns": [...] },
//!   "settingsObj": { "varDf": { "columns": [...] } } }
//! ```
//!
//! A JSON-wrapped form `{ "zip": "<base64 of the archive>" }` carries the same
//! archive inside a plain text file.

use super::dataset::Dataset;
use super::packed::{PackedFrame, pack_dataset, unpack_dataset};
use crate::constants::{VERSION, bundle};
use crate::error::{CrossError, Result};
use crate::settings::VariableSettingsTable;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Settings carried alongside the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsObject {
    pub var_settings: VariableSettingsTable,
}

/// A dataset and its settings, loaded or saved as one unit
#[derive(Debug, Clone)]
pub struct DataBundle {
    pub dataset: Dataset,
    pub settings: SettingsObject,
}

impl DataBundle {
    /// Bundle a freshly imported dataset with initialized settings
    pub fn from_dataset(dataset: Dataset) -> Result<Self> {
        let var_settings = VariableSettingsTable::initialize(&dataset)?;
        Ok(Self {
            dataset,
            settings: SettingsObject { var_settings },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedSettings {
    #[serde(rename = "varDf")]
    pub var_df: PackedFrame,
}

/// Serialized shape of `data.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDocument {
    #[serde(rename = "type")]
    pub bundle_type: String,
    #[serde(default)]
    pub version: Option<String>,
    pub dataset: PackedFrame,
    #[serde(rename = "settingsObj")]
    pub settings_obj: PackedSettings,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonWrappedBundle {
    zip: String,
}

/// Pack a bundle into its document form
pub fn pack_bundle(data_bundle: &DataBundle) -> Result<BundleDocument> {
    Ok(BundleDocument {
        bundle_type: bundle::BUNDLE_TYPE.to_string(),
        version: Some(VERSION.to_string()),
        dataset: pack_dataset(&data_bundle.dataset)?,
        settings_obj: PackedSettings {
            var_df: data_bundle.settings.var_settings.to_packed(),
        },
    })
}

/// Rebuild a bundle from `data.json` text, checking the type marker first
pub fn unpack_bundle(json: &str) -> Result<DataBundle> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value.get("type").and_then(|t| t.as_str()) {
        Some(bundle::BUNDLE_TYPE) => {}
        Some(other) => return Err(CrossError::MalformedBundle(other.to_string())),
        None => return Err(CrossError::MalformedBundle("<missing>".to_string())),
    }

    let document: BundleDocument = serde_json::from_value(value)?;
    let dataset = unpack_dataset(&document.dataset)?;
    let var_settings = VariableSettingsTable::from_packed(&document.settings_obj.var_df)?;
    var_settings.validate_against(&dataset)?;

    Ok(DataBundle {
        dataset,
        settings: SettingsObject { var_settings },
    })
}

/// Encode a bundle as a zip archive
pub fn write_bundle_zip(data_bundle: &DataBundle) -> Result<Vec<u8>> {
    profiling::scope!("write_bundle_zip");

    let json = serde_json::to_string(&pack_bundle(data_bundle)?)?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(bundle::COMPRESSION_LEVEL));
    writer.start_file(bundle::DATA_ENTRY, options)?;
    writer.write_all(json.as_bytes())?;
    let bytes = writer.finish()?.into_inner();

    tracing::info!(
        "Encoded bundle: {} rows, {} bytes compressed",
        data_bundle.dataset.height(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decode a zip archive into a bundle
pub fn read_bundle_zip(bytes: &[u8]) -> Result<DataBundle> {
    profiling::scope!("read_bundle_zip");

    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = match archive.by_name(bundle::DATA_ENTRY) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(CrossError::MissingBundleEntry {
                entry: bundle::DATA_ENTRY.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let mut json = String::new();
    entry.read_to_string(&mut json)?;

    unpack_bundle(&json)
}

/// Encode a bundle as `{ "zip": <base64 archive> }`
pub fn write_bundle_json(data_bundle: &DataBundle) -> Result<String> {
    let wrapped = JsonWrappedBundle {
        zip: STANDARD.encode(write_bundle_zip(data_bundle)?),
    };
    Ok(serde_json::to_string(&wrapped)?)
}

/// Decode the JSON-wrapped form
pub fn read_bundle_json(text: &str) -> Result<DataBundle> {
    let wrapped: JsonWrappedBundle = serde_json::from_str(text)?;
    let bytes = STANDARD.decode(wrapped.zip.trim())?;
    read_bundle_zip(&bytes)
}

fn bundle_extension(name: &str) -> Result<String> {
    let extension = Path::new(name)
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "zip" | "json" => Ok(extension),
        _ => Err(CrossError::UnsupportedFormat { extension }),
    }
}

/// Decode bundle contents, choosing the reader by the file name's extension
pub fn read_bundle_bytes(name: &str, bytes: &[u8]) -> Result<DataBundle> {
    if bundle_extension(name)? == "zip" {
        read_bundle_zip(bytes)
    } else {
        read_bundle_json(&String::from_utf8_lossy(bytes))
    }
}

/// Load a bundle from disk
pub fn load_bundle_file(path: &Path) -> Result<DataBundle> {
    let name = path.to_string_lossy();
    bundle_extension(&name)?;
    tracing::info!("Loading bundle {}", path.display());
    read_bundle_bytes(&name, &std::fs::read(path)?)
}

/// Save a bundle to disk; a `.json` path gets the wrapped form, anything else the archive
pub fn save_bundle_file(data_bundle: &DataBundle, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        std::fs::write(path, write_bundle_json(data_bundle)?)?;
    } else {
        std::fs::write(path, write_bundle_zip(data_bundle)?)?;
    }
    tracing::info!("Saved bundle to {}", path.display());
    Ok(())
}
