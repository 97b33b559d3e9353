//! Reading domain definitions and engine config from disk
//!
//! JSON and YAML are both accepted, chosen by file extension. A file holds
//! either one definition or a list of them.

use crate::config::EngineConfig;
use crate::types::DomainDefinition;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<DomainDefinition>),
    One(Box<DomainDefinition>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(Format::Json),
        Some("yaml") | Some("yml") => Some(Format::Yaml),
        _ => None,
    }
}

fn parse<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = match format_of(path) {
        Some(format) => format,
        None => bail!("Unsupported file type {:?} (expected .json, .yaml or .yml)", path),
    };
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let parsed = match format {
        Format::Json => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {:?}", path))?,
        Format::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {:?}", path))?,
    };
    Ok(parsed)
}

/// Read the definitions in one file
pub fn load_definition_file(path: &Path) -> Result<Vec<DomainDefinition>> {
    let definitions = match parse::<DefinitionFile>(path)? {
        DefinitionFile::Many(list) => list,
        DefinitionFile::One(single) => vec![*single],
    };
    tracing::debug!(path = ?path, count = definitions.len(), "Read domain definitions");
    Ok(definitions)
}

/// Read every .json/.yaml/.yml file under `dir`, in path order
pub fn load_definition_dir(dir: &Path) -> Result<Vec<DomainDefinition>> {
    let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && format_of(e.path()).is_some())
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    let mut definitions = Vec::new();
    for path in &paths {
        definitions.extend(load_definition_file(path)?);
    }
    ensure_unique_ids(&definitions)?;
    Ok(definitions)
}

/// Read a file or a directory of definitions
pub fn load_definitions(path: &Path) -> Result<Vec<DomainDefinition>> {
    if path.is_dir() {
        load_definition_dir(path)
    } else {
        let definitions = load_definition_file(path)?;
        ensure_unique_ids(&definitions)?;
        Ok(definitions)
    }
}

fn ensure_unique_ids(definitions: &[DomainDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for def in definitions {
        if !seen.insert(def.id.as_str()) {
            bail!("Domain id `{}` is defined more than once", def.id);
        }
    }
    Ok(())
}

/// Read an [`EngineConfig`]; missing fields keep their defaults
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let config: EngineConfig = parse(path)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", path))?;
    Ok(config)
}
