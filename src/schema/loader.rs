//! Schema loader for declarative schema files
//!
//! - One schema per `*.json` file in the schema directory
//! - Name is the document's `"name"`, else the file stem
//! - Every document is compiled and structure-checked on load
//! - Registered names are immutable: loading a name twice fails

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::definition::SchemaDef;
use super::errors::{SchemaError, SchemaResult};
use super::types::SchemaNode;
use crate::observability::Event;
use crate::rules::RuleRegistry;

/// Loads schema files and keeps the compiled trees by name.
pub struct SchemaLoader {
    /// Directory containing schema files
    schema_dir: PathBuf,
    /// Compiled schemas by name
    schemas: BTreeMap<String, Arc<SchemaNode>>,
}

impl SchemaLoader {
    /// Creates a loader reading `schema_dir`.
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            schemas: BTreeMap::new(),
        }
    }

    /// Returns the schema directory path.
    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every schema file in the directory, in file name order.
    ///
    /// A missing directory holds no schemas. Returns how many were loaded.
    pub fn load_all(&mut self, registry: &dyn RuleRegistry) -> SchemaResult<usize> {
        if !self.schema_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed(
                self.schema_dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(
                    self.schema_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut staged = BTreeMap::new();
        for path in &paths {
            let (name, node) = load_schema_file(path, registry)?;
            if self.schemas.contains_key(&name) || staged.contains_key(&name) {
                return Err(SchemaError::AlreadyRegistered(name));
            }
            staged.insert(name, Arc::new(node));
        }
        self.schemas.append(&mut staged);

        info!(
            event = %Event::SchemasLoaded,
            dir = %self.schema_dir.display(),
            count = paths.len(),
            "schema files loaded"
        );
        Ok(paths.len())
    }

    /// Registers a compiled schema under `name`.
    pub fn register(&mut self, name: impl Into<String>, node: SchemaNode) -> SchemaResult<()> {
        let name = name.into();
        node.validate_structure()?;

        if self.schemas.contains_key(&name) {
            return Err(SchemaError::AlreadyRegistered(name));
        }

        self.schemas.insert(name, Arc::new(node));
        Ok(())
    }

    /// Gets a schema by name.
    pub fn get(&self, name: &str) -> Option<Arc<SchemaNode>> {
        self.schemas.get(name).cloned()
    }

    /// Checks if a schema exists.
    pub fn exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Returns the number of loaded schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Writes a schema document to `<schema_dir>/<name>.json`.
    ///
    /// Existing files are never overwritten.
    pub fn save_definition(&self, def: &SchemaDef) -> SchemaResult<PathBuf> {
        let name = def
            .name
            .as_deref()
            .ok_or_else(|| SchemaError::malformed("<in-memory>", "schema has no name"))?;
        check_file_name(name)?;
        let path = self.schema_dir.join(format!("{}.json", name));

        if path.exists() {
            return Err(SchemaError::AlreadyRegistered(name.to_string()));
        }

        if !self.schema_dir.exists() {
            fs::create_dir_all(&self.schema_dir).map_err(|e| {
                SchemaError::malformed(
                    self.schema_dir.display().to_string(),
                    format!("Failed to create schema directory: {}", e),
                )
            })?;
        }

        let content = serde_json::to_string_pretty(def).map_err(|e| {
            SchemaError::malformed(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }
}

/// Reads and compiles one schema file, returning its registry name.
fn load_schema_file(
    path: &Path,
    registry: &dyn RuleRegistry,
) -> SchemaResult<(String, SchemaNode)> {
    let content = fs::read_to_string(path).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("Failed to read file: {}", e))
    })?;

    let def: SchemaDef = serde_json::from_str(&content).map_err(|e| {
        SchemaError::malformed(path.display().to_string(), format!("Invalid JSON: {}", e))
    })?;

    let name = match (&def.name, path.file_stem()) {
        (Some(name), _) => name.clone(),
        (None, Some(stem)) => stem.to_string_lossy().into_owned(),
        (None, None) => {
            return Err(SchemaError::malformed(
                path.display().to_string(),
                "schema has no name",
            ))
        }
    };

    Ok((name, def.compile(registry)?))
}

/// Schema names become file names and must stay inside the schema directory.
fn check_file_name(name: &str) -> SchemaResult<()> {
    let escapes = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if escapes {
        return Err(SchemaError::InvalidName(name.to_string()));
    }
    Ok(())
}
