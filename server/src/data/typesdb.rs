//! Type catalog loaded from collectd `types.db` files
//!
//! Each non-comment line defines one type:
//!
//! ```text
//! if_octets   rx:DERIVE:0:U, tx:DERIVE:0:U
//! load        shortterm:GAUGE:0:5000, midterm:GAUGE:0:5000, longterm:GAUGE:0:5000
//! ```
//!
//! The catalog is built once at startup and never mutated afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::DataSource;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read types.db {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}:{line}: {message}")]
    Parse {
        origin: String,
        line: usize,
        message: String,
    },

    #[error("No types.db files configured")]
    Empty,
}

/// Read-only mapping of type name to its ordered data sources
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, Vec<DataSource>>,
}

impl TypeCatalog {
    /// Load and merge several `types.db` files; later files win on conflicts
    pub fn load(paths: &[PathBuf]) -> Result<Self, CatalogError> {
        if paths.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut catalog = Self::default();
        for path in paths {
            let parsed = Self::load_file(path)?;
            tracing::debug!(
                path = %path.display(),
                types = parsed.len(),
                "Loaded types.db"
            );
            catalog.types.extend(parsed.types);
        }
        Ok(catalog)
    }

    fn load_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse `types.db` content; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &str) -> Result<Self, CatalogError> {
        let mut types = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_err = |message: String| CatalogError::Parse {
                origin: origin.to_string(),
                line: idx + 1,
                message,
            };

            let (type_name, rest) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| parse_err(format!("type '{}' has no data sources", line)))?;

            let sources = rest
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|spec| !spec.is_empty())
                .map(parse_data_source)
                .collect::<Result<Vec<_>, _>>()
                .map_err(parse_err)?;

            if sources.is_empty() {
                return Err(parse_err(format!("type '{}' has no data sources", type_name)));
            }

            types.insert(type_name.to_string(), sources);
        }

        Ok(Self { types })
    }

    /// Ordered data sources for a type, if known
    pub fn lookup(&self, type_name: &str) -> Option<&[DataSource]> {
        self.types.get(type_name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Parse one `name:KIND:min:max` specification
fn parse_data_source(spec: &str) -> Result<DataSource, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [name, kind, min, max] = parts.as_slice() else {
        return Err(format!(
            "invalid data source '{}', expected name:KIND:min:max",
            spec
        ));
    };

    if name.is_empty() {
        return Err(format!("data source '{}' has an empty name", spec));
    }

    Ok(DataSource {
        name: name.to_string(),
        kind: kind.parse()?,
        min: parse_bound(min)?,
        max: parse_bound(max)?,
    })
}

fn parse_bound(s: &str) -> Result<Option<f64>, String> {
    if s.eq_ignore_ascii_case("u") {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid data source bound '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::DataKind;
    use std::io::Write;

    const SAMPLE: &str = "\
# collectd types
cpu             value:DERIVE:0:U
if_octets       rx:DERIVE:0:U, tx:DERIVE:0:U
load            shortterm:GAUGE:0:5000,midterm:GAUGE:0:5000, longterm:GAUGE:0:5000

absolute        value:ABSOLUTE:0:U
";

    #[test]
    fn test_parse_types() {
        let catalog = TypeCatalog::parse(SAMPLE, "test").unwrap();
        assert_eq!(catalog.len(), 4);

        let cpu = catalog.lookup("cpu").unwrap();
        assert_eq!(
            cpu,
            &[DataSource {
                min: Some(0.0),
                ..DataSource::new("value", DataKind::Derive)
            }]
        );

        let load = catalog.lookup("load").unwrap();
        let names: Vec<&str> = load.iter().map(|ds| ds.name.as_str()).collect();
        assert_eq!(names, vec!["shortterm", "midterm", "longterm"]);
        assert_eq!(load[0].max, Some(5000.0));
    }

    #[test]
    fn test_lookup_preserves_order() {
        let catalog = TypeCatalog::parse(SAMPLE, "test").unwrap();
        let octets = catalog.lookup("if_octets").unwrap();
        assert_eq!(octets[0].name, "rx");
        assert_eq!(octets[1].name, "tx");
        assert!(catalog.lookup("unknown").is_none());
    }

    #[test]
    fn test_parse_rejects_bad_kind() {
        let err = TypeCatalog::parse("bogus value:HISTOGRAM:0:U\n", "bad.db").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("bad.db:1:"), "unexpected message: {}", msg);
    }

    #[test]
    fn test_parse_rejects_short_spec() {
        let err = TypeCatalog::parse("bogus value:GAUGE\n", "bad.db").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_type_without_sources() {
        let err = TypeCatalog::parse("lonely\n", "bad.db").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn test_load_merges_files_later_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("types.db");
        let second = dir.path().join("custom.db");

        let mut f = fs::File::create(&first).unwrap();
        writeln!(f, "cpu value:DERIVE:0:U").unwrap();
        writeln!(f, "load shortterm:GAUGE:0:5000").unwrap();
        let mut f = fs::File::create(&second).unwrap();
        writeln!(f, "cpu value:GAUGE:0:100").unwrap();

        let catalog = TypeCatalog::load(&[first, second]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup("cpu").unwrap()[0].kind, DataKind::Gauge);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let err = TypeCatalog::load(&[PathBuf::from("/nonexistent/types.db")]).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn test_load_requires_paths() {
        assert!(matches!(
            TypeCatalog::load(&[]).unwrap_err(),
            CatalogError::Empty
        ));
    }
}
