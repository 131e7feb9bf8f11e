//! Decoded collectd samples and catalog data sources

use super::enums::DataKind;

/// One data source of a collectd type (one column of a `types.db` line)
#[derive(Debug, Clone, PartialEq)]
pub struct DataSource {
    pub name: String,
    pub kind: DataKind,
    /// Lower bound, `None` when unbounded (`U`)
    pub min: Option<f64>,
    /// Upper bound, `None` when unbounded (`U`)
    pub max: Option<f64>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, kind: DataKind) -> Self {
        Self {
            name: name.into(),
            kind,
            min: None,
            max: None,
        }
    }
}

/// A single decoded value from a collectd value list
///
/// A value list carrying N values yields N samples, one per `value_index`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedSample {
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    pub type_name: String,
    pub type_instance: String,
    pub value_index: usize,
    pub kind: DataKind,
    pub value: f64,
    pub timestamp_ms: i64,
}

impl DecodedSample {
    /// Host with dots replaced, as used in series identities
    pub fn normalized_host(&self) -> String {
        self.host.replace('.', "_")
    }

    /// Plugin name with its instance appended (`cpu-0`)
    pub fn plugin_label(&self) -> String {
        if self.plugin_instance.is_empty() {
            self.plugin.clone()
        } else {
            format!("{}-{}", self.plugin, self.plugin_instance)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_host_replaces_dots() {
        let sample = DecodedSample {
            host: "web01.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(sample.normalized_host(), "web01_example_com");
    }

    #[test]
    fn test_plugin_label() {
        let mut sample = DecodedSample {
            plugin: "cpu".to_string(),
            ..Default::default()
        };
        assert_eq!(sample.plugin_label(), "cpu");

        sample.plugin_instance = "3".to_string();
        assert_eq!(sample.plugin_label(), "cpu-3");
    }
}
