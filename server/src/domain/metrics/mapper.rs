//! Sample to point mapping

use std::collections::BTreeMap;

use super::series::series_label;
use crate::core::config::{FormatConfig, MeasurementLabel, NamingMode};
use crate::data::types::{DataKind, DataSource, DecodedSample, OutputPoint, PointError};

const FIELD_VALUE: &str = "value";
const TAG_HOST: &str = "host";
const TAG_INSTANCE: &str = "instance";
const TAG_TYPE: &str = "type";
const TAG_TYPE_INSTANCE: &str = "type_instance";
const TAG_PLUGIN: &str = "plugin";

const NANOS_PER_MILLI: i64 = 1_000_000;

pub struct MetricMapper {
    format: FormatConfig,
}

impl MetricMapper {
    pub fn new(format: FormatConfig) -> Self {
        Self { format }
    }

    /// Build the point for a sample whose value is ready to emit
    pub fn map(
        &self,
        sample: &DecodedSample,
        value: f64,
        sources: Option<&[DataSource]>,
    ) -> Result<OutputPoint, PointError> {
        let (measurement, tags) = match self.format.naming {
            NamingMode::Measurement => (
                self.measurement_name(sample, sources),
                self.measurement_tags(sample),
            ),
            NamingMode::Series => (
                series_label(sample, sources, self.format.hostname_as_column),
                self.series_tags(sample),
            ),
        };

        let mut fields = BTreeMap::new();
        match sample.kind {
            DataKind::Gauge | DataKind::Counter | DataKind::Derive => {
                fields.insert(FIELD_VALUE.to_string(), value);
            }
            // Absolute samples carry no field and fail point construction
            DataKind::Absolute => {}
        }

        OutputPoint::new(
            measurement,
            tags,
            fields,
            sample.timestamp_ms.saturating_mul(NANOS_PER_MILLI),
        )
    }

    /// `plugin_<label>`, or `plugin_value` without a catalog entry
    fn measurement_name(&self, sample: &DecodedSample, sources: Option<&[DataSource]>) -> String {
        let source = sources.and_then(|s| s.get(sample.value_index).or_else(|| s.first()));
        match source {
            Some(source) => {
                let label = match self.format.measurement_label {
                    MeasurementLabel::Kind => source.kind.as_str(),
                    MeasurementLabel::Name => source.name.as_str(),
                };
                format!("{}_{}", sample.plugin, label)
            }
            None => format!("{}_{}", sample.plugin, FIELD_VALUE),
        }
    }

    fn measurement_tags(&self, sample: &DecodedSample) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        insert_non_empty(&mut tags, TAG_HOST, &sample.host);
        insert_non_empty(&mut tags, TAG_INSTANCE, &sample.plugin_instance);
        insert_non_empty(&mut tags, TAG_TYPE, &sample.type_name);
        insert_non_empty(&mut tags, TAG_TYPE_INSTANCE, &sample.type_instance);
        if self.format.pluginname_as_column {
            insert_non_empty(&mut tags, TAG_PLUGIN, &sample.plugin_label());
        }
        tags
    }

    /// Series layout keeps the identity in the measurement name
    fn series_tags(&self, sample: &DecodedSample) -> BTreeMap<String, String> {
        let mut tags = BTreeMap::new();
        if self.format.hostname_as_column {
            insert_non_empty(&mut tags, TAG_HOST, &sample.host);
        }
        if self.format.pluginname_as_column {
            insert_non_empty(&mut tags, TAG_PLUGIN, &sample.plugin_label());
        }
        tags
    }
}

fn insert_non_empty(tags: &mut BTreeMap<String, String>, key: &str, value: &str) {
    if !value.is_empty() {
        tags.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu_sample() -> DecodedSample {
        DecodedSample {
            host: "h1".to_string(),
            plugin: "cpu".to_string(),
            type_name: "cpu".to_string(),
            kind: DataKind::Derive,
            value: 150.0,
            timestamp_ms: 2000,
            ..Default::default()
        }
    }

    fn cpu_sources() -> Vec<DataSource> {
        vec![DataSource::new("value", DataKind::Derive)]
    }

    #[test]
    fn test_measurement_from_kind() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let sources = cpu_sources();
        let point = mapper.map(&cpu_sample(), 50.0, Some(&sources)).unwrap();

        assert_eq!(point.measurement(), "cpu_derive");
        assert_eq!(point.tag("host"), Some("h1"));
        assert_eq!(point.tag("type"), Some("cpu"));
        assert_eq!(point.tags().len(), 2);
        assert_eq!(point.field("value"), Some(50.0));
        assert_eq!(point.timestamp_ns(), 2_000_000_000);
    }

    #[test]
    fn test_measurement_from_name() {
        let mapper = MetricMapper::new(FormatConfig {
            measurement_label: MeasurementLabel::Name,
            ..Default::default()
        });
        let sources = vec![
            DataSource::new("rx", DataKind::Derive),
            DataSource::new("tx", DataKind::Derive),
        ];
        let mut sample = cpu_sample();
        sample.plugin = "interface".to_string();
        sample.value_index = 1;

        let point = mapper.map(&sample, 1.0, Some(&sources)).unwrap();
        assert_eq!(point.measurement(), "interface_tx");
    }

    #[test]
    fn test_measurement_label_falls_back_to_first_source() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let sources = vec![DataSource::new("value", DataKind::Gauge)];
        let mut sample = cpu_sample();
        sample.value_index = 3;
        sample.kind = DataKind::Gauge;

        let point = mapper.map(&sample, 1.0, Some(&sources)).unwrap();
        assert_eq!(point.measurement(), "cpu_gauge");
    }

    #[test]
    fn test_measurement_without_catalog_entry() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let mut sample = cpu_sample();
        sample.type_instance = "idle".to_string();

        let point = mapper.map(&sample, 1.0, None).unwrap();
        assert_eq!(point.measurement(), "cpu_value");
        assert_eq!(point.tag("type_instance"), Some("idle"));
    }

    #[test]
    fn test_empty_identifiers_produce_no_tags() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let sample = DecodedSample {
            plugin: "load".to_string(),
            kind: DataKind::Gauge,
            ..Default::default()
        };

        let point = mapper.map(&sample, 0.5, None).unwrap();
        assert!(point.tags().is_empty());
    }

    #[test]
    fn test_all_tags() {
        let mapper = MetricMapper::new(FormatConfig {
            pluginname_as_column: true,
            ..Default::default()
        });
        let mut sample = cpu_sample();
        sample.host = "web01.example.com".to_string();
        sample.plugin_instance = "0".to_string();
        sample.type_instance = "user".to_string();
        let sources = cpu_sources();

        let point = mapper.map(&sample, 1.0, Some(&sources)).unwrap();
        assert_eq!(point.tag("host"), Some("web01.example.com"));
        assert_eq!(point.tag("instance"), Some("0"));
        assert_eq!(point.tag("type"), Some("cpu"));
        assert_eq!(point.tag("type_instance"), Some("user"));
        assert_eq!(point.tag("plugin"), Some("cpu-0"));
    }

    #[test]
    fn test_absolute_has_no_fields() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let mut sample = cpu_sample();
        sample.kind = DataKind::Absolute;

        let err = mapper.map(&sample, 3.0, None).unwrap_err();
        assert!(matches!(err, PointError::NoFields { .. }));
    }

    #[test]
    fn test_non_finite_value_rejected() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let err = mapper.map(&cpu_sample(), f64::NAN, None).unwrap_err();
        assert!(matches!(err, PointError::NonFiniteField { .. }));
    }

    #[test]
    fn test_empty_plugin_measurement() {
        let mapper = MetricMapper::new(FormatConfig::default());
        let sample = DecodedSample {
            kind: DataKind::Gauge,
            ..Default::default()
        };
        // "_value" is still a non-empty measurement
        let point = mapper.map(&sample, 1.0, None).unwrap();
        assert_eq!(point.measurement(), "_value");
    }

    #[test]
    fn test_series_naming() {
        let mapper = MetricMapper::new(FormatConfig {
            naming: NamingMode::Series,
            ..Default::default()
        });
        let sources = vec![
            DataSource::new("rx", DataKind::Derive),
            DataSource::new("tx", DataKind::Derive),
        ];
        let sample = DecodedSample {
            host: "gw.lan".to_string(),
            plugin: "interface".to_string(),
            plugin_instance: "eth0".to_string(),
            type_name: "if_octets".to_string(),
            kind: DataKind::Derive,
            ..Default::default()
        };

        let point = mapper.map(&sample, 1.0, Some(&sources)).unwrap();
        assert_eq!(point.measurement(), "gw_lan.interface-eth0.if_octets-rx-tx");
        assert!(point.tags().is_empty());
    }

    #[test]
    fn test_series_naming_with_columns() {
        let mapper = MetricMapper::new(FormatConfig {
            naming: NamingMode::Series,
            hostname_as_column: true,
            pluginname_as_column: true,
            ..Default::default()
        });
        let mut sample = cpu_sample();
        sample.plugin_instance = "1".to_string();
        sample.type_instance = "user".to_string();

        let point = mapper.map(&sample, 1.0, None).unwrap();
        assert_eq!(point.measurement(), "cpu-1.cpu-user");
        assert_eq!(point.tag("host"), Some("h1"));
        assert_eq!(point.tag("plugin"), Some("cpu-1"));
        assert_eq!(point.tags().len(), 2);
    }
}
