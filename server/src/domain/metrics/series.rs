//! Series identity
//!
//! `host.plugin[-plugin_instance].type[-type_instance|-ds_name][-tx|-rx]`,
//! with dots in the host replaced by underscores. The same string keys the
//! rate cache and, optionally without its host component, labels the series.

use crate::data::types::{DataSource, DecodedSample};

/// Plugin whose two-value lists are split into transmit/receive series
const DIRECTIONAL_PLUGIN: &str = "interface";

/// Type component of the series identity
fn type_label(sample: &DecodedSample, sources: Option<&[DataSource]>) -> String {
    let mut label = sample.type_name.clone();

    if !sample.type_instance.is_empty() {
        label.push('-');
        label.push_str(&sample.type_instance);
    } else if let Some(source) = sources.and_then(|s| s.get(sample.value_index)) {
        label.push('-');
        label.push_str(&source.name);
    }

    if sample.plugin == DIRECTIONAL_PLUGIN {
        match sample.value_index {
            0 => label.push_str("-tx"),
            1 => label.push_str("-rx"),
            _ => {}
        }
    }

    label
}

/// Full series key, used by the rate cache
pub fn series_key(sample: &DecodedSample, sources: Option<&[DataSource]>) -> String {
    format!(
        "{}.{}.{}",
        sample.normalized_host(),
        sample.plugin_label(),
        type_label(sample, sources)
    )
}

/// Human-readable series label, without the host when it is emitted as a tag
pub fn series_label(
    sample: &DecodedSample,
    sources: Option<&[DataSource]>,
    hostname_as_column: bool,
) -> String {
    if hostname_as_column {
        format!("{}.{}", sample.plugin_label(), type_label(sample, sources))
    } else {
        series_key(sample, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::DataKind;

    fn sample(plugin: &str, type_name: &str, value_index: usize) -> DecodedSample {
        DecodedSample {
            host: "web01.example.com".to_string(),
            plugin: plugin.to_string(),
            type_name: type_name.to_string(),
            value_index,
            ..Default::default()
        }
    }

    fn if_octets() -> Vec<DataSource> {
        vec![
            DataSource::new("rx", DataKind::Derive),
            DataSource::new("tx", DataKind::Derive),
        ]
    }

    #[test]
    fn test_key_uses_type_instance() {
        let mut s = sample("cpu", "cpu", 0);
        s.plugin_instance = "0".to_string();
        s.type_instance = "user".to_string();
        let sources = vec![DataSource::new("value", DataKind::Derive)];

        assert_eq!(
            series_key(&s, Some(&sources)),
            "web01_example_com.cpu-0.cpu-user"
        );
    }

    #[test]
    fn test_key_falls_back_to_ds_name() {
        let s = sample("load", "load", 1);
        let sources = vec![
            DataSource::new("shortterm", DataKind::Gauge),
            DataSource::new("midterm", DataKind::Gauge),
            DataSource::new("longterm", DataKind::Gauge),
        ];
        assert_eq!(
            series_key(&s, Some(&sources)),
            "web01_example_com.load.load-midterm"
        );
    }

    #[test]
    fn test_key_without_catalog_entry() {
        let mut s = sample("custom", "mystery", 0);
        s.type_instance = "x".to_string();
        assert_eq!(series_key(&s, None), "web01_example_com.custom.mystery-x");
    }

    #[test]
    fn test_interface_direction_suffix() {
        let sources = if_octets();
        let mut s = sample("interface", "if_octets", 0);
        s.plugin_instance = "eth0".to_string();
        assert_eq!(
            series_key(&s, Some(&sources)),
            "web01_example_com.interface-eth0.if_octets-rx-tx"
        );

        s.value_index = 1;
        assert_eq!(
            series_key(&s, Some(&sources)),
            "web01_example_com.interface-eth0.if_octets-tx-rx"
        );
    }

    #[test]
    fn test_direction_suffix_only_for_interface() {
        let sources = if_octets();
        let s = sample("netlink", "if_octets", 0);
        assert_eq!(
            series_key(&s, Some(&sources)),
            "web01_example_com.netlink.if_octets-rx"
        );
    }

    #[test]
    fn test_label_drops_host_when_column() {
        let s = sample("load", "load", 0);
        let sources = vec![DataSource::new("shortterm", DataKind::Gauge)];
        assert_eq!(
            series_label(&s, Some(&sources), true),
            "load.load-shortterm"
        );
        assert_eq!(
            series_label(&s, Some(&sources), false),
            "web01_example_com.load.load-shortterm"
        );
    }

    #[test]
    fn test_host_normalization_collision() {
        let mut a = sample("load", "load", 0);
        a.host = "a.b".to_string();
        let mut b = sample("load", "load", 0);
        b.host = "a_b".to_string();
        assert_eq!(series_key(&a, None), series_key(&b, None));
    }
}
