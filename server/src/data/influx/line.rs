//! InfluxDB line protocol encoding
//!
//! `measurement[,tag=value...] field=value[,field=value...] timestamp_ns`

use std::fmt::Write;

use crate::data::types::OutputPoint;

/// Encode a batch as newline-separated line protocol
pub fn encode_batch(points: &[OutputPoint]) -> String {
    let mut body = String::with_capacity(points.len() * 96);
    for point in points {
        encode_point(&mut body, point);
        body.push('\n');
    }
    body
}

/// Append one point (without trailing newline)
pub fn encode_point(out: &mut String, point: &OutputPoint) {
    escape_into(out, point.measurement(), &[',', ' ']);

    // Tags are already sorted by key (BTreeMap), which is what InfluxDB prefers
    for (key, value) in point.tags() {
        out.push(',');
        escape_into(out, key, &[',', '=', ' ']);
        out.push('=');
        escape_into(out, value, &[',', '=', ' ']);
    }

    out.push(' ');
    for (i, (key, value)) in point.fields().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        escape_into(out, key, &[',', '=', ' ']);
        // Floats without an `i` suffix are parsed as float64
        let _ = write!(out, "={}", value);
    }

    let _ = write!(out, " {}", point.timestamp_ns());
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn point(measurement: &str, tags: &[(&str, &str)], value: f64, ts: i64) -> OutputPoint {
        let tags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let fields = BTreeMap::from([("value".to_string(), value)]);
        OutputPoint::new(measurement, tags, fields, ts).unwrap()
    }

    #[test]
    fn test_encode_simple_point() {
        let p = point("cpu_derive", &[("type", "cpu"), ("host", "h1")], 50.0, 2_000_000_000);
        let mut out = String::new();
        encode_point(&mut out, &p);
        assert_eq!(out, "cpu_derive,host=h1,type=cpu value=50 2000000000");
    }

    #[test]
    fn test_encode_fractional_value() {
        let p = point("load_gauge", &[], 0.25, 1);
        let mut out = String::new();
        encode_point(&mut out, &p);
        assert_eq!(out, "load_gauge value=0.25 1");
    }

    #[test]
    fn test_encode_escapes_special_characters() {
        let p = point(
            "df complex,x",
            &[("type_instance", "C: drive"), ("instance", "a=b,c")],
            1.0,
            7,
        );
        let mut out = String::new();
        encode_point(&mut out, &p);
        assert_eq!(
            out,
            "df\\ complex\\,x,instance=a\\=b\\,c,type_instance=C:\\ drive value=1 7"
        );
    }

    #[test]
    fn test_encode_batch_newline_separated() {
        let batch = vec![point("a_gauge", &[], 1.0, 1), point("b_gauge", &[], 2.0, 2)];
        assert_eq!(encode_batch(&batch), "a_gauge value=1 1\nb_gauge value=2 2\n");
    }

    #[test]
    fn test_encode_empty_batch() {
        assert_eq!(encode_batch(&[]), "");
    }
}
