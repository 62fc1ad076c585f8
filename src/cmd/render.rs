/*!
render.rs - structured reply values and the recursive output renderer.

A chirp command either returns nothing, a scalar, an ordered list, or a
keyed mapping (arbitrarily nested, e.g. `getdir -l` returns filename ->
metadata map). `Reply` models that shape; `render` flattens it into
tab-indented lines for the terminal.

Timestamps (`atime` / `mtime` / `ctime` fields in stat-like metadata)
are carried as `Reply::Time` and printed as a calendar string instead
of a raw epoch.
*/

use chrono::{DateTime, Utc};

/// Value returned by a command invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to print (e.g. `remove`, `ulog`).
    None,
    Str(String),
    Int(i64),
    Bool(bool),
    /// Seconds since the Unix epoch; rendered as a calendar string.
    Time(i64),
    List(Vec<Reply>),
    /// Keyed mapping. Entry order is preserved as built.
    Map(Vec<(String, Reply)>),
}

/// Metadata fields that carry epoch seconds and must be rendered as
/// calendar strings (see `condor_chirp stat` / `getdir -l`).
const TIME_FIELDS: &[&str] = &["atime", "mtime", "ctime"];

impl Reply {
    /// True when rendering would produce no output at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::None)
    }

    fn is_nested(&self) -> bool {
        matches!(self, Reply::List(_) | Reply::Map(_))
    }

    fn scalar_text(&self) -> String {
        match self {
            Reply::None => String::new(),
            Reply::Str(s) => s.clone(),
            Reply::Int(n) => n.to_string(),
            Reply::Bool(b) => b.to_string(),
            Reply::Time(t) => format_timestamp(*t),
            Reply::List(_) | Reply::Map(_) => unreachable!("nested values never render inline"),
        }
    }
}

/// Convert epoch seconds into the fixed calendar form used by the
/// original tool, e.g. `Thu Jan  1 00:00:00 1970`. Pinned to UTC so the
/// output does not depend on the host timezone.
pub fn format_timestamp(epoch: i64) -> String {
    match DateTime::<Utc>::from_timestamp(epoch, 0) {
        Some(dt) => dt.format("%a %b %e %H:%M:%S %Y").to_string(),
        // Out-of-range epoch: fall back to the raw number.
        None => epoch.to_string(),
    }
}

/// Flatten a reply into printable lines, one tab per indent level.
///
/// - A scalar is a single line at the current level.
/// - List elements stay at the current level; a nested list/map element
///   recurses one level deeper with no label.
/// - Map entries print `key: value` on one line for scalar values; for
///   nested values the key is printed alone and the value recurses one
///   level deeper.
pub fn render(value: &Reply, indent: usize) -> Vec<String> {
    let pad = "\t".repeat(indent);
    match value {
        Reply::None => Vec::new(),
        Reply::List(items) => {
            let mut lines = Vec::new();
            for item in items {
                if item.is_nested() {
                    lines.extend(render(item, indent + 1));
                } else {
                    lines.push(format!("{pad}{}", item.scalar_text()));
                }
            }
            lines
        }
        Reply::Map(entries) => {
            let mut lines = Vec::new();
            for (key, val) in entries {
                if val.is_nested() {
                    lines.push(format!("{pad}{key}"));
                    lines.extend(render(val, indent + 1));
                } else {
                    lines.push(format!("{pad}{key}: {}", val.scalar_text()));
                }
            }
            lines
        }
        scalar => vec![format!("{pad}{}", scalar.scalar_text())],
    }
}

/// Convert a JSON value coming back from the chirp client into a
/// `Reply`, promoting the well-known time fields of stat-like metadata
/// maps to `Reply::Time` so they render as calendar strings.
pub fn reply_from_metadata(value: &serde_json::Value) -> Reply {
    convert(value, false)
}

fn convert(value: &serde_json::Value, as_time: bool) -> Reply {
    use serde_json::Value;
    match value {
        Value::Null => Reply::None,
        Value::Bool(b) => Reply::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) if as_time => Reply::Time(i),
            Some(i) => Reply::Int(i),
            None => Reply::Str(n.to_string()),
        },
        Value::String(s) => Reply::Str(s.clone()),
        Value::Array(items) => Reply::List(items.iter().map(|v| convert(v, false)).collect()),
        Value::Object(map) => Reply::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), convert(v, TIME_FIELDS.contains(&k.as_str()))))
                .collect(),
        ),
    }
}

/* --------------------------------- Tests ---------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_renders_one_line() {
        assert_eq!(render(&Reply::Str("hello".into()), 0), vec!["hello"]);
        assert_eq!(render(&Reply::Int(42), 2), vec!["\t\t42"]);
    }

    #[test]
    fn none_renders_nothing() {
        assert!(render(&Reply::None, 0).is_empty());
    }

    #[test]
    fn nested_map_and_list_indentation() {
        // {"a": {"b": 1, "c": [2, 3]}} -> exactly five lines.
        let value = Reply::Map(vec![(
            "a".into(),
            Reply::Map(vec![
                ("b".into(), Reply::Int(1)),
                ("c".into(), Reply::List(vec![Reply::Int(2), Reply::Int(3)])),
            ]),
        )]);
        let lines = render(&value, 0);
        assert_eq!(lines, vec!["a", "\tb: 1", "\tc", "\t\t2", "\t\t3"]);
    }

    #[test]
    fn list_of_scalars_stays_at_level() {
        let value = Reply::List(vec![Reply::Str("x".into()), Reply::Str("y".into())]);
        assert_eq!(render(&value, 1), vec!["\tx", "\ty"]);
    }

    #[test]
    fn epoch_zero_calendar_string() {
        assert_eq!(format_timestamp(0), "Thu Jan  1 00:00:00 1970");
    }

    #[test]
    fn timestamp_inside_map_renders_calendar() {
        let value = Reply::Map(vec![("mtime".into(), Reply::Time(0))]);
        assert_eq!(render(&value, 0), vec!["mtime: Thu Jan  1 00:00:00 1970"]);
    }

    #[test]
    fn metadata_conversion_promotes_time_fields() {
        let meta = json!({
            "file.txt": { "size": 10, "atime": 0, "mtime": 100, "ctime": 200 }
        });
        let reply = reply_from_metadata(&meta);
        let Reply::Map(entries) = &reply else {
            panic!("expected map reply");
        };
        let Reply::Map(fields) = &entries[0].1 else {
            panic!("expected nested metadata map");
        };
        let find = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v);
        assert_eq!(find("size"), Some(&Reply::Int(10)));
        assert_eq!(find("atime"), Some(&Reply::Time(0)));
        assert_eq!(find("mtime"), Some(&Reply::Time(100)));
        assert_eq!(find("ctime"), Some(&Reply::Time(200)));
    }

    #[test]
    fn metadata_conversion_plain_listing() {
        let listing = json!(["a.txt", "b.txt"]);
        assert_eq!(
            reply_from_metadata(&listing),
            Reply::List(vec![Reply::Str("a.txt".into()), Reply::Str("b.txt".into())])
        );
    }
}
