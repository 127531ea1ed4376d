use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PathError;

/// One traversal step: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// The keys pushed while walking a type, innermost last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathStack {
    segments: Vec<PathSegment>,
}

impl PathStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The canonical path addressing the current position.
    pub fn to_path(&self) -> JsonPath {
        JsonPath {
            segments: self.segments.clone(),
        }
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for PathStack {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A path into an instance document, printed as `$.bond.currency[0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Key(key.into()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Split into the parent path and the final segment.
    pub fn split_last(&self) -> Option<(JsonPath, &PathSegment)> {
        let (last, parent) = self.segments.split_last()?;
        Some((
            JsonPath {
                segments: parent.to_vec(),
            },
            last,
        ))
    }

    pub fn read<'v>(&self, instance: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(instance, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object()?.get(key),
                PathSegment::Index(index) => current.as_array()?.get(*index),
            })
    }

    pub fn read_mut<'v>(&self, instance: &'v mut Value) -> Option<&'v mut Value> {
        self.segments
            .iter()
            .try_fold(instance, |current, segment| match segment {
                PathSegment::Key(key) => current.as_object_mut()?.get_mut(key),
                PathSegment::Index(index) => current.as_array_mut()?.get_mut(*index),
            })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_identifier(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => {
                    let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
                    write!(f, "[{quoted}]")?
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax = |reason: &str| PathError::Syntax {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let rest = s
            .strip_prefix('$')
            .ok_or_else(|| syntax("must start with '$'"))?;
        let bytes = rest.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'.' => {
                    let start = pos + 1;
                    let end = rest[start..]
                        .find(['.', '['])
                        .map_or(rest.len(), |offset| start + offset);
                    let name = &rest[start..end];
                    if name.is_empty() {
                        return Err(syntax("empty segment"));
                    }
                    // `$.items.3` addresses an element, as produced by `key + '.' + length`
                    let segment = if name.bytes().all(|b| b.is_ascii_digit()) {
                        PathSegment::Index(name.parse().map_err(|_| syntax("bad index"))?)
                    } else {
                        PathSegment::Key(name.to_string())
                    };
                    segments.push(segment);
                    pos = end;
                }
                b'[' => {
                    let close = rest[pos..]
                        .find(']')
                        .map(|offset| pos + offset)
                        .ok_or_else(|| syntax("unclosed '['"))?;
                    let inner = &rest[pos + 1..close];
                    if inner.starts_with('"') {
                        // quoted keys may themselves contain ']'
                        let (key, consumed) = parse_quoted(&rest[pos + 1..])
                            .ok_or_else(|| syntax("unterminated quoted key"))?;
                        let after = pos + 1 + consumed;
                        if bytes.get(after) != Some(&b']') {
                            return Err(syntax("expected ']' after quoted key"));
                        }
                        segments.push(PathSegment::Key(key));
                        pos = after + 1;
                    } else if let Some(key) = inner
                        .strip_prefix('\'')
                        .and_then(|k| k.strip_suffix('\''))
                    {
                        segments.push(PathSegment::Key(key.to_string()));
                        pos = close + 1;
                    } else {
                        let index = inner.parse().map_err(|_| syntax("bad index"))?;
                        segments.push(PathSegment::Index(index));
                        pos = close + 1;
                    }
                }
                _ => return Err(syntax("expected '.' or '['")),
            }
        }

        Ok(Self { segments })
    }
}

/// Parse a leading JSON string literal, returning it and the bytes consumed.
fn parse_quoted(input: &str) -> Option<(String, usize)> {
    let mut escaped = false;
    for (i, c) in input.char_indices().skip(1) {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                let literal = &input[..=i];
                return serde_json::from_str(literal).ok().map(|key| (key, i + 1));
            }
            _ => escaped = false,
        }
    }
    None
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Join a traversal stack into the path it addresses.
pub fn to_path(stack: &PathStack) -> JsonPath {
    stack.to_path()
}

/// The value at `path`, or `None` when any segment is missing.
pub fn read<'v>(instance: &'v Value, path: &JsonPath) -> Option<&'v Value> {
    path.read(instance)
}

/// Set the value at `path`. The parent container must exist; an array parent
/// also accepts an index equal to its length, which appends.
pub fn write(instance: &mut Value, path: &JsonPath, value: Value) -> Result<(), PathError> {
    let Some((parent_path, last)) = path.split_last() else {
        *instance = value;
        return Ok(());
    };
    let parent = parent_path
        .read_mut(instance)
        .ok_or_else(|| PathError::MissingParent(path.to_string()))?;

    match (parent, last) {
        (Value::Object(map), PathSegment::Key(key)) => {
            map.insert(key.clone(), value);
            Ok(())
        }
        (Value::Array(items), PathSegment::Index(index)) => {
            let len = items.len();
            match (*index).cmp(&len) {
                std::cmp::Ordering::Less => items[*index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(PathError::IndexOutOfBounds {
                        path: parent_path.to_string(),
                        index: *index,
                        len,
                    });
                }
            }
            Ok(())
        }
        _ => Err(PathError::NotAContainer(parent_path.to_string())),
    }
}

/// Append `value` to the array at `path`. An absent or null slot becomes a
/// one-element array, which still requires the slot's parent to exist.
pub fn append_to_array(instance: &mut Value, path: &JsonPath, value: Value) -> Result<(), PathError> {
    match path.read_mut(instance) {
        Some(Value::Array(items)) => {
            items.push(value);
            Ok(())
        }
        Some(Value::Null) | None => write(instance, path, Value::Array(vec![value])),
        Some(_) => Err(PathError::NotAnArray(path.to_string())),
    }
}

/// Remove the element at `index`, shifting later elements down.
pub fn remove_from_array(
    instance: &mut Value,
    path: &JsonPath,
    index: usize,
) -> Result<Value, PathError> {
    match path.read_mut(instance) {
        Some(Value::Array(items)) if index < items.len() => Ok(items.remove(index)),
        Some(Value::Array(items)) => Err(PathError::IndexOutOfBounds {
            path: path.to_string(),
            index,
            len: items.len(),
        }),
        _ => Err(PathError::NotAnArray(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_to_path_formats() {
        let stack: PathStack = [
            PathSegment::from("bond"),
            PathSegment::from("parties"),
            PathSegment::Index(2),
            PathSegment::from("name"),
        ]
        .into_iter()
        .collect();
        assert_eq!(to_path(&stack).to_string(), "$.bond.parties[2].name");
        assert_eq!(PathStack::new().to_path().to_string(), "$");
    }

    #[test]
    fn test_non_identifier_keys_are_quoted() {
        let p = JsonPath::root().key("$class").key("first name").key("a\"b]");
        insta::assert_snapshot!(p.to_string(), @r#"$.$class["first name"]["a\"b]"]"#);
        assert_eq!(path(&p.to_string()), p);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(path("$.ss[1]"), JsonPath::root().key("ss").index(1));
        assert_eq!(path("$.ss.1"), JsonPath::root().key("ss").index(1));
        assert_eq!(path("$['a b'][0]"), JsonPath::root().key("a b").index(0));
        assert!(path("$").is_root());
        assert!("ss[0]".parse::<JsonPath>().is_err());
        assert!("$.".parse::<JsonPath>().is_err());
        assert!("$[x]".parse::<JsonPath>().is_err());
        assert!("$[0".parse::<JsonPath>().is_err());
    }

    #[test]
    fn test_read_missing_is_none() {
        let doc = json!({"a": {"b": [1, 2]}});
        assert_eq!(read(&doc, &path("$.a.b[1]")), Some(&json!(2)));
        assert_eq!(read(&doc, &path("$.a.b[5]")), None);
        assert_eq!(read(&doc, &path("$.x.y.z")), None);
        assert_eq!(read(&doc, &path("$.a.b.c")), None);
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let mut doc = json!({"a": {"b": [1, 2]}, "s": "x"});
        for (p, v) in [
            ("$.s", json!("y")),
            ("$.a.c", json!(true)),
            ("$.a.b[0]", json!(10)),
            ("$.a.b[2]", json!(3)),
        ] {
            write(&mut doc, &path(p), v.clone()).unwrap();
            assert_eq!(read(&doc, &path(p)), Some(&v));
        }
        assert_eq!(doc["a"]["b"], json!([10, 2, 3]));
    }

    #[test]
    fn test_write_requires_parent() {
        let mut doc = json!({"a": 1});
        assert_eq!(
            write(&mut doc, &path("$.x.y"), json!(1)),
            Err(PathError::MissingParent("$.x.y".to_string()))
        );
        assert_eq!(
            write(&mut doc, &path("$.a.b"), json!(1)),
            Err(PathError::NotAContainer("$.a".to_string()))
        );
        let mut list = json!({"l": []});
        assert!(matches!(
            write(&mut list, &path("$.l[3]"), json!(1)),
            Err(PathError::IndexOutOfBounds { index: 3, len: 0, .. })
        ));
    }

    #[test]
    fn test_write_root_replaces_document() {
        let mut doc = json!({"a": 1});
        write(&mut doc, &JsonPath::root(), json!([1])).unwrap();
        assert_eq!(doc, json!([1]));
    }

    #[test]
    fn test_append_then_remove_restores() {
        let mut doc = json!({"ss": ["a", "b"]});
        let before = doc.clone();
        append_to_array(&mut doc, &path("$.ss"), json!("")).unwrap();
        assert_eq!(doc, json!({"ss": ["a", "b", ""]}));
        let len = doc["ss"].as_array().unwrap().len();
        remove_from_array(&mut doc, &path("$.ss"), len - 1).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn test_append_creates_missing_array() {
        let mut doc = json!({"nested": {}});
        append_to_array(&mut doc, &path("$.nested.items"), json!(1)).unwrap();
        assert_eq!(doc, json!({"nested": {"items": [1]}}));
        assert!(append_to_array(&mut doc, &path("$.missing.items"), json!(1)).is_err());
        assert_eq!(
            append_to_array(&mut doc, &path("$.nested"), json!(1)),
            Err(PathError::NotAnArray("$.nested".to_string()))
        );
    }

    #[test]
    fn test_remove_shifts_elements() {
        let mut doc = json!({"n": [1, 2, 3]});
        assert_eq!(remove_from_array(&mut doc, &path("$.n"), 0), Ok(json!(1)));
        assert_eq!(doc["n"], json!([2, 3]));
        assert!(remove_from_array(&mut doc, &path("$.n"), 2).is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let p = JsonPath::root().key("ss").index(0);
        let encoded = serde_json::to_value(&p).unwrap();
        assert_eq!(encoded, json!("$.ss[0]"));
        let decoded: JsonPath = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, p);
    }
}
