//! Nested key/value structure produced by binding mappings.

use std::fmt;

/// A single field value in a [`Structure`].
///
/// `Absent` is distinct from an empty `Text`: absent fields are skipped
/// entirely when rendered, empty text renders as an empty element.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Absent,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Nested(Structure),
}

impl Value {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Scalar rendering of this value, `None` for absent and nested values.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Absent | Self::Nested(_) => None,
        }
    }

    #[must_use]
    pub fn as_nested(&self) -> Option<&Structure> {
        match self {
            Self::Nested(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Decimal(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Self::Nested(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Absent, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => Ok(()),
            Self::Nested(s) => write!(f, "{{{} fields}}", s.len()),
            other => write!(f, "{}", other.as_text().unwrap_or_default()),
        }
    }
}

/// Insertion-ordered mapping from field name to [`Value`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    fields: Vec<(String, Value)>,
}

impl Structure {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing field keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [`Structure::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// All fields in insertion order, absent ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Fields that carry a value.
    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(_, v)| !v.is_absent())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_preserves_position() {
        let mut s = Structure::new().with("a", "1").with("b", "2");
        s.set("a", "3");

        let names: Vec<_> = s.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(s.get("a"), Some(&Value::Text("3".to_string())));
    }

    #[test]
    fn test_present_skips_absent() {
        let s = Structure::new()
            .with("a", "1")
            .with("b", Value::Absent)
            .with("c", None::<String>);

        let names: Vec<_> = s.present().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Value::from(42i64).as_text().as_deref(), Some("42"));
        assert_eq!(Value::from(1.5).as_text().as_deref(), Some("1.5"));
        assert_eq!(Value::from(true).as_text().as_deref(), Some("true"));
        assert_eq!(Value::Absent.as_text(), None);
        assert_eq!(Value::from("").as_text().as_deref(), Some(""));
    }
}
