//! Parsing of positional strings collected by mobile devices.

use crate::value::Value;

/// A position split into its components.
///
/// Components are kept as the raw tokens. Numeric validation happens when
/// the rendered form is deserialized into its typed shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub accuracy: Option<String>,
}

impl Coordinates {
    /// Split a `"lat lng alt acc"` string. Trailing components may be missing.
    ///
    /// # Examples
    /// ```
    /// use fieldform_forms::Coordinates;
    ///
    /// let c = Coordinates::parse("1.5 2.5");
    /// assert_eq!(c.latitude.as_deref(), Some("1.5"));
    /// assert_eq!(c.longitude.as_deref(), Some("2.5"));
    /// assert!(c.altitude.is_none());
    /// ```
    #[must_use]
    pub fn parse(position: &str) -> Self {
        let mut tokens = position.split_whitespace().map(str::to_string);
        Self {
            latitude: tokens.next(),
            longitude: tokens.next(),
            altitude: tokens.next(),
            accuracy: tokens.next(),
        }
    }

    #[must_use]
    pub fn latitude_value(&self) -> Value {
        self.latitude.clone().into()
    }

    #[must_use]
    pub fn longitude_value(&self) -> Value {
        self.longitude.clone().into()
    }

    #[must_use]
    pub fn altitude_value(&self) -> Value {
        self.altitude.clone().into()
    }

    #[must_use]
    pub fn accuracy_value(&self) -> Value {
        self.accuracy.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_tokens() {
        let c = Coordinates::parse("1.5 2.5");
        assert_eq!(c.latitude.as_deref(), Some("1.5"));
        assert_eq!(c.longitude.as_deref(), Some("2.5"));
        assert_eq!(c.altitude, None);
        assert_eq!(c.accuracy, None);
    }

    #[test]
    fn test_four_tokens() {
        let c = Coordinates::parse("1.5 2.5 3.5 4.5");
        assert_eq!(
            c,
            Coordinates {
                latitude: Some("1.5".into()),
                longitude: Some("2.5".into()),
                altitude: Some("3.5".into()),
                accuracy: Some("4.5".into()),
            }
        );
    }

    #[test]
    fn test_malformed_tokens_pass_through() {
        let c = Coordinates::parse("north -12,5");
        assert_eq!(c.latitude.as_deref(), Some("north"));
        assert_eq!(c.longitude.as_deref(), Some("-12,5"));
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(Coordinates::parse("  "), Coordinates::default());
    }

    #[test]
    fn test_missing_components_are_absent_values() {
        let c = Coordinates::parse("-25.9 32.6");
        assert_eq!(c.latitude_value(), Value::Text("-25.9".into()));
        assert_eq!(c.accuracy_value(), Value::Absent);
    }
}
