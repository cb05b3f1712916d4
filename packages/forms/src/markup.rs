//! Markup rendering of nested structures.
//!
//! The rendering is the intermediate format between a binding's mapped
//! structure and the typed form a handler receives. Every present field
//! becomes an element named after the field; absent fields are dropped.

use std::borrow::Cow;
use std::fmt::Write;

use roxmltree::{Document, Node};

use crate::error::MarkupError;
use crate::value::{Structure, Value};

/// Synthetic root used to read a fragment with several top-level elements.
const FRAGMENT_ROOT: &str = "fragment";

/// Render a structure as markup text.
///
/// Output is order-preserving and deterministic for identical input.
///
/// # Examples
/// ```
/// use fieldform_forms::{markup, Structure, Value};
///
/// let s = Structure::new()
///     .with("form", Structure::new().with("name", "A & B").with("gone", Value::Absent));
/// assert_eq!(markup::serialize(&s), "<form><name>A &amp; B</name></form>");
/// ```
#[must_use]
pub fn serialize(structure: &Structure) -> String {
    let mut out = String::new();
    write_structure(&mut out, structure);
    out
}

fn write_structure(out: &mut String, structure: &Structure) {
    for (name, value) in structure.present() {
        let _ = write!(out, "<{name}>");
        match value {
            Value::Nested(inner) => write_structure(out, inner),
            scalar => {
                if let Some(text) = scalar.as_text() {
                    out.push_str(&escape(&text));
                }
            }
        }
        let _ = write!(out, "</{name}>");
    }
}

/// Escape the five markup-significant characters.
///
/// Only `<`, `>`, `&`, `'` and `"` are replaced; all other characters pass
/// through. Borrows the input when nothing needs replacing.
#[must_use]
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['<', '>', '&', '\'', '"']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Read a markup fragment back into a structure.
///
/// Elements with child elements become nested structures, all other
/// elements become text. Scalars therefore come back as [`Value::Text`].
pub fn parse(markup: &str) -> Result<Structure, MarkupError> {
    let wrapped = format!("<{FRAGMENT_ROOT}>{markup}</{FRAGMENT_ROOT}>");
    let doc = Document::parse(&wrapped)?;
    Ok(read_children(doc.root_element()))
}

/// Convert the child elements of `node` into a structure.
pub(crate) fn read_children(node: Node<'_, '_>) -> Structure {
    let mut structure = Structure::new();
    for child in node.children().filter(Node::is_element) {
        let name = child.tag_name().name();
        if child.children().any(|c| c.is_element()) {
            structure.set(name, read_children(child));
        } else {
            structure.set(name, child.text().unwrap_or_default());
        }
    }
    structure
}
