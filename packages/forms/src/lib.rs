//! Fieldform form model - adapt raw field submissions to typed forms.
//!
//! A submission's raw `data` object is mapped by a named [`Binding`] into a
//! nested [`Structure`], rendered as markup, and deserialized into the
//! [`MappedForm`] its handler expects.
//!
//! # Example
//!
//! ```
//! use fieldform_forms::{markup, BindingRegistry, FormData, FormKind, Unmarshaller};
//! use serde_json::json;
//!
//! let registry = BindingRegistry::standard();
//! let binding = registry.resolve("spraying").unwrap();
//!
//! let data = FormData::from_payload(&json!({"data": {"entityUuid": "e-1"}})).unwrap();
//! let xml = markup::serialize(&binding.map(&data).unwrap());
//! let form = Unmarshaller::new().unmarshal(binding.kind(), &xml).unwrap();
//!
//! assert_eq!(form.kind(), FormKind::Spraying);
//! assert_eq!(form.entity_uuid(), Some("e-1"));
//! ```
//!
//! # Architecture
//!
//! - [`value`]: Nested structure and field values
//! - [`data`]: Raw submission data accessors
//! - [`coordinates`]: Position string parsing
//! - [`markup`]: Markup rendering and reading
//! - [`forms`]: Typed forms and their deserialization
//! - [`binding`]: Binding registry
//! - [`bindings`]: Built-in bindings
//! - [`error`]: Error types and Result alias

pub mod binding;
pub mod bindings;
pub mod coordinates;
pub mod data;
pub mod error;
pub mod forms;
pub mod markup;
pub mod value;

pub use binding::{Binding, BindingRegistry, MapFn};
pub use coordinates::Coordinates;
pub use data::FormData;
pub use error::{FormError, MappingError, MarkupError, Result};
pub use forms::{
    DuplicateLocationForm, FormKind, LocationForm, MappedForm, SprayingForm, Unmarshaller,
};
pub use value::{Structure, Value};
