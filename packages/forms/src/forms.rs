//! Typed forms consumed by handlers, and their deserialization from markup.

use std::fmt;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::MarkupError;

/// The typed form a binding produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Spraying,
    Location,
    DuplicateLocation,
}

impl FormKind {
    /// Root element of the form's markup rendering.
    #[must_use]
    pub fn root_element(self) -> &'static str {
        match self {
            Self::Spraying => "sprayingForm",
            Self::Location => "locationForm",
            Self::DuplicateLocation => "duplicateLocationForm",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.root_element())
    }
}

/// Evaluation of a spraying round at an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SprayingForm {
    pub entity_uuid: Option<String>,
    pub evaluation: Option<String>,
}

/// A newly registered location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationForm {
    pub entity_uuid: Option<String>,
    pub entity_ext_id: Option<String>,
    pub field_worker_uuid: Option<String>,
    pub field_worker_ext_id: Option<String>,
    pub collection_date_time: Option<String>,
    pub hierarchy_ext_id: Option<String>,
    pub hierarchy_uuid: Option<String>,
    pub hierarchy_parent_uuid: Option<String>,
    pub location_ext_id: Option<String>,
    pub location_name: Option<String>,
    pub location_type: Option<String>,
    pub community_name: Option<String>,
    pub community_code: Option<String>,
    pub map_area_name: Option<String>,
    pub locality_name: Option<String>,
    pub sector_name: Option<String>,
    pub location_building_number: Option<String>,
    pub location_floor_number: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A report that a location was registered more than once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicateLocationForm {
    pub entity_uuid: Option<String>,
    pub action: Option<String>,
    pub description: Option<String>,
    pub global_position_lat: Option<f64>,
    pub global_position_lng: Option<f64>,
    pub global_position_acc: Option<f64>,
}

/// A form after typed deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappedForm {
    Spraying(SprayingForm),
    Location(LocationForm),
    DuplicateLocation(DuplicateLocationForm),
}

impl MappedForm {
    #[must_use]
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Spraying(_) => FormKind::Spraying,
            Self::Location(_) => FormKind::Location,
            Self::DuplicateLocation(_) => FormKind::DuplicateLocation,
        }
    }

    #[must_use]
    pub fn entity_uuid(&self) -> Option<&str> {
        match self {
            Self::Spraying(f) => f.entity_uuid.as_deref(),
            Self::Location(f) => f.entity_uuid.as_deref(),
            Self::DuplicateLocation(f) => f.entity_uuid.as_deref(),
        }
    }
}

/// Deserializes markup renderings into typed forms.
///
/// Stateless; one instance can be shared by every processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmarshaller;

impl Unmarshaller {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Deserialize `markup` as the form of the given kind.
    ///
    /// Every child element must be a declared scalar field of the form;
    /// numeric fields must parse as numbers.
    pub fn unmarshal(&self, kind: FormKind, markup: &str) -> Result<MappedForm, MarkupError> {
        let doc = Document::parse(markup)?;
        let root = doc.root_element();
        let expected = kind.root_element();
        if root.tag_name().name() != expected {
            return Err(MarkupError::UnexpectedRoot {
                expected,
                found: root.tag_name().name().to_string(),
            });
        }

        let form = match kind {
            FormKind::Spraying => MappedForm::Spraying(read_spraying(root)?),
            FormKind::Location => MappedForm::Location(read_location(root)?),
            FormKind::DuplicateLocation => {
                MappedForm::DuplicateLocation(read_duplicate_location(root)?)
            }
        };
        Ok(form)
    }
}

fn fields<'a>(root: Node<'a, '_>) -> Result<Vec<(&'a str, String)>, MarkupError> {
    root.children()
        .filter(Node::is_element)
        .map(|child| {
            let name = child.tag_name().name();
            if child.children().any(|n| n.is_element()) {
                return Err(MarkupError::UnexpectedNesting {
                    field: name.to_string(),
                });
            }
            Ok((name, child.text().unwrap_or_default().to_string()))
        })
        .collect()
}

fn number(field: &str, text: String) -> Result<Option<f64>, MarkupError> {
    text.trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MarkupError::InvalidNumber {
            field: field.to_string(),
            value: text,
        })
}

fn unexpected(kind: FormKind, element: &str) -> MarkupError {
    MarkupError::UnexpectedElement {
        form: kind.root_element(),
        element: element.to_string(),
    }
}

fn read_spraying(root: Node<'_, '_>) -> Result<SprayingForm, MarkupError> {
    let mut form = SprayingForm::default();
    for (name, text) in fields(root)? {
        match name {
            "entity_uuid" => form.entity_uuid = Some(text),
            "evaluation" => form.evaluation = Some(text),
            other => return Err(unexpected(FormKind::Spraying, other)),
        }
    }
    Ok(form)
}

fn read_location(root: Node<'_, '_>) -> Result<LocationForm, MarkupError> {
    let mut form = LocationForm::default();
    for (name, text) in fields(root)? {
        let slot = match name {
            "entity_uuid" => &mut form.entity_uuid,
            "entity_ext_id" => &mut form.entity_ext_id,
            "field_worker_uuid" => &mut form.field_worker_uuid,
            "field_worker_ext_id" => &mut form.field_worker_ext_id,
            "collection_date_time" => &mut form.collection_date_time,
            "hierarchy_ext_id" => &mut form.hierarchy_ext_id,
            "hierarchy_uuid" => &mut form.hierarchy_uuid,
            "hierarchy_parent_uuid" => &mut form.hierarchy_parent_uuid,
            "location_ext_id" => &mut form.location_ext_id,
            "location_name" => &mut form.location_name,
            "location_type" => &mut form.location_type,
            "community_name" => &mut form.community_name,
            "community_code" => &mut form.community_code,
            "map_area_name" => &mut form.map_area_name,
            "locality_name" => &mut form.locality_name,
            "sector_name" => &mut form.sector_name,
            "location_building_number" => &mut form.location_building_number,
            "location_floor_number" => &mut form.location_floor_number,
            "description" => &mut form.description,
            "latitude" => {
                form.latitude = number(name, text)?;
                continue;
            }
            "longitude" => {
                form.longitude = number(name, text)?;
                continue;
            }
            other => return Err(unexpected(FormKind::Location, other)),
        };
        *slot = Some(text);
    }
    Ok(form)
}

fn read_duplicate_location(root: Node<'_, '_>) -> Result<DuplicateLocationForm, MarkupError> {
    let mut form = DuplicateLocationForm::default();
    for (name, text) in fields(root)? {
        match name {
            "entity_uuid" => form.entity_uuid = Some(text),
            "action" => form.action = Some(text),
            "description" => form.description = Some(text),
            "global_position_lat" => form.global_position_lat = number(name, text)?,
            "global_position_lng" => form.global_position_lng = number(name, text)?,
            "global_position_acc" => form.global_position_acc = number(name, text)?,
            other => return Err(unexpected(FormKind::DuplicateLocation, other)),
        }
    }
    Ok(form)
}
