//! Built-in bindings for forms submitted from the collection app.
//!
//! Each mapping copies camelCase source fields to the snake_case fields of
//! the target form. Missing source fields stay absent; the coordinate fields
//! exist only when the governing position string was collected.

use crate::binding::Binding;
use crate::coordinates::Coordinates;
use crate::data::FormData;
use crate::error::MappingError;
use crate::forms::FormKind;
use crate::value::Structure;

/// The bindings registered by [`crate::BindingRegistry::standard`].
#[must_use]
pub fn standard_bindings() -> Vec<Binding> {
    vec![
        Binding::new("spraying", FormKind::Spraying, map_spraying),
        Binding::new("location", FormKind::Location, map_location),
        Binding::new(
            "duplicate_location",
            FormKind::DuplicateLocation,
            map_duplicate_location,
        ),
    ]
}

/// Copy `(target, source)` field pairs into `form`.
fn copy_fields(
    form: &mut Structure,
    data: &FormData,
    pairs: &[(&str, &str)],
) -> Result<(), MappingError> {
    for (target, source) in pairs {
        form.set(*target, data.field(source)?);
    }
    Ok(())
}

pub fn map_spraying(data: &FormData) -> Result<Structure, MappingError> {
    let mut form = Structure::new();
    copy_fields(
        &mut form,
        data,
        &[("entity_uuid", "entityUuid"), ("evaluation", "evaluation")],
    )?;
    Ok(Structure::new().with(FormKind::Spraying.root_element(), form))
}

const LOCATION_FIELDS: &[(&str, &str)] = &[
    ("entity_uuid", "entityUuid"),
    ("entity_ext_id", "entityExtId"),
    ("field_worker_uuid", "fieldWorkerUuid"),
    ("field_worker_ext_id", "fieldWorkerExtId"),
    ("collection_date_time", "collectionDateTime"),
    ("hierarchy_ext_id", "hierarchyExtId"),
    ("hierarchy_uuid", "hierarchyUuid"),
    ("hierarchy_parent_uuid", "hierarchyParentUuid"),
    ("location_ext_id", "locationExtId"),
    ("location_name", "locationName"),
    ("location_type", "locationType"),
    ("community_name", "communityName"),
    ("community_code", "communityCode"),
    ("map_area_name", "mapAreaName"),
    ("locality_name", "localityName"),
    ("sector_name", "sectorName"),
    ("location_building_number", "locationBuildingNumber"),
    ("location_floor_number", "locationFloorNumber"),
    ("description", "description"),
];

pub fn map_location(data: &FormData) -> Result<Structure, MappingError> {
    let mut form = Structure::new();
    copy_fields(&mut form, data, LOCATION_FIELDS)?;

    if let Some(position) = data.text("location")? {
        let gps = Coordinates::parse(position);
        form.set("latitude", gps.latitude_value());
        form.set("longitude", gps.longitude_value());
    }

    Ok(Structure::new().with(FormKind::Location.root_element(), form))
}

pub fn map_duplicate_location(data: &FormData) -> Result<Structure, MappingError> {
    let mut form = Structure::new();
    copy_fields(
        &mut form,
        data,
        &[
            ("entity_uuid", "entityUuid"),
            ("action", "action"),
            ("description", "description"),
        ],
    )?;

    if let Some(position) = data.text("globalPosition")? {
        let gps = Coordinates::parse(position);
        form.set("global_position_lat", gps.latitude_value());
        form.set("global_position_lng", gps.longitude_value());
        form.set("global_position_acc", gps.accuracy_value());
    }

    Ok(Structure::new().with(FormKind::DuplicateLocation.root_element(), form))
}
