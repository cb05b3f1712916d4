//! Export of records into relational tables provisioned on demand.

pub mod schema;
pub mod store;

pub use schema::{build_ddl, build_insert, ColumnValue, ExportColumn, ExportPlan, ExportRecord};
pub use store::{export_record, export_submission};
