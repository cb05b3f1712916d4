//! Handler capabilities that receive typed forms.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use fieldform_forms::{FormKind, MappedForm};

use crate::error::HandlerError;

/// Consumes a fully typed form.
///
/// The return value carries no data; an error sends the submission down
/// the per-item failure path.
#[async_trait]
pub trait FormHandler: Send + Sync {
    async fn process_form(&self, form: &MappedForm) -> Result<(), HandlerError>;
}

/// Handlers keyed by the form they accept.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<FormKind, Arc<dyn FormHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: FormKind, handler: Arc<dyn FormHandler>) {
        self.handlers.insert(kind, handler);
    }

    pub fn with(mut self, kind: FormKind, handler: Arc<dyn FormHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    pub fn get(&self, kind: FormKind) -> Option<&Arc<dyn FormHandler>> {
        self.handlers.get(&kind)
    }

    /// A set with [`LoggingHandler`] registered for every form kind.
    pub fn logging() -> Self {
        let handler: Arc<dyn FormHandler> = Arc::new(LoggingHandler);
        [
            FormKind::Spraying,
            FormKind::Location,
            FormKind::DuplicateLocation,
        ]
        .into_iter()
        .fold(Self::new(), |set, kind| set.with(kind, handler.clone()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = FormKind> + '_ {
        self.handlers.keys().copied()
    }
}

/// Handler that only logs what it receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

#[async_trait]
impl FormHandler for LoggingHandler {
    async fn process_form(&self, form: &MappedForm) -> Result<(), HandlerError> {
        tracing::info!(
            form = %form.kind(),
            entity_uuid = form.entity_uuid().unwrap_or("-"),
            "form received"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_set_covers_all_kinds() {
        let set = HandlerSet::logging();
        let mut kinds: Vec<_> = set.kinds().map(|k| k.root_element()).collect();
        kinds.sort_unstable();
        assert_eq!(
            kinds,
            vec!["duplicateLocationForm", "locationForm", "sprayingForm"]
        );
    }

    #[test]
    fn test_get_missing_kind() {
        assert!(HandlerSet::new().get(FormKind::Location).is_none());
    }

    #[tokio::test]
    async fn test_logging_handler_accepts_forms() {
        let form = MappedForm::Spraying(fieldform_forms::SprayingForm::default());
        assert!(LoggingHandler.process_form(&form).await.is_ok());
    }
}
