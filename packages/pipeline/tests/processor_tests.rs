use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use fieldform_forms::{
    Binding, BindingRegistry, FormData, FormKind, MappedForm, MappingError, Structure,
    Unmarshaller,
};
use fieldform_pipeline::error::Result;
use fieldform_pipeline::{
    BatchSummary, FormHandler, HandlerError, HandlerSet, ItemOutcome, PipelineError,
    ProcessorConfig, Submission, SubmissionProcessor, SubmissionSource,
};

/// In-memory submission source that counts how often each item is marked.
#[derive(Default)]
struct MemorySource {
    submissions: Mutex<Vec<Submission>>,
    marks: Mutex<HashMap<Uuid, usize>>,
}

impl MemorySource {
    fn with(submissions: Vec<Submission>) -> Self {
        Self {
            submissions: Mutex::new(submissions),
            marks: Mutex::default(),
        }
    }

    fn marks(&self, id: Uuid) -> usize {
        self.marks.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    fn all_processed(&self) -> bool {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .all(Submission::is_processed)
    }
}

#[async_trait]
impl SubmissionSource for MemorySource {
    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<Submission>> {
        let submissions = self.submissions.lock().unwrap();
        Ok(submissions
            .iter()
            .filter(|s| !s.is_processed())
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, submission: &Submission) -> Result<()> {
        let mut submissions = self.submissions.lock().unwrap();
        if let Some(s) = submissions.iter_mut().find(|s| s.id == submission.id) {
            s.processed.get_or_insert_with(Utc::now);
        }
        *self.marks.lock().unwrap().entry(submission.id).or_default() += 1;
        Ok(())
    }
}

/// Source whose mark operation always fails.
struct UnmarkableSource(MemorySource);

#[async_trait]
impl SubmissionSource for UnmarkableSource {
    async fn fetch_unprocessed(&self, limit: i64) -> Result<Vec<Submission>> {
        self.0.fetch_unprocessed(limit).await
    }

    async fn mark_processed(&self, _submission: &Submission) -> Result<()> {
        Err(PipelineError::InvalidInput("store is read-only".into()))
    }
}

#[derive(Default)]
struct RecordingHandler {
    forms: Mutex<Vec<MappedForm>>,
}

#[async_trait]
impl FormHandler for RecordingHandler {
    async fn process_form(&self, form: &MappedForm) -> std::result::Result<(), HandlerError> {
        self.forms.lock().unwrap().push(form.clone());
        Ok(())
    }
}

struct FailingHandler;

#[async_trait]
impl FormHandler for FailingHandler {
    async fn process_form(&self, _form: &MappedForm) -> std::result::Result<(), HandlerError> {
        Err("entity does not exist".into())
    }
}

struct SlowHandler;

#[async_trait]
impl FormHandler for SlowHandler {
    async fn process_form(&self, _form: &MappedForm) -> std::result::Result<(), HandlerError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

struct PanickingHandler;

#[async_trait]
impl FormHandler for PanickingHandler {
    async fn process_form(&self, _form: &MappedForm) -> std::result::Result<(), HandlerError> {
        panic!("handler bug");
    }
}

fn rejecting_map(_: &FormData) -> std::result::Result<Structure, MappingError> {
    Err(MappingError::Rejected("unsupported form version".into()))
}

fn submission(binding: Option<&str>, data: serde_json::Value) -> Submission {
    let id = Uuid::new_v4();
    Submission {
        id,
        instance_id: format!("uuid:{id}"),
        form_id: "test_form".into(),
        form_version: None,
        form_binding: binding.map(str::to_string),
        device_id: None,
        json: json!({ "data": data }).to_string(),
        collected: None,
        submitted: Utc::now(),
        processed: None,
    }
}

fn processor<S: SubmissionSource>(
    source: S,
    handlers: HandlerSet,
) -> SubmissionProcessor<S> {
    let registry = BindingRegistry::standard().with(Binding::new(
        "rejecting",
        FormKind::Spraying,
        rejecting_map,
    ));
    SubmissionProcessor::new(
        source,
        Arc::new(registry),
        Unmarshaller::new(),
        handlers,
        ProcessorConfig::default().with_dispatch_timeout(Duration::from_millis(200)),
    )
}

fn all_kinds(handler: Arc<dyn FormHandler>) -> HandlerSet {
    HandlerSet::new()
        .with(FormKind::Spraying, handler.clone())
        .with(FormKind::Location, handler.clone())
        .with(FormKind::DuplicateLocation, handler)
}

#[tokio::test]
async fn test_unrecognized_binding_and_failing_mapping() {
    let unknown = submission(Some("household_census"), json!({"entityUuid": "a"}));
    let rejected = submission(Some("rejecting"), json!({"entityUuid": "b"}));
    let ids = [unknown.id, rejected.id];

    let recorder = Arc::new(RecordingHandler::default());
    let p = processor(MemorySource::with(vec![unknown, rejected]), all_kinds(recorder.clone()));

    let summary = p.run_batch(10).await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert!(p.source().all_processed());
    for id in ids {
        assert_eq!(p.source().marks(id), 1);
    }
    assert!(recorder.forms.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_location_is_dispatched_as_typed_form() {
    let s = submission(
        Some("location"),
        json!({
            "meta": {"instanceID": "uuid:loc"},
            "entityUuid": "loc-1",
            "locationName": "Escola & Posto",
            "location": "-25.9655 32.5832 45.0 8.0"
        }),
    );

    let recorder = Arc::new(RecordingHandler::default());
    let p = processor(MemorySource::with(vec![s]), all_kinds(recorder.clone()));

    let summary = p.run_batch(10).await.unwrap();
    assert_eq!(
        summary,
        BatchSummary {
            attempted: 1,
            failed: 0,
            skipped: 0,
            dispatched: 1,
        }
    );

    let forms = recorder.forms.lock().unwrap();
    let MappedForm::Location(form) = &forms[0] else {
        panic!("expected a location form, got {:?}", forms[0]);
    };
    assert_eq!(form.entity_uuid.as_deref(), Some("loc-1"));
    assert_eq!(form.location_name.as_deref(), Some("Escola & Posto"));
    assert_eq!(form.latitude, Some(-25.9655));
    assert_eq!(form.longitude, Some(32.5832));
    assert_eq!(form.description, None);
}

#[tokio::test]
async fn test_handler_failure_does_not_affect_later_items() {
    let first = submission(Some("spraying"), json!({"entityUuid": "a"}));
    let second = submission(Some("location"), json!({"entityUuid": "b"}));

    let recorder = Arc::new(RecordingHandler::default());
    let handlers = HandlerSet::new()
        .with(FormKind::Spraying, Arc::new(FailingHandler))
        .with(FormKind::Location, recorder.clone());
    let p = processor(MemorySource::with(vec![first, second]), handlers);

    let summary = p.run_batch(10).await.unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.dispatched, 1);
    assert_eq!(recorder.forms.lock().unwrap().len(), 1);
    assert!(p.source().all_processed());
}

#[tokio::test]
async fn test_slow_handler_times_out() {
    let s = submission(Some("spraying"), json!({"entityUuid": "a"}));
    let p = processor(
        MemorySource::with(vec![s.clone()]),
        HandlerSet::new().with(FormKind::Spraying, Arc::new(SlowHandler)),
    );

    let outcome = p.process_submission(&s).await;
    assert!(matches!(
        outcome,
        ItemOutcome::Failed { ref reason } if reason.contains("did not finish")
    ));

    let summary = p.run_batch(10).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert!(p.source().all_processed());
}

#[tokio::test]
async fn test_panicking_handler_is_isolated() {
    let bad = submission(Some("spraying"), json!({"entityUuid": "a"}));
    let good = submission(Some("location"), json!({"entityUuid": "b"}));

    let recorder = Arc::new(RecordingHandler::default());
    let handlers = HandlerSet::new()
        .with(FormKind::Spraying, Arc::new(PanickingHandler))
        .with(FormKind::Location, recorder.clone());
    let p = processor(MemorySource::with(vec![bad, good]), handlers);

    let summary = p.run_batch(10).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.dispatched, 1);
    assert!(p.source().all_processed());
}

#[tokio::test]
async fn test_invalid_payloads_fail() {
    let mut not_json = submission(Some("spraying"), json!({}));
    not_json.json = "{not json".into();
    let mut no_data = submission(Some("spraying"), json!({}));
    no_data.json = json!({"meta": {}}).to_string();
    let bad_number = submission(
        Some("duplicate_location"),
        json!({"entityUuid": "x", "globalPosition": "north east"}),
    );

    let p = processor(
        MemorySource::with(vec![not_json, no_data, bad_number]),
        all_kinds(Arc::new(RecordingHandler::default())),
    );

    let summary = p.run_batch(10).await.unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.failed, 3);
    assert!(p.source().all_processed());
}

#[tokio::test]
async fn test_missing_binding_tag_is_skipped() {
    let s = submission(None, json!({"entityUuid": "a"}));
    let p = processor(MemorySource::with(vec![s.clone()]), HandlerSet::new());

    assert_eq!(
        p.process_submission(&s).await,
        ItemOutcome::Skipped { binding: None }
    );
}

#[tokio::test]
async fn test_missing_handler_fails() {
    let s = submission(Some("spraying"), json!({"entityUuid": "a"}));
    let p = processor(MemorySource::with(vec![s.clone()]), HandlerSet::new());

    let outcome = p.process_submission(&s).await;
    assert!(matches!(
        outcome,
        ItemOutcome::Failed { ref reason } if reason.contains("no handler registered")
    ));
}

#[tokio::test]
async fn test_batch_size_bounds_each_run() {
    let submissions: Vec<_> = (0..5)
        .map(|i| submission(Some("spraying"), json!({"entityUuid": format!("e{i}")})))
        .collect();
    let recorder = Arc::new(RecordingHandler::default());
    let p = processor(MemorySource::with(submissions), all_kinds(recorder.clone()));

    assert_eq!(p.run_batch(2).await.unwrap().attempted, 2);
    assert_eq!(p.run_batch(2).await.unwrap().attempted, 2);
    assert_eq!(p.run_batch(2).await.unwrap().attempted, 1);
    assert_eq!(p.run_batch(2).await.unwrap(), BatchSummary::default());
    assert_eq!(recorder.forms.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn test_non_positive_batch_size_takes_one() {
    let submissions: Vec<_> = (0..3)
        .map(|i| submission(Some("spraying"), json!({"entityUuid": format!("e{i}")})))
        .collect();
    let p = processor(
        MemorySource::with(submissions),
        all_kinds(Arc::new(RecordingHandler::default())),
    );

    assert_eq!(p.run_batch(-1).await.unwrap().attempted, 1);
    assert_eq!(p.run_batch(0).await.unwrap().attempted, 1);
}

#[tokio::test]
async fn test_mark_failure_is_counted() {
    let s = submission(Some("spraying"), json!({"entityUuid": "a"}));
    let p = processor(
        UnmarkableSource(MemorySource::with(vec![s])),
        all_kinds(Arc::new(RecordingHandler::default())),
    );

    let summary = p.run_batch(10).await.unwrap();
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.dispatched, 0);
}
