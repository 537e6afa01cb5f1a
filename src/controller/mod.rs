//! UI-side orchestration
//!
//! The controller holds the form, sends parse and pick requests to the page
//! context, applies `elementSelected` pushes back onto the form and decides
//! what the user sees: a status line, a stats line, the result table and
//! whether exports are available.

pub mod state;

use log::{info, warn};
use serde::{Deserialize, Serialize};

pub use state::{FormState, StateStore};

use crate::context::{ContextTransport, Push, Request, Response};
use crate::error::{PickerError, Result};
use crate::export::{self, ExportFormat};
use crate::extractor::{Field, ResultSet};

const MISSING_INPUT: &str = "Please enter base selector and at least one field";
const UNREACHABLE: &str = "Error: Cannot access page. Please refresh the page and try again.";

/// One-line message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

impl Status {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Which form slot a pick fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickTarget {
    Base,
    Field(usize),
}

/// Last successful extraction together with the fields it was run with
#[derive(Debug, Clone)]
struct Extraction {
    results: ResultSet,
    fields: Vec<Field>,
}

pub struct Controller<T: ContextTransport> {
    transport: T,
    store: Option<StateStore>,
    form: FormState,
    status: Option<Status>,
    stats: Option<String>,
    extraction: Option<Extraction>,
    pending_pick: Option<PickTarget>,
}

impl<T: ContextTransport> Controller<T> {
    /// Controller with an empty, unpersisted form
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            store: None,
            form: FormState::default(),
            status: None,
            stats: None,
            extraction: None,
            pending_pick: None,
        }
    }

    /// Controller whose form is restored from (and saved to) `store`
    pub fn with_store(transport: T, store: StateStore) -> Result<Self> {
        let form = store.load()?;
        let mut controller = Self::new(transport);
        controller.form = form;
        controller.store = Some(store);
        Ok(controller)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn set_form(&mut self, form: FormState) {
        self.form = form;
    }

    pub fn set_base_selector(&mut self, base_selector: impl Into<String>) {
        self.form.base_selector = base_selector.into();
    }

    /// Append a field row, returning its index
    pub fn add_field(&mut self, field: Field) -> usize {
        self.form.fields.push(field);
        self.form.fields.len() - 1
    }

    pub fn remove_field(&mut self, index: usize) -> Option<Field> {
        if index < self.form.fields.len() {
            Some(self.form.fields.remove(index))
        } else {
            None
        }
    }

    /// Persist the form, if a store is attached
    pub fn save_form(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save(&self.form),
            None => Ok(()),
        }
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn stats(&self) -> Option<&str> {
        self.stats.as_deref()
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.extraction.as_ref().map(|e| &e.results)
    }

    /// Fields used for the current results (the table header)
    pub fn result_fields(&self) -> Option<&[Field]> {
        self.extraction.as_ref().map(|e| e.fields.as_slice())
    }

    pub fn exports_enabled(&self) -> bool {
        self.extraction.is_some()
    }

    pub fn pending_pick(&self) -> Option<PickTarget> {
        self.pending_pick
    }

    /// Record the failure for the user and drop stale results
    fn fail(&mut self, error: PickerError) -> PickerError {
        let message = match &error {
            PickerError::ContextUnreachable(_) => UNREACHABLE.to_string(),
            PickerError::MissingInput(message) => message.clone(),
            other => format!("Error: {}", other),
        };
        warn!("{}", message);
        self.status = Some(Status::error(message));
        self.stats = None;
        self.extraction = None;
        error
    }

    /// Run the extraction for the current form
    ///
    /// Previous results are cleared first, so a failure never leaves stale data behind.
    pub async fn parse(&mut self) -> Result<usize> {
        self.status = None;
        self.stats = None;
        self.extraction = None;

        let (base_selector, fields) = self.form.submission();
        if base_selector.is_empty() || fields.is_empty() {
            return Err(self.fail(PickerError::MissingInput(MISSING_INPUT.to_string())));
        }

        self.status = Some(Status::info("Parsing..."));
        let request = Request::ParseData {
            base_selector,
            fields: fields.clone(),
        };

        match self.transport.send(request).await {
            Ok(Response::Parsed { count, data, .. }) => {
                info!("Parsed {} items", count);
                self.status = Some(Status::info("Successfully parsed data!"));
                self.stats = Some(format!("Found {} items", count));
                self.extraction = Some(Extraction {
                    results: ResultSet::new(data),
                    fields,
                });
                Ok(count)
            }
            Ok(Response::Error { error }) => Err(self.fail(PickerError::Page(error))),
            Ok(Response::Status { status }) => Err(self.fail(PickerError::Page(format!(
                "Unexpected reply: {}",
                status
            )))),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Ask the page to start a pick for `target`
    ///
    /// Field picks are relative to the current base selector, when there is one.
    pub async fn start_picking(&mut self, target: PickTarget) -> Result<()> {
        let base_selector = match target {
            PickTarget::Base => None,
            PickTarget::Field(index) => {
                if index >= self.form.fields.len() {
                    return Err(self.fail(PickerError::MissingInput(format!(
                        "No field row {}",
                        index + 1
                    ))));
                }
                Some(self.form.base_selector.trim().to_string()).filter(|base| !base.is_empty())
            }
        };

        match self
            .transport
            .send(Request::StartPicking { base_selector })
            .await
        {
            Ok(Response::Status { .. }) => {
                self.pending_pick = Some(target);
                self.status = Some(Status::info(match target {
                    PickTarget::Base => "Click the base element on the page".to_string(),
                    PickTarget::Field(index) => {
                        format!("Click the element for field {} on the page", index + 1)
                    }
                }));
                Ok(())
            }
            Ok(Response::Error { error }) => Err(self.fail(PickerError::Page(error))),
            Ok(Response::Parsed { .. }) => {
                Err(self.fail(PickerError::Page("Unexpected reply to startPicking".into())))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn stop_picking(&mut self) -> Result<()> {
        self.pending_pick = None;
        match self.transport.send(Request::StopPicking).await {
            Ok(Response::Error { error }) => Err(self.fail(PickerError::Page(error))),
            Ok(_) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Apply a push from the page. Returns the slot that was filled, if any.
    pub fn apply_push(&mut self, push: Push) -> Result<Option<PickTarget>> {
        let Push::ElementSelected { selector } = push;

        let Some(target) = self.pending_pick.take() else {
            warn!("Ignoring selection {} with no pick in progress", selector);
            return Ok(None);
        };

        match target {
            PickTarget::Base => self.form.base_selector = selector.clone(),
            PickTarget::Field(index) => match self.form.fields.get_mut(index) {
                Some(field) => field.selector = selector.clone(),
                None => {
                    warn!("Field row {} was removed before the pick completed", index + 1);
                    return Ok(None);
                }
            },
        }

        self.status = Some(Status::info(format!("Selected: {}", selector)));
        self.save_form()?;
        Ok(Some(target))
    }

    /// Render the current results
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let extraction = self.extraction.as_ref().ok_or_else(|| {
            PickerError::MissingInput("Nothing to export, parse the page first".to_string())
        })?;
        export::render(format, &extraction.results, &extraction.fields)
    }
}
