//! Submission controller: the reducer that owns a mounted form.
//!
//! ```text
//!            Submit (valid)                 SubmissionSucceeded
//!   Idle ─────────────────────► Submitting ───────────────────► Idle
//!    ▲  Submit while Submitting:     │                          (outcome: Succeeded)
//!    │  dropped                      │ SubmissionFailed
//!    └───────────────────────────────┘ (outcome: Failed, submit re-enabled)
//! ```
//!
//! The guard check and the transition to `Submitting` both happen inside
//! [`FormReducer::reduce`], which the store runs under its state write lock,
//! so two concurrent submits can never both pass the guard.

use crate::builder::BuiltForm;
use crate::config::FormConfig;
use crate::dom::{ControlKind, Document, Element, NodeId, ScrollBehavior};
use crate::error::SubmissionError;
use crate::payload::{generate_payload, Payload};
use crate::telemetry::{self, FORM_ERROR, FORM_SUBMIT};
use crate::validation;
use dynform_core::environment::{Clock, HttpClient, Navigator, Telemetry};
use dynform_core::{smallvec, Effect, Reducer, SmallVec};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Whether a submission is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionPhase {
    /// Ready to submit
    #[default]
    Idle,
    /// A `POST` is in flight; further submits are dropped
    Submitting,
}

/// How the most recent submit attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The endpoint accepted the payload
    Succeeded,
    /// The submission failed and was recovered
    Failed(SubmissionError),
    /// Validation stopped the submit before anything was sent
    Invalid {
        /// The control that received focus
        control: NodeId,
    },
}

/// State of a mounted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    /// Page document containing the form
    pub document: Document,
    /// Mount point the form replaced the content of
    pub block: NodeId,
    /// The `form` element
    pub form: NodeId,
    /// Submission target
    pub action: String,
    /// Redirect target after success
    pub confirmation: Option<String>,
    /// In-flight flag
    pub phase: SubmissionPhase,
    /// Result of the last submit attempt
    pub last_outcome: Option<SubmissionOutcome>,
    /// Payload of the last submission that was sent
    pub last_payload: Option<Payload>,
    /// Number of submit attempts that have settled, invalid ones included
    pub settled: u64,
}

impl FormState {
    /// State for a freshly built and mounted form
    #[must_use]
    pub fn new(document: Document, block: NodeId, built: BuiltForm) -> Self {
        Self {
            document,
            block,
            form: built.form,
            action: built.action,
            confirmation: built.confirmation,
            phase: SubmissionPhase::Idle,
            last_outcome: None,
            last_payload: None,
            settled: 0,
        }
    }

    /// `true` while a submission is in flight
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.phase == SubmissionPhase::Submitting
    }

    /// Submit controls of the form
    #[must_use]
    pub fn submit_controls(&self) -> Vec<NodeId> {
        self.controls_where(|e| e.control_kind() == Some(ControlKind::Submit))
    }

    /// First control named `name`
    #[must_use]
    pub fn control(&self, name: &str) -> Option<&Element> {
        self.document
            .form_controls(self.form)
            .into_iter()
            .filter_map(|id| self.document.element(id))
            .find(|e| e.name() == name)
    }

    /// Payload the form would submit right now
    #[must_use]
    pub fn payload(&self) -> Payload {
        generate_payload(&self.document, self.form)
    }

    /// Current markup of the mount point's content
    #[must_use]
    pub fn block_html(&self) -> String {
        self.document.inner_html(self.block)
    }

    fn controls_where(&self, predicate: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.document
            .form_controls(self.form)
            .into_iter()
            .filter(|&id| self.document.element(id).is_some_and(&predicate))
            .collect()
    }

    fn settle(&mut self, outcome: SubmissionOutcome) {
        self.last_outcome = Some(outcome);
        self.settled += 1;
    }

    fn set_submit_disabled(&mut self, disabled: bool) {
        for id in self.submit_controls() {
            if let Some(control) = self.document.element_mut(id) {
                control.set_disabled(disabled);
            }
        }
    }
}

/// Actions a mounted form reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// User typed into the value-bearing control named `name`
    SetValue {
        /// Control name
        name: String,
        /// New value
        value: String,
    },
    /// User toggled the radio or checkbox `name`=`value`
    SetChecked {
        /// Control name
        name: String,
        /// Control value identifying the option
        value: String,
        /// New checkedness
        checked: bool,
    },
    /// User submitted the form
    Submit,
    /// The endpoint accepted the submission
    SubmissionSucceeded,
    /// The submission failed
    SubmissionFailed {
        /// Why
        error: SubmissionError,
    },
}

/// Collaborators of the submission controller.
#[derive(Clone)]
pub struct FormEnvironment {
    /// Transport for the `POST`
    pub http: Arc<dyn HttpClient>,
    /// Telemetry sink
    pub telemetry: Arc<dyn Telemetry>,
    /// Browsing context for the confirmation redirect
    pub navigator: Arc<dyn Navigator>,
    /// Timestamps telemetry
    pub clock: Arc<dyn Clock>,
    /// `source` of telemetry events
    pub telemetry_source: String,
}

impl FormEnvironment {
    /// Assemble an environment; the telemetry source comes from `config`
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        telemetry: Arc<dyn Telemetry>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        config: &FormConfig,
    ) -> Self {
        Self {
            http,
            telemetry,
            navigator,
            clock,
            telemetry_source: config.telemetry_source.clone(),
        }
    }
}

/// Reducer for [`FormState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FormReducer;

impl FormReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn submit(
        state: &mut FormState,
        env: &FormEnvironment,
    ) -> SmallVec<[Effect<FormAction>; 4]> {
        if let Some(invalid) = validation::first_invalid(&state.document, state.form) {
            debug!(control = invalid.index(), "Form is invalid; focusing first invalid control");
            state.document.focus(invalid);
            state.document.scroll_into_view(invalid, ScrollBehavior::Smooth);
            // the in-flight submission still owns the outcome
            if !state.is_submitting() {
                state.settle(SubmissionOutcome::Invalid { control: invalid });
            }
            return smallvec![Effect::None];
        }

        if state.is_submitting() {
            debug!(action = %state.action, "Submission already in flight; dropping submit");
            metrics::counter!("dynform.submissions.dropped").increment(1);
            return smallvec![Effect::None];
        }

        state.phase = SubmissionPhase::Submitting;
        state.set_submit_disabled(true);

        let payload = state.payload();
        debug!(payload = ?payload, action = %state.action, "Submitting payload");
        metrics::counter!("dynform.submissions.started").increment(1);
        let body = payload.to_body();
        state.last_payload = Some(payload);

        let env = env.clone();
        let action = state.action.clone();
        let confirmation = state.confirmation.clone();
        smallvec![Effect::future(async move {
            Some(perform_submission(env, action, confirmation, body).await)
        })]
    }

    fn set_value(state: &mut FormState, name: &str, value: String) {
        let targets = state.controls_where(|e| {
            e.name() == name && matches!(e.control_kind(), Some(ControlKind::Text | ControlKind::Other))
        });
        let Some(&target) = targets.first() else {
            warn!(name, "No value control with this name");
            return;
        };
        if let Some(control) = state.document.element_mut(target) {
            if control.disabled() {
                debug!(name, "Ignoring input on disabled control");
            } else {
                control.set_value(value);
            }
        }
    }

    fn set_checked(state: &mut FormState, name: &str, value: &str, checked: bool) {
        let Some(target) = state
            .controls_where(|e| {
                e.name() == name
                    && e.value() == value
                    && matches!(e.control_kind(), Some(ControlKind::Radio | ControlKind::Checkbox))
            })
            .first()
            .copied()
        else {
            warn!(name, value, "No choice control with this name and value");
            return;
        };

        let Some(control) = state.document.element(target) else {
            return;
        };
        if control.disabled() {
            debug!(name, value, "Ignoring toggle on disabled control");
            return;
        }

        if checked && control.control_kind() == Some(ControlKind::Radio) {
            let group = state.controls_where(|e| {
                e.name() == name && e.control_kind() == Some(ControlKind::Radio)
            });
            for radio in group {
                if let Some(radio) = state.document.element_mut(radio) {
                    radio.set_checked(false);
                }
            }
        }
        if let Some(control) = state.document.element_mut(target) {
            control.set_checked(checked);
        }
    }
}

impl Reducer for FormReducer {
    type State = FormState;
    type Action = FormAction;
    type Environment = FormEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FormAction::SetValue { name, value } => {
                Self::set_value(state, &name, value);
                smallvec![Effect::None]
            },

            FormAction::SetChecked {
                name,
                value,
                checked,
            } => {
                Self::set_checked(state, &name, &value, checked);
                smallvec![Effect::None]
            },

            FormAction::Submit => Self::submit(state, env),

            FormAction::SubmissionSucceeded => {
                info!(action = %state.action, "Form submitted");
                metrics::counter!("dynform.submissions.succeeded").increment(1);
                state.settle(SubmissionOutcome::Succeeded);
                state.phase = SubmissionPhase::Idle;
                smallvec![Effect::None]
            },

            FormAction::SubmissionFailed { error } => {
                error!(action = %state.action, %error, "Form submission failed");
                metrics::counter!("dynform.submissions.failed").increment(1);
                state.set_submit_disabled(false);
                state.settle(SubmissionOutcome::Failed(error));
                state.phase = SubmissionPhase::Idle;
                smallvec![Effect::None]
            },
        }
    }
}

/// `POST` the body, report telemetry, redirect on success.
///
/// Always resolves to the action that settles the submission. A panic in the
/// network step is reported as a failure; a panic while reporting or
/// redirecting settles as [`SubmissionError::Aborted`] without a report.
async fn perform_submission(
    env: FormEnvironment,
    action: String,
    confirmation: Option<String>,
    body: Value,
) -> FormAction {
    AssertUnwindSafe(submit_and_report(&env, &action, confirmation, body))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let error = SubmissionError::Aborted(panic_message(panic.as_ref()));
            warn!(action = %action, %error, "Submission panicked after the network step");
            FormAction::SubmissionFailed { error }
        })
}

async fn submit_and_report(
    env: &FormEnvironment,
    action: &str,
    confirmation: Option<String>,
    body: Value,
) -> FormAction {
    let result = AssertUnwindSafe(post(env.http.as_ref(), action, body))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(SubmissionError::Aborted(panic_message(panic.as_ref()))));

    match result {
        Ok(()) => {
            env.telemetry.report(telemetry::event(
                FORM_SUBMIT,
                &env.telemetry_source,
                action,
                env.clock.as_ref(),
            ));
            if let Some(confirmation) = confirmation {
                env.navigator.navigate(&confirmation);
            }
            FormAction::SubmissionSucceeded
        },
        Err(error) => {
            env.telemetry.report(telemetry::event(
                FORM_ERROR,
                &env.telemetry_source,
                error.message(),
                env.clock.as_ref(),
            ));
            FormAction::SubmissionFailed { error }
        },
    }
}

async fn post(http: &dyn HttpClient, action: &str, body: Value) -> Result<(), SubmissionError> {
    let response = http.post_json(action.to_string(), body).await?;
    if response.is_success() {
        Ok(())
    } else {
        Err(SubmissionError::Rejected {
            status: response.status,
            body: response.body,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "submission panicked".to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::dom::ElementBuilder;
    use dynform_testing::{
        assertions, test_clock, MockHttpClient, RecordingNavigator, RecordingTelemetry,
        ReducerTest,
    };

    fn environment() -> FormEnvironment {
        FormEnvironment::new(
            Arc::new(MockHttpClient::new()),
            Arc::new(RecordingTelemetry::new()),
            Arc::new(RecordingNavigator::new()),
            Arc::new(test_clock()),
            &FormConfig::default(),
        )
    }

    fn state_with(fields: Vec<ElementBuilder>) -> FormState {
        let mut document = Document::new();
        let block = document.insert(ElementBuilder::new("div").attr("class", "form"));
        document.append_child(document.body(), block).unwrap();
        let form = fields
            .into_iter()
            .fold(ElementBuilder::new("form"), ElementBuilder::child);
        let form = document.insert(form);
        document.replace_children(block, &[form]).unwrap();
        FormState::new(
            document,
            block,
            BuiltForm {
                form,
                action: "/forms/contact".to_string(),
                confirmation: None,
                pathname: "/forms/contact.json".to_string(),
                field_count: 0,
            },
        )
    }

    fn contact_form() -> FormState {
        state_with(vec![
            ElementBuilder::new("input")
                .attr("type", "email")
                .attr("name", "email")
                .flag_if("required", true),
            ElementBuilder::new("input").attr("type", "radio").attr("name", "size").attr("value", "s"),
            ElementBuilder::new("input").attr("type", "radio").attr("name", "size").attr("value", "m"),
            ElementBuilder::new("button").attr("type", "submit").text("Send"),
        ])
    }

    fn filled_contact_form() -> FormState {
        let mut state = contact_form();
        FormReducer::set_value(&mut state, "email", "a@example.com".to_string());
        state
    }

    #[test]
    fn submit_enters_submitting_and_disables_button() {
        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(filled_contact_form())
            .when_action(FormAction::Submit)
            .then_state(|state| {
                assert!(state.is_submitting());
                let button = state.submit_controls()[0];
                assert!(state.document.element(button).unwrap().disabled());
                assert_eq!(
                    state.last_payload.as_ref().unwrap().get("email"),
                    Some("a@example.com")
                );
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn submit_while_submitting_is_dropped() {
        let mut state = filled_contact_form();
        state.phase = SubmissionPhase::Submitting;

        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(state)
            .when_action(FormAction::Submit)
            .then_state(|state| {
                assert!(state.is_submitting());
                assert_eq!(state.last_payload, None);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn invalid_submit_focuses_first_invalid_control() {
        let state = contact_form();
        let email = state.document.query(state.form, |e| e.name() == "email").unwrap();

        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(state)
            .when_action(FormAction::Submit)
            .then_state(move |state| {
                assert!(!state.is_submitting());
                assert_eq!(state.document.active_element(), Some(email));
                assert_eq!(
                    state.document.last_scroll().map(|s| (s.node, s.behavior)),
                    Some((email, ScrollBehavior::Smooth))
                );
                assert_eq!(
                    state.last_outcome,
                    Some(SubmissionOutcome::Invalid { control: email })
                );
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn invalid_submit_while_submitting_keeps_outcome() {
        let mut state = contact_form();
        state.phase = SubmissionPhase::Submitting;
        state.last_outcome = Some(SubmissionOutcome::Succeeded);
        state.settled = 1;
        let email = state.document.query(state.form, |e| e.name() == "email").unwrap();

        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(state)
            .when_action(FormAction::Submit)
            .then_state(move |state| {
                assert!(state.is_submitting());
                assert_eq!(state.document.active_element(), Some(email));
                assert_eq!(state.last_outcome, Some(SubmissionOutcome::Succeeded));
                assert_eq!(state.settled, 1);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn failure_re_enables_submit_and_clears_flag() {
        let mut state = filled_contact_form();
        state.phase = SubmissionPhase::Submitting;
        state.set_submit_disabled(true);
        let error = SubmissionError::Rejected {
            status: 400,
            body: "bad field".to_string(),
        };

        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(state)
            .when_action(FormAction::SubmissionFailed {
                error: error.clone(),
            })
            .then_state(move |state| {
                assert!(!state.is_submitting());
                let button = state.submit_controls()[0];
                assert!(!state.document.element(button).unwrap().disabled());
                assert_eq!(state.last_outcome, Some(SubmissionOutcome::Failed(error)));
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn success_clears_flag_and_keeps_submit_disabled() {
        let mut state = filled_contact_form();
        state.phase = SubmissionPhase::Submitting;
        state.set_submit_disabled(true);

        ReducerTest::new(FormReducer::new())
            .with_env(environment())
            .given_state(state)
            .when_action(FormAction::SubmissionSucceeded)
            .then_state(|state| {
                assert!(!state.is_submitting());
                assert_eq!(state.last_outcome, Some(SubmissionOutcome::Succeeded));
                let button = state.submit_controls()[0];
                assert!(state.document.element(button).unwrap().disabled());
            })
            .run();
    }

    #[test]
    fn checking_a_radio_unchecks_its_group() {
        let mut state = contact_form();
        let reducer = FormReducer::new();
        let env = environment();
        for value in ["s", "m"] {
            let _ = reducer.reduce(
                &mut state,
                FormAction::SetChecked {
                    name: "size".into(),
                    value: value.into(),
                    checked: true,
                },
                &env,
            );
        }
        assert_eq!(state.payload().get("size"), Some("m"));
        let checked = state.controls_where(Element::checked);
        assert_eq!(checked.len(), 1);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut state = state_with(vec![ElementBuilder::new("input")
            .attr("name", "locked")
            .attr("value", "fixed")
            .flag_if("disabled", true)]);
        FormReducer::set_value(&mut state, "locked", "changed".to_string());
        assert_eq!(state.control("locked").unwrap().value(), "fixed");
    }

    #[test]
    fn panic_messages_are_extracted() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("kaput")), "kaput");
        assert_eq!(panic_message(&42_u8), "submission panicked");
    }
}
