//! Entry point: turns a mount point with a schema link into a live form.

use crate::builder::FormBuilder;
use crate::dom::{Document, ElementBuilder, NodeId};
use crate::error::BuildError;
use crate::submission::{FormAction, FormEnvironment, FormReducer, FormState, SubmissionOutcome};
use dynform_runtime::{Store, StoreError};
use tracing::{debug, error, info};

/// Store driving one mounted form.
pub type FormStore = Store<FormState, FormAction, FormEnvironment, FormReducer>;

/// Result of decorating a mount point.
pub enum Decoration {
    /// The mount point has no schema link; the document is untouched
    NoTrigger(Document),
    /// Building failed; the mount point shows the fallback message
    Fallback {
        /// Document with the fallback rendered
        document: Document,
        /// Why building failed
        error: BuildError,
    },
    /// The form is mounted and accepting input
    Mounted(MountedForm),
}

impl Decoration {
    /// The mounted form, if decoration succeeded
    #[must_use]
    pub fn mounted(self) -> Option<MountedForm> {
        match self {
            Self::Mounted(form) => Some(form),
            Self::NoTrigger(_) | Self::Fallback { .. } => None,
        }
    }

    /// The build error, if decoration fell back
    #[must_use]
    pub const fn error(&self) -> Option<&BuildError> {
        match self {
            Self::Fallback { error, .. } => Some(error),
            Self::NoTrigger(_) | Self::Mounted(_) => None,
        }
    }

    /// `true` when a store was created
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        matches!(self, Self::Mounted(_))
    }
}

impl std::fmt::Debug for Decoration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTrigger(_) => write!(f, "Decoration::NoTrigger"),
            Self::Fallback { error, .. } => {
                f.debug_struct("Decoration::Fallback").field("error", error).finish()
            },
            Self::Mounted(_) => write!(f, "Decoration::Mounted"),
        }
    }
}

/// Decorates mount points.
#[derive(Clone)]
pub struct Decorator {
    builder: FormBuilder,
    environment: FormEnvironment,
}

impl Decorator {
    /// Create a decorator; mounted forms submit through `environment`
    #[must_use]
    pub const fn new(builder: FormBuilder, environment: FormEnvironment) -> Self {
        Self {
            builder,
            environment,
        }
    }

    /// First `a` under `block` whose `href` ends in `.json`
    #[must_use]
    pub fn find_trigger(document: &Document, block: NodeId) -> Option<NodeId> {
        document.query(block, |e| {
            e.tag_name() == "a" && e.attr("href").is_some_and(|href| href.ends_with(".json"))
        })
    }

    /// Decorate `block` in `document`.
    ///
    /// Build failures are not returned as errors: they are logged and the
    /// mount point gets the configured fallback paragraph.
    pub async fn decorate(&self, mut document: Document, block: NodeId) -> Decoration {
        let Some(trigger) = Self::find_trigger(&document, block) else {
            debug!(block = block.index(), "No schema link in mount point");
            return Decoration::NoTrigger(document);
        };
        let href = document
            .element(trigger)
            .and_then(|a| a.attr("href"))
            .unwrap_or_default()
            .to_string();

        match self.builder.build(&mut document, &href).await {
            Ok(built) => {
                if let Err(e) = document.replace_children(block, &[built.form]) {
                    return self.fall_back(document, block, e.into());
                }
                info!(href = %href, action = %built.action, "Form mounted");
                let state = FormState::new(document, block, built);
                let store = Store::new(state, FormReducer::new(), self.environment.clone());
                Decoration::Mounted(MountedForm { store })
            },
            Err(e) => self.fall_back(document, block, e),
        }
    }

    fn fall_back(&self, mut document: Document, block: NodeId, error: BuildError) -> Decoration {
        error!(%error, "Form could not be built");
        metrics::counter!("dynform.forms.fallback").increment(1);

        let message = document.insert(
            ElementBuilder::new("p").text(self.builder.config().fallback_message.as_str()),
        );
        if let Err(e) = document.replace_children(block, &[message]) {
            error!(error = %e, "Fallback could not be rendered");
        }
        Decoration::Fallback { document, error }
    }
}

/// A form mounted in its document, driven by a [`FormStore`].
#[derive(Clone)]
pub struct MountedForm {
    store: FormStore,
}

impl MountedForm {
    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &FormStore {
        &self.store
    }

    /// Submit the form without waiting for the network.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn submit(&self) -> Result<(), StoreError> {
        self.store.send(FormAction::Submit).await.map(drop)
    }

    /// Submit the form and wait for the attempt to settle.
    ///
    /// Returns the outcome recorded by this attempt, or `None` when the
    /// submit was dropped because another one was in flight.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn submit_and_wait(&self) -> Result<Option<SubmissionOutcome>, StoreError> {
        let before = self.store.state(|s| s.settled).await;
        let mut handle = self.store.send(FormAction::Submit).await?;
        handle.wait().await;
        Ok(self
            .store
            .state(|s| (s.settled > before).then(|| s.last_outcome.clone()).flatten())
            .await)
    }

    /// Type `value` into the control named `name`.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn set_value(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), StoreError> {
        self.store
            .send(FormAction::SetValue {
                name: name.into(),
                value: value.into(),
            })
            .await
            .map(drop)
    }

    /// Check or uncheck the radio/checkbox `name`=`value`.
    ///
    /// # Errors
    ///
    /// [`StoreError::ShutdownInProgress`] once the store is shutting down.
    pub async fn set_checked(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        checked: bool,
    ) -> Result<(), StoreError> {
        self.store
            .send(FormAction::SetChecked {
                name: name.into(),
                value: value.into(),
                checked,
            })
            .await
            .map(drop)
    }

    /// Read the form state
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&FormState) -> T,
    {
        self.store.state(f).await
    }

    /// Current markup of the mount point's content
    pub async fn html(&self) -> String {
        self.store.state(FormState::block_html).await
    }
}
