//! Error types for form construction, submission and document edits

use crate::dom::NodeId;
use dynform_core::environment::TransportError;
use thiserror::Error;

/// Message reported when an error carries no text of its own.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Errors that abort building a form.
///
/// Every variant is terminal for the decoration: the mount point shows the
/// fallback message instead of a form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The trigger href could not be resolved to a URL
    #[error("Invalid form resource '{href}': {reason}")]
    InvalidResource {
        /// The href as found on the trigger link
        href: String,
        /// Parser message
        reason: String,
    },

    /// Schema `GET` answered with a non-2xx status
    #[error("Failed to load form config: {status}")]
    SchemaFetch {
        /// HTTP status code
        status: u16,
    },

    /// Schema `GET` failed before a status was received
    #[error("Failed to load form config: {0}")]
    Transport(#[from] TransportError),

    /// Schema body is not a valid form schema
    #[error("Malformed form schema: {0}")]
    SchemaParse(String),

    /// Neither the schema nor the fallback policy yields a submission URL
    #[error("No submission target for form '{pathname}'")]
    MissingSubmissionTarget {
        /// Pathname the schema was fetched from
        pathname: String,
    },

    /// A field factory rejected a descriptor
    #[error("Field construction failed: {0}")]
    FieldConstruction(#[from] FieldConstructionError),

    /// Attaching built fields to the document failed
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}

/// A field factory rejected a descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldConstructionError {
    /// The descriptor cannot be turned into its field kind
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidDescriptor {
        /// Descriptor name (may be empty)
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Factory-specific failure
    #[error("{0}")]
    Failed(String),
}

/// A submission attempt failed.
///
/// Always recovered inside the submission controller: the submit control is
/// re-enabled and the in-flight flag cleared.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// The endpoint answered with a non-2xx status
    #[error("Submission rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The request failed before a status was received
    #[error("Submission failed: {0}")]
    Transport(#[from] TransportError),

    /// The network step panicked
    #[error("Submission aborted: {0}")]
    Aborted(String),
}

impl SubmissionError {
    /// Message surfaced to telemetry: the response body for rejections,
    /// the underlying reason otherwise, `"unknown error"` when that is empty.
    #[must_use]
    pub fn message(&self) -> String {
        let message = match self {
            Self::Rejected { body, .. } => body.clone(),
            Self::Transport(error) => error.to_string(),
            Self::Aborted(reason) => reason.clone(),
        };
        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

/// Invalid document tree operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomError {
    /// The id does not belong to this document
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The node is text, not an element
    #[error("Node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// The move would put a node inside itself
    #[error("Cannot insert {child:?} into {parent:?}: the node is the parent or one of its ancestors")]
    HierarchyRequest {
        /// Intended parent
        parent: NodeId,
        /// Node being moved
        child: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_the_body_text() {
        let error = SubmissionError::Rejected {
            status: 400,
            body: "bad field".to_string(),
        };
        assert_eq!(error.message(), "bad field");
        assert_eq!(
            error.to_string(),
            "Submission rejected with status 400: bad field"
        );
    }

    #[test]
    fn empty_messages_become_unknown_error() {
        let error = SubmissionError::Rejected {
            status: 502,
            body: "  ".to_string(),
        };
        assert_eq!(error.message(), UNKNOWN_ERROR);
    }

    #[test]
    fn schema_fetch_mentions_status() {
        assert_eq!(
            BuildError::SchemaFetch { status: 500 }.to_string(),
            "Failed to load form config: 500"
        );
    }
}
