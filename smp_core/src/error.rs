use thiserror::Error;

use crate::{signing::SigningError, store::StoreError, xml::XmlError};

/// Generic body for failures whose detail stays in the server log.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal server error occurred.";

/// Every failure the SMP responder can surface. Exactly one is produced per
/// failed request and no document body accompanies it.
#[derive(Debug, Error)]
pub enum SmpError {
    #[error("identifier {raw:?} is not of the form scheme::value")]
    InvalidIdentifierFormat { raw: String },

    #[error("Participant {participant_id} not found.")]
    ParticipantNotFound { participant_id: String },

    #[error("Service metadata for document {document_id} not found for participant {participant_id}.")]
    ServiceMetadataNotFound {
        participant_id: String,
        document_id: String,
    },

    #[error("signing failed")]
    Signing(#[from] SigningError),

    #[error("store failure")]
    Store(#[from] StoreError),

    #[error("document cannot be written as XML")]
    Xml(#[from] XmlError),
}

impl SmpError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SmpError::ParticipantNotFound { .. } | SmpError::ServiceMetadataNotFound { .. }
        )
    }

    /// HTTP status a front end should answer with: 404 for the not-found
    /// kinds, 500 for everything else.
    pub fn status_code(&self) -> u16 {
        if self.is_not_found() {
            404
        } else {
            500
        }
    }

    /// Text safe to hand to a remote caller. Only the not-found kinds carry
    /// their own message; the rest stay in the server log.
    pub fn public_message(&self) -> String {
        if self.is_not_found() {
            self.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_owned()
        }
    }
}

/// Stand-in carried across the RPC boundary for infrastructure failures.
#[derive(Debug, Error)]
#[error("An internal server error occurred.")]
pub struct InternalError;
