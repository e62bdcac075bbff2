//! PEPPOL `scheme::value` identifiers.
//!
//! Participant, document and process identifiers share one wire form and one
//! parser but are distinct types so they can't be mixed up in the resolver.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SmpError;

pub const SEPARATOR: &str = "::";

/// Splits `raw` on the first `::`. Scheme and value are not validated further.
pub fn parse(raw: &str) -> Result<(&str, &str), SmpError> {
    raw.split_once(SEPARATOR)
        .ok_or_else(|| SmpError::InvalidIdentifierFormat {
            raw: raw.to_owned(),
        })
}

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            scheme: String,
            value: String,
        }

        impl $name {
            pub fn new(scheme: impl Into<String>, value: impl Into<String>) -> Self {
                Self {
                    scheme: scheme.into(),
                    value: value.into(),
                }
            }

            pub fn parse(raw: &str) -> Result<Self, SmpError> {
                let (scheme, value) = parse(raw)?;
                Ok(Self::new(scheme, value))
            }

            pub fn scheme(&self) -> &str {
                &self.scheme
            }

            pub fn value(&self) -> &str {
                &self.value
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}{}", self.scheme, SEPARATOR, self.value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = SmpError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = SmpError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

define_identifier!(
    /// A registered participant, e.g. `iso6523-actorid-upis::0088:1234567890123`.
    ParticipantIdentifier
);
define_identifier!(
    /// A document type, e.g. `busdox-docid-qns::urn:oasis:...:Invoice-2::Invoice##...`.
    DocumentIdentifier
);
define_identifier!(
    /// A business process, e.g. `cenbii-procid-ubl::urn:fdc:peppol.eu:2017:poacc:billing:01:1.0`.
    ProcessIdentifier
);
