//! What a participant can receive, as handed between store, resolver and
//! document builders.

use serde::{Deserialize, Serialize};

use crate::identifier::{DocumentIdentifier, ProcessIdentifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoint {
    pub transport_profile: String,
    /// Endpoint URL.
    pub endpoint_reference: String,
    pub require_business_level_signature: bool,
    /// Base64 DER certificate exactly as stored.
    pub certificate: String,
}

/// A process and the endpoints serving it, in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessGroup {
    pub process: ProcessIdentifier,
    pub endpoints: Vec<ServiceEndpoint>,
}

/// A flattened `process x endpoint` join row. `endpoint` is `None` for a
/// process that has no endpoints registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub process: ProcessIdentifier,
    pub endpoint: Option<ServiceEndpoint>,
}

/// One document type with its processes, as registered through the
/// participant registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub document: DocumentIdentifier,
    pub processes: Vec<ProcessGroup>,
}
