use super::{XmlElement, IDS_NS, SMP_NS, WSA_NS};
use crate::{
    capability::{ProcessGroup, ServiceEndpoint},
    error::SmpError,
    identifier::{DocumentIdentifier, ParticipantIdentifier},
    signing::ServiceInformationSigner,
};

/// The unsigned `ServiceInformation` payload for one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInformation {
    pub participant: ParticipantIdentifier,
    pub document: DocumentIdentifier,
    pub processes: Vec<ProcessGroup>,
}

impl ServiceInformation {
    pub fn to_element(&self) -> XmlElement {
        let processes = self.processes.iter().map(process_element);

        XmlElement::new(SMP_NS, "ServiceInformation")
            .child(
                XmlElement::new(IDS_NS, "ParticipantIdentifier")
                    .attr("scheme", self.participant.scheme())
                    .text(self.participant.value()),
            )
            .child(
                XmlElement::new(IDS_NS, "DocumentIdentifier")
                    .attr("scheme", self.document.scheme())
                    .text(self.document.value()),
            )
            .child(XmlElement::new(SMP_NS, "ProcessList").children(processes))
    }
}

fn process_element(group: &ProcessGroup) -> XmlElement {
    XmlElement::new(SMP_NS, "Process")
        .child(
            XmlElement::new(IDS_NS, "ProcessIdentifier")
                .attr("scheme", group.process.scheme())
                .text(group.process.value()),
        )
        .child(
            XmlElement::new(SMP_NS, "ServiceEndpointList")
                .children(group.endpoints.iter().map(endpoint_element)),
        )
}

fn endpoint_element(endpoint: &ServiceEndpoint) -> XmlElement {
    let require_signature = if endpoint.require_business_level_signature {
        "true"
    } else {
        "false"
    };

    XmlElement::new(SMP_NS, "Endpoint")
        .attr("transportProfile", endpoint.transport_profile.as_str())
        .child(
            XmlElement::new(WSA_NS, "EndpointReference").child(
                XmlElement::new(WSA_NS, "Address").text(endpoint.endpoint_reference.as_str()),
            ),
        )
        .child(XmlElement::new(SMP_NS, "RequireBusinessLevelSignature").text(require_signature))
        .child(XmlElement::new(SMP_NS, "Certificate").text(endpoint.certificate.as_str()))
}

/// `ServiceInformation` followed by the `ds:Signature` computed over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedServiceMetadata {
    xml: String,
}

impl SignedServiceMetadata {
    /// Payloads that cannot be written as XML 1.0 are rejected before the
    /// signer sees them.
    pub fn sign(
        information: &ServiceInformation,
        signer: &dyn ServiceInformationSigner,
    ) -> Result<Self, SmpError> {
        let service_information = information.to_element();
        service_information.validate()?;

        Ok(Self {
            xml: signer.sign(&service_information)?,
        })
    }

    pub fn as_xml(&self) -> &str {
        &self.xml
    }

    pub fn into_xml(self) -> String {
        self.xml
    }
}
