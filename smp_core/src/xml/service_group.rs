use super::{XmlElement, XmlError, IDS_NS, SMP_NS};
use crate::identifier::{DocumentIdentifier, ParticipantIdentifier};

/// The `ServiceGroup` listing: one metadata reference per supported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGroup {
    pub participant: ParticipantIdentifier,
    pub references: Vec<String>,
}

impl ServiceGroup {
    /// References point at `{base}/{participant}/services/{document}` with
    /// both identifiers percent-encoded.
    pub fn new(
        base_url: &str,
        participant: &ParticipantIdentifier,
        documents: &[DocumentIdentifier],
    ) -> Self {
        let references = documents
            .iter()
            .map(|document| service_metadata_href(base_url, participant, document))
            .collect();

        Self {
            participant: participant.clone(),
            references,
        }
    }

    pub fn to_element(&self) -> XmlElement {
        let references = self.references.iter().map(|href| {
            XmlElement::new(SMP_NS, "ServiceMetadataReference").attr("href", href.as_str())
        });

        XmlElement::new(SMP_NS, "ServiceGroup")
            .child(
                XmlElement::new(IDS_NS, "ParticipantIdentifier")
                    .attr("scheme", self.participant.scheme())
                    .text(self.participant.value()),
            )
            .child(
                XmlElement::new(SMP_NS, "ServiceMetadataReferenceCollection").children(references),
            )
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let element = self.to_element();
        element.validate()?;
        Ok(element.to_document_string())
    }
}

pub fn service_metadata_href(
    base_url: &str,
    participant: &ParticipantIdentifier,
    document: &DocumentIdentifier,
) -> String {
    format!(
        "{}/{}/services/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&participant.to_string()),
        urlencoding::encode(&document.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> ParticipantIdentifier {
        ParticipantIdentifier::parse("iso6523-actorid-upis::0088:1234567890123").unwrap()
    }

    #[test]
    fn test_href_encodes_both_identifiers() {
        let document = DocumentIdentifier::new(
            "busdox-docid-qns",
            "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##2.1",
        );
        let href = service_metadata_href("https://smp.example.com/", &participant(), &document);
        assert_eq!(
            href,
            "https://smp.example.com/iso6523-actorid-upis%3A%3A0088%3A1234567890123/services/\
             busdox-docid-qns%3A%3Aurn%3Aoasis%3Anames%3Aspecification%3Aubl%3Aschema%3Axsd%3AInvoice-2%3A%3AInvoice%23%232.1"
        );
    }

    #[test]
    fn test_service_group_lists_one_reference_per_document() {
        let documents = vec![
            DocumentIdentifier::new("busdox-docid-qns", "invoice"),
            DocumentIdentifier::new("busdox-docid-qns", "credit note & more"),
        ];
        let xml = ServiceGroup::new("https://smp.example.com", &participant(), &documents)
            .to_xml()
            .unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let root = doc.root_element();
        assert_eq!(root.tag_name().name(), "ServiceGroup");
        assert_eq!(root.tag_name().namespace(), Some(SMP_NS.uri));

        let participant = root
            .children()
            .find(|n| n.has_tag_name("ParticipantIdentifier"))
            .unwrap();
        assert_eq!(participant.attribute("scheme"), Some("iso6523-actorid-upis"));
        assert_eq!(participant.text(), Some("0088:1234567890123"));

        let hrefs: Vec<_> = root
            .descendants()
            .filter(|n| n.has_tag_name("ServiceMetadataReference"))
            .map(|n| n.attribute("href").unwrap().to_owned())
            .collect();
        assert_eq!(hrefs.len(), 2);
        assert!(hrefs[1].ends_with("/services/busdox-docid-qns%3A%3Acredit%20note%20%26%20more"));
    }

    #[test]
    fn test_empty_service_group_is_well_formed() {
        let xml = ServiceGroup::new("https://smp.example.com", &participant(), &[])
            .to_xml()
            .unwrap();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let collection = doc
            .descendants()
            .find(|n| n.has_tag_name("ServiceMetadataReferenceCollection"))
            .unwrap();
        assert_eq!(collection.children().count(), 0);
    }

    #[test]
    fn test_control_character_in_participant_rejected() {
        let participant = ParticipantIdentifier::parse("iso6523-actorid-upis::0088:12\u{1}34").unwrap();
        let err = ServiceGroup::new("https://smp.example.com", &participant, &[])
            .to_xml()
            .unwrap_err();
        assert_eq!(
            err,
            XmlError::ForbiddenCharacter {
                element: "ParticipantIdentifier",
                code: 1
            }
        );
    }
}
