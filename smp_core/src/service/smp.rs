use std::sync::Arc;

use tracing::{error, info};
use zel_core::prelude::*;

use crate::{
    error::{InternalError, SmpError},
    identifier::{DocumentIdentifier, ParticipantIdentifier},
    resolver::CapabilityResolver,
    signing::{ServiceInformationSigner, SigningError},
    store::CapabilityStore,
    xml::{ServiceGroup, ServiceInformation, SignedServiceMetadata},
};

impl From<SmpError> for ResourceError {
    fn from(error: SmpError) -> Self {
        match error {
            SmpError::InvalidIdentifierFormat { .. }
            | SmpError::ParticipantNotFound { .. }
            | SmpError::ServiceMetadataNotFound { .. } => ResourceError::app(error),
            SmpError::Signing(_) | SmpError::Store(_) | SmpError::Xml(_) => {
                ResourceError::infra(InternalError)
            }
        }
    }
}

/// The SMP responder: ServiceGroup and SignedServiceMetadata documents for
/// registered participants.
#[derive(Clone)]
pub struct SmpService {
    resolver: CapabilityResolver,
    signer: Arc<dyn ServiceInformationSigner>,
    base_url: String,
}

impl SmpService {
    pub fn new(
        store: Arc<dyn CapabilityStore>,
        signer: Arc<dyn ServiceInformationSigner>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            resolver: CapabilityResolver::new(store),
            signer,
            base_url: base_url.into(),
        }
    }

    /// ServiceGroup XML for an already URL-decoded participant identifier.
    pub async fn _get_service_group(&self, participant_id: &str) -> Result<String, SmpError> {
        info!(participant = %participant_id, "ServiceGroup request");

        let result = async {
            let participant = ParticipantIdentifier::parse(participant_id)?;
            let documents = self.resolver.list_documents(&participant).await?;
            Ok::<_, SmpError>(ServiceGroup::new(&self.base_url, &participant, &documents).to_xml()?)
        }
        .await;

        log_failure(&result, participant_id, None);
        result
    }

    /// SignedServiceMetadata XML for one participant and document type.
    pub async fn _get_service_metadata(
        &self,
        participant_id: &str,
        document_id: &str,
    ) -> Result<String, SmpError> {
        info!(participant = %participant_id, document = %document_id, "ServiceMetadata request");

        let result = async {
            let participant = ParticipantIdentifier::parse(participant_id)?;
            let document = DocumentIdentifier::parse(document_id)?;
            let processes = self.resolver.resolve_metadata(&participant, &document).await?;

            let information = ServiceInformation {
                participant,
                document,
                processes,
            };
            let signed = self.sign(information).await?;
            Ok::<_, SmpError>(signed.into_xml())
        }
        .await;

        log_failure(&result, participant_id, Some(document_id));
        result
    }

    // RSA signing is CPU bound; keep it off the async workers
    async fn sign(&self, information: ServiceInformation) -> Result<SignedServiceMetadata, SmpError> {
        let signer = self.signer.clone();
        tokio::task::spawn_blocking(move || SignedServiceMetadata::sign(&information, signer.as_ref()))
            .await
            .map_err(|e| SigningError::Task(e.to_string()))?
    }
}

fn log_failure(result: &Result<String, SmpError>, participant_id: &str, document_id: Option<&str>) {
    let Err(err) = result else {
        return;
    };
    let document = document_id.unwrap_or("-");

    match err {
        SmpError::Signing(detail) => {
            error!(participant = %participant_id, document, error = %detail, "failed to sign service metadata")
        }
        SmpError::Store(detail) => {
            error!(participant = %participant_id, document, error = %detail, "store query failed")
        }
        SmpError::Xml(detail) => {
            error!(participant = %participant_id, document, error = %detail, "stored data cannot be rendered")
        }
        other => info!(participant = %participant_id, document, "{other}"),
    }
}

#[zel_service(name = "smp")]
trait Smp {
    #[doc = "ServiceGroup XML listing the document types a participant supports"]
    #[method(name = "get_service_group")]
    async fn get_service_group(&self, participant_id: String) -> Result<String, ResourceError>;

    #[doc = "SignedServiceMetadata XML for one participant and document type"]
    #[method(name = "get_service_metadata")]
    async fn get_service_metadata(
        &self,
        participant_id: String,
        document_id: String,
    ) -> Result<String, ResourceError>;
}

#[async_trait]
impl SmpServer for SmpService {
    async fn get_service_group(
        &self,
        _ctx: RequestContext,
        participant_id: String,
    ) -> Result<String, ResourceError> {
        Ok(self._get_service_group(&participant_id).await?)
    }

    async fn get_service_metadata(
        &self,
        _ctx: RequestContext,
        participant_id: String,
        document_id: String,
    ) -> Result<String, ResourceError> {
        Ok(self
            ._get_service_metadata(&participant_id, &document_id)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        capability::{ProcessGroup, ServiceEndpoint, ServiceRegistration},
        identifier::ProcessIdentifier,
        signing::UnavailableSigner,
        store::MemoryStore,
        xml::{XmlElement, XmlError},
    };

    const PARTICIPANT: &str = "iso6523-actorid-upis::0088:1234567890123";
    const INVOICE: &str =
        "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##2.1";

    struct MarkerSigner;

    impl ServiceInformationSigner for MarkerSigner {
        fn sign(&self, service_information: &XmlElement) -> Result<String, SigningError> {
            Ok(service_information.to_document_string())
        }
    }

    fn setup(signer: Arc<dyn ServiceInformationSigner>) -> (Arc<MemoryStore>, SmpService) {
        let store = Arc::new(MemoryStore::new());
        let participant = ParticipantIdentifier::parse(PARTICIPANT).unwrap();
        store.insert_participant(&participant, "Acme").unwrap();
        store
            .add_service(
                &participant,
                ServiceRegistration {
                    document: DocumentIdentifier::parse(INVOICE).unwrap(),
                    processes: vec![ProcessGroup {
                        process: ProcessIdentifier::new(
                            "cenbii-procid-ubl",
                            "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0",
                        ),
                        endpoints: vec![ServiceEndpoint {
                            transport_profile: "AS4".into(),
                            endpoint_reference: "https://ap.example.com/as4".into(),
                            require_business_level_signature: false,
                            certificate: "MIIBcert".into(),
                        }],
                    }],
                },
            )
            .unwrap();
        let service = SmpService::new(store.clone(), signer, "https://smp.example.com");
        (store, service)
    }

    #[tokio::test]
    async fn test_service_group_for_known_participant() {
        let (_store, service) = setup(Arc::new(MarkerSigner));
        let xml = service._get_service_group(PARTICIPANT).await.unwrap();

        let doc = roxmltree::Document::parse(&xml).unwrap();
        let hrefs: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("ServiceMetadataReference"))
            .filter_map(|n| n.attribute("href"))
            .collect();
        assert_eq!(hrefs.len(), 1);
        assert!(hrefs[0].starts_with("https://smp.example.com/iso6523-actorid-upis%3A%3A0088"));
        assert!(hrefs[0].ends_with(&format!("/services/{}", urlencoding::encode(INVOICE))));
    }

    #[tokio::test]
    async fn test_invalid_identifier_rejected_before_store() {
        let (store, service) = setup(Arc::new(MarkerSigner));
        store.set_unavailable(true);

        let err = service._get_service_group("no-separator").await.unwrap_err();
        assert!(matches!(err, SmpError::InvalidIdentifierFormat { .. }));

        let err = service
            ._get_service_metadata(PARTICIPANT, "no-separator")
            .await
            .unwrap_err();
        assert!(matches!(err, SmpError::InvalidIdentifierFormat { .. }));
    }

    #[tokio::test]
    async fn test_unknown_document_is_not_found() {
        let (_store, service) = setup(Arc::new(MarkerSigner));
        let err = service
            ._get_service_metadata(PARTICIPANT, "busdox-docid-qns::unknown")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            format!(
                "Service metadata for document busdox-docid-qns::unknown not found for participant {PARTICIPANT}."
            )
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_metadata_but_not_service_group() {
        let (_store, service) = setup(Arc::new(UnavailableSigner::new("no key configured")));

        assert!(service._get_service_group(PARTICIPANT).await.is_ok());

        let err = service
            ._get_service_metadata(PARTICIPANT, INVOICE)
            .await
            .unwrap_err();
        assert!(matches!(err, SmpError::Signing(SigningError::KeyUnavailable(_))));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), crate::error::INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_invalid_identifier_answers_generic_500() {
        let (_store, service) = setup(Arc::new(MarkerSigner));
        let err = service._get_service_group("no-separator").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), crate::error::INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_control_character_in_stored_participant_fails() {
        let (store, service) = setup(Arc::new(MarkerSigner));
        let raw = "iso6523-actorid-upis::0088:12\u{1}34";
        store
            .insert_participant(&ParticipantIdentifier::parse(raw).unwrap(), "Broken")
            .unwrap();

        let err = service._get_service_group(raw).await.unwrap_err();
        assert!(matches!(
            err,
            SmpError::Xml(XmlError::ForbiddenCharacter { code: 1, .. })
        ));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_error() {
        let (store, service) = setup(Arc::new(MarkerSigner));
        store.set_unavailable(true);

        let err = service._get_service_group(PARTICIPANT).await.unwrap_err();
        assert!(matches!(err, SmpError::Store(_)));
    }
}
