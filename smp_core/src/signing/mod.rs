//! XML-DSig over the `ServiceInformation` element.
//!
//! A `SignedServiceMetadata` template is serialized with an empty
//! `ds:Signature` after the payload and handed to `bergshamra_dsig`, which
//! fills in the digest and signature value. The single `Reference URI=""` is
//! narrowed by an XPath filter to the `ServiceInformation` subtree, then
//! canonicalized with Exclusive C14N and digested with SHA-256. `SignedInfo`
//! is signed with RSASSA-PKCS1-v1_5 / SHA-256.

pub mod rsa_signer;
pub mod verify;

pub use rsa_signer::RsaSha256Signer;
pub use verify::{
    verification_key_from_pem, verify_signed_service_metadata, VerificationError,
};

use std::{path::Path, sync::Arc};

use bergshamra_core::algorithm;
use thiserror::Error;
use tracing::{info, warn};

use crate::xml::{XmlElement, DS_NS, SMP_NS};

pub const EXC_C14N_ALGORITHM: &str = algorithm::EXC_C14N;
pub const RSA_SHA256_ALGORITHM: &str = algorithm::RSA_SHA256;
pub const SHA256_ALGORITHM: &str = algorithm::SHA256;
pub const XPATH_FILTER_ALGORITHM: &str = algorithm::XPATH;

/// Prefix bound to the SMP namespace on the `ds:XPath` element.
pub const SMP_XPATH_PREFIX: &str = "smp";
pub const SERVICE_INFORMATION_XPATH: &str = "ancestor-or-self::smp:ServiceInformation";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("invalid signing certificate: {0}")]
    InvalidCertificate(String),

    #[error("signature computation failed: {0}")]
    Crypto(#[from] bergshamra_core::Error),

    #[error("signing task failed: {0}")]
    Task(String),
}

/// Signs a `ServiceInformation` element and returns the complete
/// `SignedServiceMetadata` document. Signing is synchronous and CPU bound.
pub trait ServiceInformationSigner: Send + Sync {
    fn sign(&self, service_information: &XmlElement) -> Result<String, SigningError>;
}

/// Stands in when key material could not be loaded. Every signature request
/// fails with the load error.
#[derive(Debug, Clone)]
pub struct UnavailableSigner {
    reason: String,
}

impl UnavailableSigner {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ServiceInformationSigner for UnavailableSigner {
    fn sign(&self, _: &XmlElement) -> Result<String, SigningError> {
        Err(SigningError::KeyUnavailable(self.reason.clone()))
    }
}

/// Loads the RSA signer once at startup. Bad or missing key material does not
/// stop the node; metadata requests fail instead while service groups keep
/// being served.
pub fn load_signer(
    key_path: &Path,
    certificate_path: Option<&Path>,
) -> Arc<dyn ServiceInformationSigner> {
    match RsaSha256Signer::from_files(key_path, certificate_path) {
        Ok(signer) => {
            info!(key = %key_path.display(), "loaded SMP signing key");
            Arc::new(signer)
        }
        Err(error) => {
            warn!(key = %key_path.display(), %error, "SMP signing key unavailable; metadata requests will fail");
            Arc::new(UnavailableSigner::new(error.to_string()))
        }
    }
}

/// What the signer publishes in `ds:KeyInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInfoTemplate {
    /// `ds:X509Data`, filled from the configured certificate.
    Certificate,
    /// `ds:KeyValue`, filled with the RSA public key.
    KeyValue,
}

/// `ds:Signature` with empty `DigestValue` and `SignatureValue`.
pub fn signature_template(key_info: KeyInfoTemplate) -> XmlElement {
    let key_info = match key_info {
        KeyInfoTemplate::Certificate => XmlElement::new(DS_NS, "X509Data"),
        KeyInfoTemplate::KeyValue => XmlElement::new(DS_NS, "KeyValue"),
    };

    XmlElement::new(DS_NS, "Signature")
        .child(signed_info_template())
        .child(XmlElement::new(DS_NS, "SignatureValue"))
        .child(XmlElement::new(DS_NS, "KeyInfo").child(key_info))
}

fn signed_info_template() -> XmlElement {
    let xpath = XmlElement::new(DS_NS, "XPath")
        .attr("xmlns:smp", SMP_NS.uri)
        .text(SERVICE_INFORMATION_XPATH);

    XmlElement::new(DS_NS, "SignedInfo")
        .child(XmlElement::new(DS_NS, "CanonicalizationMethod").attr("Algorithm", EXC_C14N_ALGORITHM))
        .child(XmlElement::new(DS_NS, "SignatureMethod").attr("Algorithm", RSA_SHA256_ALGORITHM))
        .child(
            XmlElement::new(DS_NS, "Reference")
                .attr("URI", "")
                .child(
                    XmlElement::new(DS_NS, "Transforms")
                        .child(
                            XmlElement::new(DS_NS, "Transform")
                                .attr("Algorithm", XPATH_FILTER_ALGORITHM)
                                .child(xpath),
                        )
                        .child(XmlElement::new(DS_NS, "Transform").attr("Algorithm", EXC_C14N_ALGORITHM)),
                )
                .child(XmlElement::new(DS_NS, "DigestMethod").attr("Algorithm", SHA256_ALGORITHM))
                .child(XmlElement::new(DS_NS, "DigestValue")),
        )
}

/// The unsigned `SignedServiceMetadata` document: payload, then template.
pub fn template_document(service_information: &XmlElement, key_info: KeyInfoTemplate) -> String {
    XmlElement::new(SMP_NS, "SignedServiceMetadata")
        .child(service_information.clone())
        .child(signature_template(key_info))
        .to_document_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_signer_always_fails() {
        let signer = UnavailableSigner::new("key.pem: not found");
        let err = signer
            .sign(&XmlElement::new(SMP_NS, "ServiceInformation"))
            .unwrap_err();
        assert!(matches!(err, SigningError::KeyUnavailable(ref r) if r == "key.pem: not found"));
    }

    #[test]
    fn test_load_signer_with_missing_key_degrades() {
        let signer = load_signer(Path::new("/nonexistent/smp/key.pem"), None);
        let err = signer
            .sign(&XmlElement::new(SMP_NS, "ServiceInformation"))
            .unwrap_err();
        assert!(matches!(err, SigningError::KeyUnavailable(_)));
    }

    #[test]
    fn test_template_shape() {
        let xml = template_document(
            &XmlElement::new(SMP_NS, "ServiceInformation"),
            KeyInfoTemplate::Certificate,
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();

        let children: Vec<_> = doc
            .root_element()
            .children()
            .filter(|n| n.is_element())
            .map(|n| n.tag_name().name())
            .collect();
        assert_eq!(children, ["ServiceInformation", "Signature"]);

        let xpath = doc.descendants().find(|n| n.has_tag_name("XPath")).unwrap();
        assert_eq!(xpath.text(), Some(SERVICE_INFORMATION_XPATH));
        assert_eq!(xpath.lookup_namespace_uri(Some(SMP_XPATH_PREFIX)), Some(SMP_NS.uri));

        for empty in ["DigestValue", "SignatureValue", "X509Data"] {
            let node = doc.descendants().find(|n| n.has_tag_name(empty)).unwrap();
            assert_eq!(node.children().count(), 0, "{empty}");
        }
    }
}
