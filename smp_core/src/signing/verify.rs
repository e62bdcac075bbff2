//! Verification of `SignedServiceMetadata` documents.
//!
//! Accepts exactly the profile produced by [`super::RsaSha256Signer`]: one
//! `Signature` whose single reference is filtered to the `ServiceInformation`
//! subtree. The profile is checked here, the digest and signature value by
//! `bergshamra_dsig` against a caller-supplied key only. SMP clients use it to
//! check that endpoint data came from the SMP holding the key.

use bergshamra_dsig::{DsigContext, VerifyResult};
use bergshamra_keys::{loader, Key, KeysManager};
use roxmltree::{Document, Node};
use thiserror::Error;

use super::{
    EXC_C14N_ALGORITHM, RSA_SHA256_ALGORITHM, SERVICE_INFORMATION_XPATH, SHA256_ALGORITHM,
    SMP_XPATH_PREFIX, XPATH_FILTER_ALGORITHM,
};
use crate::xml::{DS_NS, SMP_NS};

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("document is not well-formed: {0}")]
    Parse(#[from] roxmltree::Error),

    #[error("unexpected document structure: {0}")]
    Structure(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid verification key: {0}")]
    InvalidKey(String),

    #[error("signature could not be processed: {0}")]
    Dsig(#[from] bergshamra_core::Error),

    #[error("signature is invalid: {0}")]
    Invalid(String),
}

/// Reads the SMP's RSA public key from SPKI (`PUBLIC KEY`), PKCS#1
/// (`RSA PUBLIC KEY`) or `CERTIFICATE` PEM.
pub fn verification_key_from_pem(pem: &str) -> Result<Key, VerificationError> {
    loader::load_rsa_public_pem(pem.as_bytes())
        .or_else(|_| loader::load_x509_cert_pem(pem.as_bytes()))
        .map_err(|e| VerificationError::InvalidKey(e.to_string()))
}

pub fn verify_signed_service_metadata(xml: &str, key: &Key) -> Result<(), VerificationError> {
    check_profile(xml)?;

    let mut keys = KeysManager::new();
    keys.add_key(key.clone());
    let ctx = DsigContext::new(keys);

    match bergshamra_dsig::verify::verify(&ctx, xml)? {
        VerifyResult::Valid { .. } => Ok(()),
        VerifyResult::Invalid { reason } => Err(VerificationError::Invalid(reason)),
    }
}

fn check_profile(xml: &str) -> Result<(), VerificationError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    if !is(root, SMP_NS.uri, "SignedServiceMetadata") {
        return Err(structure("root is not SignedServiceMetadata"));
    }
    single_child(root, SMP_NS.uri, "ServiceInformation")?;

    let signatures: Vec<_> = doc
        .descendants()
        .filter(|n| is(*n, DS_NS.uri, "Signature"))
        .collect();
    let signature = match signatures.as_slice() {
        [signature] => *signature,
        _ => return Err(structure("expected exactly one Signature")),
    };

    let signed_info = single_child(signature, DS_NS.uri, "SignedInfo")?;
    expect_algorithm(signed_info, "CanonicalizationMethod", EXC_C14N_ALGORITHM)?;
    expect_algorithm(signed_info, "SignatureMethod", RSA_SHA256_ALGORITHM)?;

    let reference = single_child(signed_info, DS_NS.uri, "Reference")?;
    if reference.attribute("URI") != Some("") {
        return Err(structure("Reference must use URI=\"\""));
    }
    check_transforms(reference)?;
    expect_algorithm(reference, "DigestMethod", SHA256_ALGORITHM)
}

fn check_transforms(reference: Node<'_, '_>) -> Result<(), VerificationError> {
    let transforms = single_child(reference, DS_NS.uri, "Transforms")?;
    let steps: Vec<_> = element_children(transforms).collect();

    match steps.as_slice() {
        [xpath, c14n]
            if xpath.attribute("Algorithm") == Some(XPATH_FILTER_ALGORITHM)
                && c14n.attribute("Algorithm") == Some(EXC_C14N_ALGORITHM) =>
        {
            let expression = single_child(*xpath, DS_NS.uri, "XPath")?;
            let text = expression.text().unwrap_or_default().trim();
            let bound = expression.lookup_namespace_uri(Some(SMP_XPATH_PREFIX));

            if text == SERVICE_INFORMATION_XPATH && bound == Some(SMP_NS.uri) {
                Ok(())
            } else {
                Err(VerificationError::UnsupportedAlgorithm(format!("XPath {text}")))
            }
        }
        _ => Err(VerificationError::UnsupportedAlgorithm(
            "reference transforms".into(),
        )),
    }
}

fn expect_algorithm(
    parent: Node<'_, '_>,
    name: &str,
    algorithm: &str,
) -> Result<(), VerificationError> {
    let found = single_child(parent, DS_NS.uri, name)?.attribute("Algorithm");
    if found == Some(algorithm) {
        Ok(())
    } else {
        Err(VerificationError::UnsupportedAlgorithm(format!(
            "{name} {}",
            found.unwrap_or("<missing>")
        )))
    }
}

fn structure(message: &str) -> VerificationError {
    VerificationError::Structure(message.to_owned())
}

fn is(node: Node<'_, '_>, namespace: &str, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(namespace)
        && node.tag_name().name() == name
}

fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn single_child<'a, 'input>(
    parent: Node<'a, 'input>,
    namespace: &str,
    name: &str,
) -> Result<Node<'a, 'input>, VerificationError> {
    let mut matches = element_children(parent).filter(|n| is(*n, namespace, name));
    match (matches.next(), matches.next()) {
        (Some(node), None) => Ok(node),
        (None, _) => Err(structure(&format!("missing {name}"))),
        (Some(_), Some(_)) => Err(structure(&format!("duplicate {name}"))),
    }
}
