use std::{fs, path::Path};

use bergshamra_dsig::DsigContext;
use bergshamra_keys::{loader, KeysManager};

use super::{template_document, KeyInfoTemplate, ServiceInformationSigner, SigningError};
use crate::xml::XmlElement;

/// RSA-SHA256 XML-DSig signer holding the SMP's private key and, optionally,
/// the certificate published in `KeyInfo`.
#[derive(Clone)]
pub struct RsaSha256Signer {
    keys: KeysManager,
    key_info: KeyInfoTemplate,
}

impl std::fmt::Debug for RsaSha256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSha256Signer")
            .field("key_info", &self.key_info)
            .finish_non_exhaustive()
    }
}

impl RsaSha256Signer {
    /// Accepts PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM.
    pub fn from_pem(key_pem: &str, certificate_pem: Option<&str>) -> Result<Self, SigningError> {
        let mut key = loader::load_rsa_private_pem(key_pem.as_bytes())
            .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

        let key_info = match certificate_pem {
            Some(pem) => {
                key.x509_chain = vec![certificate_der(pem)?];
                KeyInfoTemplate::Certificate
            }
            None => KeyInfoTemplate::KeyValue,
        };

        let mut keys = KeysManager::new();
        keys.add_key(key);

        Ok(Self { keys, key_info })
    }

    pub fn from_files(
        key_path: &Path,
        certificate_path: Option<&Path>,
    ) -> Result<Self, SigningError> {
        let key_pem = fs::read_to_string(key_path)
            .map_err(|e| SigningError::KeyUnavailable(format!("{}: {e}", key_path.display())))?;

        let certificate_pem = certificate_path
            .map(|path| {
                fs::read_to_string(path).map_err(|e| {
                    SigningError::InvalidCertificate(format!("{}: {e}", path.display()))
                })
            })
            .transpose()?;

        Self::from_pem(&key_pem, certificate_pem.as_deref())
    }
}

fn certificate_der(certificate_pem: &str) -> Result<Vec<u8>, SigningError> {
    let parsed =
        pem::parse(certificate_pem).map_err(|e| SigningError::InvalidCertificate(e.to_string()))?;

    if parsed.tag() != "CERTIFICATE" {
        return Err(SigningError::InvalidCertificate(format!(
            "expected CERTIFICATE block, found {}",
            parsed.tag()
        )));
    }

    Ok(parsed.into_contents())
}

impl ServiceInformationSigner for RsaSha256Signer {
    fn sign(&self, service_information: &XmlElement) -> Result<String, SigningError> {
        let template = template_document(service_information, self.key_info);
        let ctx = DsigContext::new(self.keys.clone());
        Ok(bergshamra_dsig::sign::sign_owned(&ctx, template)?)
    }
}
