use std::sync::Arc;

use sea_orm::Database;
use smp_core::{
    capability::{ProcessGroup, ServiceEndpoint, ServiceRegistration},
    entity::prelude::ParticipantStatus,
    error::SmpError,
    identifier::{DocumentIdentifier, ProcessIdentifier},
    models,
    service::{ParticipantsService, SmpService},
    signing::{
        verification_key_from_pem, verify_signed_service_metadata, RsaSha256Signer,
        VerificationError,
    },
    store::DbStore,
};

const KEY_PEM: &str = include_str!("fixtures/signing_key.pem");
const CERT_PEM: &str = include_str!("fixtures/signing_cert.pem");
const PUBLIC_KEY_PEM: &str = include_str!("fixtures/signing_key.pub.pem");

const PARTICIPANT: &str = "iso6523-actorid-upis::0088:1234567890123";
const UNKNOWN_PARTICIPANT: &str = "iso6523-actorid-upis::0088:0000000000000";
const INVOICE: &str = "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:cen.eu:en16931:2017::2.1";
const BILLING: &str = "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0";

struct Fixture {
    participants: ParticipantsService,
    smp: SmpService,
}

async fn setup() -> Fixture {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    models::migrate_up(&db).await.expect("Failed to run migrations");

    let signer = RsaSha256Signer::from_pem(KEY_PEM, Some(CERT_PEM)).expect("fixture key loads");
    let smp = SmpService::new(
        Arc::new(DbStore::new(db.clone())),
        Arc::new(signer),
        "https://smp.example.com/",
    );

    Fixture {
        participants: ParticipantsService::new(db),
        smp,
    }
}

fn endpoint(url: &str) -> ServiceEndpoint {
    ServiceEndpoint {
        transport_profile: "AS4".to_string(),
        endpoint_reference: url.to_string(),
        require_business_level_signature: false,
        certificate: "MIIDdzCCAl+gAwIBAgIE".to_string(),
    }
}

async fn register_acme(fixture: &Fixture) {
    fixture
        .participants
        ._create_participant(
            PARTICIPANT.to_string(),
            "Acme Corp".to_string(),
            "SMP-ACME".to_string(),
            ParticipantStatus::Active,
        )
        .await
        .expect("participant created");

    fixture
        .participants
        ._register_service(
            PARTICIPANT.to_string(),
            ServiceRegistration {
                document: DocumentIdentifier::parse(INVOICE).unwrap(),
                processes: vec![ProcessGroup {
                    process: ProcessIdentifier::new("cenbii-procid-ubl", BILLING),
                    endpoints: vec![endpoint("https://ap.example.com/as4")],
                }],
            },
        )
        .await
        .expect("service registered");
}

fn elements<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    name: &'a str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    doc.descendants().filter(|n| n.has_tag_name(name)).collect()
}

#[tokio::test]
async fn test_service_group_lists_registered_document() {
    let fixture = setup().await;
    register_acme(&fixture).await;

    let xml = fixture.smp._get_service_group(PARTICIPANT).await.unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));

    let doc = roxmltree::Document::parse(&xml).unwrap();
    assert_eq!(doc.root_element().tag_name().name(), "ServiceGroup");

    let references = elements(&doc, "ServiceMetadataReference");
    assert_eq!(references.len(), 1);

    let href = references[0].attribute("href").unwrap();
    assert_eq!(
        href,
        format!(
            "https://smp.example.com/{}/services/{}",
            urlencoding::encode(PARTICIPANT),
            urlencoding::encode(INVOICE)
        )
    );
}

#[tokio::test]
async fn test_signed_metadata_verifies_with_public_key() {
    let fixture = setup().await;
    register_acme(&fixture).await;

    let xml = fixture
        .smp
        ._get_service_metadata(PARTICIPANT, INVOICE)
        .await
        .unwrap();

    let doc = roxmltree::Document::parse(&xml).unwrap();
    assert_eq!(elements(&doc, "Signature").len(), 1);

    let processes = elements(&doc, "Process");
    assert_eq!(processes.len(), 1);
    let endpoints: Vec<_> = processes[0]
        .descendants()
        .filter(|n| n.has_tag_name("Endpoint"))
        .collect();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].attribute("transportProfile"), Some("AS4"));

    let public_key = verification_key_from_pem(PUBLIC_KEY_PEM).unwrap();
    verify_signed_service_metadata(&xml, &public_key).expect("signature verifies");

    let tampered = xml.replace("https://ap.example.com/as4", "https://evil.example.com/as4");
    assert!(matches!(
        verify_signed_service_metadata(&tampered, &public_key),
        Err(VerificationError::Invalid(_))
    ));
}

#[tokio::test]
async fn test_unknown_participant_is_not_found() {
    let fixture = setup().await;
    register_acme(&fixture).await;

    let err = fixture
        .smp
        ._get_service_group(UNKNOWN_PARTICIPANT)
        .await
        .unwrap_err();

    assert!(matches!(err, SmpError::ParticipantNotFound { .. }));
    assert_eq!(err.status_code(), 404);
    assert_eq!(
        err.public_message(),
        format!("Participant {UNKNOWN_PARTICIPANT} not found.")
    );
}

#[tokio::test]
async fn test_unknown_document_is_not_found() {
    let fixture = setup().await;
    register_acme(&fixture).await;

    let err = fixture
        .smp
        ._get_service_metadata(PARTICIPANT, "busdox-docid-qns::urn:example:unknown")
        .await
        .unwrap_err();

    assert!(matches!(err, SmpError::ServiceMetadataNotFound { .. }));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_endpoint_order_follows_registration_order() {
    let fixture = setup().await;
    fixture
        .participants
        ._create_participant(
            PARTICIPANT.to_string(),
            "Acme Corp".to_string(),
            "SMP-ACME".to_string(),
            ParticipantStatus::Active,
        )
        .await
        .unwrap();
    fixture
        .participants
        ._register_service(
            PARTICIPANT.to_string(),
            ServiceRegistration {
                document: DocumentIdentifier::parse(INVOICE).unwrap(),
                processes: vec![
                    ProcessGroup {
                        process: ProcessIdentifier::new("cenbii-procid-ubl", BILLING),
                        endpoints: vec![
                            endpoint("https://z.example.com/as4"),
                            endpoint("https://a.example.com/as4"),
                            endpoint("https://m.example.com/as4"),
                        ],
                    },
                    ProcessGroup {
                        process: ProcessIdentifier::new("cenbii-procid-ubl", "urn:example:ordering"),
                        endpoints: vec![],
                    },
                ],
            },
        )
        .await
        .unwrap();

    let xml = fixture
        .smp
        ._get_service_metadata(PARTICIPANT, INVOICE)
        .await
        .unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let addresses: Vec<_> = elements(&doc, "Address")
        .into_iter()
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(
        addresses,
        [
            "https://z.example.com/as4",
            "https://a.example.com/as4",
            "https://m.example.com/as4"
        ]
    );

    // A process without endpoints is still listed
    let process_ids: Vec<_> = elements(&doc, "ProcessIdentifier")
        .into_iter()
        .filter_map(|n| n.text())
        .collect();
    assert_eq!(process_ids, [BILLING, "urn:example:ordering"]);
}

#[tokio::test]
async fn test_deleted_participant_disappears() {
    let fixture = setup().await;
    register_acme(&fixture).await;

    let participant = fixture
        .participants
        ._list_participants()
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.participant_id == PARTICIPANT)
        .unwrap();
    fixture
        .participants
        ._delete_participant(participant.id)
        .await
        .unwrap();

    let err = fixture
        .smp
        ._get_service_group(PARTICIPANT)
        .await
        .unwrap_err();
    assert!(matches!(err, SmpError::ParticipantNotFound { .. }));

    let err = fixture
        .smp
        ._get_service_metadata(PARTICIPANT, INVOICE)
        .await
        .unwrap_err();
    assert!(matches!(err, SmpError::ServiceMetadataNotFound { .. }));
}
