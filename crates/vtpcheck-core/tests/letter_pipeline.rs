//! End-to-end pipeline tests over the static backend: open, fingerprint
//! checks, tag gate, positional extraction, and the external JSON shape.

use std::path::Path;

use vtpcheck_core::mock::{StaticBackend, StaticDocument};
use vtpcheck_core::{
    BackendError, Rejection, TemplateFingerprint, Verdict, VtpError, check_letter,
};

const LETTER_PAGE: [&str; 9] = [
    "Date 2021-06-01 Ref: Ref#123",
    "Immigration Checkpoints Authority",
    "Dear John Smith",
    "FIN Number: A1234567X",
    "Passport Number: E12345678",
    "Your application for a Vaccinated Travel Pass VTP (Short-Term) is approved.",
    "Travel under the VTL (Air) scheme is subject to the conditions below.",
    "Entry requirements apply for the period stated.",
    "Vaccinated Travel Lane (Air) valid 2021-06-10 2021-06-20 days",
];

fn letter_backend() -> StaticBackend {
    StaticBackend::new(StaticDocument::conforming_with_texts(&LETTER_PAGE))
}

fn run(backend: &StaticBackend) -> Result<Verdict, VtpError> {
    check_letter(
        Path::new("letter.pdf"),
        backend,
        &TemplateFingerprint::default(),
    )
}

#[test]
fn conforming_letter_yields_full_field_map() {
    let verdict = run(&letter_backend()).unwrap();
    let Verdict::Fields(report) = verdict else {
        panic!("expected fields, got {verdict:?}");
    };

    assert_eq!(report.vtp_type, "VTP (Short-Term)");
    assert_eq!(report.vtl_type, "VTL (Air)");
    assert_eq!(report.issue_date, "2021-06-01");
    assert_eq!(report.reference_number, "Ref#123");
    assert_eq!(report.name, "John Smith");
    assert_eq!(report.fin_number, "A1234567X");
    assert_eq!(report.passport_number, "E12345678");
    assert_eq!(report.valid_from, "2021-06-10");
    assert_eq!(report.valid_to, "2021-06-20");
}

#[test]
fn rerun_on_same_document_is_byte_identical() {
    let backend = letter_backend();
    let first = serde_json::to_string(&run(&backend).unwrap()).unwrap();
    let second = serde_json::to_string(&run(&backend).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn failed_fingerprint_yields_opaque_sentinel() {
    let mut document = StaticDocument::conforming_with_texts(&LETTER_PAGE);
    document.metadata.producer = "Microsoft Word".to_string();
    let backend = StaticBackend::new(document);

    let verdict = run(&backend).unwrap();
    assert!(verdict.is_rejected());
    assert_eq!(
        serde_json::to_string(&verdict).unwrap(),
        r#"{"Error":"Validity Checks Failed"}"#
    );
}

#[test]
fn fingerprint_rejection_retains_failed_checks_internally() {
    let mut document = StaticDocument::conforming_with_texts(&LETTER_PAGE);
    document.page_count = 7;
    document.metadata.title = "Invoice".to_string();
    let backend = StaticBackend::new(document);

    let Verdict::Rejected(Rejection::Fingerprint(checks)) = run(&backend).unwrap() else {
        panic!("expected fingerprint rejection");
    };
    assert_eq!(checks.failed_names(), vec!["page_check", "title_check"]);
}

#[test]
fn tag_gate_rejects_even_when_metadata_passes() {
    let mut page = LETTER_PAGE.to_vec();
    page[7] = "A conflicting VTL (Land) mention appears later in the letter.";
    let backend = StaticBackend::new(StaticDocument::conforming_with_texts(&page));

    let verdict = run(&backend).unwrap();
    assert_eq!(
        serde_json::to_string(&verdict).unwrap(),
        r#"{"Error":"Validity Checks Failed"}"#
    );
}

#[test]
fn unparseable_pdf_is_a_load_error_not_a_verdict() {
    let backend = StaticBackend::failing("not a PDF");
    let err = run(&backend).unwrap_err();
    assert!(matches!(err, VtpError::Load(BackendError::OpenError(_))));
}

#[test]
fn missing_metadata_key_is_a_load_error_not_a_failed_check() {
    let mut document = StaticDocument::conforming_with_texts(&LETTER_PAGE);
    document.missing_metadata = Some("producer");
    let backend = StaticBackend::new(document);

    let err = run(&backend).unwrap_err();
    assert!(matches!(
        err,
        VtpError::Load(BackendError::MissingMetadata("producer"))
    ));
}

#[test]
fn four_page_letter_reads_only_the_first_page() {
    let mut document = StaticDocument::conforming_with_texts(&LETTER_PAGE);
    document.page_count = 4;
    // Pages past the first would change the verdict if they were consulted.
    document.pages.push(vec![]);
    let backend = StaticBackend::new(document);

    let verdict = run(&backend).unwrap();
    assert!(matches!(verdict, Verdict::Fields(_)));
}

#[test]
fn short_page_yields_partial_fields_without_fault() {
    let page = [
        "Date 2021-06-01 Ref: Ref#123",
        "Dear John Smith holder of VTP (Short-Term) under VTL (Air)",
    ];
    let backend = StaticBackend::new(StaticDocument::conforming_with_texts(&page));

    let Verdict::Fields(report) = run(&backend).unwrap() else {
        panic!("short pages must degrade, not fault");
    };
    assert_eq!(report.issue_date, "2021-06-01");
    assert_eq!(report.valid_from, "");
    assert_eq!(report.valid_to, "");
}

#[test]
fn external_json_keys_match_wire_order() {
    let Verdict::Fields(report) = run(&letter_backend()).unwrap() else {
        panic!("expected fields");
    };
    let json = serde_json::to_string(&report).unwrap();

    let expected = [
        "VTP Type",
        "VTL Type",
        "VTP Issue Date",
        "VTP Reference Number",
        "Name",
        "FIN Number",
        "Passport Number",
        "VTP Valid From",
        "VTP Valid To",
    ];
    let mut last = 0;
    for key in expected {
        let pos = json
            .find(&format!("\"{key}\""))
            .unwrap_or_else(|| panic!("missing key {key}"));
        assert!(pos >= last, "key {key} out of order");
        last = pos;
    }
}

#[test]
fn alternate_template_accepts_a_different_letter() {
    let mut document = StaticDocument::conforming_with_texts(&LETTER_PAGE);
    document.metadata.title = "Quarantine Waiver".to_string();
    let backend = StaticBackend::new(document);

    // Stock fingerprint rejects it...
    assert!(run(&backend).unwrap().is_rejected());

    // ...a template override accepts it.
    let fingerprint = TemplateFingerprint {
        title: "Quarantine Waiver".to_string(),
        ..TemplateFingerprint::default()
    };
    let verdict = check_letter(Path::new("letter.pdf"), &backend, &fingerprint).unwrap();
    assert!(matches!(verdict, Verdict::Fields(_)));
}
