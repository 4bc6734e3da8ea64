// Integration tests test your crate's public API. They only have access to items
// in your crate that are marked pub. See the Cargo Targets page of the Cargo Book
// for more information.
//
//   https://doc.rust-lang.org/cargo/reference/cargo-targets.html#integration-tests
//

use hiv_care_simulator::*;



// End-to-end runs, configuration and output
mod cli_argument_parsing_tests;

#[test]
fn test_patient_id_formatting() {
    let id = PatientId::new(42);
    assert_eq!(id.to_string(), "PT_0000000042");
    assert_eq!(id.value(), 42);

    let json = serde_json::to_string(&id).unwrap();
    assert!(json.contains("PT_"));
    let deserialized: PatientId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

#[test]
fn test_run_ids_are_unique() {
    assert_ne!(RunId::new(), RunId::new());
}

#[test]
fn test_enum_types() {
    let statuses = [
        PatientStatus::Inactive,
        PatientStatus::ActiveNotDue,
        PatientStatus::ActiveDue,
        PatientStatus::LostToFollowUp,
        PatientStatus::Dead,
    ];
    for status in &statuses {
        assert!(!status.to_string().is_empty());
    }
    assert!(PatientStatus::Dead.is_terminal());
    assert!(PatientStatus::LostToFollowUp.is_terminal());
    assert!(!PatientStatus::ActiveDue.is_terminal());

    assert_eq!(Sex::Female.to_string(), "F");
    assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
}

#[test]
fn test_viral_load_classification() {
    assert!(ViralLoadResult::Suppressed.is_suppressed());
    assert!(!ViralLoadResult::Unsuppressed.is_suppressed());
    assert!(ViralLoadResult::Copies(999).is_suppressed());
    assert!(!ViralLoadResult::Copies(1000).is_suppressed());

    assert_eq!("suppressed".parse::<ViralLoadResult>().unwrap(), ViralLoadResult::Suppressed);
    assert_eq!("250".parse::<ViralLoadResult>().unwrap(), ViralLoadResult::Copies(250));
    assert!("lots".parse::<ViralLoadResult>().is_err());
}

#[test]
fn test_serialization_roundtrip() {
    let result = ViralLoadResult::Copies(45_000);
    let json = serde_json::to_string(&result).unwrap();
    let deserialized: ViralLoadResult = serde_json::from_str(&json).unwrap();
    assert_eq!(result, deserialized);

    let status = PatientStatus::ActiveDue;
    let json = serde_json::to_string(&status).unwrap();
    let deserialized: PatientStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(status, deserialized);
}
