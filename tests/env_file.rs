//! Loading the credential from a `.env` file.
//!
//! Kept in its own test binary because it changes process-wide environment.

use std::fs;

use ogstartup::Gemini;
use ogstartup::client::load_env_file_from;

#[test]
fn env_file_supplies_the_key_without_overriding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(
        &path,
        "api_key=from-dotenv\nOGSTARTUP_ENV_FILE_MARKER=loaded\nOGSTARTUP_ENV_FILE_PRESET=from-file\n",
    )
    .unwrap();

    // SAFETY: no other test in this binary reads or writes the environment.
    unsafe {
        std::env::set_var("OGSTARTUP_ENV_FILE_PRESET", "from-process");
    }

    load_env_file_from(&path).unwrap();

    assert_eq!(
        std::env::var("OGSTARTUP_ENV_FILE_MARKER").as_deref(),
        Ok("loaded")
    );
    assert_eq!(
        std::env::var("OGSTARTUP_ENV_FILE_PRESET").as_deref(),
        Ok("from-process")
    );
    assert!(std::env::var("api_key").is_ok());
    assert!(Gemini::new(None).unwrap().has_api_key());
}

#[test]
fn missing_env_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_env_file_from(dir.path().join("absent.env")).unwrap_err();
    assert!(matches!(err, ogstartup::Error::Io { .. }), "{err:?}");
}
