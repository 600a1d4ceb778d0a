#![no_main]

//! Fuzz target for reading the persisted timer file.
//!
//! Whatever bytes end up in timer.json, loading must either yield a valid
//! session or a corrupt-state error. It must never panic.

use libfuzzer_sys::fuzz_target;
use tempfile::tempdir;

use redminecli::error::TimerError;
use redminecli::store::{parse_session, FileSessionStore, SessionStore};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(session) = parse_session(text) {
            assert!(session.issue_id > 0);
        }
    }

    let dir = match tempdir() {
        Ok(d) => d,
        Err(_) => return,
    };
    let store = FileSessionStore::in_dir(dir.path());
    if std::fs::write(store.path(), data).is_err() {
        return;
    }

    match store.load() {
        Ok(Some(session)) => {
            assert!(session.issue_id > 0);
            // A loaded session survives a save/load cycle unchanged.
            if store.save(&session).is_ok() {
                if let Ok(Some(again)) = store.load() {
                    assert_eq!(again, session);
                }
            }
        }
        Ok(None) => {}
        Err(TimerError::CorruptState { .. }) | Err(TimerError::Io { .. }) => {}
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});
