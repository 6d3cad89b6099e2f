//! Lifecycle tests for the process-wide facade. The facade holds one
//! process-global connection slot, so every step lives in a single test
//! function to keep the ordering deterministic.

#[test]
fn facade_lifecycle() {
    // Before any init, session listing is absent -- not an empty list
    assert!(
        bemedia::list_sessions().is_none(),
        "list_sessions() must be absent before init()"
    );

    // First init can only succeed where a platform backend exists (the
    // session manager itself still gets a vote on Windows)
    let first = bemedia::init();
    if cfg!(not(target_os = "windows")) {
        assert!(!first, "Unsupported platforms must refuse to initialize");
    }

    // Re-init is a no-op that reports failure, with or without a backend
    assert!(!bemedia::init(), "Second init() must report false");
    assert!(
        !bemedia::init_with_config(bemedia::TransportConfig::default()),
        "Config variant must refuse re-init the same way"
    );

    if first {
        // Initialized: enumeration answers, possibly with an empty list
        let sessions = bemedia::list_sessions();
        assert!(
            sessions.is_some(),
            "Initialized bridge must answer enumeration"
        );
        for session in sessions.unwrap() {
            assert_eq!(
                session.has_thumbnail(),
                !session.thumbnail().is_empty(),
                "Thumbnail flag must match buffer length"
            );
        }
    } else {
        // Unsupported is terminal: calls keep failing gracefully
        assert!(bemedia::list_sessions().is_none());
    }
}
