use livechat_summarizer::setup_logging;

#[test]
fn test_logging_setup() {
    // This test verifies that the logging setup function doesn't panic
    let result = std::panic::catch_unwind(|| {
        setup_logging();
    });

    assert!(result.is_ok(), "setup_logging function should not panic");
}

#[test]
fn test_logging_setup_twice() {
    // Both Lambda binaries and tests may initialize more than once per process
    setup_logging();
    setup_logging();
}
