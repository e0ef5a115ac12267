use chrono::{TimeZone, Utc};
use livechat_summarizer::core::config::FilterRules;
use livechat_summarizer::core::models::{AuthorRole, ChatMessage, ChatTranscript};
use livechat_summarizer::utils::filters::is_greeting_only;
use livechat_summarizer::utils::{MessageFilter, format_for_summarization};

fn customer(text: &str) -> ChatMessage {
    ChatMessage::new("m", AuthorRole::Customer, text)
}

fn no_patterns() -> FilterRules {
    FilterRules {
        remove_patterns: vec![],
        ..FilterRules::default()
    }
}

#[test]
fn test_short_messages_always_excluded() {
    // Even with every other rule switched off
    let rules = FilterRules {
        remove_system_messages: false,
        remove_agent_signatures: false,
        min_message_length: 5,
        remove_patterns: vec![],
        include_greetings: true,
    };
    let filter = MessageFilter::new(rules);

    assert!(!filter.should_include(&customer("abcd")));
    assert!(!filter.should_include(&customer("   ab   ")));
    assert!(filter.should_include(&customer("abcde")));
    assert!(filter.should_include(&ChatMessage::new("s", AuthorRole::System, "  hello world ")));
}

#[test]
fn test_min_length_counts_characters() {
    let filter = MessageFilter::new(FilterRules {
        min_message_length: 3,
        ..no_patterns()
    });
    assert!(filter.should_include(&customer("ééé")));
    assert!(!filter.should_include(&customer("éé")));
}

#[test]
fn test_system_messages_removed_only_by_role() {
    let filter = MessageFilter::new(no_patterns());

    assert!(!filter.should_include(&ChatMessage::new("1", AuthorRole::System, "Chat transferred")));
    assert!(filter.should_include(&ChatMessage::new("2", AuthorRole::Agent, "Chat transferred")));
    assert!(filter.should_include(&customer("Chat transferred")));

    let keep_system = MessageFilter::new(FilterRules {
        remove_system_messages: false,
        ..no_patterns()
    });
    assert!(keep_system.should_include(&ChatMessage::new("1", AuthorRole::System, "Chat transferred")));
}

#[test]
fn test_signatures_removed_in_any_case() {
    let filter = MessageFilter::new(no_patterns());

    for text in [
        "Best regards",
        "  BEST REGARDS  ",
        "best regard,",
        "Kind regards",
        "Sincerely,",
        "Thanks",
        "thank",
        "-----",
        "====",
        "[signature] Bob from Support",
    ] {
        let msg = ChatMessage::new("a", AuthorRole::Agent, text);
        assert!(!filter.should_include(&msg), "expected {text:?} to be removed");
    }
}

#[test]
fn test_signature_patterns_match_whole_text_only() {
    let filter = MessageFilter::new(no_patterns());

    assert!(filter.should_include(&customer("Best regards to your team, the fix worked")));
    assert!(filter.should_include(&customer("Thanks for the quick refund")));
    assert!(filter.should_include(&customer("see [signature] below")));
}

#[test]
fn test_signatures_kept_when_rule_disabled() {
    let filter = MessageFilter::new(FilterRules {
        remove_agent_signatures: false,
        ..no_patterns()
    });
    assert!(filter.should_include(&customer("Best regards")));
}

#[test]
fn test_greeting_exemption() {
    let patterns = vec![r"^(hi|hello)\.?$".to_string()];

    let with_greetings = MessageFilter::new(FilterRules {
        min_message_length: 2,
        remove_patterns: patterns.clone(),
        include_greetings: true,
        ..FilterRules::default()
    });
    assert!(with_greetings.should_include(&customer("Hi")));

    let without_greetings = MessageFilter::new(FilterRules {
        min_message_length: 2,
        remove_patterns: patterns,
        include_greetings: false,
        ..FilterRules::default()
    });
    assert!(!without_greetings.should_include(&customer("Hi")));
}

#[test]
fn test_greeting_exemption_is_per_pattern() {
    // Both patterns match a bare greeting; the exemption skips each one in turn
    let filter = MessageFilter::new(FilterRules {
        min_message_length: 2,
        remove_patterns: vec![r"^hello$".to_string(), r"hell".to_string()],
        include_greetings: true,
        ..FilterRules::default()
    });
    assert!(filter.should_include(&customer("Hello")));

    // A non-greeting matching a later pattern is still removed
    assert!(!filter.should_include(&customer("Hello there, hell of a day")));
}

#[test]
fn test_patterns_match_anywhere_case_insensitive() {
    let filter = MessageFilter::new(FilterRules {
        remove_patterns: vec!["password".to_string()],
        ..FilterRules::default()
    });
    assert!(!filter.should_include(&customer("My PASSWORD is hunter2")));
    assert!(filter.should_include(&customer("My order is late")));
}

#[test]
fn test_patterns_are_multiline() {
    let filter = MessageFilter::new(FilterRules {
        remove_patterns: vec![r"^ref:".to_string()],
        ..FilterRules::default()
    });
    assert!(!filter.should_include(&customer("Order details\nref: 1234")));
}

#[test]
fn test_invalid_patterns_are_skipped() {
    let filter = MessageFilter::new(FilterRules {
        remove_patterns: vec!["(unclosed".to_string(), "refund".to_string()],
        ..FilterRules::default()
    });
    assert_eq!(filter.pattern_count(), 1);
    assert!(!filter.should_include(&customer("I want a refund")));
    assert!(filter.should_include(&customer("Where is my parcel")));
}

#[test]
fn test_lookahead_patterns_are_applied() {
    let filter = MessageFilter::new(FilterRules {
        remove_patterns: vec![r"^(?!order).*refund".to_string()],
        ..FilterRules::default()
    });
    assert_eq!(filter.pattern_count(), 1);
    assert!(!filter.should_include(&customer("I want a refund")));
    assert!(filter.should_include(&customer("Order refund status please")));
}

#[test]
fn test_backreference_patterns_are_applied() {
    let filter = MessageFilter::new(FilterRules {
        remove_patterns: vec![r"\b(\w+) \1\b".to_string()],
        ..FilterRules::default()
    });
    assert_eq!(filter.pattern_count(), 1);
    assert!(!filter.should_include(&customer("please please help")));
    assert!(filter.should_include(&customer("please help me")));
}

#[test]
fn test_is_greeting_only() {
    for text in ["hi", "Hello.", "HEY!", "thank you", "Good morning", "good  evening!  "] {
        assert!(is_greeting_only(text), "expected {text:?} to be a greeting");
    }
    for text in ["hi there", "hello, my order", "thanks a lot", "morning"] {
        assert!(!is_greeting_only(text), "expected {text:?} not to be a greeting");
    }
}

fn sample_transcript() -> ChatTranscript {
    let mut t = ChatTranscript::new("CHAT42");
    t.thread_id = Some("TH1".to_string());
    t.customer_name = Some("Jane".to_string());
    t.agent_ids = vec!["agent@example.com".to_string()];
    t.messages = vec![
        ChatMessage::new("1", AuthorRole::System, "Chat started"),
        customer("Hello"),
        customer("My package arrived damaged"),
        ChatMessage::new("4", AuthorRole::Agent, "Sorry to hear that, sending a replacement"),
        ChatMessage::new("5", AuthorRole::Agent, "Best regards"),
        customer("ok"),
    ];
    t
}

#[test]
fn test_filter_transcript_keeps_metadata_and_order() {
    let filter = MessageFilter::new(FilterRules::default());
    let original = sample_transcript();
    let filtered = filter.filter_transcript(&original);

    let texts: Vec<&str> = filtered.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Hello",
            "My package arrived damaged",
            "Sorry to hear that, sending a replacement"
        ]
    );
    assert_eq!(filtered.chat_id, "CHAT42");
    assert_eq!(filtered.thread_id.as_deref(), Some("TH1"));
    assert_eq!(filtered.customer_name.as_deref(), Some("Jane"));
    assert_eq!(filtered.agent_ids, original.agent_ids);

    // Input untouched
    assert_eq!(original.messages.len(), 6);
}

#[test]
fn test_filtering_is_idempotent() {
    let filter = MessageFilter::new(FilterRules::default());
    let once = filter.filter_transcript(&sample_transcript());
    let twice = filter.filter_transcript(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_format_for_summarization_exact_output() {
    let mut transcript = ChatTranscript::new("CHAT1");
    transcript.customer_name = Some("Jane".to_string());
    transcript.messages.push(
        ChatMessage::new("m1", AuthorRole::Agent, "On it")
            .with_author(Some("bob@example.com".to_string()), Some("Bob".to_string()))
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()),
    );

    assert_eq!(
        format_for_summarization(&transcript),
        "Customer: Jane\n\n[14:05] Bob: On it"
    );
}

#[test]
fn test_format_falls_back_to_email_and_role_label() {
    let mut transcript = ChatTranscript::new("CHAT1");
    transcript.customer_email = Some("jane@example.com".to_string());
    transcript.messages = vec![
        customer("Where is my order?"),
        ChatMessage::new("2", AuthorRole::Agent, "Checking now")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 9, 9, 7, 0).unwrap()),
    ];

    assert_eq!(
        format_for_summarization(&transcript),
        "Customer: jane@example.com\n\n[] Customer: Where is my order?\n[09:07] Agent: Checking now"
    );
}

#[test]
fn test_format_without_customer_has_no_header() {
    let mut transcript = ChatTranscript::new("CHAT1");
    transcript.messages.push(ChatMessage::new("1", AuthorRole::System, "Chat closed"));
    assert_eq!(format_for_summarization(&transcript), "[] System: Chat closed");

    assert_eq!(format_for_summarization(&ChatTranscript::new("EMPTY")), "");
}
