//! Prompt composition: date, transcript, and instruction structure.

use chrono::NaiveDate;
use pagepulse::analyzer::{build_prompt, ConversationInput, MessageInput};

fn sample_conversation() -> ConversationInput {
    ConversationInput {
        conversation_id: "thread-42".to_owned(),
        messages: vec![
            MessageInput {
                message: "السعر كام؟".to_owned(),
                sender: "Mona".to_owned(),
                created_time: "2025-05-01T10:00:00+0000".to_owned(),
            },
            MessageInput {
                message: "وصل النهاردة".to_owned(),
                sender: "Mona".to_owned(),
                created_time: "2025-05-02T10:00:00+0000".to_owned(),
            },
        ],
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

#[test]
fn prompt_embeds_iso_date() {
    let prompt = build_prompt(&sample_conversation(), today()).expect("should build");
    assert!(prompt.contains("2025-06-01"));
}

#[test]
fn prompt_embeds_full_transcript() {
    let prompt = build_prompt(&sample_conversation(), today()).expect("should build");

    assert!(prompt.contains("thread-42"));
    assert!(prompt.contains("السعر كام؟"));
    assert!(prompt.contains("وصل النهاردة"));
    assert!(prompt.contains("Mona"));
    assert!(prompt.contains("2025-05-01T10:00:00+0000"));
}

#[test]
fn prompt_establishes_persona_and_register() {
    let prompt = build_prompt(&sample_conversation(), today()).expect("should build");

    // Sales-assistant persona, colloquial register.
    assert!(prompt.contains("مساعد مبيعات"));
    assert!(prompt.contains("اكتب بالعامية"));
}

#[test]
fn prompt_requests_all_six_items_in_order() {
    let prompt = build_prompt(&sample_conversation(), today()).expect("should build");

    let positions: Vec<usize> = (1..=6)
        .map(|n| {
            prompt
                .find(&format!("{n}."))
                .unwrap_or_else(|| panic!("item {n} missing from prompt"))
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));

    // Subscription check names the keyword; the opening message must be
    // isolated on its own line.
    assert!(prompt.contains("\"وصل\""));
    assert!(prompt.contains("سطر لوحدها"));
}

#[test]
fn prompt_handles_empty_conversation() {
    let conversation = ConversationInput {
        conversation_id: "empty".to_owned(),
        messages: vec![],
    };
    let prompt = build_prompt(&conversation, today()).expect("should build");
    assert!(prompt.contains("empty"));
}
