//! Interrupt, wake-word, envelope and classification behaviour of a turn.

use crate::helpers::{Harness, RecordingControl, Scripted, ScriptedClassifier, call_payload, spoken};
use parley::intent::ClassifierSignal;
use parley::pipeline::messages::TurnStage;
use parley::{SessionConfig, TurnOutcome};

#[tokio::test]
async fn stop_phrase_stops_and_acknowledges() {
    let h = Harness::scripted(vec![], vec![]);
    let outcome = h.resolver.handle_user_intent(&h.session, "停止回答").await;

    assert!(matches!(outcome, TurnOutcome::Stopped));
    assert!(outcome.handled());
    assert_eq!(h.control.stops(), 1);
    assert_eq!(h.control.closes(), 0);
    assert_eq!(h.control.echoes(), vec!["停止回答", "好的，我已经停止回答了"]);

    let segments = h.session.speech().drain();
    assert_eq!(spoken(&segments), vec!["好的，我已经停止回答了"]);
    assert_eq!(segments.len(), 3);
    assert!(segments.iter().all(|s| s.turn_id == segments[0].turn_id));
    assert!(h.session.current_turn_id().is_none());
    assert!(h.session.dialogue().is_empty());
    assert!(h.classifier().detected().is_empty());
}

#[tokio::test]
async fn any_text_containing_a_stop_keyword_stops_once() {
    for text in ["请STOP一下", "你别说了好吗", "Enough!", "好了好了，够了。", "Shut Up please"] {
        let h = Harness::scripted(vec![], vec![]);
        let outcome = h.resolver.handle_user_intent(&h.session, text).await;
        assert!(matches!(outcome, TurnOutcome::Stopped), "{text}");
        assert_eq!(h.control.stops(), 1, "{text}");
    }
}

#[tokio::test]
async fn failed_stop_is_not_handled_and_not_acknowledged() {
    let h = Harness::new(
        SessionConfig::default(),
        RecordingControl::failing_stop(),
        vec![],
        Some(ScriptedClassifier::new(vec![])),
    );
    let outcome = h.resolver.handle_user_intent(&h.session, "停止回答").await;

    assert!(!outcome.handled());
    assert_eq!(h.control.stops(), 1);
    assert_eq!(h.control.echoes(), vec!["停止回答"]);
    assert!(h.session.speech().is_empty());
    assert!(!h.session.is_aborted());
}

#[tokio::test]
async fn exact_exit_phrase_closes_session() {
    let h = Harness::scripted(vec![], vec![]);
    let outcome = h.resolver.handle_user_intent(&h.session, "退出。").await;

    assert!(matches!(outcome, TurnOutcome::Closed));
    assert_eq!(h.control.closes(), 1);
    assert_eq!(h.control.echoes(), vec!["退出"]);
    assert_eq!(h.control.stops(), 0);
}

#[tokio::test]
async fn exit_phrase_inside_sentence_does_not_close() {
    let h = Harness::scripted(vec![], vec![]);
    let outcome = h
        .resolver
        .handle_user_intent(&h.session, "我想知道怎么退出这个应用")
        .await;

    assert!(matches!(outcome, TurnOutcome::NotHandled));
    assert_eq!(h.control.closes(), 0);
    assert_eq!(h.classifier().detected(), vec!["我想知道怎么退出这个应用"]);
}

#[tokio::test]
async fn configured_exit_commands_are_honoured() {
    let mut config = SessionConfig::default();
    config.interrupt.exit_commands = vec!["再见".into()];
    let h = Harness::new(config, RecordingControl::default(), vec![], None);

    assert!(matches!(
        h.resolver.handle_user_intent(&h.session, "再见").await,
        TurnOutcome::Closed
    ));
    assert!(matches!(
        h.resolver.handle_user_intent(&h.session, "退出").await,
        TurnOutcome::NotHandled
    ));
    assert_eq!(h.control.closes(), 1);
}

#[tokio::test]
async fn exit_and_stop_phrases_come_from_the_session() {
    let mut session_config = SessionConfig::default();
    session_config.interrupt.exit_commands = vec!["再见".into()];
    session_config.interrupt.stop_keywords = vec!["暂停".into()];
    let h = Harness::with_session_config(
        SessionConfig::default(),
        &session_config,
        RecordingControl::default(),
        vec![],
        Some(ScriptedClassifier::new(vec![])),
    );

    assert!(matches!(
        h.resolver.handle_user_intent(&h.session, "再见").await,
        TurnOutcome::Closed
    ));
    assert_eq!(h.control.closes(), 1);
    assert!(matches!(
        h.resolver.handle_user_intent(&h.session, "退出").await,
        TurnOutcome::NotHandled
    ));
    assert!(matches!(
        h.resolver.handle_user_intent(&h.session, "暂停一下").await,
        TurnOutcome::Stopped
    ));
    assert_eq!(h.control.closes(), 1);
    assert_eq!(h.control.stops(), 1);
}

#[tokio::test]
async fn envelope_records_speaker_and_classifies_content() {
    let h = Harness::scripted(vec![], vec![]);
    let outcome = h
        .resolver
        .handle_user_intent(&h.session, r#"{"content":"你好","speaker":"Tom"}"#)
        .await;

    assert!(matches!(outcome, TurnOutcome::NotHandled));
    assert_eq!(h.session.speaker().as_deref(), Some("Tom"));
    assert_eq!(h.classifier().detected(), vec!["你好"]);
}

#[tokio::test]
async fn malformed_envelope_is_plain_text() {
    let h = Harness::scripted(vec![], vec![]);
    let raw = r#"{"content": 42}"#;
    h.resolver.handle_user_intent(&h.session, raw).await;

    assert!(h.session.speaker().is_none());
    assert_eq!(h.classifier().detected(), vec![raw]);
}

#[tokio::test]
async fn wake_phrase_is_consumed_before_classification() {
    let h = Harness::scripted(vec![], vec![]);
    let outcome = h.resolver.handle_user_intent(&h.session, "你好小智").await;

    assert!(matches!(outcome, TurnOutcome::WakeWord));
    assert_eq!(spoken(&h.session.speech().drain()), vec!["我在呢，请说。"]);
    assert!(h.classifier().detected().is_empty());
}

#[tokio::test]
async fn continue_sentinel_is_never_handled() {
    for arguments in [
        serde_json::json!({}),
        serde_json::json!({"response": "随便聊聊"}),
        serde_json::Value::Null,
    ] {
        let h = Harness::scripted(vec![], vec![call_payload("continue_chat", arguments)]);
        let outcome = h.resolver.handle_user_intent(&h.session, "讲个笑话").await;
        assert!(matches!(outcome, TurnOutcome::NotHandled));
        assert!(h.session.current_turn_id().is_none());
        assert!(h.session.speech().is_empty());
    }
}

#[tokio::test]
async fn classifier_failure_degrades_to_chat() {
    let h = Harness::scripted(vec![], vec![Scripted::Fail]);
    let outcome = h.resolver.handle_user_intent(&h.session, "今天几号").await;

    assert!(matches!(outcome, TurnOutcome::NotHandled));
    assert!(h.session.speech().is_empty());
    assert!(h.session.dialogue().is_empty());
    assert_eq!(h.session.stage(), TurnStage::Idle);
}

#[tokio::test]
async fn unparseable_payload_degrades_to_chat() {
    let h = Harness::scripted(vec![], vec![Scripted::payload("{function_call: oops")]);
    let outcome = h.resolver.handle_user_intent(&h.session, "今天几号").await;
    assert!(matches!(outcome, TurnOutcome::NotHandled));
}

#[tokio::test]
async fn classifier_stop_signal_is_already_handled() {
    let h = Harness::scripted(
        vec![],
        vec![Scripted::Signal(ClassifierSignal::StopCommand)],
    );
    let outcome = h
        .resolver
        .handle_user_intent(&h.session, "你能先安静一下吗")
        .await;

    assert!(matches!(outcome, TurnOutcome::StopAlreadyHandled));
    assert_eq!(h.control.stops(), 1);
    assert!(h.session.is_aborted());
}

#[tokio::test]
async fn classifier_stop_signal_with_failing_stop_falls_through() {
    let h = Harness::new(
        SessionConfig::default(),
        RecordingControl::failing_stop(),
        vec![],
        Some(ScriptedClassifier::new(vec![Scripted::Signal(
            ClassifierSignal::StopCommand,
        )])),
    );
    let outcome = h.resolver.handle_user_intent(&h.session, "安静").await;
    assert!(matches!(outcome, TurnOutcome::NotHandled));
}
