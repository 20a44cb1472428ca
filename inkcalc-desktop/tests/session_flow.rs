//! End-to-end session tests against a mocked analysis service (inkcalc-desktop).

use std::sync::Arc;
use std::time::Duration;

use inkcalc_client::AnalysisClient;
use inkcalc_core::{
    BindingValue, Color, DrawingSurface, InputEvent, MemorySink, Notification, Point,
    SubmissionState, Viewport,
};
use inkcalc_desktop::{
    Completion, Session, SessionConfig, SubmitError, ENCODING_FAILED_MESSAGE, SUCCESS_MESSAGE,
};
use inkcalc_renderer::ImagePackager;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_with(server: &MockServer, config: SessionConfig) -> (Session, MemorySink) {
    let client = AnalysisClient::new(&server.uri()).expect("client");
    let sink = MemorySink::new();
    let session = Session::mount(
        &Viewport::new(160, 140, 20),
        client,
        Arc::new(sink.clone()),
        config,
    )
    .expect("session");
    (session, sink)
}

fn draw_line(session: &mut Session, from: (f32, f32), to: (f32, f32)) {
    session.pointer_down(Point::new(from.0, from.1));
    session.pointer_move(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
    session.pointer_move(Point::new(to.0, to.1));
    session.pointer_up();
}

async fn mount_response(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/api/analyze-image"))
        .respond_with(template)
        .mount(server)
        .await;
}

fn results(items: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "results": items }))
}

fn body_contains(body: &[u8], needle: &[u8]) -> bool {
    body.windows(needle.len()).any(|w| w == needle)
}

// ==========================================================================
// Gating
// ==========================================================================

#[tokio::test]
async fn test_empty_canvas_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(results(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    // Black ink leaves RGB at zero.
    session.select_color(Color::BLACK);
    draw_line(&mut session, (10.0, 10.0), (100.0, 100.0));

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::EmptyCanvas));
    assert_eq!(
        sink.notifications(),
        vec![Notification::error("Please draw something first!")]
    );
    assert_eq!(session.submission_state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_second_submission_while_loading_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(results(json!([{ "expr": "1+2", "result": "3", "assigned": false }])))
        .expect(1)
        .mount(&server)
        .await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (10.0, 60.0), (150.0, 60.0));

    let pending = session.prepare().expect("first");
    assert_eq!(session.submission_state(), SubmissionState::Loading);
    assert!(matches!(session.prepare(), Err(SubmitError::Busy)));
    assert!(sink.notifications().is_empty());

    let outcome = pending.run().await;
    assert_eq!(session.submission_state(), SubmissionState::Idle);
    let completion = session.complete(outcome).expect("completion");
    assert!(matches!(completion, Completion::Shown(_)));
}

// ==========================================================================
// Responses
// ==========================================================================

#[tokio::test]
async fn test_success_shows_expression_and_result() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "2+2", "result": "4", "assigned": false }])),
    )
    .await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));

    let completion = session.submit().await.expect("submit");
    let shown = session.overlay().current().expect("overlay");
    assert_eq!(
        shown.lines(),
        ["Expression: 2+2".to_string(), "Result: 4".to_string()]
    );
    assert_eq!(completion, Completion::Shown(shown.clone()));
    assert_eq!(sink.notifications(), vec![Notification::success(SUCCESS_MESSAGE)]);
    assert!(session.bindings().is_empty());
}

#[tokio::test]
async fn test_empty_results_notify_without_overlay() {
    let server = MockServer::start().await;
    mount_response(&server, results(json!([]))).await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Analysis(_)));
    assert!(!session.overlay().is_visible());
    assert_eq!(sink.notifications(), vec![Notification::error("No results found")]);
    assert_eq!(session.submission_state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_service_error_message_reaches_notification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({ "error": "bad image" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));

    assert!(session.submit().await.is_err());
    assert!(session.submit().await.is_err());
    assert_eq!(
        sink.notifications(),
        vec![
            Notification::error("bad image"),
            Notification::error("Failed to analyze image"),
        ]
    );
    assert!(!session.overlay().is_visible());
    assert_eq!(session.submission_state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_encoding_failure_aborts_before_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(results(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = AnalysisClient::new(&server.uri()).expect("client");
    let sink = MemorySink::new();
    // Wider than a JPEG can describe.
    let surface = DrawingSurface::new(70_000, 4).expect("surface");
    let mut session = Session::new(
        surface,
        client,
        Arc::new(sink.clone()),
        SessionConfig::default(),
    );
    draw_line(&mut session, (10.0, 2.0), (500.0, 2.0));
    assert!(!session.surface().is_empty());

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmitError::Encoding(_)), "got {err:?}");
    assert_eq!(
        sink.notifications(),
        vec![Notification::error(ENCODING_FAILED_MESSAGE)]
    );
    assert_eq!(session.submission_state(), SubmissionState::Idle);
    assert!(!session.overlay().is_visible());
}

// ==========================================================================
// Overlay lifecycle
// ==========================================================================

#[tokio::test]
async fn test_dismiss_keeps_pixels_and_bindings() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "x", "result": "5", "assigned": true }])),
    )
    .await;

    let (mut session, _sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));
    session.submit().await.expect("submit");

    let pixels = session.surface().data().to_vec();
    let bindings = session.bindings().clone();
    session.dismiss();

    assert!(!session.overlay().is_visible());
    assert_eq!(session.surface().data(), pixels.as_slice());
    assert_eq!(session.bindings(), &bindings);
    assert_eq!(session.bindings().get("x"), Some(&BindingValue::Number(5.0)));
}

#[tokio::test]
async fn test_reset_clears_surface_and_overlay_but_not_bindings() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "y", "result": "abc", "assigned": true }])),
    )
    .await;

    let (mut session, _sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));
    session.submit().await.expect("submit");
    assert!(session.overlay().is_visible());

    session.reset();
    assert!(session.surface().is_empty());
    assert!(!session.overlay().is_visible());
    assert_eq!(
        session.bindings().get("y"),
        Some(&BindingValue::Text("abc".into()))
    );

    session.clear_variables();
    assert!(session.bindings().is_empty());
}

#[tokio::test]
async fn test_new_submission_hides_previous_result_while_loading() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "3*3", "result": "9", "assigned": false }])),
    )
    .await;

    let (mut session, _sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));
    session.submit().await.expect("first");
    assert!(session.overlay().is_visible());

    let pending = session.prepare().expect("second");
    assert!(!session.overlay().is_visible());
    let outcome = pending.run().await;
    session.complete(outcome).expect("complete");
    assert!(session.overlay().is_visible());
}

// ==========================================================================
// In-flight behavior
// ==========================================================================

#[tokio::test]
async fn test_strokes_during_flight_do_not_change_payload() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "1", "result": "1", "assigned": false }]))
            .set_delay(Duration::from_millis(50)),
    )
    .await;

    let (mut session, _sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 20.0));

    let pending = session.prepare().expect("pending");
    let expected = ImagePackager::with_defaults()
        .encode_jpeg(pending.snapshot())
        .expect("jpeg");

    // Keep drawing while the request is out.
    draw_line(&mut session, (20.0, 100.0), (140.0, 100.0));
    let outcome = pending.run().await;
    let completion = session.complete(outcome).expect("complete");
    assert!(matches!(completion, Completion::Shown(_)));

    assert_eq!(session.surface().pixel(80, 100).map(|p| p[3]), Some(255));
    let requests = server.received_requests().await.expect("recording");
    assert_eq!(requests.len(), 1);
    assert!(body_contains(&requests[0].body, &expected));
}

#[tokio::test]
async fn test_reset_during_flight_discards_response() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "z", "result": "8", "assigned": true }])),
    )
    .await;

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));

    let pending = session.prepare().expect("pending");
    session.reset();
    let outcome = pending.run().await;

    assert_eq!(session.complete(outcome).expect("complete"), Completion::Discarded);
    assert!(!session.overlay().is_visible());
    assert!(session.bindings().is_empty());
    assert!(sink.notifications().is_empty());
    assert_eq!(session.submission_state(), SubmissionState::Idle);
}

// ==========================================================================
// Variable bindings
// ==========================================================================

#[tokio::test]
async fn test_assigned_result_feeds_next_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(results(json!([{ "expr": "x", "result": "2", "assigned": true }])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(results(json!([{ "expr": "x+1", "result": "3", "assigned": false }])))
        .mount(&server)
        .await;

    let (mut session, _sink) = session_with(&server, SessionConfig::default());
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));
    session.submit().await.expect("first");
    session.reset();
    draw_line(&mut session, (30.0, 30.0), (130.0, 30.0));

    let pending = session.prepare().expect("second");
    assert_eq!(
        pending.variables().get("x"),
        Some(&BindingValue::Number(2.0))
    );
    let outcome = pending.run().await;
    session.complete(outcome).expect("second");

    let requests = server.received_requests().await.expect("recording");
    assert_eq!(requests.len(), 2);
    assert!(body_contains(&requests[0].body, b"{}"));
    assert!(body_contains(&requests[1].body, br#"{"x":2.0}"#));
    assert_eq!(
        session.overlay().current().map(|r| r.value.as_str()),
        Some("3")
    );
}

#[tokio::test]
async fn test_merge_can_be_disabled() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "x", "result": "2", "assigned": true }])),
    )
    .await;

    let config = SessionConfig {
        merge_assigned: false,
        ..SessionConfig::default()
    };
    let (mut session, _sink) = session_with(&server, config);
    draw_line(&mut session, (20.0, 20.0), (120.0, 90.0));
    session.submit().await.expect("submit");

    assert!(session.bindings().is_empty());
    assert!(session.overlay().is_visible());
}

// ==========================================================================
// Scripted replay
// ==========================================================================

#[tokio::test]
async fn test_script_replay_from_file() {
    let server = MockServer::start().await;
    mount_response(
        &server,
        results(json!([{ "expr": "7-2", "result": "5", "assigned": false }])),
    )
    .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let script_path = dir.path().join("strokes.json");
    std::fs::write(
        &script_path,
        r#"[
            {"type": "submit"},
            {"type": "select_swatch", "data": {"index": 6}},
            {"type": "pointer_move", "data": {"x": 5.0, "y": 5.0}},
            {"type": "pointer_down", "data": {"x": 10.0, "y": 40.0}},
            {"type": "pointer_move", "data": {"x": 60.0, "y": 40.0}},
            {"type": "pointer_leave"},
            {"type": "pointer_move", "data": {"x": 60.0, "y": 100.0}},
            {"type": "submit"}
        ]"#,
    )
    .expect("write");

    let (mut session, sink) = session_with(&server, SessionConfig::default());
    assert_eq!(session.palette().get(6), Some(Color::rgb(0x22, 0x8b, 0xe6)));
    let script = std::fs::read_to_string(&script_path).expect("read");
    let events = InputEvent::parse_script(&script).expect("parse");

    let mut outcomes = Vec::new();
    for event in &events {
        if let Some(outcome) = session.dispatch(event).await {
            outcomes.push(outcome);
        }
    }

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0], Err(SubmitError::EmptyCanvas)));
    assert!(matches!(outcomes[1], Ok(Completion::Shown(_))));
    assert!(!session.is_drawing());
    assert_eq!(session.color(), Color::rgb(0x22, 0x8b, 0xe6));
    // Move after leaving the surface drew nothing.
    assert_eq!(session.surface().pixel(60, 80), Some([0, 0, 0, 0]));
    assert_eq!(
        sink.notifications(),
        vec![
            Notification::error("Please draw something first!"),
            Notification::success(SUCCESS_MESSAGE),
        ]
    );
}
