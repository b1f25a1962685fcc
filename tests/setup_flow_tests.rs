//! Setup handshake against a mock appliance

mod common;

use common::MockComfoclime;
use comfoclime::setup::{AbortReason, ConfigFlow, EntryRegistry, FlowResult, UserInput};
use comfoclime::SetupError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

fn flow() -> (ConfigFlow, Arc<EntryRegistry>) {
    let entries = Arc::new(EntryRegistry::new());
    (ConfigFlow::new(entries.clone()), entries)
}

fn form_error(code: SetupError) -> FlowResult {
    FlowResult::ShowForm { error: Some(code) }
}

#[tokio::test]
async fn test_creates_entry_for_reachable_appliance() {
    let mock = MockComfoclime::with_single_system().await;
    let (flow, entries) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;
    let FlowResult::CreateEntry { entry } = result.clone() else {
        panic!("expected an entry, got {result:?}");
    };

    let address = mock.server.address();
    let unique_id = format!("{}:{}", address.ip(), address.port());
    assert_eq!(entry.unique_id, unique_id);
    assert_eq!(entry.title, format!("Comfoclime {unique_id}"));
    assert_eq!(entry.data.port, address.port());
    assert_eq!(entries.entries().await, vec![entry]);
}

#[tokio::test]
async fn test_empty_systems_list() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems(json!({"systems": []})).await;
    let (flow, entries) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;

    assert_eq!(result, form_error(SetupError::NoSystemsFound));
    assert!(entries.is_empty().await);
}

#[tokio::test]
async fn test_missing_or_null_systems_list() {
    for body in [json!({}), json!({"systems": null})] {
        let mock = MockComfoclime::start().await;
        mock.mock_systems(body).await;
        let (flow, _) = flow();

        let result = flow.step_user(Some(mock.user_input())).await;
        assert_eq!(result, form_error(SetupError::NoSystemsFound));
    }
}

#[tokio::test]
async fn test_timeout_is_cannot_connect() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems_response(
        ResponseTemplate::new(200)
            .set_body_json(json!({"systems": [{"uuid": "abc"}]}))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let entries = Arc::new(EntryRegistry::new());
    let flow = ConfigFlow::new(entries.clone()).with_timeout(Duration::from_millis(200));

    let result = flow.step_user(Some(mock.user_input())).await;

    assert_eq!(result, form_error(SetupError::CannotConnect));
    assert!(entries.is_empty().await);
}

#[tokio::test]
async fn test_error_status_is_cannot_connect() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems_response(ResponseTemplate::new(500)).await;
    let (flow, _) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;
    assert_eq!(result, form_error(SetupError::CannotConnect));
}

#[tokio::test]
async fn test_non_ok_success_status_is_cannot_connect() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems_response(
        ResponseTemplate::new(203).set_body_json(json!({"systems": [{"uuid": "abc"}]})),
    )
    .await;
    let (flow, entries) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;

    assert_eq!(result, form_error(SetupError::CannotConnect));
    assert!(entries.is_empty().await);
}

#[tokio::test]
async fn test_no_content_is_cannot_connect() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems_response(ResponseTemplate::new(204)).await;
    let (flow, entries) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;

    assert_eq!(result, form_error(SetupError::CannotConnect));
    assert!(entries.is_empty().await);
}

#[tokio::test]
async fn test_unreachable_appliance_is_cannot_connect() {
    let address = {
        let server = MockServer::start().await;
        *server.address()
    };
    let (flow, _) = flow();

    let input = UserInput::new(address.ip().to_string()).with_port(address.port());
    let result = flow.step_user(Some(input)).await;
    assert_eq!(result, form_error(SetupError::CannotConnect));
}

#[tokio::test]
async fn test_malformed_body_is_unknown() {
    let mock = MockComfoclime::start().await;
    mock.mock_systems_response(ResponseTemplate::new(200).set_body_string("not json"))
        .await;
    let (flow, entries) = flow();

    let result = flow.step_user(Some(mock.user_input())).await;

    assert_eq!(result, form_error(SetupError::Unknown));
    assert!(entries.is_empty().await);
}

#[tokio::test]
async fn test_duplicate_appliance_aborts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/system/systems"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"systems": [{"uuid": "abc"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (flow, entries) = flow();
    let input = UserInput::new(server.address().ip().to_string()).with_port(server.address().port());

    assert!(matches!(
        flow.step_user(Some(input.clone())).await,
        FlowResult::CreateEntry { .. }
    ));
    assert_eq!(
        flow.step_user(Some(input)).await,
        FlowResult::Abort {
            reason: AbortReason::AlreadyConfigured
        }
    );
    assert_eq!(entries.len().await, 1);
}

#[tokio::test]
async fn test_flow_result_serialization() {
    let result = form_error(SetupError::CannotConnect);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"type": "show_form", "error": "cannot_connect"})
    );

    let result = FlowResult::Abort {
        reason: AbortReason::AlreadyConfigured,
    };
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"type": "abort", "reason": "already_configured"})
    );
}
