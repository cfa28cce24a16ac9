use panelsync_sync::transport::mock::MockTransport;
use panelsync_sync::ui::mock::RecordingUi;
use panelsync_sync::{
    ControlBinding, ControllerConfig, InputEvent, PanelEvent, PanelUi, StreamingStatus,
    SyncController, TransportEvent,
};
use panelsync_types::{FramePayload, Payload, Value, VariableSet};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;

type Controller = SyncController<RecordingUi, MockTransport>;

fn make_controller_with(config: ControllerConfig) -> (Controller, RecordingUi, MockTransport) {
    let ui = RecordingUi::new();
    let transport = MockTransport::new();
    let controller = SyncController::new(config, ui.clone(), transport.clone()).unwrap();
    (controller, ui, transport)
}

fn make_controller() -> (Controller, RecordingUi, MockTransport) {
    make_controller_with(ControllerConfig::default())
}

fn motor_config() -> ControllerConfig {
    ControllerConfig {
        controls: vec![
            ControlBinding::toggle("play", false),
            ControlBinding::toggle("direction", false),
            ControlBinding::slider("speed", 0.0),
        ],
        ..Default::default()
    }
}

fn buttons(btn1: bool, btn2: bool, btn3: bool) -> VariableSet {
    VariableSet::new()
        .with("btn1", btn1)
        .with("btn2", btn2)
        .with("btn3", btn3)
}

fn push(set: VariableSet) -> TransportEvent {
    TransportEvent::Message(PanelEvent::PushState(Payload::from(set)))
}

// ── Construction ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn controller_paints_initial_state() {
    let (controller, ui, transport) = make_controller();
    assert_eq!(ui.checked("btn1"), Some(false));
    assert_eq!(ui.checked("ledSocket"), Some(false));
    assert!(!controller.is_locked());
    assert!(!controller.is_connected());
    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let config = ControllerConfig {
        controls: vec![],
        ..Default::default()
    };
    let result = SyncController::new(config, RecordingUi::new(), MockTransport::new());
    assert!(result.is_err());
}

// ── Connection ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn connect_joins_room_and_requests_state() {
    let (mut controller, ui, transport) = make_controller();
    controller.handle_transport(TransportEvent::Connected).await.unwrap();

    assert!(controller.is_connected());
    assert_eq!(ui.checked("ledSocket"), Some(true));
    assert_eq!(
        transport.sent(),
        vec![PanelEvent::JoinRoom("room-x".into()), PanelEvent::RequestState]
    );
}

#[tokio::test(start_paused = true)]
async fn connect_without_state_request() {
    let (mut controller, _ui, transport) = make_controller_with(ControllerConfig {
        request_state_on_connect: false,
        ..Default::default()
    });
    controller.connection_changed(true).await.unwrap();
    assert_eq!(transport.sent(), vec![PanelEvent::JoinRoom("room-x".into())]);
}

#[tokio::test(start_paused = true)]
async fn disconnect_clears_indicator() {
    let (mut controller, ui, _transport) = make_controller();
    controller.connection_changed(true).await.unwrap();
    controller.handle_transport(TransportEvent::Disconnected).await.unwrap();
    assert!(!controller.is_connected());
    assert_eq!(ui.checked("ledSocket"), Some(false));
}

#[tokio::test(start_paused = true)]
async fn reconnect_rejoins_room_and_requests_state() {
    let (mut controller, ui, transport) = make_controller();
    controller.handle_transport(TransportEvent::Connected).await.unwrap();
    controller.handle_transport(TransportEvent::Disconnected).await.unwrap();
    transport.clear();

    controller.handle_transport(TransportEvent::Connected).await.unwrap();
    assert!(controller.is_connected());
    assert_eq!(ui.checked("ledSocket"), Some(true));
    assert_eq!(
        transport.sent(),
        vec![PanelEvent::JoinRoom("room-x".into()), PanelEvent::RequestState]
    );
}

// ── Local edits ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn local_edit_sends_and_locks() {
    let (mut controller, ui, transport) = make_controller();
    controller.update_variable("btn1", Value::Bool(true)).await.unwrap();

    assert_eq!(controller.store().get("btn1"), Some(Value::Bool(true)));
    assert_eq!(controller.store().backup(), &buttons(false, false, false));
    assert_eq!(controller.store().status(), StreamingStatus::Pending);
    assert!(controller.is_locked());
    assert!(!ui.is_enabled("btn1"));
    assert!(!ui.is_enabled("btn3"));
    assert_eq!(
        transport.last_sent(),
        Some(PanelEvent::SendUpdate(Payload::from(buttons(true, false, false))))
    );
}

#[tokio::test(start_paused = true)]
async fn activated_reads_widget_value() {
    let (mut controller, ui, _transport) = make_controller();
    ui.toggle("btn2");
    controller
        .handle_input(InputEvent::Activated { key: "btn2".into() })
        .await
        .unwrap();
    assert_eq!(controller.store().get("btn2"), Some(Value::Bool(true)));
}

#[tokio::test(start_paused = true)]
async fn unknown_control_sends_nothing() {
    let (mut controller, _ui, transport) = make_controller();
    let result = controller
        .handle_input(InputEvent::Changed {
            key: "btn7".into(),
            value: Value::Bool(true),
        })
        .await;
    assert!(result.is_err());
    assert!(transport.sent().is_empty());
    assert!(!controller.is_locked());
}

#[tokio::test(start_paused = true)]
async fn disabled_store_does_not_lock() {
    let (mut controller, ui, transport) = make_controller_with(ControllerConfig {
        enabled: false,
        ..Default::default()
    });
    controller.update_variable("btn1", Value::Bool(true)).await.unwrap();
    assert!(!controller.is_locked());
    assert!(ui.is_enabled("btn1"));
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(controller.store().status(), StreamingStatus::Idle);
}

// ── Confirm or rollback ─────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn optimistic_edit_confirmed_by_push() {
    let (mut controller, ui, transport) = make_controller();
    controller.update_variable("btn1", Value::Bool(true)).await.unwrap();
    controller.handle_transport(push(buttons(true, false, false))).await.unwrap();

    let store = controller.store();
    assert_eq!(store.values(), &buttons(true, false, false));
    assert_eq!(store.backup(), &buttons(true, false, false));
    assert_eq!(store.status(), StreamingStatus::Idle);
    assert!(!store.timer().is_armed());
    assert!(!controller.is_locked());
    assert!(ui.is_enabled("btn1"));
    assert_eq!(ui.checked("btn1"), Some(true));
    assert_eq!(transport.last_sent(), Some(PanelEvent::AckState));
}

#[tokio::test(start_paused = true)]
async fn optimistic_edit_confirmed_by_ack() {
    let (mut controller, ui, _transport) = make_controller();
    controller.update_variable("btn2", Value::Bool(true)).await.unwrap();
    controller
        .handle_transport(TransportEvent::Message(PanelEvent::AckUpdate))
        .await
        .unwrap();

    assert_eq!(controller.store().get("btn2"), Some(Value::Bool(true)));
    assert!(!controller.is_locked());
    assert_eq!(ui.checked("btn2"), Some(true));
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_edit_rolls_back() {
    let (mut controller, mut ui, _transport) = make_controller_with(motor_config());
    ui.set_value("speed", 5.0);
    controller.update_variable("speed", Value::Number(5.0)).await.unwrap();

    controller.supervise();

    assert_eq!(controller.store().get("speed"), Some(Value::Number(0.0)));
    assert_eq!(ui.number("speed"), Some(0.0));
    assert!(ui.is_enabled("speed"));
    assert!(!controller.is_locked());
}

#[tokio::test(start_paused = true)]
async fn push_overrides_pending_edit() {
    let (mut controller, ui, _transport) = make_controller_with(motor_config());
    controller.update_variable("play", Value::Bool(true)).await.unwrap();

    let pushed = VariableSet::new()
        .with("play", false)
        .with("direction", true)
        .with("speed", 0);
    controller.handle_transport(push(pushed.clone())).await.unwrap();

    assert_eq!(controller.store().values(), &pushed);
    assert_eq!(controller.store().backup(), &pushed);
    assert_eq!(ui.checked("play"), Some(false));
    assert_eq!(ui.checked("direction"), Some(true));
}

#[tokio::test(start_paused = true)]
async fn send_failure_still_rolls_back() {
    let (mut controller, _ui, transport) = make_controller();
    transport.set_connected(false);
    controller.update_variable("btn1", Value::Bool(true)).await.unwrap();

    assert!(transport.sent().is_empty());
    assert!(controller.is_locked());

    controller.supervise();
    assert_eq!(controller.store().values(), &buttons(false, false, false));
}

// ── Incoming data ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn malformed_push_is_rejected() {
    let (mut controller, _ui, transport) = make_controller();
    controller.update_variable("btn1", Value::Bool(true)).await.unwrap();
    transport.clear();

    let garbage = TransportEvent::Message(PanelEvent::PushState(Payload::Raw("{oops".into())));
    assert!(controller.handle_transport(garbage).await.is_err());

    assert_eq!(controller.store().values(), &buttons(true, false, false));
    assert_eq!(controller.store().backup(), &buttons(false, false, false));
    assert_eq!(controller.store().status(), StreamingStatus::Pending);
    assert!(controller.is_locked());
    assert!(transport.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn peer_update_is_applied_and_acked() {
    let (mut controller, ui, transport) = make_controller();
    let update = TransportEvent::Message(PanelEvent::SendUpdate(Payload::Raw(
        r#"{"btn1": false, "btn2": false, "btn3": true}"#.into(),
    )));
    controller.handle_transport(update).await.unwrap();

    assert_eq!(ui.checked("btn3"), Some(true));
    assert_eq!(transport.last_sent(), Some(PanelEvent::AckUpdate));
}

#[tokio::test(start_paused = true)]
async fn state_request_is_served_without_lock() {
    let (mut controller, _ui, transport) = make_controller();
    controller
        .handle_transport(TransportEvent::Message(PanelEvent::RequestState))
        .await
        .unwrap();

    assert_eq!(
        transport.last_sent(),
        Some(PanelEvent::PushState(Payload::from(buttons(false, false, false))))
    );
    assert!(!controller.is_locked());
}

#[tokio::test(start_paused = true)]
async fn video_frame_shown_with_header() {
    let (mut controller, ui, _transport) = make_controller();
    let mut channels = BTreeMap::new();
    channels.insert("webcam".to_string(), "aGVsbG8=".to_string());
    controller
        .handle_transport(TransportEvent::Message(PanelEvent::VideoFrame(
            FramePayload::Channels(channels),
        )))
        .await
        .unwrap();
    assert_eq!(
        ui.image("image").as_deref(),
        Some("data:image/jpeg;base64,aGVsbG8=")
    );
}

#[tokio::test(start_paused = true)]
async fn bad_video_frame_is_dropped() {
    let (mut controller, ui, _transport) = make_controller();
    controller.show_frame(&FramePayload::Encoded("%%%".into()));
    controller.show_frame(&FramePayload::Channels(BTreeMap::new()));
    assert_eq!(ui.image("image"), None);
}

#[tokio::test(start_paused = true)]
async fn sliders_and_labels_render() {
    let config = ControllerConfig {
        controls: vec![
            ControlBinding::slider("speed", 2.5),
            ControlBinding::label("armed", true),
        ],
        ..Default::default()
    };
    let (mut controller, ui, _transport) = make_controller_with(config);
    assert_eq!(ui.number("speed"), Some(2.5));
    assert_eq!(ui.text("armed").as_deref(), Some("true"));

    controller.update_variable("speed", Value::Number(4.0)).await.unwrap();
    assert!(!ui.is_enabled("speed"));
    assert!(ui.is_enabled("armed"));
}

// ── Event loop ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn run_rolls_back_after_watchdog() {
    let (controller, ui, _transport) = make_controller();
    let (input_tx, input_rx) = mpsc::channel(8);
    let (event_tx, event_rx) = mpsc::channel(8);
    let task = tokio::spawn(controller.run(input_rx, event_rx));

    tokio::time::sleep(Duration::from_millis(600)).await;
    ui.toggle("btn1");
    input_tx
        .send(InputEvent::Activated { key: "btn1".into() })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!ui.is_enabled("btn1"));
    assert_eq!(ui.checked("btn1"), Some(true));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(ui.is_enabled("btn1"));
    assert_eq!(ui.checked("btn1"), Some(false));

    drop(input_tx);
    drop(event_tx);
    let controller = task.await.unwrap().unwrap();
    assert_eq!(controller.store().values(), &buttons(false, false, false));
    assert_eq!(controller.store().timer().windows_fired(), 1);
}

#[tokio::test(start_paused = true)]
async fn run_confirms_on_ack() {
    let (controller, ui, transport) = make_controller();
    let (input_tx, input_rx) = mpsc::channel(8);
    let (event_tx, event_rx) = mpsc::channel(8);
    let task = tokio::spawn(controller.run(input_rx, event_rx));

    event_tx.send(TransportEvent::Connected).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    input_tx
        .send(InputEvent::Changed {
            key: "btn3".into(),
            value: Value::Bool(true),
        })
        .await
        .unwrap();
    event_tx
        .send(TransportEvent::Message(PanelEvent::AckUpdate))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(ui.is_enabled("btn3"));
    assert_eq!(ui.checked("btn3"), Some(true));

    drop(input_tx);
    drop(event_tx);
    let controller = task.await.unwrap().unwrap();
    assert_eq!(controller.store().values(), &buttons(false, false, true));
    assert_eq!(controller.store().timer().windows_fired(), 0);
    assert_eq!(
        transport.sent()[..2],
        [PanelEvent::JoinRoom("room-x".into()), PanelEvent::RequestState]
    );
}

#[tokio::test(start_paused = true)]
async fn startup_pass_settles_early_edit() {
    let (controller, ui, _transport) = make_controller();
    let (input_tx, input_rx) = mpsc::channel(8);
    let (event_tx, event_rx) = mpsc::channel(8);
    let task = tokio::spawn(controller.run(input_rx, event_rx));

    input_tx
        .send(InputEvent::Changed {
            key: "btn1".into(),
            value: Value::Bool(true),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(700)).await;

    assert!(ui.is_enabled("btn1"));
    assert_eq!(ui.checked("btn1"), Some(false));

    drop(input_tx);
    drop(event_tx);
    let controller = task.await.unwrap().unwrap();
    assert_eq!(controller.store().status(), StreamingStatus::Idle);
}
