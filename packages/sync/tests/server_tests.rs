//! Protocol behaviour of the diagram server against an in-memory authority

use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use trellis_editor::{handler_fn, Action, HandlerResult};
use trellis_model::{Bounds, Dimension, Point};
use trellis_sync::{ChannelTransport, DiagramServer, DiagramServerConfig, MemoryTransport};

const CLIENT: &str = "diagram-1";

fn server() -> (DiagramServer, MemoryTransport) {
    let transport = MemoryTransport::new();
    let server =
        DiagramServer::new(DiagramServerConfig::new(CLIENT), Box::new(transport.clone())).unwrap();
    (server, transport)
}

fn set_model_envelope() -> serde_json::Value {
    json!({
        "clientId": CLIENT,
        "action": {
            "kind": "setModel",
            "newRoot": {
                "id": "g",
                "type": "graph",
                "children": [
                    { "id": "n1", "type": "node" },
                    { "id": "n2", "type": "node" },
                    { "id": "e1", "type": "edge", "sourceId": "n1", "targetId": "n2" }
                ]
            }
        }
    })
}

#[test]
fn test_received_set_model_is_applied_and_stored() {
    let (mut server, transport) = server();

    let result = server.message_received(set_model_envelope()).unwrap();

    assert_eq!(result.commands_executed, 1);
    assert!(server.model().contains("n1"));
    assert_eq!(server.stored_root().unwrap().id, "g");
    assert_eq!(server.current_root().children.len(), 3);
    assert_eq!(server.last_submitted_model_type().as_deref(), Some("graph"));
    assert!(transport.sent().is_empty());
}

#[test]
fn test_echo_suppression() {
    let (mut server, transport) = server();
    server.message_received(set_model_envelope());

    server.message_received(json!({
        "clientId": CLIENT,
        "action": { "kind": "elementSelected", "selectedElementsIDs": ["n1"], "deselectedElementsIDs": [] }
    }));
    assert!(server.model().get("n1").unwrap().selected);
    assert!(transport.sent().is_empty());

    server.dispatch(&Action::select(&["n2"], &[]));
    assert!(server.model().get("n2").unwrap().selected);
    assert_eq!(transport.sent_kinds(), vec!["elementSelected"]);
    assert_eq!(transport.sent()[0].client_id.as_deref(), Some(CLIENT));
}

#[test]
fn test_tenant_isolation() {
    let (mut server, transport) = server();
    server.message_received(set_model_envelope());

    let invoked = Rc::new(RefCell::new(0));
    let counter = invoked.clone();
    server.register(
        "allSelected",
        handler_fn(move |_, _| {
            *counter.borrow_mut() += 1;
            HandlerResult::none()
        }),
    );

    let result = server.message_received(json!({
        "clientId": "someone-else",
        "action": { "kind": "allSelected", "select": true }
    }));

    assert!(result.is_none());
    assert_eq!(*invoked.borrow(), 0);
    assert!(!server.model().get("n1").unwrap().selected);
    assert!(transport.sent().is_empty());

    // Same action without a client id is for everyone
    server.message_received(json!({ "action": { "kind": "allSelected", "select": true } }));
    assert_eq!(*invoked.borrow(), 1);
    assert!(server.model().get("n1").unwrap().selected);
}

#[test]
fn test_malformed_payload_is_discarded() {
    let (mut server, transport) = server();
    server.message_received(set_model_envelope());
    let before = server.model().root().clone();

    assert!(server.message_received("{ not json").is_none());
    assert!(server
        .message_received(json!({ "clientId": CLIENT, "payload": {} }))
        .is_none());
    assert!(server
        .message_received(json!({ "clientId": CLIENT, "action": { "select": true } }))
        .is_none());

    assert_eq!(server.model().root(), &before);
    assert!(transport.sent().is_empty());
}

#[test]
fn test_bounds_feedback_loop() {
    let (mut server, transport) = server();
    server.message_received(set_model_envelope());

    let computed = Action::from_json(
        r#"{
            "kind": "computedBounds",
            "bounds": [
                { "elementId": "n1", "newBounds": { "x": 10, "y": 20, "width": 5, "height": 5 } },
                { "elementId": "ghost", "newBounds": { "x": 1, "y": 1, "width": 1, "height": 1 } }
            ],
            "alignments": [ { "elementId": "n2", "newAlignment": { "x": 2, "y": 3 } } ]
        }"#,
    )
    .unwrap();
    let result = server.dispatch(&computed);

    let n1 = server.model().get("n1").unwrap();
    assert_eq!(n1.position, Some(Point::new(10.0, 20.0)));
    assert_eq!(n1.size, Some(Dimension::new(5.0, 5.0)));
    assert_eq!(
        server.model().get("n2").unwrap().alignment,
        Some(Point::new(2.0, 3.0))
    );

    assert_eq!(result.last_update.as_ref().map(Action::kind), Some("updateModel"));
    assert_eq!(
        server.dispatcher().command_stack().undo_name(),
        Some("UpdateModelCommand")
    );
    assert!(transport.sent().is_empty());

    let stored = server.stored_root().unwrap();
    assert_eq!(
        stored.children[0].position,
        Some(Bounds::new(10.0, 20.0, 5.0, 5.0).position())
    );
}

#[test]
fn test_local_select_keeps_pending_bounds_root() {
    let (mut server, _transport) = server();
    server.message_received(set_model_envelope());

    server.message_received(json!({
        "clientId": CLIENT,
        "action": {
            "kind": "requestBounds",
            "newRoot": {
                "id": "g",
                "type": "graph",
                "children": [ { "id": "n1", "type": "node" }, { "id": "n9", "type": "node" } ]
            }
        }
    }));
    server.dispatch(&Action::select(&["n1"], &[]));
    assert_eq!(server.current_root().children.len(), 2);
    assert_eq!(server.stored_root().unwrap().children.len(), 2);

    let computed = Action::from_json(
        r#"{
            "kind": "computedBounds",
            "bounds": [ { "elementId": "n9", "newBounds": { "x": 4, "y": 8, "width": 2, "height": 2 } } ]
        }"#,
    )
    .unwrap();
    let result = server.dispatch(&computed);

    assert_eq!(result.last_update.as_ref().map(Action::kind), Some("updateModel"));
    assert!(server.model().contains("n9"));
    assert!(!server.model().contains("n2"));
    assert_eq!(
        server.model().get("n9").unwrap().position,
        Some(Point::new(4.0, 8.0))
    );
}

#[test]
fn test_bounds_after_type_change_use_set_model() {
    let (mut server, _transport) = server();
    server.message_received(set_model_envelope());

    server.message_received(json!({
        "clientId": CLIENT,
        "action": { "kind": "requestBounds", "newRoot": { "id": "seq", "type": "graph:sequence" } }
    }));
    let result = server.dispatch(&Action::from_json(r#"{ "kind": "computedBounds" }"#).unwrap());

    assert_eq!(result.last_update.as_ref().map(Action::kind), Some("setModel"));
    assert_eq!(server.model().root().id, "seq");
    assert_eq!(
        server.last_submitted_model_type().as_deref(),
        Some("graph:sequence")
    );
}

#[test]
fn test_undo_after_authority_update() {
    let (mut server, _transport) = server();
    server.message_received(set_model_envelope());
    server.dispatch(&Action::select_all(true));
    assert!(!server.stored_root().unwrap().children[0].selected);

    server.undo();
    assert!(!server.model().get("n1").unwrap().selected);
    assert_eq!(server.stored_root().unwrap().id, "g");

    server.redo();
    assert!(server.model().get("n1").unwrap().selected);
}

#[test]
fn test_channel_transport_round_trip() {
    let (transport, mut outgoing) = ChannelTransport::channel(8);
    let mut server = DiagramServer::new(DiagramServerConfig::new(CLIENT), Box::new(transport)).unwrap();

    server.request_model();
    let text = outgoing.try_recv().unwrap();
    let sent: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(sent["clientId"], CLIENT);
    assert_eq!(sent["action"]["kind"], "requestModel");
    assert_eq!(sent["action"]["options"]["needsClientLayout"], true);
    assert!(outgoing.try_recv().is_err());
}
