use path_canvas::model::{Node, NodePatch, Position};
use path_canvas::sync::{SyncEnvelope, SyncRequest};
use pathcanvas_bridge::{
    ApiClient, ApiError, BridgeConfig, LayoutAlgorithm, PathGenerationAlgorithm,
    REQUEST_SEQ_HEADER,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&BridgeConfig {
        api_url: format!("{}/api/v1", server.uri()),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_create_node_posts_with_sequence_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/nodes"))
        .and(header(REQUEST_SEQ_HEADER, "7"))
        .and(body_partial_json(json!({ "id": "n1", "name": "Dock" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "node": { "id": "n1" } })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = SyncEnvelope {
        seq: 7,
        request: SyncRequest::CreateNode {
            node: Node::new("n1", "Dock", Position::new(1.0, 2.0)),
        },
    };
    assert_eq!(client.execute(&envelope).await.unwrap(), 7);
}

#[tokio::test]
async fn test_update_and_delete_routes() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/nodes/n1"))
        .and(body_json(json!({ "position": { "x": 5.0, "y": 6.0 } })))
        .respond_with(ResponseTemplate::new(200).insert_header(REQUEST_SEQ_HEADER, "3"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/paths/p1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let update = SyncEnvelope {
        seq: 2,
        request: SyncRequest::UpdateNode {
            id: "n1".into(),
            patch: NodePatch::position(Position::new(5.0, 6.0)),
        },
    };
    // The echoed header wins over the sent value.
    assert_eq!(client.execute(&update).await.unwrap(), 3);

    let delete = SyncEnvelope {
        seq: 4,
        request: SyncRequest::DeletePath { id: "p1".into() },
    };
    assert_eq!(client.execute(&delete).await.unwrap(), 4);
}

#[tokio::test]
async fn test_error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/nodes/ghost"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Node not found" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let envelope = SyncEnvelope {
        seq: 1,
        request: SyncRequest::DeleteNode { id: "ghost".into() },
    };
    match client.execute(&envelope).await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Node not found");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let client = ApiClient::new(&BridgeConfig {
        api_url: "http://127.0.0.1:1/api/v1".into(),
        timeout: std::time::Duration::from_millis(500),
        ..Default::default()
    })
    .unwrap();
    assert!(matches!(client.list_nodes().await, Err(ApiError::Transport(_))));
}

#[tokio::test]
async fn test_list_endpoints_unwrap_envelopes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/nodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [
                { "id": "a", "name": "A", "type": "start", "position": { "x": 0.0, "y": 0.0 } },
                { "id": "b", "name": "B", "position": { "x": 10.0, "y": 0.0, "z": 1.0 } }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/paths"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paths": [{ "id": "p", "from": "a", "to": "b", "weight": 2.0 }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let nodes = client.list_nodes().await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].position.z, Some(1.0));

    let paths = client.list_paths().await.unwrap();
    assert_eq!(paths[0].from, "a");
    assert_eq!(paths[0].weight, 2.0);
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/paths"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(matches!(client.list_paths().await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn test_bulk_endpoints_send_algorithm_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/layout/apply"))
        .and(body_json(json!({ "algorithm": "force-directed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/path-generation/nearest-neighbor"))
        .and(body_json(json!({ "max_distance": 150.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "paths": [{ "id": "p", "from": "a", "to": "b", "weight": 1.0 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.apply_layout(LayoutAlgorithm::ForceDirected).await.unwrap(), None);

    let paths = client
        .generate_paths(
            PathGenerationAlgorithm::NearestNeighbor,
            &json!({ "max_distance": 150.0 }),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!((paths[0].from.as_str(), paths[0].to.as_str()), ("a", "b"));
}
