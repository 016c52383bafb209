use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};
use tokio::time::sleep;

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a config with database path and seed departments
fn config_with_db(port: u16, db_path: &str) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[database]
path = "{}"

[queue]
service_minutes_per_ticket = 15

[[departments]]
name = "Radiology"
facility = "Central"

[[departments]]
name = "Cardiology"
facility = "Central"
"#,
        port, db_path
    )
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_vestibule"))
        .env("VESTIBULE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Helper to start a server for testing
async fn start_test_server() -> (u16, tokio::process::Child, TempDir) {
    let port = get_available_port();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config_content = config_with_db(port, db_path.to_str().unwrap());

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let server = spawn_server(temp_file.path()).await;

    assert!(
        wait_for_server(port, 40).await,
        "Server did not start in time"
    );

    // Give a moment for initialization
    sleep(Duration::from_millis(100)).await;

    (port, server, temp_dir)
}

/// Resolve a seeded department's id by name
async fn department_id(client: &Client, port: u16, name: &str) -> String {
    let departments: Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/departments", port))
        .send()
        .await
        .expect("Failed to list departments")
        .json()
        .await
        .expect("Failed to parse JSON");

    departments
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == name)
        .unwrap_or_else(|| panic!("Department {} not seeded", name))["id"]
        .as_str()
        .unwrap()
        .to_string()
}

async fn join(client: &Client, port: u16, dept_id: &str, name: &str, phone: &str) -> Value {
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/join",
            port, dept_id
        ))
        .json(&json!({ "name": name, "phone": phone }))
        .send()
        .await
        .expect("Failed to send join");
    assert_eq!(response.status(), 200);
    response.json().await.expect("Failed to parse JSON")
}

async fn advance(client: &Client, port: u16, dept_id: &str) -> Value {
    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/next",
            port, dept_id
        ))
        .send()
        .await
        .expect("Failed to send advance");
    assert_eq!(response.status(), 200);
    response.json().await.expect("Failed to parse JSON")
}

#[tokio::test]
async fn test_full_queue_scenario() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Radiology").await;

    // Two joins get sequential numbers
    let a = join(&client, port, &dept, "A", "1111111111").await;
    assert_eq!(a["ticket_number"], 1);
    assert_eq!(a["already_queued"], false);

    let b = join(&client, port, &dept, "B", "2222222222").await;
    assert_eq!(b["ticket_number"], 2);

    // First advance serves ticket 1
    let first = advance(&client, port, &dept).await;
    assert_eq!(first["current_ticket"], 1);

    // Second advance completes 1 and serves 2
    let second = advance(&client, port, &dept).await;
    assert_eq!(second["current_ticket"], 2);

    // Third advance drains the queue
    let third = advance(&client, port, &dept).await;
    assert_eq!(third["empty"], true);

    let status: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/status",
            port, dept
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["current_ticket"], 0);
    assert_eq!(status["last_ticket"], 2);
    assert_eq!(status["queue_length"], 0);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_duplicate_join_returns_same_number() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Radiology").await;

    let first = join(&client, port, &dept, "A", "1111111111").await;
    let second = join(&client, port, &dept, "A", "1111111111").await;

    assert_eq!(second["ticket_number"], first["ticket_number"]);
    assert_eq!(second["already_queued"], true);

    let status: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/status",
            port, dept
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["last_ticket"], 1);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_departments_are_independent() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let radiology = department_id(&client, port, "Radiology").await;
    let cardiology = department_id(&client, port, "Cardiology").await;

    let a = join(&client, port, &radiology, "A", "1111111111").await;
    assert_eq!(a["ticket_number"], 1);

    // Same contact, different department: a fresh number from that queue
    let b = join(&client, port, &cardiology, "A", "1111111111").await;
    assert_eq!(b["ticket_number"], 1);
    assert_eq!(b["already_queued"], false);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_phone_rejected() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Radiology").await;

    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/join",
            port, dept
        ))
        .json(&json!({ "name": "A", "phone": "123-456" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("phone"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_unknown_department_is_404() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();

    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/queue/nonexistent-id/join",
            port
        ))
        .json(&json!({ "name": "A", "phone": "1111111111" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .post(format!(
            "http://127.0.0.1:{}/api/v1/queue/nonexistent-id/next",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/queue/nonexistent-id/status",
            port
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_advance_on_empty_department() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Cardiology").await;

    let result = advance(&client, port, &dept).await;
    assert_eq!(result["empty"], true);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_active_ticket_listing() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Radiology").await;

    join(&client, port, &dept, "A", "1111111111").await;
    join(&client, port, &dept, "B", "2222222222").await;
    join(&client, port, &dept, "C", "3333333333").await;
    advance(&client, port, &dept).await;

    let tickets: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/tickets",
            port, dept
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let tickets = tickets.as_array().unwrap();
    assert_eq!(tickets.len(), 3);
    assert_eq!(tickets[0]["ticket_number"], 1);
    assert_eq!(tickets[0]["status"], "serving");
    assert_eq!(tickets[1]["status"], "pending");
    assert_eq!(tickets[2]["ticket_number"], 3);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_holder_ticket_listing() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let radiology = department_id(&client, port, "Radiology").await;
    let cardiology = department_id(&client, port, "Cardiology").await;

    for (dept, phone) in [(&radiology, "1111111111"), (&cardiology, "1111111111")] {
        let response = client
            .post(format!(
                "http://127.0.0.1:{}/api/v1/queue/{}/join",
                port, dept
            ))
            .json(&json!({ "name": "A", "phone": phone, "holder_id": "holder-1" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let tickets: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/holders/holder-1/tickets",
            port
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let tickets = tickets.as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0]["holder_id"], "holder-1");

    // Unknown holders have no tickets, not an error
    let empty: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/holders/holder-9/tickets",
            port
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(empty.as_array().unwrap().is_empty());

    server.kill().await.ok();
}

#[tokio::test]
async fn test_status_estimates_wait() {
    let (port, mut server, _temp_dir) = start_test_server().await;
    let client = Client::new();
    let dept = department_id(&client, port, "Radiology").await;

    join(&client, port, &dept, "A", "1111111111").await;
    join(&client, port, &dept, "B", "2222222222").await;

    let status: Value = client
        .get(format!(
            "http://127.0.0.1:{}/api/v1/queue/{}/status",
            port, dept
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(status["department_name"], "Radiology");
    assert_eq!(status["queue_length"], 2);
    assert_eq!(status["estimated_wait_minutes"], 30);

    server.kill().await.ok();
}
