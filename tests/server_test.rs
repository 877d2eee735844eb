//! Integration tests for the keystroke biometrics HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use keystroke_biometrics::server::{run, ServerConfig};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Start a server on a random port backed by a fresh data directory.
    async fn start_server() -> (SocketAddr, tokio::sync::oneshot::Sender<()>, TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = ServerConfig::new(0, dir.path().to_path_buf());

        let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        (addr, shutdown_tx, dir)
    }

    /// Session payload typed with a fixed hold time and gap between keys.
    fn session(user: &str, dwell: i64, gap: i64) -> Value {
        let mut keystrokes = Vec::new();
        let mut t = 0;
        let mut last_release: Option<i64> = None;
        for c in "password".chars() {
            let release = t + dwell;
            keystrokes.push(json!({
                "key": c.to_string(),
                "keyCode": (c as u32).to_string(),
                "pressTime": t,
                "releaseTime": release,
                "dwellTime": dwell,
                "flightTime": last_release.map(|r| t - r).unwrap_or(0),
            }));
            last_release = Some(release);
            t = release + gap;
        }

        json!({
            "userId": user,
            "text": "password",
            "startedAt": "2024-01-22T10:00:00Z",
            "keystrokes": keystrokes,
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx, _dir) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/api/", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], "keystroke-biometrics-api");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_enroll_stats_verify_flow() {
        let (addr, shutdown_tx, _dir) = start_server().await;
        let client = reqwest::Client::new();

        for (user, dwell, gap) in [("ana", 100, 50), ("ben", 160, 110)] {
            let response = client
                .post(format!("http://{}/api/sessions", addr))
                .json(&session(user, dwell, gap))
                .send()
                .await
                .expect("Failed to send request");
            assert_eq!(response.status(), reqwest::StatusCode::OK);

            let receipt: Value = response.json().await.expect("Failed to parse JSON");
            assert_eq!(receipt["userId"], user);
            assert_eq!(receipt["keystrokesCount"], 8);
            assert!(receipt["id"].as_str().is_some());
        }

        let stats: Value = client
            .get(format!("http://{}/api/users/ana/stats", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(stats, json!({"userId": "ana", "sessionCount": 1}));

        let result: Value = client
            .post(format!("http://{}/api/verify", addr))
            .json(&session("ana", 100, 50))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");

        assert_eq!(result["verified"], true);
        assert_eq!(result["claimedUser"], "ana");
        assert_eq!(result["inputStats"], json!({"dwell": 100.0, "flight": 50.0}));

        let matrix = result["matrix"].as_array().expect("matrix is an array");
        assert_eq!(matrix.len(), 2);
        // Profiles average every stored flight, so ana's baseline flight is
        // 7 * 50 / 8 = 43.75 while the sample's own flight mean is 50.
        assert_eq!(matrix[0]["userId"], "ana");
        assert_eq!(matrix[0]["score"].as_f64(), Some(6.25));
        assert_eq!(matrix[0]["confidence"].as_f64(), Some(93.8));
        assert_eq!(matrix[0]["isMatch"], true);
        assert_eq!(matrix[1]["userId"], "ben");
        assert_eq!(matrix[1]["score"].as_f64(), Some(106.25));
        assert_eq!(matrix[1]["confidence"].as_f64(), Some(0.0));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_empty_session_is_unprocessable() {
        let (addr, shutdown_tx, _dir) = start_server().await;

        let response = reqwest::Client::new()
            .post(format!("http://{}/api/sessions", addr))
            .json(&json!({"userId": "ana", "text": "", "keystrokes": []}))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INVALID_SESSION");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_malformed_json_is_unprocessable() {
        let (addr, shutdown_tx, _dir) = start_server().await;
        let client = reqwest::Client::new();

        for route in ["sessions", "verify"] {
            let response = client
                .post(format!("http://{}/api/{}", addr, route))
                .header("Content-Type", "application/json")
                .body("{not json")
                .send()
                .await
                .expect("Failed to send request");

            assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
            let body: Value = response.json().await.expect("Failed to parse JSON");
            assert_eq!(body["code"], "INVALID_SESSION");
            assert!(body["detail"].as_str().is_some());
        }

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_inconsistent_session_is_rejected() {
        let (addr, shutdown_tx, _dir) = start_server().await;
        let client = reqwest::Client::new();

        for _ in 0..3 {
            let response = client
                .post(format!("http://{}/api/sessions", addr))
                .json(&session("ana", 100, 50))
                .send()
                .await
                .expect("Failed to send request");
            assert!(response.status().is_success());
        }

        let response = client
            .post(format!("http://{}/api/sessions", addr))
            .json(&session("ana", 200, 50))
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INCONSISTENT_PATTERN");
        assert!(body["detail"]
            .as_str()
            .unwrap_or("")
            .contains("Dwell 100.0ms"));

        let stats: Value = client
            .get(format!("http://{}/api/users/ana/stats", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(stats["sessionCount"], 3);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (addr, shutdown_tx, _dir) = start_server().await;

        // Send OPTIONS request to check CORS
        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/api/sessions", addr))
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );

        let _ = shutdown_tx.send(());
    }
}
