use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct LeaveEntry {
    id: String,
    date: String,
    hours: f64,
    #[serde(rename = "type")]
    leave_type: String,
    note: String,
}

#[derive(Debug, Deserialize)]
struct CategorySummary {
    #[serde(rename = "type")]
    leave_type: String,
    total_hours: f64,
    remaining_days: f64,
}

#[derive(Debug, Deserialize)]
struct MonthlyPoint {
    total_hours: f64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    summaries: Vec<CategorySummary>,
    monthly_usage: Vec<MonthlyPoint>,
}

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    month: String,
    days: BTreeMap<String, Vec<LeaveEntry>>,
}

#[derive(Debug, Deserialize)]
struct ThemeResponse {
    theme: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::Once;
    use std::sync::atomic::{AtomicI32, Ordering};

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("leave_tracker_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/theme")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_leave_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_DIR", unique_data_dir())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn list_entries(client: &Client, base_url: &str) -> Vec<LeaveEntry> {
    client
        .get(format!("{base_url}/api/entries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn summary_for(client: &Client, base_url: &str, leave_type: &str) -> CategorySummary {
    let stats: StatsResponse = client
        .get(format!("{base_url}/api/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats.summaries.len(), 3);
    assert_eq!(stats.monthly_usage.len(), 6);
    assert!(stats.monthly_usage.iter().all(|point| point.total_hours >= 0.0));
    stats
        .summaries
        .into_iter()
        .find(|summary| summary.leave_type == leave_type)
        .expect("missing summary")
}

#[tokio::test]
async fn http_create_entry_updates_list_and_stats() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = summary_for(&client, &server.base_url, "DOK").await;

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({
            "date": "2019-03-04",
            "hours": 4,
            "type": "DOK",
            "note": "dentist"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: LeaveEntry = response.json().await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.date, "2019-03-04");
    assert_eq!(created.leave_type, "DOK");

    let entries = list_entries(&client, &server.base_url).await;
    assert!(entries.contains(&created));
    assert!(entries.windows(2).all(|pair| pair[0].date >= pair[1].date));

    let after = summary_for(&client, &server.base_url, "DOK").await;
    assert_eq!(after.total_hours, before.total_hours + 4.0);
    assert_eq!(after.remaining_days, before.remaining_days - 0.5);

    let calendar: CalendarResponse = client
        .get(format!("{}/api/calendar?month=2019-03", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(calendar.month, "2019-03");
    assert!(calendar.days["2019-03-04"].contains(&created));
}

#[tokio::test]
async fn http_update_and_delete_entry() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let created: LeaveEntry = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "date": "2018-05-01", "hours": 8, "type": "ZOR" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = client
        .put(format!("{}/api/entries/{}", server.base_url, created.id))
        .json(&serde_json::json!({
            "date": "2018-05-02",
            "hours": 2.5,
            "type": "THU",
            "note": "moved"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let entries = list_entries(&client, &server.base_url).await;
    let updated = entries.iter().find(|e| e.id == created.id).expect("entry kept");
    assert_eq!(updated.date, "2018-05-02");
    assert_eq!(updated.hours, 2.5);
    assert_eq!(updated.leave_type, "THU");
    assert_eq!(updated.note, "moved");

    let response = client
        .delete(format!("{}/api/entries/{}", server.base_url, created.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let remaining = list_entries(&client, &server.base_url).await;
    assert_eq!(remaining.len(), entries.len() - 1);
    assert!(remaining.iter().all(|e| e.id != created.id));
}

#[tokio::test]
async fn http_unknown_ids_are_noops() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = list_entries(&client, &server.base_url).await;

    let response = client
        .delete(format!("{}/api/entries/does-not-exist", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .put(format!("{}/api/entries/does-not-exist", server.base_url))
        .json(&serde_json::json!({ "date": "2020-01-01", "hours": 1, "type": "ZOR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert_eq!(list_entries(&client, &server.base_url).await, before);
}

#[tokio::test]
async fn http_rejects_invalid_entries() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = list_entries(&client, &server.base_url).await;

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .json(&serde_json::json!({ "date": "2020-01-01", "hours": 0, "type": "ZOR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.text().await.unwrap(),
        "Please fill in a valid date and hours."
    );

    for body in [
        serde_json::json!({ "date": "2020-01-01", "type": "ZOR" }),
        serde_json::json!({ "hours": 8, "type": "ZOR" }),
        serde_json::json!({ "date": "2020-01-01", "hours": "many", "type": "ZOR" }),
    ] {
        let response = client
            .post(format!("{}/api/entries", server.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body={body}");
        assert_eq!(
            response.text().await.unwrap(),
            "Please fill in a valid date and hours."
        );
    }

    let response = client
        .put(format!("{}/api/entries/does-not-exist", server.base_url))
        .json(&serde_json::json!({ "date": "2020-01-01", "type": "ZOR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/api/entries", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/entries", server.base_url))
        .form(&[("date", ""), ("hours", "8"), ("type", "THU"), ("note", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let page = response.text().await.unwrap();
    assert!(page.contains("Please fill in a valid date and hours."));

    assert_eq!(list_entries(&client, &server.base_url).await, before);
}

#[tokio::test]
async fn http_form_submission_shows_entry_on_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/entries", server.base_url))
        .form(&[
            ("date", "2017-08-09"),
            ("hours", "3"),
            ("type", "ZOR"),
            ("note", "school <play>"),
        ])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let page = response.text().await.unwrap();
    assert!(page.contains("2017-08-09"));
    assert!(page.contains("school &lt;play&gt;"));

    let calendar = client
        .get(format!("{}/?view=calendar&month=2017-08", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(calendar.contains("August 2017"));
    assert!(calendar.contains("school &lt;play&gt;"));
}

#[tokio::test]
async fn http_theme_preference_round_trips() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let response: ThemeResponse = client
        .put(format!("{}/api/theme", server.base_url))
        .json(&serde_json::json!({ "theme": "dark" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response.theme, "dark");

    let page = client
        .post(format!("{}/theme/toggle", server.base_url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"class="light""#));

    let current: ThemeResponse = client
        .get(format!("{}/api/theme", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(current.theme, "light");
}
