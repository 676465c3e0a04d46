// tests/api_tests.rs

use std::{collections::HashMap, sync::Arc};

use quizroom::{
    config::Config,
    models::{
        question::{NewQuestion, OptionLabel},
        quiz::NewQuiz,
        user::{NewUser, ROLE_ADMIN},
    },
    routes,
    state::AppState,
    storage::{MemoryStore, QuizStore, UserStore},
    utils::{hash::hash_password, jwt::sign_jwt},
};
use serde_json::{Value, json};

const JWT_SECRET: &str = "test_secret_for_integration_tests";

struct TestApp {
    address: String,
    store: Arc<MemoryStore>,
    client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());

    let config = Config {
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
        seed_demo: false,
        bind_addr: ([127, 0, 0, 1], 0).into(),
        session_grace_seconds: 300,
        sweep_interval_seconds: 60,
    };

    let state = AppState::new(store.clone(), config);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers and logs in a fresh user, returning the bearer token.
    async fn login_new_user(&self) -> String {
        let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(resp.status().as_u16(), 201);

        let login: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        login["token"].as_str().expect("Token not found").to_string()
    }

    async fn admin_token(&self) -> String {
        let admin = self
            .store
            .create_user(&NewUser {
                username: format!("admin_{}", &uuid::Uuid::new_v4().to_string()[..6]),
                password: hash_password("adminpass").unwrap(),
                full_name: "Admin".into(),
                role: ROLE_ADMIN.into(),
            })
            .await
            .unwrap();
        sign_jwt(admin.id, ROLE_ADMIN, JWT_SECRET, 600).unwrap()
    }

    /// Seeds a quiz whose questions are all answered correctly with `B`.
    async fn seed_quiz(&self, count: i32, pool: usize, time_limit_seconds: i32) -> i64 {
        let quiz = self
            .store
            .create_quiz(&NewQuiz {
                title: "Java Basics".into(),
                question_count: count,
                time_limit_seconds,
                active: true,
            })
            .await
            .unwrap();
        for i in 0..pool {
            self.store
                .create_question(&NewQuestion {
                    quiz_id: quiz.id,
                    text: format!("Question {}", i),
                    options: ["a".into(), "b".into(), "c".into(), "d".into()],
                    correct_option: OptionLabel::B,
                    points: 1,
                })
                .await
                .unwrap();
        }
        quiz.id
    }

    async fn start_attempt(&self, token: &str, quiz_id: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/quizzes/{}/attempts", quiz_id)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Start attempt failed")
    }

    async fn current_question(&self, token: &str, attempt: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/api/attempts/{}/question", attempt)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Fetch question failed")
    }

    async fn answer(&self, token: &str, attempt: &str, question_id: i64, option: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/attempts/{}/answers", attempt)))
            .bearer_auth(token)
            .json(&json!({ "question_id": question_id, "option": option }))
            .send()
            .await
            .expect("Submit answer failed")
    }

    async fn submit(&self, token: &str, attempt: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/attempts/{}/submit", attempt)))
            .bearer_auth(token)
            .send()
            .await
            .expect("Submit attempt failed")
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_fails_validation() {
    let app = spawn_app().await;

    // Username too short
    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "username": "yo", "password": "password123" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_username_conflicts_and_bad_password_rejected() {
    let app = spawn_app().await;
    let body = json!({ "username": "demo_user", "password": "demo123" });

    let first = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let second = app.client.post(app.url("/api/auth/register")).json(&body).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 409);

    let login = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": "demo_user", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status().as_u16(), 401);
}

#[tokio::test]
async fn attempt_routes_require_token() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(1, 1, 90).await;

    let response = app
        .client
        .post(app.url(&format!("/api/quizzes/{}/attempts", quiz_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_full_attempt_flow() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(3, 5, 90).await;
    let token = app.login_new_user().await;

    // Listed publicly
    let quizzes: Vec<Value> = app
        .client
        .get(app.url("/api/quizzes"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(quizzes.iter().any(|q| q["id"] == quiz_id));

    // 1. Start
    let started = app.start_attempt(&token, quiz_id).await;
    assert_eq!(started.status().as_u16(), 201);
    let started: Value = started.json().await.unwrap();
    let attempt = started["attempt_token"].as_str().unwrap().to_string();
    assert_eq!(started["status"], "active");
    assert_eq!(started["total_questions"], 3);

    // 2. Not finished yet, so it cannot be scored
    assert_eq!(app.submit(&token, &attempt).await.status().as_u16(), 409);

    // 3. Walk the questions: first right, second wrong, third right
    let mut asked = Vec::new();
    for (i, option) in ["B", "C", "b"].iter().enumerate() {
        let q: Value = app.current_question(&token, &attempt).await.json().await.unwrap();
        assert_eq!(q["position"], i + 1);
        assert!(q["question"].get("correct_option").is_none());
        let question_id = q["question"]["id"].as_i64().unwrap();
        asked.push(question_id);

        let resp = app.answer(&token, &attempt, question_id, option).await;
        assert_eq!(resp.status().as_u16(), 200);
    }
    let unique: std::collections::HashSet<_> = asked.iter().collect();
    assert_eq!(unique.len(), 3);

    // All answered: the attempt is over
    assert_eq!(app.current_question(&token, &attempt).await.status().as_u16(), 410);

    // 4. Score and persist
    let submitted = app.submit(&token, &attempt).await;
    assert_eq!(submitted.status().as_u16(), 200);
    let submitted: Value = submitted.json().await.unwrap();
    assert_eq!(submitted["status"], "completed");
    assert_eq!(submitted["result"]["score"], 2);
    assert_eq!(submitted["result"]["total"], 3);
    assert_eq!(submitted["correct_count"], 2);
    let attempt_id = submitted["attempt_id"].as_i64().unwrap();

    // Submitted attempts leave the live registry
    assert_eq!(app.submit(&token, &attempt).await.status().as_u16(), 404);

    // 5. Results
    let mine: Vec<Value> = app
        .client
        .get(app.url("/api/results"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["quiz_title"], "Java Basics");

    let detail: Value = app
        .client
        .get(app.url(&format!("/api/results/{}", attempt_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let answers = detail["answers"].as_array().unwrap();
    let order: Vec<i64> = answers.iter().map(|a| a["question_id"].as_i64().unwrap()).collect();
    assert_eq!(order, asked);
    assert_eq!(answers[1]["chosen_option"], "C");
    assert_eq!(answers[1]["is_correct"], false);

    // Someone else cannot read it
    let other = app.login_new_user().await;
    let hidden = app
        .client
        .get(app.url(&format!("/api/results/{}", attempt_id)))
        .bearer_auth(&other)
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status().as_u16(), 404);
}

#[tokio::test]
async fn test_answer_errors() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(2, 2, 90).await;
    let token = app.login_new_user().await;

    let started: Value = app.start_attempt(&token, quiz_id).await.json().await.unwrap();
    let attempt = started["attempt_token"].as_str().unwrap().to_string();
    let q: Value = app.current_question(&token, &attempt).await.json().await.unwrap();
    let question_id = q["question"]["id"].as_i64().unwrap();

    assert_eq!(app.answer(&token, &attempt, question_id, "E").await.status().as_u16(), 400);
    assert_eq!(app.answer(&token, &attempt, 987_654, "A").await.status().as_u16(), 400);
    assert_eq!(app.answer(&token, &attempt, question_id, "A").await.status().as_u16(), 200);
    assert_eq!(app.answer(&token, &attempt, question_id, "B").await.status().as_u16(), 409);

    // Another user cannot see or drive the attempt
    let other = app.login_new_user().await;
    assert_eq!(app.current_question(&other, &attempt).await.status().as_u16(), 404);

    // Ending early completes it with the second question unanswered
    let ended = app
        .client
        .post(app.url(&format!("/api/attempts/{}/end", attempt)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(ended.status().as_u16(), 200);

    let submitted: Value = app.submit(&token, &attempt).await.json().await.unwrap();
    assert_eq!(submitted["result"]["score"], 0);
    assert_eq!(submitted["result"]["total"], 2);
    assert_eq!(submitted["result"]["answers"][1]["chosen_option"], Value::Null);
}

#[tokio::test]
async fn test_start_fails_for_small_pool_and_unknown_quiz() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(5, 3, 90).await;
    let token = app.login_new_user().await;

    assert_eq!(app.start_attempt(&token, quiz_id).await.status().as_u16(), 409);
    assert_eq!(app.start_attempt(&token, 424_242).await.status().as_u16(), 404);
}

#[tokio::test]
async fn test_attempt_times_out() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(2, 2, 1).await;
    let token = app.login_new_user().await;

    let started: Value = app.start_attempt(&token, quiz_id).await.json().await.unwrap();
    let attempt = started["attempt_token"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    assert_eq!(app.current_question(&token, &attempt).await.status().as_u16(), 410);
    assert_eq!(app.answer(&token, &attempt, 1, "A").await.status().as_u16(), 410);

    let submitted: Value = app.submit(&token, &attempt).await.json().await.unwrap();
    assert_eq!(submitted["status"], "timed_out");
    assert_eq!(submitted["result"]["score"], 0);
    assert_eq!(submitted["result"]["total"], 2);
    assert_eq!(submitted["result"]["duration_seconds"], 1);
}

#[tokio::test]
async fn test_admin_manages_quiz_and_exports_report() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let user = app.login_new_user().await;

    // Regular users are forbidden
    let forbidden = app
        .client
        .post(app.url("/api/admin/quizzes"))
        .bearer_auth(&user)
        .json(&json!({ "title": "X", "question_count": 1, "time_limit_seconds": 60 }))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let quiz: Value = app
        .client
        .post(app.url("/api/admin/quizzes"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Rust Ownership", "question_count": 2, "time_limit_seconds": 120 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_i64().unwrap();

    let mut correct: HashMap<i64, &str> = HashMap::new();
    for (text, answer) in [("Who owns a moved value?", "C"), ("Can you borrow mutably twice?", "D")] {
        let created = app
            .client
            .post(app.url(&format!("/api/admin/quizzes/{}/questions", quiz_id)))
            .bearer_auth(&admin)
            .json(&json!({
                "text": format!("{}<script>alert(1)</script>", text),
                "options": ["one", "two", "three", "four"],
                "correct_option": answer,
                "points": 2
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status().as_u16(), 201);
        let created: Value = created.json().await.unwrap();
        assert_eq!(created["text"], text);
        correct.insert(created["id"].as_i64().unwrap(), answer);
    }

    // Bad option label
    let bad = app
        .client
        .post(app.url(&format!("/api/admin/quizzes/{}/questions", quiz_id)))
        .bearer_auth(&admin)
        .json(&json!({
            "text": "Broken",
            "options": ["one", "two", "three", "four"],
            "correct_option": "Z"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    // A user takes the quiz and gets everything right
    let started: Value = app.start_attempt(&user, quiz_id).await.json().await.unwrap();
    let attempt = started["attempt_token"].as_str().unwrap().to_string();
    for _ in 0..2 {
        let q: Value = app.current_question(&user, &attempt).await.json().await.unwrap();
        let id = q["question"]["id"].as_i64().unwrap();
        app.answer(&user, &attempt, id, correct[&id]).await;
    }
    let submitted: Value = app.submit(&user, &attempt).await.json().await.unwrap();
    assert_eq!(submitted["result"]["score"], 4);

    let report = app
        .client
        .get(app.url(&format!("/api/admin/quizzes/{}/report.csv", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(report.status().as_u16(), 200);
    assert!(report.headers()["content-type"].to_str().unwrap().starts_with("text/csv"));
    let csv = report.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains(",Rust Ownership,4,4,100.0,"));

    // Deleting the quiz cascades to its stored attempts
    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/quizzes/{}", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);
    let results: Vec<Value> = app
        .client
        .get(app.url("/api/results"))
        .bearer_auth(&user)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_deleting_quiz_drops_live_attempts() {
    let app = spawn_app().await;
    let quiz_id = app.seed_quiz(2, 2, 90).await;
    let admin = app.admin_token().await;
    let token = app.login_new_user().await;

    let started: Value = app.start_attempt(&token, quiz_id).await.json().await.unwrap();
    let attempt = started["attempt_token"].as_str().unwrap().to_string();

    let deleted = app
        .client
        .delete(app.url(&format!("/api/admin/quizzes/{}", quiz_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    assert_eq!(app.current_question(&token, &attempt).await.status().as_u16(), 404);
    assert_eq!(app.submit(&token, &attempt).await.status().as_u16(), 404);
}
