//! API integration tests
//!
//! These run against a live server with a seeded database:
//! `cargo test -- --ignored`

use reqwest::Client;
use serde_json::{json, Value};

use biblion_server::models::user::{BorrowerRole, UserClaims};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const TEST_JWT_SECRET: &str = "change-this-secret-in-production";

/// Mint a token the way the external auth service would
fn token_for(user_id: &str, role: BorrowerRole) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = UserClaims {
        sub: user_id.to_string(),
        user_id: user_id.to_string(),
        role,
        iat: now,
        exp: now + 3600,
    };
    claims
        .create_token(TEST_JWT_SECRET)
        .expect("Failed to create test token")
}

fn librarian_token() -> String {
    token_for("librarian-1", BorrowerRole::Librarian)
}

fn student_token() -> String {
    token_for("student-1", BorrowerRole::Student)
}

/// Create a fresh book and return its id plus the librarian token used
async fn create_test_book(client: &Client, quantity: i16) -> (i64, String) {
    let token = librarian_token();
    let isbn = format!("978-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap());

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "category": "Fiction",
            "isbn": isbn,
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to create book");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    (body["data"]["id"].as_i64().expect("No book id"), token)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_missing_token_is_rejected() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_student_cannot_create_book() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "title": "Forbidden",
            "author": "Nobody",
            "isbn": "978-0000000000",
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_self_service_borrow_stays_pending_without_decrement() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 2).await;

    let response = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-1",
            "user_name": "Test Student",
            "user_role": "student",
            "borrow_date": chrono::Utc::now(),
            "due_date": chrono::Utc::now() + chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["is_direct_issue"], false);

    // Pending holds no copy
    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 2);
}

#[tokio::test]
#[ignore]
async fn test_approve_then_return_conserves_inventory() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 2).await;

    // Student submits, librarian approves
    let borrow: Value = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-1",
            "user_name": "Test Student",
            "user_role": "student",
            "borrow_date": chrono::Utc::now(),
            "due_date": chrono::Utc::now() + chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let transaction_id = borrow["transaction_id"].as_str().expect("No transaction id");

    let response = client
        .put(format!("{}/borrowings/{}/approve", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 1);

    // Return restores the copy
    let response = client
        .put(format!("{}/borrowings/{}/return", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "return_date": chrono::Utc::now() }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 2);
}

#[tokio::test]
#[ignore]
async fn test_direct_issue_of_last_copy_then_second_fails() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let issue = |user: &'static str| {
        let client = client.clone();
        let token = token.clone();
        async move {
            client
                .post(format!("{}/borrowings/direct", BASE_URL))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({
                    "book_id": book_id,
                    "user_id": user,
                    "user_name": "Walk-in Borrower",
                    "user_role": "student",
                    "borrow_date": chrono::Utc::now(),
                    "due_date": chrono::Utc::now() + chrono::Duration::days(7)
                }))
                .send()
                .await
                .expect("Failed to send request")
        }
    };

    let first = issue("walkin-1").await;
    assert_eq!(first.status(), 201);
    let body: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "Borrowed");
    assert_eq!(body["book_info"]["available_after"], 0);

    let second = issue("walkin-2").await;
    assert_eq!(second.status(), 400);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "InsufficientCopies");
}

#[tokio::test]
#[ignore]
async fn test_reject_leaves_inventory_unchanged() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 3).await;

    let borrow: Value = client
        .post(format!("{}/borrowings", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-1",
            "user_name": "Test Student",
            "user_role": "student",
            "borrow_date": chrono::Utc::now(),
            "due_date": chrono::Utc::now() + chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let transaction_id = borrow["transaction_id"].as_str().expect("No transaction id");

    let response = client
        .put(format!("{}/borrowings/{}/reject", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Rejecting twice: the row is gone, absence reads as NotFound
    let response = client
        .put(format!("{}/borrowings/{}/reject", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 3);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_reservation_rejected() {
    let client = Client::new();
    let (book_id, _token) = create_test_book(&client, 1).await;

    let reserve = || {
        let client = client.clone();
        async move {
            client
                .post(format!("{}/reservations", BASE_URL))
                .header("Authorization", format!("Bearer {}", student_token()))
                .json(&json!({
                    "book_id": book_id,
                    "user_id": "student-1",
                    "user_name": "Test Student",
                    "user_role": "student",
                    "reserve_date": chrono::Utc::now(),
                    "return_date": chrono::Utc::now() + chrono::Duration::days(14)
                }))
                .send()
                .await
                .expect("Failed to send request")
        }
    };

    let first = reserve().await;
    assert_eq!(first.status(), 201);

    let second = reserve().await;
    assert_eq!(second.status(), 400);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "DuplicateReservation");
}

#[tokio::test]
#[ignore]
async fn test_illegal_reservation_transition_rejected() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let reservation: Value = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-2",
            "user_name": "Another Student",
            "user_role": "student",
            "reserve_date": chrono::Utc::now(),
            "return_date": chrono::Utc::now() + chrono::Duration::days(14)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let reservation_id = reservation["reservation_id"].as_str().expect("No reservation id");

    // Pending -> Fulfilled skips approval
    let response = client
        .post(format!("{}/reservations/{}/status", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "status": "Fulfilled" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "IllegalTransition");
}

#[tokio::test]
#[ignore]
async fn test_fulfillment_decrements_and_opens_ledger_row() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let reservation: Value = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-3",
            "user_name": "Pickup Student",
            "user_role": "student",
            "reserve_date": chrono::Utc::now(),
            "return_date": chrono::Utc::now() + chrono::Duration::days(14)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let reservation_id = reservation["reservation_id"].as_str().expect("No reservation id");

    let set_status = |status: &'static str| {
        let client = client.clone();
        let token = token.clone();
        let reservation_id = reservation_id.to_string();
        async move {
            client
                .post(format!("{}/reservations/{}/status", BASE_URL, reservation_id))
                .header("Authorization", format!("Bearer {}", token))
                .json(&json!({ "status": status }))
                .send()
                .await
                .expect("Failed to send request")
        }
    };

    let approved = set_status("Approved").await;
    assert!(approved.status().is_success());

    let fulfilled = set_status("Fulfilled").await;
    assert!(fulfilled.status().is_success());
    let body: Value = fulfilled.json().await.expect("Failed to parse response");
    assert!(body["transaction_id"].is_string());

    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 0);
}

#[tokio::test]
#[ignore]
async fn test_reservation_cap_enforced_for_students() {
    let client = Client::new();
    let user_id = format!("capped-{}", chrono::Utc::now().timestamp_millis());

    // Fill the student cap of 5 across distinct books
    for i in 0..5 {
        let (book_id, _) = create_test_book(&client, 1).await;
        let response = client
            .post(format!("{}/reservations", BASE_URL))
            .header("Authorization", format!("Bearer {}", student_token()))
            .json(&json!({
                "book_id": book_id,
                "user_id": user_id,
                "user_name": "Heavy Reserver",
                "user_role": "student",
                "reserve_date": chrono::Utc::now(),
                "return_date": chrono::Utc::now() + chrono::Duration::days(14)
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201, "reservation {} should be accepted", i);
    }

    let (book_id, _) = create_test_book(&client, 1).await;
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": user_id,
            "user_name": "Heavy Reserver",
            "user_role": "student",
            "reserve_date": chrono::Utc::now(),
            "return_date": chrono::Utc::now() + chrono::Duration::days(14)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "ReservationLimitReached");
}

#[tokio::test]
#[ignore]
async fn test_readiness_reports_database() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
#[ignore]
async fn test_delete_blocked_while_borrowed_then_allowed_after_return() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let issued: Value = client
        .post(format!("{}/borrowings/direct", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "user_id": "walkin-3",
            "user_name": "Walk-in Borrower",
            "user_role": "student",
            "borrow_date": chrono::Utc::now(),
            "due_date": chrono::Utc::now() + chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let transaction_id = issued["transaction_id"].as_str().expect("No transaction id");

    // The copy is out, so the title cannot be deleted
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .put(format!("{}/borrowings/{}/return", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "return_date": chrono::Utc::now() }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Settled history (the Returned row) does not pin the title
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_overdue_rows_surface_in_status_list() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let issued: Value = client
        .post(format!("{}/borrowings/direct", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "user_id": "late-1",
            "user_name": "Late Borrower",
            "user_role": "student",
            "borrow_date": chrono::Utc::now() - chrono::Duration::days(14),
            "due_date": chrono::Utc::now() - chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let transaction_id = issued["transaction_id"].as_str().expect("No transaction id");

    let overdue: Value = client
        .get(format!("{}/borrowings/status/Overdue", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let row = overdue["data"]
        .as_array()
        .expect("No data array")
        .iter()
        .find(|r| r["transaction_id"] == transaction_id)
        .expect("Overdue row not listed");
    assert_eq!(row["status"], "Overdue");
    assert!(row["days_overdue"].as_i64().expect("No days_overdue") >= 7);

    // Going overdue moves no copies
    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 0);

    // An overdue copy can still come back
    let response = client
        .put(format!("{}/borrowings/{}/return", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "return_date": chrono::Utc::now() }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_return_without_body_defaults_to_now() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let issued: Value = client
        .post(format!("{}/borrowings/direct", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "book_id": book_id,
            "user_id": "walkin-4",
            "user_name": "Walk-in Borrower",
            "user_role": "student",
            "borrow_date": chrono::Utc::now(),
            "due_date": chrono::Utc::now() + chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let transaction_id = issued["transaction_id"].as_str().expect("No transaction id");

    // No body at all: the return date defaults server-side
    let response = client
        .put(format!("{}/borrowings/{}/return", BASE_URL, transaction_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 1);
}

#[tokio::test]
#[ignore]
async fn test_reserving_zero_stock_title_fails() {
    let client = Client::new();
    let (book_id, _token) = create_test_book(&client, 0).await;

    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-4",
            "user_name": "Hopeful Student",
            "user_role": "student",
            "reserve_date": chrono::Utc::now(),
            "return_date": chrono::Utc::now() + chrono::Duration::days(14)
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "OutOfStock");
}

#[tokio::test]
#[ignore]
async fn test_cancelled_reservation_unblocks_title_deletion() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;

    let reservation: Value = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": "student-5",
            "user_name": "Fickle Student",
            "user_role": "student",
            "reserve_date": chrono::Utc::now(),
            "return_date": chrono::Utc::now() + chrono::Duration::days(14)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let reservation_id = reservation["reservation_id"].as_str().expect("No reservation id");

    // The active reservation pins the title
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let cancelled: Value = client
        .delete(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": "student-5" }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(cancelled["data"]["status"], "Cancelled");

    // Cancelling a second time: no longer active, reads as NotFound
    let response = client
        .delete(format!("{}/reservations/{}", BASE_URL, reservation_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "user_id": "student-5" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_expiry_sweep_flips_stale_reservations() {
    let client = Client::new();
    let (book_id, token) = create_test_book(&client, 1).await;
    let user_id = format!("sleeper-{}", chrono::Utc::now().timestamp_millis());

    // Pickup window already closed
    let reservation: Value = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token()))
        .json(&json!({
            "book_id": book_id,
            "user_id": user_id,
            "user_name": "Sleepy Student",
            "user_role": "student",
            "reserve_date": chrono::Utc::now() - chrono::Duration::days(21),
            "return_date": chrono::Utc::now() - chrono::Duration::days(7)
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let reservation_id = reservation["reservation_id"].as_str().expect("No reservation id");

    let sweep: Value = client
        .post(format!("{}/reservations/mark-expired", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(sweep["success"], true);
    assert!(sweep["expired_count"].as_i64().expect("No expired_count") >= 1);

    let listed: Value = client
        .get(format!("{}/reservations/user/{}", BASE_URL, user_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let row = listed["data"]
        .as_array()
        .expect("No data array")
        .iter()
        .find(|r| r["reservation_id"] == reservation_id)
        .expect("Reservation not listed");
    assert_eq!(row["status"], "Expired");

    // Expiry restores nothing: active reservations never held a copy
    let availability: Value = client
        .get(format!("{}/books/{}/availability", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(availability["data"]["available_quantity"], 1);
}
