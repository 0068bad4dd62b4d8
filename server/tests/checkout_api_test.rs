//! Endpoint tests for the catalog and checkout-submission routes, run
//! against the real router with in-memory Ledger and Payment Processor
//! doubles.

#![allow(clippy::expect_used, clippy::panic)] // Panics: test fails loudly on bad fixtures

mod support;

use axum::http::StatusCode;
use box_office_server::payment::LineItem;
use serde_json::{json, Value};
use support::{offering, test_server};

fn attendee_fields() -> Value {
    json!({
        "firstName": "Ada",
        "surname": "Lovelace",
        "attendeeEmail": "ada@example.com",
        "phone": "07000000000",
        "postcode": "N1 1AA",
        "mailingListOptIn": true
    })
}

fn checkout_body(selected: Value) -> Value {
    let mut body = attendee_fields();
    body["selectedTickets"] = selected;
    body
}

#[tokio::test]
async fn catalog_lists_only_offerings_with_a_price_reference() {
    let (server, ledger, _) = test_server();
    ledger.seed_offering(offering("recA", "Standard", 1500, Some(10), Some("price_A")));
    ledger.seed_offering(offering("recC", "ACCESS COMPANION", 0, Some(99), None));

    let response = server.get("/api/events").await;
    response.assert_status(StatusCode::OK);

    let body: Value = response.json();
    let events = body["events"].as_array().expect("events array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "recA");
    assert_eq!(events[0]["ticketsRemaining"], 10);
    assert_eq!(events[0]["price"], 15.0);
}

#[tokio::test]
async fn checkout_rejects_empty_selection() {
    let (server, _, processor) = test_server();

    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([])))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "no tickets selected");
    assert!(processor.requests().is_empty());
}

#[tokio::test]
async fn checkout_rejects_missing_attendee_field() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering("recA", "Standard", 1500, Some(10), Some("price_A")));

    let mut body = checkout_body(json!([{ "eventId": "recA", "quantity": 1 }]));
    body["phone"] = json!("");
    let response = server.post("/api/checkout").json(&body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "missing required field: phone");
    assert!(processor.requests().is_empty());
}

#[tokio::test]
async fn checkout_reports_actual_remaining_on_over_request() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering("recA", "Standard", 1500, Some(3), Some("price_A")));

    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recA", "quantity": 5 }])))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(
        body["error"],
        "only 3 ticket(s) remaining for recA, 5 requested"
    );
    assert!(processor.requests().is_empty());
}

#[tokio::test]
async fn checkout_rejects_sold_out_and_unknown_counts() {
    let (server, ledger, _) = test_server();
    ledger.seed_offering(offering("recGone", "Standard", 1500, Some(0), Some("price_G")));
    ledger.seed_offering(offering("recOdd", "Standard", 1500, None, Some("price_O")));

    let sold_out = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recGone", "quantity": 1 }])))
        .await;
    sold_out.assert_status(StatusCode::CONFLICT);

    let unknown = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recOdd", "quantity": 1 }])))
        .await;
    unknown.assert_status(StatusCode::CONFLICT);
    let body: Value = unknown.json();
    assert_eq!(
        body["error"],
        "availability for recOdd could not be determined"
    );
}

#[tokio::test]
async fn one_bad_selection_rejects_the_whole_order() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering("recA", "Standard", 1500, Some(10), Some("price_A")));
    ledger.seed_offering(offering("recGone", "Standard", 1500, Some(0), Some("price_G")));

    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([
            { "eventId": "recA", "quantity": 2 },
            { "eventId": "recGone", "quantity": 1 }
        ])))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    // No partial session: the processor never saw the order.
    assert!(processor.requests().is_empty());
}

#[tokio::test]
async fn successful_checkout_returns_the_session_handle() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering("recA", "Standard", 1500, Some(10), Some("price_A")));

    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recA", "quantity": 2 }])))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["sessionId"], "cs_test_123");
    assert_eq!(body["url"], "https://processor.test/pay/cs_test_123");

    let requests = processor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].customer_email, "ada@example.com");
    assert_eq!(
        requests[0].line_items,
        vec![LineItem::PriceRef {
            price: "price_A".to_string(),
            quantity: 2
        }]
    );
    // Metadata carries the minimized order for the webhook.
    assert_eq!(
        requests[0].metadata.get("eventName").map(String::as_str),
        Some("Winter Concert")
    );
    assert_eq!(
        requests[0].metadata.get("ticketsData").map(String::as_str),
        Some(r#"[["recA",2,"Standard"]]"#)
    );
}

#[tokio::test]
async fn offering_without_price_reference_gets_an_inline_line_item() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering(
        "recB",
        "Accessible / Wheelchair",
        1200,
        Some(5),
        None,
    ));

    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recB", "quantity": 1 }])))
        .await;

    response.assert_status(StatusCode::OK);
    let requests = processor.requests();
    match &requests[0].line_items[0] {
        LineItem::Inline {
            name,
            unit_amount,
            currency,
            quantity,
        } => {
            assert_eq!(name, "Winter Concert - Accessible / Wheelchair");
            assert_eq!(unit_amount.as_minor(), 1200);
            assert_eq!(currency, "GBP");
            assert_eq!(*quantity, 1);
        }
        other => panic!("expected inline line item, got {other:?}"),
    }
}

#[tokio::test]
async fn companion_request_adds_a_zero_amount_line_item() {
    let (server, ledger, processor) = test_server();
    ledger.seed_offering(offering(
        "recB",
        "Accessible / Wheelchair",
        1200,
        Some(5),
        Some("price_B"),
    ));
    ledger.seed_offering(offering("recC", "ACCESS COMPANION", 0, Some(99), None));

    let mut body = checkout_body(json!([{ "eventId": "recB", "quantity": 1 }]));
    body["companionTicket"] = json!(true);
    body["companionEventId"] = json!("recC");
    let response = server.post("/api/checkout").json(&body).await;

    response.assert_status(StatusCode::OK);
    let requests = processor.requests();
    assert_eq!(requests[0].line_items.len(), 2);
    match &requests[0].line_items[1] {
        LineItem::Inline {
            name, unit_amount, ..
        } => {
            assert_eq!(name, "ACCESS COMPANION");
            assert!(unit_amount.is_zero());
        }
        other => panic!("expected zero-amount companion item, got {other:?}"),
    }
    assert_eq!(
        requests[0].metadata.get("companionTicket").map(String::as_str),
        Some("true")
    );
}

#[tokio::test]
async fn unreachable_ledger_is_surfaced_as_retryable() {
    let (server, _, _) = test_server();
    // No offering seeded: the Ledger double reports the record unreachable.
    let response = server
        .post("/api/checkout")
        .json(&checkout_body(json!([{ "eventId": "recMissing", "quantity": 1 }])))
        .await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}
