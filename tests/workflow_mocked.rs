/// Integration tests with mocked remote platforms.
/// Exercises the reconciliation workflows end to end without hitting the real
/// Flexge or Asaas APIs.
use chrono::{Duration, NaiveDate, Utc};
use school_billing_api::billing::{AsaasClient, BillingType};
use school_billing_api::enrollment::FlexgeClient;
use school_billing_api::errors::AppError;
use school_billing_api::inactivity::{InactivityEnforcer, InactivityThresholds};
use school_billing_api::notify::{NotificationJob, NotifierHandle};
use school_billing_api::payments::{PaymentOrchestrator, ResendOutcome};
use school_billing_api::resolver::CustomerResolver;
use school_billing_api::subscriptions::SubscriptionSwitcher;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THRESHOLDS: InactivityThresholds = InactivityThresholds {
    warn_after_days: 8,
    disable_after_days: 10,
};

fn flexge(server: &MockServer) -> FlexgeClient {
    FlexgeClient::new(server.uri(), "test_key".to_string()).unwrap()
}

fn asaas(server: &MockServer) -> AsaasClient {
    AsaasClient::new(server.uri(), "test_token".to_string()).unwrap()
}

fn test_notifier() -> (NotifierHandle, mpsc::Receiver<NotificationJob>) {
    let (tx, rx) = mpsc::channel(16);
    (NotifierHandle::new(tx), rx)
}

fn student_json(id: &str, name: &str, email: &str, days_since_access: Option<i64>) -> serde_json::Value {
    let mut doc = json!({
        "id": id,
        "name": name,
        "email": email,
        "phone": "(11) 98765-4321",
        "cpf": "123.456.789-01",
    });
    if let Some(days) = days_since_access {
        doc["lastAccess"] = json!((Utc::now() - Duration::days(days)).to_rfc3339());
    }
    doc
}

async fn mock_student_pages(server: &MockServer, docs: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": docs })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": [] })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn scan_disables_past_threshold_without_warning() {
    let server = MockServer::start().await;

    // Ana: 11 days inactive with thresholds (8, 10) -> disable, no warning.
    mock_student_pages(
        &server,
        json!([student_json("stu_ana", "Ana Souza", "ana@x.com", Some(11))]),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/students/disable"))
        .and(body_partial_json(json!({ "students": ["stu_ana"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = flexge(&server);
    let (notifier, mut jobs) = test_notifier();
    let enforcer = InactivityEnforcer::new(&client, &notifier, THRESHOLDS);

    let outcome = enforcer.run_scan(Utc::now()).await.unwrap();
    assert_eq!(outcome.disabled, 1);
    assert_eq!(outcome.warned, 0);
    assert!(jobs.try_recv().is_err());
}

#[tokio::test]
async fn scan_warns_in_warn_band_exactly_once() {
    let server = MockServer::start().await;

    // Bob: 9 days inactive -> exactly one warning, no disable call mounted.
    mock_student_pages(
        &server,
        json!([student_json("stu_bob", "Bob Lima", "bob@x.com", Some(9))]),
    )
    .await;

    let client = flexge(&server);
    let (notifier, mut jobs) = test_notifier();
    let enforcer = InactivityEnforcer::new(&client, &notifier, THRESHOLDS);

    let outcome = enforcer.run_scan(Utc::now()).await.unwrap();
    assert_eq!(outcome.warned, 1);
    assert_eq!(outcome.disabled, 0);

    match jobs.try_recv().unwrap() {
        NotificationJob::InactivityWarning { email, first_name } => {
            assert_eq!(email, "bob@x.com");
            assert_eq!(first_name, "Bob");
        }
        other => panic!("unexpected job: {:?}", other),
    }
    assert!(jobs.try_recv().is_err(), "bob must be warned exactly once");
}

#[tokio::test]
async fn scan_skips_students_without_last_access() {
    let server = MockServer::start().await;

    mock_student_pages(
        &server,
        json!([student_json("stu_new", "Novo Aluno", "novo@x.com", None)]),
    )
    .await;

    let client = flexge(&server);
    let (notifier, mut jobs) = test_notifier();
    let enforcer = InactivityEnforcer::new(&client, &notifier, THRESHOLDS);

    let outcome = enforcer.run_scan(Utc::now()).await.unwrap();
    assert_eq!(outcome.disabled, 0);
    assert_eq!(outcome.warned, 0);
    assert!(jobs.try_recv().is_err());
}

#[tokio::test]
async fn scan_fails_fast_on_page_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = flexge(&server);
    let (notifier, _jobs) = test_notifier();
    let enforcer = InactivityEnforcer::new(&client, &notifier, THRESHOLDS);

    let err = enforcer.run_scan(Utc::now()).await.unwrap_err();
    match err {
        AppError::RemoteApi { status, body, .. } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream down");
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

#[tokio::test]
async fn scan_aborts_when_disable_action_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [student_json("stu_ana", "Ana Souza", "ana@x.com", Some(11))]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/students/disable"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disable broke"))
        .expect(1)
        .mount(&server)
        .await;
    // The walk stops at the failed disable: no further pages are fetched.
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let client = flexge(&server);
    let (notifier, _jobs) = test_notifier();
    let enforcer = InactivityEnforcer::new(&client, &notifier, THRESHOLDS);

    let err = enforcer.run_scan(Utc::now()).await.unwrap_err();
    match err {
        AppError::RemoteApi { status, body, .. } => {
            assert_eq!(status, 500);
            assert_eq!(body, "disable broke");
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_first_page_is_end_of_data_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": [] })))
        .mount(&server)
        .await;

    let client = flexge(&server);
    assert!(client.list_students(1).await.unwrap().is_none());
    assert!(client
        .find_student_by_email("ghost@x.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn student_lookup_is_case_insensitive_across_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [student_json("stu_1", "Outra Pessoa", "outra@x.com", None)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [student_json("stu_2", "Ana Souza", "Ana@X.com", None)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/students"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "docs": [] })))
        .mount(&server)
        .await;

    let client = flexge(&server);
    let student = client
        .find_student_by_email("ana@x.com")
        .await
        .unwrap()
        .expect("ana should be found on page 2");
    assert_eq!(student.id, "stu_2");
}

#[tokio::test]
async fn issue_payment_creates_one_customer_then_one_charge() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(
        &flexge_server,
        json!([student_json("stu_x", "Xavier Mota", "x@y.com", Some(1))]),
    )
    .await;

    // No pre-existing customer.
    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(query_param("email", "x@y.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&asaas_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/customers"))
        .and(body_partial_json(json!({
            "name": "Xavier Mota",
            "email": "x@y.com",
            "mobilePhone": "11987654321",
            "cpfCnpj": "12345678901",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_1", "name": "Xavier Mota", "email": "x@y.com"
        })))
        .expect(1)
        .mount(&asaas_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({
            "customer": "cus_1",
            "billingType": "BOLETO",
            "value": 150.0,
            "dueDate": "2025-03-01",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pay_1",
            "customer": "cus_1",
            "value": 150.0,
            "dueDate": "2025-03-01",
            "billingType": "BOLETO",
            "status": "PENDING",
            "bankSlipUrl": "https://asaas.test/slip/pay_1",
        })))
        .expect(1)
        .mount(&asaas_server)
        .await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let (notifier, mut jobs) = test_notifier();
    let orchestrator = PaymentOrchestrator::new(&flexge_client, &asaas_client, &notifier);

    let issued = orchestrator
        .issue_payment("x@y.com", 150.0, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        .await
        .unwrap();

    assert_eq!(issued.status, "sent");
    assert_eq!(issued.link, "https://asaas.test/slip/pay_1");

    // Student has a phone, so the link is dispatched over the side channel.
    match jobs.try_recv().unwrap() {
        NotificationJob::ChargeLink { link, first_name, .. } => {
            assert_eq!(link, "https://asaas.test/slip/pay_1");
            assert_eq!(first_name, "Xavier");
        }
        other => panic!("unexpected job: {:?}", other),
    }
}

#[tokio::test]
async fn issue_payment_for_unknown_student_is_not_found() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(&flexge_server, json!([])).await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let (notifier, _jobs) = test_notifier();
    let orchestrator = PaymentOrchestrator::new(&flexge_client, &asaas_client, &notifier);

    let err = orchestrator
        .issue_payment("ghost@x.com", 100.0, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn failed_charge_creation_surfaces_remote_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("{\"errors\":[\"invalid value\"]}"),
        )
        .mount(&server)
        .await;

    let client = asaas(&server);
    let err = client
        .create_payment("cus_1", -1.0, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), "Mensalidade")
        .await
        .unwrap_err();

    match err {
        AppError::RemoteApi { service, status, body } => {
            assert_eq!(service, "asaas");
            assert_eq!(status, 400);
            assert!(body.contains("invalid value"));
        }
        other => panic!("expected RemoteApi, got {:?}", other),
    }
}

#[tokio::test]
async fn pending_lookup_returns_the_just_created_charge() {
    let server = MockServer::start().await;

    let charge = json!({
        "id": "pay_9",
        "customer": "cus_9",
        "value": 200.0,
        "dueDate": "2027-01-15",
        "billingType": "BOLETO",
        "status": "PENDING",
        "invoiceUrl": "https://asaas.test/i/pay_9",
    });

    Mock::given(method("POST"))
        .and(path("/payments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&charge))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments"))
        .and(query_param("customer", "cus_9"))
        .and(query_param("status", "PENDING"))
        .and(query_param("sort", "dueDate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [charge] })))
        .mount(&server)
        .await;

    let client = asaas(&server);
    let created = client
        .create_payment("cus_9", 200.0, NaiveDate::from_ymd_opt(2027, 1, 15).unwrap(), "Mensalidade")
        .await
        .unwrap();
    let found = client
        .find_latest_pending_payment("cus_9")
        .await
        .unwrap()
        .expect("the created charge must be pending");

    assert_eq!(found.id, created.id);
    assert_eq!(found.value, created.value);
    assert_eq!(found.due_date, created.due_date);
}

#[tokio::test]
async fn resolver_reuses_existing_customer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(query_param("email", "ana@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "cus_77", "name": "Ana Souza", "email": "ana@x.com" }]
        })))
        .mount(&server)
        .await;
    // No POST /customers mock mounted: creation would fail the test.

    let client = asaas(&server);
    let student: school_billing_api::enrollment::StudentRecord = serde_json::from_value(
        student_json("stu_ana", "Ana Souza", "  ANA@X.com ", None),
    )
    .unwrap();

    let customer = CustomerResolver::new(&client).resolve(&student).await.unwrap();
    assert_eq!(customer.id, "cus_77");
}

#[tokio::test]
async fn resend_derives_customer_from_email_when_student_unknown() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(&flexge_server, json!([])).await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .and(query_param("email", "billed@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&asaas_server)
        .await;
    // Placeholder profile: name falls back to the email itself.
    Mock::given(method("POST"))
        .and(path("/customers"))
        .and(body_partial_json(json!({ "name": "billed@x.com", "email": "billed@x.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_50", "name": "billed@x.com", "email": "billed@x.com"
        })))
        .expect(1)
        .mount(&asaas_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("customer", "cus_50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "sub_1",
                "customer": "cus_50",
                "status": "ACTIVE",
                "billingType": "BOLETO",
                "nextDueDate": "2025-04-01",
            }]
        })))
        .mount(&asaas_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/payments"))
        .and(query_param("subscription", "sub_1"))
        .and(query_param("status", "PENDING"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "pay_3",
                "customer": "cus_50",
                "value": 350.0,
                "dueDate": "2025-04-01",
                "billingType": "BOLETO",
                "status": "PENDING",
                "bankSlipUrl": "https://asaas.test/slip/pay_3",
            }]
        })))
        .mount(&asaas_server)
        .await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let (notifier, _jobs) = test_notifier();
    let orchestrator = PaymentOrchestrator::new(&flexge_client, &asaas_client, &notifier);

    match orchestrator.resend_pending_charge("billed@x.com").await.unwrap() {
        ResendOutcome::Charge(charge) => {
            assert_eq!(charge.name, "billed@x.com");
            assert_eq!(charge.value, 350.0);
            assert_eq!(charge.link.as_deref(), Some("https://asaas.test/slip/pay_3"));
        }
        other => panic!("expected a pending charge, got {:?}", other),
    }
}

#[tokio::test]
async fn resend_with_no_active_subscription_is_a_normal_outcome() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(
        &flexge_server,
        json!([student_json("stu_c", "Carla Reis", "carla@x.com", None)]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "cus_c", "name": "Carla Reis", "email": "carla@x.com" }]
        })))
        .mount(&asaas_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&asaas_server)
        .await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let (notifier, _jobs) = test_notifier();
    let orchestrator = PaymentOrchestrator::new(&flexge_client, &asaas_client, &notifier);

    let outcome = orchestrator.resend_pending_charge("carla@x.com").await.unwrap();
    assert!(matches!(outcome, ResendOutcome::NoActiveSubscription));
}

#[tokio::test]
async fn switch_without_active_subscription_mutates_nothing() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(
        &flexge_server,
        json!([student_json("stu_d", "Duda Prado", "duda@x.com", None)]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "cus_d", "name": "Duda Prado", "email": "duda@x.com" }]
        })))
        .mount(&asaas_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&asaas_server)
        .await;
    // Zero mutation calls allowed.
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&asaas_server)
        .await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let switcher = SubscriptionSwitcher::new(&flexge_client, &asaas_client);

    let err = switcher
        .switch_billing_type("duda@x.com", BillingType::CreditCard)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn switch_updates_subscription_and_propagates_to_pending() {
    let flexge_server = MockServer::start().await;
    let asaas_server = MockServer::start().await;

    mock_student_pages(
        &flexge_server,
        json!([student_json("stu_e", "Edu Farias", "edu@x.com", None)]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "cus_e", "name": "Edu Farias", "email": "edu@x.com" }]
        })))
        .mount(&asaas_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscriptions"))
        .and(query_param("status", "ACTIVE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "sub_e",
                "customer": "cus_e",
                "status": "ACTIVE",
                "billingType": "BOLETO",
                "nextDueDate": "2025-04-01",
            }]
        })))
        .mount(&asaas_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/subscriptions/sub_e"))
        .and(body_partial_json(json!({
            "billingType": "CREDIT_CARD",
            "updatePendingPayments": true,
            "status": "ACTIVE",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub_e",
            "customer": "cus_e",
            "status": "ACTIVE",
            "billingType": "CREDIT_CARD",
            "nextDueDate": Utc::now().date_naive().format("%Y-%m-%d").to_string(),
        })))
        .expect(1)
        .mount(&asaas_server)
        .await;

    let flexge_client = flexge(&flexge_server);
    let asaas_client = asaas(&asaas_server);
    let switcher = SubscriptionSwitcher::new(&flexge_client, &asaas_client);

    let outcome = switcher
        .switch_billing_type("edu@x.com", BillingType::CreditCard)
        .await
        .unwrap();
    assert_eq!(outcome.subscription_id, "sub_e");
    assert_eq!(outcome.billing_type, BillingType::CreditCard);
    assert_eq!(outcome.next_due_date, Some(Utc::now().date_naive()));
}

#[tokio::test]
async fn mutating_requests_carry_the_same_auth_headers_as_reads() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(header("access-token", "test_token"))
        .and(header("User-Agent", "school-billing-api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pay_h",
            "customer": "cus_h",
            "value": 150.0,
            "dueDate": "2025-03-01",
            "billingType": "BOLETO",
            "status": "PENDING",
            "invoiceUrl": "https://asaas.test/i/pay_h",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/subscriptions/sub_h"))
        .and(header("access-token", "test_token"))
        .and(header("User-Agent", "school-billing-api"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sub_h",
            "customer": "cus_h",
            "status": "ACTIVE",
            "billingType": "CREDIT_CARD",
            "nextDueDate": "2025-03-01",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = asaas(&server);
    client
        .create_payment("cus_h", 150.0, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), "Mensalidade")
        .await
        .unwrap();
    client
        .update_subscription_billing_type("sub_h", BillingType::CreditCard, true)
        .await
        .unwrap();
}

#[tokio::test]
async fn flexible_payment_returns_checkout_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments"))
        .and(body_partial_json(json!({ "billingType": "UNDEFINED", "value": 99.9 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "pay_f",
            "customer": "cus_f",
            "value": 99.9,
            "dueDate": (Utc::now().date_naive() + Duration::days(3)).format("%Y-%m-%d").to_string(),
            "billingType": "UNDEFINED",
            "status": "PENDING",
            "invoiceUrl": "https://asaas.test/i/pay_f",
        })))
        .mount(&server)
        .await;

    let client = asaas(&server);
    let url = client.create_flexible_payment("cus_f", 99.9).await.unwrap();
    assert_eq!(url, "https://asaas.test/i/pay_f");
}
