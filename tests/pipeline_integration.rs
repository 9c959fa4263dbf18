//! ---
//! seed_section: "07-testing-qa"
//! seed_subsection: "integration-tests"
//! seed_type: "source"
//! seed_scope: "code"
//! seed_description: "End-to-end provision and reclaim runs against a mock helpdesk."
//! seed_version: "v0.0.0-prealpha"
//! seed_owner: "tbd"
//! ---
//! Both pipelines exercised through the real HTTP transport against
//! an in-process mock of the helpdesk API, including paginated
//! listing and forced user deletion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use url::Url;

use deskseed_common::RunIdentity;
use deskseed_provisioner::{ProvisionPlan, ProvisionReport, Provisioner};
use deskseed_reclaimer::{MatchStrategy, Reclaimer};
use deskseed_transport::HttpTransport;

/// Small page size so even tiny runs span multiple pages.
const PAGE_SIZE: usize = 2;

#[derive(Default)]
struct Store {
    next_id: u64,
    organizations: Vec<Value>,
    users: Vec<Value>,
    tickets: Vec<Value>,
    identities: Vec<(u64, String)>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

type Shared = Arc<Mutex<Store>>;

fn paginate(items: &[Value], key: &str, path: &str, page: usize) -> Value {
    let start = (page - 1) * PAGE_SIZE;
    let slice: Vec<Value> = items.iter().skip(start).take(PAGE_SIZE).cloned().collect();
    let next = if start + PAGE_SIZE < items.len() {
        json!(format!("{path}?page={}", page + 1))
    } else {
        Value::Null
    };
    json!({ key: slice, "next_page": next })
}

fn page_param(params: &HashMap<String, String>) -> usize {
    params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1)
}

async fn create_organization(
    State(store): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    let id = store.next_id();
    let record = json!({ "id": id, "name": body["organization"]["name"] });
    store.organizations.push(record.clone());
    (StatusCode::CREATED, Json(json!({ "organization": record })))
}

async fn list_organizations(
    State(store): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = store.lock().unwrap();
    Json(paginate(
        &store.organizations,
        "organizations",
        "/api/v2/organizations.json",
        page_param(&params),
    ))
}

async fn create_user(
    State(store): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    let id = store.next_id();
    let user = &body["user"];
    let record = json!({
        "id": id,
        "name": user["name"],
        "email": user["email"],
        "organization_id": user["organization_id"],
    });
    store.users.push(record.clone());
    (StatusCode::CREATED, Json(json!({ "user": record })))
}

async fn list_users(
    State(store): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = store.lock().unwrap();
    Json(paginate(
        &store.users,
        "users",
        "/api/v2/users.json",
        page_param(&params),
    ))
}

async fn attach_identity(
    State(store): State<Shared>,
    Path(user_id): Path<u64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    let value = body["identity"]["value"].as_str().unwrap_or("").to_owned();
    store.identities.push((user_id, value));
    let id = store.next_id();
    (StatusCode::CREATED, Json(json!({ "identity": { "id": id } })))
}

async fn create_ticket(
    State(store): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut store = store.lock().unwrap();
    let id = store.next_id();
    let ticket = &body["ticket"];
    let record = json!({
        "id": id,
        "subject": ticket["subject"],
        "requester_id": ticket["requester_id"],
        "collaborators": ticket["collaborators"],
    });
    store.tickets.push(record.clone());
    (StatusCode::CREATED, Json(json!({ "ticket": record })))
}

async fn list_tickets(
    State(store): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let store = store.lock().unwrap();
    Json(paginate(
        &store.tickets,
        "tickets",
        "/api/v2/tickets.json",
        page_param(&params),
    ))
}

fn strip_id(raw: &str) -> u64 {
    raw.trim_end_matches(".json").parse().expect("numeric id")
}

fn remove_by_id(items: &mut Vec<Value>, id: u64) -> bool {
    let before = items.len();
    items.retain(|item| item["id"].as_u64() != Some(id));
    items.len() != before
}

async fn delete_ticket(State(store): State<Shared>, Path(raw): Path<String>) -> StatusCode {
    let mut store = store.lock().unwrap();
    if remove_by_id(&mut store.tickets, strip_id(&raw)) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn delete_user(
    State(store): State<Shared>,
    Path(raw): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    // The real platform archives users unless the force flag is set;
    // cleanup relies on hard deletion, so the mock insists on it.
    if params.get("force").map(String::as_str) != Some("true") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "UserSoftDeletedOnly" })),
        )
            .into_response();
    }
    let mut store = store.lock().unwrap();
    if remove_by_id(&mut store.users, strip_id(&raw)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn delete_organization(State(store): State<Shared>, Path(raw): Path<String>) -> StatusCode {
    let mut store = store.lock().unwrap();
    if remove_by_id(&mut store.organizations, strip_id(&raw)) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn spawn_mock_helpdesk() -> (Shared, HttpTransport) {
    let store: Shared = Arc::new(Mutex::new(Store::default()));
    let app = Router::new()
        .route(
            "/api/v2/organizations.json",
            post(create_organization).get(list_organizations),
        )
        .route("/api/v2/users.json", post(create_user).get(list_users))
        .route("/api/v2/users/:id/identities.json", post(attach_identity))
        .route("/api/v2/tickets.json", post(create_ticket).get(list_tickets))
        .route("/api/v2/tickets/:id", delete(delete_ticket))
        .route("/api/v2/users/:id", delete(delete_user))
        .route("/api/v2/organizations/:id", delete(delete_organization))
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock helpdesk");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock helpdesk");
    });

    let base = Url::parse(&format!("http://{addr}")).expect("base url");
    let transport =
        HttpTransport::with_base(base, "Basic dGVzdA==".to_owned()).expect("transport");
    (store, transport)
}

async fn provision(transport: &HttpTransport, run: &str, count: usize) -> ProvisionReport {
    let plan = ProvisionPlan::new(count, "Demo", RunIdentity::from_label(run));
    Provisioner::new(transport, plan)
        .run()
        .await
        .expect("provisioning run")
}

#[tokio::test]
async fn provision_creates_dependency_ordered_entities() {
    let (store, transport) = spawn_mock_helpdesk().await;
    let report = provision(&transport, "it1", 3).await;

    assert_eq!(report.organizations.len(), 3);
    assert_eq!(report.organizations[0].name, "Demo Org 1 (it1)");
    assert_eq!(report.users[0].email, "user1-it1@example.com");
    assert_eq!(report.tickets[2].subject, "Issue 3 (it1)");

    let store = store.lock().unwrap();
    assert_eq!(store.organizations.len(), 3);
    assert_eq!(store.users.len(), 3);
    assert_eq!(store.tickets.len(), 3);

    // Each user is bound to the organization created at its index.
    for (user, org) in store.users.iter().zip(&store.organizations) {
        assert_eq!(user["organization_id"], org["id"]);
    }
    // Circular collaborator assignment, wrap-around included.
    for (i, ticket) in store.tickets.iter().enumerate() {
        let expected = report.users[(i + 1) % 3].email.clone();
        assert_eq!(ticket["collaborators"], json!([expected]));
    }
    // One secondary identity per user.
    assert_eq!(store.identities.len(), 3);
    assert_eq!(store.identities[0].1, "user1-it1+alt@example.com");
}

#[tokio::test]
async fn run_scoped_reclaim_leaves_other_runs_untouched() {
    let (store, transport) = spawn_mock_helpdesk().await;
    provision(&transport, "it1", 3).await;
    provision(&transport, "it2", 1).await;

    let strategy = MatchStrategy::RunScoped(RunIdentity::from_label("it1"));
    let report = Reclaimer::new(&transport, strategy).run().await;

    assert!(report.any_stage_ran());
    assert_eq!(report.total_deleted(), 9);
    assert!(report.stages.iter().all(|s| s.failures.is_empty()));

    let store = store.lock().unwrap();
    assert_eq!(store.organizations.len(), 1);
    assert_eq!(store.users.len(), 1);
    assert_eq!(store.tickets.len(), 1);
    assert_eq!(store.organizations[0]["name"], "Demo Org 1 (it2)");
    assert_eq!(store.users[0]["email"], "user1-it2@example.com");
    assert_eq!(store.tickets[0]["subject"], "Issue 1 (it2)");
}

#[tokio::test]
async fn manifest_reclaim_deletes_exactly_the_recorded_ids() {
    let (store, transport) = spawn_mock_helpdesk().await;
    let report = provision(&transport, "it3", 2).await;

    let strategy = MatchStrategy::Manifest(report.manifest.clone());
    let reclaim = Reclaimer::new(&transport, strategy).run().await;

    assert_eq!(reclaim.total_deleted(), 6);
    let store = store.lock().unwrap();
    assert!(store.organizations.is_empty());
    assert!(store.users.is_empty());
    assert!(store.tickets.is_empty());
}

#[tokio::test]
async fn dry_run_classifies_without_deleting() {
    let (store, transport) = spawn_mock_helpdesk().await;
    provision(&transport, "it4", 1).await;

    let strategy = MatchStrategy::RunScoped(RunIdentity::from_label("it4"));
    let report = Reclaimer::new(&transport, strategy).dry_run(true).run().await;

    assert_eq!(report.total_matched(), 3);
    assert_eq!(report.total_deleted(), 0);
    let store = store.lock().unwrap();
    assert_eq!(store.organizations.len(), 1);
    assert_eq!(store.users.len(), 1);
    assert_eq!(store.tickets.len(), 1);
}
