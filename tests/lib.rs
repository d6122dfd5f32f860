//! Scripted stand-in for the upstream employee service.
//!
//! Speaks the upstream's wire format (`employee_*` fields inside a
//! `{data, status, error}` envelope) and can be told to rate limit, fail or
//! return garbage for a number of calls.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use entity::{CreateEmployeeRequest, DeleteEmployeeRequest, Employee};
use platform_upstream::{HttpEmployeeGateway, RetryPolicy, UpstreamSettings};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use uuid::Uuid;

pub const BASE_PATH: &str = "/api/v1/employee";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    ServerError,
    Malformed,
}

#[derive(Default)]
struct Script {
    employees: Mutex<Vec<Employee>>,
    rate_limits: AtomicU32,
    delete_rate_limits: AtomicU32,
    fault: Mutex<Option<Fault>>,
    hits: AtomicU32,
    deleted_names: Mutex<Vec<String>>,
}

impl Script {
    fn intercept(&self, method_limits: Option<&AtomicU32>) -> Option<Response> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let limited = take_one(&self.rate_limits)
            || method_limits.is_some_and(|counter| take_one(counter));
        if limited {
            return Some(StatusCode::TOO_MANY_REQUESTS.into_response());
        }
        match *self.fault.lock().unwrap() {
            Some(Fault::ServerError) => Some(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"status": "Failed to process request.", "error": "boom"})),
                )
                    .into_response(),
            ),
            Some(Fault::Malformed) => Some((StatusCode::OK, "<html>maintenance</html>").into_response()),
            None => None,
        }
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok()
}

pub struct FakeUpstream {
    base_url: String,
    script: Arc<Script>,
    handle: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start(employees: Vec<Employee>) -> Result<Self> {
        let script = Arc::new(Script {
            employees: Mutex::new(employees),
            ..Script::default()
        });
        let router = Router::new()
            .route(
                BASE_PATH,
                get(list_employees).post(create_employee).delete(delete_employee),
            )
            .route(&format!("{BASE_PATH}/{{id}}"), get(get_employee))
            .with_state(script.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("binding fake upstream")?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        Ok(Self {
            base_url: format!("http://{addr}{BASE_PATH}"),
            script,
            handle,
        })
    }

    /// Gateway with a millisecond backoff schedule so retries stay fast.
    pub fn gateway(&self) -> Result<HttpEmployeeGateway> {
        let retry = RetryPolicy {
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(50),
            ..RetryPolicy::default()
        };
        let settings = UpstreamSettings::new(&self.base_url)?
            .with_request_timeout(Duration::from_secs(5))
            .with_retry(retry);
        Ok(HttpEmployeeGateway::new(&settings)?)
    }

    /// Answer the next `count` calls with 429.
    pub fn rate_limit_next(&self, count: u32) {
        self.script.rate_limits.store(count, Ordering::SeqCst);
    }

    /// Answer the next `count` delete calls with 429; other calls pass.
    pub fn rate_limit_deletes(&self, count: u32) {
        self.script.delete_rate_limits.store(count, Ordering::SeqCst);
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        *self.script.fault.lock().unwrap() = fault;
    }

    pub fn hits(&self) -> u32 {
        self.script.hits.load(Ordering::SeqCst)
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.script.deleted_names.lock().unwrap().clone()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.script.employees.lock().unwrap().clone()
    }
}

impl Drop for FakeUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn employee(name: &str, salary: u32) -> Employee {
    Employee {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        salary,
        age: 35,
        title: "Engineer".to_string(),
        email: Some(format!("{}@company.com", name.to_lowercase())),
    }
}

fn wire(employee: &Employee) -> Value {
    json!({
        "id": employee.id,
        "employee_name": employee.name,
        "employee_salary": employee.salary,
        "employee_age": employee.age,
        "employee_title": employee.title,
        "employee_email": employee.email,
    })
}

fn success(data: Value) -> Response {
    Json(json!({"data": data, "status": "Successfully processed request."})).into_response()
}

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        Json(json!({"status": "Failed to process request.", "error": error})),
    )
        .into_response()
}

async fn list_employees(State(script): State<Arc<Script>>) -> Response {
    if let Some(response) = script.intercept(None) {
        return response;
    }
    let employees = script.employees.lock().unwrap();
    success(Value::Array(employees.iter().map(wire).collect()))
}

async fn get_employee(State(script): State<Arc<Script>>, Path(id): Path<String>) -> Response {
    if let Some(response) = script.intercept(None) {
        return response;
    }
    let employees = script.employees.lock().unwrap();
    match employees.iter().find(|employee| employee.id == id) {
        Some(employee) => success(wire(employee)),
        None => failure(StatusCode::NOT_FOUND, "employee not found"),
    }
}

async fn create_employee(
    State(script): State<Arc<Script>>,
    Json(request): Json<CreateEmployeeRequest>,
) -> Response {
    if let Some(response) = script.intercept(None) {
        return response;
    }
    if request.name.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "name must not be blank");
    }
    let created = Employee {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        salary: request.salary,
        age: request.age,
        title: request.title,
        email: None,
    };
    let body = wire(&created);
    script.employees.lock().unwrap().push(created);
    success(body)
}

async fn delete_employee(
    State(script): State<Arc<Script>>,
    Json(request): Json<DeleteEmployeeRequest>,
) -> Response {
    if let Some(response) = script.intercept(Some(&script.delete_rate_limits)) {
        return response;
    }
    script
        .deleted_names
        .lock()
        .unwrap()
        .push(request.name.clone());
    let mut employees = script.employees.lock().unwrap();
    let before = employees.len();
    employees.retain(|employee| employee.name != request.name);
    success(Value::Bool(employees.len() < before))
}
