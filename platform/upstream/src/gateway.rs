//! One operation per upstream endpoint.
//!
//! Reads fail open: any failure becomes an empty list or `None` after being
//! reported to the observer. Deletes propagate their failure so callers can
//! tell an exhausted retry budget apart from a refusal.

use std::{fmt, future::Future, sync::Arc};

use entity::{CreateEmployeeRequest, DeleteEmployeeRequest, Employee, Envelope};
use platform_obs::{OperationObserver, TracingObserver};
use reqwest::Method;
use tracing::warn;

use crate::{RetryingTransport, Sleeper, TokioSleeper, UpstreamResult, UpstreamSettings};

pub trait EmployeeGateway: Send + Sync {
    fn list_all(&self) -> impl Future<Output = Vec<Employee>> + Send;

    fn get_by_id(&self, id: &str) -> impl Future<Output = Option<Employee>> + Send;

    fn create(
        &self,
        request: &CreateEmployeeRequest,
    ) -> impl Future<Output = Option<Employee>> + Send;

    /// `Ok(false)` covers both an explicit `false` and a missing payload.
    fn delete_by_name(&self, name: &str) -> impl Future<Output = UpstreamResult<bool>> + Send;
}

#[derive(Clone)]
pub struct HttpEmployeeGateway<S = TokioSleeper> {
    transport: RetryingTransport<S>,
    observer: Arc<dyn OperationObserver>,
}

impl HttpEmployeeGateway<TokioSleeper> {
    pub fn new(settings: &UpstreamSettings) -> UpstreamResult<Self> {
        Ok(Self::from_transport(RetryingTransport::new(settings)?))
    }
}

impl<S: Sleeper> HttpEmployeeGateway<S> {
    pub fn from_transport(transport: RetryingTransport<S>) -> Self {
        Self {
            transport,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn OperationObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn settle<T>(
        &self,
        operation: &'static str,
        result: UpstreamResult<Envelope<T>>,
        summarize: impl FnOnce(&T) -> String,
    ) -> Option<T> {
        match result {
            Ok(Envelope {
                data: Some(data), ..
            }) => {
                self.observer.after(operation, &summarize(&data));
                Some(data)
            }
            Ok(Envelope { error, .. }) => {
                let reason = error.unwrap_or_else(|| "response carried no data".to_string());
                self.observer.on_error(operation, &reason);
                warn!(operation, %reason, "upstream returned no data");
                None
            }
            Err(err) => {
                self.observer.on_error(operation, &err);
                warn!(operation, error = %err, "absorbing upstream failure");
                None
            }
        }
    }
}

impl<S> fmt::Debug for HttpEmployeeGateway<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpEmployeeGateway").finish_non_exhaustive()
    }
}

impl<S: Sleeper> EmployeeGateway for HttpEmployeeGateway<S> {
    async fn list_all(&self) -> Vec<Employee> {
        const OPERATION: &str = "list_all";
        self.observer.before(OPERATION, &());
        let result = self
            .transport
            .execute::<Vec<Employee>, ()>(Method::GET, None, None)
            .await;
        self.settle(OPERATION, result, |employees| {
            format!("{} employees", employees.len())
        })
        .unwrap_or_default()
    }

    async fn get_by_id(&self, id: &str) -> Option<Employee> {
        const OPERATION: &str = "get_by_id";
        self.observer.before(OPERATION, &id);
        let result = self
            .transport
            .execute::<Employee, ()>(Method::GET, Some(id), None)
            .await;
        self.settle(OPERATION, result, |employee| format!("found {}", employee.id))
    }

    async fn create(&self, request: &CreateEmployeeRequest) -> Option<Employee> {
        const OPERATION: &str = "create";
        self.observer.before(OPERATION, request);
        let result = self
            .transport
            .execute::<Employee, _>(Method::POST, None, Some(request))
            .await;
        self.settle(OPERATION, result, |employee| format!("created {}", employee.id))
    }

    async fn delete_by_name(&self, name: &str) -> UpstreamResult<bool> {
        const OPERATION: &str = "delete_by_name";
        self.observer.before(OPERATION, &name);
        let request = DeleteEmployeeRequest::new(name);
        match self
            .transport
            .execute::<bool, _>(Method::DELETE, None, Some(&request))
            .await
        {
            Ok(envelope) => {
                let deleted = envelope.into_data().unwrap_or(false);
                self.observer.after(OPERATION, &format!("deleted {deleted}"));
                Ok(deleted)
            }
            Err(err) => {
                self.observer.on_error(OPERATION, &err);
                Err(err)
            }
        }
    }
}
