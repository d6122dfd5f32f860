//! In-memory [`EmployeeGateway`] for tests.

use std::sync::{Arc, Mutex};

use entity::{CreateEmployeeRequest, Employee};
use platform_upstream::{EmployeeGateway, UpstreamResult};

type DeleteResult = Arc<dyn Fn() -> UpstreamResult<bool> + Send + Sync>;

pub fn employee(id: &str, name: &str, salary: u32) -> Employee {
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        salary,
        age: 30,
        title: "Engineer".to_string(),
        email: None,
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGateway {
    employees: Arc<Mutex<Vec<Employee>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    delete_result: Option<DeleteResult>,
}

impl InMemoryGateway {
    pub fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: Arc::new(Mutex::new(employees)),
            ..Self::default()
        }
    }

    /// Override what `delete_by_name` returns; the store is left untouched.
    pub fn with_delete_result(
        mut self,
        result: impl Fn() -> UpstreamResult<bool> + Send + Sync + 'static,
    ) -> Self {
        self.delete_result = Some(Arc::new(result));
        self
    }

    pub fn deleted_names(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl EmployeeGateway for InMemoryGateway {
    async fn list_all(&self) -> Vec<Employee> {
        self.employees.lock().unwrap().clone()
    }

    async fn get_by_id(&self, id: &str) -> Option<Employee> {
        self.employees
            .lock()
            .unwrap()
            .iter()
            .find(|employee| employee.id == id)
            .cloned()
    }

    async fn create(&self, request: &CreateEmployeeRequest) -> Option<Employee> {
        let mut employees = self.employees.lock().unwrap();
        let created = Employee {
            id: format!("emp-{}", employees.len() + 1),
            name: request.name.clone(),
            salary: request.salary,
            age: request.age,
            title: request.title.clone(),
            email: None,
        };
        employees.push(created.clone());
        Some(created)
    }

    async fn delete_by_name(&self, name: &str) -> UpstreamResult<bool> {
        if let Some(result) = &self.delete_result {
            return result();
        }
        self.deleted.lock().unwrap().push(name.to_string());
        let mut employees = self.employees.lock().unwrap();
        let before = employees.len();
        employees.retain(|employee| employee.name != name);
        Ok(employees.len() < before)
    }
}
