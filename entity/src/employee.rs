use serde::{Deserialize, Serialize};

/// Employee record as held by the upstream service.
///
/// The upstream mock names its fields `employee_*`; both spellings decode.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Employee {
    pub id: String,
    #[serde(default, alias = "employee_name")]
    pub name: String,
    #[serde(default, alias = "employee_salary")]
    pub salary: u32,
    #[serde(default, alias = "employee_age")]
    pub age: u32,
    #[serde(default, alias = "employee_title")]
    pub title: String,
    #[serde(default, alias = "employee_email", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Employee {
    /// Name used to key the upstream delete, if the record carries one.
    pub fn delete_key(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(self.name.as_str())
    }
}

/// Payload for `POST {base}`. The identifier is assigned upstream.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub salary: u32,
    pub age: u32,
    pub title: String,
}

/// Payload for `DELETE {base}`; the upstream deletes by name, not id.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeleteEmployeeRequest {
    pub name: String,
}

impl DeleteEmployeeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
