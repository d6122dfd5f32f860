use entity::{CreateEmployeeRequest, Employee};
use platform_upstream::EmployeeGateway;

use crate::{DeleteOutcome, aggregate, delete_employee};

/// Employee operations served to the inbound layer.
///
/// Every call fetches fresh data from the gateway; nothing is cached between
/// calls.
#[derive(Clone, Debug)]
pub struct EmployeeService<G> {
    gateway: G,
}

impl<G: EmployeeGateway> EmployeeService<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub async fn list_all(&self) -> Vec<Employee> {
        self.gateway.list_all().await
    }

    pub async fn search_by_name(&self, query: &str) -> Vec<Employee> {
        aggregate::search_by_name(&self.gateway.list_all().await, query)
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Employee> {
        self.gateway.get_by_id(id).await
    }

    pub async fn highest_salary(&self) -> u32 {
        aggregate::highest_salary(&self.gateway.list_all().await)
    }

    pub async fn top_ten_earners(&self) -> Vec<String> {
        aggregate::top_ten_earners(&self.gateway.list_all().await)
    }

    pub async fn create(&self, request: &CreateEmployeeRequest) -> Option<Employee> {
        self.gateway.create(request).await
    }

    pub async fn delete_by_id(&self, id: &str) -> DeleteOutcome {
        delete_employee(&self.gateway, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryGateway, employee};

    fn service() -> EmployeeService<InMemoryGateway> {
        EmployeeService::new(InMemoryGateway::with_employees(vec![
            employee("1", "Amy", 90_000),
            employee("2", "Bo", 150_000),
        ]))
    }

    #[tokio::test]
    async fn aggregates_come_from_the_gateway() {
        let service = service();

        assert_eq!(service.highest_salary().await, 150_000);
        assert_eq!(service.top_ten_earners().await, vec!["Bo", "Amy"]);
        let hits = service.search_by_name("amy").await;
        assert_eq!(hits, vec![employee("1", "Amy", 90_000)]);
    }

    #[tokio::test]
    async fn reads_reflect_writes_without_caching() {
        let service = service();
        let created = service
            .create(&CreateEmployeeRequest {
                name: "Cy".into(),
                salary: 200_000,
                age: 52,
                title: "CTO".into(),
            })
            .await
            .unwrap();

        assert_eq!(service.highest_salary().await, 200_000);
        assert_eq!(service.get_by_id(&created.id).await, Some(created.clone()));

        assert!(service.delete_by_id("2").await.is_success());
        assert_eq!(service.top_ten_earners().await, vec!["Cy", "Amy"]);
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_aggregates() {
        let service = EmployeeService::new(InMemoryGateway::default());

        assert!(service.list_all().await.is_empty());
        assert_eq!(service.highest_salary().await, 0);
        assert!(service.top_ten_earners().await.is_empty());
        assert!(service.search_by_name("amy").await.is_empty());
    }
}
