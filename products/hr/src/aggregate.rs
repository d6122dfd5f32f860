//! Pure aggregates over a freshly fetched employee collection.

use entity::Employee;

pub const TOP_EARNERS_LIMIT: usize = 10;

/// Employees whose whole name equals `query`, ignoring case. Nameless
/// records never match.
pub fn search_by_name(employees: &[Employee], query: &str) -> Vec<Employee> {
    employees
        .iter()
        .filter(|employee| !employee.name.trim().is_empty())
        .filter(|employee| equals_ignoring_case(&employee.name, query))
        .cloned()
        .collect()
}

/// Compares character by character using single-character case mappings, so
/// `"İ"` matches `"i"` even though their full lowercase forms differ.
fn equals_ignoring_case(left: &str, right: &str) -> bool {
    left.chars().count() == right.chars().count()
        && left.chars().zip(right.chars()).all(|(a, b)| {
            if a == b {
                return true;
            }
            let (upper_a, upper_b) = (simple_upper(a), simple_upper(b));
            upper_a == upper_b || simple_lower(upper_a) == simple_lower(upper_b)
        })
}

fn simple_upper(c: char) -> char {
    let mut mapped = c.to_uppercase();
    match (mapped.next(), mapped.next()) {
        (Some(upper), None) => upper,
        _ => c,
    }
}

fn simple_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Highest salary, or 0 when there are no employees.
pub fn highest_salary(employees: &[Employee]) -> u32 {
    employees
        .iter()
        .map(|employee| employee.salary)
        .max()
        .unwrap_or(0)
}

/// Names of the ten best paid employees, highest first. Equal salaries keep
/// their fetch order.
pub fn top_ten_earners(employees: &[Employee]) -> Vec<String> {
    let mut ranked = employees.iter().collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.salary.cmp(&a.salary));
    ranked
        .into_iter()
        .take(TOP_EARNERS_LIMIT)
        .map(|employee| employee.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::employee;

    #[test]
    fn search_is_case_insensitive_and_exact() {
        let employees = vec![
            employee("1", "Amy", 90_000),
            employee("2", "AMY", 80_000),
            employee("3", "Amy Lee", 70_000),
            employee("4", "Bo", 150_000),
        ];

        let hits = search_by_name(&employees, "amy");

        let ids = hits.iter().map(|e| e.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(search_by_name(&employees, "my").is_empty());
        assert!(search_by_name(&[], "amy").is_empty());
    }

    #[test]
    fn search_never_matches_nameless_records() {
        let employees = vec![employee("1", "", 10), employee("2", "   ", 20)];

        assert!(search_by_name(&employees, "").is_empty());
        assert!(search_by_name(&employees, "   ").is_empty());
    }

    #[test]
    fn search_folds_case_per_character() {
        let employees = vec![
            employee("1", "İ", 10),
            employee("2", "ÉLODIE", 20),
            employee("3", "Straße", 30),
        ];

        let ids = |query| {
            search_by_name(&employees, query)
                .into_iter()
                .map(|e| e.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("i"), vec!["1"]);
        assert_eq!(ids("élodie"), vec!["2"]);
        assert_eq!(ids("STRASSE"), Vec::<String>::new());
        assert_eq!(ids("STRAßE"), vec!["3"]);
    }

    #[test]
    fn highest_salary_defaults_to_zero() {
        assert_eq!(highest_salary(&[]), 0);
        let employees = vec![employee("1", "Amy", 90_000), employee("2", "Bo", 150_000)];
        assert_eq!(highest_salary(&employees), 150_000);
    }

    #[test]
    fn top_ten_is_bounded_and_sorted_descending() {
        let employees = (0..15)
            .map(|n| employee(&n.to_string(), &format!("E{n}"), 1_000 * (n % 7)))
            .collect::<Vec<_>>();

        let names = top_ten_earners(&employees);

        assert_eq!(names.len(), 10);
        let salaries = names
            .iter()
            .map(|name| {
                employees
                    .iter()
                    .find(|e| &e.name == name)
                    .map(|e| e.salary)
                    .unwrap()
            })
            .collect::<Vec<_>>();
        assert!(salaries.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn top_ten_keeps_fetch_order_for_ties() {
        let employees = vec![
            employee("1", "First", 50_000),
            employee("2", "Rich", 99_000),
            employee("3", "Second", 50_000),
            employee("4", "Third", 50_000),
        ];

        assert_eq!(
            top_ten_earners(&employees),
            vec!["Rich", "First", "Second", "Third"]
        );
    }

    #[test]
    fn top_ten_returns_everyone_when_fewer_than_ten() {
        let employees = vec![employee("1", "Amy", 90_000), employee("2", "Bo", 150_000)];
        assert_eq!(top_ten_earners(&employees), vec!["Bo", "Amy"]);
        assert!(top_ten_earners(&[]).is_empty());
    }
}
