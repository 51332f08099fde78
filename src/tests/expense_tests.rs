use crate::constants::constants::{EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED};
use crate::core::errors::SpendlyError;
use crate::core::filters::ExpenseFilter;
use crate::core::models::{Category, ExpenseChanges};
use crate::core::models::AppLog;
use crate::core::services::SpendlyService;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::rate_limit::in_memory::InMemoryRateLimiter;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::tests::{
    create_test_service, date, dec, new_expense, register_user, registration, test_auth_settings,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};

struct UnavailableAuditTrail;

#[async_trait]
impl LoggingService for UnavailableAuditTrail {
    async fn log_action(
        &self,
        _action: &str,
        _details: serde_json::Value,
        _user_id: Option<&str>,
    ) -> Result<(), SpendlyError> {
        Err(SpendlyError::LoggingError("audit store unavailable".to_string()))
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, SpendlyError> {
        Ok(Vec::new())
    }

    async fn get_user_logs(&self, _user_id: &str) -> Result<Vec<AppLog>, SpendlyError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_create_and_get_expense() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;

    let mut input = new_expense("  Weekly shop  ", "45.5", Category::Groceries, date("2024-06-01"));
    input.description = Some("Market run".to_string());
    let created = service.create_expense(&user, input).await.unwrap();

    assert_eq!(created.owner_id, user.id);
    assert_eq!(created.title, "Weekly shop");
    assert_eq!(created.amount.to_string(), "45.50");
    assert_eq!(created.description.as_deref(), Some("Market run"));
    assert_eq!(created.created_at, created.updated_at);

    let fetched = service.get_expense(&user, &created.id).await.unwrap();
    assert_eq!(fetched, created);

    let logs = service.get_app_logs().await.unwrap();
    let entry = logs.iter().find(|l| l.action == EXPENSE_CREATED).unwrap();
    assert_eq!(entry.details["expense_id"], created.id.as_str());
    assert_eq!(entry.details["amount"], "45.50");
}

#[tokio::test]
async fn test_create_expense_validation() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let on = date("2024-06-01");

    let cases = [
        (new_expense("", "10", Category::Others, on), "title"),
        (new_expense(&"x".repeat(201), "10", Category::Others, on), "title"),
        (new_expense("Refund", "-5", Category::Others, on), "amount"),
        (new_expense("Free", "0", Category::Others, on), "amount"),
        (new_expense("Fractional", "1.005", Category::Others, on), "amount"),
        (new_expense("Huge", "100000000.00", Category::Others, on), "amount"),
        (new_expense("Car", "1500000", Category::Others, on), "description"),
        (
            new_expense("Tomorrow", "10", Category::Others, Utc::now().date_naive() + Duration::days(1)),
            "date",
        ),
    ];
    for (input, expected_field) in cases {
        let result = service.create_expense(&user, input).await;
        assert!(
            matches!(&result, Err(SpendlyError::InvalidInput(field, _)) if field == expected_field),
            "expected {} error, got {:?}",
            expected_field,
            result
        );
    }

    let stored = service.list_expenses(&user, &ExpenseFilter::default()).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn test_large_amount_with_description_is_accepted() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;

    let mut input = new_expense("Car", "1500000", Category::Others, date("2024-06-01"));
    input.description = Some("Family car".to_string());
    let created = service.create_expense(&user, input).await.unwrap();
    assert_eq!(created.amount, dec("1500000.00"));

    let today = service
        .create_expense(&user, new_expense("Lunch", "12", Category::Leisure, Utc::now().date_naive()))
        .await;
    assert!(today.is_ok());
}

#[tokio::test]
async fn test_partial_update_changes_only_given_fields() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let mut input = new_expense("Cinema", "15", Category::Leisure, date("2024-06-01"));
    input.description = Some("Two tickets".to_string());
    let created = service.create_expense(&user, input).await.unwrap();

    let changes = ExpenseChanges {
        title: Some("Cinema and popcorn".to_string()),
        ..Default::default()
    };
    let updated = service.update_expense(&user, &created.id, changes).await.unwrap();

    assert_eq!(updated.title, "Cinema and popcorn");
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.amount, created.amount);
    assert_eq!(updated.category, created.category);
    assert_eq!(updated.date, created.date);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let logs = service.get_app_logs().await.unwrap();
    let entry = logs.iter().find(|l| l.action == EXPENSE_UPDATED).unwrap();
    assert_eq!(entry.details["fields"], serde_json::json!(["title"]));
}

#[tokio::test]
async fn test_partial_update_can_clear_description() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let mut input = new_expense("Cinema", "15", Category::Leisure, date("2024-06-01"));
    input.description = Some("Two tickets".to_string());
    let created = service.create_expense(&user, input).await.unwrap();

    let changes = ExpenseChanges {
        description: Some(None),
        ..Default::default()
    };
    let updated = service.update_expense(&user, &created.id, changes).await.unwrap();
    assert_eq!(updated.description, None);
    assert_eq!(updated.title, "Cinema");
}

#[tokio::test]
async fn test_full_update_replaces_fields() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let created = service
        .create_expense(&user, new_expense("Cinema", "15", Category::Leisure, date("2024-06-01")))
        .await
        .unwrap();

    let replacement = new_expense("Headphones", "199.99", Category::Electronics, date("2024-06-03"));
    let updated = service
        .update_expense(&user, &created.id, ExpenseChanges::from(replacement))
        .await
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "Headphones");
    assert_eq!(updated.amount, dec("199.99"));
    assert_eq!(updated.category, Category::Electronics);
    assert_eq!(updated.date, date("2024-06-03"));
}

#[tokio::test]
async fn test_invalid_update_leaves_record_untouched() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let created = service
        .create_expense(&user, new_expense("Cinema", "15", Category::Leisure, date("2024-06-01")))
        .await
        .unwrap();

    let changes = ExpenseChanges {
        title: Some("Cinema night".to_string()),
        amount: Some(dec("2000000")),
        ..Default::default()
    };
    let result = service.update_expense(&user, &created.id, changes).await;
    assert!(matches!(result, Err(SpendlyError::InvalidInput(field, _)) if field == "description"));

    let stored = service.get_expense(&user, &created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn test_expenses_are_owner_scoped() {
    let service = create_test_service();
    let (ana, _) = register_user(&service, "ana@example.com").await;
    let (ben, _) = register_user(&service, "ben@example.com").await;
    let created = service
        .create_expense(&ana, new_expense("Gym", "30", Category::Health, date("2024-06-01")))
        .await
        .unwrap();

    let result = service.get_expense(&ben, &created.id).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));

    let changes = ExpenseChanges {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let result = service.update_expense(&ben, &created.id, changes).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));

    let result = service.delete_expense(&ben, &created.id).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));

    let bens = service.list_expenses(&ben, &ExpenseFilter::default()).await.unwrap();
    assert!(bens.is_empty());

    let stored = service.get_expense(&ana, &created.id).await.unwrap();
    assert_eq!(stored, created);
}

#[tokio::test]
async fn test_delete_expense() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let created = service
        .create_expense(&user, new_expense("Gym", "30", Category::Health, date("2024-06-01")))
        .await
        .unwrap();

    service.delete_expense(&user, &created.id).await.unwrap();

    let result = service.get_expense(&user, &created.id).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));
    let result = service.delete_expense(&user, &created.id).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.iter().filter(|l| l.action == EXPENSE_DELETED).count(), 1);
}

#[tokio::test]
async fn test_list_uses_default_ordering() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    for (title, on) in [("Old", "2024-01-10"), ("New", "2024-06-01"), ("Middle", "2024-03-15")] {
        service
            .create_expense(&user, new_expense(title, "10", Category::Others, date(on)))
            .await
            .unwrap();
    }

    let listed = service.list_expenses(&user, &ExpenseFilter::default()).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["New", "Middle", "Old"]);
}

#[tokio::test]
async fn test_user_activity_is_per_user() {
    let service = create_test_service();
    let (ana, _) = register_user(&service, "ana@example.com").await;
    let (ben, _) = register_user(&service, "ben@example.com").await;
    let created = service
        .create_expense(&ana, new_expense("Gym", "30", Category::Health, date("2024-06-01")))
        .await
        .unwrap();
    service.delete_expense(&ana, &created.id).await.unwrap();

    let actions: Vec<String> = service
        .user_activity(&ana)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.action)
        .collect();
    assert_eq!(actions, vec!["USER_REGISTERED", EXPENSE_CREATED, EXPENSE_DELETED]);

    let bens = service.user_activity(&ben).await.unwrap();
    assert_eq!(bens.len(), 1);
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_committed_writes() {
    let service = SpendlyService::new(
        InMemoryStorage::new(),
        UnavailableAuditTrail,
        InMemoryRateLimiter::unlimited(),
        test_auth_settings(),
    );
    let (user, _) = service.register(registration("ana@example.com")).await.unwrap();

    let created = service
        .create_expense(&user, new_expense("Gym", "30", Category::Health, date("2024-06-01")))
        .await
        .unwrap();
    assert_eq!(service.get_expense(&user, &created.id).await.unwrap(), created);

    let changes = ExpenseChanges {
        amount: Some(dec("35")),
        ..Default::default()
    };
    let updated = service.update_expense(&user, &created.id, changes).await.unwrap();
    assert_eq!(service.get_expense(&user, &created.id).await.unwrap(), updated);

    service.delete_expense(&user, &created.id).await.unwrap();
    let result = service.get_expense(&user, &created.id).await;
    assert!(matches!(result, Err(SpendlyError::ExpenseNotFound(_))));
}
