use crate::core::errors::SpendlyError;
use crate::core::filters::{ExpenseFilter, ExpenseQuery, OrderField, OrderTerm, Pagination, Period};
use crate::core::models::{Category, Expense};
use crate::tests::{create_test_service, date, dec, new_expense, register_user};
use chrono::{Duration, Utc};

fn query() -> ExpenseQuery {
    ExpenseQuery::default()
}

fn param_error(result: Result<ExpenseFilter, SpendlyError>) -> String {
    match result {
        Err(SpendlyError::InvalidParameter(param, _)) => param,
        other => panic!("expected an invalid parameter, got {:?}", other),
    }
}

fn expense(title: &str, description: Option<&str>, amount: &str, category: Category, on: &str) -> Expense {
    let now = Utc::now();
    Expense {
        id: title.to_string(),
        owner_id: "owner".to_string(),
        title: title.to_string(),
        description: description.map(str::to_string),
        amount: dec(amount),
        category,
        date: date(on),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_empty_query_matches_everything() {
    let filter = ExpenseFilter::from_query(&query(), date("2024-06-15")).unwrap();
    assert_eq!(filter, ExpenseFilter::default());
    assert!(filter.matches(&expense("Any", None, "1", Category::Others, "2001-01-01")));

    let blank = ExpenseQuery {
        category: Some("".to_string()),
        search: Some("   ".to_string()),
        min_amount: Some("".to_string()),
        ..query()
    };
    assert_eq!(ExpenseFilter::from_query(&blank, date("2024-06-15")).unwrap(), ExpenseFilter::default());
}

#[test]
fn test_category_filter() {
    let q = ExpenseQuery {
        category: Some("LEISURE".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, date("2024-06-15")).unwrap();
    assert!(filter.matches(&expense("Netflix", None, "15", Category::Leisure, "2024-06-01")));
    assert!(!filter.matches(&expense("Bread", None, "3", Category::Groceries, "2024-06-01")));

    let q = ExpenseQuery {
        category: Some("leisure".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, date("2024-06-15"))), "category");
}

#[test]
fn test_period_filter() {
    let today = date("2024-06-15");
    let q = ExpenseQuery {
        period: Some("week".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    let bound = filter.period.unwrap();
    assert_eq!(bound.period, Period::Week);
    assert_eq!(bound.since, date("2024-06-08"));
    assert!(filter.matches(&expense("In", None, "1", Category::Others, "2024-06-08")));
    assert!(!filter.matches(&expense("Out", None, "1", Category::Others, "2024-06-07")));

    let q = ExpenseQuery {
        period: Some("3months".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    assert_eq!(filter.period.unwrap().since, today - Duration::days(90));

    let q = ExpenseQuery {
        period: Some("year".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "period");
}

#[test]
fn test_period_and_date_range_combine() {
    let q = ExpenseQuery {
        period: Some("month".to_string()),
        start_date: Some("2024-01-01".to_string()),
        end_date: Some("2024-06-10".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, date("2024-06-15")).unwrap();

    assert!(!filter.matches(&expense("Before period", None, "1", Category::Others, "2024-05-01")));
    assert!(filter.matches(&expense("Inside", None, "1", Category::Others, "2024-06-01")));
    assert!(!filter.matches(&expense("After end", None, "1", Category::Others, "2024-06-12")));
}

#[test]
fn test_date_range_validation() {
    let today = date("2024-06-15");
    let q = ExpenseQuery {
        start_date: Some("2024-06-10".to_string()),
        end_date: Some("2024-06-01".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "start_date");

    let q = ExpenseQuery {
        end_date: Some("10/06/2024".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "end_date");

    let q = ExpenseQuery {
        start_date: Some("2024-02-30".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "start_date");

    let q = ExpenseQuery {
        end_date: Some("2023-13-01".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "end_date");

    let q = ExpenseQuery {
        start_date: Some("2024-02-29".to_string()),
        ..query()
    };
    assert!(ExpenseFilter::from_query(&q, today).is_ok());

    let q = ExpenseQuery {
        start_date: Some("2024-06-01".to_string()),
        end_date: Some("2024-06-01".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    assert!(filter.matches(&expense("Same day", None, "1", Category::Others, "2024-06-01")));
}

#[test]
fn test_amount_range() {
    let today = date("2024-06-15");
    let q = ExpenseQuery {
        min_amount: Some("10".to_string()),
        max_amount: Some("20.50".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    assert!(filter.matches(&expense("Low edge", None, "10.00", Category::Others, "2024-06-01")));
    assert!(filter.matches(&expense("High edge", None, "20.50", Category::Others, "2024-06-01")));
    assert!(!filter.matches(&expense("Too much", None, "20.51", Category::Others, "2024-06-01")));
    assert!(!filter.matches(&expense("Too little", None, "9.99", Category::Others, "2024-06-01")));

    let q = ExpenseQuery {
        min_amount: Some("50".to_string()),
        max_amount: Some("20".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "min_amount");

    let q = ExpenseQuery {
        max_amount: Some("-1".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "max_amount");

    let q = ExpenseQuery {
        min_amount: Some("ten".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, today)), "min_amount");
}

#[test]
fn test_search_is_case_insensitive_over_title_and_description() {
    let q = ExpenseQuery {
        search: Some("NETFLIX".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, date("2024-06-15")).unwrap();

    assert!(filter.matches(&expense("Netflix", None, "15", Category::Leisure, "2024-06-01")));
    assert!(filter.matches(&expense("Streaming", Some("netflix monthly"), "15", Category::Leisure, "2024-06-01")));
    assert!(!filter.matches(&expense("Spotify", Some("music"), "10", Category::Leisure, "2024-06-01")));
}

#[test]
fn test_ordering() {
    let q = ExpenseQuery {
        ordering: Some("-amount, date".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, date("2024-06-15")).unwrap();
    assert_eq!(
        filter.ordering,
        vec![
            OrderTerm {
                field: OrderField::Amount,
                descending: true
            },
            OrderTerm {
                field: OrderField::Date,
                descending: false
            },
        ]
    );

    let mut expenses = vec![
        expense("b", None, "10", Category::Others, "2024-06-02"),
        expense("a", None, "50", Category::Others, "2024-06-03"),
        expense("c", None, "10", Category::Others, "2024-06-01"),
    ];
    filter.sort(&mut expenses);
    let titles: Vec<&str> = expenses.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "c", "b"]);

    let q = ExpenseQuery {
        ordering: Some("title".to_string()),
        ..query()
    };
    assert_eq!(param_error(ExpenseFilter::from_query(&q, date("2024-06-15"))), "ordering");
}

#[test]
fn test_pagination() {
    let q = ExpenseQuery {
        page: Some("2".to_string()),
        page_size: Some("2".to_string()),
        ..query()
    };
    let pagination = Pagination::from_query(&q, 20).unwrap();
    let page = pagination.paginate((1..=5).collect::<Vec<_>>()).unwrap();
    assert_eq!(page.count, 5);
    assert_eq!(page.results, vec![3, 4]);
    assert_eq!(page.next, Some(3));
    assert_eq!(page.previous, Some(1));

    let last = Pagination { page: 3, page_size: 2 }.paginate((1..=5).collect::<Vec<_>>()).unwrap();
    assert_eq!(last.results, vec![5]);
    assert_eq!(last.next, None);

    let beyond = Pagination { page: 4, page_size: 2 }.paginate((1..=5).collect::<Vec<_>>());
    assert!(matches!(beyond, Err(SpendlyError::InvalidParameter(param, _)) if param == "page"));

    let empty = Pagination { page: 1, page_size: 20 }.paginate(Vec::<u8>::new()).unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.next, None);
    assert_eq!(empty.previous, None);

    let defaults = Pagination::from_query(&query(), 20).unwrap();
    assert_eq!(defaults, Pagination { page: 1, page_size: 20 });

    for (page, page_size) in [("0", "10"), ("abc", "10"), ("1", "101")] {
        let q = ExpenseQuery {
            page: Some(page.to_string()),
            page_size: Some(page_size.to_string()),
            ..query()
        };
        assert!(matches!(Pagination::from_query(&q, 20), Err(SpendlyError::InvalidParameter(_, _))));
    }
}

#[tokio::test]
async fn test_storage_applies_filter() {
    let service = create_test_service();
    let (user, _) = register_user(&service, "ana@example.com").await;
    let today = Utc::now().date_naive();

    let mut netflix = new_expense("Netflix", "15000", Category::Leisure, today - Duration::days(2));
    netflix.description = Some("Streaming".to_string());
    service.create_expense(&user, netflix).await.unwrap();
    service
        .create_expense(&user, new_expense("Groceries", "20000", Category::Groceries, today - Duration::days(40)))
        .await
        .unwrap();

    let q = ExpenseQuery {
        category: Some("LEISURE".to_string()),
        search: Some("netflix".to_string()),
        min_amount: Some("10000".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    let found = service.list_expenses(&user, &filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Netflix");

    let q = ExpenseQuery {
        period: Some("month".to_string()),
        ..query()
    };
    let filter = ExpenseFilter::from_query(&q, today).unwrap();
    let found = service.list_expenses(&user, &filter).await.unwrap();
    assert_eq!(found.len(), 1);
}
