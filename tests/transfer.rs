use std::fs;

use chrono::NaiveDate;
use finance_tracker::csv_io::{self, UNCATEGORIZED};
use finance_tracker::{NewTransaction, Store, StoreConfig, TransactionKind, TransferError};
use tempfile::{TempDir, tempdir};

fn open_store() -> (TempDir, Store) {
    let dir = tempdir().unwrap();
    let store = Store::open(&StoreConfig::new(dir.path().join("finance.db"))).unwrap();
    (dir, store)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

type Tuple = (NaiveDate, String, TransactionKind, String, String);

fn tuples(store: &Store) -> Vec<Tuple> {
    let mut out: Vec<Tuple> = store
        .get_transactions(None)
        .unwrap()
        .into_iter()
        .map(|r| {
            (
                r.date,
                format!("{:.2}", r.amount),
                r.kind,
                r.category_name.unwrap_or_default(),
                r.note.unwrap_or_default(),
            )
        })
        .collect();
    out.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    out
}

#[test]
fn export_clear_import_reproduces_transactions() {
    let (dir, store) = open_store();
    let food = store.add_category("Еда", Some("icons/food.png")).unwrap().id().unwrap();
    let salary = store.add_category("Зарплата", None).unwrap().id().unwrap();
    let seed = [
        ("2024-01-05", 250.75, TransactionKind::Expense, Some(food), Some("рынок")),
        ("2024-01-05", 250.75, TransactionKind::Expense, Some(food), Some("рынок")),
        ("2024-01-10", 5000.0, TransactionKind::Income, Some(salary), None),
        ("2024-01-12", 99.9, TransactionKind::Expense, None, Some("такси \"ночью\"")),
    ];
    for (d, amount, kind, category_id, note) in seed {
        store
            .add_transaction(&NewTransaction {
                date: date(d),
                amount,
                kind,
                category_id,
                note: note.map(str::to_string),
            })
            .unwrap();
    }
    let balance = store.get_balance().unwrap();

    let path = dir.path().join("backup.csv");
    assert_eq!(csv_io::export_all(&store, &path).unwrap(), 4);
    store.clear_transactions().unwrap();
    let summary = csv_io::import_all(&store, &path).unwrap();
    assert_eq!(summary.rows, 4);
    assert_eq!(summary.categories_created, 1);

    let mut expected: Vec<Tuple> = vec![
        (date("2024-01-05"), "250.75".into(), TransactionKind::Expense, "Еда".into(), "рынок".into()),
        (date("2024-01-05"), "250.75".into(), TransactionKind::Expense, "Еда".into(), "рынок".into()),
        (date("2024-01-10"), "5000.00".into(), TransactionKind::Income, "Зарплата".into(), String::new()),
        (
            date("2024-01-12"),
            "99.90".into(),
            TransactionKind::Expense,
            UNCATEGORIZED.into(),
            "такси \"ночью\"".into(),
        ),
    ];
    expected.sort_by(|a, b| format!("{a:?}").cmp(&format!("{b:?}")));
    assert_eq!(tuples(&store), expected);
    assert!((store.get_balance().unwrap() - balance).abs() < 1e-9);
}

#[test]
fn reimport_is_idempotent() {
    let (dir, store) = open_store();
    let path = dir.path().join("in.csv");
    fs::write(
        &path,
        "date,amount,type,category_name,note\n\
         2024-02-01,10,Трата,Еда,\n\
         2024-02-02,15,Доход,,\n",
    )
    .unwrap();

    csv_io::import_all(&store, &path).unwrap();
    let first = tuples(&store);
    let again = csv_io::import_all(&store, &path).unwrap();
    assert_eq!(again.categories_created, 0);
    assert_eq!(tuples(&store), first);
    assert_eq!(store.get_categories().unwrap().len(), 2);
}

#[test]
fn malformed_amount_keeps_rows_before_it() {
    let (dir, store) = open_store();
    store
        .add_transaction(&NewTransaction {
            date: date("2023-12-31"),
            amount: 1.0,
            kind: TransactionKind::Income,
            category_id: None,
            note: None,
        })
        .unwrap();

    let path = dir.path().join("in.csv");
    fs::write(
        &path,
        "date,amount,type,category_name,note\n\
         2024-03-01,10,Трата,Еда,\n\
         2024-03-02,20,Трата,Еда,\n\
         2024-03-03,двадцать,Трата,Еда,\n\
         2024-03-04,40,Трата,Еда,\n",
    )
    .unwrap();

    let err = csv_io::import_all(&store, &path).unwrap_err();
    match &err {
        TransferError::MalformedAmount { row, value } => {
            assert_eq!(*row, 3);
            assert_eq!(value, "двадцать");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_malformed_input());

    let dates: Vec<_> = store
        .get_transactions(None)
        .unwrap()
        .into_iter()
        .map(|r| r.date.to_string())
        .collect();
    assert_eq!(dates, ["2024-03-02", "2024-03-01"]);
}
