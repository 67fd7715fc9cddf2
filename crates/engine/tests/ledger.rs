use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use engine::{
    AssignIncomeCmd, AssignToExpenseCmd, AssignToGoalCmd, CategoryKind, Engine, EngineError,
    EntryKind, LedgerListFilter, NewBucket, NewGoal, NewUser, NewWallet, UpdateGoal,
    WalletTransferCmd, transactions,
};
use migration::MigratorTrait;

async fn engine_with_user() -> (Engine, DatabaseConnection, Uuid) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let registered = engine
        .register_user(NewUser {
            email: "alice@example.com".to_string(),
            password: "correct-horse".to_string(),
            full_name: Some("Alice".to_string()),
        })
        .await
        .unwrap();
    let user_id = Uuid::parse_str(&registered.user.id).unwrap();
    (engine, db, user_id)
}

async fn wallet_with_balance(engine: &Engine, user_id: Uuid, name: &str, balance: i64) -> Uuid {
    engine
        .new_wallet(
            user_id,
            NewWallet {
                name: name.to_string(),
                balance_minor: balance,
                currency: None,
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap()
        .id
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

#[tokio::test]
async fn wallet_transfer_moves_funds() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;

    let transfer = engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: bank,
            amount_minor: 300,
            occurred_on: day(5),
            note: Some("monthly top-up".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(transfer.from_wallet.balance_minor, 700);
    assert_eq!(transfer.to_wallet.balance_minor, 300);
    assert_eq!(transfer.transaction.kind, EntryKind::WalletTransfer);

    let cash_after = engine.wallet(user_id, cash).await.unwrap();
    let bank_after = engine.wallet(user_id, bank).await.unwrap();
    assert_eq!(cash_after.balance_minor, 700);
    assert_eq!(bank_after.balance_minor, 300);
}

#[tokio::test]
async fn transfer_over_balance_leaves_both_wallets_unchanged() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 100).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;

    let err = engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: bank,
            amount_minor: 101,
            occurred_on: day(5),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    assert_eq!(engine.wallet(user_id, cash).await.unwrap().balance_minor, 100);
    assert_eq!(engine.wallet(user_id, bank).await.unwrap().balance_minor, 0);
}

#[tokio::test]
async fn transfer_to_same_wallet_is_rejected() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 100).await;

    let err = engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: cash,
            amount_minor: 50,
            occurred_on: day(5),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn goal_assignment_fills_up_to_target() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let goal = engine
        .new_goal(
            user_id,
            NewGoal {
                name: "Vacation".to_string(),
                target_minor: 500,
                currency: None,
                icon: None,
                color: None,
                plan_period: None,
                plan_amount_minor: None,
            },
        )
        .await
        .unwrap();

    engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 200,
            occurred_on: day(3),
            note: None,
        })
        .await
        .unwrap();

    // 300 is exactly what remains, so this completes the goal.
    let assignment = engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 300,
            occurred_on: day(4),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(assignment.goal.current_minor, 500);
    assert_eq!(assignment.goal.remaining_minor(), 0);
    assert_eq!(assignment.wallet.balance_minor, 500);

    let err = engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 1,
            occurred_on: day(5),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::GoalAlreadyComplete(_)));
    assert_eq!(engine.wallet(user_id, cash).await.unwrap().balance_minor, 500);
}

#[tokio::test]
async fn goal_overshoot_fails_without_side_effects() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let goal = engine
        .new_goal(
            user_id,
            NewGoal {
                name: "Vacation".to_string(),
                target_minor: 500,
                currency: None,
                icon: None,
                color: None,
                plan_period: None,
                plan_amount_minor: None,
            },
        )
        .await
        .unwrap();

    engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 200,
            occurred_on: day(3),
            note: None,
        })
        .await
        .unwrap();

    let err = engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 301,
            occurred_on: day(4),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(engine.goal(user_id, goal.id).await.unwrap().current_minor, 200);
    assert_eq!(engine.wallet(user_id, cash).await.unwrap().balance_minor, 800);

    let (entries, _) = engine
        .list_ledger_page(user_id, 10, None, &LedgerListFilter::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn goal_saving_plan_survives_create_and_update() {
    let (engine, _db, user_id) = engine_with_user().await;
    let goal = engine
        .new_goal(
            user_id,
            NewGoal {
                name: "Vacation".to_string(),
                target_minor: 12_000,
                currency: None,
                icon: None,
                color: None,
                plan_period: Some("monthly".to_string()),
                plan_amount_minor: Some(1_000),
            },
        )
        .await
        .unwrap();
    assert_eq!(goal.plan_period.as_deref(), Some("monthly"));
    assert_eq!(goal.plan_amount_minor, Some(1_000));

    let stored = engine.goal(user_id, goal.id).await.unwrap();
    assert_eq!(stored.plan_period.as_deref(), Some("monthly"));
    assert_eq!(stored.plan_amount_minor, Some(1_000));

    let updated = engine
        .update_goal(
            user_id,
            goal.id,
            UpdateGoal {
                plan_period: Some("weekly".to_string()),
                plan_amount_minor: Some(250),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.plan_period.as_deref(), Some("weekly"));
    assert_eq!(updated.plan_amount_minor, Some(250));

    // A plan never brings a negative contribution.
    let err = engine
        .update_goal(
            user_id,
            goal.id,
            UpdateGoal {
                plan_amount_minor: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn income_assignment_credits_wallet_and_bucket() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 0).await;
    let salary = engine
        .new_income(
            user_id,
            NewBucket {
                name: "Salary".to_string(),
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let category = engine
        .new_category(user_id, "Work", CategoryKind::Income)
        .await
        .unwrap();

    let assignment = engine
        .assign_income(AssignIncomeCmd {
            user_id,
            income_id: salary.id,
            wallet_id: cash,
            amount_minor: 150_000,
            occurred_on: day(1),
            category_id: Some(category.id),
            note: Some("January".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(assignment.wallet.balance_minor, 150_000);
    assert_eq!(assignment.income.amount_minor, 150_000);
    assert_eq!(assignment.income.wallet_id, Some(cash));
    assert_eq!(assignment.transaction.kind, EntryKind::Income);
    assert_eq!(assignment.transaction.from_category_id, Some(category.id));
    assert_eq!(assignment.transaction.to_wallet_id, Some(cash));
}

#[tokio::test]
async fn expense_assignment_requires_funds_and_matching_category_kind() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 500).await;
    let groceries = engine
        .new_expense(
            user_id,
            NewBucket {
                name: "Groceries".to_string(),
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let income_category = engine
        .new_category(user_id, "Work", CategoryKind::Income)
        .await
        .unwrap();
    let expense_category = engine
        .new_category(user_id, "Food", CategoryKind::Expense)
        .await
        .unwrap();

    let err = engine
        .assign_to_expense(AssignToExpenseCmd {
            user_id,
            wallet_id: cash,
            expense_id: groceries.id,
            amount_minor: 600,
            occurred_on: day(2),
            category_id: Some(expense_category.id),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let err = engine
        .assign_to_expense(AssignToExpenseCmd {
            user_id,
            wallet_id: cash,
            expense_id: groceries.id,
            amount_minor: 200,
            occurred_on: day(2),
            category_id: Some(income_category.id),
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
    assert_eq!(engine.wallet(user_id, cash).await.unwrap().balance_minor, 500);

    let assignment = engine
        .assign_to_expense(AssignToExpenseCmd {
            user_id,
            wallet_id: cash,
            expense_id: groceries.id,
            amount_minor: 200,
            occurred_on: day(2),
            category_id: Some(expense_category.id),
            note: None,
        })
        .await
        .unwrap();
    assert_eq!(assignment.wallet.balance_minor, 300);
    assert_eq!(assignment.expense.amount_minor, 200);
    assert_eq!(
        assignment.transaction.to_category_id,
        Some(expense_category.id)
    );
}

#[tokio::test]
async fn ledger_pages_are_disjoint_and_newest_first() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 10_000).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;

    for i in 0..5i64 {
        engine
            .transfer_between_wallets(WalletTransferCmd {
                user_id,
                from_wallet_id: cash,
                to_wallet_id: bank,
                amount_minor: 100 + i,
                occurred_on: day(1 + i as u32),
                note: None,
            })
            .await
            .unwrap();
    }

    let filter = LedgerListFilter::default();
    let mut seen = Vec::new();
    let (page, cursor) = engine.list_ledger_page(user_id, 2, None, &filter).await.unwrap();
    assert_eq!(page.len(), 2);
    seen.extend(page);
    let cursor = cursor.expect("more pages expected");

    let (page, cursor) = engine
        .list_ledger_page(user_id, 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    seen.extend(page);
    let cursor = cursor.expect("more pages expected");

    let (page, cursor) = engine
        .list_ledger_page(user_id, 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    seen.extend(page);
    assert!(cursor.is_none());

    let mut ids: Vec<Uuid> = seen.iter().map(|e| e.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 5);

    for pair in seen.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn ledger_filters_by_kind_and_date_range() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 10_000).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;
    let goal = engine
        .new_goal(
            user_id,
            NewGoal {
                name: "Vacation".to_string(),
                target_minor: 5_000,
                currency: None,
                icon: None,
                color: None,
                plan_period: None,
                plan_amount_minor: None,
            },
        )
        .await
        .unwrap();

    engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: bank,
            amount_minor: 100,
            occurred_on: day(2),
            note: None,
        })
        .await
        .unwrap();
    engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 500,
            occurred_on: day(10),
            note: None,
        })
        .await
        .unwrap();

    let (entries, _) = engine
        .list_ledger_page(
            user_id,
            10,
            None,
            &LedgerListFilter {
                kinds: Some(vec![EntryKind::GoalTransfer]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::GoalTransfer);

    let (entries, _) = engine
        .list_ledger_page(
            user_id,
            10,
            None,
            &LedgerListFilter {
                from: Some(day(1)),
                to: Some(day(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::WalletTransfer);

    let err = engine
        .list_ledger_page(
            user_id,
            10,
            None,
            &LedgerListFilter {
                from: Some(day(5)),
                to: Some(day(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn deleting_a_wallet_detaches_but_keeps_history() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;

    let transfer = engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: bank,
            amount_minor: 300,
            occurred_on: day(5),
            note: None,
        })
        .await
        .unwrap();

    engine.delete_wallet(user_id, bank).await.unwrap();

    let err = engine.wallet(user_id, bank).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let entry = engine
        .transaction(user_id, transfer.transaction.id)
        .await
        .unwrap();
    assert_eq!(entry.from_wallet_id, Some(cash));
    assert_eq!(entry.to_wallet_id, None);
    assert_eq!(entry.amount_minor, 300);
}

#[tokio::test]
async fn deleting_a_goal_removes_its_ledger_entries() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let goal = engine
        .new_goal(
            user_id,
            NewGoal {
                name: "Vacation".to_string(),
                target_minor: 500,
                currency: None,
                icon: None,
                color: None,
                plan_period: None,
                plan_amount_minor: None,
            },
        )
        .await
        .unwrap();

    engine
        .assign_to_goal(AssignToGoalCmd {
            user_id,
            wallet_id: cash,
            goal_id: goal.id,
            amount_minor: 200,
            occurred_on: day(3),
            note: None,
        })
        .await
        .unwrap();

    engine.delete_goal(user_id, goal.id).await.unwrap();

    let (entries, _) = engine
        .list_ledger_page(user_id, 10, None, &LedgerListFilter::default())
        .await
        .unwrap();
    assert!(entries.is_empty());
    // The funds moved into the goal stay gone.
    assert_eq!(engine.wallet(user_id, cash).await.unwrap().balance_minor, 800);
}

#[tokio::test]
async fn deleting_a_user_leaves_no_orphan_rows() {
    let (engine, db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 1000).await;
    let bank = wallet_with_balance(&engine, user_id, "Bank", 0).await;
    engine
        .transfer_between_wallets(WalletTransferCmd {
            user_id,
            from_wallet_id: cash,
            to_wallet_id: bank,
            amount_minor: 300,
            occurred_on: day(5),
            note: None,
        })
        .await
        .unwrap();
    engine
        .new_category(user_id, "Food", CategoryKind::Expense)
        .await
        .unwrap();

    engine.delete_user(user_id).await.unwrap();

    assert!(engine::users::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(engine::wallets::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(engine::categories::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(transactions::Entity::find().all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_aggregates_balances_and_category_totals() {
    let (engine, _db, user_id) = engine_with_user().await;
    let cash = wallet_with_balance(&engine, user_id, "Cash", 0).await;
    let salary = engine
        .new_income(
            user_id,
            NewBucket {
                name: "Salary".to_string(),
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let groceries = engine
        .new_expense(
            user_id,
            NewBucket {
                name: "Groceries".to_string(),
                icon: None,
                color: None,
            },
        )
        .await
        .unwrap();
    let work = engine
        .new_category(user_id, "Work", CategoryKind::Income)
        .await
        .unwrap();
    let food = engine
        .new_category(user_id, "Food", CategoryKind::Expense)
        .await
        .unwrap();

    engine
        .assign_income(AssignIncomeCmd {
            user_id,
            income_id: salary.id,
            wallet_id: cash,
            amount_minor: 1000,
            occurred_on: day(1),
            category_id: Some(work.id),
            note: None,
        })
        .await
        .unwrap();
    engine
        .assign_to_expense(AssignToExpenseCmd {
            user_id,
            wallet_id: cash,
            expense_id: groceries.id,
            amount_minor: 400,
            occurred_on: day(2),
            category_id: Some(food.id),
            note: None,
        })
        .await
        .unwrap();

    let summary = engine.dashboard(user_id, None, None).await.unwrap();
    assert_eq!(summary.total_balance_minor, 600);
    assert_eq!(summary.income_minor, 1000);
    assert_eq!(summary.expense_minor, 400);
    assert_eq!(summary.incomes_by_category.len(), 1);
    assert_eq!(summary.incomes_by_category[0].category_id, Some(work.id));
    assert_eq!(summary.incomes_by_category[0].total_minor, 1000);
    assert_eq!(summary.expenses_by_category.len(), 1);
    assert_eq!(
        summary.expenses_by_category[0].name.as_deref(),
        Some("Food")
    );

    // A range that excludes the expense day.
    let summary = engine
        .dashboard(user_id, Some(day(1)), Some(day(2)))
        .await
        .unwrap();
    assert_eq!(summary.income_minor, 1000);
    assert_eq!(summary.expense_minor, 0);
}
