use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    CreateAccountCmd, CreateTransactionCmd, Currency, Engine, EngineError, PageRequest, Scope,
    TransactionListFilter, UpdateTransactionCmd, UserSettingsPatch,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

#[tokio::test]
async fn create_user_rejects_duplicate_usernames() {
    let (engine, _db) = engine_with_db().await;

    engine.create_user("alice", "password").await.unwrap();
    let err = engine.create_user("  alice ", "other").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
}

#[tokio::test]
async fn authenticate_hides_which_part_was_wrong() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();

    let user = engine.authenticate("alice", "password").await.unwrap();
    assert_eq!(user.id, alice.id);

    let wrong_password = engine.authenticate("alice", "nope").await.unwrap_err();
    let unknown_user = engine.authenticate("bob", "password").await.unwrap_err();
    assert_eq!(wrong_password, unknown_user);
    assert!(matches!(wrong_password, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn settings_default_until_updated() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();

    let settings = engine.user_settings(alice.id).await.unwrap();
    assert_eq!(settings, engine::UserSettings::default());

    engine
        .update_user_settings(
            alice.id,
            UserSettingsPatch {
                currency: Some(Currency::Usd),
                locale: Some("en-US".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let updated = engine
        .update_user_settings(
            alice.id,
            UserSettingsPatch {
                timezone: Some("America/New_York".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.currency, Currency::Usd);
    assert_eq!(updated.locale, "en-US");
    assert_eq!(updated.timezone, "America/New_York");
    assert_eq!(engine.user_settings(alice.id).await.unwrap(), updated);
}

#[tokio::test]
async fn new_account_uses_preferred_currency() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    engine
        .update_user_settings(
            alice.id,
            UserSettingsPatch {
                currency: Some(Currency::Gbp),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let implicit = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();
    let explicit = engine
        .create_account(CreateAccountCmd::new(alice.id, "Travel").currency(Currency::Eur))
        .await
        .unwrap();

    assert_eq!(implicit.currency, Currency::Gbp);
    assert_eq!(explicit.currency, Currency::Eur);
}

#[tokio::test]
async fn account_names_are_unique_per_user() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let bob = engine.create_user("bob", "password").await.unwrap();

    engine
        .create_account(CreateAccountCmd::new(alice.id, "Cash"))
        .await
        .unwrap();
    engine
        .create_account(CreateAccountCmd::new(bob.id, "Cash"))
        .await
        .unwrap();
    let err = engine
        .create_account(CreateAccountCmd::new(alice.id, " Cash "))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("Cash".to_string()));
}

#[tokio::test]
async fn foreign_rows_look_missing() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let bob = engine.create_user("bob", "password").await.unwrap();

    let account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(CreateTransactionCmd::new(alice.id, account.id, 500, day(1)))
        .await
        .unwrap();

    let bob_scope = Scope::User(bob.id);
    assert_eq!(
        engine.account(&bob_scope, account.id).await.unwrap_err(),
        EngineError::KeyNotFound("account not exists".to_string())
    );
    assert_eq!(
        engine.transaction(&bob_scope, tx.id).await.unwrap_err(),
        EngineError::KeyNotFound("transaction not exists".to_string())
    );
    assert!(
        engine
            .remove_transaction(&bob_scope, tx.id)
            .await
            .is_err()
    );
    assert!(
        engine
            .create_transaction(CreateTransactionCmd::new(bob.id, account.id, 100, day(1)))
            .await
            .is_err()
    );

    let bob_accounts = engine
        .list_accounts(&bob_scope, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(bob_accounts.total_items, 0);

    let all = engine
        .list_accounts(&Scope::System, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 1);

    // Still there for the owner.
    engine
        .transaction(&Scope::User(alice.id), tx.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn transactions_cannot_move_to_foreign_accounts() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let bob = engine.create_user("bob", "password").await.unwrap();

    let alice_account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();
    let bob_account = engine
        .create_account(CreateAccountCmd::new(bob.id, "Bank"))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(CreateTransactionCmd::new(
            alice.id,
            alice_account.id,
            500,
            day(1),
        ))
        .await
        .unwrap();

    let err = engine
        .update_transaction(
            &Scope::System,
            tx.id,
            UpdateTransactionCmd::default().account_id(bob_account.id),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("account not exists".to_string())
    );
}

#[tokio::test]
async fn list_transactions_pages_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let scope = Scope::User(alice.id);
    let account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();

    for d in 1..=5 {
        engine
            .create_transaction(
                CreateTransactionCmd::new(alice.id, account.id, i64::from(d) * 100, day(d))
                    .description(format!("day {d}")),
            )
            .await
            .unwrap();
    }

    let filter = TransactionListFilter {
        account_id: Some(account.id),
        ..Default::default()
    };
    let first = engine
        .list_transactions(&scope, &filter, PageRequest::new(Some(1), Some(2)))
        .await
        .unwrap();
    assert_eq!(first.total_items, 5);
    assert_eq!(first.total_pages, 3);
    let dates: Vec<_> = first.items.iter().map(|tx| tx.occurred_on).collect();
    assert_eq!(dates, vec![day(5), day(4)]);

    let last = engine
        .list_transactions(&scope, &filter, PageRequest::new(Some(3), Some(2)))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].occurred_on, day(1));
    assert!(!last.has_next());

    let past_end = engine
        .list_transactions(&scope, &filter, PageRequest::new(Some(9), Some(2)))
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_items, 5);

    let ranged = engine
        .list_transactions(
            &scope,
            &TransactionListFilter {
                account_id: None,
                from: Some(day(2)),
                to: Some(day(3)),
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(ranged.total_items, 2);
}

#[tokio::test]
async fn update_and_remove_validate_input() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let scope = Scope::User(alice.id);
    let account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(
            CreateTransactionCmd::new(alice.id, account.id, -750, day(3)).description("groceries"),
        )
        .await
        .unwrap();

    let err = engine
        .update_transaction(&scope, tx.id, UpdateTransactionCmd::default().amount_minor(0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let updated = engine
        .update_transaction(
            &scope,
            tx.id,
            UpdateTransactionCmd::default()
                .occurred_on(day(4))
                .description(None),
        )
        .await
        .unwrap();
    assert_eq!(updated.occurred_on, day(4));
    assert_eq!(updated.amount_minor, -750);
    assert_eq!(updated.description, None);

    let removed = engine.remove_transaction(&scope, tx.id).await.unwrap();
    assert_eq!(removed.id, tx.id);
    assert_eq!(
        engine.transaction(&scope, tx.id).await.unwrap_err(),
        EngineError::KeyNotFound("transaction not exists".to_string())
    );
}

#[tokio::test]
async fn delete_account_removes_its_transactions() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let scope = Scope::User(alice.id);
    let account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();
    let tx = engine
        .create_transaction(CreateTransactionCmd::new(alice.id, account.id, 100, day(1)))
        .await
        .unwrap();

    engine.delete_account(&scope, account.id).await.unwrap();

    assert!(engine.account(&scope, account.id).await.is_err());
    assert!(engine.transaction(&Scope::System, tx.id).await.is_err());
    assert!(engine.delete_account(&scope, Uuid::new_v4()).await.is_err());
}

#[tokio::test]
async fn rename_account_normalizes_name() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine.create_user("alice", "password").await.unwrap();
    let scope = Scope::User(alice.id);
    let account = engine
        .create_account(CreateAccountCmd::new(alice.id, "Bank"))
        .await
        .unwrap();

    let renamed = engine
        .rename_account(&scope, account.id, "  Savings ")
        .await
        .unwrap();
    assert_eq!(renamed.name, "Savings");
    assert!(matches!(
        engine.rename_account(&scope, account.id, "   ").await,
        Err(EngineError::InvalidName(_))
    ));
}
