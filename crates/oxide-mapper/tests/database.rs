//! Facade behavior against a scripted executor: what SQL is sent in which
//! mode, and how results land on entities.

mod common;

use common::*;
use oxide_mapper::{AdapterKind, Database, MapperConfig, MapperError, Parameters, SqlValue};
use oxide_mapper_core::dialect::{GenericAdapter, OracleAdapter, PostgresAdapter, SqlServerAdapter};
use oxide_mapper_core::{ExecutionMode, RetrievalStrategy};

fn sql_server(executor: RecordingExecutor) -> Database<RecordingExecutor> {
    Database::with_adapter(executor, Box::new(SqlServerAdapter::new()))
}

fn generic(executor: RecordingExecutor) -> Database<RecordingExecutor> {
    Database::with_adapter(executor, Box::new(GenericAdapter::new()))
}

// =============================================================================
// Insert
// =============================================================================

#[test]
fn test_insert_select_after_assigns_identity() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![
        vec![],
        vec![row(&[("id", SqlValue::Int(42))])],
    ]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    assert!(db.insert(&mut person).unwrap());
    assert_eq!(person.id, 42);

    let call = db.executor().last_call();
    assert_eq!(call.mode, ExecutionMode::QueryMultiple);
    assert!(call.sql.ends_with("where [id] = SCOPE_IDENTITY()"));
    assert_eq!(
        call.parameters.get("first_name"),
        Some(&SqlValue::Text("Ada".into()))
    );
}

#[test]
fn test_insert_without_selected_row_leaves_entity_unchanged() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![vec![], vec![]]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    assert!(!db.insert(&mut person).unwrap());
    assert_eq!(person, Person::new("Ada", "Lovelace"));
}

#[test]
fn test_select_after_matches_column_names_exactly() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![vec![row(&[(
        "ID",
        SqlValue::Int(9),
    )])]]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    let err = db.insert(&mut person).unwrap_err();
    assert!(matches!(
        err,
        MapperError::MissingGeneratedValue { entity: "Person", ref property } if property == "id"
    ));
    assert_eq!(person, Person::new("Ada", "Lovelace"));
}

#[test]
fn test_selected_row_without_generated_column_fails() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![
        vec![],
        vec![row(&[("something_else", SqlValue::Int(9))])],
    ]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    assert!(matches!(
        db.insert(&mut person),
        Err(MapperError::MissingGeneratedValue { .. })
    ));
    assert_eq!(person.id, 0);
}

#[test]
fn test_returning_row_without_generated_column_fails() {
    let executor =
        RecordingExecutor::new().reply(Reply::Rows(vec![row(&[("unrelated", SqlValue::Int(5))])]));
    let db = Database::with_adapter(executor, Box::new(PostgresAdapter::new()));

    let mut person = Person::new("Alan", "Turing");
    assert!(matches!(
        db.insert(&mut person),
        Err(MapperError::MissingGeneratedValue { ref property, .. }) if property == "id"
    ));
    assert_eq!(person.id, 0);
}

#[test]
fn test_insert_output_parameters() {
    let executor =
        RecordingExecutor::new().reply(Reply::Affected(1, vec![("id", SqlValue::Int(7))]));
    let db = Database::with_adapter(executor, Box::new(OracleAdapter::new()));

    let mut person = Person::new("Grace", "Hopper");
    assert!(db.insert(&mut person).unwrap());
    assert_eq!(person.id, 7);

    let call = db.executor().last_call();
    assert_eq!(call.mode, ExecutionMode::Execute);
    assert!(call.sql.contains("returning"));
}

#[test]
fn test_insert_returning_row() {
    let executor =
        RecordingExecutor::new().reply(Reply::Rows(vec![row(&[("ID", SqlValue::Int(11))])]));
    let db = Database::with_adapter(executor, Box::new(PostgresAdapter::new()));

    let mut person = Person::new("Alan", "Turing");
    assert!(db.insert(&mut person).unwrap());
    assert_eq!(person.id, 11);
    assert_eq!(db.executor().last_call().mode, ExecutionMode::Query);
}

#[test]
fn test_insert_plain_write_reports_affected_rows() {
    let executor = RecordingExecutor::new().reply(Reply::Affected(0, vec![]));
    let db = generic(executor);

    let mut membership = Membership {
        group_id: 1,
        person_id: 2,
        role: String::from("owner"),
    };
    assert!(!db.insert(&mut membership).unwrap());
    assert_eq!(db.executor().last_call().mode, ExecutionMode::Execute);
}

#[test]
fn test_insert_unconvertible_generated_value() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![vec![row(&[(
        "id",
        SqlValue::Text("not a number".into()),
    )])]]));
    let db = sql_server(executor);

    let err = db.insert(&mut Person::new("Ada", "Lovelace")).unwrap_err();
    assert!(matches!(err, MapperError::Conversion { ref property, .. } if property == "id"));
}

#[test]
fn test_executor_errors_pass_through() {
    // A row set where a command result is expected.
    let executor = RecordingExecutor::new().reply(Reply::Rows(vec![]));
    let db = generic(executor);

    let err = db.delete(&Person::new("Ada", "Lovelace")).unwrap_err();
    let MapperError::Execution(source) = err else {
        panic!("expected an execution error, got {err:?}");
    };
    assert!(source.downcast_ref::<ScriptError>().is_some());
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_advances_version() {
    let executor = RecordingExecutor::new().reply(Reply::Affected(1, vec![]));
    let db = generic(executor);

    let mut doc = Document {
        id: 5,
        title: String::from("Draft"),
        revision: Some(3),
    };
    assert!(db.update(&mut doc).unwrap());
    assert_eq!(doc.revision, Some(4));

    let call = db.executor().last_call();
    assert!(call.sql.ends_with(r#""revision" = @revision"#));
    assert_eq!(call.parameters.get("revision"), Some(&SqlValue::Int(3)));
    assert_eq!(call.parameters.get("revision__next"), Some(&SqlValue::Int(4)));
}

#[test]
fn test_update_conflict_keeps_version() {
    let executor = RecordingExecutor::new().reply(Reply::Affected(0, vec![]));
    let db = generic(executor);

    let mut doc = Document {
        id: 5,
        title: String::from("Draft"),
        revision: Some(3),
    };
    assert!(!db.update(&mut doc).unwrap());
    assert_eq!(doc.revision, Some(3));
}

#[test]
fn test_update_first_version_from_null() {
    let executor = RecordingExecutor::new().reply(Reply::Affected(1, vec![]));
    let db = generic(executor);

    let mut doc = Document {
        id: 5,
        title: String::from("Draft"),
        revision: None,
    };
    assert!(db.update(&mut doc).unwrap());
    assert_eq!(doc.revision, Some(1));
    assert!(db.executor().last_call().sql.ends_with(r#""revision" is null"#));
}

#[test]
fn test_update_select_after_not_found() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![vec![], vec![]]));
    let db = sql_server(executor);

    let mut person = Person {
        id: 3,
        ..Person::new("Ada", "Lovelace")
    };
    assert!(!db.update(&mut person).unwrap());
    assert!(db
        .executor()
        .last_call()
        .sql
        .ends_with("where [id] = @id and @@ROWCOUNT > 0"));
}

#[test]
fn test_update_columns_restricts_set_list() {
    let db = generic(RecordingExecutor::new());

    let mut person = Person {
        id: 3,
        ..Person::new("Ada", "Lovelace")
    };
    assert!(db.update_columns(&mut person, &["last_name"]).unwrap());
    assert_eq!(
        db.executor().last_call().sql,
        r#"update "Persons" set "last_name" = @last_name where "id" = @id"#
    );
}

#[test]
fn test_update_columns_rejects_unknown_property() {
    let db = generic(RecordingExecutor::new());

    let err = db
        .update_columns(&mut Person::new("Ada", "Lovelace"), &["nickname"])
        .unwrap_err();
    assert!(matches!(err, MapperError::Configuration(_)));
    assert!(db.executor().calls().is_empty());
}

// =============================================================================
// Upsert / delete / exists
// =============================================================================

#[test]
fn test_upsert_inserts_missing_row() {
    let executor = RecordingExecutor::new()
        .reply(Reply::Rows(vec![]))
        .reply(Reply::Sets(vec![vec![], vec![row(&[("id", SqlValue::Int(8))])]]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    assert!(db.upsert(&mut person).unwrap());
    assert_eq!(person.id, 8);

    let calls = db.executor().calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].sql.starts_with("select 1 where exists"));
    assert!(calls[1].sql.starts_with("insert into [Persons]"));
}

#[test]
fn test_upsert_updates_existing_row() {
    let executor = RecordingExecutor::new()
        .reply(Reply::Rows(vec![row(&[("1", SqlValue::Int(1))])]))
        .reply(Reply::Affected(1, vec![]));
    let db = generic(executor);

    let mut person = Person {
        id: 4,
        ..Person::new("Ada", "Lovelace")
    };
    assert!(db.upsert(&mut person).unwrap());
    assert!(db.executor().last_call().sql.starts_with(r#"update "Persons""#));
}

#[test]
fn test_delete_by_key() {
    let db = generic(RecordingExecutor::new().reply(Reply::Affected(1, vec![])));
    let person = Person {
        id: 4,
        ..Person::new("Ada", "Lovelace")
    };
    assert!(db.delete(&person).unwrap());

    let call = db.executor().last_call();
    assert_eq!(call.sql, r#"delete from "Persons" where "id" = @id"#);
    assert_eq!(call.parameters.get("id"), Some(&SqlValue::Int(4)));
}

#[test]
fn test_delete_missing_row() {
    let db = generic(RecordingExecutor::new().reply(Reply::Affected(0, vec![])));
    assert!(!db.delete(&Person::new("Ada", "Lovelace")).unwrap());
}

#[test]
fn test_delete_where_returns_count() {
    let db = generic(RecordingExecutor::new().reply(Reply::Affected(3, vec![])));
    let params = Parameters::new().with("last_name", "Smith");
    let deleted = db
        .delete_where::<Person>("where last_name = @last_name", &params)
        .unwrap();
    assert_eq!(deleted, 3);
    assert_eq!(
        db.executor().last_call().parameters.get("last_name"),
        Some(&SqlValue::Text("Smith".into()))
    );
}

#[test]
fn test_exists() {
    let executor = RecordingExecutor::new()
        .reply(Reply::Rows(vec![row(&[("1", SqlValue::Int(1))])]))
        .reply(Reply::Rows(vec![]));
    let db = generic(executor);
    let person = Person {
        id: 1,
        ..Person::new("Ada", "Lovelace")
    };
    assert!(db.exists(&person).unwrap());
    assert!(!db
        .exists_where::<Person>("where last_name = @last_name", &Parameters::new().with("last_name", "X"))
        .unwrap());
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn test_get_by_key() {
    let executor = RecordingExecutor::new().reply(Reply::Rows(vec![row(&[
        ("id", SqlValue::Int(5)),
        ("FIRST_NAME", SqlValue::Text("Ada".into())),
        ("last_name", SqlValue::Text("Lovelace".into())),
        ("extra", SqlValue::Int(0)),
    ])]));
    let db = generic(executor);

    let person: Person = db.get(5_i64).unwrap().unwrap();
    assert_eq!(
        person,
        Person {
            id: 5,
            ..Person::new("Ada", "Lovelace")
        }
    );

    let call = db.executor().last_call();
    assert!(call.sql.ends_with(r#"where "id" = @id"#));
    assert_eq!(call.parameters.get("id"), Some(&SqlValue::Int(5)));
}

#[test]
fn test_get_missing() {
    let db = generic(RecordingExecutor::new());
    assert_eq!(db.get::<Person>(99_i64).unwrap(), None);
}

#[test]
fn test_get_requires_single_key() {
    let db = generic(RecordingExecutor::new());
    let err = db.get::<Membership>(1_i64).unwrap_err();
    assert!(matches!(err, MapperError::Configuration(_)));
}

#[test]
fn test_find_by_composite_key() {
    let executor = RecordingExecutor::new().reply(Reply::Rows(vec![row(&[
        ("group_id", SqlValue::Int(1)),
        ("person_id", SqlValue::Int(2)),
        ("role", SqlValue::Text("admin".into())),
    ])]));
    let db = generic(executor);

    let key_only = Membership {
        group_id: 1,
        person_id: 2,
        role: String::new(),
    };
    let found = db.find(&key_only).unwrap().unwrap();
    assert_eq!(found.role, "admin");
    assert!(db
        .executor()
        .last_call()
        .sql
        .ends_with(r#"where "group_id" = @group_id and "person_id" = @person_id"#));
}

#[test]
fn test_get_page_list_binds_page_parameters() {
    let db = generic(RecordingExecutor::new());
    let params = Parameters::new().with("last_name", "Smith");
    let people: Vec<Person> = db
        .get_page_list(3, 10, "where last_name = @last_name", &params)
        .unwrap();
    assert!(people.is_empty());

    let call = db.executor().last_call();
    assert_eq!(call.parameters.get("last_name"), Some(&SqlValue::Text("Smith".into())));
    assert_eq!(call.parameters.get("PAGE_SKIP__"), Some(&SqlValue::Int(20)));
    assert_eq!(call.parameters.get("PAGE_SIZE__"), Some(&SqlValue::Int(10)));
}

#[test]
fn test_get_page_list_rejects_page_zero() {
    let db = generic(RecordingExecutor::new());
    let err = db
        .get_page_list::<Person>(0, 10, "", &Parameters::new())
        .unwrap_err();
    assert!(matches!(err, MapperError::UnsupportedShape(_)));
    assert!(db.executor().calls().is_empty());
}

#[test]
fn test_count() {
    let executor =
        RecordingExecutor::new().reply(Reply::Rows(vec![row(&[("count", SqlValue::Int(25))])]));
    let db = generic(executor);
    assert_eq!(db.count::<Person>("", &Parameters::new()).unwrap(), 25);
}

#[test]
fn test_execute_sql() {
    let db = generic(RecordingExecutor::new().reply(Reply::Affected(2, vec![])));
    let mut params = Parameters::new().with("n", 1_i64);
    assert_eq!(db.execute_sql("update t set n = @n", &mut params).unwrap(), 2);
}

#[test]
fn test_execute_scalar_reads_first_column() {
    let executor = RecordingExecutor::new()
        .reply(Reply::Rows(vec![row(&[
            ("total", SqlValue::Int(12)),
            ("ignored", SqlValue::Int(1)),
        ])]))
        .reply(Reply::Rows(vec![]));
    let db = generic(executor);
    let params = Parameters::new().with("n", 1_i64);

    assert_eq!(db.execute_scalar::<i64>("select total, ignored from t", &params).unwrap(), Some(12));
    assert_eq!(db.execute_scalar::<i64>("select total from t", &params).unwrap(), None);

    let call = db.executor().last_call();
    assert_eq!(call.mode, ExecutionMode::Query);
    assert_eq!(call.parameters.get("n"), Some(&SqlValue::Int(1)));
}

#[test]
fn test_get_multiple_reads_sets_in_order() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![
        vec![
            row(&[("id", SqlValue::Int(1)), ("first_name", SqlValue::Text("Ada".into()))]),
            row(&[("id", SqlValue::Int(2)), ("first_name", SqlValue::Text("Grace".into()))]),
        ],
        vec![row(&[
            ("group_id", SqlValue::Int(1)),
            ("person_id", SqlValue::Int(2)),
            ("role", SqlValue::Text("owner".into())),
        ])],
        vec![],
    ]));
    let db = generic(executor);

    let mut results = db
        .get_multiple("select * from Persons; select * from Memberships; select 1", &Parameters::new())
        .unwrap();
    let people: Vec<Person> = results.read().unwrap();
    assert_eq!(people[1].first_name, "Grace");
    let membership: Membership = results.read_first().unwrap().unwrap();
    assert_eq!(membership.role, "owner");
    assert_eq!(results.remaining(), 1);
    assert!(results.into_sets()[0].is_empty());
    assert_eq!(db.executor().last_call().mode, ExecutionMode::QueryMultiple);
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_selects_adapter() {
    let config = MapperConfig {
        oracle_returning_rows: true,
        ..MapperConfig::new(AdapterKind::Oracle)
    };
    let db = Database::new(RecordingExecutor::new(), &config);
    assert_eq!(db.adapter().kind(), AdapterKind::Oracle);
    assert_eq!(db.adapter().retrieval_strategy(), RetrievalStrategy::ReturningRow);

    let db = Database::new(RecordingExecutor::new(), &MapperConfig::new(AdapterKind::SqlServer));
    assert_eq!(db.adapter().retrieval_strategy(), RetrievalStrategy::SelectAfter);
}

#[test]
fn test_table_info_is_shared() {
    let db = generic(RecordingExecutor::new());
    let first = db.table_info::<Person>().unwrap();
    let second = db.table_info::<Person>().unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

// =============================================================================
// Async
// =============================================================================

#[tokio::test]
async fn test_insert_async() {
    let executor = RecordingExecutor::new().reply(Reply::Sets(vec![
        vec![],
        vec![row(&[("id", SqlValue::Int(42))])],
    ]));
    let db = sql_server(executor);

    let mut person = Person::new("Ada", "Lovelace");
    assert!(db.insert_async(&mut person).await.unwrap());
    assert_eq!(person.id, 42);
}

#[tokio::test]
async fn test_update_async_conflict() {
    let db = generic(RecordingExecutor::new().reply(Reply::Affected(0, vec![])));
    let mut doc = Document {
        id: 1,
        title: String::from("Draft"),
        revision: Some(2),
    };
    assert!(!db.update_async(&mut doc).await.unwrap());
    assert_eq!(doc.revision, Some(2));
}

#[tokio::test]
async fn test_reads_async() {
    let executor = RecordingExecutor::new()
        .reply(Reply::Rows(vec![row(&[
            ("id", SqlValue::Int(1)),
            ("first_name", SqlValue::Text("Ada".into())),
            ("last_name", SqlValue::Text("Lovelace".into())),
        ])]))
        .reply(Reply::Rows(vec![row(&[("count", SqlValue::Int(1))])]));
    let db = generic(executor);

    let people: Vec<Person> = db.get_list_async("", &Parameters::new()).await.unwrap();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].first_name, "Ada");
    assert_eq!(db.count_async::<Person>("", &Parameters::new()).await.unwrap(), 1);
}
