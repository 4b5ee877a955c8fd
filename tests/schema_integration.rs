//! Integration tests for schema compilation and execution.
//!
//! These drive the public API end to end against an in-memory connection and
//! compare the literal SQL that reaches it.

use pretty_assertions::assert_eq;
use tabula::prelude::*;
use tabula::query::testing::MockConnection;

/// Test column modifiers render in canonical order whatever the call order
#[test]
fn test_column_modifier_order() {
    let grammar = Grammar::mysql();

    let mut t = Blueprint::create("t");
    t.integer("colname", 8).zero_fill().unsigned();
    t.var_char("name", 64).collate("collate_name").charset("charset_name");
    t.var_char("test", 8).default("hi").auto_increments().is_null();

    let fragments: Vec<String> = t.columns().iter().map(|c| c.compile(&grammar)).collect();
    assert_eq!(
        fragments,
        vec![
            "`colname` INT(8) UNSIGNED ZEROFILL NOT NULL",
            "`name` VARCHAR(64) CHARACTER SET charset_name COLLATE collate_name NOT NULL",
            "`test` VARCHAR(8) NOT NULL DEFAULT 'hi' AUTO_INCREMENT",
        ]
    );
}

/// Test the create, index and alter flow against a connection
#[tokio::test]
async fn test_create_then_alter_users() {
    let conn = MockConnection::new();
    let schema = Schema::new(&conn);

    schema
        .create("users", |t| {
            t.integer("id", 11).unsigned().auto_increments();
            t.var_char("username", 64);
            t.primary(["id"]);
            t.index(["username", "id"]);
        })
        .await
        .unwrap();
    schema
        .table("users", |t| {
            t.var_char("email", 128).is_null();
            t.unique(["email"]);
        })
        .await
        .unwrap();

    assert!(schema.has_table("users").await.unwrap());
    assert_eq!(
        conn.executed_sql(),
        vec![
            "CREATE TABLE `users` (`id` INT(11) UNSIGNED NOT NULL AUTO_INCREMENT, \
             `username` VARCHAR(64) NOT NULL, PRIMARY KEY (`id`), \
             INDEX `users_username_id` (`username`, `id`));",
            "ALTER TABLE `users` ADD `email` VARCHAR(128) NULL, ADD UNIQUE `users_email` (`email`);",
        ]
    );
}

/// Test that the table prefix reaches every table name but not index names
#[tokio::test]
async fn test_prefixed_foreign_key() {
    let conn = MockConnection::with_grammar(Grammar::mysql().with_prefix("p_"));
    let schema = Schema::new(&conn);

    schema
        .create("messages", |t| {
            t.integer("sender_id", 11).unsigned();
            t.foreign(["sender_id"])
                .references("users", ["id"])
                .on_delete("CASCADE")
                .on_update("RESTRICT");
        })
        .await
        .unwrap();
    schema.rename("messages", "letters").await.unwrap();
    schema.drop_if_exists("letters").await.unwrap();

    assert_eq!(
        conn.executed_sql(),
        vec![
            "CREATE TABLE `p_messages` (`sender_id` INT(11) UNSIGNED NOT NULL, \
             FOREIGN KEY `fk_messages_sender_id_users_id` (`sender_id`) REFERENCES `p_users` (`id`) \
             ON DELETE CASCADE ON UPDATE RESTRICT);",
            "RENAME TABLE `p_messages` TO `p_letters`;",
            "DROP TABLE IF EXISTS `p_letters`;",
        ]
    );
    assert!(conn.tables().is_empty());
}

/// Test insert parameter ordering with a function value in the middle
#[tokio::test]
async fn test_insert_rows_and_functions() {
    let conn = MockConnection::new();
    let grammar = Grammar::mysql();

    let stmt = Insert::into("table")
        .row([("id", Value::from(1)), ("username", Value::from("john.doe"))])
        .row([("id", Value::from(2)), ("username", Value::from("jane.doe"))])
        .compile(&grammar)
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO `table` (`id`, `username`) VALUES (?, ?), (?, ?);"
    );
    assert_eq!(
        stmt.params(),
        &[
            Value::Int(1),
            Value::from("john.doe"),
            Value::Int(2),
            Value::from("jane.doe"),
        ][..]
    );

    let affected = Insert::into("events")
        .row([
            ("id", Value::from(7)),
            ("at", Value::function("NOW()", [5, 10])),
            ("kind", Value::from("login")),
        ])
        .exec(&conn)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let executed = conn.executed();
    assert_eq!(
        executed[0].sql(),
        "INSERT INTO `events` (`id`, `at`, `kind`) VALUES (?, NOW(?, ?), ?);"
    );
    assert_eq!(
        executed[0].params(),
        &[Value::Int(7), Value::Int(5), Value::Int(10), Value::from("login")][..]
    );
}

/// Test that mismatched insert rows are refused before reaching the connection
#[tokio::test]
async fn test_mismatched_insert_never_executes() {
    let conn = MockConnection::new();
    let err = Insert::into("users")
        .row([("id", Value::from(1)), ("username", Value::from("a"))])
        .row([("id", Value::from(2))])
        .exec(&conn)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), tabula::query::ErrorKind::InvalidInput);
    assert!(conn.executed().is_empty());
}

/// Test the fixed-shape show and drop statements
#[test]
fn test_show_and_drop_statements() {
    let grammar = Grammar::mysql().with_prefix("p_");

    assert_eq!(Show::tables().compile(&grammar).sql(), "SHOW TABLES;");
    assert_eq!(Show::table_status().compile(&grammar).sql(), "SHOW TABLE STATUS;");
    assert_eq!(
        Show::columns("users").compile(&grammar).sql(),
        "SHOW COLUMNS FROM `p_users`;"
    );
    assert_eq!(Show::databases().compile(&grammar).sql(), "SHOW DATABASES;");
    assert_eq!(
        Show::create_table("users").compile(&grammar).sql(),
        "SHOW CREATE TABLE `p_users`;"
    );

    assert_eq!(
        DropStatement::table("users").if_exists().compile(&grammar).sql(),
        "DROP TABLE IF EXISTS `p_users`;"
    );
    assert_eq!(
        DropStatement::database("app").compile(&grammar).sql(),
        "DROP DATABASE `app`;"
    );
}

/// Test select, update and delete share the placeholder discipline
#[test]
fn test_predicate_statements() {
    let grammar = Grammar::mysql();

    let select = Select::from("users")
        .columns(["id", "name"])
        .where_eq("active", true)
        .order_by("id", Order::Desc)
        .limit(10)
        .offset(20)
        .compile(&grammar);
    assert_eq!(
        select.sql(),
        "SELECT `id`, `name` FROM `users` WHERE `active` = ? ORDER BY `id` DESC LIMIT 10 OFFSET 20;"
    );
    assert_eq!(select.params(), &[Value::Bool(true)][..]);

    let update = Update::table("users")
        .set("name", "bob")
        .where_eq("id", 3)
        .compile(&grammar)
        .unwrap();
    assert_eq!(update.sql(), "UPDATE `users` SET `name` = ? WHERE `id` = ?;");
    assert_eq!(update.params(), &[Value::from("bob"), Value::Int(3)][..]);

    let delete = Delete::from("users").where_eq("id", 3).compile(&grammar);
    assert_eq!(delete.sql(), "DELETE FROM `users` WHERE `id` = ?;");
}
