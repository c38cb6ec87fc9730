use crate::model::{Column, ColumnProp, Row, Snapshot, Table, TableKind, Value};
use crate::mysql::database::Database;
use crate::sqlfmt::Param;
use crate::util::{Result, SchemaError};
use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Tables and columns starting with this prefix are internal and never diffed.
pub const DEFAULT_RESERVED_PREFIX: &str = "_";

/// Stands in for the database name inside captured DDL.
pub const DATABASE_PLACEHOLDER: &str = "<thisDB>";

const COLUMNS_QUERY: &str = r#"
    SELECT
        ??
    FROM
        information_schema.COLUMNS
    WHERE
        TABLE_SCHEMA = ?
    ORDER BY
        TABLE_NAME,
        ORDINAL_POSITION
"#;

const SHOW_CREATE_QUERY: &str = "SHOW CREATE TABLE `??`";

const CREATE_TABLE: &str = "Create Table";
const CREATE_VIEW: &str = "Create View";

static AUTO_INCREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" AUTO_INCREMENT=\d+").unwrap());
static ROW_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" (ROW_FORMAT=\w+|KEY_BLOCK_SIZE=\d+)").unwrap());
static VIEW_ALGORITHM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" ALGORITHM=\w+").unwrap());
static VIEW_DEFINER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" DEFINER=`[^`]*`@`[^`]*`").unwrap());
static VIEW_SECURITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" SQL SECURITY (DEFINER|INVOKER)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub reserved_prefix: String,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            reserved_prefix: DEFAULT_RESERVED_PREFIX.to_string(),
        }
    }
}

impl SnapshotOptions {
    fn is_reserved(&self, name: &str) -> bool {
        !self.reserved_prefix.is_empty() && name.starts_with(&self.reserved_prefix)
    }
}

/// Captures every table and view of `schema`: columns from
/// `information_schema.COLUMNS`, then the normalized `SHOW CREATE` text of
/// each table.
pub async fn build_snapshot(
    db: &impl Database,
    schema: &str,
    options: &SnapshotOptions,
) -> Result<Snapshot> {
    info!(schema, "building snapshot");

    let select_list = Param::list(
        ColumnProp::ALL
            .iter()
            .map(|prop| format!("{0} AS `{0}`", prop.as_str())),
    );
    let rows = db
        .query(COLUMNS_QUERY, vec![select_list, Param::from(schema)])
        .await?;

    let mut columns_by_table: IndexMap<String, IndexMap<String, Column>> = IndexMap::new();
    for row in &rows {
        let table_name = text_property(row, ColumnProp::TableName)?;
        let column_name = text_property(row, ColumnProp::ColumnName)?;
        if options.is_reserved(&table_name) || options.is_reserved(&column_name) {
            continue;
        }

        let column = column_from_row(row, column_name)?;
        columns_by_table
            .entry(table_name)
            .or_default()
            .insert(column.name.clone(), column);
    }

    let mut snapshot = Snapshot::new();
    for (name, columns) in columns_by_table {
        let (kind, ddl) = show_create(db, &name).await?;
        debug!(table = %name, ?kind, "captured definition");
        snapshot.tables.insert(
            name.clone(),
            Table {
                name,
                kind,
                ddl: normalize_ddl(kind, &ddl, schema),
                columns,
            },
        );
    }

    info!(schema, tables = snapshot.tables.len(), "snapshot complete");
    Ok(snapshot)
}

fn column_from_row(row: &Row, name: String) -> Result<Column> {
    let properties = ColumnProp::ALL
        .iter()
        .map(|prop| {
            row.get(prop.as_str())
                .map(|value| (*prop, value.clone()))
                .ok_or_else(|| SchemaError::MissingColumn {
                    column: prop.as_str().to_string(),
                })
        })
        .collect::<Result<IndexMap<_, _>>>()?;
    Ok(Column { name, properties })
}

fn text_property(row: &Row, prop: ColumnProp) -> Result<String> {
    match row.get(prop.as_str()) {
        Some(Value::Text(s)) => Ok(s.clone()),
        Some(Value::Int(n)) => Ok(n.to_string()),
        Some(Value::Null) | None => Err(SchemaError::MissingColumn {
            column: prop.as_str().to_string(),
        }),
    }
}

async fn show_create(db: &impl Database, table: &str) -> Result<(TableKind, String)> {
    // The name comes from the catalog; doubling backticks keeps it a single
    // quoted identifier.
    let rows = db
        .query(SHOW_CREATE_QUERY, Param::from(table.replace('`', "``")))
        .await?;

    let shape_error = |row: Option<&Row>| SchemaError::UnexpectedShape {
        table: table.to_string(),
        columns: row
            .map(|r| r.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default(),
    };

    let row = rows.first().ok_or_else(|| shape_error(None))?;
    let (kind, value) = if let Some(value) = row.get(CREATE_TABLE) {
        (TableKind::Table, value)
    } else if let Some(value) = row.get(CREATE_VIEW) {
        (TableKind::View, value)
    } else {
        return Err(shape_error(Some(row)));
    };

    match value {
        Value::Text(ddl) => Ok((kind, ddl.clone())),
        _ => Err(shape_error(Some(row))),
    }
}

/// Strips instance-specific clauses from `SHOW CREATE` output and replaces
/// the database name with [`DATABASE_PLACEHOLDER`].
pub fn normalize_ddl(kind: TableKind, ddl: &str, database: &str) -> String {
    let stripped = match kind {
        TableKind::Table => {
            let ddl = AUTO_INCREMENT.replace_all(ddl, "");
            ROW_FORMAT.replace_all(&ddl, "").into_owned()
        }
        TableKind::View => {
            let ddl = VIEW_ALGORITHM.replace_all(ddl, "");
            let ddl = VIEW_DEFINER.replace_all(&ddl, "");
            VIEW_SECURITY.replace_all(&ddl, "").into_owned()
        }
    };

    if database.is_empty() {
        return stripped;
    }
    stripped.replace(database, DATABASE_PLACEHOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mysql::database::StaticDatabase;

    fn column_row(table: &str, column: &str, position: i64, column_type: &str) -> Row {
        ColumnProp::ALL
            .iter()
            .map(|prop| {
                let value = match prop {
                    ColumnProp::TableCatalog => Value::from("def"),
                    ColumnProp::TableName => Value::from(table),
                    ColumnProp::ColumnName => Value::from(column),
                    ColumnProp::OrdinalPosition => Value::Int(position),
                    ColumnProp::ColumnType => Value::from(column_type),
                    ColumnProp::IsNullable => Value::from("YES"),
                    _ => Value::Null,
                };
                (prop.as_str().to_string(), value)
            })
            .collect()
    }

    fn create_row(key: &str, name: &str, ddl: &str) -> Row {
        let mut row = Row::new();
        let name_key = if key == CREATE_VIEW { "View" } else { "Table" };
        row.insert(name_key.to_string(), Value::from(name));
        row.insert(key.to_string(), Value::from(ddl));
        row
    }

    fn shop_database() -> StaticDatabase {
        StaticDatabase::new()
            .on(
                "information_schema.COLUMNS",
                vec![
                    column_row("_migrations", "id", 1, "int"),
                    column_row("orders", "id", 1, "int"),
                    column_row("orders", "_shadow", 2, "int"),
                    column_row("orders", "total", 3, "decimal(10,2)"),
                    column_row("order_totals", "total", 1, "decimal(10,2)"),
                ],
            )
            .on(
                "`orders`",
                vec![create_row(
                    CREATE_TABLE,
                    "orders",
                    "CREATE TABLE `orders` (\n  `id` int NOT NULL AUTO_INCREMENT\n) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4 ROW_FORMAT=DYNAMIC",
                )],
            )
            .on(
                "`order_totals`",
                vec![create_row(
                    CREATE_VIEW,
                    "order_totals",
                    "CREATE ALGORITHM=UNDEFINED DEFINER=`root`@`%` SQL SECURITY DEFINER VIEW `order_totals` AS select `shop`.`orders`.`total` AS `total` from `shop`.`orders`",
                )],
            )
    }

    #[tokio::test]
    async fn builds_tables_and_columns_in_discovery_order() {
        let db = shop_database();
        let snapshot = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap();

        let names: Vec<_> = snapshot.tables.keys().cloned().collect();
        assert_eq!(names, vec!["orders", "order_totals"]);

        let orders = snapshot.table("orders").unwrap();
        assert_eq!(orders.kind, TableKind::Table);
        let columns: Vec<_> = orders.columns.keys().cloned().collect();
        assert_eq!(columns, vec!["id", "total"]);
        assert_eq!(
            orders.columns["total"].get(ColumnProp::ColumnType),
            &Value::from("decimal(10,2)")
        );
        assert_eq!(
            orders.columns["id"].properties.keys().copied().collect::<Vec<_>>(),
            ColumnProp::ALL.to_vec()
        );
    }

    #[tokio::test]
    async fn reserved_prefix_is_excluded() {
        let db = shop_database();
        let snapshot = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap();

        assert!(snapshot.table("_migrations").is_none());
        assert!(!snapshot.table("orders").unwrap().columns.contains_key("_shadow"));
        assert!(db.received().iter().all(|sql| !sql.contains("_migrations")));
    }

    #[tokio::test]
    async fn empty_reserved_prefix_keeps_everything() {
        let db = shop_database().on(
            "`_migrations`",
            vec![create_row(CREATE_TABLE, "_migrations", "CREATE TABLE `_migrations` ()")],
        );
        let options = SnapshotOptions {
            reserved_prefix: String::new(),
        };
        let snapshot = build_snapshot(&db, "shop", &options).await.unwrap();
        assert!(snapshot.table("_migrations").is_some());
        assert!(snapshot.table("orders").unwrap().columns.contains_key("_shadow"));
    }

    #[tokio::test]
    async fn ddl_is_normalized() {
        let db = shop_database();
        let snapshot = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap();

        assert_eq!(
            snapshot.table("orders").unwrap().ddl,
            "CREATE TABLE `orders` (\n  `id` int NOT NULL AUTO_INCREMENT\n) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
        let view = snapshot.table("order_totals").unwrap();
        assert_eq!(view.kind, TableKind::View);
        assert_eq!(
            view.ddl,
            "CREATE VIEW `order_totals` AS select `<thisDB>`.`orders`.`total` AS `total` from `<thisDB>`.`orders`"
        );
    }

    #[tokio::test]
    async fn rebuilding_is_deterministic() {
        let first = build_snapshot(&shop_database(), "shop", &SnapshotOptions::default())
            .await
            .unwrap();
        let second = build_snapshot(&shop_database(), "shop", &SnapshotOptions::default())
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[tokio::test]
    async fn queries_use_escaped_schema_and_raw_identifiers() {
        let db = shop_database();
        build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap();

        let received = db.received();
        assert_eq!(received.len(), 3);
        assert!(received[0].contains("TABLE_SCHEMA = 'shop'"));
        assert!(received[0].contains("TABLE_CATALOG AS `TABLE_CATALOG`, TABLE_NAME AS `TABLE_NAME`"));
        assert_eq!(received[1], "SHOW CREATE TABLE `orders`");
        assert_eq!(received[2], "SHOW CREATE TABLE `order_totals`");
    }

    #[tokio::test]
    async fn unexpected_show_create_shape_is_fatal() {
        let mut odd = Row::new();
        odd.insert("Procedure".to_string(), Value::from("p"));
        let db = StaticDatabase::new()
            .on(
                "information_schema.COLUMNS",
                vec![column_row("orders", "id", 1, "int")],
            )
            .on("`orders`", vec![odd]);

        let err = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap_err();
        match err {
            SchemaError::UnexpectedShape { table, columns } => {
                assert_eq!(table, "orders");
                assert_eq!(columns, "Procedure");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_show_create_result_is_fatal() {
        let db = StaticDatabase::new()
            .on(
                "information_schema.COLUMNS",
                vec![column_row("orders", "id", 1, "int")],
            )
            .on("`orders`", vec![]);

        let err = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedShape { .. }));
    }

    #[tokio::test]
    async fn missing_metadata_column_is_fatal() {
        let mut row = column_row("orders", "id", 1, "int");
        row.shift_remove("COLUMN_KEY");
        let db = StaticDatabase::new().on("information_schema.COLUMNS", vec![row]);

        let err = build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn { column } if column == "COLUMN_KEY"));
    }

    #[tokio::test]
    async fn backticks_in_names_are_doubled() {
        let db = StaticDatabase::new()
            .on(
                "information_schema.COLUMNS",
                vec![column_row("odd`name", "id", 1, "int")],
            )
            .on(
                "SHOW CREATE",
                vec![create_row(CREATE_TABLE, "odd`name", "CREATE TABLE `odd``name` ()")],
            );
        build_snapshot(&db, "shop", &SnapshotOptions::default())
            .await
            .unwrap();
        assert_eq!(db.received()[1], "SHOW CREATE TABLE `odd``name`");
    }

    #[test]
    fn normalize_ddl_strips_view_security_clauses() {
        let ddl = "CREATE ALGORITHM=MERGE DEFINER=`app-user`@`10.0.%` SQL SECURITY INVOKER VIEW `v` AS select 1 AS `x`";
        assert_eq!(
            normalize_ddl(TableKind::View, ddl, "shop"),
            "CREATE VIEW `v` AS select 1 AS `x`"
        );
    }

    #[test]
    fn normalize_ddl_is_idempotent() {
        let ddl = "CREATE TABLE `t` (`id` int) ENGINE=InnoDB AUTO_INCREMENT=7 ROW_FORMAT=COMPACT KEY_BLOCK_SIZE=8";
        let once = normalize_ddl(TableKind::Table, ddl, "shop");
        assert_eq!(once, "CREATE TABLE `t` (`id` int) ENGINE=InnoDB");
        assert_eq!(normalize_ddl(TableKind::Table, &once, "shop"), once);
    }
}
