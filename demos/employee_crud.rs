//! End-to-end employee CRUD walkthrough.
//!
//! Demonstrates the complete store lifecycle: configuration, schema
//! creation on first open, typed inserts and retrievals, scalar queries,
//! upserts, and cleanup.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p rowkit-demos --example employee_crud
//! ```

use rowkit_core::{Entity, FromRow, RowValues, SchemaObject, SchemaSet};
use rowkit_sqlite::{Crud, Database, StoreConfig, UpsertOutcome};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Emp {
    id: Option<i64>,
    first_name: String,
    last_name: String,
    salary: f64,
    active: bool,
}

impl Emp {
    fn new(first_name: &str, last_name: &str, salary: f64) -> Self {
        Self {
            id: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            salary,
            active: true,
        }
    }
}

impl FromRow for Emp {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("_id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            salary: row.get("salary")?,
            active: row.get("active")?,
        })
    }
}

impl Entity for Emp {
    fn table_name() -> &'static str {
        "emp"
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> RowValues {
        RowValues::new()
            .with("first_name", self.first_name.clone())
            .with("last_name", self.last_name.clone())
            .with("salary", self.salary)
            .with("active", self.active)
    }
}

fn emp_schema() -> SchemaSet {
    SchemaSet::new()
        .with(SchemaObject::table(
            "emp",
            "CREATE TABLE IF NOT EXISTS emp (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                salary REAL NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 1
            );",
        ))
        .with(SchemaObject::index(
            "idx_emp_last_name",
            "CREATE INDEX IF NOT EXISTS idx_emp_last_name ON emp(last_name);",
        ))
}

fn main() {
    // === Step 1: Configuration ===
    println!("=== Configuration ===");
    let config_path = std::env::temp_dir().join("rowkit_demo_store.yml");
    StoreConfig::in_memory().save(&config_path).unwrap();
    let config = StoreConfig::load(&config_path).unwrap();
    println!(
        "Loaded config: schema_version={}, in_memory={}",
        config.schema_version,
        config.path.is_none()
    );

    // === Step 2: Open the database (creates the schema) ===
    println!("\n=== Lifecycle ===");
    let mut db = Database::new(config, emp_schema());
    db.open().unwrap();
    println!("Database open: {}", db.is_open());

    let crud = Crud::new(&db);

    // === Step 3: Insert employees ===
    println!("\n=== Inserts ===");
    for (first, last, salary) in [
        ("Ann", "Lee", 1200.0),
        ("Ben", "Kim", 1800.0),
        ("Cara", "Ng", 1500.0),
    ] {
        let mut emp = Emp::new(first, last, salary);
        let id = crud.insert(&mut emp, true).unwrap();
        println!("Inserted {first} {last} with id {id}");
    }

    // === Step 4: Typed retrieval ===
    println!("\n=== Retrieval ===");
    let all: Vec<Emp> = crud.retrieve_from(None, Some("last_name")).unwrap();
    for emp in &all {
        println!(
            "  #{} {} {} ({})",
            emp.id.unwrap_or_default(),
            emp.first_name,
            emp.last_name,
            emp.salary
        );
    }

    let ann: Emp = crud.retrieve_by_id(1, true).unwrap().unwrap();
    println!("By id 1: {}", serde_json::to_string_pretty(&ann).unwrap());

    // === Step 5: Scalar queries ===
    println!("\n=== Scalars ===");
    let headcount = crud
        .query_for_long("SELECT COUNT(*) FROM emp", [], true)
        .unwrap();
    let payroll = crud
        .query_for_double("SELECT SUM(salary) FROM emp", [], true)
        .unwrap();
    println!("Headcount: {headcount:?}, payroll: {payroll:?}");
    println!(
        "Anyone named Lee? {}",
        crud.exists("emp", Some("last_name = 'Lee'")).unwrap()
    );

    // === Step 6: Upserts ===
    println!("\n=== Upserts ===");
    let mut raise = Emp::new("Ann", "Lee", 1400.0);
    match crud.upsert_where(&mut raise, "last_name = 'Lee'").unwrap() {
        UpsertOutcome::Updated(n) => println!("Updated {n} row(s) for Lee"),
        UpsertOutcome::Inserted(id) => println!("Inserted new row {id}"),
    }

    let mut newcomer = Emp::new("Dev", "Rao", 1100.0);
    match crud.upsert(&mut newcomer).unwrap() {
        UpsertOutcome::Inserted(id) => println!("Upsert inserted Dev Rao as id {id}"),
        UpsertOutcome::Updated(n) => println!("Upsert updated {n} row(s)"),
    }

    // === Step 7: Delete ===
    println!("\n=== Delete ===");
    let ben: Emp = crud.retrieve_one_where("first_name = 'Ben'", true).unwrap().unwrap();
    let affected = crud.delete(&ben).unwrap();
    println!(
        "Deleted Ben ({affected} row); {} employees remain",
        crud.query_for_long("SELECT COUNT(*) FROM emp", [], true)
            .unwrap()
            .unwrap_or_default()
    );

    // Cleanup
    db.close();
    std::fs::remove_file(&config_path).ok();
    println!("\nDone!");
}
