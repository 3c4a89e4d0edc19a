use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use spendlog::{
    ExpenseInput, PasswordHash, Registration, SessionState, add_expense, initialize_db, register,
};

/// A utility for creating a test database for the spendlog server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Amount, category, description and age in days of the sample expenses.
const SAMPLE_EXPENSES: [(&str, &str, &str, i64); 10] = [
    ("4.50", "Coffee", "Flat white", 0),
    ("62.10", "Groceries", "Weekly shop", 2),
    ("1450.00", "Rent", "", 5),
    ("18.00", "Transport", "Bus top-up", 9),
    ("4.50", "Coffee", "Flat white", 21),
    ("71.35", "Groceries", "Weekly shop", 33),
    ("1450.00", "Rent", "", 35),
    ("39.99", "Entertainment", "Concert tickets", 48),
    ("58.80", "Groceries", "Weekly shop", 64),
    ("1450.00", "Rent", "", 66),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user demo@example.com with the password 'test'...");

    let user = register(
        Registration {
            username: "demo",
            email: "demo@example.com",
            password: "test",
            confirm_password: "test",
        },
        PasswordHash::DEFAULT_COST,
        &conn,
    )?;

    let session = SessionState::Authenticated {
        user_id: user.id,
        username: user.username,
    };

    println!("Adding {} sample expenses...", SAMPLE_EXPENSES.len());

    let today = OffsetDateTime::now_utc().date();

    for (amount, category, description, days_ago) in SAMPLE_EXPENSES {
        let date = (today - Duration::days(days_ago)).to_string();

        add_expense(
            &session,
            ExpenseInput {
                amount,
                category,
                description: Some(description),
                date: Some(&date),
            },
            today,
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
