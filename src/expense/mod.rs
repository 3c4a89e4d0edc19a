//! The expense ledger and the pages for recording and listing expenses.

mod core;
mod create_endpoint;
mod create_page;
mod expenses_page;

pub use core::{Expense, ExpenseInput, add_expense, create_expense_table, list_expenses, total};
pub use create_endpoint::create_expense_endpoint;
pub use create_page::get_new_expense_page;
pub use expenses_page::get_expenses_page;
