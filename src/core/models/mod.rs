pub mod audit;
pub mod expense;
pub mod user;

pub use audit::AppLog;
pub use expense::{Category, Expense, ExpenseChanges, NewExpense};
pub use user::User;
