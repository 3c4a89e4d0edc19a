//! The API endpoints URIs.
//!
//! Routes under `/api` are called from HTMX forms and respond with fragments
//! or `HX-Redirect` headers. All other routes respond with full pages.

/// The root route which redirects to the expenses page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, lists the user's expenses.
pub const EXPENSES_VIEW: &str = "/expenses";
/// The page for recording a new expense.
pub const NEW_EXPENSE_VIEW: &str = "/expenses/new";
/// The page for the monthly summary, takes an optional `month` query parameter.
pub const SUMMARY_VIEW: &str = "/summary";
/// The page for viewing and editing the user's name and email.
pub const PROFILE_VIEW: &str = "/profile";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register users.
pub const USERS: &str = "/api/users";
/// The route to record expenses.
pub const EXPENSES_API: &str = "/api/expenses";
/// The route to update the current user's profile.
pub const PROFILE_API: &str = "/api/profile";
