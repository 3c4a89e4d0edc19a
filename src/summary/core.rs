//! Monthly totals and per-category breakdowns of a user's expenses.

use std::{fmt::Display, str::FromStr};

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{Error, SessionState, money::from_cents};

/// A calendar month, written as "YYYY-MM".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearMonth {
    year: i32,
    month: Month,
}

impl YearMonth {
    /// The month containing `date`.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month after this one.
    pub fn next(self) -> Self {
        match self.month {
            Month::December => Self {
                year: self.year + 1,
                month: Month::January,
            },
            month => Self {
                year: self.year,
                month: month.next(),
            },
        }
    }

    /// The month before this one.
    pub fn previous(self) -> Self {
        match self.month {
            Month::January => Self {
                year: self.year - 1,
                month: Month::December,
            },
            month => Self {
                year: self.year,
                month: month.previous(),
            },
        }
    }

    /// The year, e.g. 2024.
    pub fn year(self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(self) -> Month {
        self.month
    }

    /// A human readable label, e.g. "January 2024".
    pub fn label(self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Parse a month such as "2024-01".
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMonth(text.to_owned());

        let (year, month) = text.trim().split_once('-').ok_or_else(invalid)?;

        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        let month = Month::try_from(month).map_err(|_| invalid())?;

        Ok(Self { year, month })
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month as u8)
    }
}

/// The amount spent in one category during a month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyCategoryTotal {
    /// The category name.
    pub category: String,
    /// The sum of the category's expenses for the month.
    pub total: Decimal,
}

/// Sum the logged in user's expenses during `month`.
///
/// Returns zero for a month without expenses.
///
/// # Errors
/// Returns [Error::Unauthenticated] if `session` is anonymous or
/// [Error::StoreUnavailable] if there is an SQL error.
pub fn monthly_total(
    session: &SessionState,
    month: YearMonth,
    connection: &Connection,
) -> Result<Decimal, Error> {
    let user_id = session.user_id()?;

    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM expense
         WHERE user_id = ?1 AND substr(expense_date, 1, 7) = ?2",
        (user_id.as_i64(), month.to_string()),
        |row| row.get(0),
    )?;

    Ok(from_cents(cents))
}

/// Sum the logged in user's expenses during `month` for each category.
///
/// The largest totals come first. Categories with equal totals are ordered by name.
///
/// # Errors
/// Returns [Error::Unauthenticated] if `session` is anonymous or
/// [Error::StoreUnavailable] if there is an SQL error.
pub fn monthly_by_category(
    session: &SessionState,
    month: YearMonth,
    connection: &Connection,
) -> Result<Vec<MonthlyCategoryTotal>, Error> {
    let user_id = session.user_id()?;

    connection
        .prepare(
            "SELECT category, SUM(amount) AS subtotal FROM expense
             WHERE user_id = ?1 AND substr(expense_date, 1, 7) = ?2
             GROUP BY category
             ORDER BY subtotal DESC, category ASC",
        )?
        .query_map(
            (user_id.as_i64(), month.to_string()),
            |row| {
                let category = row.get(0)?;
                let cents = row.get(1)?;

                Ok(MonthlyCategoryTotal {
                    category,
                    total: from_cents(cents),
                })
            },
        )?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// The months in which the logged in user has expenses, newest first.
///
/// # Errors
/// Returns [Error::Unauthenticated] if `session` is anonymous or
/// [Error::StoreUnavailable] if there is an SQL error.
pub fn available_months(
    session: &SessionState,
    connection: &Connection,
) -> Result<Vec<YearMonth>, Error> {
    let user_id = session.user_id()?;

    let months: Vec<String> = connection
        .prepare(
            "SELECT DISTINCT substr(expense_date, 1, 7) AS month FROM expense
             WHERE user_id = ?1
             ORDER BY month DESC",
        )?
        .query_map((user_id.as_i64(),), |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    months.iter().map(|month| month.parse()).collect()
}


#[cfg(test)]
mod summary_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        Error, SessionState,
        db::initialize,
        expense::{ExpenseInput, add_expense},
        user::{Registration, register},
    };

    use super::{
        MonthlyCategoryTotal, YearMonth, available_months, monthly_by_category, monthly_total,
    };

    fn get_test_connection() -> (Connection, SessionState) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = register(
            Registration {
                username: "alice",
                email: "alice@example.com",
                password: "hunter2",
                confirm_password: "hunter2",
            },
            4,
            &conn,
        )
        .unwrap();
        let session = SessionState::Authenticated {
            user_id: user.id,
            username: user.username,
        };

        (conn, session)
    }

    fn add(conn: &Connection, session: &SessionState, amount: &str, category: &str, date: &str) {
        add_expense(
            session,
            ExpenseInput {
                amount,
                category,
                description: None,
                date: Some(date),
            },
            date!(2024 - 12 - 31),
            conn,
        )
        .expect("Could not add expense");
    }

    fn january() -> YearMonth {
        "2024-01".parse().unwrap()
    }

    fn add_january_expenses(conn: &Connection, session: &SessionState) {
        add(conn, session, "10.00", "Food", "2024-01-03");
        add(conn, session, "5.50", "Food", "2024-01-31");
        add(conn, session, "20.00", "Transport", "2024-01-01");
        // Outside of January.
        add(conn, session, "100.00", "Food", "2023-12-31");
        add(conn, session, "100.00", "Food", "2024-02-01");
    }

    #[test]
    fn monthly_total_sums_only_that_month() {
        let (conn, session) = get_test_connection();
        add_january_expenses(&conn, &session);

        let total = monthly_total(&session, january(), &conn).unwrap();

        assert_eq!(total, dec!(35.50));
    }

    #[test]
    fn monthly_total_is_zero_for_empty_month() {
        let (conn, session) = get_test_connection();

        let total = monthly_total(&session, january(), &conn).unwrap();

        assert_eq!(total, dec!(0));
    }

    #[test]
    fn breakdown_is_ordered_by_total_descending() {
        let (conn, session) = get_test_connection();
        add_january_expenses(&conn, &session);

        let breakdown = monthly_by_category(&session, january(), &conn).unwrap();

        assert_eq!(
            breakdown,
            vec![
                MonthlyCategoryTotal {
                    category: "Transport".to_owned(),
                    total: dec!(20.00),
                },
                MonthlyCategoryTotal {
                    category: "Food".to_owned(),
                    total: dec!(15.50),
                },
            ]
        );
    }

    #[test]
    fn breakdown_ties_are_ordered_by_name() {
        let (conn, session) = get_test_connection();
        add(&conn, &session, "5", "Rent", "2024-01-01");
        add(&conn, &session, "5", "Coffee", "2024-01-02");

        let categories = monthly_by_category(&session, january(), &conn)
            .unwrap()
            .into_iter()
            .map(|row| row.category)
            .collect::<Vec<_>>();

        assert_eq!(categories, vec!["Coffee", "Rent"]);
    }

    #[test]
    fn available_months_are_distinct_and_descending() {
        let (conn, session) = get_test_connection();
        add(&conn, &session, "1", "Food", "2024-01-05");
        add(&conn, &session, "1", "Food", "2024-03-01");
        add(&conn, &session, "1", "Food", "2024-01-20");

        let months = available_months(&session, &conn)
            .unwrap()
            .into_iter()
            .map(|month| month.to_string())
            .collect::<Vec<_>>();

        assert_eq!(months, vec!["2024-03", "2024-01"]);
    }

    #[test]
    fn last_supported_month_is_summarised() {
        let (conn, session) = get_test_connection();
        add(&conn, &session, "7.25", "Food", "9999-12-15");
        let month: YearMonth = "9999-12".parse().unwrap();

        assert_eq!(available_months(&session, &conn).unwrap(), vec![month]);
        assert_eq!(monthly_total(&session, month, &conn).unwrap(), dec!(7.25));
        assert_eq!(
            monthly_by_category(&session, month, &conn).unwrap(),
            vec![MonthlyCategoryTotal {
                category: "Food".to_owned(),
                total: dec!(7.25),
            }]
        );
    }

    #[test]
    fn anonymous_session_is_rejected() {
        let (conn, session) = get_test_connection();
        add_january_expenses(&conn, &session);
        let anonymous = SessionState::Anonymous;

        assert_eq!(
            monthly_total(&anonymous, january(), &conn),
            Err(Error::Unauthenticated)
        );
        assert_eq!(
            monthly_by_category(&anonymous, january(), &conn),
            Err(Error::Unauthenticated)
        );
        assert_eq!(
            available_months(&anonymous, &conn),
            Err(Error::Unauthenticated)
        );
    }
}
