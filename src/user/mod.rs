//! Registered users and their profile page.

mod core;
mod profile;

pub use core::{
    HashedRegistration, Registration, User, UserID, authenticate, check_password,
    create_registered_user, create_user_table, find_user_for_log_in, get_user_by_id, register,
    update_profile,
};
pub use profile::{get_profile_page, update_profile_endpoint};
