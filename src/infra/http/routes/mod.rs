//! Request handlers, grouped by surface.

mod credits;
mod feed;
mod posts;
mod reports;

pub use credits::{balance, daily_login, get_profile, history, update_profile};
pub use feed::{get_feed, refresh_feed};
pub use posts::{list_saved, save_post, share_post, unsave_post};
pub use reports::{create_report, my_reports};
