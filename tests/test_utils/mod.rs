pub mod fixtures;

pub use fixtures::{TOKEN, parse_line, scripted_hook};
