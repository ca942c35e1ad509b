//! Everything specific to the tmsu command line: command builders, output
//! parsing and the database lookup.

pub mod codec;
pub mod commands;
pub mod database;

pub use codec::{escape_tag, join_tags, parse_root_path, parse_tag_list, parse_tag_names, split_tags, unescape_tag};
pub use commands::{Tmsu, UntagSelection};
pub use database::{find_root, is_database};
