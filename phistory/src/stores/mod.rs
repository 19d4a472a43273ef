mod json_file;
mod sqlite;

pub use json_file::JsonFileHistoryStore;
pub use sqlite::SqliteHistoryStore;
