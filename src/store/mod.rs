mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;

    // Tag operations (adjacency list, scoped per user)
    fn create_tag(&self, tag: &Tag) -> Result<i64>;
    fn get_tag(&self, user_id: &str, id: i64) -> Result<Option<Tag>>;
    fn get_tag_by_name(&self, user_id: &str, parent_id: Option<i64>, name: &str)
    -> Result<Option<Tag>>;
    fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>>;
    fn update_tag(&self, tag: &Tag) -> Result<()>;
    fn delete_tag(&self, id: i64) -> Result<bool>;
    /// Deletes a tag and moves its direct children to `new_parent_id`, as one
    /// transaction.
    fn delete_tag_reparenting_children(&self, id: i64, new_parent_id: Option<i64>)
    -> Result<bool>;
    fn count_tag_children(&self, id: i64) -> Result<i32>;

    // Note operations
    fn create_note(&self, note: &Note) -> Result<()>;
    fn get_note(&self, user_id: &str, id: &str) -> Result<Option<Note>>;
    fn list_notes(&self, user_id: &str) -> Result<Vec<Note>>;
    fn delete_note(&self, id: &str) -> Result<bool>;

    // Note-Tag M2M operations
    fn set_note_tags(&self, note_id: &str, tag_ids: &[i64]) -> Result<()>;
    fn list_note_tags(&self, note_id: &str) -> Result<Vec<Tag>>;

    fn close(&self) -> Result<()>;
}
