use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn row_to_tag(row: &rusqlite::Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        parent_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn row_to_note(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const TAG_COLUMNS: &str = "id, user_id, name, parent_id, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, user_id, title, body, created_at, updated_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, email, display_name, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.display_name,
                user.password_hash,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, display_name, password_hash, created_at, updated_at
             FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    display_name: row.get(2)?,
                    password_hash: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, display_name, password_hash, created_at, updated_at
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    display_name: row.get(2)?,
                    password_hash: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at
             FROM sessions WHERE token_lookup = ?1",
        )?;

        let rows = stmt.query_map(params![lookup], |row| {
            Ok(Session {
                id: row.get(0)?,
                token_hash: row.get(1)?,
                token_lookup: row.get(2)?,
                user_id: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
                expires_at: row
                    .get::<_, Option<String>>(5)?
                    .map(|s| parse_datetime(&s)),
                last_used_at: row
                    .get::<_, Option<String>>(6)?
                    .map(|s| parse_datetime(&s)),
            })
        })?;

        let sessions: Vec<Session> = rows.collect::<std::result::Result<_, _>>()?;
        match sessions.len() {
            0 => Ok(None),
            1 => Ok(sessions.into_iter().next()),
            _ => Err(Error::SessionLookupCollision),
        }
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = datetime('now') WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    // Tag operations

    fn create_tag(&self, tag: &Tag) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tags (user_id, name, parent_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tag.user_id,
                tag.name,
                tag.parent_id,
                format_datetime(&tag.created_at),
                format_datetime(&tag.updated_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_tag(&self, user_id: &str, id: i64) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 AND id = ?2"),
            params![user_id, id],
            row_to_tag,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_tag_by_name(
        &self,
        user_id: &str,
        parent_id: Option<i64>,
        name: &str,
    ) -> Result<Option<Tag>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT {TAG_COLUMNS} FROM tags
                 WHERE user_id = ?1 AND parent_id IS ?2 AND name = ?3"
            ),
            params![user_id, parent_id, name],
            row_to_tag,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tags(&self, user_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE user_id = ?1 ORDER BY id"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_tag)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_tag(&self, tag: &Tag) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE tags SET name = ?1, parent_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                tag.name,
                tag.parent_id,
                format_datetime(&tag.updated_at),
                tag.id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_tag(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tags WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_tag_reparenting_children(
        &self,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE tags SET parent_id = ?1, updated_at = datetime('now') WHERE parent_id = ?2",
            params![new_parent_id, id],
        )?;
        let rows = tx.execute("DELETE FROM tags WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    fn count_tag_children(&self, id: i64) -> Result<i32> {
        let conn = self.conn();
        conn.query_row(
            "SELECT COUNT(*) FROM tags WHERE parent_id = ?1",
            params![id],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }

    // Note operations

    fn create_note(&self, note: &Note) -> Result<()> {
        self.conn().execute(
            "INSERT INTO notes (id, user_id, title, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.user_id,
                note.title,
                note.body,
                format_datetime(&note.created_at),
                format_datetime(&note.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_note(&self, user_id: &str, id: &str) -> Result<Option<Note>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1 AND id = ?2"),
            params![user_id, id],
            row_to_note,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = ?1 ORDER BY created_at DESC, id"
        ))?;

        let rows = stmt.query_map(params![user_id], row_to_note)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_note(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Note-Tag M2M operations

    fn set_note_tags(&self, note_id: &str, tag_ids: &[i64]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM note_tags WHERE note_id = ?1", params![note_id])?;
        for tag_id in tag_ids {
            tx.execute(
                "INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?1, ?2)",
                params![note_id, tag_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_note_tags(&self, note_id: &str) -> Result<Vec<Tag>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, t.user_id, t.name, t.parent_id, t.created_at, t.updated_at
             FROM tags t
             JOIN note_tags nt ON nt.tag_id = t.id
             WHERE nt.note_id = ?1
             ORDER BY t.id",
        )?;

        let rows = stmt.query_map(params![note_id], row_to_tag)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    use super::*;

    fn open_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp.path().join("test.db")).expect("open store");
        store.initialize().expect("initialize");
        (temp, store)
    }

    fn insert_user(store: &SqliteStore, email: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: "user_test".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            created_at: now,
            updated_at: now,
        };
        store.create_user(&user).expect("create user");
        user
    }

    fn insert_tag(store: &SqliteStore, user: &User, name: &str, parent_id: Option<i64>) -> i64 {
        let now = Utc::now();
        store
            .create_tag(&Tag {
                id: 0,
                user_id: user.id.clone(),
                name: name.to_string(),
                parent_id,
                created_at: now,
                updated_at: now,
            })
            .expect("create tag")
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (_temp, store) = open_store();
        insert_user(&store, "a@example.com");

        let now = Utc::now();
        let dup = User {
            id: Uuid::new_v4().to_string(),
            email: "a@example.com".to_string(),
            display_name: "user_dup".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert!(store.create_user(&dup).is_err());
    }

    #[test]
    fn created_tags_get_sequential_ids_and_list_in_insert_order() {
        let (_temp, store) = open_store();
        let user = insert_user(&store, "a@example.com");

        let first = insert_tag(&store, &user, "work", None);
        let second = insert_tag(&store, &user, "home", None);
        assert!(second > first);

        let tags = store.list_tags(&user.id).expect("list");
        let ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn tags_are_scoped_per_user() {
        let (_temp, store) = open_store();
        let alice = insert_user(&store, "alice@example.com");
        let bob = insert_user(&store, "bob@example.com");

        let id = insert_tag(&store, &alice, "private", None);
        assert!(store.get_tag(&bob.id, id).expect("get").is_none());
        assert!(store.list_tags(&bob.id).expect("list").is_empty());
    }

    #[test]
    fn sibling_lookup_distinguishes_root_from_nested() {
        let (_temp, store) = open_store();
        let user = insert_user(&store, "a@example.com");

        let root = insert_tag(&store, &user, "projects", None);
        insert_tag(&store, &user, "rust", Some(root));

        assert!(
            store
                .get_tag_by_name(&user.id, None, "rust")
                .expect("lookup")
                .is_none()
        );
        assert!(
            store
                .get_tag_by_name(&user.id, Some(root), "rust")
                .expect("lookup")
                .is_some()
        );
    }

    #[test]
    fn delete_with_reparent_moves_children_and_removes_the_tag() {
        let (_temp, store) = open_store();
        let user = insert_user(&store, "a@example.com");

        let root = insert_tag(&store, &user, "root", None);
        let parent = insert_tag(&store, &user, "parent", Some(root));
        let a = insert_tag(&store, &user, "a", Some(parent));
        let b = insert_tag(&store, &user, "b", Some(parent));

        assert!(
            store
                .delete_tag_reparenting_children(parent, Some(root))
                .expect("delete")
        );

        let tags = store.list_tags(&user.id).expect("list");
        assert_eq!(tags.len(), 3);
        assert!(tags.iter().all(|t| t.id != parent));
        assert!(
            tags.iter()
                .filter(|t| t.id == a || t.id == b)
                .all(|t| t.parent_id == Some(root))
        );
    }

    #[test]
    fn delete_with_reparent_reports_unknown_tags() {
        let (_temp, store) = open_store();
        insert_user(&store, "a@example.com");

        assert!(
            !store
                .delete_tag_reparenting_children(9999, None)
                .expect("delete")
        );
    }

    #[test]
    fn deleting_a_tag_keeps_notes_but_drops_assignments() {
        let (_temp, store) = open_store();
        let user = insert_user(&store, "a@example.com");
        let tag_id = insert_tag(&store, &user, "keep", None);

        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            title: "groceries".to_string(),
            body: None,
            created_at: now,
            updated_at: now,
        };
        store.create_note(&note).expect("create note");
        store.set_note_tags(&note.id, &[tag_id]).expect("set tags");
        assert_eq!(store.list_note_tags(&note.id).expect("tags").len(), 1);

        assert!(store.delete_tag(tag_id).expect("delete"));

        let survivor = store.get_note(&user.id, &note.id).expect("get note");
        assert!(survivor.is_some());
        assert!(store.list_note_tags(&note.id).expect("tags").is_empty());
    }
}
