use crate::Database;
use crate::models::{CredentialRow, IdeaFields, IdeaRow, MessageRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

/// Ideas are always read joined with their owner.
const IDEA_SELECT: &str = "SELECT i.id, i.user_id, i.title, i.domain, i.problem, i.solution, \
     i.stage, i.funding_amount, i.created_at, u.display_name, u.email \
     FROM ideas i \
     JOIN users u ON i.user_id = u.id";

/// Messages are always read joined with both participants and the idea.
const MESSAGE_SELECT: &str = "SELECT m.id, m.sender_id, m.receiver_id, m.idea_id, m.body, m.created_at, \
     s.display_name, s.email, r.display_name, r.email, i.title, i.domain \
     FROM messages m \
     JOIN users s ON m.sender_id = s.id \
     JOIN users r ON m.receiver_id = r.id \
     JOIN ideas i ON m.idea_id = i.id";

impl Database {
    // -- Users --

    /// Returns false when the email is already registered (UNIQUE violation).
    /// The unique index is the authority; there is no racy pre-check.
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (id, email, password, display_name) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, display_name),
            ) {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_credentials_by_email(&self, email: &str) -> Result<Option<CredentialRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, password, display_name FROM users WHERE email = ?1",
                [email],
                |row| {
                    Ok(CredentialRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password: row.get(2)?,
                        display_name: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, display_name, domain, bio, created_at FROM users WHERE id = ?1",
                [id],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        display_name: row.get(2)?,
                        domain: row.get(3)?,
                        bio: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Unconditional overwrite of the mutable profile fields. Returns the
    /// affected-row count; 0 means the user id does not exist.
    pub fn update_profile(
        &self,
        id: &str,
        display_name: &str,
        domain: Option<&str>,
        bio: Option<&str>,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE users SET display_name = ?1, domain = ?2, bio = ?3 WHERE id = ?4",
                (display_name, domain, bio, id),
            )?;
            Ok(rows)
        })
    }

    // -- Ideas --

    pub fn insert_idea(&self, id: &str, user_id: &str, fields: &IdeaFields) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ideas (id, user_id, title, domain, problem, solution, stage, funding_amount) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                (
                    id,
                    user_id,
                    fields.title,
                    fields.domain,
                    fields.problem,
                    fields.solution,
                    fields.stage,
                    fields.funding_amount,
                ),
            )?;
            Ok(())
        })
    }

    pub fn list_ideas(&self) -> Result<Vec<IdeaRow>> {
        self.with_conn(|conn| {
            query_ideas(conn, &format!("{IDEA_SELECT} ORDER BY i.created_at DESC"), ())
        })
    }

    pub fn list_ideas_by_user(&self, user_id: &str) -> Result<Vec<IdeaRow>> {
        self.with_conn(|conn| {
            query_ideas(
                conn,
                &format!("{IDEA_SELECT} WHERE i.user_id = ?1 ORDER BY i.created_at DESC"),
                [user_id],
            )
        })
    }

    pub fn get_idea(&self, id: &str) -> Result<Option<IdeaRow>> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{IDEA_SELECT} WHERE i.id = ?1"), [id], map_idea)
                .optional()
        })
    }

    pub fn get_idea_owner(&self, id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT user_id FROM ideas WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    /// Conditional overwrite filtered by id AND owner in a single statement,
    /// so an ownership change cannot slip in between a check and the write.
    /// Returns the affected-row count: 0 means missing idea or wrong owner.
    pub fn update_idea(&self, id: &str, owner_id: &str, fields: &IdeaFields) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "UPDATE ideas SET title = ?1, domain = ?2, problem = ?3, solution = ?4, \
                 stage = ?5, funding_amount = ?6 \
                 WHERE id = ?7 AND user_id = ?8",
                (
                    fields.title,
                    fields.domain,
                    fields.problem,
                    fields.solution,
                    fields.stage,
                    fields.funding_amount,
                    id,
                    owner_id,
                ),
            )?;
            Ok(rows)
        })
    }

    /// Same conditional pattern as `update_idea`. Cascades to the idea's
    /// messages.
    pub fn delete_idea(&self, id: &str, owner_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "DELETE FROM ideas WHERE id = ?1 AND user_id = ?2",
                (id, owner_id),
            )?;
            Ok(rows)
        })
    }

    /// Owned-idea count, received-message count and the most recent owned
    /// ideas, read under a single lock acquisition so the three figures come
    /// from one snapshot relative to writers.
    pub fn dashboard(&self, user_id: &str, recent_limit: u32) -> Result<(i64, i64, Vec<IdeaRow>)> {
        self.with_conn(|conn| {
            let total_ideas: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ideas WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            let total_messages: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;

            let recent = query_ideas(
                conn,
                &format!("{IDEA_SELECT} WHERE i.user_id = ?1 ORDER BY i.created_at DESC LIMIT ?2"),
                rusqlite::params![user_id, recent_limit],
            )?;

            Ok((total_ideas, total_messages, recent))
        })
    }

    // -- Messages --

    /// Returns false when a referenced user or idea does not exist (foreign
    /// key violation). Messages are immutable once inserted.
    pub fn insert_message(
        &self,
        id: &str,
        sender_id: &str,
        receiver_id: &str,
        idea_id: &str,
        body: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO messages (id, sender_id, receiver_id, idea_id, body) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, sender_id, receiver_id, idea_id, body),
            ) {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn inbox_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!("{MESSAGE_SELECT} WHERE m.receiver_id = ?1 ORDER BY m.created_at DESC"),
                [user_id],
            )
        })
    }

    pub fn sent_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!("{MESSAGE_SELECT} WHERE m.sender_id = ?1 ORDER BY m.created_at DESC"),
                [user_id],
            )
        })
    }

    /// Thread view: every message on the idea where the user participates,
    /// oldest first.
    pub fn idea_thread(&self, idea_id: &str, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            query_messages(
                conn,
                &format!(
                    "{MESSAGE_SELECT} WHERE m.idea_id = ?1 AND (m.sender_id = ?2 OR m.receiver_id = ?2) \
                     ORDER BY m.created_at ASC"
                ),
                [idea_id, user_id],
            )
        })
    }
}

fn query_ideas<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<IdeaRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_idea)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_messages<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_message)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_idea(row: &rusqlite::Row) -> rusqlite::Result<IdeaRow> {
    Ok(IdeaRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        domain: row.get(3)?,
        problem: row.get(4)?,
        solution: row.get(5)?,
        stage: row.get(6)?,
        funding_amount: row.get(7)?,
        created_at: row.get(8)?,
        owner_name: row.get(9)?,
        owner_email: row.get(10)?,
    })
}

fn map_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        idea_id: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get(5)?,
        sender_name: row.get(6)?,
        sender_email: row.get(7)?,
        receiver_name: row.get(8)?,
        receiver_email: row.get(9)?,
        idea_title: row.get(10)?,
        idea_domain: row.get(11)?,
    })
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == rusqlite::ErrorCode::ConstraintViolation)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, id: &str, email: &str, name: &str) {
        assert!(db.create_user(id, email, "hash", name).unwrap());
    }

    fn fields<'a>(title: &'a str, stage: &'a str, funding: f64) -> IdeaFields<'a> {
        IdeaFields {
            title,
            domain: "EdTech",
            problem: "P",
            solution: "S",
            stage,
            funding_amount: funding,
        }
    }

    fn set_created_at(db: &Database, table: &str, id: &str, ts: &str) {
        db.with_conn(|conn| {
            conn.execute(
                &format!("UPDATE {table} SET created_at = ?1 WHERE id = ?2"),
                (ts, id),
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_email_rejected() {
        let db = test_db();
        assert!(db.create_user("u1", "alice@x.com", "h1", "alice").unwrap());
        assert!(!db.create_user("u2", "alice@x.com", "h2", "alice2").unwrap());

        // The first registration is untouched
        let creds = db.get_credentials_by_email("alice@x.com").unwrap().unwrap();
        assert_eq!(creds.id, "u1");
        assert_eq!(creds.password, "h1");
    }

    #[test]
    fn unknown_email_yields_none() {
        let db = test_db();
        assert!(db.get_credentials_by_email("nobody@x.com").unwrap().is_none());
        assert!(db.get_user_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn idea_roundtrip_with_owner_join() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        db.insert_idea("i1", "u1", &fields("X", "Idea", 0.0)).unwrap();

        let idea = db.get_idea("i1").unwrap().unwrap();
        assert_eq!(idea.user_id, "u1");
        assert_eq!(idea.title, "X");
        assert_eq!(idea.domain, "EdTech");
        assert_eq!(idea.problem, "P");
        assert_eq!(idea.solution, "S");
        assert_eq!(idea.stage, "Idea");
        assert_eq!(idea.funding_amount, 0.0);
        assert_eq!(idea.owner_name, "alice");
        assert_eq!(idea.owner_email, "alice@x.com");
        assert!(!idea.created_at.is_empty());

        assert!(db.get_idea("missing").unwrap().is_none());
    }

    #[test]
    fn listings_are_newest_first_and_scoped_to_owner() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");
        db.insert_idea("i1", "u1", &fields("first", "Idea", 0.0)).unwrap();
        db.insert_idea("i2", "u2", &fields("second", "MVP", 10.0)).unwrap();
        db.insert_idea("i3", "u1", &fields("third", "Revenue", 5.0)).unwrap();
        set_created_at(&db, "ideas", "i1", "2026-01-01 10:00:00");
        set_created_at(&db, "ideas", "i2", "2026-01-02 10:00:00");
        set_created_at(&db, "ideas", "i3", "2026-01-03 10:00:00");

        let all: Vec<String> = db.list_ideas().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(all, vec!["i3", "i2", "i1"]);

        let alices: Vec<String> = db
            .list_ideas_by_user("u1")
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(alices, vec!["i3", "i1"]);
    }

    #[test]
    fn update_requires_matching_owner() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");
        db.insert_idea("i1", "u1", &fields("X", "Idea", 0.0)).unwrap();
        let before = db.get_idea("i1").unwrap().unwrap();

        // Non-owner: no rows touched, idea unchanged
        assert_eq!(db.update_idea("i1", "u2", &fields("stolen", "MVP", 99.0)).unwrap(), 0);
        let after = db.get_idea("i1").unwrap().unwrap();
        assert_eq!(after.title, "X");
        assert_eq!(after.stage, "Idea");

        // Missing idea
        assert_eq!(db.update_idea("missing", "u1", &fields("Y", "MVP", 1.0)).unwrap(), 0);
        assert!(db.get_idea_owner("missing").unwrap().is_none());

        // Owner: overwrite, but owner and created_at stay fixed
        assert_eq!(db.update_idea("i1", "u1", &fields("Y", "MVP", 1.0)).unwrap(), 1);
        let updated = db.get_idea("i1").unwrap().unwrap();
        assert_eq!(updated.title, "Y");
        assert_eq!(updated.stage, "MVP");
        assert_eq!(updated.funding_amount, 1.0);
        assert_eq!(updated.user_id, "u1");
        assert_eq!(updated.created_at, before.created_at);
        assert_eq!(db.get_idea_owner("i1").unwrap().as_deref(), Some("u1"));
    }

    #[test]
    fn delete_requires_owner_and_cascades_to_messages() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");
        db.insert_idea("i1", "u1", &fields("X", "Idea", 0.0)).unwrap();
        assert!(db.insert_message("m1", "u2", "u1", "i1", "hi").unwrap());

        assert_eq!(db.delete_idea("i1", "u2").unwrap(), 0);
        assert!(db.get_idea("i1").unwrap().is_some());

        assert_eq!(db.delete_idea("i1", "u1").unwrap(), 1);
        assert!(db.get_idea("i1").unwrap().is_none());

        let remaining: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn message_requires_existing_references() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");
        db.insert_idea("i1", "u1", &fields("X", "Idea", 0.0)).unwrap();

        assert!(!db.insert_message("m1", "u2", "u1", "no-such-idea", "hi").unwrap());
        assert!(!db.insert_message("m2", "u2", "no-such-user", "i1", "hi").unwrap());
        assert!(db.insert_message("m3", "u2", "u1", "i1", "hi").unwrap());
    }

    #[test]
    fn inbox_sent_and_thread_views() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");
        add_user(&db, "u3", "carol@x.com", "carol");
        db.insert_idea("i1", "u1", &fields("X", "Idea", 0.0)).unwrap();

        assert!(db.insert_message("m1", "u2", "u1", "i1", "interested!").unwrap());
        assert!(db.insert_message("m2", "u1", "u2", "i1", "great, call me").unwrap());
        assert!(db.insert_message("m3", "u3", "u1", "i1", "me too").unwrap());
        set_created_at(&db, "messages", "m1", "2026-01-01 10:00:00");
        set_created_at(&db, "messages", "m2", "2026-01-02 10:00:00");
        set_created_at(&db, "messages", "m3", "2026-01-03 10:00:00");

        // Alice's inbox: m1 and m3, newest first, joined with sender + idea
        let inbox = db.inbox_messages("u1").unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, "m3");
        assert_eq!(inbox[0].sender_name, "carol");
        assert_eq!(inbox[1].id, "m1");
        assert_eq!(inbox[1].sender_name, "bob");
        assert_eq!(inbox[1].sender_email, "bob@x.com");
        assert_eq!(inbox[1].idea_title, "X");
        assert_eq!(inbox[1].idea_domain, "EdTech");

        // Bob's sent: just m1, joined with receiver
        let sent = db.sent_messages("u2").unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, "m1");
        assert_eq!(sent[0].receiver_name, "alice");
        assert_eq!(sent[0].receiver_email, "alice@x.com");

        // Thread for bob on idea i1: only the exchange he participates in,
        // oldest first
        let bob_thread = db.idea_thread("i1", "u2").unwrap();
        let ids: Vec<&str> = bob_thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2"]);
        assert_eq!(bob_thread[0].sender_name, "bob");
        assert_eq!(bob_thread[0].receiver_name, "alice");
        assert_eq!(bob_thread[0].idea_title, "X");

        // Alice participates in everything on her idea
        let alice_thread = db.idea_thread("i1", "u1").unwrap();
        assert_eq!(alice_thread.len(), 3);
    }

    #[test]
    fn dashboard_counts_match_listings() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");
        add_user(&db, "u2", "bob@x.com", "bob");

        for n in 1..=6 {
            let id = format!("i{n}");
            db.insert_idea(&id, "u1", &fields("idea", "Idea", 0.0)).unwrap();
            set_created_at(&db, "ideas", &id, &format!("2026-01-0{n} 10:00:00"));
        }
        db.insert_idea("ib", "u2", &fields("bobs", "MVP", 0.0)).unwrap();

        assert!(db.insert_message("m1", "u2", "u1", "i1", "hi").unwrap());
        assert!(db.insert_message("m2", "u2", "u1", "i2", "hello").unwrap());
        // Sent by alice, must not count towards her received total
        assert!(db.insert_message("m3", "u1", "u2", "ib", "hey").unwrap());

        let (total_ideas, total_messages, recent) = db.dashboard("u1", 5).unwrap();
        assert_eq!(total_ideas, db.list_ideas_by_user("u1").unwrap().len() as i64);
        assert_eq!(total_ideas, 6);
        assert_eq!(total_messages, 2);

        let ids: Vec<&str> = recent.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i6", "i5", "i4", "i3", "i2"]);
        assert_eq!(recent[0].owner_name, "alice");
    }

    #[test]
    fn profile_update_is_unconditional() {
        let db = test_db();
        add_user(&db, "u1", "alice@x.com", "alice");

        assert_eq!(db.update_profile("missing", "ghost", None, None).unwrap(), 0);

        assert_eq!(
            db.update_profile("u1", "Alice W.", Some("FinTech"), Some("hi there")).unwrap(),
            1
        );
        let user = db.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(user.display_name, "Alice W.");
        assert_eq!(user.domain.as_deref(), Some("FinTech"));
        assert_eq!(user.bio.as_deref(), Some("hi there"));
        // Email is immutable post-registration
        assert_eq!(user.email, "alice@x.com");
    }
}
