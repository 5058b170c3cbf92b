/// Database row types — these map directly to SQLite rows.
/// Distinct from innohub-types API models to keep the DB layer independent.

/// Only the login query reads the password hash; everything else goes
/// through `UserRow`, which never carries it.
#[derive(Debug)]
pub struct CredentialRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
}

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub domain: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// The client-mutable idea columns, shared by insert and the
/// owner-conditional update. Owner and created_at are never written through
/// this.
pub struct IdeaFields<'a> {
    pub title: &'a str,
    pub domain: &'a str,
    pub problem: &'a str,
    pub solution: &'a str,
    pub stage: &'a str,
    pub funding_amount: f64,
}

/// Idea joined with its owner's display name and email.
pub struct IdeaRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub domain: String,
    pub problem: String,
    pub solution: String,
    pub stage: String,
    pub funding_amount: f64,
    pub created_at: String,
    pub owner_name: String,
    pub owner_email: String,
}

/// Message joined with both participants and the idea it references. The
/// inbox, sent and thread views each surface a subset of these columns.
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub idea_id: String,
    pub body: String,
    pub created_at: String,
    pub sender_name: String,
    pub sender_email: String,
    pub receiver_name: String,
    pub receiver_email: String,
    pub idea_title: String,
    pub idea_domain: String,
}
