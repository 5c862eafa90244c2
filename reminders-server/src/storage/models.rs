use crate::storage::schema::{reminders, status_checks};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = reminders)]
pub struct Reminder {
    pub id: String,
    pub text: String,
    pub interval_minutes: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = reminders)]
pub struct NewReminder<'a> {
    pub id: &'a str,
    pub text: &'a str,
    pub interval_minutes: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Partial update; `None` columns are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub text: Option<String>,
    pub interval_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(AsChangeset)]
#[diesel(table_name = reminders)]
pub struct ReminderChangeset<'a> {
    pub text: Option<&'a str>,
    pub interval_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = status_checks)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = status_checks)]
pub struct NewStatusCheck<'a> {
    pub id: &'a str,
    pub client_name: &'a str,
    pub timestamp: NaiveDateTime,
}
