//! Data-quality fixes applied to fetched legacy rows
//!
//! The source database is opened read-only, so every fix works on the
//! in-memory copy of a row.

use super::model::{OldTimesheet, Snapshot};

/// Mis-encoded sequences of common German characters and their repair
const ENCODING_FIXES: &[(&str, &str)] = &[
    ("Ã¤", "ä"),
    ("Ã„", "Ä"),
    ("Ã¼", "ü"),
    ("Ãœ", "Ü"),
    ("Ã¶", "ö"),
    ("Ã–", "Ö"),
    ("ÃŸ", "ß"),
    ("â¦", "-"),
];

/// Repair known broken UTF-8 sequences in `value`
pub fn fix_text(value: &mut String) {
    for (broken, fixed) in ENCODING_FIXES {
        if value.contains(broken) {
            *value = value.replace(broken, fixed);
        }
    }
}

fn fix_optional(value: &mut Option<String>) {
    if let Some(value) = value {
        fix_text(value);
    }
}

/// Give users without email the address `lower(name)_import@domain`
///
/// Returns the number of users that got an address.
pub fn fix_emails(snapshot: &mut Snapshot, domain: &str) -> usize {
    let mut fixed = 0;
    for user in snapshot
        .users
        .iter_mut()
        .filter(|u| u.mail.as_deref().map_or(true, |m| m.trim().is_empty()))
    {
        let mail = format!("{}_import@{}", user.name.to_lowercase(), domain);
        tracing::warn!(user = %user.name, %mail, "user without email");
        user.mail = Some(mail);
        fixed += 1;
    }
    fixed
}

/// Repair names and comments of users, customers, projects and activities
pub fn fix_encoding(snapshot: &mut Snapshot) {
    for user in &mut snapshot.users {
        fix_text(&mut user.name);
        fix_optional(&mut user.alias);
    }
    for customer in &mut snapshot.customers {
        fix_text(&mut customer.name);
        fix_optional(&mut customer.comment);
    }
    for project in &mut snapshot.projects {
        fix_text(&mut project.name);
        fix_optional(&mut project.comment);
    }
    for activity in &mut snapshot.activities {
        fix_text(&mut activity.name);
        fix_optional(&mut activity.comment);
    }
}

pub fn fix_timesheet_encoding(record: &mut OldTimesheet) {
    fix_optional(&mut record.comment);
    fix_optional(&mut record.description);
    fix_optional(&mut record.location);
    fix_optional(&mut record.tracking_number);
}

/// Records ending before they start become zero-length records without rate
///
/// Returns whether the record was changed.
pub fn fix_timesheet(record: &mut OldTimesheet) -> bool {
    match record.end {
        Some(end) if record.start > end => {
            tracing::warn!(record = record.id, "timesheet ends before it starts");
            record.end = Some(record.start);
            record.rate = Some(0.0);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::model::OldUser;

    fn user(name: &str, mail: Option<&str>) -> OldUser {
        OldUser {
            id: 1,
            name: name.to_string(),
            alias: None,
            mail: mail.map(str::to_string),
            active: true,
            trash: false,
            ban: false,
            global_role_id: None,
        }
    }

    fn record(start: i64, end: Option<i64>) -> OldTimesheet {
        OldTimesheet {
            id: 7,
            start,
            end,
            user_id: 1,
            project_id: 1,
            activity_id: 1,
            description: None,
            comment: Some("FÃ¼r Kunde".to_string()),
            cleared: false,
            location: None,
            tracking_number: None,
            rate: Some(50.0),
            fixed_rate: None,
        }
    }

    #[test]
    fn test_fix_text() {
        let mut value = "GrÃ¶ÃŸe und Ã„nderung".to_string();
        fix_text(&mut value);
        assert_eq!(value, "Größe und Änderung");
    }

    #[test]
    fn test_fix_emails_only_touches_empty_addresses() {
        let mut snapshot = Snapshot {
            users: vec![user("Admin", Some("")), user("bob", Some("bob@x.com")), user("Eve", None)],
            ..Snapshot::default()
        };
        assert_eq!(fix_emails(&mut snapshot, "example.org"), 2);
        let mails: Vec<_> = snapshot.users.iter().map(|u| u.mail.clone().unwrap()).collect();
        assert_eq!(
            mails,
            vec!["admin_import@example.org", "bob@x.com", "eve_import@example.org"]
        );
    }

    #[test]
    fn test_fix_timesheet() {
        let mut broken = record(2000, Some(1000));
        assert!(fix_timesheet(&mut broken));
        assert_eq!(broken.end, Some(2000));
        assert_eq!(broken.rate, Some(0.0));

        let mut fine = record(1000, Some(2000));
        assert!(!fix_timesheet(&mut fine));
        let mut running = record(1000, None);
        assert!(!fix_timesheet(&mut running));
    }

    #[test]
    fn test_fix_timesheet_encoding() {
        let mut broken = record(1000, Some(2000));
        fix_timesheet_encoding(&mut broken);
        assert_eq!(broken.comment.as_deref(), Some("Für Kunde"));
    }
}
