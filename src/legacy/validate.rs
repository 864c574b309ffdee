//! Checks run on a fetched instance before anything is written

use std::collections::HashSet;

use crate::entities::{Activity, Customer, Project, User};

use super::model::Snapshot;
use super::LegacyOptions;

/// Every problem that would break the import of `snapshot`
pub fn pre_validate(snapshot: &Snapshot, options: &LegacyOptions) -> Vec<String> {
    let mut messages = Vec::new();

    let mut emails = HashSet::new();
    for user in &snapshot.users {
        let Some(mail) = user.mail.as_deref().filter(|m| !m.trim().is_empty()) else {
            messages.push(format!(
                "User \"{}\" with ID {} has no email",
                user.name, user.id
            ));
            continue;
        };
        if !emails.insert(mail) {
            messages.push(format!(
                "Email \"{}\" for user \"{}\" with ID {} is already used",
                mail, user.name, user.id
            ));
        }
        if let Some(alias) = &user.alias {
            if options.alias_as_account_number
                && alias.chars().count() > User::MAX_ACCOUNT_NUMBER_LEN
            {
                messages.push(format!(
                    "Alias \"{}\" for user \"{}\" with ID {}, which should be used as account number, is longer than {} character",
                    alias, user.name, user.id, User::MAX_ACCOUNT_NUMBER_LEN
                ));
            }
        }
    }

    let customers: HashSet<i64> = snapshot.customers.iter().map(|c| c.id).collect();
    for customer in &snapshot.customers {
        if let Some(length) = too_long(&customer.name, Customer::MAX_NAME_LEN) {
            messages.push(format!(
                "Customer name \"{}\" (ID {}) is too long. Max. {} character are allowed, found {}.",
                customer.name, customer.id, Customer::MAX_NAME_LEN, length
            ));
        }
    }

    for project in &snapshot.projects {
        if !customers.contains(&project.customer_id) {
            messages.push(format!(
                "Project \"{}\" with ID {} has unknown customer with ID {}",
                project.name, project.id, project.customer_id
            ));
        }
        if let Some(length) = too_long(&project.name, Project::MAX_NAME_LEN) {
            messages.push(format!(
                "Project name \"{}\" (ID {}) is too long. Max. {} character are allowed, found {}.",
                project.name, project.id, Project::MAX_NAME_LEN, length
            ));
        }
    }

    for activity in &snapshot.activities {
        if let Some(length) = too_long(&activity.name, Activity::MAX_NAME_LEN) {
            messages.push(format!(
                "Activity name \"{}\" (ID {}) is too long. Max. {} character are allowed, found {}.",
                activity.name, activity.id, Activity::MAX_NAME_LEN, length
            ));
        }
    }

    if !options.skip_error_rates {
        let users: HashSet<i64> = snapshot.users.iter().map(|u| u.id).collect();
        for rate in &snapshot.rates {
            let Some(user) = rate.user_id else { continue };
            if !users.contains(&user) {
                messages.push(format!(
                    "Unknown user with ID \"{}\" found for rate with project \"{}\" and activity \"{}\"",
                    user,
                    optional_id(rate.project_id),
                    optional_id(rate.activity_id)
                ));
            }
        }
    }

    messages
}

fn too_long(name: &str, max: usize) -> Option<usize> {
    let length = name.chars().count();
    (length > max).then_some(length)
}

fn optional_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}
