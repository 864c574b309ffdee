//! Per-run entity resolution cache
//!
//! Every importer run owns one [`ResolutionCache`]. Entities are resolved
//! by natural key: first the cache, then the store, and when both miss a
//! new entity is created, validated, counted and (unless dry-run) saved.
//! Entities live in arenas and are handed out as small `Copy` refs, so a
//! project can point at its customer without a saved id.

use std::collections::HashMap;

use crate::core::validation::Validate;
use crate::core::Store;
use crate::entities::user::preference;
use crate::entities::{Activity, Customer, CustomerDefaults, Project, Tag, User};

use super::batch::{EntityCounts, RowFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomerRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserRef(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagRef(usize);

/// Where an activity is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Project(ProjectRef),
}

/// What a row knows about its user
#[derive(Debug, Clone, Default)]
pub struct UserQuery<'a> {
    pub identifier: &'a str,
    pub email: Option<&'a str>,
    pub alias: Option<&'a str>,
    /// Fall back to a display name match
    pub match_alias: bool,
    /// Preferences of a created user
    pub timezone: &'a str,
    pub language: &'a str,
}

impl UserQuery<'_> {
    /// The email to look up, the identifier if it looks like one
    fn lookup_email(&self) -> Option<&str> {
        self.email
            .filter(|e| !e.is_empty())
            .or_else(|| Some(self.identifier).filter(|i| i.contains('@')))
    }
}

pub struct ResolutionCache {
    dry_run: bool,
    defaults: CustomerDefaults,
    customers: Vec<Customer>,
    customer_keys: HashMap<String, CustomerRef>,
    projects: Vec<(Project, CustomerRef)>,
    project_keys: HashMap<(String, CustomerRef), ProjectRef>,
    activities: Vec<Activity>,
    activity_keys: HashMap<(String, Scope), ActivityRef>,
    users: Vec<User>,
    user_keys: HashMap<String, UserRef>,
    tags: Vec<Tag>,
    tag_keys: HashMap<String, TagRef>,
    /// Entities created (or, in a dry run, that would be created)
    pub created: EntityCounts,
}

impl ResolutionCache {
    pub fn new(dry_run: bool, defaults: CustomerDefaults) -> Self {
        Self {
            dry_run,
            defaults,
            customers: Vec::new(),
            customer_keys: HashMap::new(),
            projects: Vec::new(),
            project_keys: HashMap::new(),
            activities: Vec::new(),
            activity_keys: HashMap::new(),
            users: Vec::new(),
            user_keys: HashMap::new(),
            tags: Vec::new(),
            tag_keys: HashMap::new(),
            created: EntityCounts::default(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn defaults(&self) -> &CustomerDefaults {
        &self.defaults
    }

    pub fn customer(&self, r: CustomerRef) -> &Customer {
        &self.customers[r.0]
    }

    pub fn project(&self, r: ProjectRef) -> &Project {
        &self.projects[r.0].0
    }

    /// Customer a cached project belongs to
    pub fn project_customer(&self, r: ProjectRef) -> CustomerRef {
        self.projects[r.0].1
    }

    pub fn activity(&self, r: ActivityRef) -> &Activity {
        &self.activities[r.0]
    }

    pub fn user(&self, r: UserRef) -> &User {
        &self.users[r.0]
    }

    pub fn tag(&self, r: TagRef) -> &Tag {
        &self.tags[r.0]
    }

    /// Customer already resolved in this run
    pub fn cached_customer(&self, name: &str) -> Option<CustomerRef> {
        self.customer_keys.get(name.trim()).copied()
    }

    /// Register a customer under its name, replacing nothing
    pub fn insert_customer(&mut self, customer: Customer) -> CustomerRef {
        let key = customer.name.trim().to_string();
        let r = CustomerRef(self.customers.len());
        self.customers.push(customer);
        self.customer_keys.entry(key).or_insert(r);
        r
    }

    /// Project already resolved in this run
    pub fn cached_project(&self, name: &str, customer: CustomerRef) -> Option<ProjectRef> {
        self.project_keys
            .get(&(name.trim().to_string(), customer))
            .copied()
    }

    pub fn insert_project(&mut self, project: Project, customer: CustomerRef) -> ProjectRef {
        let key = (project.name.trim().to_string(), customer);
        let r = ProjectRef(self.projects.len());
        self.projects.push((project, customer));
        self.project_keys.entry(key).or_insert(r);
        r
    }

    pub fn resolve_customer(
        &mut self,
        store: &mut dyn Store,
        name: &str,
    ) -> Result<CustomerRef, RowFailure> {
        let name = name.trim();
        if let Some(r) = self.cached_customer(name) {
            return Ok(r);
        }

        let customer = match store.find_customer_by_name(name)? {
            Some(found) => found,
            None => {
                let mut customer = Customer::new(name, &self.defaults);
                validated(&customer)?;
                if !self.dry_run {
                    store.save_customer(&mut customer)?;
                }
                self.created.customers += 1;
                tracing::debug!(customer = name, "created customer");
                customer
            }
        };
        Ok(self.insert_customer(customer))
    }

    pub fn resolve_project(
        &mut self,
        store: &mut dyn Store,
        name: &str,
        customer: CustomerRef,
    ) -> Result<ProjectRef, RowFailure> {
        let name = name.trim();
        if let Some(r) = self.cached_project(name, customer) {
            return Ok(r);
        }

        let customer_id = self.customer(customer).id;
        let found = match customer_id {
            Some(id) => store.find_project(name, id)?,
            None => None,
        };
        let project = match found {
            Some(found) => found,
            None => {
                let mut project = Project::new(name, customer_id);
                validated(&project)?;
                if !self.dry_run {
                    store.save_project(&mut project)?;
                }
                self.created.projects += 1;
                tracing::debug!(project = name, "created project");
                project
            }
        };
        Ok(self.insert_project(project, customer))
    }

    pub fn resolve_activity(
        &mut self,
        store: &mut dyn Store,
        name: &str,
        scope: Scope,
    ) -> Result<ActivityRef, RowFailure> {
        let name = name.trim();
        let key = (name.to_string(), scope);
        if let Some(r) = self.activity_keys.get(&key) {
            return Ok(*r);
        }

        let found = match scope {
            Scope::Global => store.find_activity(name, None)?,
            Scope::Project(project) => match self.project(project).id {
                Some(id) => store.find_activity(name, Some(id))?,
                None => None,
            },
        };
        let activity = match found {
            Some(found) => found,
            None => {
                let project_id = match scope {
                    Scope::Global => None,
                    Scope::Project(project) => self.project(project).id,
                };
                let mut activity = Activity::new(name, project_id);
                validated(&activity)?;
                if !self.dry_run {
                    store.save_activity(&mut activity)?;
                }
                self.created.activities += 1;
                tracing::debug!(activity = name, global = scope == Scope::Global, "created activity");
                activity
            }
        };

        let r = ActivityRef(self.activities.len());
        self.activities.push(activity);
        self.activity_keys.insert(key, r);
        Ok(r)
    }

    /// Find a user by email, username and optionally alias
    ///
    /// A missing user is created when the row names an email address.
    pub fn resolve_user(
        &mut self,
        store: &mut dyn Store,
        query: &UserQuery<'_>,
    ) -> Result<UserRef, RowFailure> {
        let identifier = query.identifier.trim();
        if let Some(r) = self.user_keys.get(identifier) {
            return Ok(*r);
        }

        let mut found = match query.lookup_email() {
            Some(email) => store.find_user_by_email(email)?,
            None => None,
        };
        if found.is_none() {
            found = store.find_user_by_username(identifier)?;
        }
        if found.is_none() && query.match_alias {
            found = store.find_user_by_alias(identifier)?;
        }

        let user = match (found, query.lookup_email()) {
            (Some(user), _) => user,
            (None, Some(email)) => {
                let mut user = User::new(identifier, email);
                user.alias = Some(query.alias.unwrap_or(identifier).to_string());
                user.set_preference(preference::TIMEZONE, query.timezone);
                user.set_preference(preference::LANGUAGE, query.language);
                validated(&user)?;
                if !self.dry_run {
                    store.save_user(&mut user)?;
                }
                self.created.users += 1;
                tracing::debug!(user = identifier, "created user");
                user
            }
            (None, None) => {
                return Err(RowFailure::invalid(format!("Unknown user {}", identifier)))
            }
        };

        let r = UserRef(self.users.len());
        self.users.push(user);
        self.user_keys.insert(identifier.to_string(), r);
        Ok(r)
    }

    pub fn resolve_tag(&mut self, store: &mut dyn Store, name: &str) -> Result<TagRef, RowFailure> {
        let name = Tag::normalize_name(name.trim());
        if let Some(r) = self.tag_keys.get(&name) {
            return Ok(*r);
        }

        let tag = match store.find_tag(&name)? {
            Some(found) => found,
            None => {
                let mut tag = Tag::new(&name);
                if !self.dry_run {
                    store.save_tag(&mut tag)?;
                }
                self.created.tags += 1;
                tag
            }
        };

        let r = TagRef(self.tags.len());
        self.tags.push(tag);
        self.tag_keys.insert(name, r);
        Ok(r)
    }
}

/// Reject an entity whose validation reports import errors
pub(super) fn validated(entity: &impl Validate) -> Result<(), RowFailure> {
    let errors = entity.import_errors();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RowFailure::Invalid(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SqliteStore;

    fn query(identifier: &str) -> UserQuery<'_> {
        UserQuery {
            identifier,
            timezone: "Europe/Berlin",
            language: "de",
            ..UserQuery::default()
        }
    }

    #[test]
    fn test_customer_resolution_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());

        let first = cache.resolve_customer(&mut store, "ACME").unwrap();
        let second = cache.resolve_customer(&mut store, " ACME ").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.created.customers, 1);
        assert_eq!(store.writes(), 1);
        assert!(cache.customer(first).id.is_some());
    }

    #[test]
    fn test_existing_customer_is_not_counted() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut existing = Customer::new("ACME", &CustomerDefaults::default());
        store.save_customer(&mut existing).unwrap();

        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());
        let r = cache.resolve_customer(&mut store, "ACME").unwrap();
        assert_eq!(cache.customer(r).id, existing.id);
        assert_eq!(cache.created.customers, 0);
    }

    #[test]
    fn test_same_project_name_under_two_customers() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());
        let acme = cache.resolve_customer(&mut store, "ACME").unwrap();
        let globex = cache.resolve_customer(&mut store, "Globex").unwrap();

        let a = cache.resolve_project(&mut store, "Website", acme).unwrap();
        let b = cache.resolve_project(&mut store, "Website", globex).unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.project_customer(b), globex);
        assert_eq!(cache.created.projects, 2);
    }

    #[test]
    fn test_global_and_project_activities_are_distinct() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());
        let customer = cache.resolve_customer(&mut store, "ACME").unwrap();
        let p1 = cache.resolve_project(&mut store, "P1", customer).unwrap();

        let global = cache
            .resolve_activity(&mut store, "Meeting", Scope::Global)
            .unwrap();
        let scoped = cache
            .resolve_activity(&mut store, "Meeting", Scope::Project(p1))
            .unwrap();
        let again = cache
            .resolve_activity(&mut store, "Meeting", Scope::Project(p1))
            .unwrap();

        assert_ne!(global, scoped);
        assert_eq!(scoped, again);
        assert_eq!(cache.created.activities, 2);
        assert_eq!(cache.activity(global).project_id, None);
        assert_eq!(cache.activity(scoped).project_id, cache.project(p1).id);
    }

    #[test]
    fn test_dry_run_counts_without_writing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(true, CustomerDefaults::default());
        let customer = cache.resolve_customer(&mut store, "ACME").unwrap();
        let project = cache.resolve_project(&mut store, "Web", customer).unwrap();
        cache
            .resolve_activity(&mut store, "Dev", Scope::Project(project))
            .unwrap();
        cache.resolve_tag(&mut store, "urgent").unwrap();

        assert_eq!(cache.created.total(), 4);
        assert_eq!(store.writes(), 0);
        assert!(cache.customer(customer).id.is_none());
    }

    #[test]
    fn test_user_lookup_order_and_creation() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut bob = User::new("bob", "bob@example.com");
        bob.alias = Some("Bob Builder".to_string());
        store.save_user(&mut bob).unwrap();

        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());

        let by_username = cache.resolve_user(&mut store, &query("bob")).unwrap();
        assert_eq!(cache.user(by_username).id, bob.id);

        let plain = query("Bob Builder");
        assert!(matches!(
            cache.resolve_user(&mut store, &plain),
            Err(RowFailure::Invalid(_))
        ));

        let by_alias = UserQuery {
            match_alias: true,
            ..query("Bob Builder")
        };
        let r = cache.resolve_user(&mut store, &by_alias).unwrap();
        assert_eq!(cache.user(r).id, bob.id);

        let new_user = UserQuery {
            email: Some("alice@example.com"),
            ..query("alice")
        };
        let alice = cache.resolve_user(&mut store, &new_user).unwrap();
        let alice = cache.user(alice);
        assert_eq!(alice.alias.as_deref(), Some("alice"));
        assert_eq!(alice.timezone(), Some("Europe/Berlin"));
        assert_eq!(cache.created.users, 1);
    }

    #[test]
    fn test_tags_are_truncated_before_lookup() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());
        let long = "t".repeat(120);
        let a = cache.resolve_tag(&mut store, &long).unwrap();
        let b = cache.resolve_tag(&mut store, &"t".repeat(100)).unwrap();
        assert_eq!(a, b);
        assert_eq!(cache.tag(a).name.chars().count(), 100);
        assert_eq!(cache.created.tags, 1);
    }

    #[test]
    fn test_invalid_new_customer_is_not_cached() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut cache = ResolutionCache::new(false, CustomerDefaults::default());
        let name = "c".repeat(151);
        assert!(matches!(
            cache.resolve_customer(&mut store, &name),
            Err(RowFailure::Invalid(_))
        ));
        assert!(cache.cached_customer(&name).is_none());
        assert_eq!(cache.created.customers, 0);
    }
}
