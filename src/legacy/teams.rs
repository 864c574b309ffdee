//! Legacy groups become teams

use crate::entities::{truncate_chars, Team};

use super::importer::LegacyImporter;
use super::model::Snapshot;
use super::report::InstanceReport;
use super::LegacyError;

/// Membership role of a group leader
const LEADER_ROLE: i64 = 1;

impl LegacyImporter<'_> {
    pub(super) fn import_teams(
        &mut self,
        prefix: &str,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        let groups = self.source.groups(prefix)?;
        let members = self.source.group_members(prefix)?;
        let customers = if self.options.skip_team_customers {
            Vec::new()
        } else {
            self.source
                .group_links(prefix, "groups_customers", "customerID")?
        };
        let projects = if self.options.skip_team_projects {
            Vec::new()
        } else {
            self.source
                .group_links(prefix, "groups_projects", "projectID")?
        };
        let activities = if self.options.skip_team_activities {
            Vec::new()
        } else {
            self.source
                .group_links(prefix, "groups_activities", "activityID")?
        };

        let mut trashed = 0;
        let mut empty = 0;
        for group in &groups {
            if group.trash {
                report.warn(format!(
                    "Skipping team \"{}\" because it is trashed.",
                    group.name
                ));
                trashed += 1;
                continue;
            }
            if self.cache.team_ids.contains_key(&group.id) {
                continue;
            }

            let name = truncate_chars(&group.name, Team::MAX_NAME_LEN);
            let existing = self.cache.teams.iter().position(|t| t.name == name);
            let mut team = existing
                .map(|index| self.cache.teams[index].clone())
                .unwrap_or_else(|| Team::new(name));

            for member in members.iter().filter(|m| m.group_id == group.id) {
                let Some(user) = self.cache.user(member.user_id) else {
                    continue;
                };
                if !team.has_users() || member.membership_role_id == Some(LEADER_ROLE) {
                    team.add_teamlead(user.id);
                } else {
                    team.add_user(user.id);
                }
            }
            if !team.has_users() {
                report.warn(format!(
                    "Didn't import team: {} because it has no users.",
                    group.name
                ));
                empty += 1;
                continue;
            }

            for link in customers.iter().filter(|l| l.group_id == group.id) {
                if let Some(customer) = self.cache.customers.get(&link.target_id) {
                    team.add_customer(*customer);
                }
            }
            for link in projects.iter().filter(|l| l.group_id == group.id) {
                if let Some(project) = self.cache.projects.get(&link.target_id) {
                    team.add_project(project.id, project.customer_id);
                }
            }
            for link in activities.iter().filter(|l| l.group_id == group.id) {
                if let Some(activity) = self.cache.activities.get(&(link.target_id, None)) {
                    team.add_activity(
                        activity.id,
                        activity.project.map(|p| (p.id, p.customer_id)),
                    );
                }
            }

            Self::check(&team, "team", &team.name)?;
            let created = team.id.is_none();
            self.store.save_team(&mut team)?;
            tracing::debug!(team = %team.name, members = team.members.len(), "saved team");
            if created {
                report.counts.teams += 1;
            }

            let index = match existing {
                Some(index) => {
                    self.cache.teams[index] = team;
                    index
                }
                None => {
                    self.cache.teams.push(team);
                    self.cache.teams.len() - 1
                }
            };
            self.cache.team_ids.insert(group.id, index);
        }

        if trashed > 0 {
            report.warn(format!("Skipped teams because they are trashed: {}", trashed));
        }
        if empty > 0 {
            report.warn(format!("Skipped teams because they have no users: {}", empty));
        }
        Ok(())
    }

    /// One team for all users of the instance, granting the global activities
    pub(super) fn create_instance_team(
        &mut self,
        prefix: &str,
        snapshot: &Snapshot,
        report: &mut InstanceReport,
    ) -> Result<(), LegacyError> {
        let mut team = Team::new(truncate_chars(prefix, Team::MAX_NAME_LEN));
        for old in &snapshot.users {
            let Some(user) = self.cache.user(old.id) else {
                continue;
            };
            if team.has_users() {
                team.add_user(user.id);
            } else {
                team.add_teamlead(user.id);
            }
        }
        if !team.has_users() {
            return Ok(());
        }

        let mut global: Vec<i64> = self
            .cache
            .activities
            .iter()
            .filter(|((_, project), _)| project.is_none())
            .map(|(_, activity)| activity.id)
            .collect();
        global.sort_unstable();
        for activity in global {
            team.add_activity(activity, None);
        }

        Self::check(&team, "team", &team.name)?;
        self.store.save_team(&mut team)?;
        tracing::debug!(team = %team.name, "created instance team");
        report.counts.teams += 1;
        self.cache.teams.push(team);
        Ok(())
    }
}
