//! Teams group users and grant them access to customers, projects and activities

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamMember {
    pub user_id: i64,
    pub teamlead: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Team {
    pub id: Option<i64>,
    pub name: String,
    pub members: Vec<TeamMember>,
    pub customers: Vec<i64>,
    pub projects: Vec<i64>,
    pub activities: Vec<i64>,
}

impl Team {
    pub const MAX_NAME_LEN: usize = 100;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_users(&self) -> bool {
        !self.members.is_empty()
    }

    pub fn has_teamleads(&self) -> bool {
        self.members.iter().any(|m| m.teamlead)
    }

    pub fn add_user(&mut self, user_id: i64) {
        if !self.members.iter().any(|m| m.user_id == user_id) {
            self.members.push(TeamMember {
                user_id,
                teamlead: false,
            });
        }
    }

    /// Add `user_id` as member (if needed) and promote it to team lead
    pub fn add_teamlead(&mut self, user_id: i64) {
        self.add_user(user_id);
        for member in self.members.iter_mut().filter(|m| m.user_id == user_id) {
            member.teamlead = true;
        }
    }

    pub fn add_customer(&mut self, customer_id: i64) {
        push_unique(&mut self.customers, customer_id);
    }

    /// Adding a project also grants its customer
    pub fn add_project(&mut self, project_id: i64, customer_id: i64) {
        push_unique(&mut self.projects, project_id);
        self.add_customer(customer_id);
    }

    /// Adding a project activity also grants its project and that project's customer
    pub fn add_activity(&mut self, activity_id: i64, project: Option<(i64, i64)>) {
        push_unique(&mut self.activities, activity_id);
        if let Some((project_id, customer_id)) = project {
            self.add_project(project_id, customer_id);
        }
    }
}

fn push_unique(ids: &mut Vec<i64>, id: i64) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}
