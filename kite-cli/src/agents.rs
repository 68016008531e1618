use kite::Agent;

/// Ordered agent list with a highlight cursor.
///
/// Moving the cursor is a non-committing "focus" change (used to preview the
/// hovered agent's sessions); the caller decides when a selection commits.
pub struct AgentList {
    agents: Vec<Agent>,
    index: usize,
}

impl AgentList {
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            index: 0,
        }
    }

    /// Replace the whole agent set. Sorts by case-insensitive display name,
    /// moves the cursor to the top, and returns the newly selected agent.
    pub fn set_agents(&mut self, mut agents: Vec<Agent>) -> Option<Agent> {
        agents.sort_by_key(|a| a.display_name().to_lowercase());
        self.agents = agents;
        self.index = 0;
        self.current().cloned()
    }

    /// Agent under the cursor. Bounds are checked here rather than assumed:
    /// an out-of-range cursor resolves to no agent, never a panic.
    pub fn current(&self) -> Option<&Agent> {
        self.agents.get(self.index)
    }

    /// Move the highlight down; returns the newly focused agent.
    pub fn select_next(&mut self) -> Option<&Agent> {
        if self.agents.is_empty() {
            return None;
        }
        self.index = (self.index + 1).min(self.agents.len() - 1);
        self.current()
    }

    /// Move the highlight up; returns the newly focused agent.
    pub fn select_prev(&mut self) -> Option<&Agent> {
        if self.agents.is_empty() {
            return None;
        }
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str) -> Agent {
        Agent::new(id, "default", id, "")
    }

    #[test]
    fn set_agents_sorts_case_insensitively_and_selects_first() {
        let mut list = AgentList::new();
        let selected = list.set_agents(vec![
            agent("Zulu_agent"),
            agent("alpha_agent"),
            agent("Mike_agent"),
        ]);
        let names: Vec<String> = list.agents().iter().map(|a| a.display_name()).collect();
        assert_eq!(names, vec!["alpha", "Mike", "Zulu"]);
        assert_eq!(selected.map(|a| a.display_name()).as_deref(), Some("alpha"));
        assert_eq!(list.index(), 0);
    }

    #[test]
    fn empty_list_has_no_current_agent() {
        let mut list = AgentList::new();
        assert!(list.set_agents(Vec::new()).is_none());
        assert!(list.current().is_none());
        assert!(list.select_next().is_none());
        assert!(list.select_prev().is_none());
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut list = AgentList::new();
        list.set_agents(vec![agent("a"), agent("b")]);
        assert_eq!(list.select_prev().map(|a| a.display_name()).as_deref(), Some("a"));
        list.select_next();
        assert_eq!(list.select_next().map(|a| a.display_name()).as_deref(), Some("b"));
        assert_eq!(list.index(), 1);
    }

    #[test]
    fn out_of_range_cursor_resolves_to_none() {
        let mut list = AgentList::new();
        list.set_agents(vec![agent("a")]);
        list.index = 5;
        assert!(list.current().is_none());
    }
}
