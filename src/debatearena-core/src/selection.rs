//! Agent selection for the two debate slots.
//!
//! The first slot argues for the topic, the second against. Both slots are
//! always bound, and never to the same agent.

use crate::agent::{Agent, AgentCatalog};
use crate::error::DebateError;

/// Which side of the debate a slot represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn display_name(&self) -> &str {
        match self {
            Slot::First => "FOR",
            Slot::Second => "AGAINST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentSelection {
    catalog: AgentCatalog,
    first: Agent,
    second: Agent,
    first_menu_open: bool,
    second_menu_open: bool,
}

impl AgentSelection {
    /// Bind the first two catalog agents to the two slots.
    pub fn new(catalog: AgentCatalog) -> Self {
        let first = catalog.agents()[0].clone();
        let second = catalog.agents()[1].clone();
        Self {
            catalog,
            first,
            second,
            first_menu_open: false,
            second_menu_open: false,
        }
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    pub fn first(&self) -> &Agent {
        &self.first
    }

    pub fn second(&self) -> &Agent {
        &self.second
    }

    /// Every catalog agent except the one bound to the second slot.
    pub fn available_for_first(&self) -> Vec<Agent> {
        self.available_excluding(&self.second)
    }

    /// Every catalog agent except the one bound to the first slot.
    pub fn available_for_second(&self) -> Vec<Agent> {
        self.available_excluding(&self.first)
    }

    fn available_excluding(&self, taken: &Agent) -> Vec<Agent> {
        self.catalog
            .agents()
            .iter()
            .filter(|a| a.id != taken.id)
            .cloned()
            .collect()
    }

    pub fn select_first(&mut self, agent: &Agent) -> Result<(), DebateError> {
        self.select(Slot::First, agent)
    }

    pub fn select_second(&mut self, agent: &Agent) -> Result<(), DebateError> {
        self.select(Slot::Second, agent)
    }

    /// Bind `agent` to `slot` and close that slot's menu.
    ///
    /// Rejected without any state change when the other slot already holds
    /// the same agent.
    pub fn select(&mut self, slot: Slot, agent: &Agent) -> Result<(), DebateError> {
        let resolved = self.resolve(agent)?;

        let other = match slot {
            Slot::First => &self.second,
            Slot::Second => &self.first,
        };
        if *other == resolved {
            return Err(DebateError::SelectionConflict {
                agent: resolved.name,
            });
        }

        match slot {
            Slot::First => {
                self.first = resolved;
                self.first_menu_open = false;
            }
            Slot::Second => {
                self.second = resolved;
                self.second_menu_open = false;
            }
        }
        Ok(())
    }

    /// Select by id or display name.
    pub fn select_by_key(&mut self, slot: Slot, key: &str) -> Result<(), DebateError> {
        let agent = self.find_key(key)?;
        self.select(slot, &agent)
    }

    /// Bind both slots at once and close both menus.
    ///
    /// Only the resulting pair is checked, so the agents may trade places.
    pub fn select_pair(&mut self, first: &Agent, second: &Agent) -> Result<(), DebateError> {
        let first = self.resolve(first)?;
        let second = self.resolve(second)?;
        if first == second {
            return Err(DebateError::SelectionConflict { agent: first.name });
        }

        self.first = first;
        self.second = second;
        self.first_menu_open = false;
        self.second_menu_open = false;
        Ok(())
    }

    /// Pair selection by id or display name. A missing key keeps that slot.
    pub fn select_pair_by_key(
        &mut self,
        first: Option<&str>,
        second: Option<&str>,
    ) -> Result<(), DebateError> {
        let first = match first {
            Some(key) => self.find_key(key)?,
            None => self.first.clone(),
        };
        let second = match second {
            Some(key) => self.find_key(key)?,
            None => self.second.clone(),
        };
        self.select_pair(&first, &second)
    }

    fn resolve(&self, agent: &Agent) -> Result<Agent, DebateError> {
        self.catalog
            .agents()
            .iter()
            .find(|a| a.id == agent.id)
            .cloned()
            .ok_or_else(|| DebateError::UnknownAgent(agent.id.clone()))
    }

    fn find_key(&self, key: &str) -> Result<Agent, DebateError> {
        self.catalog
            .find(key)
            .cloned()
            .ok_or_else(|| DebateError::UnknownAgent(key.to_string()))
    }

    pub fn toggle_menu(&mut self, slot: Slot) {
        match slot {
            Slot::First => self.first_menu_open = !self.first_menu_open,
            Slot::Second => self.second_menu_open = !self.second_menu_open,
        }
    }

    pub fn is_menu_open(&self, slot: Slot) -> bool {
        match slot {
            Slot::First => self.first_menu_open,
            Slot::Second => self.second_menu_open,
        }
    }
}

impl Default for AgentSelection {
    fn default() -> Self {
        Self::new(AgentCatalog::default())
    }
}
