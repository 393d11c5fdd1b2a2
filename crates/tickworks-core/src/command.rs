//! Closed command type for caller-submitted engine operations.
//!
//! Commands can be executed directly with [`Engine::execute`] or buffered in
//! a [`CommandQueue`] and applied between ticks.

use crate::big::Big;
use crate::engine::{CraftOutcome, Engine, EngineError, TickResult};
use crate::id::ItemId;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Command enum
// ---------------------------------------------------------------------------

/// A single operation on the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Advance the simulation by `dt` seconds.
    Tick { dt: f64 },
    /// Produce `count` units of `item` by hand, as of `at`.
    CraftByHand { item: ItemId, count: Big, at: Instant },
    /// Change the number of `building` instances producing `item`.
    AssignBuilding { item: ItemId, building: ItemId, delta: Big },
    /// Change the number of `container` instances holding `item`.
    AssignContainer { item: ItemId, container: ItemId, delta: Big },
    SetRecipeEnabled { item: ItemId, enabled: bool },
}

/// What an executed [`Command`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Ticked(TickResult),
    Crafted(CraftOutcome),
    /// New population count after an assignment.
    Assigned(Big),
    RecipeToggled,
}

impl Engine {
    /// Execute one command.
    #[deny(clippy::wildcard_enum_match_arm)]
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        match command {
            Command::Tick { dt } => Ok(CommandOutcome::Ticked(self.tick(dt))),
            Command::CraftByHand { item, count, at } => {
                Ok(CommandOutcome::Crafted(self.craft_by_hand(item, &count, at)))
            }
            Command::AssignBuilding { item, building, delta } => {
                self.assign_building(item, building, &delta).map(CommandOutcome::Assigned)
            }
            Command::AssignContainer { item, container, delta } => {
                self.assign_container(item, container, &delta).map(CommandOutcome::Assigned)
            }
            Command::SetRecipeEnabled { item, enabled } => {
                self.set_recipe_enabled(item, enabled)?;
                Ok(CommandOutcome::RecipeToggled)
            }
        }
    }

    /// Drain `queue` and execute every pending command in submission order.
    /// A failing command does not stop the rest.
    pub fn apply_queue(&mut self, queue: &mut CommandQueue) -> Vec<Result<CommandOutcome, EngineError>> {
        let tick = self.tick_count();
        queue
            .drain(tick)
            .into_iter()
            .map(|command| self.execute(command))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// A queue of commands waiting to be executed at the next tick boundary.
///
/// Supports optional history tracking for replay and debugging.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    /// Executed commands: (tick, command).
    history: Vec<(u64, Command)>,
    /// Maximum history entries to retain. 0 = no history.
    max_history: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue that retains up to `max_history` executed commands.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn push(&mut self, command: Command) {
        self.pending.push(command);
    }

    pub fn push_batch(&mut self, commands: impl IntoIterator<Item = Command>) {
        self.pending.extend(commands);
    }

    /// Drain all pending commands, moving them to history with the given tick.
    /// Returns the drained commands in submission order.
    pub fn drain(&mut self, tick: u64) -> Vec<Command> {
        let commands: Vec<Command> = self.pending.drain(..).collect();

        if self.max_history > 0 {
            self.history
                .extend(commands.iter().map(|command| (tick, command.clone())));
            let excess = self.history.len().saturating_sub(self.max_history);
            if excess > 0 {
                self.history.drain(..excess);
            }
        }

        commands
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn history(&self) -> &[(u64, Command)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
