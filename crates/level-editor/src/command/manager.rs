use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{Command, EditContext};
use crate::error::CommandError;

/// Undo/redo history.
///
/// The undo stack holds at most `capacity` commands; pushing past it evicts
/// the oldest one and runs its release hook. Executing a new command clears
/// the redo stack.
pub struct CommandManager {
    undo_stack: VecDeque<Box<dyn Command>>,
    redo_stack: Vec<Box<dyn Command>>,
    capacity: usize,
}

impl CommandManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Names on the undo stack, oldest first.
    pub fn undo_history(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().map(|c| c.name())
    }

    /// Names on the redo stack, next to redo first.
    pub fn redo_history(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|c| c.name())
    }

    /// Execute `command` and record it. A failing command is dropped and
    /// the history is left untouched.
    pub fn execute(
        &mut self,
        ctx: &mut EditContext<'_>,
        mut command: Box<dyn Command>,
    ) -> Result<(), CommandError> {
        if let Err(err) = command.execute(ctx) {
            warn!("command {} failed: {}", command.name(), err);
            command.release(ctx.scene);
            return Err(err);
        }
        debug!("executed {}", command.name());

        for mut stale in self.redo_stack.drain(..) {
            stale.release(ctx.scene);
        }
        self.push_undo(ctx, command);
        Ok(())
    }

    fn push_undo(&mut self, ctx: &mut EditContext<'_>, command: Box<dyn Command>) {
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.capacity {
            if let Some(mut oldest) = self.undo_stack.pop_front() {
                debug!("evicting {} from history", oldest.name());
                oldest.release(ctx.scene);
            }
        }
    }

    /// Revert up to `n` commands. Returns how many were reverted.
    pub fn undo(&mut self, ctx: &mut EditContext<'_>, n: usize) -> usize {
        let mut reverted = 0;
        for _ in 0..n {
            let Some(mut command) = self.undo_stack.pop_back() else {
                break;
            };
            match command.revert(ctx) {
                Ok(()) => {
                    debug!("undo {}", command.name());
                    self.redo_stack.push(command);
                    reverted += 1;
                }
                Err(err) => {
                    warn!("undo of {} failed, dropping it: {}", command.name(), err);
                    command.release(ctx.scene);
                }
            }
        }
        reverted
    }

    /// Re-execute up to `n` undone commands. Returns how many were redone.
    pub fn redo(&mut self, ctx: &mut EditContext<'_>, n: usize) -> usize {
        let mut redone = 0;
        for _ in 0..n {
            let Some(mut command) = self.redo_stack.pop() else {
                break;
            };
            match command.execute(ctx) {
                Ok(()) => {
                    debug!("redo {}", command.name());
                    self.push_undo(ctx, command);
                    redone += 1;
                }
                Err(err) => {
                    warn!("redo of {} failed, dropping it: {}", command.name(), err);
                    command.release(ctx.scene);
                }
            }
        }
        redone
    }

    /// Drop the whole history, releasing every command.
    pub fn clear(&mut self, ctx: &mut EditContext<'_>) {
        for mut command in self.undo_stack.drain(..).chain(self.redo_stack.drain(..)) {
            command.release(ctx.scene);
        }
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("undo", &self.undo_history().collect::<Vec<_>>())
            .field("redo", &self.redo_history().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::selection::Selection;
    use scene_core::{SceneError, SceneGraph};

    /// Adds `amount` to a shared counter; logs releases.
    struct Add {
        name: String,
        amount: i32,
        total: Rc<RefCell<i32>>,
        released: Rc<RefCell<Vec<String>>>,
        fail_execute: bool,
        fail_revert: bool,
    }

    struct Fixture {
        total: Rc<RefCell<i32>>,
        released: Rc<RefCell<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                total: Rc::new(RefCell::new(0)),
                released: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn add(&self, name: &str, amount: i32) -> Box<Add> {
            Box::new(Add {
                name: name.to_string(),
                amount,
                total: self.total.clone(),
                released: self.released.clone(),
                fail_execute: false,
                fail_revert: false,
            })
        }

        fn total(&self) -> i32 {
            *self.total.borrow()
        }

        fn released(&self) -> Vec<String> {
            self.released.borrow().clone()
        }
    }

    impl Command for Add {
        fn name(&self) -> &str {
            &self.name
        }

        fn execute(&mut self, _ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
            if self.fail_execute {
                return Err(CommandError::Rejected("execute".into()));
            }
            *self.total.borrow_mut() += self.amount;
            Ok(())
        }

        fn revert(&mut self, _ctx: &mut EditContext<'_>) -> Result<(), CommandError> {
            if self.fail_revert {
                return Err(SceneError::Root.into());
            }
            *self.total.borrow_mut() -= self.amount;
            Ok(())
        }

        fn release(&mut self, _scene: &mut SceneGraph) {
            self.released.borrow_mut().push(self.name.clone());
        }
    }

    #[test]
    fn test_execute_then_undo_all_restores_state() {
        let fx = Fixture::new();
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(20);

        for (i, amount) in [3, -7, 11, 5].into_iter().enumerate() {
            manager.execute(&mut ctx, fx.add(&format!("c{i}"), amount)).unwrap();
        }
        assert_eq!(fx.total(), 12);
        assert_eq!(manager.undo(&mut ctx, 4), 4);
        assert_eq!(fx.total(), 0);
        assert_eq!(manager.redo_count(), 4);

        assert_eq!(manager.redo(&mut ctx, 10), 4);
        assert_eq!(fx.total(), 12);
        assert!(!manager.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest_and_releases() {
        let fx = Fixture::new();
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(3);

        for i in 0..4 {
            manager.execute(&mut ctx, fx.add(&format!("c{i}"), 1)).unwrap();
            assert!(manager.undo_count() <= manager.capacity());
        }
        assert_eq!(manager.undo_history().collect::<Vec<_>>(), vec!["c1", "c2", "c3"]);
        assert_eq!(fx.released(), vec!["c0"]);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let fx = Fixture::new();
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(20);

        manager.execute(&mut ctx, fx.add("a", 1)).unwrap();
        manager.execute(&mut ctx, fx.add("b", 1)).unwrap();
        manager.undo(&mut ctx, 1);
        assert_eq!(manager.redo_count(), 1);

        manager.execute(&mut ctx, fx.add("c", 1)).unwrap();
        assert_eq!(manager.redo_count(), 0);
        assert_eq!(fx.released(), vec!["b"]);
        assert_eq!(manager.undo_history().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_failed_execute_leaves_stacks_alone() {
        let fx = Fixture::new();
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(20);

        manager.execute(&mut ctx, fx.add("a", 1)).unwrap();
        manager.undo(&mut ctx, 1);

        let mut bad = fx.add("bad", 1);
        bad.fail_execute = true;
        assert!(manager.execute(&mut ctx, bad).is_err());
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_count(), 1);
        assert_eq!(fx.total(), 0);
    }

    #[test]
    fn test_failed_revert_is_dropped_and_undo_continues() {
        let fx = Fixture::new();
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(20);

        manager.execute(&mut ctx, fx.add("a", 1)).unwrap();
        let mut stuck = fx.add("stuck", 10);
        stuck.fail_revert = true;
        manager.execute(&mut ctx, stuck).unwrap();

        assert_eq!(manager.undo(&mut ctx, 2), 1);
        assert_eq!(fx.total(), 10);
        assert_eq!(manager.undo_count(), 0);
        assert_eq!(manager.redo_history().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(fx.released(), vec!["stuck"]);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut scene = SceneGraph::new();
        let mut selection = Selection::default();
        let mut ctx = EditContext::new(&mut scene, &mut selection);
        let mut manager = CommandManager::new(20);
        assert_eq!(manager.undo(&mut ctx, 1), 0);
        assert_eq!(manager.redo(&mut ctx, 1), 0);
    }
}
