//! Named task sequencing.
//!
//! A `TaskList` holds named actions, optionally constrained to run before
//! or after another named task. The resolved order is computed in two
//! passes: unconstrained tasks keep their append order, then each
//! constrained task (in declaration order) is spliced next to the first
//! counterpart found in the result built so far, or appended at the end
//! when the counterpart is absent. This is deliberately not a general
//! topological sort: for chains of three or more related tasks the output
//! depends on insertion order, and existing callers rely on that.

use crate::error::{Error, Result};
use crate::log_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

#[derive(Debug, Clone)]
pub struct Placement {
    pub counterpart: String,
    pub direction: Direction,
}

pub type TaskFn<C> = Box<dyn Fn(&mut C) -> Result<()>>;

struct Entry<C> {
    name: String,
    action: TaskFn<C>,
    place: Option<Placement>,
}

pub struct TaskList<C> {
    entries: Vec<Entry<C>>,
    log_tasks: bool,
    label_suffix: String,
}

impl<C> Default for TaskList<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> TaskList<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            log_tasks: false,
            label_suffix: String::new(),
        }
    }

    /// Add an unconstrained task at the end of the chain.
    pub fn append<F>(&mut self, name: &str, action: F) -> Result<()>
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        self.push(name, Box::new(action), None)
    }

    /// Add a task constrained to run just before `counterpart`. The
    /// counterpart does not need to exist yet.
    pub fn insert_before<F>(&mut self, name: &str, counterpart: &str, action: F) -> Result<()>
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        self.push(
            name,
            Box::new(action),
            Some(Placement {
                counterpart: counterpart.to_string(),
                direction: Direction::Before,
            }),
        )
    }

    /// Add a task constrained to run just after `counterpart`.
    pub fn insert_after<F>(&mut self, name: &str, counterpart: &str, action: F) -> Result<()>
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        self.push(
            name,
            Box::new(action),
            Some(Placement {
                counterpart: counterpart.to_string(),
                direction: Direction::After,
            }),
        )
    }

    /// Remove every task with the given name.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|entry| entry.name != name);
    }

    /// Replace the action of an existing task in place, keeping its position
    /// and placement constraint; append unconstrained when the name is new.
    pub fn replace_or_append<F>(&mut self, name: &str, action: F) -> Result<()>
    where
        F: Fn(&mut C) -> Result<()> + 'static,
    {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            entry.action = Box::new(action);
            return Ok(());
        }
        self.append(name, action)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wrap each task with start/end status markers when running.
    pub fn set_log_tasks(&mut self, log: bool) {
        self.log_tasks = log;
    }

    /// Suffix appended to the task name in status markers.
    pub fn set_label_suffix(&mut self, suffix: &str) {
        self.label_suffix = suffix.to_string();
    }

    /// Task names in resolved execution order.
    pub fn resolved_names(&self) -> Result<Vec<String>> {
        Ok(self
            .resolve()?
            .into_iter()
            .map(|idx| self.entries[idx].name.clone())
            .collect())
    }

    /// Execute all tasks in resolved order.
    pub fn run(&self, ctx: &mut C) -> Result<()> {
        for idx in self.resolve()? {
            let entry = &self.entries[idx];
            if self.log_tasks {
                log_status!("task", "start {}{}", entry.name, self.label_suffix);
            }
            (entry.action)(ctx)?;
            if self.log_tasks {
                log_status!("task", "end {}{}", entry.name, self.label_suffix);
            }
        }
        Ok(())
    }

    fn push(&mut self, name: &str, action: TaskFn<C>, place: Option<Placement>) -> Result<()> {
        if self.contains(name) {
            return Err(Error::duplicate_task_name(name));
        }
        self.entries.push(Entry {
            name: name.to_string(),
            action,
            place,
        });
        Ok(())
    }

    // Phase 1 gathers unconstrained entries in append order; phase 2 splices
    // each constrained entry next to its counterpart in the growing result.
    // Placement conflicts surface here, at the point two related entries are
    // compared, not at insertion time.
    fn resolve(&self) -> Result<Vec<usize>> {
        let mut result: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.place.is_none())
            .map(|(idx, _)| idx)
            .collect();

        for (idx, entry) in self.entries.iter().enumerate() {
            let place = match &entry.place {
                Some(place) => place,
                None => continue,
            };

            let mut insert_at = None;
            for (pos, placed_idx) in result.iter().enumerate() {
                let placed = &self.entries[*placed_idx];
                if conflicts(entry, placed) {
                    return Err(Error::placement_conflict(&entry.name, &placed.name));
                }
                if placed.name == place.counterpart {
                    insert_at = Some(match place.direction {
                        Direction::Before => pos,
                        Direction::After => pos + 1,
                    });
                    break;
                }
            }

            match insert_at {
                Some(pos) => result.insert(pos, idx),
                None => result.push(idx),
            }
        }
        Ok(result)
    }
}

// Two entries conflict when each declares the same-direction relation to
// the other. Unrelated entries compare equal, which keeps ordering stable.
fn conflicts<C>(a: &Entry<C>, b: &Entry<C>) -> bool {
    match (&a.place, &b.place) {
        (Some(pa), Some(pb)) => {
            pa.counterpart == b.name && pb.counterpart == a.name && pa.direction == pb.direction
        }
        _ => false,
    }
}
