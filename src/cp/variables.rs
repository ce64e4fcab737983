//! Start-time domains and machine sequencing decisions.
//!
//! The [`VariableStore`] is the mutable half of a solve: one [`Domain`] per
//! task plus one [`Sequence`] per pair of tasks sharing a machine. Every
//! mutation is logged on a trail so that a [`Checkpoint`] can undo all
//! changes made below it in O(changes) when it goes out of scope.

use crate::model::{ProblemModel, TaskId};
use std::ops::{Deref, DerefMut, Range};
use thiserror::Error;

/// Closed interval `[min, max]` of feasible start times for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub min: i64,
    pub max: i64,
}

impl Domain {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Whether the start time is decided.
    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Number of start times left (`max - min + 1`).
    pub fn size(&self) -> i64 {
        self.max - self.min + 1
    }
}

/// A start domain became empty; the current branch has no solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("start domain of task {task} is empty")]
pub struct DomainEmpty {
    pub task: TaskId,
}

/// Two tasks competing for the same machine (`first < second`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disjunct {
    pub machine: usize,
    pub first: TaskId,
    pub second: TaskId,
}

/// Relative order of the two tasks of a [`Disjunct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    /// Not decided yet.
    Open,
    /// `first` ends before `second` starts.
    FirstBeforeSecond,
    /// `second` ends before `first` starts.
    SecondBeforeFirst,
}

impl Sequence {
    /// The opposite decision. `Open` stays `Open`.
    pub fn flipped(self) -> Self {
        match self {
            Sequence::Open => Sequence::Open,
            Sequence::FirstBeforeSecond => Sequence::SecondBeforeFirst,
            Sequence::SecondBeforeFirst => Sequence::FirstBeforeSecond,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TrailEntry {
    Domain { task: TaskId, old: Domain },
    Sequence { pair: usize },
}

/// Per-solve mutable state: task domains and machine orderings.
///
/// End times are never stored; `end = start + duration` is derived on read.
#[derive(Debug, Clone)]
pub struct VariableStore {
    domains: Vec<Domain>,
    durations: Vec<i64>,
    machine_tasks: Vec<Vec<TaskId>>,
    disjuncts: Vec<Disjunct>,
    machine_pairs: Vec<Range<usize>>,
    sequences: Vec<Sequence>,
    open_pairs: usize,
    trail: Vec<TrailEntry>,
}

impl VariableStore {
    /// Creates the root state: every domain is `[0, horizon]`, every pair open.
    pub fn new(problem: &ProblemModel) -> Self {
        let horizon = problem.horizon();
        let domains = vec![Domain::new(0, horizon); problem.task_count()];
        let durations = problem.tasks().iter().map(|t| t.duration).collect();

        let mut machine_tasks = Vec::with_capacity(problem.machine_count());
        let mut disjuncts = Vec::new();
        let mut machine_pairs = Vec::with_capacity(problem.machine_count());
        for machine in 0..problem.machine_count() {
            let tasks = problem.machine_tasks(machine);
            let begin = disjuncts.len();
            for (i, &first) in tasks.iter().enumerate() {
                for &second in &tasks[i + 1..] {
                    disjuncts.push(Disjunct {
                        machine,
                        first,
                        second,
                    });
                }
            }
            machine_pairs.push(begin..disjuncts.len());
            machine_tasks.push(tasks.to_vec());
        }

        let open_pairs = disjuncts.len();
        Self {
            domains,
            durations,
            machine_tasks,
            sequences: vec![Sequence::Open; disjuncts.len()],
            disjuncts,
            machine_pairs,
            open_pairs,
            trail: Vec::new(),
        }
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.domains.len()
    }

    pub fn domain(&self, task: TaskId) -> Domain {
        self.domains[task]
    }

    pub fn start_min(&self, task: TaskId) -> i64 {
        self.domains[task].min
    }

    pub fn start_max(&self, task: TaskId) -> i64 {
        self.domains[task].max
    }

    pub fn end_min(&self, task: TaskId) -> i64 {
        self.domains[task].min + self.durations[task]
    }

    pub fn end_max(&self, task: TaskId) -> i64 {
        self.domains[task].max + self.durations[task]
    }

    pub fn duration(&self, task: TaskId) -> i64 {
        self.durations[task]
    }

    /// Tasks using `machine`.
    pub fn machine_tasks(&self, machine: usize) -> &[TaskId] {
        &self.machine_tasks[machine]
    }

    /// Raises the earliest start of `task` to `new_min`.
    ///
    /// Returns whether the domain changed.
    ///
    /// # Errors
    /// [`DomainEmpty`] if `new_min` exceeds the latest start. The domain is
    /// left untouched in that case.
    pub fn narrow_start_min(&mut self, task: TaskId, new_min: i64) -> Result<bool, DomainEmpty> {
        let old = self.domains[task];
        if new_min <= old.min {
            return Ok(false);
        }
        if new_min > old.max {
            return Err(DomainEmpty { task });
        }
        self.trail.push(TrailEntry::Domain { task, old });
        self.domains[task].min = new_min;
        Ok(true)
    }

    /// Lowers the latest start of `task` to `new_max`.
    ///
    /// Returns whether the domain changed.
    ///
    /// # Errors
    /// [`DomainEmpty`] if `new_max` falls below the earliest start.
    pub fn narrow_start_max(&mut self, task: TaskId, new_max: i64) -> Result<bool, DomainEmpty> {
        let old = self.domains[task];
        if new_max >= old.max {
            return Ok(false);
        }
        if new_max < old.min {
            return Err(DomainEmpty { task });
        }
        self.trail.push(TrailEntry::Domain { task, old });
        self.domains[task].max = new_max;
        Ok(true)
    }

    /// All machine pairs, grouped by machine.
    pub fn disjuncts(&self) -> &[Disjunct] {
        &self.disjuncts
    }

    /// Indices into [`disjuncts`](Self::disjuncts) for one machine.
    pub fn machine_pairs(&self, machine: usize) -> Range<usize> {
        self.machine_pairs[machine].clone()
    }

    pub fn sequence(&self, pair: usize) -> Sequence {
        self.sequences[pair]
    }

    /// Decides the order of an open pair.
    ///
    /// Returns `Ok(false)` if the pair already has this order.
    ///
    /// # Errors
    /// [`DomainEmpty`] (reported on the task that would have to move) if the
    /// pair is already ordered the other way.
    pub fn fix_sequence(&mut self, pair: usize, sequence: Sequence) -> Result<bool, DomainEmpty> {
        debug_assert_ne!(sequence, Sequence::Open, "cannot fix a pair to Open");
        let current = self.sequences[pair];
        if current == sequence {
            return Ok(false);
        }
        if current != Sequence::Open {
            let Disjunct { first, second, .. } = self.disjuncts[pair];
            let task = match sequence {
                Sequence::FirstBeforeSecond => second,
                _ => first,
            };
            return Err(DomainEmpty { task });
        }
        self.trail.push(TrailEntry::Sequence { pair });
        self.sequences[pair] = sequence;
        self.open_pairs -= 1;
        Ok(true)
    }

    /// Number of machine pairs still unordered.
    pub fn open_pairs(&self) -> usize {
        self.open_pairs
    }

    /// Whether every machine is totally ordered.
    pub fn is_fully_sequenced(&self) -> bool {
        self.open_pairs == 0
    }

    /// Earliest start of every task.
    pub fn earliest_starts(&self) -> Vec<i64> {
        self.domains.iter().map(|d| d.min).collect()
    }

    /// Number of recorded mutations not yet undone.
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    /// Opens a scope; every change made through the returned guard is undone
    /// when it drops, on success and failure paths alike.
    pub fn checkpoint(&mut self) -> Checkpoint<'_> {
        let mark = self.trail.len();
        Checkpoint { store: self, mark }
    }

    fn restore(&mut self, mark: usize) {
        while self.trail.len() > mark {
            match self.trail.pop() {
                Some(TrailEntry::Domain { task, old }) => self.domains[task] = old,
                Some(TrailEntry::Sequence { pair }) => {
                    self.sequences[pair] = Sequence::Open;
                    self.open_pairs += 1;
                }
                None => break,
            }
        }
    }
}

/// Scoped snapshot of a [`VariableStore`].
///
/// Dereferences to the store; restores it to the state at creation on drop.
/// Checkpoints nest: a search node opens one per child it explores.
#[derive(Debug)]
pub struct Checkpoint<'a> {
    store: &'a mut VariableStore,
    mark: usize,
}

impl Deref for Checkpoint<'_> {
    type Target = VariableStore;

    fn deref(&self) -> &VariableStore {
        self.store
    }
}

impl DerefMut for Checkpoint<'_> {
    fn deref_mut(&mut self) -> &mut VariableStore {
        self.store
    }
}

impl Drop for Checkpoint<'_> {
    fn drop(&mut self) {
        self.store.restore(self.mark);
    }
}
