use std::collections::HashMap;
use std::rc::Rc;

use crate::alphabet::ByteClasses;
use crate::error::{Error, Result};
use crate::fsm::{Fsm, StateID, StateSet, Symbol};

/// The default ceiling on the number of states subset construction may
/// produce. Dense scanners refuse machines beyond this size; the slow
/// scanner skips determinization entirely and has no such ceiling.
pub const DEFAULT_STATE_LIMIT: usize = 250_000;

/// The identifier of the dead sink in every determined machine.
pub(crate) const DEAD: StateID = 0;

/// Converts a nondeterministic machine into a complete deterministic one.
///
/// Each state of the output corresponds to an ordered set of input states.
/// State 0 of the output is always the dead sink (the empty set). The
/// output accepts wherever any member accepts, and a subset state's tag is
/// the bitwise union of its members' tags.
///
/// Byte transitions are total: a byte with no successor leads to the dead
/// sink. Mark transitions are only materialized when some member has an
/// explicit transition on the mark; a state where no member mentions a mark
/// treats that mark as a no-op at scan time. When members disagree, the ones
/// with explicit mark transitions win and the indifferent ones drop out,
/// which is what makes an anchored alternative inside a larger machine
/// commit to the boundary it asked for.
pub(crate) struct Determinizer<'a> {
    /// The machine being determinized.
    fsm: &'a Fsm,
    /// Hard cap on output states.
    limit: usize,
    /// Letter classes of the input machine. Exploration happens once per
    /// class representative instead of once per byte.
    classes: ByteClasses,
    /// The machine being built.
    out: Fsm,
    /// Each output state as an ordered set of input states. Index 0 is the
    /// dead state (the empty set).
    states: Vec<Rc<Subset>>,
    /// A cache from subsets to already-allocated output states.
    cache: HashMap<Rc<Subset>, StateID>,
}

#[derive(Debug, Eq, Hash, PartialEq)]
struct Subset {
    members: Vec<StateID>,
}

impl<'a> Determinizer<'a> {
    pub fn new(fsm: &'a Fsm, limit: usize) -> Determinizer<'a> {
        let dead = Rc::new(Subset { members: vec![] });
        let mut cache = HashMap::new();
        cache.insert(dead.clone(), DEAD);
        Determinizer {
            fsm,
            limit,
            classes: ByteClasses::fold(fsm),
            out: Fsm::new(),
            states: vec![dead],
            cache,
        }
    }

    pub fn build(mut self) -> Result<Fsm> {
        let mut scratch = StateSet::new(self.fsm.len());
        let reprs = self.classes.representatives();
        let start = self.add_start(&mut scratch)?;
        let mut uncompiled = vec![DEAD, start];
        let mut queued: Vec<bool> = vec![true, true];

        while let Some(id) = uncompiled.pop() {
            // One subset computation per letter class, then fan the result
            // out to every byte of the class.
            let mut next_of = vec![DEAD; self.classes.len()];
            for (class, &b) in reprs.iter().enumerate() {
                self.byte_subset(id, b, &mut scratch);
                let next = self.cached_state(&scratch)?;
                next_of[class] = next;
                if next >= queued.len() {
                    queued.resize(next + 1, false);
                }
                if !queued[next] {
                    queued[next] = true;
                    uncompiled.push(next);
                }
            }
            for b in 0..=255u8 {
                let next = next_of[self.classes.get(b) as usize];
                self.out.add_transition(id, Symbol::Byte(b), next);
            }

            for &mark in &[Symbol::Begin, Symbol::End] {
                if !self.mark_subset(id, mark, &mut scratch) {
                    continue;
                }
                let next = self.cached_state(&scratch)?;
                if next >= queued.len() {
                    queued.resize(next + 1, false);
                }
                if !queued[next] {
                    queued[next] = true;
                    uncompiled.push(next);
                }
                self.out.add_transition(id, mark, next);
            }
        }

        self.out.set_initial(start);
        self.out.set_determined();
        Ok(self.out)
    }

    /// Fill `scratch` with the ε-closed successor set of output state `id`
    /// on the given byte.
    fn byte_subset(&self, id: StateID, byte: u8, scratch: &mut StateSet) {
        scratch.clear();
        for &q in &self.states[id].members {
            if let Some(targets) = self.fsm.byte_targets(q, byte) {
                for &t in targets {
                    self.fsm.epsilon_closure(t, scratch);
                }
            }
        }
    }

    /// Fill `scratch` with the successor set on a mark. Returns false when no
    /// member has an explicit transition on the mark, in which case the
    /// output state gets no transition for it and scanners treat the mark
    /// as a no-op there.
    fn mark_subset(
        &self,
        id: StateID,
        mark: Symbol,
        scratch: &mut StateSet,
    ) -> bool {
        scratch.clear();
        let mut explicit = false;
        for &q in &self.states[id].members {
            if let Some(targets) = self.fsm.targets(q, mark) {
                explicit = true;
                for &t in targets {
                    self.fsm.epsilon_closure(t, scratch);
                }
            }
        }
        explicit
    }

    fn add_start(&mut self, scratch: &mut StateSet) -> Result<StateID> {
        scratch.clear();
        self.fsm.epsilon_closure(self.fsm.initial(), scratch);
        self.cached_state(scratch)
    }

    /// Return the output state for the subset in `scratch`, allocating one if
    /// it hasn't been seen before.
    fn cached_state(&mut self, scratch: &StateSet) -> Result<StateID> {
        let mut members: Vec<StateID> = scratch.as_slice().to_vec();
        members.sort_unstable();
        let subset = Subset { members };
        if let Some(&id) = self.cache.get(&subset) {
            return Ok(id);
        }

        let id = self.out.add_state();
        if self.out.len() > self.limit {
            return Err(Error::fsm_too_large(self.limit));
        }
        let mut tag = 0;
        let mut is_final = false;
        for &q in &subset.members {
            tag |= self.fsm.tag(q);
            is_final = is_final || self.fsm.is_final(q);
        }
        if is_final {
            self.out.set_final(id);
        }
        if tag != 0 {
            self.out.set_tag(id, tag);
        }
        let subset = Rc::new(subset);
        self.states.push(subset.clone());
        self.cache.insert(subset, id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::fsm::Fsm;

    #[test]
    fn dead_state_is_zero() {
        let dfa = Fsm::literal("ab").determine(100).unwrap();
        // From the dead state, everything leads back to the dead state.
        for b in 0..=255 {
            assert_eq!(0, dfa.next_byte(0, b));
        }
        assert!(!dfa.is_final(0));
        assert_ne!(0, dfa.initial());
    }

    #[test]
    fn state_limit_is_enforced() {
        let err = Fsm::literal("abcdef").determine(3).unwrap_err();
        match err.kind() {
            ErrorKind::FsmTooLarge { limit } => assert_eq!(3, *limit),
            kind => panic!("unexpected error kind: {:?}", kind),
        }
    }

    #[test]
    fn determinizing_twice_is_a_no_op() {
        let dfa = Fsm::literal("ab").determine(100).unwrap();
        let n = dfa.len();
        let dfa = dfa.determine(100).unwrap();
        assert_eq!(n, dfa.len());
    }
}
