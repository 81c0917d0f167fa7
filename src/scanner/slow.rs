use std::mem;

use crate::alphabet::ByteClasses;
use crate::fsm::{Fsm, StateSet, Symbol};
use crate::scanner::{Scan, ScannerBuilder};

/// A sparse scanner that runs the machine without determinizing it.
///
/// There is no state ceiling to hit: the runtime state is the set of live
/// machine states, advanced one byte at a time with ε-closures baked into
/// the compiled rows. Throughput is far below the dense scanners, which is
/// the price for never failing to compile. Use it when determinization
/// reports `FsmTooLarge`.
#[derive(Clone, Debug)]
pub struct SlowScanner {
    pub(crate) letters: ByteClasses,
    pub(crate) rows: Vec<SlowRow>,
    /// ε-closure of the machine's initial state.
    pub(crate) initial: Vec<u32>,
    pub(crate) finals: Vec<bool>,
}

/// Per-state successor lists, one per letter class. Mark successors are
/// `None` for states the mark doesn't concern; such states pass through
/// marks unchanged, unless some other live state consumes the mark.
#[derive(Clone, Debug)]
pub(crate) struct SlowRow {
    pub(crate) targets: Vec<Vec<u32>>,
    pub(crate) begin: Option<Vec<u32>>,
    pub(crate) end: Option<Vec<u32>>,
}

/// The runtime state of a slow scanner: the set of live machine states.
#[derive(Clone, Debug)]
pub struct SlowState {
    set: StateSet,
    scratch: StateSet,
}

impl SlowScanner {
    /// Compile the given machine with the default configuration.
    pub fn new(fsm: Fsm) -> SlowScanner {
        ScannerBuilder::new().build_slow(fsm)
    }

    pub(crate) fn compile(builder: &ScannerBuilder, fsm: Fsm) -> SlowScanner {
        let letters = builder.letters_for(&fsm);
        let reprs = letters.representatives();
        let mut scratch = StateSet::new(fsm.len());

        let mut rows = Vec::with_capacity(fsm.len());
        for id in 0..fsm.len() {
            let mut targets = Vec::with_capacity(reprs.len());
            for &repr in &reprs {
                targets.push(
                    closed_targets(&fsm, id, Symbol::Byte(repr), &mut scratch)
                        .unwrap_or_default(),
                );
            }
            rows.push(SlowRow {
                targets,
                begin: closed_targets(&fsm, id, Symbol::Begin, &mut scratch),
                end: closed_targets(&fsm, id, Symbol::End, &mut scratch),
            });
        }

        scratch.clear();
        fsm.epsilon_closure(fsm.initial(), &mut scratch);
        let mut initial: Vec<u32> =
            scratch.as_slice().iter().map(|&s| s as u32).collect();
        initial.sort_unstable();

        let finals = (0..fsm.len()).map(|id| fsm.is_final(id)).collect();
        SlowScanner { letters, rows, initial, finals }
    }

    /// The heap memory used by this scanner's rows, in bytes. Nested
    /// target lists are counted by their lengths.
    pub fn memory_usage(&self) -> usize {
        let mut total = self.initial.len() * std::mem::size_of::<u32>();
        for row in &self.rows {
            for targets in &row.targets {
                total += targets.len() * std::mem::size_of::<u32>();
            }
            for mark in &[&row.begin, &row.end] {
                if let Some(ids) = mark {
                    total += ids.len() * std::mem::size_of::<u32>();
                }
            }
        }
        total + self.finals.len()
    }

    /// The sorted pattern identifiers accepted in the given state.
    pub fn accepted(&self, state: &SlowState) -> Vec<u32> {
        if self.is_final(state) {
            vec![0]
        } else {
            vec![]
        }
    }

    fn step_class(&self, state: &mut SlowState, class: usize) {
        state.scratch.clear();
        for &q in state.set.as_slice() {
            for &t in &self.rows[q].targets[class] {
                state.scratch.insert(t as usize);
            }
        }
        mem::swap(&mut state.set, &mut state.scratch);
    }

    fn step_mark(
        &self,
        state: &mut SlowState,
        pick: impl Fn(&SlowRow) -> &Option<Vec<u32>>,
    ) {
        // A mark is a no-op unless some live state consumes it; if one
        // does, the indifferent states drop out, committing the machine to
        // the anchored alternative.
        if state.set.as_slice().iter().all(|&q| pick(&self.rows[q]).is_none())
        {
            return;
        }
        state.scratch.clear();
        for &q in state.set.as_slice() {
            if let Some(targets) = pick(&self.rows[q]) {
                for &t in targets {
                    state.scratch.insert(t as usize);
                }
            }
        }
        mem::swap(&mut state.set, &mut state.scratch);
    }
}

/// The ε-closed successor list of one state on one symbol, or `None` when
/// the state has no transition on it.
fn closed_targets(
    fsm: &Fsm,
    id: usize,
    on: Symbol,
    scratch: &mut StateSet,
) -> Option<Vec<u32>> {
    let targets = fsm.targets(id, on)?;
    scratch.clear();
    for &t in targets {
        fsm.epsilon_closure(t, scratch);
    }
    let mut ids: Vec<u32> =
        scratch.as_slice().iter().map(|&s| s as u32).collect();
    ids.sort_unstable();
    Some(ids)
}

impl Scan for SlowScanner {
    type State = SlowState;

    fn start_state(&self) -> SlowState {
        let mut set = StateSet::new(self.rows.len());
        for &q in &self.initial {
            set.insert(q as usize);
        }
        SlowState { set, scratch: StateSet::new(self.rows.len()) }
    }

    fn begin(&self, state: &mut SlowState) {
        self.step_mark(state, |row| &row.begin);
    }

    fn step(&self, state: &mut SlowState, byte: u8) {
        self.step_class(state, self.letters.get(byte) as usize);
    }

    fn end(&self, state: &mut SlowState) {
        self.step_mark(state, |row| &row.end);
    }

    fn is_final(&self, state: &SlowState) -> bool {
        state.set.as_slice().iter().any(|&q| self.finals[q])
    }

    fn is_dead(&self, state: &SlowState) -> bool {
        state.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::SlowScanner;
    use crate::fsm::Fsm;
    use crate::runner::Runner;
    use crate::scanner::Scan;

    #[test]
    fn agrees_without_determinization() {
        let sc = SlowScanner::new(Fsm::literal("ab").surround());
        for (input, expected) in
            &[(&b"ab"[..], true), (b"xaby", true), (b"ba", false)]
        {
            let state =
                Runner::new(&sc).begin().run(input).end().into_state();
            assert_eq!(*expected, sc.is_final(&state), "{:?}", input);
            assert_eq!(
                if *expected { vec![0] } else { vec![] },
                sc.accepted(&state)
            );
        }
    }

    #[test]
    fn empty_set_is_dead() {
        let sc = SlowScanner::new(Fsm::literal("hello"));
        let mut state = sc.start_state();
        sc.begin(&mut state);
        sc.step(&mut state, b'w');
        assert!(sc.is_dead(&state));
    }
}
