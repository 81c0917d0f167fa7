use crate::alphabet::ByteClasses;
use crate::determinize::DEFAULT_STATE_LIMIT;
use crate::error::Result;
use crate::fsm::{Fsm, Symbol};

pub mod counting;
mod glue;
pub mod multi;
pub mod pair;
pub mod simple;
pub mod slow;

/// The maximum number of patterns an action-carrying scanner can track.
///
/// A per-transition action word is a `u32` split in half: bit `i` increments
/// pattern `i`'s counter and bit `MAX_PATTERNS + i` resets it.
pub const MAX_PATTERNS: usize = 16;

/// A per-transition action word. Zero means "no action".
pub type Action = u32;

/// The low half of an action word: one increment bit per tracked pattern.
pub(crate) const INCREMENT_MASK: Action = (1 << MAX_PATTERNS as u32) - 1;

/// The high half of an action word: one reset bit per tracked pattern.
pub(crate) const RESET_MASK: Action = INCREMENT_MASK << MAX_PATTERNS as u32;

/// The contract between a compiled scanner and the drivers that feed it.
///
/// A scanner is immutable; all mutation happens in a caller-owned `State`
/// value, so one scanner can serve any number of concurrent input streams.
/// A stream is bracketed: `begin` delivers the begin mark, `step` delivers
/// each input byte in order, and `end` delivers the end mark. Machines
/// without boundary anchors are unaffected by the marks.
///
/// Stepping never fails and never allocates: every `(state, byte)` pair has
/// a defined transition, with the dead sink absorbing doomed streams.
pub trait Scan {
    /// The caller-owned runtime state driven by this scanner.
    type State: Clone;

    /// A fresh state positioned before any input.
    fn start_state(&self) -> Self::State;

    /// Deliver the begin mark.
    fn begin(&self, state: &mut Self::State);

    /// Deliver one input byte.
    fn step(&self, state: &mut Self::State, byte: u8);

    /// Deliver the end mark.
    fn end(&self, state: &mut Self::State);

    /// Returns true if the state is accepting.
    fn is_final(&self, state: &Self::State) -> bool;

    /// Returns true if the state is the dead sink: no further input can
    /// ever lead to acceptance.
    fn is_dead(&self, state: &Self::State) -> bool;

    /// Returns true if a driver may stop feeding input without changing any
    /// observable outcome. Scanners with pending side effects (counting)
    /// always return false.
    fn can_stop(&self, state: &Self::State) -> bool {
        self.is_dead(state)
    }
}

/// A builder for compiling state machines into scanners.
///
/// The builder controls the determinization state ceiling, whether the
/// machine is minimized before lowering (enabled by default; disabling it
/// trades table size for compile time) and whether the alphabet is folded
/// into equivalence classes (enabled by default; disabling it makes every
/// byte its own letter, which enlarges rows but skips one load per byte).
#[derive(Clone, Debug)]
pub struct ScannerBuilder {
    state_limit: usize,
    minimize: bool,
    byte_classes: bool,
}

impl ScannerBuilder {
    /// Create a new scanner builder with the default configuration.
    pub fn new() -> ScannerBuilder {
        ScannerBuilder {
            state_limit: DEFAULT_STATE_LIMIT,
            minimize: true,
            byte_classes: true,
        }
    }

    /// Set the maximum number of states determinization may produce before
    /// compilation fails with `FsmTooLarge`.
    pub fn state_limit(&mut self, limit: usize) -> &mut ScannerBuilder {
        self.state_limit = limit;
        self
    }

    /// Minimize the machine before lowering it. Enabled by default.
    pub fn minimize(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.minimize = yes;
        self
    }

    /// Fold the alphabet into byte equivalence classes. Enabled by default.
    pub fn byte_classes(&mut self, yes: bool) -> &mut ScannerBuilder {
        self.byte_classes = yes;
        self
    }

    /// Compile a single-pattern scanner with the relocatable layout and no
    /// per-transition bookkeeping.
    pub fn build_simple(&self, fsm: Fsm) -> Result<simple::SimpleScanner> {
        simple::SimpleScanner::compile(self, fsm)
    }

    /// Compile a multi-pattern scanner. The relocation parameter picks
    /// between the relocatable and the absolute table layout.
    pub fn build_multi<R: multi::Relocation>(
        &self,
        fsm: Fsm,
    ) -> Result<multi::MultiScanner<R>> {
        multi::MultiScanner::compile(self, fsm)
    }

    /// Compile a sparse scanner that runs the machine without determinizing
    /// it. This never hits the state ceiling and is the fallback when a
    /// dense scanner cannot be built.
    pub fn build_slow(&self, fsm: Fsm) -> slow::SlowScanner {
        slow::SlowScanner::compile(self, fsm)
    }

    /// Compile a scanner that counts runs of `re` matches separated by
    /// `sep` matches.
    pub fn build_counting(
        &self,
        re: Fsm,
        sep: Fsm,
    ) -> Result<counting::CountingScanner> {
        counting::CountingScanner::compile(self, re, sep)
    }

    /// Determinize and canonize (optionally minimizing) a machine so that
    /// state 0 is the dead sink and the layout is reproducible.
    pub(crate) fn prepare(&self, fsm: Fsm) -> Result<Fsm> {
        let mut dfa = fsm.determine(self.state_limit)?;
        if self.minimize {
            dfa.minimize();
        } else {
            dfa.canonize();
        }
        Ok(dfa)
    }

    pub(crate) fn letters_for(&self, dfa: &Fsm) -> ByteClasses {
        if self.byte_classes {
            ByteClasses::fold(dfa)
        } else {
            ByteClasses::singletons()
        }
    }
}

impl Default for ScannerBuilder {
    fn default() -> ScannerBuilder {
        ScannerBuilder::new()
    }
}

/// The layout-independent description of a compiled transition table. Both
/// the per-kind lowering code and the glue product build one of these; the
/// concrete scanners then pack it into their entry format.
pub(crate) struct TableSpec {
    pub letters: ByteClasses,
    /// The initial state index.
    pub initial: usize,
    /// targets[state][column] is a state index; columns are the byte
    /// classes followed by the begin and end mark columns.
    pub targets: Vec<Vec<usize>>,
    /// Per-transition action words, in the same shape as `targets`. `None`
    /// for scanners without actions.
    pub actions: Option<Vec<Vec<Action>>>,
    pub finals: Vec<bool>,
    /// Sorted pattern identifiers accepted in each state.
    pub accepts: Vec<Vec<u32>>,
    pub patterns: usize,
}

impl TableSpec {
    /// Lower a canonized determined machine into a table description.
    ///
    /// Every final state accepts pattern 0; multi-pattern tables only arise
    /// from gluing. When `remap` is given, every transition is annotated
    /// with the action derived from its target state's tag; mark columns
    /// synthesized as no-ops carry no action.
    pub(crate) fn from_fsm(
        dfa: &Fsm,
        letters: ByteClasses,
        remap: Option<&dyn Fn(u8) -> Action>,
    ) -> TableSpec {
        debug_assert!(dfa.is_determined());
        let reprs = letters.representatives();
        let row_len = letters.row_len();
        let mut targets = Vec::with_capacity(dfa.len());
        let mut actions = remap.map(|_| Vec::with_capacity(dfa.len()));
        let mut finals = Vec::with_capacity(dfa.len());
        let mut accepts = Vec::with_capacity(dfa.len());

        for id in 0..dfa.len() {
            let mut row = Vec::with_capacity(row_len);
            let mut row_actions =
                remap.map(|_| Vec::with_capacity(row_len));
            for &repr in &reprs {
                let to = dfa.next_byte(id, repr);
                row.push(to);
                if let (Some(acts), Some(remap)) = (&mut row_actions, remap) {
                    acts.push(remap(dfa.tag(to)));
                }
            }
            for &mark in &[Symbol::Begin, Symbol::End] {
                match dfa.next_mark(id, mark) {
                    Some(to) => {
                        row.push(to);
                        if let (Some(acts), Some(remap)) =
                            (&mut row_actions, remap)
                        {
                            acts.push(remap(dfa.tag(to)));
                        }
                    }
                    None => {
                        row.push(id);
                        if let Some(acts) = &mut row_actions {
                            acts.push(0);
                        }
                    }
                }
            }
            targets.push(row);
            if let (Some(all), Some(row)) = (&mut actions, row_actions) {
                all.push(row);
            }
            finals.push(dfa.is_final(id));
            accepts.push(if dfa.is_final(id) { vec![0] } else { vec![] });
        }

        TableSpec {
            letters,
            initial: dfa.initial(),
            targets,
            actions,
            finals,
            accepts,
            patterns: 1,
        }
    }
}
