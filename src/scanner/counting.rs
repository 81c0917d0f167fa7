use std::cmp;

use crate::alphabet::ByteClasses;
use crate::error::{Error, Result};
use crate::fsm::Fsm;
use crate::scanner::glue::{self, ProductSource};
use crate::scanner::multi::{Relocation, Shifted, ShiftedEntry};
use crate::scanner::{
    Action, Scan, ScannerBuilder, TableSpec, INCREMENT_MASK, MAX_PATTERNS,
    RESET_MASK,
};

/// Tag bit marking states where a separator run boundary has just been
/// crossed.
const TAG_BOUNDARY: u8 = 1;

/// Tag bit marking states where an occurrence of the counted pattern has
/// just completed.
const TAG_MATCH: u8 = 2;

/// A scanner that counts occurrences of a pattern separated by another.
///
/// `CountingScanner::new(re, sep)` builds a machine that, fed a stream,
/// tracks for each pattern `i` the length of the current run of `re`
/// matches and the best completed run, where runs are delimited by `sep`
/// matches. [`CountingState::result`] reports the best run seen so far,
/// trailing partial runs included.
///
/// The table uses the relocatable layout with the action word of each
/// entry holding increment bits in its low half and reset bits in its high
/// half. Increments apply unconditionally; resets are gated by a mask of
/// counters actually touched since the last reset, so streams of pure
/// separator bytes never touch the totals.
///
/// Counting scanners never report `Final` or `Dead`: callers are expected
/// to consume their whole stream and then read the results, and a counter
/// may grow until the last byte. `can_stop` is accordingly always false.
#[derive(Clone, Debug)]
pub struct CountingScanner {
    pub(crate) letters: ByteClasses,
    pub(crate) row_len: usize,
    pub(crate) state_count: usize,
    /// Premultiplied origin of the initial row.
    pub(crate) initial: usize,
    pub(crate) table: Vec<ShiftedEntry>,
    pub(crate) patterns: usize,
}

/// The runtime state of a counting scanner: the table position plus the
/// per-pattern run counters.
#[derive(Clone, Debug)]
pub struct CountingState {
    state: usize,
    current: [u32; MAX_PATTERNS],
    total: [u32; MAX_PATTERNS],
    /// Which counters have been incremented since their last reset, stored
    /// pre-shifted into the reset half of an action word so that gating a
    /// reset is a single mask.
    updated: Action,
}

impl CountingState {
    /// The best run of pattern `i` seen so far. A run still in progress
    /// counts, so the result is non-decreasing over the input.
    pub fn result(&self, i: usize) -> u32 {
        cmp::max(self.current[i], self.total[i])
    }
}

impl CountingScanner {
    /// Build a scanner counting runs of `re` matches separated by `sep`
    /// matches, with the default configuration.
    pub fn new(re: Fsm, sep: Fsm) -> Result<CountingScanner> {
        ScannerBuilder::new().build_counting(re, sep)
    }

    pub(crate) fn compile(
        builder: &ScannerBuilder,
        re: Fsm,
        sep: Fsm,
    ) -> Result<CountingScanner> {
        // A completed occurrence of `re` is a match and a boundary; a
        // completed separator is only a boundary. Determinization ors the
        // tags of overlapping states together, and minimization keeps
        // differently-tagged states apart, so the remap below sees exactly
        // the combinations it tests for.
        let mut matched = re.prepend_anything();
        let finals: Vec<_> = matched.finals().collect();
        for f in finals {
            matched.set_tag(f, TAG_MATCH | TAG_BOUNDARY);
        }
        let mut boundary = sep.prepend_anything();
        let finals: Vec<_> = boundary.finals().collect();
        for f in finals {
            boundary.set_tag(f, TAG_BOUNDARY);
        }

        let dfa = builder.prepare(matched.union(boundary))?;
        let letters = builder.letters_for(&dfa);
        let spec =
            TableSpec::from_fsm(&dfa, letters, Some(&|tag| remap(tag, 1)));
        CountingScanner::from_spec(spec)
    }

    /// Product-construct two counting scanners into one counting all of
    /// their patterns. Fails with `ActionOverflow` if the combined pattern
    /// count exceeds [`MAX_PATTERNS`], and with `GlueTooLarge` if the
    /// product exceeds `max_states` (0 meaning no limit).
    pub fn glue(
        a: &CountingScanner,
        b: &CountingScanner,
        max_states: usize,
    ) -> Result<CountingScanner> {
        let patterns = a.patterns + b.patterns;
        if patterns > MAX_PATTERNS {
            return Err(Error::action_overflow(patterns));
        }
        CountingScanner::from_spec(glue::product(a, b, max_states)?)
    }

    pub(crate) fn from_spec(spec: TableSpec) -> Result<CountingScanner> {
        let row_len = spec.letters.row_len();
        let state_count = spec.targets.len();
        let actions = spec.actions.as_ref();
        let mut table = Vec::with_capacity(state_count * row_len);
        for (id, row) in spec.targets.iter().enumerate() {
            for (col, &to) in row.iter().enumerate() {
                let action = actions.map_or(0, |a| a[id][col]);
                table.push(Shifted::pack(
                    id * row_len,
                    to * row_len,
                    action,
                )?);
            }
        }
        Ok(CountingScanner {
            letters: spec.letters,
            row_len,
            state_count,
            initial: spec.initial * row_len,
            table,
            patterns: spec.patterns,
        })
    }

    /// The number of patterns this scanner counts.
    pub fn pattern_count(&self) -> usize {
        self.patterns
    }

    /// The number of states in the table.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// The dense index of the given runtime state's table position.
    pub fn state_index(&self, state: &CountingState) -> usize {
        state.state / self.row_len
    }

    /// The heap memory used by this scanner's table, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.table.len() * std::mem::size_of::<ShiftedEntry>()
    }

    #[inline]
    fn step_column(&self, state: &mut CountingState, col: usize) {
        // Reachable origins are row starts and col < row_len, so the sum
        // is always in bounds.
        let entry = unsafe { *self.table.get_unchecked(state.state + col) };
        state.state = Shifted::next(state.state, entry);
        let action = entry.action;
        if action & INCREMENT_MASK != 0 {
            self.perform_increment(state, action & INCREMENT_MASK);
        }
        if action & RESET_MASK != 0 {
            self.perform_reset(state, action & RESET_MASK);
        }
    }

    #[inline]
    fn perform_increment(&self, state: &mut CountingState, mask: Action) {
        for i in 0..self.patterns {
            if mask & (1 << i) != 0 {
                state.current[i] = state.current[i].saturating_add(1);
            }
        }
        state.updated |= mask << MAX_PATTERNS;
    }

    #[inline]
    fn perform_reset(&self, state: &mut CountingState, mask: Action) {
        // Only commit counters that were actually touched; a separator
        // that didn't follow a match leaves the totals alone.
        let mask = mask & state.updated;
        if mask == 0 {
            return;
        }
        for i in 0..self.patterns {
            if mask & (1 << (MAX_PATTERNS + i)) != 0 {
                state.total[i] =
                    cmp::max(state.total[i], state.current[i]);
                state.current[i] = 0;
            }
        }
        state.updated &= !mask;
    }
}

/// Translate a state tag into the action carried by transitions entering
/// that state, for a scanner tracking `patterns` patterns.
fn remap(tag: u8, patterns: usize) -> Action {
    let all = (1 << patterns as u32) - 1;
    if tag == TAG_MATCH | TAG_BOUNDARY {
        all
    } else if tag == TAG_BOUNDARY {
        all << MAX_PATTERNS
    } else {
        0
    }
}

impl Scan for CountingScanner {
    type State = CountingState;

    fn start_state(&self) -> CountingState {
        CountingState {
            state: self.initial,
            current: [0; MAX_PATTERNS],
            total: [0; MAX_PATTERNS],
            updated: 0,
        }
    }

    #[inline]
    fn begin(&self, state: &mut CountingState) {
        self.step_column(state, self.letters.begin_class());
    }

    #[inline]
    fn step(&self, state: &mut CountingState, byte: u8) {
        self.step_column(state, self.letters.get(byte) as usize);
    }

    #[inline]
    fn end(&self, state: &mut CountingState) {
        self.step_column(state, self.letters.end_class());
    }

    /// Always false: counting scanners do not signal acceptance, they
    /// accumulate counters.
    fn is_final(&self, _state: &CountingState) -> bool {
        false
    }

    fn is_dead(&self, _state: &CountingState) -> bool {
        false
    }

    fn can_stop(&self, _state: &CountingState) -> bool {
        false
    }
}

impl ProductSource for CountingScanner {
    fn letters(&self) -> &ByteClasses {
        &self.letters
    }

    fn patterns(&self) -> usize {
        self.patterns
    }

    fn initial_index(&self) -> usize {
        self.initial / self.row_len
    }

    fn next_byte(&self, idx: usize, byte: u8) -> usize {
        self.next_index(idx, self.letters.get(byte) as usize)
    }

    fn next_begin(&self, idx: usize) -> usize {
        self.next_index(idx, self.letters.begin_class())
    }

    fn next_end(&self, idx: usize) -> usize {
        self.next_index(idx, self.letters.end_class())
    }

    fn action_byte(&self, idx: usize, byte: u8) -> Action {
        self.action(idx, self.letters.get(byte) as usize)
    }

    fn action_begin(&self, idx: usize) -> Action {
        self.action(idx, self.letters.begin_class())
    }

    fn action_end(&self, idx: usize) -> Action {
        self.action(idx, self.letters.end_class())
    }

    fn is_final(&self, _idx: usize) -> bool {
        false
    }

    fn accepted(&self, _idx: usize) -> &[u32] {
        &[]
    }
}

impl CountingScanner {
    fn next_index(&self, idx: usize, col: usize) -> usize {
        let at = idx * self.row_len;
        let entry = self.table[at + col];
        Shifted::next(at, entry) / self.row_len
    }

    fn action(&self, idx: usize, col: usize) -> Action {
        self.table[idx * self.row_len + col].action
    }
}

#[cfg(test)]
mod tests {
    use super::CountingScanner;
    use crate::fsm::Fsm;
    use crate::runner::Runner;
    use crate::scanner::Scan;

    fn count(sc: &CountingScanner, input: &[u8]) -> u32 {
        Runner::new(sc).begin().run(input).end().into_state().result(0)
    }

    fn a_runs() -> CountingScanner {
        CountingScanner::new(
            Fsm::atom_byte(b'a').plus(),
            Fsm::atom_byte(b'b').plus(),
        )
        .unwrap()
    }

    #[test]
    fn counts_runs_between_separators() {
        let sc = a_runs();
        assert_eq!(3, count(&sc, b"aabaaabaabbba"));
        assert_eq!(0, count(&sc, b""));
        assert_eq!(0, count(&sc, b"bbb"));
        assert_eq!(1, count(&sc, b"a"));
        assert_eq!(2, count(&sc, b"baab"));
    }

    #[test]
    fn trailing_run_counts() {
        let sc = a_runs();
        // The best run is still in progress when input ends.
        assert_eq!(4, count(&sc, b"abaaaa"));
    }

    #[test]
    fn results_are_monotonic() {
        let sc = a_runs();
        let input = b"aabaaabaabbba";
        let mut runner = Runner::new(&sc).begin();
        let mut last = 0;
        for &b in input.iter() {
            runner = runner.run(&[b]);
            let now = runner.state().result(0);
            assert!(now >= last, "result decreased: {} -> {}", last, now);
            last = now;
        }
    }

    #[test]
    fn separators_without_matches_leave_totals_alone() {
        let sc = a_runs();
        let state =
            Runner::new(&sc).begin().run(b"bbbbbb").end().into_state();
        assert_eq!(0, state.result(0));
    }

    #[test]
    fn final_is_hardcoded_false() {
        let sc = a_runs();
        let state = Runner::new(&sc).begin().run(b"aaa").end().into_state();
        assert!(!sc.is_final(&state));
        assert!(!sc.can_stop(&state));
    }
}
