use crate::alphabet::ByteClasses;
use crate::error::{Error, Result};
use crate::fsm::Fsm;
use crate::scanner::{Scan, ScannerBuilder, TableSpec};

/// The leanest scanner: a single pattern, no per-transition bookkeeping.
///
/// Rows hold bare signed offsets (one `i32` per letter class), so the table
/// is both position-independent and half the size of a multi-pattern table.
/// Use it when all that's wanted is a yes/no answer for one pattern at
/// maximum throughput.
#[derive(Clone, Debug)]
pub struct SimpleScanner {
    pub(crate) letters: ByteClasses,
    pub(crate) row_len: usize,
    pub(crate) state_count: usize,
    /// Premultiplied origin of the initial row.
    pub(crate) initial: usize,
    pub(crate) table: Vec<i32>,
    pub(crate) finals: Vec<bool>,
}

impl SimpleScanner {
    /// Compile the given machine with the default configuration.
    pub fn new(fsm: Fsm) -> Result<SimpleScanner> {
        ScannerBuilder::new().build_simple(fsm)
    }

    pub(crate) fn compile(
        builder: &ScannerBuilder,
        fsm: Fsm,
    ) -> Result<SimpleScanner> {
        let dfa = builder.prepare(fsm)?;
        let letters = builder.letters_for(&dfa);
        SimpleScanner::from_spec(TableSpec::from_fsm(&dfa, letters, None))
    }

    pub(crate) fn from_spec(spec: TableSpec) -> Result<SimpleScanner> {
        let row_len = spec.letters.row_len();
        let state_count = spec.targets.len();
        let mut table = Vec::with_capacity(state_count * row_len);
        for (id, row) in spec.targets.iter().enumerate() {
            debug_assert_eq!(row_len, row.len());
            for &to in row {
                let delta = (to * row_len) as i64 - (id * row_len) as i64;
                if delta < i32::min_value() as i64
                    || delta > i32::max_value() as i64
                {
                    return Err(Error::scanner_too_large());
                }
                table.push(delta as i32);
            }
        }
        Ok(SimpleScanner {
            letters: spec.letters,
            row_len,
            state_count,
            initial: spec.initial * row_len,
            table,
            finals: spec.finals,
        })
    }

    /// The number of states in the table.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// The dense index of the given runtime state.
    pub fn state_index(&self, state: usize) -> usize {
        state / self.row_len
    }

    /// The heap memory used by this scanner's tables, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.table.len() * std::mem::size_of::<i32>() + self.finals.len()
    }

    #[inline]
    fn step_column(&self, state: usize, col: usize) -> usize {
        // Reachable origins are row starts and col < row_len, so the sum is
        // always in bounds.
        let shift = unsafe { *self.table.get_unchecked(state + col) };
        (state as i64 + shift as i64) as usize
    }
}

impl Scan for SimpleScanner {
    type State = usize;

    fn start_state(&self) -> usize {
        self.initial
    }

    #[inline]
    fn begin(&self, state: &mut usize) {
        *state = self.step_column(*state, self.letters.begin_class());
    }

    #[inline]
    fn step(&self, state: &mut usize, byte: u8) {
        *state = self.step_column(*state, self.letters.get(byte) as usize);
    }

    #[inline]
    fn end(&self, state: &mut usize) {
        *state = self.step_column(*state, self.letters.end_class());
    }

    fn is_final(&self, state: &usize) -> bool {
        self.finals[self.state_index(*state)]
    }

    fn is_dead(&self, state: &usize) -> bool {
        *state == 0
    }
}

#[cfg(test)]
mod tests {
    use super::SimpleScanner;
    use crate::fsm::Fsm;
    use crate::runner::Runner;
    use crate::scanner::{Scan, ScannerBuilder};

    #[test]
    fn matches_anywhere_when_surrounded() {
        let sc = SimpleScanner::new(Fsm::literal("ab").surround()).unwrap();
        for (input, expected) in
            &[(&b"ab"[..], true), (b"xxabyy", true), (b"axb", false)]
        {
            let state =
                Runner::new(&sc).begin().run(input).end().into_state();
            assert_eq!(*expected, sc.is_final(&state), "{:?}", input);
        }
    }

    #[test]
    fn identity_letter_table_is_equivalent() {
        let folded = SimpleScanner::new(Fsm::literal("ab").surround()).unwrap();
        let identity = ScannerBuilder::new()
            .byte_classes(false)
            .build_simple(Fsm::literal("ab").surround())
            .unwrap();
        assert!(identity.letters.is_singleton());
        for input in &[&b"ab"[..], b"xxab", b"ba", b"", b"aab"] {
            let f = Runner::new(&folded).begin().run(input).end().into_state();
            let i =
                Runner::new(&identity).begin().run(input).end().into_state();
            assert_eq!(folded.is_final(&f), identity.is_final(&i));
        }
    }

    #[test]
    fn dead_state_is_reported() {
        // Fully anchored pattern: any non-matching prefix is fatal.
        let sc = SimpleScanner::new(Fsm::literal("hello")).unwrap();
        let mut state = sc.start_state();
        sc.begin(&mut state);
        assert!(!sc.is_dead(&state));
        sc.step(&mut state, b'w');
        assert!(sc.is_dead(&state));
    }
}
