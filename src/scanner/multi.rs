use std::fmt;

use byteorder::{ByteOrder, NativeEndian};

use crate::alphabet::ByteClasses;
use crate::error::{Error, Result};
use crate::fsm::Fsm;
use crate::scanner::glue::{self, ProductSource};
use crate::scanner::{Action, Scan, ScannerBuilder, TableSpec};

/// The addressing mode of a dense transition table.
///
/// Entries either store a signed offset from the current row to the target
/// row ([`Shifted`], position-independent) or the target row's absolute
/// origin ([`Absolute`], one arithmetic operation cheaper per byte but tied
/// to this table's numbering). Every entry also reserves an action word;
/// plain multi-pattern scanners leave it zero and the counting scanner uses
/// it.
pub trait Relocation {
    /// One transition-table cell.
    type Entry: Copy + fmt::Debug;

    /// The kind tag used in the serialized form.
    const KIND: u8;

    /// Encode a transition from the row at `from` to the row at `to`, both
    /// premultiplied origins in table cells.
    fn pack(from: usize, to: usize, action: Action) -> Result<Self::Entry>;

    /// Decode the target row origin, given the current row origin.
    fn next(at: usize, entry: Self::Entry) -> usize;

    /// The action word carried by this entry.
    fn action(entry: Self::Entry) -> Action;

    /// Write an entry as 8 bytes in the byte order `B`.
    fn write_entry<B: ByteOrder>(entry: Self::Entry, dst: &mut [u8]);

    /// Read an entry written in native byte order.
    fn read_entry(src: &[u8]) -> Self::Entry;
}

/// The relocatable layout: entries hold signed row offsets, so the whole
/// table remains valid wherever its buffer lives in memory.
#[derive(Clone, Copy, Debug)]
pub enum Shifted {}

/// A relocatable table cell: a signed row offset plus an action word.
#[derive(Clone, Copy, Debug)]
pub struct ShiftedEntry {
    pub(crate) shift: i32,
    pub(crate) action: Action,
}

impl Relocation for Shifted {
    type Entry = ShiftedEntry;

    const KIND: u8 = 2;

    #[inline]
    fn pack(from: usize, to: usize, action: Action) -> Result<ShiftedEntry> {
        let delta = to as i64 - from as i64;
        if delta < i32::min_value() as i64 || delta > i32::max_value() as i64 {
            return Err(Error::scanner_too_large());
        }
        Ok(ShiftedEntry { shift: delta as i32, action })
    }

    #[inline]
    fn next(at: usize, entry: ShiftedEntry) -> usize {
        (at as i64 + entry.shift as i64) as usize
    }

    #[inline]
    fn action(entry: ShiftedEntry) -> Action {
        entry.action
    }

    fn write_entry<B: ByteOrder>(entry: ShiftedEntry, dst: &mut [u8]) {
        B::write_i32(&mut dst[..4], entry.shift);
        B::write_u32(&mut dst[4..8], entry.action);
    }

    fn read_entry(src: &[u8]) -> ShiftedEntry {
        ShiftedEntry {
            shift: NativeEndian::read_i32(&src[..4]),
            action: NativeEndian::read_u32(&src[4..8]),
        }
    }
}

/// The non-relocatable layout: entries hold absolute premultiplied row
/// origins, exactly like a premultiplied state identifier.
#[derive(Clone, Copy, Debug)]
pub enum Absolute {}

/// An absolute table cell: a premultiplied row origin plus an action word.
#[derive(Clone, Copy, Debug)]
pub struct AbsoluteEntry {
    pub(crate) next: u32,
    pub(crate) action: Action,
}

impl Relocation for Absolute {
    type Entry = AbsoluteEntry;

    const KIND: u8 = 3;

    #[inline]
    fn pack(_from: usize, to: usize, action: Action) -> Result<AbsoluteEntry> {
        if to > u32::max_value() as usize {
            return Err(Error::scanner_too_large());
        }
        Ok(AbsoluteEntry { next: to as u32, action })
    }

    #[inline]
    fn next(_at: usize, entry: AbsoluteEntry) -> usize {
        entry.next as usize
    }

    #[inline]
    fn action(entry: AbsoluteEntry) -> Action {
        entry.action
    }

    fn write_entry<B: ByteOrder>(entry: AbsoluteEntry, dst: &mut [u8]) {
        B::write_u32(&mut dst[..4], entry.next);
        B::write_u32(&mut dst[4..8], entry.action);
    }

    fn read_entry(src: &[u8]) -> AbsoluteEntry {
        AbsoluteEntry {
            next: NativeEndian::read_u32(&src[..4]),
            action: NativeEndian::read_u32(&src[4..8]),
        }
    }
}

/// A dense table-driven scanner tracking one or more patterns at once.
///
/// The runtime state is a premultiplied row origin; stepping is two loads:
/// the byte's letter class, then the entry at `row + class`. Acceptance is
/// read out of a per-state side table of sorted pattern identifiers, so a
/// freshly compiled scanner reports pattern 0 and a glued scanner reports
/// the concatenation of its operands' pattern spaces.
#[derive(Clone, Debug)]
pub struct MultiScanner<R: Relocation> {
    pub(crate) letters: ByteClasses,
    pub(crate) row_len: usize,
    pub(crate) state_count: usize,
    /// Premultiplied origin of the initial row.
    pub(crate) initial: usize,
    pub(crate) table: Vec<R::Entry>,
    pub(crate) finals: Vec<bool>,
    /// Per-state `(start, len)` into `accept_pool`.
    pub(crate) accept_index: Vec<(u32, u32)>,
    pub(crate) accept_pool: Vec<u32>,
    pub(crate) patterns: usize,
}

impl<R: Relocation> MultiScanner<R> {
    /// Compile the given machine. The scanner tracks it as pattern 0.
    pub fn new(fsm: Fsm) -> Result<MultiScanner<R>> {
        ScannerBuilder::new().build_multi(fsm)
    }

    pub(crate) fn compile(
        builder: &ScannerBuilder,
        fsm: Fsm,
    ) -> Result<MultiScanner<R>> {
        let dfa = builder.prepare(fsm)?;
        let letters = builder.letters_for(&dfa);
        MultiScanner::from_spec(TableSpec::from_fsm(&dfa, letters, None))
    }

    /// Product-construct two scanners into one that tracks both operands'
    /// patterns, with the right operand's pattern identifiers shifted by
    /// the left operand's pattern count. `max_states` bounds the product
    /// (0 means no limit); exceeding it fails with `GlueTooLarge`.
    pub fn glue(
        a: &MultiScanner<R>,
        b: &MultiScanner<R>,
        max_states: usize,
    ) -> Result<MultiScanner<R>> {
        MultiScanner::from_spec(glue::product(a, b, max_states)?)
    }

    pub(crate) fn from_spec(spec: TableSpec) -> Result<MultiScanner<R>> {
        let row_len = spec.letters.row_len();
        let state_count = spec.targets.len();
        let mut table = Vec::with_capacity(state_count * row_len);
        for (id, row) in spec.targets.iter().enumerate() {
            debug_assert_eq!(row_len, row.len());
            for (col, &to) in row.iter().enumerate() {
                let action = match &spec.actions {
                    Some(actions) => actions[id][col],
                    None => 0,
                };
                table.push(R::pack(id * row_len, to * row_len, action)?);
            }
        }

        let mut accept_index = Vec::with_capacity(state_count);
        let mut accept_pool = vec![];
        for ids in &spec.accepts {
            accept_index
                .push((accept_pool.len() as u32, ids.len() as u32));
            accept_pool.extend_from_slice(ids);
        }

        Ok(MultiScanner {
            letters: spec.letters,
            row_len,
            state_count,
            initial: spec.initial * row_len,
            table,
            finals: spec.finals,
            accept_index,
            accept_pool,
            patterns: spec.patterns,
        })
    }

    /// The number of patterns this scanner tracks.
    pub fn pattern_count(&self) -> usize {
        self.patterns
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
        self.table.len() * std::mem::size_of::<R::Entry>()
            + self.finals.len()
            + self.accept_index.len() * std::mem::size_of::<(u32, u32)>()
            + self.accept_pool.len() * std::mem::size_of::<u32>()
    }

    /// The sorted pattern identifiers accepted in the given state.
    pub fn accepted(&self, state: &usize) -> &[u32] {
        let (start, len) = self.accept_index[self.state_index(*state)];
        &self.accept_pool[start as usize..(start + len) as usize]
    }

    #[inline]
    fn step_column(&self, state: usize, col: usize) -> (usize, Action) {
        // The table is built so that every reachable origin is a row start
        // and every column index is below row_len, so the sum is in bounds.
        let entry = unsafe { *self.table.get_unchecked(state + col) };
        (R::next(state, entry), R::action(entry))
    }

    pub(crate) fn next_index(&self, idx: usize, col: usize) -> usize {
        let (next, _) = self.step_column(idx * self.row_len, col);
        next / self.row_len
    }
}

impl<R: Relocation> Scan for MultiScanner<R> {
    type State = usize;

    fn start_state(&self) -> usize {
        self.initial
    }

    #[inline]
    fn begin(&self, state: &mut usize) {
        let (next, _) = self.step_column(*state, self.letters.begin_class());
        *state = next;
    }

    #[inline]
    fn step(&self, state: &mut usize, byte: u8) {
        let (next, _) =
            self.step_column(*state, self.letters.get(byte) as usize);
        *state = next;
    }

    #[inline]
    fn end(&self, state: &mut usize) {
        let (next, _) = self.step_column(*state, self.letters.end_class());
        *state = next;
    }

    fn is_final(&self, state: &usize) -> bool {
        self.finals[self.state_index(*state)]
    }

    fn is_dead(&self, state: &usize) -> bool {
        *state == 0
    }
}

impl<R: Relocation> ProductSource for MultiScanner<R> {
    fn letters(&self) -> &ByteClasses {
        &self.letters
    }

    fn patterns(&self) -> usize {
        self.patterns
    }

    fn initial_index(&self) -> usize {
        self.state_index(self.initial)
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

    fn action_byte(&self, _idx: usize, _byte: u8) -> Action {
        0
    }

    fn action_begin(&self, _idx: usize) -> Action {
        0
    }

    fn action_end(&self, _idx: usize) -> Action {
        0
    }

    fn is_final(&self, idx: usize) -> bool {
        self.finals[idx]
    }

    fn accepted(&self, idx: usize) -> &[u32] {
        let (start, len) = self.accept_index[idx];
        &self.accept_pool[start as usize..(start + len) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::{Absolute, MultiScanner, Shifted};
    use crate::fsm::Fsm;
    use crate::runner::Runner;
    use crate::scanner::Scan;

    fn aplus_anywhere() -> Fsm {
        Fsm::atom_byte(b'a').plus().prepend_anything()
    }

    #[test]
    fn accepts_its_single_pattern() {
        let sc: MultiScanner<Shifted> =
            MultiScanner::new(aplus_anywhere()).unwrap();
        let state =
            Runner::new(&sc).begin().run(b"xxa").end().into_state();
        assert_eq!(&[0], sc.accepted(&state));
        assert!(sc.is_final(&state));

        let state = Runner::new(&sc).begin().run(b"xxb").end().into_state();
        assert!(sc.accepted(&state).is_empty());
        assert!(!sc.is_final(&state));
    }

    #[test]
    fn absolute_layout_matches_relocatable() {
        let reloc: MultiScanner<Shifted> =
            MultiScanner::new(aplus_anywhere()).unwrap();
        let abs: MultiScanner<Absolute> =
            MultiScanner::new(aplus_anywhere()).unwrap();
        for input in &[&b"aa"[..], b"ba", b"bb", b"aba", b""] {
            let r = Runner::new(&reloc).begin().run(input).end().into_state();
            let a = Runner::new(&abs).begin().run(input).end().into_state();
            assert_eq!(reloc.accepted(&r), abs.accepted(&a));
        }
    }

    #[test]
    fn relocated_table_behaves_identically() {
        let sc: MultiScanner<Shifted> =
            MultiScanner::new(aplus_anywhere()).unwrap();
        // A clone places the table buffer at a different address; shifted
        // entries must not care.
        let moved = sc.clone();
        drop(sc);
        let state = Runner::new(&moved).begin().run(b"zza").end().into_state();
        assert_eq!(&[0], moved.accepted(&state));
    }
}
