use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::mem;

use crate::determinize::{Determinizer, DEFAULT_STATE_LIMIT};
use crate::error::Result;
use crate::minimize::{self, Minimizer};

/// The identifier of a single state. Identifiers are dense: a machine with
/// `n` states uses exactly the identifiers `0..n`.
pub type StateID = usize;

/// A single unit of input for a state machine.
///
/// Ordinary input is a byte. The two marks bracket a stream: a driver feeds
/// `Begin` before the first byte and `End` after the last one, which is what
/// lets a machine anchor itself to the boundaries of the input. Marks are
/// never bytes and never share an equivalence class with one.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Symbol {
    /// An ordinary input byte.
    Byte(u8),
    /// The mark delivered before the first byte of a stream.
    Begin,
    /// The mark delivered after the last byte of a stream.
    End,
}

/// The outgoing transitions of one state.
///
/// ε-transitions are kept apart from the labeled ones so that closure
/// computation doesn't have to skip over symbol entries.
#[derive(Clone, Debug, Default)]
struct Row {
    by_symbol: BTreeMap<Symbol, BTreeSet<StateID>>,
    epsilon: BTreeSet<StateID>,
}

/// A finite state machine over bytes and boundary marks.
///
/// A machine is built either by the algebraic combinators below (which is
/// how a pattern front end is expected to produce one) or state-by-state via
/// [`add_state`](Fsm::add_state) and [`add_transition`](Fsm::add_transition).
/// Freshly built machines are in general nondeterministic and may contain
/// ε-transitions; [`determine`](Fsm::determine) turns one into a complete
/// deterministic machine, and [`minimize`](Fsm::minimize) shrinks a
/// determined machine to its canonical minimal form. Scanners are compiled
/// from determined machines.
///
/// Each state can carry a small set of tag bits. Tags survive concatenation,
/// union, determinization (members of a subset state contribute their tags
/// bitwise) and minimization (states with different tags are never merged).
/// Complement clears them. The counting scanner uses tags to recognize run
/// boundaries; other scanners ignore them.
///
/// All combinators take their operands by value and invalidate them.
#[derive(Clone, Debug)]
pub struct Fsm {
    rows: Vec<Row>,
    initial: StateID,
    finals: BTreeSet<StateID>,
    tags: BTreeMap<StateID, u8>,
    determined: bool,
}

/// States of `other` carried into `self` by `Fsm::import`, with their
/// identifiers already offset.
struct Imported {
    initial: StateID,
    finals: Vec<StateID>,
}

impl Fsm {
    /// Create a machine that accepts nothing: a single non-final state.
    pub fn new() -> Fsm {
        Fsm {
            rows: vec![Row::default()],
            initial: 0,
            finals: BTreeSet::new(),
            tags: BTreeMap::new(),
            determined: false,
        }
    }

    /// Create a machine that accepts only the empty string.
    pub fn empty() -> Fsm {
        let mut fsm = Fsm::new();
        fsm.set_final(0);
        fsm
    }

    /// Create a machine that accepts exactly the given symbol.
    pub fn atom(symbol: Symbol) -> Fsm {
        let mut fsm = Fsm::new();
        let to = fsm.add_state();
        fsm.add_transition(0, symbol, to);
        fsm.set_final(to);
        fsm
    }

    /// Create a machine that accepts exactly the given byte.
    pub fn atom_byte(byte: u8) -> Fsm {
        Fsm::atom(Symbol::Byte(byte))
    }

    /// Create a machine that accepts any single byte in the given inclusive
    /// range.
    pub fn byte_range(start: u8, end: u8) -> Fsm {
        assert!(start <= end);
        let mut fsm = Fsm::new();
        let to = fsm.add_state();
        for b in start..=end {
            fsm.add_transition(0, Symbol::Byte(b), to);
        }
        fsm.set_final(to);
        fsm
    }

    /// Create a machine that accepts any single byte.
    pub fn any_byte() -> Fsm {
        Fsm::byte_range(0, 255)
    }

    /// Create a machine that accepts exactly the given byte string.
    pub fn literal<B: AsRef<[u8]>>(bytes: B) -> Fsm {
        let mut fsm = Fsm::new();
        let mut at = 0;
        for &b in bytes.as_ref() {
            let next = fsm.add_state();
            fsm.add_transition(at, Symbol::Byte(b), next);
            at = next;
        }
        fsm.set_final(at);
        fsm
    }

    /// The number of states in this machine.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// The initial state.
    pub fn initial(&self) -> StateID {
        self.initial
    }

    /// Returns true if and only if the given state is accepting.
    pub fn is_final(&self, id: StateID) -> bool {
        self.finals.contains(&id)
    }

    /// Iterate over the accepting states in increasing order.
    pub fn finals<'a>(&'a self) -> impl Iterator<Item = StateID> + 'a {
        self.finals.iter().cloned()
    }

    /// The tag bits attached to the given state (zero when untagged).
    pub fn tag(&self, id: StateID) -> u8 {
        self.tags.get(&id).cloned().unwrap_or(0)
    }

    /// Attach tag bits to a state, replacing any previous tag.
    pub fn set_tag(&mut self, id: StateID, tag: u8) {
        if tag == 0 {
            self.tags.remove(&id);
        } else {
            self.tags.insert(id, tag);
        }
    }

    /// Returns true if this machine has been determinized and not mutated
    /// since.
    pub fn is_determined(&self) -> bool {
        self.determined
    }

    /// Add a fresh state and return its identifier.
    pub fn add_state(&mut self) -> StateID {
        let id = self.rows.len();
        self.rows.push(Row::default());
        id
    }

    /// Add a transition on the given symbol. Adding a transition to a
    /// determined machine makes it nondeterministic again.
    pub fn add_transition(&mut self, from: StateID, on: Symbol, to: StateID) {
        debug_assert!(from < self.rows.len() && to < self.rows.len());
        self.rows[from].by_symbol.entry(on).or_default().insert(to);
        self.determined = false;
    }

    /// Add an ε-transition.
    pub fn add_epsilon(&mut self, from: StateID, to: StateID) {
        debug_assert!(from < self.rows.len() && to < self.rows.len());
        self.rows[from].epsilon.insert(to);
        self.determined = false;
    }

    /// Mark a state as accepting.
    pub fn set_final(&mut self, id: StateID) {
        debug_assert!(id < self.rows.len());
        self.finals.insert(id);
    }

    /// Concatenation: this machine followed by `other`.
    pub fn concat(mut self, other: Fsm) -> Fsm {
        let imported = self.import(other);
        let finals = mem::take(&mut self.finals);
        for f in finals {
            self.add_epsilon(f, imported.initial);
        }
        self.finals = imported.finals.into_iter().collect();
        self.determined = false;
        self
    }

    /// Alternation: either this machine or `other`.
    pub fn union(mut self, other: Fsm) -> Fsm {
        let imported = self.import(other);
        let old = self.initial;
        let start = self.add_state();
        self.add_epsilon(start, old);
        self.add_epsilon(start, imported.initial);
        self.initial = start;
        for f in imported.finals {
            self.finals.insert(f);
        }
        self.determined = false;
        self
    }

    /// Kleene closure: zero or more repetitions.
    pub fn star(mut self) -> Fsm {
        let old = self.initial;
        let start = self.add_state();
        self.add_epsilon(start, old);
        let finals: Vec<StateID> = self.finals.iter().cloned().collect();
        for f in finals {
            self.add_epsilon(f, start);
        }
        self.initial = start;
        self.finals.insert(start);
        self.determined = false;
        self
    }

    /// One or more repetitions.
    pub fn plus(mut self) -> Fsm {
        let initial = self.initial;
        let finals: Vec<StateID> = self.finals.iter().cloned().collect();
        for f in finals {
            self.add_epsilon(f, initial);
        }
        self.determined = false;
        self
    }

    /// Zero or one occurrence.
    pub fn question(mut self) -> Fsm {
        let old = self.initial;
        let start = self.add_state();
        self.add_epsilon(start, old);
        self.initial = start;
        self.finals.insert(start);
        self.determined = false;
        self
    }

    /// Exactly `count` repetitions.
    pub fn repeat(self, count: usize) -> Fsm {
        let mut result = Fsm::empty();
        for _ in 0..count {
            result = result.concat(self.clone());
        }
        result
    }

    /// At least `count` repetitions.
    pub fn repeat_at_least(self, count: usize) -> Fsm {
        if count == 0 {
            return self.star();
        }
        self.clone().repeat(count - 1).concat(self.plus())
    }

    /// The complement of this machine's language over byte strings.
    ///
    /// The machine is determinized (with the default state limit) and
    /// minimized first, then its accepting set is flipped over the complete
    /// state space. Tags do not survive complementation.
    pub fn complement(self) -> Result<Fsm> {
        let mut dfa = self.determine(DEFAULT_STATE_LIMIT)?;
        dfa.minimize();
        let flipped: BTreeSet<StateID> = (0..dfa.rows.len())
            .filter(|id| !dfa.finals.contains(id))
            .collect();
        dfa.finals = flipped;
        dfa.tags.clear();
        Ok(dfa)
    }

    /// The intersection of this machine's language with `other`'s.
    ///
    /// Both operands are determinized first; the result is the synchronized
    /// product, which is itself determined.
    pub fn intersect(self, other: Fsm) -> Result<Fsm> {
        let a = self.determine(DEFAULT_STATE_LIMIT)?;
        let b = other.determine(DEFAULT_STATE_LIMIT)?;
        Ok(Fsm::product(&a, &b))
    }

    /// The language of this machine minus the language of `other`.
    pub fn difference(self, other: Fsm) -> Result<Fsm> {
        self.intersect(other.complement()?)
    }

    /// Allow a match to start anywhere: any number of bytes may precede it.
    pub fn prepend_anything(mut self) -> Fsm {
        let old = self.initial;
        let start = self.add_state();
        for b in 0..=255 {
            self.add_transition(start, Symbol::Byte(b), start);
        }
        self.add_epsilon(start, old);
        self.initial = start;
        self.determined = false;
        self
    }

    /// Allow a match to end anywhere: any number of bytes may follow it.
    pub fn append_anything(mut self) -> Fsm {
        let tail = self.add_state();
        for b in 0..=255 {
            self.add_transition(tail, Symbol::Byte(b), tail);
        }
        let finals: Vec<StateID> = self.finals.iter().cloned().collect();
        for f in finals {
            self.add_epsilon(f, tail);
        }
        self.finals.insert(tail);
        self.determined = false;
        self
    }

    /// Wrap this machine so that it accepts whenever its pattern occurs
    /// anywhere in the input. Idempotent up to language equality.
    pub fn surround(self) -> Fsm {
        self.prepend_anything().append_anything()
    }

    /// Determinize this machine via subset construction, failing if more
    /// than `limit` states would be produced. The result is a complete
    /// machine: state 0 is the canonical dead sink and every state has a
    /// transition on every byte. A machine that is already determined is
    /// returned unchanged.
    pub fn determine(self, limit: usize) -> Result<Fsm> {
        if self.determined {
            return Ok(self);
        }
        Determinizer::new(&self, limit).build()
    }

    /// Minimize this determined machine with Hopcroft partition refinement,
    /// then renumber it canonically (dead sink at 0, remaining states in
    /// breadth-first discovery order), making the result reproducible.
    ///
    /// Panics if the machine has not been determinized.
    pub fn minimize(&mut self) {
        assert!(self.determined, "can't minimize a nondeterministic machine");
        let rep = Minimizer::new(self).run();
        *self = minimize::rebuild(self, &rep);
    }

    /// Renumber a determined machine canonically without merging any
    /// states. Compilation uses this to guarantee the dead-sink-at-0 layout
    /// when the caller skipped minimization.
    pub(crate) fn canonize(&mut self) {
        debug_assert!(self.determined);
        let identity: Vec<StateID> = (0..self.rows.len()).collect();
        *self = minimize::rebuild(self, &identity);
    }

    /// Copy all states of `other` into this machine, offsetting identifiers,
    /// and merge its tags. Returns `other`'s remapped landmarks.
    fn import(&mut self, other: Fsm) -> Imported {
        let offset = self.rows.len();
        for row in other.rows {
            let mut new = Row::default();
            for (sym, set) in row.by_symbol {
                new.by_symbol
                    .insert(sym, set.iter().map(|&s| s + offset).collect());
            }
            new.epsilon = row.epsilon.iter().map(|&s| s + offset).collect();
            self.rows.push(new);
        }
        for (id, tag) in other.tags {
            self.tags.insert(id + offset, tag);
        }
        Imported {
            initial: other.initial + offset,
            finals: other.finals.iter().map(|&f| f + offset).collect(),
        }
    }

    /// The synchronized product of two determined machines. A product state
    /// accepts iff both components accept; tags are combined bitwise.
    fn product(a: &Fsm, b: &Fsm) -> Fsm {
        use std::collections::HashMap;

        let mut out = Fsm::new();
        let mut ids: HashMap<(StateID, StateID), StateID> = HashMap::new();
        // State 0 of a determined machine is its dead sink, so the product
        // sink is (0, 0) and maps onto the fresh machine's state 0.
        ids.insert((0, 0), 0);
        let mut list: Vec<(StateID, StateID)> = vec![(0, 0)];
        let start = (a.initial, b.initial);
        if !ids.contains_key(&start) {
            let id = out.add_state();
            ids.insert(start, id);
            list.push(start);
        }

        let mut at = 0;
        while at < list.len() {
            let (sa, sb) = list[at];
            at += 1;
            for byte in 0..=255 {
                let pair = (a.next_byte(sa, byte), b.next_byte(sb, byte));
                let to = match ids.get(&pair) {
                    Some(&id) => id,
                    None => {
                        let id = out.add_state();
                        ids.insert(pair, id);
                        list.push(pair);
                        id
                    }
                };
                let from = ids[&(sa, sb)];
                out.add_transition(from, Symbol::Byte(byte), to);
            }
            for &mark in &[Symbol::Begin, Symbol::End] {
                let (ma, mb) = (a.next_mark(sa, mark), b.next_mark(sb, mark));
                if ma.is_none() && mb.is_none() {
                    continue;
                }
                let pair = (ma.unwrap_or(sa), mb.unwrap_or(sb));
                let to = match ids.get(&pair) {
                    Some(&id) => id,
                    None => {
                        let id = out.add_state();
                        ids.insert(pair, id);
                        list.push(pair);
                        id
                    }
                };
                let from = ids[&(sa, sb)];
                out.add_transition(from, mark, to);
            }
            let id = ids[&(sa, sb)];
            if a.is_final(sa) && b.is_final(sb) {
                out.set_final(id);
            }
            let tag = a.tag(sa) | b.tag(sb);
            if tag != 0 {
                out.set_tag(id, tag);
            }
        }
        out.initial = ids[&start];
        out.determined = true;
        out
    }

    pub(crate) fn targets(
        &self,
        id: StateID,
        on: Symbol,
    ) -> Option<&BTreeSet<StateID>> {
        self.rows[id].by_symbol.get(&on)
    }

    pub(crate) fn byte_targets(
        &self,
        id: StateID,
        byte: u8,
    ) -> Option<&BTreeSet<StateID>> {
        self.targets(id, Symbol::Byte(byte))
    }

    /// The unique byte successor of a state in a determined machine. Falls
    /// back to the dead sink if the transition is absent, which cannot
    /// happen for machines produced by the determinizer.
    pub(crate) fn next_byte(&self, id: StateID, byte: u8) -> StateID {
        debug_assert!(self.determined);
        self.byte_targets(id, byte)
            .and_then(|set| set.iter().next().cloned())
            .unwrap_or(0)
    }

    /// The mark successor of a state in a determined machine, if the state
    /// has an explicit transition on the mark. `None` means the mark is a
    /// no-op for this state.
    pub(crate) fn next_mark(&self, id: StateID, mark: Symbol) -> Option<StateID> {
        debug_assert!(self.determined);
        debug_assert!(!matches!(mark, Symbol::Byte(_)));
        self.targets(id, mark).and_then(|set| set.iter().next().cloned())
    }

    /// Accumulate the ε-closure of `start` into `set`.
    pub(crate) fn epsilon_closure(&self, start: StateID, set: &mut StateSet) {
        if set.contains(start) {
            return;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if set.contains(id) {
                continue;
            }
            set.insert(id);
            for &next in &self.rows[id].epsilon {
                if !set.contains(next) {
                    stack.push(next);
                }
            }
        }
    }

    pub(crate) fn set_determined(&mut self) {
        self.determined = true;
    }

    pub(crate) fn set_initial(&mut self, id: StateID) {
        debug_assert!(id < self.rows.len());
        self.initial = id;
    }
}

/// A reusable set of machine states: a membership bitmap paired with the
/// members in insertion order.
///
/// ε-closures, subset construction and the sparse scanner's runtime all
/// build one small state set per input step out of a machine that may have
/// many states. Clearing unsets only the bits of the members actually
/// inserted, so reusing one set across a whole scan costs what each step
/// touched rather than the size of the machine.
#[derive(Clone)]
pub(crate) struct StateSet {
    members: Vec<StateID>,
    bits: Vec<u64>,
}

impl StateSet {
    /// Create an empty set for a machine with `states` states.
    pub fn new(states: usize) -> StateSet {
        StateSet { members: vec![], bits: vec![0; (states + 63) / 64] }
    }

    /// Add a state. Inserting a member twice is a no-op.
    pub fn insert(&mut self, id: StateID) {
        let mask = 1u64 << (id % 64);
        if self.bits[id / 64] & mask == 0 {
            self.bits[id / 64] |= mask;
            self.members.push(id);
        }
    }

    pub fn contains(&self, id: StateID) -> bool {
        self.bits[id / 64] & (1u64 << (id % 64)) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The members in insertion order.
    pub fn as_slice(&self) -> &[StateID] {
        &self.members
    }

    /// Empty the set, unsetting only the members' bits.
    pub fn clear(&mut self) {
        for &id in &self.members {
            self.bits[id / 64] &= !(1u64 << (id % 64));
        }
        self.members.clear();
    }
}

impl fmt::Debug for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.members.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Fsm, Symbol};
    use crate::determinize::DEFAULT_STATE_LIMIT;

    /// Walk a determined machine over the given bytes, marks included, and
    /// report whether it accepts.
    fn accepts(dfa: &Fsm, input: &[u8]) -> bool {
        assert!(dfa.is_determined());
        let mut state = dfa.initial();
        state = dfa.next_mark(state, Symbol::Begin).unwrap_or(state);
        for &b in input {
            state = dfa.next_byte(state, b);
        }
        state = dfa.next_mark(state, Symbol::End).unwrap_or(state);
        dfa.is_final(state)
    }

    fn determine(fsm: Fsm) -> Fsm {
        fsm.determine(DEFAULT_STATE_LIMIT).unwrap()
    }

    /// All byte strings over {a, b} of length at most `max`.
    fn samples(max: usize) -> Vec<Vec<u8>> {
        let mut all: Vec<Vec<u8>> = vec![vec![]];
        let mut last: Vec<Vec<u8>> = vec![vec![]];
        for _ in 0..max {
            let mut next = vec![];
            for s in &last {
                for &b in b"ab" {
                    let mut t = s.clone();
                    t.push(b);
                    next.push(t);
                }
            }
            all.extend(next.iter().cloned());
            last = next;
        }
        all
    }

    #[test]
    fn atoms_and_literals() {
        let dfa = determine(Fsm::literal("ab"));
        assert!(accepts(&dfa, b"ab"));
        assert!(!accepts(&dfa, b"a"));
        assert!(!accepts(&dfa, b"abb"));
        assert!(!accepts(&dfa, b""));

        let dfa = determine(Fsm::empty());
        assert!(accepts(&dfa, b""));
        assert!(!accepts(&dfa, b"a"));

        let dfa = determine(Fsm::new());
        assert!(!accepts(&dfa, b""));
        assert!(!accepts(&dfa, b"a"));
    }

    #[test]
    fn union_concat_star() {
        let a = Fsm::atom_byte(b'a');
        let b = Fsm::atom_byte(b'b');
        let dfa = determine(a.union(b).star());
        for input in samples(3) {
            assert!(accepts(&dfa, &input), "{:?}", input);
        }
        assert!(!accepts(&dfa, b"ax"));

        let dfa = determine(
            Fsm::atom_byte(b'a').plus().concat(Fsm::atom_byte(b'b')),
        );
        assert!(accepts(&dfa, b"ab"));
        assert!(accepts(&dfa, b"aaab"));
        assert!(!accepts(&dfa, b"b"));
        assert!(!accepts(&dfa, b"aba"));
    }

    #[test]
    fn question_and_repeat() {
        let dfa = determine(Fsm::atom_byte(b'a').question());
        assert!(accepts(&dfa, b""));
        assert!(accepts(&dfa, b"a"));
        assert!(!accepts(&dfa, b"aa"));

        let dfa = determine(Fsm::atom_byte(b'a').repeat(3));
        assert!(accepts(&dfa, b"aaa"));
        assert!(!accepts(&dfa, b"aa"));
        assert!(!accepts(&dfa, b"aaaa"));

        let dfa = determine(Fsm::atom_byte(b'a').repeat_at_least(2));
        assert!(!accepts(&dfa, b"a"));
        assert!(accepts(&dfa, b"aa"));
        assert!(accepts(&dfa, b"aaaa"));
    }

    #[test]
    fn complement_flips_membership() {
        let plain = determine(Fsm::atom_byte(b'a').plus());
        let flipped = Fsm::atom_byte(b'a').plus().complement().unwrap();
        for input in samples(4) {
            assert_ne!(
                accepts(&plain, &input),
                accepts(&flipped, &input),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn complement_minimizes_its_input() {
        // `a|b` determinizes to two distinct one-byte accepting states;
        // minimization merges them, leaving the dead sink, the start and
        // one accepting state before the flip.
        let flipped = Fsm::atom_byte(b'a')
            .union(Fsm::atom_byte(b'b'))
            .complement()
            .unwrap();
        assert!(flipped.is_determined());
        assert_eq!(3, flipped.len());
    }

    #[test]
    fn intersection_and_difference() {
        // (a|b)* with at least one `a`, intersected with strings of length 2.
        let has_a = Fsm::any_byte()
            .star()
            .concat(Fsm::atom_byte(b'a'))
            .concat(Fsm::any_byte().star());
        let len2 = Fsm::any_byte().repeat(2);
        let both = has_a.intersect(len2).unwrap();
        assert!(accepts(&both, b"ab"));
        assert!(accepts(&both, b"ba"));
        assert!(accepts(&both, b"aa"));
        assert!(!accepts(&both, b"bb"));
        assert!(!accepts(&both, b"a"));
        assert!(!accepts(&both, b"aab"));

        // a+ minus aa: only runs of `a` whose length isn't two.
        let diff = Fsm::atom_byte(b'a')
            .plus()
            .difference(Fsm::literal("aa"))
            .unwrap();
        assert!(accepts(&diff, b"a"));
        assert!(!accepts(&diff, b"aa"));
        assert!(accepts(&diff, b"aaa"));
        assert!(!accepts(&diff, b"b"));
    }

    #[test]
    fn surround_matches_anywhere() {
        let dfa = determine(Fsm::literal("ab").surround());
        assert!(accepts(&dfa, b"ab"));
        assert!(accepts(&dfa, b"xxabxx"));
        assert!(accepts(&dfa, b"aab"));
        assert!(!accepts(&dfa, b"ba"));
        assert!(!accepts(&dfa, b"axb"));
    }

    #[test]
    fn surround_is_idempotent() {
        let once = determine(Fsm::literal("ab").surround());
        let twice = determine(Fsm::literal("ab").surround().surround());
        for input in samples(4) {
            assert_eq!(
                accepts(&once, &input),
                accepts(&twice, &input),
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn anchored_machines_consume_marks() {
        // Begin ab: must match at the very start of the stream.
        let dfa = determine(
            Fsm::atom(Symbol::Begin).concat(Fsm::literal("ab")).surround(),
        );
        assert!(accepts(&dfa, b"ab"));
        assert!(accepts(&dfa, b"abxx"));
        assert!(!accepts(&dfa, b"xab"));

        // ab End: must match at the very end.
        let dfa = determine(
            Fsm::literal("ab").concat(Fsm::atom(Symbol::End)).surround(),
        );
        assert!(accepts(&dfa, b"ab"));
        assert!(accepts(&dfa, b"xxab"));
        assert!(!accepts(&dfa, b"abx"));
    }

    #[test]
    fn tags_survive_composition() {
        let mut a = Fsm::atom_byte(b'a');
        let f = a.finals().next().unwrap();
        a.set_tag(f, 0b10);
        let dfa = determine(a.union(Fsm::atom_byte(b'b')));
        let mut state = dfa.initial();
        state = dfa.next_byte(state, b'a');
        assert_eq!(0b10, dfa.tag(state));
        let mut state = dfa.initial();
        state = dfa.next_byte(state, b'b');
        assert_eq!(0, dfa.tag(state));
    }

    #[test]
    fn state_sets_reuse_cleanly() {
        use super::StateSet;

        let mut set = StateSet::new(100);
        set.insert(3);
        set.insert(97);
        set.insert(3);
        assert_eq!(&[3, 97], set.as_slice());
        assert!(set.contains(97));
        assert!(!set.contains(4));

        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(3));
        assert!(!set.contains(97));
    }

    #[test]
    fn determinism_and_completeness() {
        let dfa = determine(Fsm::literal("ab").surround());
        for id in 0..dfa.len() {
            for b in 0..=255 {
                let targets = dfa.byte_targets(id, b);
                assert_eq!(1, targets.map_or(0, |s| s.len()), "state {}", id);
            }
        }
    }
}
