use std::collections::HashMap;

use crate::alphabet::ByteClasses;
use crate::fsm::{Fsm, StateID, Symbol};

/// Hopcroft partition refinement over a determined machine.
///
/// The initial partition separates states by acceptance and by tag bits, so
/// two states that an action-carrying scanner must treat differently are
/// never merged even when their languages agree. Refinement then splits
/// partitions until every surviving partition is closed under every input
/// column (one column per letter class, plus the two marks).
///
/// `run` returns, for every state, the representative of its partition: the
/// lowest original state identifier in it. The caller rebuilds the machine
/// from representatives via [`rebuild`].
pub(crate) struct Minimizer<'a> {
    fsm: &'a Fsm,
    /// One representative byte per letter class; the two marks are handled
    /// as two extra virtual columns after these.
    reprs: Vec<u8>,
    /// incoming[state][column] -> predecessor states.
    incoming: Vec<Vec<Vec<StateID>>>,
    partitions: Vec<Vec<StateID>>,
    waiting: Vec<Vec<StateID>>,
}

impl<'a> Minimizer<'a> {
    pub fn new(fsm: &'a Fsm) -> Minimizer<'a> {
        let classes = ByteClasses::fold(fsm);
        let reprs = classes.representatives();
        let incoming = Minimizer::incoming_transitions(fsm, &reprs);
        let partitions = Minimizer::initial_partitions(fsm);
        let waiting = partitions.clone();
        Minimizer { fsm, reprs, incoming, partitions, waiting }
    }

    pub fn run(mut self) -> Vec<StateID> {
        let columns = self.reprs.len() + 2;
        while let Some(set) = self.waiting.pop() {
            for col in 0..columns {
                let incoming = self.incoming_to(col, &set);
                if incoming.is_empty() {
                    continue;
                }
                self.split_all(&incoming);
            }
        }

        let mut rep = vec![0; self.fsm.len()];
        for p in &self.partitions {
            for &id in p {
                rep[id] = p[0];
            }
        }
        rep
    }

    /// Split every partition against `incoming`, maintaining the waiting
    /// list with the usual smaller-half rule.
    fn split_all(&mut self, incoming: &[StateID]) {
        let mut newparts = Vec::with_capacity(self.partitions.len());
        for p in self.partitions.drain(..) {
            let x = intersect(&p, incoming);
            if x.is_empty() || x.len() == p.len() {
                newparts.push(p);
                continue;
            }
            let y = subtract(&p, incoming);
            match self.waiting.iter().position(|s| *s == p) {
                Some(i) => {
                    self.waiting[i] = x.clone();
                    self.waiting.push(y.clone());
                }
                None => {
                    if x.len() <= y.len() {
                        self.waiting.push(x.clone());
                    } else {
                        self.waiting.push(y.clone());
                    }
                }
            }
            newparts.push(x);
            newparts.push(y);
        }
        self.partitions = newparts;
    }

    /// All states with a transition into `set` on the given column, sorted.
    fn incoming_to(&self, col: usize, set: &[StateID]) -> Vec<StateID> {
        let mut result = vec![];
        for &id in set {
            result.extend_from_slice(&self.incoming[id][col]);
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    fn initial_partitions(fsm: &Fsm) -> Vec<Vec<StateID>> {
        let mut groups: HashMap<(bool, u8), Vec<StateID>> = HashMap::new();
        for id in 0..fsm.len() {
            let key = (fsm.is_final(id), fsm.tag(id));
            groups.entry(key).or_default().push(id);
        }
        let mut keys: Vec<(bool, u8)> = groups.keys().cloned().collect();
        keys.sort_unstable();
        keys.into_iter().map(|k| groups.remove(&k).unwrap()).collect()
    }

    fn incoming_transitions(
        fsm: &Fsm,
        reprs: &[u8],
    ) -> Vec<Vec<Vec<StateID>>> {
        let columns = reprs.len() + 2;
        let mut incoming = vec![vec![vec![]; columns]; fsm.len()];
        for id in 0..fsm.len() {
            for (col, &b) in reprs.iter().enumerate() {
                incoming[fsm.next_byte(id, b)][col].push(id);
            }
            for (i, &mark) in [Symbol::Begin, Symbol::End].iter().enumerate() {
                if let Some(next) = fsm.next_mark(id, mark) {
                    incoming[next][reprs.len() + i].push(id);
                }
            }
        }
        incoming
    }
}

/// Rebuild a determined machine from partition representatives, renumbering
/// it canonically: the dead sink becomes state 0 (one is synthesized if the
/// machine has none), the remaining states are numbered in breadth-first
/// discovery order from the initial state, and unreachable states are
/// dropped. Two equivalent machines rebuilt this way have identical tables.
pub(crate) fn rebuild(fsm: &Fsm, rep: &[StateID]) -> Fsm {
    let marks = [Symbol::Begin, Symbol::End];
    let is_sink = |s: StateID| -> bool {
        !fsm.is_final(s)
            && fsm.tag(s) == 0
            && (0..=255u8).all(|b| rep[fsm.next_byte(s, b)] == rep[s])
            && marks
                .iter()
                .all(|&m| match fsm.next_mark(s, m) {
                    None => true,
                    Some(t) => rep[t] == rep[s],
                })
    };

    let start = rep[fsm.initial()];
    let mut ids: HashMap<StateID, StateID> = HashMap::new();
    // order[i] is the representative that became state i + 1.
    let mut order: Vec<StateID> = vec![];
    if is_sink(start) {
        ids.insert(start, 0);
    } else {
        ids.insert(start, 1);
        order.push(start);
    }

    let mut at = 0;
    while at < order.len() {
        let from = order[at];
        at += 1;
        let mut visit = |t: StateID, ids: &mut HashMap<StateID, StateID>| {
            let t = rep[t];
            if !ids.contains_key(&t) {
                if is_sink(t) {
                    ids.insert(t, 0);
                } else {
                    ids.insert(t, order.len() + 1);
                    order.push(t);
                }
            }
        };
        for b in 0..=255u8 {
            visit(fsm.next_byte(from, b), &mut ids);
        }
        for &mark in &marks {
            if let Some(t) = fsm.next_mark(from, mark) {
                visit(t, &mut ids);
            }
        }
    }

    let mut out = Fsm::new();
    for _ in 0..order.len() {
        out.add_state();
    }
    for b in 0..=255u8 {
        out.add_transition(0, Symbol::Byte(b), 0);
    }
    for (i, &from) in order.iter().enumerate() {
        let new_from = i + 1;
        for b in 0..=255u8 {
            let to = ids[&rep[fsm.next_byte(from, b)]];
            out.add_transition(new_from, Symbol::Byte(b), to);
        }
        for &mark in &marks {
            if let Some(t) = fsm.next_mark(from, mark) {
                out.add_transition(new_from, mark, ids[&rep[t]]);
            }
        }
        if fsm.is_final(from) {
            out.set_final(new_from);
        }
        let tag = fsm.tag(from);
        if tag != 0 {
            out.set_tag(new_from, tag);
        }
    }
    out.set_initial(ids[&start]);
    out.set_determined();
    out
}

/// Intersection of two sorted, deduplicated identifier lists.
fn intersect(a: &[StateID], b: &[StateID]) -> Vec<StateID> {
    let mut result = vec![];
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            result.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    result
}

/// Elements of `a` not present in `b`; both sorted and deduplicated.
fn subtract(a: &[StateID], b: &[StateID]) -> Vec<StateID> {
    let mut result = vec![];
    let mut j = 0;
    for &x in a {
        while j < b.len() && b[j] < x {
            j += 1;
        }
        if j == b.len() || b[j] != x {
            result.push(x);
        }
    }
    result
}
