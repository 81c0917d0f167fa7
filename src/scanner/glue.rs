use std::collections::HashMap;

use crate::alphabet::ByteClasses;
use crate::error::{Error, Result};
use crate::scanner::{Action, TableSpec, INCREMENT_MASK, MAX_PATTERNS};

/// What the glue product needs to know about an already-compiled scanner.
///
/// Everything is expressed in dense state indices rather than runtime
/// states, so the product is independent of the operands' table layouts.
pub(crate) trait ProductSource {
    fn letters(&self) -> &ByteClasses;
    fn patterns(&self) -> usize;
    fn initial_index(&self) -> usize;
    fn next_byte(&self, idx: usize, byte: u8) -> usize;
    fn next_begin(&self, idx: usize) -> usize;
    fn next_end(&self, idx: usize) -> usize;
    fn action_byte(&self, idx: usize, byte: u8) -> Action;
    fn action_begin(&self, idx: usize) -> Action;
    fn action_end(&self, idx: usize) -> Action;
    fn is_final(&self, idx: usize) -> bool;
    fn accepted(&self, idx: usize) -> &[u32];
}

/// Product-construct two compiled scanners without returning to their
/// machines: a worklist walks the reachable pairs `(s1, s2)`, transitions
/// go componentwise over the merged letter partition, accept sets
/// concatenate with the right operand's pattern identifiers shifted, and
/// action words shift the same way in both bitmask halves.
///
/// `max_states` bounds the product state count; 0 means no limit.
pub(crate) fn product<A, B>(
    a: &A,
    b: &B,
    max_states: usize,
) -> Result<TableSpec>
where
    A: ProductSource,
    B: ProductSource,
{
    let letters = ByteClasses::merge(a.letters(), b.letters());
    let reprs = letters.representatives();
    let shift = a.patterns();
    let patterns = shift + b.patterns();

    let mut ids: HashMap<(usize, usize), usize> = HashMap::new();
    let mut list: Vec<(usize, usize)> = vec![];
    // Both operands keep their dead sink at index 0, so the product sink is
    // (0, 0) and stays pinned at index 0.
    ids.insert((0, 0), 0);
    list.push((0, 0));
    let start = (a.initial_index(), b.initial_index());
    if !ids.contains_key(&start) {
        ids.insert(start, 1);
        list.push(start);
    }

    let mut targets: Vec<Vec<usize>> = vec![];
    let mut actions: Vec<Vec<Action>> = vec![];
    let mut at = 0;
    while at < list.len() {
        let (sa, sb) = list[at];
        at += 1;

        let mut row = Vec::with_capacity(reprs.len() + 2);
        let mut row_actions = Vec::with_capacity(reprs.len() + 2);
        {
            let mut push = |pair: (usize, usize),
                            action: Action,
                            ids: &mut HashMap<(usize, usize), usize>,
                            list: &mut Vec<(usize, usize)>| {
                let to = match ids.get(&pair) {
                    Some(&id) => id,
                    None => {
                        let id = list.len();
                        ids.insert(pair, id);
                        list.push(pair);
                        id
                    }
                };
                row.push(to);
                row_actions.push(action);
            };
            for &byte in &reprs {
                let pair = (a.next_byte(sa, byte), b.next_byte(sb, byte));
                let action = combine(
                    a.action_byte(sa, byte),
                    b.action_byte(sb, byte),
                    shift,
                );
                push(pair, action, &mut ids, &mut list);
            }
            let pair = (a.next_begin(sa), b.next_begin(sb));
            let action =
                combine(a.action_begin(sa), b.action_begin(sb), shift);
            push(pair, action, &mut ids, &mut list);
            let pair = (a.next_end(sa), b.next_end(sb));
            let action = combine(a.action_end(sa), b.action_end(sb), shift);
            push(pair, action, &mut ids, &mut list);
        }
        targets.push(row);
        actions.push(row_actions);

        if max_states > 0 && list.len() > max_states {
            return Err(Error::glue_too_large(max_states));
        }
    }

    let mut finals = Vec::with_capacity(list.len());
    let mut accepts = Vec::with_capacity(list.len());
    for &(sa, sb) in &list {
        finals.push(a.is_final(sa) || b.is_final(sb));
        let mut ids: Vec<u32> = a.accepted(sa).to_vec();
        ids.extend(b.accepted(sb).iter().map(|&p| p + shift as u32));
        accepts.push(ids);
    }

    Ok(TableSpec {
        letters,
        initial: ids[&start],
        targets,
        actions: Some(actions),
        finals,
        accepts,
        patterns,
    })
}

/// Merge two action words, shifting the right operand's increment and
/// reset bits past the left operand's pattern space.
fn combine(a: Action, b: Action, shift: usize) -> Action {
    debug_assert!(shift <= MAX_PATTERNS);
    let inc = (b & INCREMENT_MASK) << shift;
    let reset = ((b >> MAX_PATTERNS) & INCREMENT_MASK)
        << (MAX_PATTERNS + shift);
    a | inc | reset
}

#[cfg(test)]
mod tests {
    use super::combine;
    use crate::scanner::MAX_PATTERNS;

    #[test]
    fn combine_shifts_both_halves() {
        // Left operand: increment pattern 0. Right operand: increment its
        // pattern 0 and reset it, with the left tracking 2 patterns.
        let a = 0b01;
        let b = 0b01 | (0b01 << MAX_PATTERNS);
        let merged = combine(a, b, 2);
        assert_eq!(0b101 | (0b100 << MAX_PATTERNS), merged);
    }
}
