#![allow(dead_code)]

use rescan::{Fsm, MultiScanner, Relocation, Runner, Scan};

/// Run a scanner over one whole bracketed stream and return the final
/// state.
pub fn run_to_state<S: Scan>(scanner: &S, input: &[u8]) -> S::State {
    Runner::new(scanner).begin().run(input).end().into_state()
}

/// The accepted pattern set of a multi scanner after one whole stream.
pub fn accepted_after<R: Relocation>(
    scanner: &MultiScanner<R>,
    input: &[u8],
) -> Vec<u32> {
    scanner.accepted(&run_to_state(scanner, input)).to_vec()
}

/// Finality after every byte of `input`, without the end mark, starting
/// with the state before any input byte.
pub fn finality_trace<S: Scan>(scanner: &S, input: &[u8]) -> Vec<bool> {
    let mut runner = Runner::new(scanner).begin();
    let mut trace = vec![];
    for &b in input {
        runner = runner.run(&[b]);
        trace.push(scanner.is_final(runner.state()));
    }
    trace
}

/// A machine matching `a+` ending at the current position, anywhere in the
/// input.
pub fn aplus_anywhere() -> Fsm {
    Fsm::atom_byte(b'a').plus().prepend_anything()
}

/// A machine matching `b+` ending at the current position, anywhere in the
/// input.
pub fn bplus_anywhere() -> Fsm {
    Fsm::atom_byte(b'b').plus().prepend_anything()
}

/// All byte strings over the given alphabet with length at most `max`.
pub fn strings_over(alphabet: &[u8], max: usize) -> Vec<Vec<u8>> {
    let mut all: Vec<Vec<u8>> = vec![vec![]];
    let mut last: Vec<Vec<u8>> = vec![vec![]];
    for _ in 0..max {
        let mut next = vec![];
        for s in &last {
            for &b in alphabet {
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
