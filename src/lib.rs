/*!
A library for compiling regular-language state machines into compact
table-driven scanners.

The pipeline: build a nondeterministic machine with the algebraic
combinators on [`Fsm`] (a pattern front end is expected to sit on top of
them), determinize and minimize it, then lower it into one of a handful of
scanner kinds that differ in layout and bookkeeping:

* [`SimpleScanner`] — one pattern, relocatable table, nothing per
  transition; the fastest kind.
* [`MultiScanner`] — up to many patterns at once, reporting which of them
  accept; available in a relocatable ([`Shifted`]) and an absolute
  ([`Absolute`]) table layout.
* [`SlowScanner`] — a sparse fallback that skips determinization entirely,
  for machines the dense kinds refuse as too large.
* [`CountingScanner`] — counts runs of one pattern separated by another.

Two compiled multi-pattern or counting scanners can be fused into one with
`glue`, which product-constructs their tables directly without returning
to the machines, or driven in lockstep with [`ScannerPair`] when the
product would be too large. Scanners can also be serialized to a stable
byte format and reloaded without recompilation.

Scanning itself is a tight byte-at-a-time loop with no allocation and no
failure path; a [`Runner`] brackets a stream with the boundary marks that
make anchored machines work.

# Example

```
use rescan::{Fsm, Runner, Scan, SimpleScanner};

# fn example() -> Result<(), rescan::Error> {
let pattern = Fsm::literal("abc").surround();
let scanner = SimpleScanner::new(pattern)?;
let state =
    Runner::new(&scanner).begin().run(b"xx abc yy").end().into_state();
assert!(scanner.is_final(&state));
# Ok(()) }; example().unwrap()
```
*/

#![deny(missing_docs)]

mod alphabet;
mod determinize;
mod error;
mod fsm;
mod minimize;
mod runner;
mod scanner;
mod serialize;

pub use crate::alphabet::ByteClasses;
pub use crate::determinize::DEFAULT_STATE_LIMIT;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::fsm::{Fsm, StateID, Symbol};
pub use crate::runner::Runner;
pub use crate::scanner::counting::{CountingScanner, CountingState};
pub use crate::scanner::multi::{
    Absolute, AbsoluteEntry, MultiScanner, Relocation, Shifted, ShiftedEntry,
};
pub use crate::scanner::pair::ScannerPair;
pub use crate::scanner::simple::SimpleScanner;
pub use crate::scanner::slow::{SlowScanner, SlowState};
pub use crate::scanner::{Action, Scan, ScannerBuilder, MAX_PATTERNS};
pub use crate::serialize::DeserializeError;
