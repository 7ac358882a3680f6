// File: src/interpreter/stack.rs
//
// Stack safety for the recursive evaluator.
// Kat recursion is Rust recursion, so every evaluation step makes sure some
// stack is left before descending. This keeps `max_call_depth` the only limit
// on recursion, whatever thread the interpreter runs on.

/// Space that must remain before recursing further
const RED_ZONE: usize = 256 * 1024;

/// Size of each newly allocated stack segment
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Runs `f`, first moving to a fresh stack segment when the remaining stack
/// is below the red zone.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
