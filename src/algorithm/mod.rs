/// Fixed-size bitset tracking which patterns remain possible in a cell
pub mod bitset;
/// Model construction, the run loop, and the bounded-retry driver
pub mod executor;
/// The wave state machine: ban, propagate, observe, and the backtrack log
pub mod wave;
