// Pipelines: the host side of the engine.
//
// `session` drives a live engine from a message stream; `replay` rebuilds
// scores from a recorded log.

pub mod replay;
pub mod session;
