// Sibyl: crime coefficients for chat
//
// This is the library root. The engine itself (scoring, ranking, router,
// mitigation) is synchronous and storage-free; db, pipeline, and output
// wire it to SQLite, a message stream, and the terminal.

pub mod config;
pub mod db;
pub mod mitigation;
pub mod output;
pub mod pipeline;
pub mod ranking;
pub mod router;
pub mod scoring;
pub mod status;
