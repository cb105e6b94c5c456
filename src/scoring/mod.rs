// Scoring: turns a stream of message ratings into one score per entity.
//
// The rater and the aggregations live behind the ScoringPolicy seam so the
// rest of the engine only ever deals with Rating and Score values.

pub mod aggregator;
pub mod lexicon;
pub mod policy;
pub mod window;
