// Mitigation: deciding when a channel gets an enforcement announcement,
// and fetching the flavor content that goes with it.
//
// The cooldown decision is synchronous and owned by the router. The lookup
// is async and runs after the decision is committed, so a slow or failing
// provider can only change the announcement text.

pub mod cooldown;
pub mod lookup;
pub mod rate_limiter;
