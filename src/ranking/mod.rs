// Ranking: leaderboards over users and channels.

pub mod leaderboard;
