mod upstream_race;

pub use upstream_race::{QueryContext, RaceWin, UpstreamRace, UPSTREAM_TIMEOUT};
