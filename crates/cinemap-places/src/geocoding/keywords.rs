/// Default keyword set for the theatre sweep: major chain names, IMAX, then
/// generic terms in English, Chinese, Korean and Japanese. Order matters
/// because the first keyword to surface a venue owns its provenance.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Broadway Circuit",
    "MCL Cinema",
    "Emperor Cinemas",
    "UA Cinemas",
    "Golden Harvest",
    "IMAX",
    "CGV",
    "AMC",
    "Cinemark",
    "cinema",
    "movie theatre",
    "theater",
    "movie theater",
    "電影院",
    "影院",
    "戲院",
    "영화관",
    "映画館",
];
