/// Per-run snapshot of everything the templates display. Built once from the
/// fetcher results, consumed by the renderer, never persisted.
pub struct Stats {
    pub repos: u64,
    pub stars: u64,
    pub followers: u64,
    pub commits_total: u64,
    pub contributed_repos: u64,
    pub loc_add: i64,
    pub loc_del: i64,
    pub loc_total: i64,
}
