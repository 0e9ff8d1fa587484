//! GitHub GraphQL v4 client.
//!
//! Every statistic is fetched by its own query. Failures are fatal: a
//! non-success HTTP status or an unexpected response shape aborts the run
//! with the failing call named in the error. There is no retry or backoff.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = "profile-stats";

const OWNER_ONLY: &[&str] = &["OWNER"];
const ALL_AFFILIATIONS: &[&str] = &["OWNER", "COLLABORATOR", "ORGANIZATION_MEMBER"];

#[derive(Deserialize)]
struct CountField {
    #[serde(rename = "totalCount")]
    total_count: u64,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct RepositoryPage {
    #[serde(rename = "totalCount")]
    total_count: u64,
    edges: Vec<RepositoryEdge>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct RepositoryEdge {
    node: RepositoryNode,
}

#[derive(Deserialize)]
struct RepositoryNode {
    stargazers: CountField,
}

/// Account identity as reported by the API.
#[derive(Debug)]
pub struct Account {
    pub id: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Lines-of-code totals across the commit history the user authored.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocStats {
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    endpoint: Arc<String>,
    http: Arc<Client>,
    calls: Arc<AtomicUsize>,
}

impl GithubClient {
    /// Create a client from the ACCESS_TOKEN env variable. A missing token is
    /// fatal at startup.
    pub fn new() -> Result<Self> {
        let token =
            std::env::var("ACCESS_TOKEN").context("ACCESS_TOKEN environment variable not set")?;
        Ok(Self::with_endpoint(token, GRAPHQL_ENDPOINT))
    }

    /// Client pointed at an alternate GraphQL endpoint.
    pub fn with_endpoint(token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            token: Arc::new(token.into()),
            endpoint: Arc::new(endpoint.into()),
            http: Arc::new(Client::new()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of GraphQL requests issued so far.
    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Issue one GraphQL request. `call` names the operation in errors.
    async fn graphql(&self, call: &'static str, query: &str, variables: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let resp = self
            .http
            .post(self.endpoint.as_str())
            .header("Authorization", format!("token {}", self.token))
            .header("User-Agent", USER_AGENT)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("{call}: network error sending GraphQL request"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{call} failed with HTTP {}: {body}", status.as_u16());
        }

        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("{call}: response was not valid JSON"))?;

        if let Some(errors) = body.get("errors") {
            bail!("{call}: GraphQL reported errors: {errors:#}");
        }

        Ok(body)
    }

    /// Account identity and creation date.
    pub async fn user_account(&self, login: &str) -> Result<Account> {
        const QUERY: &str = r#"
            query($login: String!) {
                user(login: $login) {
                    id
                    createdAt
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            user: User,
        }
        #[derive(Deserialize)]
        struct User {
            id: String,
            #[serde(rename = "createdAt")]
            created_at: String,
        }

        let body = self
            .graphql("user_account", QUERY, json!({ "login": login }))
            .await?;
        let parsed: Response = serde_json::from_value(body)
            .context("user_account: unexpected response shape")?;

        let created_at = DateTime::parse_from_rfc3339(&parsed.data.user.created_at)
            .context("user_account: createdAt is not a valid RFC 3339 timestamp")?;

        Ok(Account {
            id: parsed.data.user.id,
            created_at,
        })
    }

    /// Follower total.
    pub async fn follower_count(&self, login: &str) -> Result<u64> {
        const QUERY: &str = r#"
            query($login: String!) {
                user(login: $login) {
                    followers {
                        totalCount
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            user: User,
        }
        #[derive(Deserialize)]
        struct User {
            followers: CountField,
        }

        let body = self
            .graphql("follower_count", QUERY, json!({ "login": login }))
            .await?;
        let parsed: Response = serde_json::from_value(body)
            .context("follower_count: unexpected response shape")?;

        Ok(parsed.data.user.followers.total_count)
    }

    /// Year-to-date commit contribution total.
    pub async fn commit_count(&self, login: &str) -> Result<u64> {
        const QUERY: &str = r#"
            query($login: String!) {
                user(login: $login) {
                    contributionsCollection {
                        totalCommitContributions
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            user: User,
        }
        #[derive(Deserialize)]
        struct User {
            #[serde(rename = "contributionsCollection")]
            contributions: Contributions,
        }
        #[derive(Deserialize)]
        struct Contributions {
            #[serde(rename = "totalCommitContributions")]
            total_commit_contributions: u64,
        }

        let body = self
            .graphql("commit_count", QUERY, json!({ "login": login }))
            .await?;
        let parsed: Response =
            serde_json::from_value(body).context("commit_count: unexpected response shape")?;

        Ok(parsed.data.user.contributions.total_commit_contributions)
    }

    /// Number of repositories the user owns.
    pub async fn owned_repo_count(&self, login: &str) -> Result<u64> {
        let page = self.repository_page(login, OWNER_ONLY, None).await?;
        Ok(page.total_count)
    }

    /// Number of repositories the user owns or has contributed to.
    pub async fn contributed_repo_count(&self, login: &str) -> Result<u64> {
        let page = self.repository_page(login, ALL_AFFILIATIONS, None).await?;
        Ok(page.total_count)
    }

    /// Sum of stargazers over every owned repository, following the
    /// pagination cursor until the last page.
    pub async fn star_count(&self, login: &str) -> Result<u64> {
        let mut total = 0u64;
        let mut cursor: Option<String> = None;

        loop {
            let page = self.repository_page(login, OWNER_ONLY, cursor).await?;
            for edge in page.edges {
                total += edge.node.stargazers.total_count;
            }
            if !page.page_info.has_next_page {
                return Ok(total);
            }
            cursor = match page.page_info.end_cursor {
                Some(c) => Some(c),
                None => bail!("repository_page: hasNextPage set but endCursor is null"),
            };
        }
    }

    async fn repository_page(
        &self,
        login: &str,
        affiliations: &[&str],
        cursor: Option<String>,
    ) -> Result<RepositoryPage> {
        const QUERY: &str = r#"
            query($login: String!, $affiliations: [RepositoryAffiliation], $cursor: String) {
                user(login: $login) {
                    repositories(first: 100, after: $cursor, ownerAffiliations: $affiliations) {
                        totalCount
                        edges {
                            node {
                                stargazers {
                                    totalCount
                                }
                            }
                        }
                        pageInfo {
                            endCursor
                            hasNextPage
                        }
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            user: User,
        }
        #[derive(Deserialize)]
        struct User {
            repositories: RepositoryPage,
        }

        let variables = json!({
            "login": login,
            "affiliations": affiliations,
            "cursor": cursor,
        });

        let body = self.graphql("repository_page", QUERY, variables).await?;
        let parsed: Response =
            serde_json::from_value(body).context("repository_page: unexpected response shape")?;

        Ok(parsed.data.user.repositories)
    }

    /// Names of owned repositories, first page of 100.
    async fn list_owned_repos(&self, login: &str) -> Result<Vec<String>> {
        const QUERY: &str = r#"
            query($login: String!) {
                user(login: $login) {
                    repositories(first: 100, ownerAffiliations: OWNER) {
                        nodes {
                            name
                        }
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            user: User,
        }
        #[derive(Deserialize)]
        struct User {
            repositories: Nodes,
        }
        #[derive(Deserialize)]
        struct Nodes {
            nodes: Vec<NameNode>,
        }
        #[derive(Deserialize)]
        struct NameNode {
            name: String,
        }

        let body = self
            .graphql("list_owned_repos", QUERY, json!({ "login": login }))
            .await?;
        let parsed: Response =
            serde_json::from_value(body).context("list_owned_repos: unexpected response shape")?;

        Ok(parsed
            .data
            .user
            .repositories
            .nodes
            .into_iter()
            .map(|n| n.name)
            .collect())
    }

    /// LOC for one repository: walk the default-branch history page by page,
    /// counting only commits the user authored.
    async fn repo_loc(&self, login: &str, repo: &str) -> Result<LocStats> {
        const QUERY: &str = r#"
            query($owner: String!, $name: String!, $cursor: String) {
                repository(owner: $owner, name: $name) {
                    defaultBranchRef {
                        target {
                            ... on Commit {
                                history(first: 100, after: $cursor) {
                                    pageInfo {
                                        hasNextPage
                                        endCursor
                                    }
                                    nodes {
                                        additions
                                        deletions
                                        author {
                                            user {
                                                login
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        "#;

        #[derive(Deserialize)]
        struct Response {
            data: Data,
        }
        #[derive(Deserialize)]
        struct Data {
            repository: Option<Repository>,
        }
        #[derive(Deserialize)]
        struct Repository {
            #[serde(rename = "defaultBranchRef")]
            default_branch_ref: Option<BranchRef>,
        }
        #[derive(Deserialize)]
        struct BranchRef {
            target: Option<Target>,
        }
        #[derive(Deserialize)]
        struct Target {
            history: Option<HistoryPage>,
        }
        #[derive(Deserialize)]
        struct HistoryPage {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Vec<HistoryNode>,
        }
        #[derive(Deserialize)]
        struct HistoryNode {
            additions: Option<u64>,
            deletions: Option<u64>,
            author: Option<Author>,
        }
        #[derive(Deserialize)]
        struct Author {
            user: Option<AuthorUser>,
        }
        #[derive(Deserialize)]
        struct AuthorUser {
            login: Option<String>,
        }

        let mut stats = LocStats::default();
        let mut cursor: Option<String> = None;

        loop {
            let variables = json!({ "owner": login, "name": repo, "cursor": cursor });
            let body = self.graphql("repo_loc", QUERY, variables).await?;
            let parsed: Response =
                serde_json::from_value(body).context("repo_loc: unexpected response shape")?;

            let history = parsed
                .data
                .repository
                .and_then(|r| r.default_branch_ref)
                .and_then(|b| b.target)
                .and_then(|t| t.history)
                .with_context(|| format!("repo_loc: missing commit history for {login}/{repo}"))?;

            for node in history.nodes {
                let authored = node
                    .author
                    .and_then(|a| a.user)
                    .and_then(|u| u.login)
                    .is_some_and(|l| l == login);
                if authored {
                    stats.commits += 1;
                    stats.additions = stats.additions.saturating_add(node.additions.unwrap_or(0));
                    stats.deletions = stats.deletions.saturating_add(node.deletions.unwrap_or(0));
                }
            }

            if !history.page_info.has_next_page {
                return Ok(stats);
            }
            cursor = match history.page_info.end_cursor {
                Some(c) => Some(c),
                None => bail!("repo_loc: hasNextPage set but endCursor is null"),
            };
        }
    }

    /// Aggregate LOC across owned repositories. A repo whose history cannot
    /// be read is skipped with a warning rather than failing the run.
    pub async fn total_loc(&self, login: &str) -> Result<LocStats> {
        let repos = self.list_owned_repos(login).await?;
        let mut total = LocStats::default();

        for repo in repos {
            match self.repo_loc(login, &repo).await {
                Ok(loc) => {
                    total.additions = total.additions.saturating_add(loc.additions);
                    total.deletions = total.deletions.saturating_add(loc.deletions);
                    total.commits = total.commits.saturating_add(loc.commits);
                }
                Err(e) => {
                    eprintln!("Warning: skipping LOC for repo {repo}: {e:#}");
                }
            }
        }

        Ok(total)
    }
}
