use anyhow::Result;
use chrono::{NaiveDate, Utc};
use profile_stats::age::Age;
use profile_stats::github::GithubClient;
use profile_stats::stats::Stats;
use profile_stats::svg;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

const DEFAULT_USER: &str = "Alans44";
const TEMPLATES: [&str; 2] = ["dark_mode.svg", "light_mode.svg"];

fn birthday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2004, 4, 4).unwrap()
}

fn report_line(label: &str, elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("   {label:<22}: {:>8.2} ms", secs * 1000.0)
    } else {
        format!("   {label:<22}: {secs:>8.2} s ")
    }
}

fn report(label: &str, elapsed: Duration) {
    println!("{}", report_line(label, elapsed));
}

async fn timed<T>(label: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let start = Instant::now();
    let out = fut.await?;
    report(label, start.elapsed());
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let username = std::env::var("USER_NAME").unwrap_or_else(|_| DEFAULT_USER.to_string());
    let client = GithubClient::new()?;

    println!("Calculation times:");

    let _account = timed("account data", client.user_account(&username)).await?;

    let start = Instant::now();
    let age = Age::between(birthday(), Utc::now().date_naive()).to_string();
    report("age calculation", start.elapsed());

    let stars = timed("star count", client.star_count(&username)).await?;
    let repos = timed("repo count", client.owned_repo_count(&username)).await?;
    let contributed = timed("contributed repos", client.contributed_repo_count(&username)).await?;
    let followers = timed("follower count", client.follower_count(&username)).await?;
    let commits = timed("commit count", client.commit_count(&username)).await?;
    let loc = timed("lines of code", client.total_loc(&username)).await?;

    let stats = Stats {
        repos,
        stars,
        followers,
        commits_total: commits,
        contributed_repos: contributed,
        loc_add: loc.additions as i64,
        loc_del: loc.deletions as i64,
        loc_total: loc.additions as i64 - loc.deletions as i64,
    };

    for template in TEMPLATES {
        svg::overwrite(Path::new(template), &stats, &age)?;
    }

    println!("Total GraphQL calls: {}", client.total_calls());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_second_stages_report_in_ms() {
        let line = report_line("account data", Duration::from_millis(12));
        assert_eq!(line, "   account data          :    12.00 ms");
    }

    #[test]
    fn slow_stages_report_in_seconds_with_trailing_space() {
        let line = report_line("lines of code", Duration::from_millis(1500));
        assert_eq!(line, "   lines of code         :     1.50 s ");
    }
}
