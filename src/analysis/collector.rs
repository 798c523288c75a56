use super::contributors::{self, ContributorSummary};
use super::health::Health;
use super::issues::{self, IssueSplit};
use super::participation::{self, CommitActivity, WeekCommits};
use super::stars::{self, DailyStarSeries};
use super::traffic::Traffic;
use super::{CompetitorOverview, Dashboard, Section, StarsOverview};
use crate::client::{repo_path, Client, Endpoint};
use crate::config::{Config, RepoRef};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, error, info};

/// Fetches raw API data through the client and shapes it into dashboard sections.
pub struct StatsCollector<'a> {
    client: &'a Client,
    config: &'a Config,
    today: NaiveDate,
}

impl<'a> StatsCollector<'a> {
    pub fn new(client: &'a Client, config: &'a Config) -> Self {
        Self {
            client,
            config,
            today: Utc::now().date_naive(),
        }
    }

    /// Pin "today" instead of reading the clock.
    #[cfg(test)]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Cumulative star history. Any failure is logged and reported as `None`
    /// so callers can show "no data" instead of an empty chart.
    pub async fn stars_data(&self) -> Option<DailyStarSeries> {
        match self.try_stars_data().await {
            Ok(series) => Some(series),
            Err(e) => {
                error!("Error trying to retrieve stars data...");
                error!("{:#}", e);
                None
            }
        }
    }

    async fn try_stars_data(&self) -> Result<DailyStarSeries> {
        let start = self.config.start_date()?;
        let events = self
            .client
            .fetch(&self.client.path(Endpoint::Stargazers), "")
            .await
            .context("Failed to fetch stargazers")?;

        stars::star_series(&events, start, self.today, self.config.stars.granularity)
    }

    pub async fn health_data(&self) -> Result<Health> {
        let profile = self
            .client
            .fetch_one(&self.client.path(Endpoint::CommunityProfile), "")
            .await
            .context("Failed to fetch community profile")?;

        Ok(Health::from_profile(&profile))
    }

    /// Open and closed issues accepted by `predicate`.
    pub async fn issues_data<P>(&self, predicate: P) -> Result<IssueSplit>
    where
        P: Fn(&Value) -> bool,
    {
        let path = self.client.path(Endpoint::Issues);

        let open = self
            .client
            .fetch(&path, "")
            .await
            .context("Failed to fetch open issues")?;
        let closed = self
            .client
            .fetch(&path, "&state=closed")
            .await
            .context("Failed to fetch closed issues")?;

        Ok(issues::split_by(open, closed, predicate))
    }

    pub async fn labeled_issues_data(&self, label: &str) -> Result<IssueSplit> {
        self.issues_data(issues::label_predicate(label)).await
    }

    pub async fn contributors_data(&self) -> Result<ContributorSummary> {
        let raw = self
            .client
            .fetch(&self.client.path(Endpoint::Contributors), "")
            .await
            .context("Failed to fetch contributors")?;

        Ok(contributors::summarize(&raw))
    }

    pub async fn traffic_data(&self) -> Result<Traffic> {
        let clones = self
            .client
            .fetch_one(&self.client.path(Endpoint::TrafficClones), "")
            .await
            .context("Failed to fetch clone traffic")?;
        let views = self
            .client
            .fetch_one(&self.client.path(Endpoint::TrafficViews), "&per=week")
            .await
            .context("Failed to fetch view traffic")?;

        Ok(Traffic::from_responses(&clones, &views))
    }

    /// Weekly commit counts of any repository, oldest first.
    pub async fn participation(&self, repo: &RepoRef) -> Result<Vec<u64>> {
        let path = repo_path(&repo.owner, &repo.repo, Endpoint::Participation);
        let response = self
            .client
            .fetch_one(&path, "")
            .await
            .with_context(|| format!("Failed to fetch participation for {}", repo.full_name()))?;

        participation::participation_counts(&response)
            .with_context(|| format!("Bad participation data for {}", repo.full_name()))
    }

    pub async fn weekly_commits(&self) -> Result<Vec<WeekCommits>> {
        let counts = self.participation(&self.config.primary_repo()).await?;
        Ok(participation::weekly_commits(&counts, self.today))
    }

    /// Commit activity of this repository next to every configured competitor.
    /// `None` when no competitors are configured.
    pub async fn competitors_data(&self) -> Result<Option<CommitActivity>> {
        if self.config.competitors.is_empty() {
            return Ok(None);
        }

        let mut series = Vec::with_capacity(self.config.competitors.len() + 1);
        let primary = self.config.primary_repo();
        series.push((primary.full_name(), self.participation(&primary).await?));

        for competitor in &self.config.competitors {
            series.push((competitor.full_name(), self.participation(competitor).await?));
        }

        Ok(Some(CommitActivity::compare(series, self.today)))
    }

    /// Build every section in turn. A failing section is recorded as
    /// unavailable and never stops the others.
    pub async fn collect(&self) -> Dashboard {
        let total = 5 + self.config.issue_labels.len() + usize::from(!self.config.competitors.is_empty());
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} sections {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
        );

        info!(
            "Collecting dashboard for {} as of {}",
            self.config.primary_repo().full_name(),
            self.today
        );

        pb.set_message("health");
        let health = Section::from_result(self.health_data().await, "health");
        pb.inc(1);

        pb.set_message("stars");
        let stars = match self.stars_data().await {
            Some(series) => match series.summary() {
                Some(summary) => {
                    debug!(
                        "{} star points from {}",
                        series.len(),
                        series.points.first().map(|p| p.label()).unwrap_or_default()
                    );
                    Section::Available(StarsOverview { series, summary })
                }
                None => Section::Unavailable("Error fetching Star data: empty series".to_string()),
            },
            None => Section::Unavailable("Error fetching Star data".to_string()),
        };
        pb.inc(1);

        let mut issue_sections = Vec::with_capacity(self.config.issue_labels.len());
        for label in &self.config.issue_labels {
            pb.set_message(format!("'{}' issues", label));
            let split = self.labeled_issues_data(label).await;
            issue_sections.push(Section::from_result(
                split.map(|s| s.counts(label)),
                &format!("'{}' issues", label),
            ));
            pb.inc(1);
        }

        pb.set_message("contributors");
        let contributors = Section::from_result(self.contributors_data().await, "contributors");
        pb.inc(1);

        pb.set_message("traffic");
        let traffic = Section::from_result(self.traffic_data().await, "traffic");
        pb.inc(1);

        pb.set_message("weekly commits");
        let weekly_commits = Section::from_result(self.weekly_commits().await, "weekly commits");
        pb.inc(1);

        let competitors = if self.config.competitors.is_empty() {
            None
        } else {
            pb.set_message("competitors");
            let overview = self.competitors_data().await.and_then(|activity| {
                let activity = activity.context("no competitor activity")?;
                Ok(CompetitorOverview {
                    last_month: activity.last_month(),
                    activity,
                })
            });
            pb.inc(1);
            Some(Section::from_result(overview, "competitors"))
        };

        pb.finish_with_message("done");

        let dashboard = Dashboard {
            title: self.config.title.clone(),
            repository: self.config.primary_repo().full_name(),
            generated_at: Utc::now(),
            logo_file: self.config.logo_file.clone(),
            social: self.config.social.clone(),
            primary_color: self.config.style.primary_color.clone(),
            health,
            stars,
            issues: issue_sections,
            contributors,
            traffic,
            weekly_commits,
            competitors,
        };

        info!(
            "Dashboard collected: {}/{} sections available",
            dashboard.sections() - dashboard.unavailable_sections(),
            dashboard.sections()
        );

        dashboard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use chrono::Datelike;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_config(competitors: serde_json::Value) -> Config {
        serde_json::from_value(json!({
            "title": "Widgets",
            "client": { "root": "unused", "owner": "acme", "repo": "widgets" },
            "competitors": competitors,
        }))
        .unwrap()
    }

    async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_healthy_repo(server: &MockServer, repo: &str) {
        mount_json(
            server,
            &format!("/repos/{}/community/profile", repo),
            json!({"health_percentage": 71, "description": "Widgets!"}),
        )
        .await;
        Mock::given(method("GET"))
            .and(path(format!("/repos/{}/issues", repo)))
            .and(query_param("state", "closed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"number": 3, "labels": [{"name": "good first issue"}]},
                {"number": 4, "labels": [{"name": "support"}]},
                {"number": 5, "labels": [{"name": "good first issue"}]},
            ])))
            .mount(server)
            .await;
        mount_json(
            server,
            &format!("/repos/{}/issues", repo),
            json!([
                {"number": 1, "labels": [{"name": "good first issue"}]},
                {"number": 2},
            ]),
        )
        .await;
        mount_json(
            server,
            &format!("/repos/{}/contributors", repo),
            json!([
                {"login": "a", "contributions": 5},
                {"login": "b", "contributions": 1},
                {"login": "c", "contributions": 3},
            ]),
        )
        .await;
        mount_json(
            server,
            &format!("/repos/{}/traffic/clones", repo),
            json!({"count": 40, "uniques": 12}),
        )
        .await;
        mount_json(
            server,
            &format!("/repos/{}/traffic/views", repo),
            json!({"count": 400, "uniques": 120}),
        )
        .await;
        mount_json(
            server,
            &format!("/repos/{}/stats/participation", repo),
            json!({"all": vec![1; 52], "owner": vec![0; 52]}),
        )
        .await;
    }

    #[tokio::test]
    async fn stars_through_the_api() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/repos/acme/widgets/stargazers",
            json!([
                {"starred_at": "2021-08-01T00:00:00Z", "user": {"login": "x"}},
                {"starred_at": "2021-08-03T00:00:00Z", "user": {"login": "y"}},
            ]),
        )
        .await;

        let client = test_client(&server);
        let config = test_config(json!([]));
        let collector = StatsCollector::new(&client, &config).with_today(date(2021, 8, 3));

        let series = collector.stars_data().await.unwrap();
        let counts: Vec<_> = series.points.iter().map(|p| (p.label(), p.stars)).collect();
        assert_eq!(
            counts,
            vec![
                ("2021/08/01".to_string(), 1),
                ("2021/08/02".to_string(), 1),
                ("2021/08/03".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn star_fetch_failure_is_none_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/stargazers"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let config = test_config(json!([]));
        let collector = StatsCollector::new(&client, &config).with_today(date(2021, 8, 3));

        assert!(collector.stars_data().await.is_none());
    }

    #[tokio::test]
    async fn star_events_without_timestamps_are_none() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/repos/acme/widgets/stargazers",
            json!([{"login": "x"}]),
        )
        .await;

        let client = test_client(&server);
        let config = test_config(json!([]));
        let collector = StatsCollector::new(&client, &config).with_today(date(2021, 8, 3));

        assert!(collector.stars_data().await.is_none());
    }

    #[tokio::test]
    async fn label_predicates_share_one_issue_fetch() {
        let server = MockServer::start().await;
        mount_healthy_repo(&server, "acme/widgets").await;

        let client = test_client(&server);
        let config = test_config(json!([]));
        let collector = StatsCollector::new(&client, &config);

        let gfi = collector
            .labeled_issues_data(issues::GOOD_FIRST_ISSUE)
            .await
            .unwrap();
        assert_eq!(gfi.open.len(), 1);
        assert_eq!(gfi.closed.len(), 2);

        let support = collector.labeled_issues_data(issues::SUPPORT).await.unwrap();
        assert_eq!(support.open.len(), 0);
        assert_eq!(support.closed.len(), 1);

        let requests = server.received_requests().await.unwrap();
        let issue_requests = requests
            .iter()
            .filter(|r| r.url.path() == "/repos/acme/widgets/issues")
            .count();
        assert_eq!(issue_requests, 2, "open and closed lists are memoized");
    }

    #[tokio::test]
    async fn failed_stars_do_not_sink_the_dashboard() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/stargazers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_healthy_repo(&server, "acme/widgets").await;

        let client = test_client(&server);
        let config = test_config(json!([]));
        let dashboard = StatsCollector::new(&client, &config)
            .with_today(date(2024, 3, 13))
            .collect()
            .await;

        assert!(!dashboard.stars.is_available());
        assert_eq!(dashboard.unavailable_sections(), 1);
        assert!(dashboard.competitors.is_none());

        let contributors = dashboard.contributors.available().unwrap();
        assert_eq!(contributors.total, 3);
        assert_eq!(contributors.recurrent, 2);

        let labels: Vec<_> = dashboard
            .issues
            .iter()
            .map(|s| {
                let c = s.available().unwrap();
                (c.label.as_str(), c.open, c.closed)
            })
            .collect();
        assert_eq!(labels, vec![("good first issue", 1, 2), ("support", 0, 1)]);

        let traffic = dashboard.traffic.available().unwrap();
        assert_eq!(traffic.unique_clones, Some(12));
        assert_eq!(traffic.unique_views, Some(120));

        let health = dashboard.health.available().unwrap();
        assert_eq!(health.display_percentage(), "71%");

        let weeks = dashboard.weekly_commits.available().unwrap();
        assert_eq!(weeks.len(), 52);
        assert_eq!(weeks.last().unwrap().week, date(2024, 3, 10));
        assert_eq!(weeks.last().unwrap().week.weekday(), chrono::Weekday::Sun);
    }

    #[tokio::test]
    async fn compares_against_competitors() {
        let server = MockServer::start().await;
        mount_healthy_repo(&server, "acme/widgets").await;
        mount_json(
            &server,
            "/repos/other/gadgets/stats/participation",
            json!({"all": vec![3; 52]}),
        )
        .await;

        let client = test_client(&server);
        let config = test_config(json!([{"owner": "other", "repo": "gadgets"}]));
        let collector = StatsCollector::new(&client, &config).with_today(date(2024, 3, 13));

        let activity = collector.competitors_data().await.unwrap().unwrap();
        assert_eq!(activity.weeks.len(), 52);
        let names: Vec<_> = activity.repos.iter().map(|r| r.repo.as_str()).collect();
        assert_eq!(names, vec!["acme/widgets", "other/gadgets"]);

        let ranking = activity.last_month();
        assert_eq!(ranking[0].repo, "other/gadgets");
        assert_eq!(ranking[0].commits, 12);
        assert_eq!(ranking[1].commits, 4);
    }

    #[tokio::test]
    async fn competitor_failure_only_marks_that_section() {
        let server = MockServer::start().await;
        mount_healthy_repo(&server, "acme/widgets").await;
        Mock::given(method("GET"))
            .and(path("/repos/other/gadgets/stats/participation"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({})))
            .mount(&server)
            .await;
        mount_json(
            &server,
            "/repos/acme/widgets/stargazers",
            json!([{"starred_at": "2024-03-01T00:00:00Z"}]),
        )
        .await;

        let client = test_client(&server);
        let config = test_config(json!([{"owner": "other", "repo": "gadgets"}]));
        let dashboard = StatsCollector::new(&client, &config)
            .with_today(date(2024, 3, 13))
            .collect()
            .await;

        assert!(dashboard.stars.is_available());
        assert!(dashboard.weekly_commits.is_available());
        assert!(matches!(dashboard.competitors, Some(Section::Unavailable(_))));
        assert_eq!(dashboard.unavailable_sections(), 1);
    }
}
