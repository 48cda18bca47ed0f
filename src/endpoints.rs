//! Typed wrappers over the raw request path for the API-Football endpoints.
//!
//! Every wrapper funnels through [`FootballClient::request`] and unwraps the
//! upstream `"response"` envelope. Payloads stay as `serde_json::Value`
//! trees — the upstream schema is wide and versioned, and downstream
//! consumers pick the fields they need.

use serde_json::Value;

use crate::client::FootballClient;
use crate::error::Result;

/// Query parameter list in the shape the transport expects.
#[derive(Debug, Default)]
struct Params(Vec<(String, String)>);

impl Params {
    fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    fn push_opt(&mut self, key: &str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }
}

/// Optional filters for `/teams`.
#[derive(Debug, Clone, Default)]
pub struct TeamsQuery {
    /// Free-text name search.
    pub name: Option<String>,
    pub country: Option<String>,
    pub league: Option<u32>,
    pub season: Option<u32>,
}

/// Optional filters for `/fixtures`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default)]
pub struct FixturesQuery {
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub team: Option<u32>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// N most recent fixtures of a team.
    pub last: Option<u32>,
    /// N upcoming fixtures of a team.
    pub next: Option<u32>,
    /// Fixture status short code (NS, LIVE, FT, ...).
    pub status: Option<String>,
}

/// Optional filters for `/players`.
#[derive(Debug, Clone, Default)]
pub struct PlayersQuery {
    pub team: Option<u32>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub id: Option<u32>,
}

/// Optional filters for `/odds`.
#[derive(Debug, Clone, Default)]
pub struct OddsQuery {
    pub fixture: Option<u32>,
    pub league: Option<u32>,
    pub season: Option<u32>,
    pub date: Option<String>,
    pub bookmaker: Option<u32>,
}

impl FootballClient {
    /// List leagues, optionally filtered by country and season.
    pub async fn leagues(&self, country: Option<&str>, season: Option<u32>) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push_opt("country", country);
        params.push_opt("season", season);
        let payload = self.request("/leagues", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Fetch a single team by id.
    pub async fn team(&self, team_id: u32) -> Result<Option<Value>> {
        let mut params = Params::default();
        params.push("id", team_id);
        let payload = self.request("/teams", &params.0, true).await?;
        Ok(first_response(payload))
    }

    /// Search teams by name/country/league/season.
    pub async fn search_teams(&self, query: TeamsQuery) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push_opt("search", query.name);
        params.push_opt("country", query.country);
        params.push_opt("league", query.league);
        params.push_opt("season", query.season);
        let payload = self.request("/teams", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Season statistics for a team within a league.
    pub async fn team_statistics(
        &self,
        team_id: u32,
        league_id: u32,
        season: u32,
    ) -> Result<Option<Value>> {
        let mut params = Params::default();
        params.push("team", team_id);
        params.push("league", league_id);
        params.push("season", season);
        let payload = self.request("/teams/statistics", &params.0, true).await?;
        Ok(response_object(payload))
    }

    /// Fixtures matching the given filters.
    pub async fn fixtures(&self, query: FixturesQuery) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push_opt("league", query.league);
        params.push_opt("season", query.season);
        params.push_opt("team", query.team);
        params.push_opt("date", query.date);
        params.push_opt("from", query.from);
        params.push_opt("to", query.to);
        params.push_opt("last", query.last);
        params.push_opt("next", query.next);
        params.push_opt("status", query.status);
        let payload = self.request("/fixtures", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Fetch a single fixture by id.
    pub async fn fixture_by_id(&self, fixture_id: u32) -> Result<Option<Value>> {
        let mut params = Params::default();
        params.push("id", fixture_id);
        let payload = self.request("/fixtures", &params.0, true).await?;
        Ok(first_response(payload))
    }

    /// Detailed match statistics (shots, possession, xG, ...).
    pub async fn fixture_statistics(&self, fixture_id: u32) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push("fixture", fixture_id);
        let payload = self.request("/fixtures/statistics", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Head-to-head history between two teams.
    pub async fn head_to_head(
        &self,
        team1_id: u32,
        team2_id: u32,
        last: Option<u32>,
    ) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push("h2h", format!("{team1_id}-{team2_id}"));
        params.push_opt("last", last);
        let payload = self.request("/fixtures/headtohead", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// League table, optionally narrowed to one team.
    pub async fn standings(
        &self,
        league_id: u32,
        season: u32,
        team_id: Option<u32>,
    ) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push("league", league_id);
        params.push("season", season);
        params.push_opt("team", team_id);
        let payload = self.request("/standings", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Player records matching the given filters.
    pub async fn players(&self, query: PlayersQuery) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push_opt("team", query.team);
        params.push_opt("league", query.league);
        params.push_opt("season", query.season);
        params.push_opt("id", query.id);
        let payload = self.request("/players", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Top goal scorers for a league season.
    pub async fn top_scorers(&self, league_id: u32, season: u32) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push("league", league_id);
        params.push("season", season);
        let payload = self.request("/players/topscorers", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Top assist providers for a league season.
    pub async fn top_assists(&self, league_id: u32, season: u32) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push("league", league_id);
        params.push("season", season);
        let payload = self.request("/players/topassists", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Bookmaker odds matching the given filters.
    pub async fn odds(&self, query: OddsQuery) -> Result<Vec<Value>> {
        let mut params = Params::default();
        params.push_opt("fixture", query.fixture);
        params.push_opt("league", query.league);
        params.push_opt("season", query.season);
        params.push_opt("date", query.date);
        params.push_opt("bookmaker", query.bookmaker);
        let payload = self.request("/odds", &params.0, true).await?;
        Ok(response_array(payload))
    }

    /// Upstream prediction for a fixture (form, comparison, verdict).
    pub async fn predictions(&self, fixture_id: u32) -> Result<Option<Value>> {
        let mut params = Params::default();
        params.push("fixture", fixture_id);
        let payload = self.request("/predictions", &params.0, true).await?;
        Ok(first_response(payload))
    }

    /// Last `n` finished home fixtures of a team in a league season.
    pub async fn last_home_fixtures(
        &self,
        team_id: u32,
        league_id: u32,
        season: u32,
        n: usize,
    ) -> Result<Vec<Value>> {
        let fixtures = self.recent_fixtures(team_id, league_id, season).await?;
        Ok(finished_fixtures_for_side(fixtures, team_id, "home", n))
    }

    /// Last `n` finished away fixtures of a team in a league season.
    pub async fn last_away_fixtures(
        &self,
        team_id: u32,
        league_id: u32,
        season: u32,
        n: usize,
    ) -> Result<Vec<Value>> {
        let fixtures = self.recent_fixtures(team_id, league_id, season).await?;
        Ok(finished_fixtures_for_side(fixtures, team_id, "away", n))
    }

    /// Over-fetch recent fixtures so home/away filtering still has enough
    /// material after dropping the other side.
    async fn recent_fixtures(
        &self,
        team_id: u32,
        league_id: u32,
        season: u32,
    ) -> Result<Vec<Value>> {
        self.fixtures(FixturesQuery {
            team: Some(team_id),
            league: Some(league_id),
            season: Some(season),
            last: Some(50),
            ..Default::default()
        })
        .await
    }
}

/// Pull the `"response"` array out of an envelope, empty when absent.
fn response_array(mut payload: Value) -> Vec<Value> {
    match payload.get_mut("response").map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// First element of the `"response"` array, if any.
fn first_response(payload: Value) -> Option<Value> {
    response_array(payload).into_iter().next()
}

/// The `"response"` value itself for object-shaped endpoints
/// (`/teams/statistics`), `None` when missing or null.
fn response_object(mut payload: Value) -> Option<Value> {
    match payload.get_mut("response").map(Value::take) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

/// Keep finished (`FT`) fixtures where `team_id` played on `side`
/// (`"home"`/`"away"`), most recent first, at most `n`.
fn finished_fixtures_for_side(
    fixtures: Vec<Value>,
    team_id: u32,
    side: &str,
    n: usize,
) -> Vec<Value> {
    let mut kept: Vec<Value> = fixtures
        .into_iter()
        .filter(|f| {
            f["teams"][side]["id"].as_u64() == Some(u64::from(team_id))
                && f["fixture"]["status"]["short"].as_str() == Some("FT")
        })
        .collect();
    // RFC 3339 dates sort lexicographically; descending = most recent first.
    kept.sort_by(|a, b| {
        let a_date = a["fixture"]["date"].as_str().unwrap_or("");
        let b_date = b["fixture"]["date"].as_str().unwrap_or("");
        b_date.cmp(a_date)
    });
    kept.truncate(n);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::config::Settings;
    use crate::limiter::RateLimiter;
    use crate::transport::{HttpTransport, RawResponse, TransportError};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Transport that answers every call with the same body and records the
    /// endpoint + parameters it was given.
    struct RecordingTransport {
        body: String,
        seen: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl RecordingTransport {
        fn new(body: Value) -> Self {
            Self {
                body: body.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last_call(&self) -> (String, Vec<(String, String)>) {
            self.seen.lock().unwrap().last().cloned().expect("no calls")
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for RecordingTransport {
        async fn get(
            &self,
            endpoint: &str,
            params: &[(String, String)],
        ) -> std::result::Result<RawResponse, TransportError> {
            self.seen
                .lock()
                .unwrap()
                .push((endpoint.to_string(), params.to_vec()));
            Ok(RawResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    fn client_answering(body: Value) -> (FootballClient, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new(body));
        let client = FootballClient::with_parts(
            Settings {
                api_key: "k".into(),
                ..Default::default()
            },
            transport.clone(),
            Arc::new(RateLimiter::per_minute(100)),
            Arc::new(ResponseCache::new()),
        );
        (client, transport)
    }

    fn fixture(id: u32, date: &str, home: u32, away: u32, status: &str) -> Value {
        json!({
            "fixture": {"id": id, "date": date, "status": {"short": status}},
            "teams": {"home": {"id": home}, "away": {"id": away}}
        })
    }

    #[tokio::test]
    async fn test_leagues_builds_expected_params() {
        let (client, transport) =
            client_answering(json!({"response": [{"league": {"id": 39}}], "errors": []}));

        let leagues = client.leagues(Some("England"), Some(2024)).await.unwrap();
        assert_eq!(leagues.len(), 1);

        let (endpoint, params) = transport.last_call();
        assert_eq!(endpoint, "/leagues");
        assert_eq!(
            params,
            vec![
                ("country".to_string(), "England".to_string()),
                ("season".to_string(), "2024".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_head_to_head_encodes_pair() {
        let (client, transport) = client_answering(json!({"response": [], "errors": []}));
        client.head_to_head(33, 40, Some(5)).await.unwrap();
        let (endpoint, params) = transport.last_call();
        assert_eq!(endpoint, "/fixtures/headtohead");
        assert_eq!(params[0], ("h2h".to_string(), "33-40".to_string()));
        assert_eq!(params[1], ("last".to_string(), "5".to_string()));
    }

    #[tokio::test]
    async fn test_team_returns_first_match_or_none() {
        let (client, _) = client_answering(json!({
            "response": [{"team": {"id": 33}}, {"team": {"id": 34}}],
            "errors": []
        }));
        let team = client.team(33).await.unwrap().expect("team present");
        assert_eq!(team["team"]["id"], 33);

        let (empty_client, _) = client_answering(json!({"response": [], "errors": []}));
        assert!(empty_client.team(33).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_team_statistics_unwraps_object_response() {
        let (client, _) = client_answering(json!({
            "response": {"form": "WWDLW"},
            "errors": []
        }));
        let stats = client.team_statistics(33, 39, 2024).await.unwrap();
        assert_eq!(stats.unwrap()["form"], "WWDLW");
    }

    #[tokio::test]
    async fn test_fixtures_query_skips_unset_filters() {
        let (client, transport) = client_answering(json!({"response": [], "errors": []}));
        client
            .fixtures(FixturesQuery {
                league: Some(39),
                season: Some(2024),
                ..Default::default()
            })
            .await
            .unwrap();
        let (_, params) = transport.last_call();
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_finished_fixtures_filter_sort_and_cap() {
        let fixtures = vec![
            fixture(1, "2024-08-01T15:00:00+00:00", 33, 40, "FT"),
            fixture(2, "2024-09-01T15:00:00+00:00", 33, 41, "FT"),
            fixture(3, "2024-10-01T15:00:00+00:00", 42, 33, "FT"), // away side
            fixture(4, "2024-11-01T15:00:00+00:00", 33, 43, "NS"), // not finished
            fixture(5, "2024-07-01T15:00:00+00:00", 33, 44, "FT"),
        ];

        let home = finished_fixtures_for_side(fixtures.clone(), 33, "home", 2);
        assert_eq!(home.len(), 2);
        assert_eq!(home[0]["fixture"]["id"], 2, "most recent first");
        assert_eq!(home[1]["fixture"]["id"], 1);

        let away = finished_fixtures_for_side(fixtures, 33, "away", 10);
        assert_eq!(away.len(), 1);
        assert_eq!(away[0]["fixture"]["id"], 3);
    }

    #[test]
    fn test_response_array_tolerates_missing_envelope() {
        assert!(response_array(json!({"errors": []})).is_empty());
        assert!(response_array(json!(null)).is_empty());
    }

    #[test]
    fn test_response_object_none_for_null() {
        assert!(response_object(json!({"response": null})).is_none());
        assert!(response_object(json!({})).is_none());
        assert_eq!(
            response_object(json!({"response": {"a": 1}})),
            Some(json!({"a": 1}))
        );
    }
}
