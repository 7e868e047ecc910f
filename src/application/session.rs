//! The session runtime: owns the state and applies every event to it.
//!
//! User actions go through [`Session::dispatch`], which applies the
//! coordinator's immediate events synchronously. Flow outcomes arrive on an
//! unbounded channel and are applied by [`Session::next_outcome`] or
//! [`Session::drain_outcomes`] on the same task, so the state never has two
//! writers. Each applied event publishes a new snapshot to subscribers.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::coordinator::{RequestCoordinator, UserAction};
use super::state::{SessionEvent, SessionState};
use crate::infrastructure::{AdvisoryApi, GeoProvider};

/// One user session against the advisory service.
pub struct Session {
    state: SessionState,
    coordinator: RequestCoordinator,
    outcomes: mpsc::UnboundedReceiver<SessionEvent>,
    publisher: watch::Sender<SessionState>,
}

impl Session {
    /// Creates a session with default state and no requests in flight.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend used by every flow
    /// * `language` - Locale tag sent with recommendation and question requests
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use agromind::application::Session;
    /// use agromind::infrastructure::HttpAdvisoryClient;
    ///
    /// let api = HttpAdvisoryClient::new("http://127.0.0.1:5000").unwrap();
    /// let session = Session::new(Arc::new(api), "ta-IN");
    /// assert_eq!(session.language(), "ta-IN");
    /// assert!(!session.state().loading);
    /// ```
    pub fn new(api: Arc<dyn AdvisoryApi>, language: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = SessionState::default();
        let (publisher, _) = watch::channel(state.clone());
        Self {
            state,
            coordinator: RequestCoordinator::new(api, language, tx),
            outcomes: rx,
            publisher,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn language(&self) -> &str {
        self.coordinator.language()
    }

    /// Receives a snapshot after every applied event.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }

    /// Session start: one geolocation attempt and one tips fetch, concurrently.
    pub fn start(&self, geo: Arc<dyn GeoProvider>) -> Vec<JoinHandle<()>> {
        vec![
            self.coordinator.resolve_device_location(geo),
            self.coordinator.fetch_tips(),
        ]
    }

    /// Handles one user action. Returns the spawned round-trip, if any.
    pub fn dispatch(&mut self, action: UserAction) -> Option<JoinHandle<()>> {
        let dispatch = self.coordinator.handle(&self.state, action);
        for event in dispatch.events {
            self.apply(event);
        }
        dispatch.in_flight
    }

    fn apply(&mut self, event: SessionEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
        self.publisher.send_replace(self.state.clone());
    }

    /// Waits for the next flow outcome and applies it. Cancel-safe.
    pub async fn next_outcome(&mut self) -> Option<()> {
        let event = self.outcomes.recv().await?;
        self.apply(event);
        Some(())
    }

    /// Applies every outcome already delivered. Returns how many were applied.
    pub fn drain_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.outcomes.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{ScriptedApi, sample_response, sample_tip};
    use crate::domain::{ApiError, Coordinates, LocationCandidate, QaResponse};
    use crate::infrastructure::{FixedPosition, NoGeolocation};

    fn session(api: &Arc<ScriptedApi>) -> Session {
        Session::new(api.clone(), "en-IN")
    }

    async fn settle(session: &mut Session, handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            handle.await.unwrap();
        }
        session.drain_outcomes();
    }

    #[tokio::test]
    async fn test_start_resolves_location_and_loads_tips() {
        let api = Arc::new(ScriptedApi::default());
        api.push_tips(Ok(vec![sample_tip("Use drip irrigation")]));
        let mut session = session(&api);
        let here = Coordinates { lat: 12.9, lon: 79.1 };

        let handles = session.start(Arc::new(FixedPosition(here)));
        settle(&mut session, handles).await;

        assert_eq!(session.state().coords, Some(here));
        assert_eq!(session.state().tips.len(), 1);
        assert_eq!(api.tips_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_initial_fetch_leaves_tips_empty() {
        let api = Arc::new(ScriptedApi::default());
        api.push_tips(Err(ApiError::Transport("offline".to_string())));
        let mut session = session(&api);

        let handles = session.start(Arc::new(NoGeolocation));
        settle(&mut session, handles).await;

        assert!(session.state().tips.is_empty());
        assert!(session.state().coords.is_none());
        assert!(session.state().error.is_none());
        assert!(session.state().qa.is_none());
    }

    #[tokio::test]
    async fn test_loading_set_before_response_and_cleared_after() {
        let api = Arc::new(ScriptedApi::default());
        let gate = api.push_recommend_gated();
        let mut session = session(&api);

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        assert!(session.state().loading);

        gate.send(Ok(sample_response("millet"))).unwrap();
        settle(&mut session, vec![handle]).await;

        assert!(!session.state().loading);
        assert_eq!(session.state().recommendation.as_ref().unwrap().primary, "millet");
    }

    #[tokio::test]
    async fn test_loading_cleared_on_every_failure_kind() {
        for failure in [
            ApiError::Status(500),
            ApiError::Transport("unreachable".to_string()),
            ApiError::Decode("expected value".to_string()),
        ] {
            let api = Arc::new(ScriptedApi::default());
            api.push_recommend(Err(failure));
            let mut session = session(&api);

            let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
            assert!(session.state().loading);
            settle(&mut session, vec![handle]).await;

            assert!(!session.state().loading);
            assert!(session.state().recommendation.is_none());
            assert!(session.state().error.is_some());
        }
    }

    #[tokio::test]
    async fn test_success_clears_previous_error_and_failure_clears_previous_result() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recommend(Err(ApiError::Status(500)));
        api.push_recommend(Ok(sample_response("rice")));
        api.push_recommend(Err(ApiError::Transport(String::new())));
        let mut session = session(&api);

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;
        assert_eq!(session.state().error.as_deref(), Some("Server error"));

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;
        assert!(session.state().error.is_none());
        assert!(session.state().recommendation.is_some());

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;
        assert!(session.state().recommendation.is_none());
        assert_eq!(session.state().error.as_deref(), Some("Failed"));
    }

    #[tokio::test]
    async fn test_last_resolved_recommendation_wins() {
        let api = Arc::new(ScriptedApi::default());
        let first = api.push_recommend_gated();
        let second = api.push_recommend_gated();
        let mut session = session(&api);

        let first_handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        let second_handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();

        second.send(Ok(sample_response("issued-second"))).unwrap();
        second_handle.await.unwrap();
        session.drain_outcomes();
        assert_eq!(session.state().recommendation.as_ref().unwrap().primary, "issued-second");

        first.send(Ok(sample_response("issued-first"))).unwrap();
        first_handle.await.unwrap();
        session.drain_outcomes();
        assert_eq!(session.state().recommendation.as_ref().unwrap().primary, "issued-first");
        assert!(!session.state().loading);
    }

    #[tokio::test]
    async fn test_coordinates_submitted_even_with_city() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recommend(Ok(sample_response("rice")));
        let mut session = session(&api);
        let here = Coordinates { lat: 10.0, lon: 78.0 };
        session.apply(SessionEvent::LocationResolved(here));
        session.dispatch(UserAction::SetCity("Trichy".to_string()));
        session.dispatch(UserAction::SetFarmAcres("3.5".to_string()));

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;

        let sent = &api.recommend_requests()[0];
        assert_eq!(sent.location, LocationCandidate::Coordinates(here));
        assert_eq!(sent.farm_acres, 3.5);
    }

    #[tokio::test]
    async fn test_empty_location_without_coordinates_or_city() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recommend(Ok(sample_response("rice")));
        let mut session = session(&api);

        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;

        assert_eq!(api.recommend_requests()[0].location, LocationCandidate::Unresolved {});
    }

    #[tokio::test]
    async fn test_whitespace_question_keeps_prior_answer() {
        let api = Arc::new(ScriptedApi::default());
        let mut session = session(&api);
        let prior = QaResponse::Answer { answer: "Add lime".to_string(), source: "kb".to_string() };
        session.apply(SessionEvent::AnswerReceived(prior.clone()));
        session.dispatch(UserAction::SetQuestion("   ".to_string()));
        let before = session.state().clone();

        assert!(session.dispatch(UserAction::Ask).is_none());

        assert_eq!(session.state(), &before);
        assert_eq!(session.state().qa, Some(prior));
        assert!(api.ask_requests().is_empty());
    }

    #[tokio::test]
    async fn test_ask_clears_stale_answer_then_stores_new_one() {
        let api = Arc::new(ScriptedApi::default());
        api.push_ask(Ok(QaResponse::Answer { answer: "Sow in June".to_string(), source: "kb".to_string() }));
        let mut session = session(&api);
        session.apply(SessionEvent::AnswerReceived(QaResponse::failure("old")));
        session.dispatch(UserAction::SetQuestion("When to sow ragi?".to_string()));

        let handle = session.dispatch(UserAction::Ask).unwrap();
        assert!(session.state().qa.is_none());
        settle(&mut session, vec![handle]).await;

        assert!(matches!(session.state().qa, Some(QaResponse::Answer { ref answer, .. }) if answer == "Sow in June"));
    }

    #[tokio::test]
    async fn test_clear_question_resets_text_and_answer() {
        let api = Arc::new(ScriptedApi::default());
        let mut session = session(&api);
        session.dispatch(UserAction::SetQuestion("pH?".to_string()));
        session.apply(SessionEvent::AnswerReceived(QaResponse::failure("x")));

        session.dispatch(UserAction::ClearQuestion);

        assert!(session.state().question.is_empty());
        assert!(session.state().qa.is_none());
    }

    #[tokio::test]
    async fn test_successful_tip_post_refetches_once() {
        let api = Arc::new(ScriptedApi::default());
        api.push_tips(Ok(Vec::new()));
        api.push_tips(Ok(vec![sample_tip("Mulch after rain"), sample_tip("older")]));
        let mut session = session(&api);
        let handles = session.start(Arc::new(NoGeolocation));
        settle(&mut session, handles).await;
        let fetches_before = api.tips_calls();

        session.dispatch(UserAction::SetTipAuthor("Asha".to_string()));
        session.dispatch(UserAction::SetTipText("Mulch after rain".to_string()));
        let handle = session.dispatch(UserAction::ShareTip).unwrap();
        settle(&mut session, vec![handle]).await;

        assert_eq!(api.tips_calls(), fetches_before + 1);
        assert!(session.state().tip_text.is_empty());
        assert!(session.state().tip_author.is_empty());
        let feed: Vec<&str> = session.state().tips.iter().map(|t| t.tip.as_str()).collect();
        assert_eq!(feed, vec!["Mulch after rain", "older"]);
    }

    #[tokio::test]
    async fn test_failed_tip_post_keeps_inputs() {
        let api = Arc::new(ScriptedApi::default());
        api.push_post(Err(ApiError::Transport("offline".to_string())));
        let mut session = session(&api);
        session.dispatch(UserAction::SetTipText("Rotate crops".to_string()));

        let handle = session.dispatch(UserAction::ShareTip).unwrap();
        settle(&mut session, vec![handle]).await;

        assert_eq!(session.state().tip_text, "Rotate crops");
        assert!(session.state().error.is_none());
        assert_eq!(api.tips_calls(), 0);
    }

    #[tokio::test]
    async fn test_server_error_on_refetch_keeps_existing_feed() {
        let api = Arc::new(ScriptedApi::default());
        api.push_tips(Ok(vec![sample_tip("Use drip irrigation")]));
        api.push_tips(Err(ApiError::Status(500)));
        let mut session = session(&api);
        let handles = session.start(Arc::new(NoGeolocation));
        settle(&mut session, handles).await;
        assert_eq!(session.state().tips.len(), 1);

        session.dispatch(UserAction::SetTipText("Mulch after rain".to_string()));
        let handle = session.dispatch(UserAction::ShareTip).unwrap();
        settle(&mut session, vec![handle]).await;

        assert_eq!(api.tips_calls(), 2);
        assert!(session.state().tip_text.is_empty());
        let feed: Vec<&str> = session.state().tips.iter().map(|t| t.tip.as_str()).collect();
        assert_eq!(feed, vec!["Use drip irrigation"]);
    }

    #[tokio::test]
    async fn test_flows_in_flight_together_do_not_interfere() {
        let api = Arc::new(ScriptedApi::default());
        let gate = api.push_recommend_gated();
        api.push_ask(Err(ApiError::Transport("offline".to_string())));
        let mut session = session(&api);
        session.dispatch(UserAction::SetQuestion("Pest control for okra?".to_string()));

        let recommend = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        let ask = session.dispatch(UserAction::Ask).unwrap();
        settle(&mut session, vec![ask]).await;

        assert!(session.state().loading);
        assert_eq!(session.state().qa, Some(QaResponse::failure("Failed to fetch answer")));

        gate.send(Err(ApiError::Status(500))).unwrap();
        settle(&mut session, vec![recommend]).await;

        assert_eq!(session.state().error.as_deref(), Some("Server error"));
        assert_eq!(session.state().qa, Some(QaResponse::failure("Failed to fetch answer")));
    }

    #[tokio::test]
    async fn test_reset_keeps_form_and_location() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recommend(Ok(sample_response("rice")));
        let mut session = session(&api);
        session.dispatch(UserAction::SetCity("Erode".to_string()));
        let handle = session.dispatch(UserAction::SubmitRecommendation).unwrap();
        settle(&mut session, vec![handle]).await;

        session.dispatch(UserAction::ResetRecommendation);

        assert!(session.state().recommendation.is_none());
        assert!(session.state().error.is_none());
        assert_eq!(session.state().city, "Erode");
    }

    #[tokio::test]
    async fn test_subscribers_see_each_transition() {
        let api = Arc::new(ScriptedApi::default());
        let mut session = session(&api);
        let mut rx = session.subscribe();
        let _gate = api.push_recommend_gated();

        session.dispatch(UserAction::SubmitRecommendation);

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().loading);
    }

    #[tokio::test]
    async fn test_next_outcome_applies_one_event() {
        let api = Arc::new(ScriptedApi::default());
        api.push_recommend(Ok(sample_response("millet")));
        let mut session = session(&api);

        session.dispatch(UserAction::SubmitRecommendation);
        session.next_outcome().await.unwrap();

        assert!(!session.state().loading);
        assert_eq!(session.state().recommendation.as_ref().unwrap().primary, "millet");
    }
}
