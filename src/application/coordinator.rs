//! Request orchestration for the three advisory flows.
//!
//! The coordinator turns a [`UserAction`] into the events that must be applied
//! right away and, for actions that talk to the backend, a spawned task that
//! reports its outcome as a [`SessionEvent`] on the outcome channel.
//!
//! No request is cancellable and none is tagged: when two requests of one
//! flow overlap, their outcomes are applied in completion order and the last
//! one to resolve wins. Duplicate recommendation submissions are prevented
//! only by the presentation layer disabling submit while `loading` is set.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::state::{SessionEvent, SessionState};
use crate::domain::{
    Goal, QA_FAILURE_MESSAGE, QaResponse, WaterAccess, build_new_tip, build_question_request,
    build_recommendation_request,
};
use crate::infrastructure::{AdvisoryApi, GeoProvider, LocationResolver};

/// Events raised by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    SetCity(String),
    SetWaterAccess(WaterAccess),
    SetGoal(Goal),
    /// Raw acreage text, parsed only at submission
    SetFarmAcres(String),
    SubmitRecommendation,
    ResetRecommendation,
    SetQuestion(String),
    Ask,
    ClearQuestion,
    SetTipText(String),
    SetTipAuthor(String),
    ShareTip,
    ClearTipInputs,
}

/// What handling an action produced.
#[derive(Debug, Default)]
pub struct Dispatch {
    /// To be applied before anything else happens
    pub events: Vec<SessionEvent>,
    /// The network round-trip started by the action, if any
    pub in_flight: Option<JoinHandle<()>>,
}

impl Dispatch {
    fn immediate(event: SessionEvent) -> Self {
        Self {
            events: vec![event],
            in_flight: None,
        }
    }

    fn none() -> Self {
        Self::default()
    }
}

/// Runs the recommendation, question and tips flows against an [`AdvisoryApi`].
///
/// The coordinator never touches [`SessionState`] itself: it reads a borrowed
/// state to build requests and reports every change as a [`SessionEvent`],
/// either returned immediately in a [`Dispatch`] or sent later on the outcome
/// channel by the spawned round-trip.
pub struct RequestCoordinator {
    api: Arc<dyn AdvisoryApi>,
    language: String,
    outcomes: UnboundedSender<SessionEvent>,
}

impl RequestCoordinator {
    /// `language` is attached to every recommend and ask request.
    pub fn new(
        api: Arc<dyn AdvisoryApi>,
        language: impl Into<String>,
        outcomes: UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            api,
            language: language.into(),
            outcomes,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Turns one user action into its immediate events and network task.
    ///
    /// Input edits only produce an event. `SubmitRecommendation`, `Ask` and
    /// `ShareTip` validate against `state`, then spawn a round-trip; a blank
    /// question or tip yields an empty [`Dispatch`].
    ///
    /// # Arguments
    ///
    /// * `state` - The session as it stands when the action is raised
    /// * `action` - What the user did
    ///
    /// Must be called inside a tokio runtime, since flow actions spawn tasks.
    pub fn handle(&self, state: &SessionState, action: UserAction) -> Dispatch {
        match action {
            UserAction::SetCity(city) => Dispatch::immediate(SessionEvent::CityChanged(city)),
            UserAction::SetWaterAccess(water) => {
                Dispatch::immediate(SessionEvent::WaterAccessChanged(water))
            }
            UserAction::SetGoal(goal) => Dispatch::immediate(SessionEvent::GoalChanged(goal)),
            UserAction::SetFarmAcres(acres) => {
                Dispatch::immediate(SessionEvent::FarmAcresChanged(acres))
            }
            UserAction::SubmitRecommendation => self.submit_recommendation(state),
            UserAction::ResetRecommendation => {
                Dispatch::immediate(SessionEvent::RecommendationReset)
            }
            UserAction::SetQuestion(question) => {
                Dispatch::immediate(SessionEvent::QuestionChanged(question))
            }
            UserAction::Ask => self.ask(state),
            UserAction::ClearQuestion => Dispatch::immediate(SessionEvent::QuestionCleared),
            UserAction::SetTipText(text) => Dispatch::immediate(SessionEvent::TipTextChanged(text)),
            UserAction::SetTipAuthor(author) => {
                Dispatch::immediate(SessionEvent::TipAuthorChanged(author))
            }
            UserAction::ShareTip => self.share_tip(state),
            UserAction::ClearTipInputs => Dispatch::immediate(SessionEvent::TipInputsCleared),
        }
    }

    /// Starts a recommendation request built from the current form and location.
    pub fn submit_recommendation(&self, state: &SessionState) -> Dispatch {
        let request =
            build_recommendation_request(&state.form, state.coords, &state.city, &self.language);
        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();

        let task = tokio::spawn(async move {
            let event = match api.recommend(&request).await {
                Ok(response) => {
                    info!(
                        primary = %response.primary,
                        backup = %response.backup,
                        count = response.recommendations.len(),
                        "recommendation received"
                    );
                    SessionEvent::RecommendationSucceeded(response)
                }
                Err(err) => {
                    warn!(error = %err, "recommendation request failed");
                    SessionEvent::RecommendationFailed(err.user_message())
                }
            };
            let _ = outcomes.send(event);
        });

        Dispatch {
            events: vec![SessionEvent::RecommendationStarted],
            in_flight: Some(task),
        }
    }

    /// Asks the current question. A blank question is a no-op.
    pub fn ask(&self, state: &SessionState) -> Dispatch {
        let Some(request) = build_question_request(&state.question, &self.language) else {
            debug!("ignoring blank question");
            return Dispatch::none();
        };
        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();

        let task = tokio::spawn(async move {
            let qa = match api.ask(&request).await {
                Ok(qa) => qa,
                Err(err) => {
                    warn!(error = %err, "question request failed");
                    QaResponse::failure(QA_FAILURE_MESSAGE)
                }
            };
            let _ = outcomes.send(SessionEvent::AnswerReceived(qa));
        });

        Dispatch {
            events: vec![SessionEvent::QuestionAsked],
            in_flight: Some(task),
        }
    }

    /// Posts the current tip, then clears the inputs and refetches the feed.
    /// A blank tip is a no-op; a failed post is only logged.
    pub fn share_tip(&self, state: &SessionState) -> Dispatch {
        let Some(tip) = build_new_tip(&state.tip_text, &state.tip_author) else {
            debug!("ignoring blank tip");
            return Dispatch::none();
        };
        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();

        let task = tokio::spawn(async move {
            match api.post_tip(&tip).await {
                Ok(()) => {
                    info!(author = %tip.author, "tip shared");
                    let _ = outcomes.send(SessionEvent::TipInputsCleared);
                    load_tips(api.as_ref(), &outcomes).await;
                }
                Err(err) => warn!(error = %err, "posting tip failed"),
            }
        });

        Dispatch {
            events: Vec::new(),
            in_flight: Some(task),
        }
    }

    /// Replaces the feed with the server's list. Failures leave the feed as is.
    pub fn fetch_tips(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move { load_tips(api.as_ref(), &outcomes).await })
    }

    /// Asks the provider for the device position once; failure stays silent.
    pub fn resolve_device_location(&self, provider: Arc<dyn GeoProvider>) -> JoinHandle<()> {
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            if let Some(coords) = LocationResolver::resolve_once(provider.as_ref()).await {
                let _ = outcomes.send(SessionEvent::LocationResolved(coords));
            }
        })
    }
}

async fn load_tips(api: &dyn AdvisoryApi, outcomes: &UnboundedSender<SessionEvent>) {
    match api.fetch_tips().await {
        Ok(tips) => {
            debug!(count = tips.len(), "tips loaded");
            let _ = outcomes.send(SessionEvent::TipsLoaded(tips));
        }
        Err(err) => warn!(error = %err, "fetching tips failed"),
    }
}
