//! Session state for the advisory client.
//!
//! [`SessionState`] is an immutable value; every change is expressed as a
//! [`SessionEvent`] and applied through [`reduce`]. The three flows own
//! disjoint slots:
//!
//! | flow           | slots                                   |
//! |----------------|-----------------------------------------|
//! | recommendation | `loading`, `recommendation`, `error`    |
//! | question       | `qa`                                    |
//! | tips           | `tips`                                  |
//!
//! Completion events are applied in the order they arrive, so when two
//! requests of the same flow overlap the one that resolves last wins.

use crate::domain::{
    AdvisoryForm, Coordinates, Goal, LocationCandidate, QaResponse, RecommendationResponse,
    TipEntry, WaterAccess, resolve_location,
};

/// Everything the presentation layer renders.
///
/// # Examples
///
/// ```
/// use agromind::application::SessionState;
/// use agromind::domain::{Goal, WaterAccess};
///
/// let state = SessionState::default();
/// assert_eq!(state.form.water_access, WaterAccess::Medium);
/// assert_eq!(state.form.goal, Goal::Balanced);
/// assert!(!state.loading);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Device position, once geolocation succeeds
    pub coords: Option<Coordinates>,
    /// Free-text place name typed by the user
    pub city: String,
    pub form: AdvisoryForm,
    /// A recommendation request is outstanding
    pub loading: bool,
    pub recommendation: Option<RecommendationResponse>,
    pub error: Option<String>,
    pub question: String,
    pub qa: Option<QaResponse>,
    /// Community feed in server order
    pub tips: Vec<TipEntry>,
    pub tip_text: String,
    pub tip_author: String,
}

impl SessionState {
    /// The location a request built right now would carry.
    pub fn location(&self) -> LocationCandidate {
        resolve_location(self.coords, &self.city)
    }

    /// Method form of [`reduce`], for chaining.
    pub fn apply(self, event: SessionEvent) -> Self {
        reduce(self, event)
    }
}

/// A state transition, raised either by user input or by a flow completing.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CityChanged(String),
    WaterAccessChanged(WaterAccess),
    GoalChanged(Goal),
    /// Raw acreage text; parsed only when a request is built
    FarmAcresChanged(String),
    QuestionChanged(String),
    TipTextChanged(String),
    TipAuthorChanged(String),
    /// Geolocation succeeded
    LocationResolved(Coordinates),
    /// Sets `loading` and clears any previous result or error
    RecommendationStarted,
    /// Stores the result, clears the error and `loading`
    RecommendationSucceeded(RecommendationResponse),
    /// Stores the user-facing message, clears the result and `loading`
    RecommendationFailed(String),
    /// Clears result and error; leaves the form and `loading` alone
    RecommendationReset,
    /// Clears the previous answer while a question is outstanding
    QuestionAsked,
    /// Stores an answer or an error-shaped failure
    AnswerReceived(QaResponse),
    /// Empties the question text and the answer
    QuestionCleared,
    /// Replaces the whole feed
    TipsLoaded(Vec<TipEntry>),
    /// Empties the tip author and body inputs
    TipInputsCleared,
}

/// Applies one event. Pure: no I/O, no clocks.
///
/// Each event touches only the slots of the flow that raised it, so
/// recommendation, question and tips outcomes never overwrite each other.
///
/// # Examples
///
/// ```
/// use agromind::application::{reduce, SessionEvent, SessionState};
///
/// let state = reduce(SessionState::default(), SessionEvent::RecommendationStarted);
/// assert!(state.loading);
///
/// let state = reduce(state, SessionEvent::RecommendationFailed("Server error".to_string()));
/// assert!(!state.loading);
/// assert_eq!(state.error.as_deref(), Some("Server error"));
/// ```
pub fn reduce(mut state: SessionState, event: SessionEvent) -> SessionState {
    match event {
        SessionEvent::CityChanged(city) => state.city = city,
        SessionEvent::WaterAccessChanged(water) => state.form.water_access = water,
        SessionEvent::GoalChanged(goal) => state.form.goal = goal,
        SessionEvent::FarmAcresChanged(acres) => state.form.farm_acres = acres,
        SessionEvent::QuestionChanged(question) => state.question = question,
        SessionEvent::TipTextChanged(text) => state.tip_text = text,
        SessionEvent::TipAuthorChanged(author) => state.tip_author = author,
        SessionEvent::LocationResolved(coords) => state.coords = Some(coords),
        SessionEvent::RecommendationStarted => {
            state.loading = true;
            state.recommendation = None;
            state.error = None;
        }
        SessionEvent::RecommendationSucceeded(response) => {
            state.loading = false;
            state.recommendation = Some(response);
            state.error = None;
        }
        SessionEvent::RecommendationFailed(message) => {
            state.loading = false;
            state.recommendation = None;
            state.error = Some(message);
        }
        SessionEvent::RecommendationReset => {
            state.recommendation = None;
            state.error = None;
        }
        SessionEvent::QuestionAsked => state.qa = None,
        SessionEvent::AnswerReceived(qa) => state.qa = Some(qa),
        SessionEvent::QuestionCleared => {
            state.question.clear();
            state.qa = None;
        }
        SessionEvent::TipsLoaded(tips) => state.tips = tips,
        SessionEvent::TipInputsCleared => {
            state.tip_text.clear();
            state.tip_author.clear();
        }
    }
    state
}
