//! Scripted advisory backend for coordinator and session tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::domain::{
    ApiError, ApiResult, NewTip, QaRequest, QaResponse, RecommendationRequest,
    RecommendationResponse, TipEntry,
};
use crate::infrastructure::AdvisoryApi;

type Reply<T> = oneshot::Receiver<ApiResult<T>>;

/// Replies are queued per endpoint and consumed in call order. A gated reply
/// holds the call open until the test releases it.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    recommend: Mutex<VecDeque<Reply<RecommendationResponse>>>,
    ask: Mutex<VecDeque<Reply<QaResponse>>>,
    tips: Mutex<VecDeque<ApiResult<Vec<TipEntry>>>>,
    post: Mutex<VecDeque<ApiResult<()>>>,
    recommend_requests: Mutex<Vec<RecommendationRequest>>,
    ask_requests: Mutex<Vec<QaRequest>>,
    posted: Mutex<Vec<NewTip>>,
    tips_calls: AtomicUsize,
}

fn ready<T>(result: ApiResult<T>) -> Reply<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    rx
}

impl ScriptedApi {
    pub fn push_recommend(&self, result: ApiResult<RecommendationResponse>) {
        self.recommend.lock().unwrap().push_back(ready(result));
    }

    pub fn push_recommend_gated(&self) -> oneshot::Sender<ApiResult<RecommendationResponse>> {
        let (tx, rx) = oneshot::channel();
        self.recommend.lock().unwrap().push_back(rx);
        tx
    }

    pub fn push_ask(&self, result: ApiResult<QaResponse>) {
        self.ask.lock().unwrap().push_back(ready(result));
    }

    pub fn push_tips(&self, result: ApiResult<Vec<TipEntry>>) {
        self.tips.lock().unwrap().push_back(result);
    }

    pub fn push_post(&self, result: ApiResult<()>) {
        self.post.lock().unwrap().push_back(result);
    }

    pub fn recommend_requests(&self) -> Vec<RecommendationRequest> {
        self.recommend_requests.lock().unwrap().clone()
    }

    pub fn ask_requests(&self) -> Vec<QaRequest> {
        self.ask_requests.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<NewTip> {
        self.posted.lock().unwrap().clone()
    }

    pub fn tips_calls(&self) -> usize {
        self.tips_calls.load(Ordering::SeqCst)
    }
}

async fn await_reply<T>(reply: Option<Reply<T>>) -> ApiResult<T> {
    match reply {
        Some(rx) => rx
            .await
            .unwrap_or_else(|_| Err(ApiError::Transport("reply dropped".to_string()))),
        None => Err(ApiError::Transport("no scripted reply".to_string())),
    }
}

#[async_trait]
impl AdvisoryApi for ScriptedApi {
    async fn recommend(&self, request: &RecommendationRequest) -> ApiResult<RecommendationResponse> {
        self.recommend_requests.lock().unwrap().push(request.clone());
        let reply = self.recommend.lock().unwrap().pop_front();
        await_reply(reply).await
    }

    async fn ask(&self, request: &QaRequest) -> ApiResult<QaResponse> {
        self.ask_requests.lock().unwrap().push(request.clone());
        let reply = self.ask.lock().unwrap().pop_front();
        await_reply(reply).await
    }

    async fn fetch_tips(&self) -> ApiResult<Vec<TipEntry>> {
        self.tips_calls.fetch_add(1, Ordering::SeqCst);
        self.tips.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn post_tip(&self, tip: &NewTip) -> ApiResult<()> {
        self.posted.lock().unwrap().push(tip.clone());
        self.post.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

pub(crate) fn sample_response(primary: &str) -> RecommendationResponse {
    RecommendationResponse {
        primary: primary.to_string(),
        backup: "groundnut".to_string(),
        recommendations: Vec::new(),
    }
}

pub(crate) fn sample_tip(text: &str) -> TipEntry {
    TipEntry {
        tip: text.to_string(),
        author: "anonymous".to_string(),
        time: "2024-06-01T08:30:00Z".to_string(),
    }
}
