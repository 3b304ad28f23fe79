use super::*;
use crate::{MemorySessionStore, RegisterResponse, RegistrationError};
use async_trait::async_trait;
use serde_json::json;
use shared::error::ApiErrorBody;
use std::time::Duration;
use tokio::sync::Mutex;

enum FakeReply {
    Body(Value),
    Fail(fn() -> RegistrationError),
    Hang,
}

struct FakeRegistrationApi {
    reply: FakeReply,
    requests: Mutex<Vec<RegisterRequest>>,
    observed_loading: Mutex<Option<LoadingState>>,
    loading_seen: Mutex<Vec<bool>>,
}

impl FakeRegistrationApi {
    fn new(reply: FakeReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(Vec::new()),
            observed_loading: Mutex::new(None),
            loading_seen: Mutex::new(Vec::new()),
        })
    }

    fn replying(body: Value) -> Arc<Self> {
        Self::new(FakeReply::Body(body))
    }

    fn failing(err: fn() -> RegistrationError) -> Arc<Self> {
        Self::new(FakeReply::Fail(err))
    }

    async fn watch_loading(&self, state: LoadingState) {
        *self.observed_loading.lock().await = Some(state);
    }

    async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl RegistrationApi for FakeRegistrationApi {
    async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisterResponse, RegistrationError> {
        self.requests.lock().await.push(request.clone());
        if let Some(state) = self.observed_loading.lock().await.as_ref() {
            self.loading_seen.lock().await.push(state.is_loading());
        }

        match &self.reply {
            FakeReply::Body(body) => Ok(RegisterResponse {
                status: 200,
                body: body.clone(),
            }),
            FakeReply::Fail(make_err) => Err(make_err()),
            FakeReply::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }
}

#[derive(Default)]
struct RecordingSessionStore {
    logins: Mutex<Vec<Value>>,
}

#[async_trait]
impl SessionStore for RecordingSessionStore {
    async fn login(&self, payload: Value) {
        self.logins.lock().await.push(payload);
    }
}

fn controller_with(
    api: Arc<FakeRegistrationApi>,
) -> (RegistrationFormController, Arc<RecordingSessionStore>) {
    let session = Arc::new(RecordingSessionStore::default());
    let controller = RegistrationFormController::new(api, session.clone());
    (controller, session)
}

fn fill_required(controller: &mut RegistrationFormController) {
    controller.update_field(RegistrationField::FirstName, "Ana");
    controller.update_field(RegistrationField::LastName, "Li");
    controller.update_field(RegistrationField::Email, "a@b.com");
    controller.update_field(RegistrationField::Password, "pw123");
}

#[test]
fn update_field_changes_only_that_key() {
    let (mut controller, _) = controller_with(FakeRegistrationApi::replying(Value::Null));
    fill_required(&mut controller);
    controller.update_field(RegistrationField::Phone, "555-0100");

    for field in RegistrationField::ALL {
        let before = controller.form().clone();
        controller.update_field(field, format!("new-{field}"));
        for other in RegistrationField::ALL.into_iter().filter(|f| *f != field) {
            assert_eq!(controller.form().get(other), before.get(other));
        }
        assert_eq!(controller.form().get(field), format!("new-{field}"));
    }
}

#[tokio::test]
async fn each_missing_required_field_blocks_submission() {
    for missing in [
        RegistrationField::FirstName,
        RegistrationField::LastName,
        RegistrationField::Email,
        RegistrationField::Password,
    ] {
        let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
        let (mut controller, session) = controller_with(api.clone());
        fill_required(&mut controller);
        controller.update_field(missing, "");

        let outcome = controller.submit().await;

        assert_eq!(outcome, SubmitOutcome::ValidationFailed(vec![missing]));
        assert_eq!(api.request_count().await, 0);
        assert!(!controller.is_loading());
        assert!(session.logins.lock().await.is_empty());
    }
}

#[tokio::test]
async fn optional_fields_may_stay_empty() {
    let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
    let (mut controller, _) = controller_with(api.clone());
    fill_required(&mut controller);

    let outcome = controller.submit().await;

    assert!(matches!(outcome, SubmitOutcome::Success(_)));
    assert_eq!(api.request_count().await, 1);
}

#[tokio::test]
async fn valid_submit_sends_one_request_with_full_name() {
    let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
    let (mut controller, _) = controller_with(api.clone());
    fill_required(&mut controller);

    controller.submit().await;

    let requests = api.requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        serde_json::to_value(&requests[0]).expect("serialize"),
        json!({
            "firstName": "Ana",
            "lastName": "Li",
            "email": "a@b.com",
            "password": "pw123",
            "phone": "",
            "address": "",
            "fullName": "Ana Li",
        })
    );
}

#[tokio::test]
async fn loading_is_set_only_while_request_is_in_flight() {
    let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
    let (mut controller, _) = controller_with(api.clone());
    api.watch_loading(controller.loading_state()).await;
    fill_required(&mut controller);

    assert!(!controller.is_loading());
    controller.submit().await;

    assert_eq!(*api.loading_seen.lock().await, vec![true]);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn success_hands_body_to_session_store_verbatim() {
    let body = json!({ "id": 1, "token": "abc" });
    let api = FakeRegistrationApi::replying(body.clone());
    let (mut controller, session) = controller_with(api);
    fill_required(&mut controller);

    let outcome = controller.submit().await;

    assert_eq!(outcome, SubmitOutcome::Success(body.clone()));
    assert_eq!(*session.logins.lock().await, vec![body]);
}

#[tokio::test]
async fn falsy_body_is_unexpected_response_without_login() {
    for body in [Value::Null, json!(""), json!(false), json!(0)] {
        let api = FakeRegistrationApi::replying(body);
        let (mut controller, session) = controller_with(api.clone());
        fill_required(&mut controller);

        let outcome = controller.submit().await;

        assert_eq!(outcome, SubmitOutcome::UnexpectedResponse);
        assert_eq!(api.request_count().await, 1);
        assert!(session.logins.lock().await.is_empty());
        assert!(!controller.is_loading());
    }
}

#[tokio::test]
async fn server_message_is_surfaced_verbatim() {
    let api = FakeRegistrationApi::failing(|| RegistrationError::Rejected {
        status: 409,
        body: Some(ApiErrorBody::new("Email already exists")),
    });
    let (mut controller, session) = controller_with(api);
    fill_required(&mut controller);

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::ServerError("Email already exists".to_string())
    );
    assert!(session.logins.lock().await.is_empty());
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn failures_without_server_message_use_fallback() {
    let failures: [fn() -> RegistrationError; 3] = [
        || RegistrationError::Rejected {
            status: 500,
            body: None,
        },
        || RegistrationError::Transport("connection refused".to_string()),
        || RegistrationError::Timeout,
    ];

    for make_err in failures {
        let (mut controller, _) = controller_with(FakeRegistrationApi::failing(make_err));
        fill_required(&mut controller);

        let outcome = controller.submit().await;

        assert_eq!(
            outcome,
            SubmitOutcome::ServerError(DEFAULT_FAILURE_MESSAGE.to_string())
        );
        assert!(!controller.is_loading());
    }
}

#[tokio::test]
async fn teardown_during_request_abandons_and_releases_loading() {
    let api = FakeRegistrationApi::new(FakeReply::Hang);
    let session = Arc::new(MemorySessionStore::new());
    let mut controller = RegistrationFormController::new(api.clone(), session.clone());
    fill_required(&mut controller);

    let lifetime = controller.lifetime_token();
    let loading = controller.loading_state();
    let observer = tokio::spawn(async move {
        while !loading.is_loading() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        lifetime.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), controller.submit())
        .await
        .expect("submit settles after teardown");
    observer.await.expect("observer task");

    assert_eq!(outcome, SubmitOutcome::Abandoned);
    assert_eq!(api.request_count().await, 1);
    assert!(!controller.is_loading());
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn torn_down_controller_does_not_send() {
    let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
    let (mut controller, session) = controller_with(api.clone());
    fill_required(&mut controller);
    controller.teardown();

    assert_eq!(controller.submit().await, SubmitOutcome::Abandoned);
    assert_eq!(api.request_count().await, 0);
    assert!(session.logins.lock().await.is_empty());
}

#[tokio::test]
async fn parent_lifetime_cancels_controller_but_drop_spares_parent() {
    let parent = CancellationToken::new();
    let api = FakeRegistrationApi::replying(json!({ "id": 1 }));
    let session = Arc::new(RecordingSessionStore::default());

    let controller = RegistrationFormController::with_lifetime(api.clone(), session.clone(), &parent);
    let child = controller.lifetime_token();
    drop(controller);
    assert!(child.is_cancelled());
    assert!(!parent.is_cancelled());

    let controller = RegistrationFormController::with_lifetime(api, session, &parent);
    parent.cancel();
    assert!(controller.is_torn_down());
}
