//! Deadline-bounded exchange loop with credential rotation and model fallback.

use std::sync::Arc;
use std::time::Instant;

use tcommon::{Deadline, GenerationOptions};
use tprovider::{
    Credential, KeyPool, MediaPart, ModelCandidate, Part, ProviderCall, ProviderClient,
    ProviderError, ProviderErrorKind, ProviderRegistry, ProviderResponse, Role, SafetyPolicy,
    SendConfig, Turn,
};

use crate::config::{MAX_TOKENS_RANGE, TEMPERATURE_RANGE};
use crate::history::{self, strip_tool_exchanges};
use crate::{
    ChatError, ConversationStore, CredentialOwnerStore, DriverConfig, EmptyReason,
    ExchangeContext, ExchangeHooks, ExchangeReply, ExchangeRequest, HistoryEditor,
    InMemoryConversationStore, LockRegistry, NoopExchangeHooks,
};

/// Reply text used when the model answered with media only.
pub const MEDIA_ONLY_REPLY: &str = "...";

pub struct RequestDriverBuilder {
    providers: ProviderRegistry,
    keys: Option<Arc<KeyPool>>,
    store: Option<Arc<dyn ConversationStore>>,
    owners: Option<Arc<dyn CredentialOwnerStore>>,
    locks: Option<Arc<LockRegistry>>,
    hooks: Arc<dyn ExchangeHooks>,
    config: DriverConfig,
    safety: SafetyPolicy,
}

impl Default for RequestDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDriverBuilder {
    pub fn new() -> Self {
        Self {
            providers: ProviderRegistry::new(),
            keys: None,
            store: None,
            owners: None,
            locks: None,
            hooks: Arc::new(NoopExchangeHooks),
            config: DriverConfig::default(),
            safety: SafetyPolicy::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn ProviderClient>) -> Self {
        self.providers.register_shared(provider);
        self
    }

    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    pub fn key_pool(mut self, keys: Arc<KeyPool>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn store(mut self, store: Arc<dyn ConversationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn owner_store(mut self, owners: Arc<dyn CredentialOwnerStore>) -> Self {
        self.owners = Some(owners);
        self
    }

    pub fn locks(mut self, locks: Arc<LockRegistry>) -> Self {
        self.locks = Some(locks);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ExchangeHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn safety(mut self, safety: SafetyPolicy) -> Self {
        self.safety = safety;
        self
    }

    pub fn build(self) -> Result<RequestDriver, ChatError> {
        if self.providers.is_empty() {
            return Err(ChatError::invalid_request(
                "at least one provider client is required",
            ));
        }

        Ok(RequestDriver {
            providers: self.providers,
            keys: self
                .keys
                .unwrap_or_else(|| Arc::new(KeyPool::new(Vec::<String>::new()))),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(InMemoryConversationStore::new())),
            owners: self.owners,
            locks: self.locks.unwrap_or_default(),
            hooks: self.hooks,
            config: self.config,
            safety: self.safety,
        })
    }
}

#[derive(Clone)]
pub struct RequestDriver {
    providers: ProviderRegistry,
    keys: Arc<KeyPool>,
    store: Arc<dyn ConversationStore>,
    owners: Option<Arc<dyn CredentialOwnerStore>>,
    locks: Arc<LockRegistry>,
    hooks: Arc<dyn ExchangeHooks>,
    config: DriverConfig,
    safety: SafetyPolicy,
}

enum AttemptOutcome {
    Reply(ExchangeReply),
    Empty(EmptyReason),
}

impl RequestDriver {
    pub fn builder() -> RequestDriverBuilder {
        RequestDriverBuilder::new()
    }

    pub fn key_pool(&self) -> Arc<KeyPool> {
        Arc::clone(&self.keys)
    }

    pub fn store(&self) -> Arc<dyn ConversationStore> {
        Arc::clone(&self.store)
    }

    pub fn locks(&self) -> Arc<LockRegistry> {
        Arc::clone(&self.locks)
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// An editor sharing this driver's store and conversation locks.
    pub fn editor(&self) -> HistoryEditor {
        HistoryEditor::new(Arc::clone(&self.store), Arc::clone(&self.locks))
    }

    pub async fn exchange_text(&self, request: ExchangeRequest) -> String {
        self.exchange(request).await.text
    }

    /// Runs one exchange. Never fails: every fault ends in content or an empty reply,
    /// and stored history changes only when content is returned.
    pub async fn exchange(&self, request: ExchangeRequest) -> ExchangeReply {
        let started = Instant::now();
        let context = ExchangeContext {
            conversation_id: &request.conversation_id,
            model: "",
            query: &request.query,
        };

        if request.query.trim().is_empty() && request.media.is_empty() {
            return self.empty(context, EmptyReason::BlankQuery);
        }

        let candidates = request
            .candidates
            .iter()
            .filter(|candidate| !candidate.is_blank())
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return self.empty(context, EmptyReason::NoCandidates);
        }

        if request.deadline.is_expired() {
            return self.empty(context, EmptyReason::DeadlineExpired);
        }

        let _guard = if request.stateless {
            None
        } else {
            match self
                .locks
                .lock_until(&request.conversation_id, request.deadline)
                .await
            {
                Ok(guard) => Some(guard),
                Err(_) => return self.empty(context, EmptyReason::LockUnavailable),
            }
        };

        let stored = if request.stateless {
            Vec::new()
        } else {
            match tokio::time::timeout(
                request.deadline.remaining(),
                self.store.load_history(&request.conversation_id),
            )
            .await
            {
                Ok(Ok(history)) => history,
                Ok(Err(_)) => return self.empty(context, EmptyReason::HistoryUnavailable),
                Err(_) => return self.empty(context, EmptyReason::DeadlineExpired),
            }
        };

        let history = history::prepare(stored, &self.config.history);
        let outcome = self
            .run_candidates(&request, &candidates, history, started)
            .await;

        match outcome {
            AttemptOutcome::Reply(reply) => reply,
            AttemptOutcome::Empty(reason) => self.empty(context, reason),
        }
    }

    async fn run_candidates(
        &self,
        request: &ExchangeRequest,
        candidates: &[&ModelCandidate],
        mut history: Vec<Turn>,
        started: Instant,
    ) -> AttemptOutcome {
        let turn = request.query_turn(self.config.max_query_chars);
        let send_config = self.send_config(request);
        let mut repairs_left = self.config.malformed_history_repairs;
        let mut total_attempts = 0_u32;

        for (index, candidate) in candidates.iter().enumerate() {
            let context = ExchangeContext {
                conversation_id: &request.conversation_id,
                model: &candidate.model,
                query: &request.query,
            };

            if let Some(provider) = self.providers.get(candidate.provider) {
                let mut attempts = 0_u32;

                while self.config.retry.has_attempts_left(attempts) {
                    if request.deadline.is_expired() {
                        return AttemptOutcome::Empty(EmptyReason::DeadlineExpired);
                    }

                    let credential = match self.acquire_credential(request) {
                        Some(credential) => credential,
                        None => return AttemptOutcome::Empty(EmptyReason::NoCredential),
                    };

                    let attempt = attempts + 1;
                    self.hooks.on_attempt_start(context, &credential, attempt);

                    let remaining = request.deadline.remaining();
                    let call = ProviderCall {
                        model: candidate.model.clone(),
                        history: history.clone(),
                        turn: turn.clone(),
                        config: send_config.clone(),
                        timeout: remaining,
                        credential: credential.clone(),
                    };

                    let result = match tokio::time::timeout(remaining, provider.send(call)).await
                    {
                        Ok(result) => result,
                        Err(_) => Err(ProviderError::timeout(
                            "provider call exceeded the exchange deadline",
                        )),
                    };

                    let error = match result {
                        Ok(response) => {
                            let outcome = self
                                .complete(request, context, history, turn, response)
                                .await;
                            if matches!(outcome, AttemptOutcome::Reply(_)) {
                                self.hooks.on_success(
                                    context,
                                    total_attempts + attempt,
                                    started.elapsed(),
                                );
                            }
                            return outcome;
                        }
                        Err(error) => error,
                    };

                    self.hooks
                        .on_attempt_failure(context, &credential, attempt, &error);

                    match error.kind {
                        ProviderErrorKind::ContentBlocked => {
                            return AttemptOutcome::Empty(EmptyReason::ContentBlocked);
                        }
                        ProviderErrorKind::Timeout => {
                            return AttemptOutcome::Empty(EmptyReason::ProviderTimeout);
                        }
                        ProviderErrorKind::MalformedHistory if repairs_left > 0 => {
                            repairs_left -= 1;
                            let before = history.len();
                            history = strip_tool_exchanges(history);
                            self.hooks
                                .on_history_repaired(context, before - history.len());
                        }
                        ProviderErrorKind::Authentication => {
                            attempts = attempt;
                            self.revoke(context, &credential, request.deadline).await;
                            if request.credential.is_some() {
                                return AttemptOutcome::Empty(EmptyReason::NoCredential);
                            }
                        }
                        ProviderErrorKind::QuotaExceeded => {
                            attempts = attempt;
                            self.freeze(context, &credential);
                        }
                        _ => {
                            attempts = attempt;
                            if self.config.retry.has_attempts_left(attempts) {
                                let delay = self
                                    .config
                                    .retry
                                    .backoff_within(attempt, request.deadline.remaining());
                                if !delay.is_zero() {
                                    self.hooks.on_retry_scheduled(context, attempt, delay);
                                    tokio::time::sleep(delay).await;
                                }
                            }
                        }
                    }
                }

                total_attempts += attempts;
            }

            if let Some(next) = candidates.get(index + 1) {
                self.hooks.on_model_fallback(context, &next.model);
            }
        }

        AttemptOutcome::Empty(EmptyReason::CandidatesExhausted)
    }

    async fn complete(
        &self,
        request: &ExchangeRequest,
        context: ExchangeContext<'_>,
        history: Vec<Turn>,
        turn: Turn,
        response: ProviderResponse,
    ) -> AttemptOutcome {
        let media = response.media();
        let text = response.text();
        let answer = text.trim();

        if answer.is_empty() && media.is_empty() {
            return AttemptOutcome::Empty(EmptyReason::EmptyAnswer);
        }

        if self.config.is_leaked_tool_call(answer) {
            return AttemptOutcome::Empty(EmptyReason::LeakedToolCall);
        }

        let reply_text = if answer.is_empty() {
            MEDIA_ONLY_REPLY.to_string()
        } else {
            self.config.shorten_answer(answer).into_owned()
        };

        if !request.stateless {
            let updated = append_exchange(history, turn, &reply_text, &media);
            let updated = history::prepare(updated, &self.config.history);
            let saved = tokio::time::timeout(
                request.deadline.remaining(),
                self.store.save_history(&request.conversation_id, updated),
            )
            .await
            .unwrap_or_else(|_| Err(ChatError::timeout("saving history exceeded the deadline")));

            if let Err(error) = saved {
                self.hooks.on_persist_failure(context, &error);
            }
        }

        AttemptOutcome::Reply(ExchangeReply {
            text: reply_text,
            media,
        })
    }

    fn send_config(&self, request: &ExchangeRequest) -> SendConfig {
        let temperature = request
            .temperature
            .filter(|value| !value.is_nan())
            .map(|value| value.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1));
        let max_tokens = request
            .max_tokens
            .map(|value| value.clamp(MAX_TOKENS_RANGE.0, MAX_TOKENS_RANGE.1));

        SendConfig {
            system_instruction: request.system_instruction.clone(),
            options: GenerationOptions {
                temperature,
                max_tokens,
            },
            tools: request.tools.clone(),
            safety: self.safety,
        }
    }

    fn acquire_credential(&self, request: &ExchangeRequest) -> Option<Credential> {
        match &request.credential {
            Some(credential) => Some(credential.clone()),
            None => self.keys.next().ok().flatten(),
        }
    }

    fn freeze(&self, context: ExchangeContext<'_>, credential: &Credential) {
        if let Ok(outcome) = self.keys.freeze(credential) {
            self.hooks.on_credential_frozen(context, credential, outcome);
        }
    }

    /// Drops `credential` from the pool and rewrites every affected owner registry,
    /// each write bounded by `deadline`.
    async fn revoke(
        &self,
        context: ExchangeContext<'_>,
        credential: &Credential,
        deadline: Deadline,
    ) {
        let Ok(owners) = self.keys.remove(credential) else {
            return;
        };

        self.hooks.on_credential_removed(context, credential, &owners);

        let Some(owner_store) = &self.owners else {
            return;
        };

        for owner in &owners {
            let secrets = match self.keys.owner_credentials(owner) {
                Ok(credentials) => credentials
                    .iter()
                    .map(|credential| credential.expose().to_string())
                    .collect(),
                Err(error) => {
                    self.hooks
                        .on_persist_failure(context, &ChatError::from(error));
                    continue;
                }
            };

            let saved = tokio::time::timeout(
                deadline.remaining(),
                owner_store.save_owner(owner, secrets),
            )
            .await
            .unwrap_or_else(|_| {
                Err(ChatError::timeout(format!(
                    "saving credentials of owner '{owner}' exceeded the deadline"
                )))
            });

            if let Err(error) = saved {
                self.hooks.on_persist_failure(context, &error);
            }
        }
    }

    fn empty(&self, context: ExchangeContext<'_>, reason: EmptyReason) -> ExchangeReply {
        self.hooks.on_empty_reply(context, reason);
        ExchangeReply::empty()
    }
}

fn append_exchange(
    mut history: Vec<Turn>,
    turn: Turn,
    reply_text: &str,
    media: &[MediaPart],
) -> Vec<Turn> {
    let mut parts = vec![Part::text(reply_text)];
    parts.extend(media.iter().cloned().map(Part::Media));

    history.push(turn);
    history.push(Turn::new(Role::Model, parts));
    history
}
