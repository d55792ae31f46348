//! Message pipeline - one pass per inbound utterance
//!
//! CONTEXT → CLASSIFY → (EXTRACT & APPEND | AGGREGATE | HELP) → COMPOSE
//!
//! Holds no state between messages; everything durable lives in the ledger.

use crate::classifier::IntentClassifier;
use crate::composer::ResponseComposer;
use crate::extractor::TransactionExtractor;
use crate::ledger::LedgerStore;
use crate::models::{InboundMessage, Intent, LedgerContext, OwnerId, Vocabulary};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fetch sizes used by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Recent transactions loaded as context for general replies.
    pub context_recent: usize,
    /// Recent transactions fetched and shown in a report.
    pub report_recent: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            context_recent: 5,
            report_recent: 5,
        }
    }
}

/// Wires classifier, extractor, ledger and composer for each message.
pub struct Pipeline {
    store: Arc<dyn LedgerStore>,
    extractor: TransactionExtractor,
    classifier: IntentClassifier,
    vocabulary: Vocabulary,
    composer: ResponseComposer,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        extractor: TransactionExtractor,
        classifier: IntentClassifier,
        vocabulary: Vocabulary,
        composer: ResponseComposer,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            extractor,
            classifier,
            vocabulary,
            composer,
            settings,
        }
    }

    /// Process one message and return the reply. Never fails: every error is
    /// logged and turned into a single user-facing message.
    pub async fn handle(&self, message: &InboundMessage) -> String {
        let owner = message.owner;

        info!(%owner, text = %message.text, "Pipeline: message received");

        if let Some(profile) = message.profile.as_ref().filter(|p| !p.is_empty()) {
            if let Err(e) = self.store.upsert_user(owner, profile).await {
                warn!(%owner, "Failed to update user profile: {}", e);
            }
        }

        let context = self.load_context(owner).await;
        let intent = self.classifier.classify(&message.text);

        debug!(%owner, %intent, "Intent classified");

        match self.dispatch(message, intent, &context).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(%owner, %intent, error_kind = e.kind(), "Pipeline failed: {}", e);
                self.composer.failure(&e)
            }
        }
    }

    /// Balance and recent transactions; degrades to an empty context on failure.
    async fn load_context(&self, owner: OwnerId) -> LedgerContext {
        let loaded = async {
            let balance = self.store.balance(owner).await?;
            let recent = self.store.recent(owner, self.settings.context_recent).await?;
            Ok::<_, crate::error::LedgerError>(LedgerContext { balance, recent })
        }
        .await;

        loaded.unwrap_or_else(|e| {
            warn!(%owner, "Context unavailable, continuing with empty context: {}", e);
            LedgerContext::default()
        })
    }

    async fn dispatch(
        &self,
        message: &InboundMessage,
        intent: Intent,
        context: &LedgerContext,
    ) -> Result<String> {
        let owner = message.owner;

        match intent {
            Intent::Transaction => {
                let stored = self
                    .extractor
                    .extract_and_record(
                        self.store.as_ref(),
                        owner,
                        &message.text,
                        &self.vocabulary,
                        Utc::now(),
                    )
                    .await?;
                let balance = self.store.balance(owner).await?;
                Ok(self.composer.transaction_recorded(&stored, &balance))
            }
            Intent::BalanceCheck => {
                let balance = self.store.balance(owner).await?;
                Ok(self.composer.balance(&balance))
            }
            Intent::ReportRequest => {
                let balance = self.store.balance(owner).await?;
                if balance.is_empty() {
                    return Ok(self.composer.report(&balance, &Default::default(), &[]));
                }
                let breakdown = self.store.expenses_by_category(owner).await?;
                let recent = self.store.recent(owner, self.settings.report_recent).await?;
                Ok(self.composer.report(&balance, &breakdown, &recent))
            }
            Intent::General => Ok(self.composer.general(&message.text, context)),
        }
    }
}
